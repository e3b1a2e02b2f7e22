//! Pattern matching against runtime values.

use cinder_ir::{Name, Pattern};

use crate::value::Value;

/// Match `value` against `pattern`, returning the bindings on success.
///
/// A constructor pattern matches only an algebraic value built by the same
/// constructor with the same number of arguments. Bindings are returned
/// left to right.
pub fn match_pattern(pattern: &Pattern, value: &Value) -> Option<Vec<(Name, Value)>> {
    let mut bindings = Vec::new();
    if collect(pattern, value, &mut bindings) {
        Some(bindings)
    } else {
        None
    }
}

fn collect(pattern: &Pattern, value: &Value, out: &mut Vec<(Name, Value)>) -> bool {
    match pattern {
        Pattern::Wildcard => true,
        Pattern::Binder(name) => {
            out.push((name.clone(), value.clone()));
            true
        }
        Pattern::Constructor(ctor, subs) => {
            let Value::Adt(adt) = value else {
                return false;
            };
            adt.ctor == *ctor
                && adt.args.len() == subs.len()
                && subs
                    .iter()
                    .zip(&adt.args)
                    .all(|(sub, arg)| collect(sub, arg, out))
        }
    }
}
