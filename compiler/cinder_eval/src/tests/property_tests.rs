//! Determinism, gas monotonicity and purity properties.

use std::sync::Arc;

use cinder_ir::{Expr, ExprKind, Pattern, Type};
use proptest::prelude::*;

use super::build::*;
use crate::{ClosureValue, Engine, Env, Heap, Value};

/// `fix f. fun n => if n == 0 then 0 else f (n - 1) + 1`.
fn countdown() -> Expr {
    let step = let_in(
        "one",
        lit(1),
        let_in(
            "m",
            builtin("sub", &["n", "one"]),
            let_in("r", app("f", &["m"]), builtin("add", &["r", "one"])),
        ),
    );
    let body = let_in(
        "zero",
        lit(0),
        let_in(
            "b",
            builtin("eq", &["n", "zero"]),
            e(ExprKind::Match {
                scrutinee: n("b"),
                arms: vec![
                    cinder_ir::MatchArm {
                        pattern: pctor("True", vec![]),
                        body: var("zero"),
                    },
                    cinder_ir::MatchArm {
                        pattern: Pattern::Wildcard,
                        body: step,
                    },
                ],
            }),
        ),
    );
    e(ExprKind::Fixpoint {
        name: n("f"),
        ty: Type::fun(Type::uint32(), Type::uint32()),
        body: Arc::new(fun("n", Type::uint32(), body)),
    })
}

fn countdown_from(start: u32) -> (Expr, Env) {
    let expr = let_in("f", countdown(), app("f", &["start"]));
    let env = Env::new().bind(n("start"), Value::uint32(start));
    (expr, env)
}

fn closure() -> Value {
    Value::Closure(Heap::new(ClosureValue {
        param: n("x"),
        param_ty: Type::uint32(),
        body: Arc::new(var("x")),
        captures: Env::new(),
        fix: None,
    }))
}

/// A pure value nested `depth` levels deep, with a closure at the bottom when
/// `poisoned`.
fn nested(depth: usize, poisoned: bool) -> Value {
    let leaf = if poisoned {
        closure()
    } else {
        Value::uint32(0)
    };
    (0..depth).fold(leaf, |inner, level| {
        if level % 2 == 0 {
            Value::some(Type::uint32(), inner)
        } else {
            Value::message(vec![(n("inner"), inner)])
        }
    })
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(a in any::<u32>(), b in any::<u32>()) {
        let engine = Engine::new();
        let expr = builtin("add", &["a", "b"]);
        let env = Env::new()
            .bind(n("a"), Value::uint32(a))
            .bind(n("b"), Value::uint32(b));
        let first = engine.eval_expr(&expr, &env, GAS);
        let second = engine.eval_expr(&expr, &env, GAS);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn more_gas_never_hurts(start in 0u32..20, gas in 0u64..2_000, extra in 0u64..1_000) {
        let engine = Engine::new();
        let (expr, env) = countdown_from(start);
        if let Ok((value, remaining)) = engine.eval_expr(&expr, &env, gas) {
            let (more_value, more_remaining) = engine
                .eval_expr(&expr, &env, gas + extra)
                .unwrap();
            prop_assert_eq!(&value, &Value::uint32(start));
            prop_assert_eq!(more_value, value);
            prop_assert_eq!(more_remaining, remaining + extra);
        }
    }

    #[test]
    fn exhaustion_reports_untouched_remainder(start in 1u32..20) {
        let engine = Engine::new();
        let (expr, env) = countdown_from(start);
        let (_, remaining) = engine.eval_expr(&expr, &env, GAS).unwrap();
        let used = GAS - remaining;
        prop_assert!(engine.eval_expr(&expr, &env, used).is_ok());
        let failure = engine.eval_expr(&expr, &env, used - 1).unwrap_err();
        prop_assert!(failure.error.is_out_of_gas());
        prop_assert!(failure.remaining_gas < used);
    }

    #[test]
    fn purity_detects_closures_at_any_depth(depth in 0usize..8, poisoned in any::<bool>()) {
        let value = nested(depth, poisoned);
        prop_assert_eq!(value.is_pure(), !poisoned);
        prop_assert_eq!(bincode::serialize(&value).is_ok(), !poisoned);
    }
}
