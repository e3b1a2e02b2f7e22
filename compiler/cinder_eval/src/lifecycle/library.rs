//! Library loading.
//!
//! A library sees its dependencies' exports layered over the prelude and
//! exports only its own entries (plus the prelude). Names a dependency
//! defines are therefore never re-exported by the libraries that import it.

use cinder_ir::{LibEntry, LibTree, Library, Name};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::environment::Env;
use crate::errors::{EvalNote, EvalResult};
use crate::interpreter::Interpreter;

/// Load `imports`, then the contract's own library, returning the combined
/// environment. Type definitions are registered in the interpreter's
/// data type dictionary as they are reached.
#[tracing::instrument(level = "debug", skip_all, fields(imports = imports.len()))]
pub(crate) fn load_libraries(
    interp: &mut Interpreter<'_>,
    imports: &[LibTree],
    own: Option<&Library>,
) -> EvalResult<Env> {
    let mut loaded = FxHashMap::default();
    let mut env = interp.prelude().base_env();
    for tree in imports {
        let exports = load_tree(interp, tree, &mut loaded)?;
        env = env.extend(&exports);
    }
    if let Some(lib) = own {
        env = eval_library(interp, lib, env)?;
    }
    Ok(env)
}

/// Exports of `tree`, loading its dependencies first.
///
/// A library imported along several paths is evaluated once.
fn load_tree(
    interp: &mut Interpreter<'_>,
    tree: &LibTree,
    loaded: &mut FxHashMap<Name, Env>,
) -> EvalResult<Env> {
    if let Some(exports) = loaded.get(&tree.lib.name) {
        return Ok(exports.clone());
    }
    let mut env = interp.prelude().base_env();
    for dep in &tree.deps {
        let exports = load_tree(interp, dep, loaded)?;
        env = env.extend(&exports);
    }
    let env = eval_library(interp, &tree.lib, env)?;

    let own_names: FxHashSet<&Name> = tree.lib.entries.iter().map(LibEntry::name).collect();
    let prelude = interp.prelude();
    let exports = env.retain(|name| own_names.contains(name) || prelude.is_reserved(name));
    tracing::debug!(library = %tree.lib.name, exports = exports.len(), "library loaded");
    loaded.insert(tree.lib.name.clone(), exports.clone());
    Ok(exports)
}

/// Evaluate the entries of `lib` in order on top of `env`.
fn eval_library(interp: &mut Interpreter<'_>, lib: &Library, mut env: Env) -> EvalResult<Env> {
    let in_library = || EvalNote::new(format!("while loading library {}", lib.name));
    for entry in &lib.entries {
        match entry {
            LibEntry::Var { name, expr, .. } => {
                interp
                    .prelude()
                    .check_not_reserved(name)
                    .map_err(|e| e.with_note(in_library()))?;
                let value = interp
                    .eval(expr, &env)
                    .map_err(|e| e.with_note(in_library()))?;
                env = env.bind(name.clone(), value);
            }
            LibEntry::Type {
                name,
                tparams,
                ctors,
            } => {
                interp
                    .datatypes_mut()
                    .register(name, tparams, ctors)
                    .map_err(|e| e.with_note(in_library()))?;
            }
        }
    }
    Ok(env)
}
