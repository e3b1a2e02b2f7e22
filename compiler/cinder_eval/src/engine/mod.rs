//! The execution engine.
//!
//! `Engine` holds the collaborators that outlive a single invocation: the
//! builtin dictionary, the base data types, the prelude, options and the
//! observer. Each entry point creates a fresh `Interpreter` with its own gas
//! meter, so an engine can be shared across threads and invocations.

mod builder;

use std::sync::Arc;

use crate::builtins::BuiltinDictionary;
use crate::config::EngineOptions;
use crate::datatypes::DataTypes;
use crate::environment::{Env, Prelude};
use crate::errors::Failure;
use crate::interpreter::Interpreter;
use crate::observer::EvalObserver;
use crate::value::Value;

pub use builder::EngineBuilder;

pub struct Engine {
    builtins: Arc<dyn BuiltinDictionary>,
    datatypes: Arc<DataTypes>,
    prelude: Prelude,
    options: EngineOptions,
    observer: Arc<dyn EvalObserver>,
}

impl Engine {
    /// An engine with every collaborator at its default.
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn prelude(&self) -> &Prelude {
        &self.prelude
    }

    pub fn datatypes(&self) -> &DataTypes {
        &self.datatypes
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// A fresh interpreter over `datatypes` with `gas_limit` gas.
    pub fn interpreter(&self, datatypes: Arc<DataTypes>, gas_limit: u64) -> Interpreter<'_> {
        Interpreter::new(
            datatypes,
            self.builtins.as_ref(),
            &self.prelude,
            self.observer.as_ref(),
            self.options,
            gas_limit,
        )
    }

    /// A fresh interpreter over the engine's base data types.
    pub fn base_interpreter(&self, gas_limit: u64) -> Interpreter<'_> {
        self.interpreter(Arc::clone(&self.datatypes), gas_limit)
    }

    /// Evaluate a closed expression on top of `env`.
    ///
    /// Returns the value and the gas left over.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn eval_expr(
        &self,
        expr: &cinder_ir::Expr,
        env: &Env,
        gas_limit: u64,
    ) -> Result<(Value, u64), Failure> {
        let mut interp = self.base_interpreter(gas_limit);
        match interp.eval(expr, env) {
            Ok(value) => Ok((value, interp.remaining_gas())),
            Err(error) => Err(Failure::new(error, interp.remaining_gas())),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
