//! Tree-walking, gas-metered interpreter.
//!
//! One `Interpreter` serves one invocation: library loading and
//! initialization at deployment, or a single message dispatch. It owns the
//! gas meter and the recursion depth counter; the data type dictionary is
//! shared and copied on first write when libraries register new types.

mod expr;
mod pattern;
mod stmt;

use std::sync::Arc;

use cinder_ir::Span;

use crate::builtins::BuiltinDictionary;
use crate::config::EngineOptions;
use crate::datatypes::DataTypes;
use crate::environment::Prelude;
use crate::errors::{recursion_limit_exceeded, EvalResult};
use crate::gas::GasMeter;
use crate::observer::{EvalEvent, EvalObserver};
use crate::stack::ensure_sufficient_stack;

pub use pattern::match_pattern;
pub use stmt::{validate_event, validate_outgoing, BALANCE_FIELD};
pub(crate) use stmt::check_unique_labels;

/// Evaluator state for a single invocation.
pub struct Interpreter<'a> {
    datatypes: Arc<DataTypes>,
    builtins: &'a dyn BuiltinDictionary,
    prelude: &'a Prelude,
    observer: &'a dyn EvalObserver,
    gas: GasMeter,
    depth: usize,
    max_depth: Option<usize>,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        datatypes: Arc<DataTypes>,
        builtins: &'a dyn BuiltinDictionary,
        prelude: &'a Prelude,
        observer: &'a dyn EvalObserver,
        options: EngineOptions,
        gas_limit: u64,
    ) -> Self {
        Interpreter {
            datatypes,
            builtins,
            prelude,
            observer,
            gas: GasMeter::new(gas_limit),
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    #[inline]
    pub fn remaining_gas(&self) -> u64 {
        self.gas.remaining()
    }

    pub fn datatypes(&self) -> &DataTypes {
        &self.datatypes
    }

    /// Shared handle to the current data type dictionary.
    pub fn datatypes_handle(&self) -> Arc<DataTypes> {
        Arc::clone(&self.datatypes)
    }

    /// Mutable access for type registration; copies a shared dictionary first.
    pub fn datatypes_mut(&mut self) -> &mut DataTypes {
        Arc::make_mut(&mut self.datatypes)
    }

    pub fn prelude(&self) -> &'a Prelude {
        self.prelude
    }

    pub(crate) fn observe(&self, event: EvalEvent) {
        self.observer.observe(&event);
    }

    /// Deduct `cost` from the remaining gas.
    pub fn charge(&mut self, cost: u64, span: Span) -> EvalResult<()> {
        self.gas.consume(cost, span)?;
        self.observe(EvalEvent::GasCharged {
            cost,
            remaining: self.gas.remaining(),
        });
        Ok(())
    }

    /// Charge `cost`, then run `f`. `f` never runs when the charge fails.
    pub fn charged<T>(
        &mut self,
        cost: u64,
        span: Span,
        f: impl FnOnce(&mut Self) -> EvalResult<T>,
    ) -> EvalResult<T> {
        self.charge(cost, span)?;
        f(self)
    }

    /// Run `f` one nesting level deeper, enforcing the depth limit.
    pub(crate) fn enter<T>(&mut self, f: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        if let Some(max) = self.max_depth {
            if self.depth >= max {
                return Err(recursion_limit_exceeded(max));
            }
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        result
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
