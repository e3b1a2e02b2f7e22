//! Per-invocation execution configuration.
//!
//! A `Configuration` is owned by exactly one statement sequence at a time:
//! each statement takes it by value and hands back the next one.

use std::sync::Arc;

use cinder_ir::{Component, Name, Type};
use rustc_hash::FxHashMap;

use crate::blockchain::BlockchainContext;
use crate::environment::Env;
use crate::errors::{unknown_field, EvalResult};
use crate::value::Value;

/// Options that bound evaluation independently of gas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum nesting of expression evaluation and procedure calls.
    /// `None` leaves depth bounded by gas alone.
    pub max_depth: Option<usize>,
}

impl EngineOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 1000;
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            max_depth: Some(Self::DEFAULT_MAX_DEPTH),
        }
    }
}

/// Mutable execution context threaded through statement evaluation.
#[derive(Clone, Debug)]
pub struct Configuration {
    /// Local bindings.
    pub env: Env,
    /// Bindings at component entry; procedure calls start from here.
    pub init_env: Env,
    /// Declared type of every contract field.
    pub field_types: Arc<FxHashMap<Name, Type>>,
    pub balance: u128,
    pub blockchain: BlockchainContext,
    /// Amount carried by the incoming message.
    pub incoming_funds: u128,
    /// Procedures callable from the running component, in declaration order.
    pub procedures: Vec<Arc<Component>>,
    /// Components currently executing, outermost first.
    pub call_stack: Vec<Name>,
    pub accepted: bool,
    pub messages: Vec<Value>,
    pub events: Vec<Value>,
}

impl Configuration {
    /// Declared type of `field`.
    pub fn field_type(&self, field: &Name) -> EvalResult<&Type> {
        self.field_types.get(field).ok_or_else(|| unknown_field(field))
    }

    /// Position of the procedure called `name` in the callable table.
    pub fn procedure_index(&self, name: &Name) -> Option<usize> {
        self.procedures.iter().position(|p| p.name == *name)
    }

    /// Sum of `_amount` over all emitted messages.
    pub fn outgoing_total(&self) -> Option<u128> {
        self.messages.iter().try_fold(0u128, |acc, msg| {
            let amount = msg
                .message_entry(crate::value::AMOUNT_LABEL)
                .and_then(Value::as_uint128)?;
            acc.checked_add(amount)
        })
    }
}
