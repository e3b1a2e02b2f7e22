//! Contract lifecycle: library loading, initialization and message dispatch.
//!
//! Each entry point runs one invocation on a fresh interpreter and reports
//! either its result or a `Failure` carrying the gas left at the failing
//! point. Nothing a failed invocation did is visible afterwards: dispatch
//! runs against a private copy of the fields, and the caller's
//! `ContractState` is only ever read.

mod dispatch;
mod init;
mod library;

use std::sync::Arc;

use cinder_ir::{Name, Type};

use crate::datatypes::DataTypes;
use crate::environment::Env;
use crate::state::FieldState;
use crate::value::Value;

pub use dispatch::{Execution, Outcome};
pub use init::{InitRequest, Initialized, CREATION_BLOCK, THIS_ADDRESS};

/// Durable contract identity carried from one invocation to the next.
#[derive(Clone, Debug)]
pub struct ContractState {
    /// Library definitions and contract parameters.
    pub env: Env,
    /// Declared fields with their current values, in declaration order.
    pub fields: Vec<FieldState>,
    pub balance: u128,
    /// Standard data types plus every type the contract's libraries define.
    pub datatypes: Arc<DataTypes>,
}

impl ContractState {
    /// Current value of field `name`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    pub(crate) fn field_types(&self) -> rustc_hash::FxHashMap<Name, Type> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.ty.clone()))
            .collect()
    }
}
