//! Cinder Eval - gas-metered execution engine for Cinder contracts.
//!
//! This crate evaluates validated Cinder code: library definitions,
//! contract initialization and message dispatch.
//!
//! # Architecture
//!
//! - `Engine`: long-lived collaborators (builtins, data types, prelude,
//!   options, observer) and the lifecycle entry points
//! - `Interpreter`: one invocation's evaluator, owning its gas meter
//! - `Env`: persistent variable environment
//! - `Configuration`: per-invocation statement context, threaded by value
//! - `StateBackend`: capability interface for contract fields
//! - `BuiltinDictionary`: type-directed builtin resolution
//!
//! # Tracing
//!
//! Entry points carry `tracing` spans at `debug`; gas charges are logged at
//! `trace`. No subscriber is installed here. Enable output in the embedding
//! application, e.g. with `RUST_LOG=cinder_eval=debug`.

mod blockchain;
pub mod builtins;
mod config;
mod datatypes;
mod engine;
mod environment;
pub mod errors;
mod gas;
pub mod interpreter;
mod lifecycle;
mod observer;
mod stack;
mod state;
mod value;

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;

pub use blockchain::{BlockchainContext, BLOCKNUMBER};
pub use builtins::{BuiltinDictionary, ResolvedBuiltin, StdBuiltins};
pub use config::{Configuration, EngineOptions};
pub use datatypes::{Constructor, DataType, DataTypes};
pub use engine::{Engine, EngineBuilder};
pub use environment::{Env, Prelude, CINDER_VERSION};
pub use errors::{
    Diagnostic, EvalBacktrace, EvalError, EvalErrorKind, EvalNote, EvalResult, Failure,
};
pub use gas::{ceil_log2, eval_cost, GasMeter};
pub use interpreter::Interpreter;
pub use lifecycle::{
    ContractState, Execution, InitRequest, Initialized, Outcome, CREATION_BLOCK, THIS_ADDRESS,
};
pub use observer::{EvalEvent, EvalObserver, NoopObserver, RecordingObserver};
pub use stack::ensure_sufficient_stack;
pub use state::{BackendError, FieldState, FieldStore, StateBackend};
pub use value::{
    AdtValue, ClosureValue, Heap, MapKey, MapValue, TypeClosureValue, Value, AMOUNT_LABEL,
    EVENTNAME_LABEL, ORIGIN_LABEL, RECIPIENT_LABEL, SENDER_LABEL, TAG_LABEL,
};
