//! Execution observers.
//!
//! An observer sees notable evaluation events for debugging and tooling. It
//! has no way to influence evaluation, and the default observer does nothing.

use cinder_ir::Name;
use parking_lot::Mutex;

use crate::value::Value;

/// A notable evaluation event.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalEvent {
    GasCharged { cost: u64, remaining: u64 },
    BuiltinCalled { name: &'static str },
    ProcedureEntered { name: Name, depth: usize },
    MessageSent { message: Value },
    EventEmitted { event: Value },
    PaymentAccepted,
    Thrown { message: Option<String> },
}

pub trait EvalObserver: Send + Sync {
    fn observe(&self, event: &EvalEvent);
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl EvalObserver for NoopObserver {
    #[inline]
    fn observe(&self, _: &EvalEvent) {}
}

/// Observer that records every event in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<EvalEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        RecordingObserver::default()
    }

    /// All events observed so far.
    pub fn events(&self) -> Vec<EvalEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EvalObserver for RecordingObserver {
    fn observe(&self, event: &EvalEvent) {
        self.events.lock().push(event.clone());
    }
}
