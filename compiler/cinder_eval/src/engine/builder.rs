//! `EngineBuilder` for creating `Engine` instances with non-default collaborators.

use std::sync::Arc;

use super::Engine;
use crate::builtins::{BuiltinDictionary, StdBuiltins};
use crate::config::EngineOptions;
use crate::datatypes::DataTypes;
use crate::environment::Prelude;
use crate::observer::{EvalObserver, NoopObserver};

/// Builder for `Engine`.
///
/// Every collaborator has a default: the standard builtins, the standard
/// data types and prelude, default options and an observer that ignores
/// every event.
#[derive(Default)]
pub struct EngineBuilder {
    builtins: Option<Arc<dyn BuiltinDictionary>>,
    datatypes: Option<DataTypes>,
    prelude: Option<Prelude>,
    options: EngineOptions,
    observer: Option<Arc<dyn EvalObserver>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the builtin dictionary.
    #[must_use]
    pub fn builtins(mut self, builtins: Arc<dyn BuiltinDictionary>) -> Self {
        self.builtins = Some(builtins);
        self
    }

    /// Set the data types available before any library loads.
    #[must_use]
    pub fn datatypes(mut self, datatypes: DataTypes) -> Self {
        self.datatypes = Some(datatypes);
        self
    }

    /// Set the reserved-name prelude.
    #[must_use]
    pub fn prelude(mut self, prelude: Prelude) -> Self {
        self.prelude = Some(prelude);
        self
    }

    #[must_use]
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the maximum evaluation depth; `None` leaves depth bounded by gas alone.
    #[must_use]
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    /// Set the observer that receives evaluation events.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn EvalObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            builtins: self
                .builtins
                .unwrap_or_else(|| Arc::new(StdBuiltins::new())),
            datatypes: Arc::new(self.datatypes.unwrap_or_else(DataTypes::standard)),
            prelude: self.prelude.unwrap_or_default(),
            options: self.options,
            observer: self.observer.unwrap_or_else(|| Arc::new(NoopObserver)),
        }
    }
}
