//! Variable environments and the reserved-name prelude.
//!
//! `Env` is a persistent map: `bind` returns a new environment and leaves
//! the original untouched, so a closure's captured environment and the
//! environment at its call site can share structure without either one
//! observing the other's bindings.

use std::fmt;

use cinder_ir::{Name, Type};

use crate::errors::{reserved_name, unbound_name, EvalResult};
use crate::value::Value;

/// Version reported through the `_cinder_version` prelude binding.
pub const CINDER_VERSION: u32 = 1;

/// Immutable variable environment.
#[derive(Clone, Default, PartialEq)]
pub struct Env {
    bindings: im::OrdMap<Name, Value>,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    /// A new environment with `name` bound to `value`, shadowing any prior binding.
    #[must_use]
    pub fn bind(&self, name: Name, value: Value) -> Env {
        Env {
            bindings: self.bindings.update(name, value),
        }
    }

    /// Bind several names in order; later entries shadow earlier ones.
    #[must_use]
    pub fn bind_all(&self, entries: impl IntoIterator<Item = (Name, Value)>) -> Env {
        let mut bindings = self.bindings.clone();
        for (name, value) in entries {
            bindings.insert(name, value);
        }
        Env { bindings }
    }

    pub fn get(&self, name: &Name) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Look up `name`, failing with an unbound-name error if absent.
    pub fn lookup(&self, name: &Name) -> EvalResult<Value> {
        self.bindings
            .get(name)
            .cloned()
            .ok_or_else(|| unbound_name(name))
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bindings of `other` layered over this environment.
    #[must_use]
    pub fn extend(&self, other: &Env) -> Env {
        Env {
            bindings: other.bindings.clone().union(self.bindings.clone()),
        }
    }

    /// Only the bindings whose names satisfy `keep`.
    #[must_use]
    pub fn retain(&self, mut keep: impl FnMut(&Name) -> bool) -> Env {
        let bindings = self
            .bindings
            .iter()
            .filter(|(name, _)| keep(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Env { bindings }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Value)> {
        self.bindings.iter()
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.bindings.keys()).finish()
    }
}

/// The language-provided bindings user code may not redefine.
///
/// Passed explicitly into every environment construction instead of living
/// in a global table.
#[derive(Clone, Debug)]
pub struct Prelude {
    env: Env,
}

impl Prelude {
    /// The standard prelude.
    pub fn standard() -> Self {
        Prelude::from_bindings([(Name::new("_cinder_version"), Value::uint32(CINDER_VERSION))])
    }

    /// A prelude made of exactly `bindings`.
    pub fn from_bindings(bindings: impl IntoIterator<Item = (Name, Value)>) -> Self {
        Prelude {
            env: Env::new().bind_all(bindings),
        }
    }

    pub fn is_reserved(&self, name: &Name) -> bool {
        self.env.contains(name)
    }

    /// Fail if `name` is reserved.
    pub fn check_not_reserved(&self, name: &Name) -> EvalResult<()> {
        if self.is_reserved(name) {
            return Err(reserved_name(name));
        }
        Ok(())
    }

    /// Fail if any of `params` reuses a reserved name.
    pub fn check_params(&self, params: &[(Name, Type)]) -> EvalResult<()> {
        params
            .iter()
            .try_for_each(|(name, _)| self.check_not_reserved(name))
    }

    /// The base environment every other environment is built on.
    pub fn base_env(&self) -> Env {
        self.env.clone()
    }
}

impl Default for Prelude {
    fn default() -> Self {
        Prelude::standard()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
