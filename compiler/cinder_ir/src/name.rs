//! Identifiers.
//!
//! Contract code is consumed after parsing, so identifiers arrive as owned
//! strings. `Name` wraps them in a shared `Arc<str>` so environments,
//! closures and messages can hold names without copying the text.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Shared, immutable identifier.
///
/// Ordering and hashing follow the underlying string, which keeps every map
/// keyed by `Name` deterministic across runs.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Arc<str>);

impl Name {
    /// Create a name from any string-like value.
    #[inline]
    pub fn new(text: impl AsRef<str>) -> Self {
        Name(Arc::from(text.as_ref()))
    }

    /// The identifier text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this name uses the `_` prefix reserved for implicit identifiers.
    #[inline]
    pub fn is_implicit(&self) -> bool {
        self.0.starts_with('_')
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", &*self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Name::new(text)
    }
}

impl From<String> for Name {
    fn from(text: String) -> Self {
        Name(Arc::from(text))
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}
