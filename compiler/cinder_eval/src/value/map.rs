//! In-memory map values.
//!
//! Keys are restricted to primitive values and ordered structurally, so
//! iteration order (and therefore serialization and cost) is identical on
//! every node.

use cinder_ir::{IntLit, Type};

use super::{Heap, Value};
use crate::errors::{type_mismatch, EvalError};

/// A primitive value used as a map key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Int(IntLit),
    Str(String),
    BNum(u64),
    ByStrX(Vec<u8>),
    ByStr(Vec<u8>),
}

impl MapKey {
    /// The key as a runtime value.
    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Int(i) => Value::Int(*i),
            MapKey::Str(s) => Value::string(s.as_str()),
            MapKey::BNum(b) => Value::BNum(*b),
            MapKey::ByStrX(bytes) => Value::bystrx(bytes.clone()),
            MapKey::ByStr(bytes) => Value::bystr(bytes.clone()),
        }
    }

    /// Serialized size of the key, as counted by `SizeOf`.
    pub fn literal_size(&self) -> u64 {
        match self {
            MapKey::Int(i) => i.width().bytes(),
            MapKey::Str(s) => s.len() as u64,
            MapKey::BNum(_) => 8,
            MapKey::ByStrX(bytes) | MapKey::ByStr(bytes) => bytes.len() as u64,
        }
    }
}

impl TryFrom<&Value> for MapKey {
    type Error = EvalError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int(i) => Ok(MapKey::Int(*i)),
            Value::Str(s) => Ok(MapKey::Str(String::clone(s))),
            Value::BNum(b) => Ok(MapKey::BNum(*b)),
            Value::ByStrX(bytes) => Ok(MapKey::ByStrX(Vec::clone(bytes))),
            Value::ByStr(bytes) => Ok(MapKey::ByStr(Vec::clone(bytes))),
            other => Err(type_mismatch("a primitive map key", other.kind_name())),
        }
    }
}

/// A `Map K V` value with persistent, structurally shared entries.
#[derive(Clone, Debug, PartialEq)]
pub struct MapValue {
    pub key_ty: Type,
    pub val_ty: Type,
    pub entries: im::OrdMap<MapKey, Value>,
}

impl MapValue {
    pub fn new(key_ty: Type, val_ty: Type) -> Self {
        MapValue {
            key_ty,
            val_ty,
            entries: im::OrdMap::new(),
        }
    }

    /// An empty map of the given `Map K V` type.
    pub fn empty_of(ty: &Type) -> Option<Self> {
        match ty {
            Type::Map(k, v) => Some(MapValue::new(Type::clone(k), Type::clone(v))),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &MapKey) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &MapKey) -> bool {
        self.entries.contains_key(key)
    }

    /// A copy of this map with `key` bound to `value`.
    #[must_use]
    pub fn insert(&self, key: MapKey, value: Value) -> Self {
        MapValue {
            key_ty: self.key_ty.clone(),
            val_ty: self.val_ty.clone(),
            entries: self.entries.update(key, value),
        }
    }

    /// A copy of this map without `key`.
    #[must_use]
    pub fn remove(&self, key: &MapKey) -> Self {
        MapValue {
            key_ty: self.key_ty.clone(),
            val_ty: self.val_ty.clone(),
            entries: self.entries.without(key),
        }
    }

    /// The map's type.
    pub fn ty(&self) -> Type {
        Type::map(self.key_ty.clone(), self.val_ty.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Map(Heap::new(self))
    }
}
