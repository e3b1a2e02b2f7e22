//! State backend interface and the in-memory field store.
//!
//! The evaluator reads and writes contract fields only through
//! `StateBackend`. `FieldStore` keeps every field in memory and is what
//! message dispatch runs against, so a failed invocation can simply drop it.

use cinder_ir::{Name, Type};

use crate::value::{MapKey, MapValue, Value};

/// Failure reported by a state backend.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("no field named {0}")]
    UnknownField(Name),
    #[error("field {field} is not a map")]
    NotAMap { field: Name },
    #[error("field {field} has type {expected}, cannot hold {got}")]
    TypeMismatch {
        field: Name,
        expected: String,
        got: String,
    },
    #[error("invalid key for {field}: {detail}")]
    InvalidKey { field: Name, detail: String },
    #[error("too many keys for {field}: nesting depth is {depth}")]
    TooManyKeys { field: Name, depth: usize },
}

/// Capability interface over persistent contract state.
pub trait StateBackend {
    /// Read a whole field.
    fn load(&mut self, field: &Name) -> Result<Value, BackendError>;

    /// Overwrite a whole field.
    fn store(&mut self, field: &Name, value: Value) -> Result<(), BackendError>;

    /// Insert or overwrite `map[keys...]`, or delete it when `value` is `None`.
    fn map_update(
        &mut self,
        map: &Name,
        keys: &[Value],
        value: Option<Value>,
    ) -> Result<(), BackendError>;

    /// Look up `map[keys...]`.
    ///
    /// When `fetch` is false only presence is reported; the returned value
    /// is then unspecified and must not be inspected.
    fn map_get(
        &mut self,
        map: &Name,
        keys: &[Value],
        fetch: bool,
    ) -> Result<Option<Value>, BackendError>;
}

/// A named, typed field and its current value.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldState {
    pub name: Name,
    pub ty: Type,
    pub value: Value,
}

/// In-memory backend holding fields in declaration order.
#[derive(Clone, Debug, Default)]
pub struct FieldStore {
    fields: Vec<FieldState>,
}

impl FieldStore {
    pub fn new(fields: Vec<FieldState>) -> Self {
        FieldStore { fields }
    }

    pub fn fields(&self) -> &[FieldState] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<FieldState> {
        self.fields
    }

    pub fn get(&self, name: &Name) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.name == *name)
            .map(|f| &f.value)
    }

    fn field_mut(&mut self, name: &Name) -> Result<&mut FieldState, BackendError> {
        self.fields
            .iter_mut()
            .find(|f| f.name == *name)
            .ok_or_else(|| BackendError::UnknownField(name.clone()))
    }

    fn map_field(&self, name: &Name) -> Result<&MapValue, BackendError> {
        let field = self
            .fields
            .iter()
            .find(|f| f.name == *name)
            .ok_or_else(|| BackendError::UnknownField(name.clone()))?;
        field.value.as_map().ok_or_else(|| BackendError::NotAMap {
            field: name.clone(),
        })
    }
}

fn to_keys(field: &Name, keys: &[Value]) -> Result<Vec<MapKey>, BackendError> {
    keys.iter()
        .map(|k| {
            MapKey::try_from(k).map_err(|err| BackendError::InvalidKey {
                field: field.clone(),
                detail: err.message,
            })
        })
        .collect()
}

/// Fail unless `key` has the key type of `map`.
fn check_key(field: &Name, map: &MapValue, key: &MapKey) -> Result<(), BackendError> {
    let ty = key.to_value().type_of().map_err(|err| BackendError::InvalidKey {
        field: field.clone(),
        detail: err.message,
    })?;
    if ty != map.key_ty {
        return Err(BackendError::InvalidKey {
            field: field.clone(),
            detail: format!("expected a {} key, got {ty}", map.key_ty),
        });
    }
    Ok(())
}

/// Fail unless `value` can be stored as an entry of `map`.
fn check_entry(field: &Name, map: &MapValue, value: &Value) -> Result<(), BackendError> {
    let got = match value.type_of() {
        Ok(ty) if ty == map.val_ty => return Ok(()),
        Ok(ty) => ty.to_string(),
        Err(_) => value.kind_name(),
    };
    Err(BackendError::TypeMismatch {
        field: field.clone(),
        expected: map.val_ty.to_string(),
        got,
    })
}

/// `map` with `value` written at `keys`, creating intermediate maps as needed.
fn updated(
    field: &Name,
    map: &MapValue,
    keys: &[MapKey],
    value: Option<Value>,
) -> Result<MapValue, BackendError> {
    match keys {
        [] => Ok(map.clone()),
        [key] => {
            check_key(field, map, key)?;
            Ok(match value {
                Some(v) => {
                    check_entry(field, map, &v)?;
                    map.insert(key.clone(), v)
                }
                None => map.remove(key),
            })
        }
        [key, rest @ ..] => {
            check_key(field, map, key)?;
            let inner = match map.get(key) {
                Some(Value::Map(inner)) => MapValue::clone(inner),
                Some(_) => {
                    return Err(BackendError::TooManyKeys {
                        field: field.clone(),
                        depth: 1,
                    })
                }
                None if value.is_none() => return Ok(map.clone()),
                None => MapValue::empty_of(&map.val_ty).ok_or_else(|| {
                    BackendError::TooManyKeys {
                        field: field.clone(),
                        depth: 1,
                    }
                })?,
            };
            let inner = updated(field, &inner, rest, value)?;
            Ok(map.insert(key.clone(), inner.into_value()))
        }
    }
}

impl StateBackend for FieldStore {
    fn load(&mut self, field: &Name) -> Result<Value, BackendError> {
        self.get(field)
            .cloned()
            .ok_or_else(|| BackendError::UnknownField(field.clone()))
    }

    fn store(&mut self, field: &Name, value: Value) -> Result<(), BackendError> {
        let slot = self.field_mut(field)?;
        match value.type_of() {
            Ok(ty) if ty == slot.ty => {
                slot.value = value;
                Ok(())
            }
            Ok(ty) => Err(BackendError::TypeMismatch {
                field: field.clone(),
                expected: slot.ty.to_string(),
                got: ty.to_string(),
            }),
            Err(_) => Err(BackendError::TypeMismatch {
                field: field.clone(),
                expected: slot.ty.to_string(),
                got: value.kind_name(),
            }),
        }
    }

    fn map_update(
        &mut self,
        map: &Name,
        keys: &[Value],
        value: Option<Value>,
    ) -> Result<(), BackendError> {
        let keys = to_keys(map, keys)?;
        let current = self.map_field(map)?;
        let next = updated(map, current, &keys, value)?;
        self.field_mut(map)?.value = next.into_value();
        Ok(())
    }

    fn map_get(
        &mut self,
        map: &Name,
        keys: &[Value],
        _fetch: bool,
    ) -> Result<Option<Value>, BackendError> {
        let keys = to_keys(map, keys)?;
        let mut current = self.map_field(map)?;
        let Some((last, path)) = keys.split_last() else {
            return Ok(Some(current.clone().into_value()));
        };
        for (depth, key) in path.iter().enumerate() {
            check_key(map, current, key)?;
            match current.get(key) {
                Some(Value::Map(inner)) => current = &**inner,
                Some(_) => {
                    return Err(BackendError::TooManyKeys {
                        field: map.clone(),
                        depth: depth + 1,
                    })
                }
                None => return Ok(None),
            }
        }
        check_key(map, current, last)?;
        Ok(current.get(last).cloned())
    }
}
