//! Runtime values.
//!
//! `Value` is the tagged domain the evaluator computes over. Scalars and
//! strings are stored inline or behind a `Heap` handle; algebraic values,
//! messages and maps are immutable once built, so cloning a value never
//! copies its payload.
//!
//! Closures and type closures are data: the parameter, a shared pointer to
//! the body expression and the captured environment. Keeping them
//! inspectable lets every serialization boundary reject them through
//! `is_pure` instead of trusting the caller.

mod heap;
mod map;
mod serialize;

use std::fmt;
use std::sync::Arc;

use cinder_ir::{Expr, IntLit, Name, Type};

use crate::environment::Env;
use crate::errors::{type_mismatch, EvalResult};

pub use heap::Heap;
pub use map::{MapKey, MapValue};

/// Label of a message's tag entry.
pub const TAG_LABEL: &str = "_tag";
/// Label of a message's amount entry.
pub const AMOUNT_LABEL: &str = "_amount";
/// Label of a message's sender entry.
pub const SENDER_LABEL: &str = "_sender";
/// Label of a message's origin entry.
pub const ORIGIN_LABEL: &str = "_origin";
/// Label of an outgoing message's recipient entry.
pub const RECIPIENT_LABEL: &str = "_recipient";
/// Label of an event's name entry.
pub const EVENTNAME_LABEL: &str = "_eventname";

/// An algebraic data value: constructor plus its type and value arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct AdtValue {
    pub type_name: Name,
    pub ctor: Name,
    pub tyargs: Vec<Type>,
    pub args: Vec<Value>,
}

/// A one-argument function closed over its defining environment.
#[derive(Clone)]
pub struct ClosureValue {
    pub param: Name,
    pub param_ty: Type,
    pub body: Arc<Expr>,
    pub captures: Env,
    /// Set for closures produced by `fix`; the name is rebound to the closure
    /// itself on every application.
    pub fix: Option<Name>,
}

/// A type function closed over its defining environment.
#[derive(Clone)]
pub struct TypeClosureValue {
    pub tvar: Name,
    pub body: Arc<Expr>,
    pub captures: Env,
    pub fix: Option<Name>,
}

impl fmt::Debug for ClosureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureValue")
            .field("param", &self.param)
            .field("param_ty", &self.param_ty)
            .field("fix", &self.fix)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for TypeClosureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeClosureValue")
            .field("tvar", &self.tvar)
            .field("fix", &self.fix)
            .finish_non_exhaustive()
    }
}

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Int(IntLit),
    Str(Heap<String>),
    BNum(u64),
    ByStrX(Heap<Vec<u8>>),
    ByStr(Heap<Vec<u8>>),
    Map(Heap<MapValue>),
    Adt(Heap<AdtValue>),
    /// Message or event payload, entries in construction order.
    Msg(Heap<Vec<(Name, Value)>>),
    Closure(Heap<ClosureValue>),
    TypeClosure(Heap<TypeClosureValue>),
}

// Factory methods

impl Value {
    #[inline]
    pub fn uint32(v: u32) -> Self {
        Value::Int(IntLit::U32(v))
    }

    #[inline]
    pub fn uint128(v: u128) -> Self {
        Value::Int(IntLit::U128(v))
    }

    #[inline]
    pub fn int32(v: i32) -> Self {
        Value::Int(IntLit::I32(v))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    pub fn bystrx(bytes: Vec<u8>) -> Self {
        Value::ByStrX(Heap::new(bytes))
    }

    pub fn bystr(bytes: Vec<u8>) -> Self {
        Value::ByStr(Heap::new(bytes))
    }

    /// A 20-byte account address.
    pub fn address(bytes: [u8; 20]) -> Self {
        Value::bystrx(bytes.to_vec())
    }

    pub fn adt(
        type_name: impl Into<Name>,
        ctor: impl Into<Name>,
        tyargs: Vec<Type>,
        args: Vec<Value>,
    ) -> Self {
        Value::Adt(Heap::new(AdtValue {
            type_name: type_name.into(),
            ctor: ctor.into(),
            tyargs,
            args,
        }))
    }

    pub fn bool(b: bool) -> Self {
        Value::adt("Bool", if b { "True" } else { "False" }, Vec::new(), Vec::new())
    }

    pub fn some(ty: Type, v: Value) -> Self {
        Value::adt("Option", "Some", vec![ty], vec![v])
    }

    pub fn none(ty: Type) -> Self {
        Value::adt("Option", "None", vec![ty], Vec::new())
    }

    pub fn nil(elem: Type) -> Self {
        Value::adt("List", "Nil", vec![elem], Vec::new())
    }

    pub fn cons(elem: Type, head: Value, tail: Value) -> Self {
        Value::adt("List", "Cons", vec![elem], vec![head, tail])
    }

    /// A list built from `items`, first item at the head.
    pub fn list(elem: Type, items: Vec<Value>) -> Self {
        items
            .into_iter()
            .rev()
            .fold(Value::nil(elem.clone()), |tail, head| {
                Value::cons(elem.clone(), head, tail)
            })
    }

    pub fn message(entries: Vec<(Name, Value)>) -> Self {
        Value::Msg(Heap::new(entries))
    }

    pub fn empty_map(key_ty: Type, val_ty: Type) -> Self {
        MapValue::new(key_ty, val_ty).into_value()
    }
}

// Inspection

impl Value {
    /// Short description of the value's shape, for error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Value::Int(i) => i.prim_type().to_string(),
            Value::Str(_) => "String".to_string(),
            Value::BNum(_) => "BNum".to_string(),
            Value::ByStrX(bytes) => format!("ByStr{}", bytes.len()),
            Value::ByStr(_) => "ByStr".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::Adt(adt) => adt.type_name.to_string(),
            Value::Msg(_) => "Message".to_string(),
            Value::Closure(_) => "closure".to_string(),
            Value::TypeClosure(_) => "type closure".to_string(),
        }
    }

    /// Whether the value is free of closures and type closures at any depth.
    ///
    /// Only pure values may be stored in fields or carried by messages.
    pub fn is_pure(&self) -> bool {
        match self {
            Value::Int(_)
            | Value::Str(_)
            | Value::BNum(_)
            | Value::ByStrX(_)
            | Value::ByStr(_) => true,
            Value::Map(m) => m.entries.values().all(Value::is_pure),
            Value::Adt(adt) => adt.args.iter().all(Value::is_pure),
            Value::Msg(entries) => entries.iter().all(|(_, v)| v.is_pure()),
            Value::Closure(_) | Value::TypeClosure(_) => false,
        }
    }

    /// The runtime type of a value.
    ///
    /// Closures carry no result type at runtime and cannot be typed.
    pub fn type_of(&self) -> EvalResult<Type> {
        match self {
            Value::Int(i) => Ok(Type::Prim(i.prim_type())),
            Value::Str(_) => Ok(Type::string()),
            Value::BNum(_) => Ok(Type::bnum()),
            Value::ByStrX(bytes) => u32::try_from(bytes.len())
                .map(Type::bystrx)
                .map_err(|_| type_mismatch("a byte string of representable width", "ByStr")),
            Value::ByStr(_) => Ok(Type::Prim(cinder_ir::PrimType::ByStr)),
            Value::Map(m) => Ok(m.ty()),
            Value::Adt(adt) => Ok(Type::Adt(adt.type_name.clone(), adt.tyargs.clone())),
            Value::Msg(_) => Ok(Type::message()),
            Value::Closure(_) | Value::TypeClosure(_) => {
                Err(type_mismatch("a value with a runtime type", self.kind_name()))
            }
        }
    }

    /// Size of the value's serialized form, as counted by `SizeOf`.
    pub fn literal_size(&self) -> u64 {
        match self {
            Value::Int(i) => i.width().bytes(),
            Value::Str(s) => s.len() as u64,
            Value::BNum(_) => 8,
            Value::ByStrX(bytes) | Value::ByStr(bytes) => bytes.len() as u64,
            Value::Map(m) => m.entries.iter().fold(0u64, |acc, (k, v)| {
                acc.saturating_add(k.literal_size())
                    .saturating_add(v.literal_size())
            }),
            Value::Adt(adt) => adt
                .args
                .iter()
                .fold(1u64, |acc, v| acc.saturating_add(v.literal_size())),
            Value::Msg(entries) => entries.iter().fold(0u64, |acc, (label, v)| {
                acc.saturating_add(label.as_str().len() as u64)
                    .saturating_add(v.literal_size())
            }),
            Value::Closure(_) | Value::TypeClosure(_) => 0,
        }
    }

    /// `Some(b)` for the `True`/`False` constructors of `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Adt(adt) if adt.type_name == "Bool" && adt.args.is_empty() => {
                match adt.ctor.as_str() {
                    "True" => Some(true),
                    "False" => Some(false),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<IntLit> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The value of a `Uint128`.
    pub fn as_uint128(&self) -> Option<u128> {
        match self {
            Value::Int(IntLit::U128(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&[(Name, Value)]> {
        match self {
            Value::Msg(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up an entry of a message value by label.
    pub fn message_entry(&self, label: &str) -> Option<&Value> {
        self.as_message()?
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, v)| v)
    }

    /// The elements of a `Cons`/`Nil` list, head first.
    pub fn list_elements(&self) -> Option<Vec<Value>> {
        let mut out = Vec::new();
        let mut cursor = self;
        loop {
            let Value::Adt(adt) = cursor else {
                return None;
            };
            if adt.type_name != "List" {
                return None;
            }
            match (adt.ctor.as_str(), adt.args.as_slice()) {
                ("Nil", []) => return Some(out),
                ("Cons", [head, tail]) => {
                    out.push(head.clone());
                    cursor = tail;
                }
                _ => return None,
            }
        }
    }
}

impl PartialEq for Value {
    /// Structural equality. Closures are never equal, not even to themselves.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::BNum(a), Value::BNum(b)) => a == b,
            (Value::ByStrX(a), Value::ByStrX(b)) | (Value::ByStr(a), Value::ByStr(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Adt(a), Value::Adt(b)) => a == b,
            (Value::Msg(a), Value::Msg(b)) => a == b,
            _ => false,
        }
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("0x")?;
    for byte in bytes {
        write!(f, "{byte:02x}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => write!(f, "{:?}", s.as_str()),
            Value::BNum(b) => write!(f, "BNum {b}"),
            Value::ByStrX(bytes) | Value::ByStr(bytes) => write_hex(f, bytes),
            Value::Map(m) => {
                f.write_str("[")?;
                for (i, (k, v)) in m.entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{} => {v}", k.to_value())?;
                }
                f.write_str("]")
            }
            Value::Adt(adt) => {
                if adt.args.is_empty() {
                    return write!(f, "{}", adt.ctor);
                }
                write!(f, "({}", adt.ctor)?;
                for arg in &adt.args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            Value::Msg(entries) => {
                f.write_str("{")?;
                for (i, (label, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    write!(f, " {label} : {v}")?;
                }
                f.write_str(" }")
            }
            Value::Closure(_) => f.write_str("<closure>"),
            Value::TypeClosure(_) => f.write_str("<type closure>"),
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
