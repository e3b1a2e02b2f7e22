//! Serialization of pure values.
//!
//! This is the boundary at which values leave the engine, as persisted field
//! contents or as outgoing messages. A closure or type closure anywhere in
//! the value makes serialization fail.

use serde::ser::{Error as _, Serialize, Serializer};

use super::Value;

struct Entries<'a>(Vec<(&'a str, &'a Value)>);

impl Serialize for Entries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

struct MapEntries(Vec<(Value, Value)>);

impl Serialize for MapEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(i) => serializer.serialize_newtype_variant("Value", 0, "Int", &i.to_string()),
            Value::Str(s) => serializer.serialize_newtype_variant("Value", 1, "Str", s.as_str()),
            Value::BNum(b) => serializer.serialize_newtype_variant("Value", 2, "BNum", b),
            Value::ByStrX(bytes) => {
                serializer.serialize_newtype_variant("Value", 3, "ByStrX", bytes.as_slice())
            }
            Value::ByStr(bytes) => {
                serializer.serialize_newtype_variant("Value", 4, "ByStr", bytes.as_slice())
            }
            Value::Map(m) => {
                let entries = m
                    .entries
                    .iter()
                    .map(|(k, v)| (k.to_value(), v.clone()))
                    .collect();
                serializer.serialize_newtype_variant("Value", 5, "Map", &MapEntries(entries))
            }
            Value::Adt(adt) => serializer.serialize_newtype_variant(
                "Value",
                6,
                "Adt",
                &(adt.ctor.as_str(), &adt.args),
            ),
            Value::Msg(entries) => {
                let entries = entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
                serializer.serialize_newtype_variant("Value", 7, "Msg", &Entries(entries))
            }
            Value::Closure(_) | Value::TypeClosure(_) => Err(S::Error::custom(format!(
                "{} cannot be serialized",
                self.kind_name()
            ))),
        }
    }
}
