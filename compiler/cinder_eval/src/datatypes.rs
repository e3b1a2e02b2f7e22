//! Algebraic data type dictionary.
//!
//! Maps each constructor to its owning type, arity and declared argument
//! types. The standard types are registered up front; library type
//! definitions extend a copy of the dictionary while libraries load.

use cinder_ir::{CtorDef, Name, Type};
use rustc_hash::FxHashMap;

use crate::errors::{library_error, unknown_constructor, EvalResult};

/// A registered constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constructor {
    pub name: Name,
    pub type_name: Name,
    pub tparams: Vec<Name>,
    pub arg_types: Vec<Type>,
}

impl Constructor {
    #[inline]
    pub fn arity(&self) -> usize {
        self.arg_types.len()
    }
}

/// A registered algebraic type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataType {
    pub name: Name,
    pub tparams: Vec<Name>,
    pub ctors: Vec<Name>,
}

#[derive(Clone, Debug, Default)]
pub struct DataTypes {
    types: FxHashMap<Name, DataType>,
    ctors: FxHashMap<Name, Constructor>,
}

impl DataTypes {
    /// An empty dictionary.
    pub fn empty() -> Self {
        DataTypes::default()
    }

    /// `Bool`, `Option`, `List`, `Pair` and `Nat`.
    pub fn standard() -> Self {
        let mut dict = DataTypes::empty();
        let a = || Type::var("'A");
        let b = || Type::var("'B");
        let standard = [
            (
                "Bool",
                vec![],
                vec![("True", vec![]), ("False", vec![])],
            ),
            (
                "Option",
                vec!["'A"],
                vec![("Some", vec![a()]), ("None", vec![])],
            ),
            (
                "List",
                vec!["'A"],
                vec![("Cons", vec![a(), Type::list(a())]), ("Nil", vec![])],
            ),
            (
                "Pair",
                vec!["'A", "'B"],
                vec![("Pair", vec![a(), b()])],
            ),
            (
                "Nat",
                vec![],
                vec![
                    ("Zero", vec![]),
                    ("Succ", vec![Type::Adt(Name::new("Nat"), Vec::new())]),
                ],
            ),
        ];
        for (name, tparams, ctors) in standard {
            let tparams = tparams.into_iter().map(Name::new).collect();
            let ctors = ctors
                .into_iter()
                .map(|(ctor, arg_types)| CtorDef {
                    name: Name::new(ctor),
                    arg_types,
                })
                .collect::<Vec<_>>();
            dict.insert(Name::new(name), tparams, &ctors);
        }
        dict
    }

    fn insert(&mut self, name: Name, tparams: Vec<Name>, ctors: &[CtorDef]) {
        for ctor in ctors {
            self.ctors.insert(
                ctor.name.clone(),
                Constructor {
                    name: ctor.name.clone(),
                    type_name: name.clone(),
                    tparams: tparams.clone(),
                    arg_types: ctor.arg_types.clone(),
                },
            );
        }
        self.types.insert(
            name.clone(),
            DataType {
                name,
                tparams,
                ctors: ctors.iter().map(|c| c.name.clone()).collect(),
            },
        );
    }

    /// Register a library-defined type.
    ///
    /// Fails if the type or any of its constructors is already registered.
    pub fn register(&mut self, name: &Name, tparams: &[Name], ctors: &[CtorDef]) -> EvalResult<()> {
        if self.types.contains_key(name) {
            return Err(library_error(format!("type {name} is already defined")));
        }
        let mut seen = Vec::with_capacity(ctors.len());
        for ctor in ctors {
            if self.ctors.contains_key(&ctor.name) || seen.contains(&&ctor.name) {
                return Err(library_error(format!(
                    "constructor {} is already defined",
                    ctor.name
                )));
            }
            seen.push(&ctor.name);
        }
        self.insert(name.clone(), tparams.to_vec(), ctors);
        tracing::debug!(type_name = %name, ctors = ctors.len(), "registered data type");
        Ok(())
    }

    pub fn constructor(&self, name: &Name) -> EvalResult<&Constructor> {
        self.ctors.get(name).ok_or_else(|| unknown_constructor(name))
    }

    pub fn data_type(&self, name: &Name) -> Option<&DataType> {
        self.types.get(name)
    }

    pub fn has_type(&self, name: &Name) -> bool {
        self.types.contains_key(name)
    }
}
