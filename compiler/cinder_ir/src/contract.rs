//! Libraries and contracts.

use crate::{Expr, Name, Stmt, Type};

/// A constructor of a library-defined algebraic type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CtorDef {
    pub name: Name,
    pub arg_types: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LibEntry {
    /// `let name : ty = expr`.
    Var {
        name: Name,
        ty: Option<Type>,
        expr: Expr,
    },
    /// `type name 'tparams = | Ctor of ... | ...`.
    Type {
        name: Name,
        tparams: Vec<Name>,
        ctors: Vec<CtorDef>,
    },
}

impl LibEntry {
    /// The name this entry exports.
    pub fn name(&self) -> &Name {
        match self {
            LibEntry::Var { name, .. } | LibEntry::Type { name, .. } => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Library {
    pub name: Name,
    pub entries: Vec<LibEntry>,
}

/// A library with the libraries it imports.
#[derive(Clone, Debug, PartialEq)]
pub struct LibTree {
    pub lib: Library,
    pub deps: Vec<LibTree>,
}

impl LibTree {
    pub fn leaf(lib: Library) -> Self {
        LibTree {
            lib,
            deps: Vec::new(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    Transition,
    Procedure,
}

/// A transition or procedure.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub kind: ComponentKind,
    pub name: Name,
    pub params: Vec<(Name, Type)>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub name: Name,
    pub ty: Type,
    pub init: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Contract {
    pub name: Name,
    pub params: Vec<(Name, Type)>,
    /// Must evaluate to `True` for deployment to succeed.
    pub constraint: Expr,
    pub fields: Vec<FieldDecl>,
    /// Components in declaration order.
    pub components: Vec<Component>,
}

/// A deployable unit: the contract, its own library and imported libraries.
#[derive(Clone, Debug, PartialEq)]
pub struct ContractModule {
    pub library: Option<Library>,
    pub imports: Vec<LibTree>,
    pub contract: Contract,
}
