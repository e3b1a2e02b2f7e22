//! Cinder IR - the validated syntax tree consumed by the execution engine.
//!
//! Parsing and type checking happen upstream. Everything here is plain data:
//! identifiers, types, literals, expressions, statements, gas cost
//! annotations and the library/contract structure that ties them together.

mod ast;
mod contract;
mod cost;
mod literal;
mod name;
mod span;
pub mod subst;
mod ty;

pub use ast::{Expr, ExprKind, MatchArm, Pattern, Payload, Stmt, StmtArm, StmtKind};
pub use contract::{
    Component, ComponentKind, Contract, ContractModule, CtorDef, FieldDecl, LibEntry, LibTree,
    Library,
};
pub use cost::CostExpr;
pub use literal::{IntLit, Literal};
pub use name::Name;
pub use span::Span;
pub use subst::subst_type_in_expr;
pub use ty::{fresh_type_var, IntWidth, PrimType, Type};
