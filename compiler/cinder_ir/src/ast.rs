//! Expressions, patterns and statements.
//!
//! The tree arrives already type-checked. Sub-expressions that become the
//! body of a runtime closure are held in an `Arc` so closures can share them
//! without cloning the tree.

use std::sync::Arc;

use crate::{CostExpr, Literal, Name, Span, Type};

/// An expression together with its source location.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    #[inline]
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    /// Build an expression at a generated location.
    #[inline]
    pub fn synthetic(kind: ExprKind) -> Self {
        Expr {
            kind,
            span: Span::DUMMY,
        }
    }
}

/// Right-hand side of a message entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Lit(Literal),
    Var(Name),
}

/// A clause of a `match` expression.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Var(Name),
    /// `let name : ty = rhs in body`.
    Let {
        name: Name,
        ty: Option<Type>,
        rhs: Box<Expr>,
        body: Box<Expr>,
    },
    /// `{ label : payload; ... }`, entries kept in source order.
    Message(Vec<(Name, Payload)>),
    /// `fun (param : param_ty) => body`.
    Fun {
        param: Name,
        param_ty: Type,
        body: Arc<Expr>,
    },
    /// `func arg1 arg2 ...`; arguments are applied one at a time.
    App { func: Name, args: Vec<Name> },
    /// `Ctor {tyargs} arg1 arg2 ...`.
    Constr {
        name: Name,
        tyargs: Vec<Type>,
        args: Vec<Name>,
    },
    Match {
        scrutinee: Name,
        arms: Vec<MatchArm>,
    },
    /// `builtin name arg1 arg2 ...`.
    Builtin { name: Name, args: Vec<Name> },
    /// `fix (name : ty) => body`; `body` evaluates to a function or type function.
    Fixpoint {
        name: Name,
        ty: Type,
        body: Arc<Expr>,
    },
    /// `tfun 'A => body`.
    TFun { tvar: Name, body: Arc<Expr> },
    /// `@func ty1 ty2 ...`.
    TApp { func: Name, tyargs: Vec<Type> },
    /// Charge `cost` before evaluating `body`.
    Gas { cost: CostExpr, body: Box<Expr> },
}

/// A pattern in a `match` clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    Wildcard,
    Binder(Name),
    Constructor(Name, Vec<Pattern>),
}

impl Pattern {
    /// Names bound by this pattern, left to right.
    pub fn binders(&self) -> Vec<&Name> {
        let mut out = Vec::new();
        self.collect_binders(&mut out);
        out
    }

    fn collect_binders<'a>(&'a self, out: &mut Vec<&'a Name>) {
        match self {
            Pattern::Wildcard => {}
            Pattern::Binder(name) => out.push(name),
            Pattern::Constructor(_, subs) => {
                for sub in subs {
                    sub.collect_binders(out);
                }
            }
        }
    }
}

/// A statement together with its source location.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    #[inline]
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }

    #[inline]
    pub fn synthetic(kind: StmtKind) -> Self {
        Stmt {
            kind,
            span: Span::DUMMY,
        }
    }
}

/// A clause of a `match` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct StmtArm {
    pub pattern: Pattern,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// `local <- field`.
    Load { local: Name, field: Name },
    /// `field := local`.
    Store { field: Name, local: Name },
    /// `local = expr`.
    Bind { local: Name, expr: Expr },
    /// `map[k1][k2] := value`, or `delete map[k1][k2]` when `value` is `None`.
    MapUpdate {
        map: Name,
        keys: Vec<Name>,
        value: Option<Name>,
    },
    /// `local <- map[k1][k2]` when `fetch`, `local <- exists map[k1][k2]` otherwise.
    MapGet {
        local: Name,
        map: Name,
        keys: Vec<Name>,
        fetch: bool,
    },
    /// `local <- & FACT`.
    ReadFromBc { local: Name, fact: Name },
    Match {
        scrutinee: Name,
        arms: Vec<StmtArm>,
    },
    AcceptPayment,
    SendMsgs(Name),
    CreateEvent(Name),
    CallProc { proc: Name, args: Vec<Name> },
    /// `forall list proc`.
    Iterate { list: Name, proc: Name },
    Throw(Option<Name>),
    /// Charge `cost` before the remaining statements run.
    Gas { cost: CostExpr },
}
