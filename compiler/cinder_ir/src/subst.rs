//! Capture-avoiding substitution of types into expressions.
//!
//! Applying a type function substitutes the concrete type for its bound
//! variable through the body before evaluating it. Nested `tfun` binders
//! that shadow the variable stop the substitution; binders that would
//! capture a free variable of the substituted type are renamed.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::ty::fresh_type_var;
use crate::{Expr, ExprKind, Literal, MatchArm, Name, Type};

/// Substitute `ty` for the type variable `tvar` throughout `expr`.
#[must_use]
pub fn subst_type_in_expr(expr: &Expr, tvar: &Name, ty: &Type) -> Expr {
    let kind = match &expr.kind {
        ExprKind::Literal(Literal::EmptyMap(k, v)) => {
            ExprKind::Literal(Literal::EmptyMap(k.subst(tvar, ty), v.subst(tvar, ty)))
        }
        ExprKind::Literal(_)
        | ExprKind::Var(_)
        | ExprKind::Message(_)
        | ExprKind::App { .. }
        | ExprKind::Builtin { .. } => expr.kind.clone(),
        ExprKind::Let {
            name,
            ty: annot,
            rhs,
            body,
        } => ExprKind::Let {
            name: name.clone(),
            ty: annot.as_ref().map(|t| t.subst(tvar, ty)),
            rhs: Box::new(subst_type_in_expr(rhs, tvar, ty)),
            body: Box::new(subst_type_in_expr(body, tvar, ty)),
        },
        ExprKind::Fun {
            param,
            param_ty,
            body,
        } => ExprKind::Fun {
            param: param.clone(),
            param_ty: param_ty.subst(tvar, ty),
            body: Arc::new(subst_type_in_expr(body, tvar, ty)),
        },
        ExprKind::Constr { name, tyargs, args } => ExprKind::Constr {
            name: name.clone(),
            tyargs: tyargs.iter().map(|t| t.subst(tvar, ty)).collect(),
            args: args.clone(),
        },
        ExprKind::Match { scrutinee, arms } => ExprKind::Match {
            scrutinee: scrutinee.clone(),
            arms: arms
                .iter()
                .map(|arm| MatchArm {
                    pattern: arm.pattern.clone(),
                    body: subst_type_in_expr(&arm.body, tvar, ty),
                })
                .collect(),
        },
        ExprKind::Fixpoint {
            name,
            ty: fix_ty,
            body,
        } => ExprKind::Fixpoint {
            name: name.clone(),
            ty: fix_ty.subst(tvar, ty),
            body: Arc::new(subst_type_in_expr(body, tvar, ty)),
        },
        ExprKind::TFun { tvar: bound, .. } if bound == tvar => expr.kind.clone(),
        ExprKind::TFun { tvar: bound, body } => {
            let ty_free = ty.free_vars();
            if ty_free.contains(bound) {
                let mut avoid = ty_free;
                avoid.insert(tvar.clone());
                collect_type_vars(body, &mut avoid);
                let renamed = fresh_type_var(bound, &avoid);
                let body = subst_type_in_expr(body, bound, &Type::TypeVar(renamed.clone()));
                ExprKind::TFun {
                    tvar: renamed,
                    body: Arc::new(subst_type_in_expr(&body, tvar, ty)),
                }
            } else {
                ExprKind::TFun {
                    tvar: bound.clone(),
                    body: Arc::new(subst_type_in_expr(body, tvar, ty)),
                }
            }
        }
        ExprKind::TApp { func, tyargs } => ExprKind::TApp {
            func: func.clone(),
            tyargs: tyargs.iter().map(|t| t.subst(tvar, ty)).collect(),
        },
        ExprKind::Gas { cost, body } => ExprKind::Gas {
            cost: cost.clone(),
            body: Box::new(subst_type_in_expr(body, tvar, ty)),
        },
    };
    Expr::new(kind, expr.span)
}

/// Every type variable mentioned anywhere in `expr`, bound or free.
fn collect_type_vars(expr: &Expr, out: &mut BTreeSet<Name>) {
    fn from_type(ty: &Type, out: &mut BTreeSet<Name>) {
        match ty {
            Type::Prim(_) | Type::Unit => {}
            Type::TypeVar(v) => {
                out.insert(v.clone());
            }
            Type::Map(a, b) | Type::Fun(a, b) => {
                from_type(a, out);
                from_type(b, out);
            }
            Type::Adt(_, args) => args.iter().for_each(|a| from_type(a, out)),
            Type::PolyFun(v, body) => {
                out.insert(v.clone());
                from_type(body, out);
            }
        }
    }

    match &expr.kind {
        ExprKind::Literal(Literal::EmptyMap(k, v)) => {
            from_type(k, out);
            from_type(v, out);
        }
        ExprKind::Literal(_)
        | ExprKind::Var(_)
        | ExprKind::Message(_)
        | ExprKind::App { .. }
        | ExprKind::Builtin { .. } => {}
        ExprKind::Let { ty, rhs, body, .. } => {
            if let Some(ty) = ty {
                from_type(ty, out);
            }
            collect_type_vars(rhs, out);
            collect_type_vars(body, out);
        }
        ExprKind::Fun { param_ty, body, .. } => {
            from_type(param_ty, out);
            collect_type_vars(body, out);
        }
        ExprKind::Constr { tyargs, .. } | ExprKind::TApp { tyargs, .. } => {
            tyargs.iter().for_each(|t| from_type(t, out));
        }
        ExprKind::Match { arms, .. } => {
            for arm in arms {
                collect_type_vars(&arm.body, out);
            }
        }
        ExprKind::Fixpoint { ty, body, .. } => {
            from_type(ty, out);
            collect_type_vars(body, out);
        }
        ExprKind::TFun { tvar, body } => {
            out.insert(tvar.clone());
            collect_type_vars(body, out);
        }
        ExprKind::Gas { body, .. } => collect_type_vars(body, out),
    }
}

#[cfg(test)]
mod tests;
