use pretty_assertions::assert_eq;

use super::*;
use crate::Span;

fn a() -> Name {
    Name::new("'A")
}

fn nil_of(ty: Type) -> Expr {
    Expr::synthetic(ExprKind::Constr {
        name: Name::new("Nil"),
        tyargs: vec![ty],
        args: Vec::new(),
    })
}

#[test]
fn test_subst_constructor_tyargs() {
    let expr = nil_of(Type::var("'A"));
    assert_eq!(
        subst_type_in_expr(&expr, &a(), &Type::uint32()),
        nil_of(Type::uint32())
    );
}

#[test]
fn test_subst_preserves_spans() {
    let expr = Expr::new(
        ExprKind::Literal(Literal::EmptyMap(Type::var("'A"), Type::string())),
        Span::new(3, 7),
    );
    let out = subst_type_in_expr(&expr, &a(), &Type::bnum());
    assert_eq!(out.span, Span::new(3, 7));
    assert_eq!(
        out.kind,
        ExprKind::Literal(Literal::EmptyMap(Type::bnum(), Type::string()))
    );
}

#[test]
fn test_subst_stops_at_shadowing_tfun() {
    let expr = Expr::synthetic(ExprKind::TFun {
        tvar: a(),
        body: Arc::new(nil_of(Type::var("'A"))),
    });
    assert_eq!(subst_type_in_expr(&expr, &a(), &Type::uint32()), expr);
}

#[test]
fn test_subst_renames_capturing_tfun() {
    // tfun 'B => Nil {('A -> 'B)}   with 'A := 'B
    let b = Name::new("'B");
    let expr = Expr::synthetic(ExprKind::TFun {
        tvar: b.clone(),
        body: Arc::new(nil_of(Type::fun(Type::var("'A"), Type::var("'B")))),
    });
    let out = subst_type_in_expr(&expr, &a(), &Type::TypeVar(b.clone()));
    let ExprKind::TFun { tvar, body } = out.kind else {
        panic!("expected a type function");
    };
    assert_ne!(tvar, b);
    assert_eq!(
        *body,
        nil_of(Type::fun(Type::TypeVar(b), Type::TypeVar(tvar.clone())))
    );
}

#[test]
fn test_subst_reaches_function_bodies() {
    let expr = Expr::synthetic(ExprKind::Fun {
        param: Name::new("x"),
        param_ty: Type::var("'A"),
        body: Arc::new(nil_of(Type::var("'A"))),
    });
    let out = subst_type_in_expr(&expr, &a(), &Type::string());
    let ExprKind::Fun { param_ty, body, .. } = out.kind else {
        panic!("expected a function");
    };
    assert_eq!(param_ty, Type::string());
    assert_eq!(*body, nil_of(Type::string()));
}
