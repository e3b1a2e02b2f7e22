//! Expression evaluation.

use cinder_ir::{subst_type_in_expr, Expr, ExprKind, Literal, Name, Payload, Type};

use super::{match_pattern, Interpreter};
use crate::environment::Env;
use crate::errors::{
    arity_mismatch, non_exhaustive_match, non_serializable, not_a_function, not_a_type_closure,
    type_mismatch, EvalResult,
};
use crate::gas::eval_cost;
use crate::observer::EvalEvent;
use crate::value::{ClosureValue, Heap, TypeClosureValue, Value};

/// The runtime value of a source literal.
pub(crate) fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Int(i) => Value::Int(*i),
        Literal::String(s) => Value::string(s.as_str()),
        Literal::BNum(b) => Value::BNum(*b),
        Literal::ByStrX(bytes) => Value::bystrx(bytes.clone()),
        Literal::ByStr(bytes) => Value::bystr(bytes.clone()),
        Literal::EmptyMap(key_ty, val_ty) => Value::empty_map(key_ty.clone(), val_ty.clone()),
    }
}

fn lookup_all(env: &Env, names: &[Name]) -> EvalResult<Vec<Value>> {
    names.iter().map(|name| env.lookup(name)).collect()
}

impl Interpreter<'_> {
    /// Evaluate `expr` in `env`.
    ///
    /// Errors carry the span of the innermost expression that failed.
    pub fn eval(&mut self, expr: &Expr, env: &Env) -> EvalResult<Value> {
        self.enter(|this| this.eval_kind(expr, env))
            .map_err(|e| e.or_span(expr.span))
    }

    fn eval_kind(&mut self, expr: &Expr, env: &Env) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(literal_value(lit)),
            ExprKind::Var(name) => env.lookup(name),
            ExprKind::Let { name, rhs, body, .. } => {
                let value = self.eval(rhs, env)?;
                self.eval(body, &env.bind(name.clone(), value))
            }
            ExprKind::Message(entries) => {
                let mut fields = Vec::with_capacity(entries.len());
                for (label, payload) in entries {
                    let value = match payload {
                        Payload::Lit(lit) => literal_value(lit),
                        Payload::Var(name) => env.lookup(name)?,
                    };
                    if !value.is_pure() {
                        return Err(non_serializable(format!("message entry {label}")));
                    }
                    fields.push((label.clone(), value));
                }
                Ok(Value::message(fields))
            }
            ExprKind::Fun {
                param,
                param_ty,
                body,
            } => Ok(Value::Closure(Heap::new(ClosureValue {
                param: param.clone(),
                param_ty: param_ty.clone(),
                body: body.clone(),
                captures: env.clone(),
                fix: None,
            }))),
            ExprKind::App { func, args } => {
                let mut callee = env.lookup(func)?;
                // Arguments are resolved in the caller's environment before any
                // application happens.
                let args = lookup_all(env, args)?;
                for arg in args {
                    callee = self.apply(callee, arg)?;
                }
                Ok(callee)
            }
            ExprKind::Constr { name, tyargs, args } => {
                let ctor = self.datatypes().constructor(name)?;
                if ctor.arity() != args.len() {
                    return Err(arity_mismatch(name, ctor.arity(), args.len()));
                }
                let type_name = ctor.type_name.clone();
                let values = lookup_all(env, args)?;
                if let Some(bad) = values.iter().find(|v| !v.is_pure()) {
                    return Err(type_mismatch(
                        format!("data as argument of {name}"),
                        bad.kind_name(),
                    ));
                }
                Ok(Value::adt(type_name, name.clone(), tyargs.clone(), values))
            }
            ExprKind::Match { scrutinee, arms } => {
                let value = env.lookup(scrutinee)?;
                for arm in arms {
                    if let Some(bindings) = match_pattern(&arm.pattern, &value) {
                        return self.eval(&arm.body, &env.bind_all(bindings));
                    }
                }
                Err(non_exhaustive_match(scrutinee))
            }
            ExprKind::Builtin { name, args } => {
                let values = lookup_all(env, args)?;
                let arg_types = values
                    .iter()
                    .map(Value::type_of)
                    .collect::<EvalResult<Vec<Type>>>()?;
                let resolved = self.builtins.resolve(name, &arg_types)?;
                let cost = (resolved.cost)(&values);
                self.charged(cost, expr.span, |this| {
                    this.observe(EvalEvent::BuiltinCalled {
                        name: resolved.name,
                    });
                    (resolved.op)(&values)
                })
            }
            ExprKind::Fixpoint { name, ty, body } => match &body.kind {
                ExprKind::Fun {
                    param,
                    param_ty,
                    body: inner,
                } => Ok(Value::Closure(Heap::new(ClosureValue {
                    param: param.clone(),
                    param_ty: param_ty.clone(),
                    body: inner.clone(),
                    captures: env.clone(),
                    fix: Some(name.clone()),
                }))),
                ExprKind::TFun { tvar, body: inner } => {
                    Ok(Value::TypeClosure(Heap::new(TypeClosureValue {
                        tvar: tvar.clone(),
                        body: inner.clone(),
                        captures: env.clone(),
                        fix: Some(name.clone()),
                    })))
                }
                _ => Err(type_mismatch(
                    format!("a function as the body of fix {name} : {ty}"),
                    "a non-function expression",
                )),
            },
            ExprKind::TFun { tvar, body } => Ok(Value::TypeClosure(Heap::new(TypeClosureValue {
                tvar: tvar.clone(),
                body: body.clone(),
                captures: env.clone(),
                fix: None,
            }))),
            ExprKind::TApp { func, tyargs } => {
                let mut callee = env.lookup(func)?;
                for ty in tyargs {
                    callee = self.apply_type(callee, ty)?;
                }
                Ok(callee)
            }
            ExprKind::Gas { cost, body } => {
                let cost = eval_cost(cost, env)?;
                self.charged(cost, expr.span, |this| this.eval(body, env))
            }
        }
    }

    /// Apply a closure to one argument.
    pub fn apply(&mut self, callee: Value, arg: Value) -> EvalResult<Value> {
        let Value::Closure(closure) = &callee else {
            return Err(not_a_function(&callee.kind_name()));
        };
        let mut env = closure.captures.clone();
        if let Some(fix) = &closure.fix {
            env = env.bind(fix.clone(), callee.clone());
        }
        let env = env.bind(closure.param.clone(), arg);
        self.eval(&closure.body, &env)
    }

    /// Instantiate a type closure at `ty`.
    pub fn apply_type(&mut self, callee: Value, ty: &Type) -> EvalResult<Value> {
        let Value::TypeClosure(tclosure) = &callee else {
            return Err(not_a_type_closure(&callee.kind_name()));
        };
        let body = subst_type_in_expr(&tclosure.body, &tclosure.tvar, ty);
        let mut env = tclosure.captures.clone();
        if let Some(fix) = &tclosure.fix {
            env = env.bind(fix.clone(), callee.clone());
        }
        self.eval(&body, &env)
    }
}
