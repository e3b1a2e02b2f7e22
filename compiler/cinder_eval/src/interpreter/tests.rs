use std::sync::Arc;

use cinder_ir::{
    Component, ComponentKind, CostExpr, Expr, ExprKind, Literal, MatchArm, Name, Pattern, Payload,
    Span, Stmt, StmtArm, StmtKind, Type,
};
use pretty_assertions::assert_eq;
use rustc_hash::FxHashMap;

use super::*;
use crate::blockchain::BlockchainContext;
use crate::builtins::StdBuiltins;
use crate::config::Configuration;
use crate::environment::Env;
use crate::errors::{EvalError, EvalErrorKind};
use crate::observer::{NoopObserver, RecordingObserver};
use crate::state::{FieldState, FieldStore};
use crate::value::Value;

const GAS: u64 = 10_000;

fn n(s: &str) -> Name {
    Name::new(s)
}

fn e(kind: ExprKind) -> Expr {
    Expr::synthetic(kind)
}

fn var(name: &str) -> Expr {
    e(ExprKind::Var(n(name)))
}

fn lit(v: u32) -> Expr {
    e(ExprKind::Literal(Literal::uint32(v)))
}

fn let_in(name: &str, rhs: Expr, body: Expr) -> Expr {
    e(ExprKind::Let {
        name: n(name),
        ty: None,
        rhs: Box::new(rhs),
        body: Box::new(body),
    })
}

fn fun(param: &str, ty: Type, body: Expr) -> Expr {
    e(ExprKind::Fun {
        param: n(param),
        param_ty: ty,
        body: Arc::new(body),
    })
}

fn app(func: &str, args: &[&str]) -> Expr {
    e(ExprKind::App {
        func: n(func),
        args: args.iter().map(|a| n(a)).collect(),
    })
}

fn builtin(name: &str, args: &[&str]) -> Expr {
    e(ExprKind::Builtin {
        name: n(name),
        args: args.iter().map(|a| n(a)).collect(),
    })
}

fn ctor(name: &str, tyargs: Vec<Type>, args: &[&str]) -> Expr {
    e(ExprKind::Constr {
        name: n(name),
        tyargs,
        args: args.iter().map(|a| n(a)).collect(),
    })
}

fn match_expr(scrutinee: &str, arms: Vec<(Pattern, Expr)>) -> Expr {
    e(ExprKind::Match {
        scrutinee: n(scrutinee),
        arms: arms
            .into_iter()
            .map(|(pattern, body)| MatchArm { pattern, body })
            .collect(),
    })
}

fn pctor(name: &str, subs: Vec<Pattern>) -> Pattern {
    Pattern::Constructor(n(name), subs)
}

fn run_with(
    observer: &dyn EvalObserver,
    options: EngineOptions,
    gas: u64,
    expr: &Expr,
) -> (EvalResult<Value>, u64) {
    let builtins = StdBuiltins::new();
    let prelude = Prelude::standard();
    let mut interp = Interpreter::new(
        Arc::new(DataTypes::standard()),
        &builtins,
        &prelude,
        observer,
        options,
        gas,
    );
    let result = interp.eval(expr, &prelude.base_env());
    (result, interp.remaining_gas())
}

fn run(expr: &Expr) -> EvalResult<Value> {
    run_with(&NoopObserver, EngineOptions::default(), GAS, expr).0
}

/// `n` counted back down to zero and rebuilt one step at a time.
fn countdown() -> Expr {
    let step = let_in(
        "one",
        lit(1),
        let_in(
            "m",
            builtin("sub", &["n", "one"]),
            let_in("r", app("f", &["m"]), builtin("add", &["r", "one"])),
        ),
    );
    let body = let_in(
        "zero",
        lit(0),
        let_in(
            "b",
            builtin("eq", &["n", "zero"]),
            match_expr(
                "b",
                vec![(pctor("True", vec![]), var("zero")), (Pattern::Wildcard, step)],
            ),
        ),
    );
    e(ExprKind::Fixpoint {
        name: n("f"),
        ty: Type::fun(Type::uint32(), Type::uint32()),
        body: Arc::new(fun("n", Type::uint32(), body)),
    })
}

// Expressions

#[test]
fn test_literal_and_let() {
    let expr = let_in("x", lit(3), let_in("x", lit(4), var("x")));
    assert_eq!(run(&expr).unwrap(), Value::uint32(4));
}

#[test]
fn test_unbound_variable_reports_span() {
    let expr = Expr::new(ExprKind::Var(n("ghost")), cinder_ir::Span::new(3, 7));
    let err = run(&expr).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UnboundName { .. }));
    assert_eq!(err.span, Some(cinder_ir::Span::new(3, 7)));
}

#[test]
fn test_closures_capture_definition_environment() {
    // let x = 1 in let f = fun y => x + y in let x = 10 in f 5
    let expr = let_in(
        "x",
        lit(1),
        let_in(
            "f",
            fun("y", Type::uint32(), builtin("add", &["x", "y"])),
            let_in("x", lit(10), let_in("five", lit(5), app("f", &["five"]))),
        ),
    );
    assert_eq!(run(&expr).unwrap(), Value::uint32(6));
}

#[test]
fn test_curried_application() {
    let minus = fun(
        "a",
        Type::uint32(),
        fun("b", Type::uint32(), builtin("sub", &["a", "b"])),
    );
    let expr = let_in(
        "minus",
        minus,
        let_in("ten", lit(10), let_in("three", lit(3), app("minus", &["ten", "three"]))),
    );
    assert_eq!(run(&expr).unwrap(), Value::uint32(7));
}

#[test]
fn test_applying_a_non_function_fails() {
    let expr = let_in("x", lit(1), app("x", &["x"]));
    let err = run(&expr).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::NotAFunction { .. }));
}

#[test]
fn test_charged_runs_after_deduction() {
    let builtins = StdBuiltins::new();
    let prelude = Prelude::standard();
    let observer = RecordingObserver::new();
    let mut interp = Interpreter::new(
        Arc::new(DataTypes::standard()),
        &builtins,
        &prelude,
        &observer,
        EngineOptions::default(),
        10,
    );
    let seen = interp
        .charged(4, Span::DUMMY, |this| Ok(this.remaining_gas()))
        .unwrap();
    assert_eq!(seen, 6);
    assert_eq!(interp.remaining_gas(), 6);
    assert_eq!(
        observer.events(),
        vec![EvalEvent::GasCharged {
            cost: 4,
            remaining: 6
        }]
    );
}

#[test]
fn test_charged_exhaustion_skips_computation() {
    let builtins = StdBuiltins::new();
    let prelude = Prelude::standard();
    let observer = RecordingObserver::new();
    let mut interp = Interpreter::new(
        Arc::new(DataTypes::standard()),
        &builtins,
        &prelude,
        &observer,
        EngineOptions::default(),
        3,
    );
    let mut ran = false;
    let err = interp
        .charged(5, Span::new(2, 4), |_| {
            ran = true;
            Ok(())
        })
        .unwrap_err();
    assert!(!ran);
    assert_eq!(
        err.kind,
        EvalErrorKind::OutOfGas {
            required: 5,
            remaining: 3
        }
    );
    assert_eq!(err.span, Some(Span::new(2, 4)));
    assert_eq!(interp.remaining_gas(), 3);
    assert!(observer.events().is_empty());
}

#[test]
fn test_builtin_charges_its_cost() {
    let expr = let_in("a", lit(2), builtin("add", &["a", "a"]));
    let (result, remaining) = run_with(&NoopObserver, EngineOptions::default(), GAS, &expr);
    assert_eq!(result.unwrap(), Value::uint32(4));
    assert_eq!(remaining, GAS - 4);
}

#[test]
fn test_out_of_gas_leaves_budget_untouched() {
    let observer = RecordingObserver::new();
    let expr = let_in("a", lit(2), builtin("add", &["a", "a"]));
    let (result, remaining) = run_with(&observer, EngineOptions::default(), 3, &expr);
    assert!(result.unwrap_err().is_out_of_gas());
    assert_eq!(remaining, 3);
    assert!(!observer
        .events()
        .iter()
        .any(|ev| matches!(ev, EvalEvent::BuiltinCalled { .. })));
}

#[test]
fn test_gas_annotation_charged_before_body() {
    let expr = e(ExprKind::Gas {
        cost: CostExpr::Static(7),
        body: Box::new(lit(1)),
    });
    let (result, remaining) = run_with(&NoopObserver, EngineOptions::default(), 10, &expr);
    assert_eq!(result.unwrap(), Value::uint32(1));
    assert_eq!(remaining, 3);

    let (result, remaining) = run_with(&NoopObserver, EngineOptions::default(), 6, &expr);
    assert!(result.unwrap_err().is_out_of_gas());
    assert_eq!(remaining, 6);
}

#[test]
fn test_fixpoint_recursion() {
    let expr = let_in("f", countdown(), let_in("five", lit(5), app("f", &["five"])));
    assert_eq!(run(&expr).unwrap(), Value::uint32(5));
}

#[test]
fn test_recursion_depth_is_bounded() {
    let forever = e(ExprKind::Fixpoint {
        name: n("f"),
        ty: Type::fun(Type::uint32(), Type::uint32()),
        body: Arc::new(fun("x", Type::uint32(), app("f", &["x"]))),
    });
    let expr = let_in("f", forever, let_in("one", lit(1), app("f", &["one"])));
    let options = EngineOptions {
        max_depth: Some(50),
    };
    let (result, _) = run_with(&NoopObserver, options, u64::MAX, &expr);
    assert!(matches!(
        result.unwrap_err().kind,
        EvalErrorKind::StackOverflow { depth: 50 }
    ));
}

#[test]
fn test_fix_of_non_function_is_rejected() {
    let expr = e(ExprKind::Fixpoint {
        name: n("f"),
        ty: Type::uint32(),
        body: Arc::new(lit(1)),
    });
    assert!(matches!(
        run(&expr).unwrap_err().kind,
        EvalErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn test_type_application_instantiates_body() {
    let id = e(ExprKind::TFun {
        tvar: n("'A"),
        body: Arc::new(fun("x", Type::var("'A"), var("x"))),
    });
    let expr = let_in(
        "id",
        id,
        let_in(
            "id_u32",
            e(ExprKind::TApp {
                func: n("id"),
                tyargs: vec![Type::uint32()],
            }),
            let_in("seven", lit(7), app("id_u32", &["seven"])),
        ),
    );
    assert_eq!(run(&expr).unwrap(), Value::uint32(7));
}

#[test]
fn test_type_application_of_closure_fails() {
    let expr = let_in(
        "f",
        fun("x", Type::uint32(), var("x")),
        e(ExprKind::TApp {
            func: n("f"),
            tyargs: vec![Type::uint32()],
        }),
    );
    assert!(matches!(
        run(&expr).unwrap_err().kind,
        EvalErrorKind::NotATypeClosure { .. }
    ));
}

#[test]
fn test_constructor_checks() {
    let some = let_in("x", lit(1), ctor("Some", vec![Type::uint32()], &["x"]));
    assert_eq!(
        run(&some).unwrap(),
        Value::some(Type::uint32(), Value::uint32(1))
    );

    let wrong_arity = ctor("Some", vec![Type::uint32()], &[]);
    assert!(matches!(
        run(&wrong_arity).unwrap_err().kind,
        EvalErrorKind::ArityMismatch { .. }
    ));

    let unknown = ctor("Maybe", vec![], &[]);
    assert!(matches!(
        run(&unknown).unwrap_err().kind,
        EvalErrorKind::UnknownConstructor { .. }
    ));

    let closure_arg = let_in(
        "f",
        fun("x", Type::uint32(), var("x")),
        ctor("Some", vec![Type::fun(Type::uint32(), Type::uint32())], &["f"]),
    );
    assert!(matches!(
        run(&closure_arg).unwrap_err().kind,
        EvalErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn test_first_matching_clause_wins() {
    let expr = let_in(
        "x",
        lit(9),
        let_in(
            "o",
            ctor("Some", vec![Type::uint32()], &["x"]),
            match_expr(
                "o",
                vec![
                    (pctor("None", vec![]), lit(0)),
                    (pctor("Some", vec![Pattern::Binder(n("v"))]), var("v")),
                    (Pattern::Wildcard, lit(1)),
                ],
            ),
        ),
    );
    assert_eq!(run(&expr).unwrap(), Value::uint32(9));
}

#[test]
fn test_non_exhaustive_match() {
    let expr = let_in(
        "o",
        ctor("None", vec![Type::uint32()], &[]),
        match_expr("o", vec![(pctor("Some", vec![Pattern::Wildcard]), lit(0))]),
    );
    assert!(matches!(
        run(&expr).unwrap_err().kind,
        EvalErrorKind::NonExhaustiveMatch { .. }
    ));
}

#[test]
fn test_message_rejects_closure_payload() {
    let expr = let_in(
        "f",
        fun("x", Type::uint32(), var("x")),
        e(ExprKind::Message(vec![
            (n("_tag"), Payload::Lit(Literal::string("go"))),
            (n("code"), Payload::Var(n("f"))),
        ])),
    );
    assert!(matches!(
        run(&expr).unwrap_err().kind,
        EvalErrorKind::NonSerializable { .. }
    ));
}

#[test]
fn test_nested_pattern_bindings_in_order() {
    let value = Value::cons(
        Type::uint32(),
        Value::uint32(1),
        Value::list(Type::uint32(), vec![Value::uint32(2)]),
    );
    let pattern = pctor(
        "Cons",
        vec![
            Pattern::Binder(n("h")),
            pctor("Cons", vec![Pattern::Binder(n("h2")), Pattern::Wildcard]),
        ],
    );
    let bindings = match_pattern(&pattern, &value).unwrap();
    assert_eq!(
        bindings,
        vec![(n("h"), Value::uint32(1)), (n("h2"), Value::uint32(2))]
    );
    assert!(match_pattern(&pctor("Nil", vec![]), &value).is_none());
}

// Statements

fn s(kind: StmtKind) -> Stmt {
    Stmt::synthetic(kind)
}

fn bind(local: &str, expr: Expr) -> Stmt {
    s(StmtKind::Bind {
        local: n(local),
        expr,
    })
}

fn procedure(name: &str, params: &[&str], body: Vec<Stmt>) -> Arc<Component> {
    Arc::new(Component {
        kind: ComponentKind::Procedure,
        name: n(name),
        params: params.iter().map(|p| (n(p), Type::uint32())).collect(),
        body,
    })
}

fn store() -> FieldStore {
    FieldStore::new(vec![
        FieldState {
            name: n("count"),
            ty: Type::uint32(),
            value: Value::uint32(0),
        },
        FieldState {
            name: n("owners"),
            ty: Type::map(Type::uint32(), Type::map(Type::uint32(), Type::string())),
            value: Value::empty_map(
                Type::uint32(),
                Type::map(Type::uint32(), Type::string()),
            ),
        },
    ])
}

fn configuration(init_env: Env, procedures: Vec<Arc<Component>>) -> Configuration {
    let field_types: FxHashMap<Name, Type> = store()
        .fields()
        .iter()
        .map(|f| (f.name.clone(), f.ty.clone()))
        .collect();
    Configuration {
        env: init_env.clone(),
        init_env,
        field_types: Arc::new(field_types),
        balance: 500,
        blockchain: BlockchainContext::new(12),
        incoming_funds: 0,
        procedures,
        call_stack: vec![n("Main")],
        accepted: false,
        messages: Vec::new(),
        events: Vec::new(),
    }
}

fn exec(
    stmts: &[Stmt],
    conf: Configuration,
    backend: &mut FieldStore,
) -> Result<Configuration, EvalError> {
    let builtins = StdBuiltins::new();
    let prelude = Prelude::standard();
    let mut interp = Interpreter::new(
        Arc::new(DataTypes::standard()),
        &builtins,
        &prelude,
        &NoopObserver,
        EngineOptions::default(),
        GAS,
    );
    interp.exec_stmts(stmts, conf, backend)
}

#[test]
fn test_load_store_and_balance() {
    let mut backend = store();
    let stmts = vec![
        bind("x", lit(41)),
        bind("one", lit(1)),
        bind("y", builtin("add", &["x", "one"])),
        s(StmtKind::Store {
            field: n("count"),
            local: n("y"),
        }),
        s(StmtKind::Load {
            local: n("c"),
            field: n("count"),
        }),
        s(StmtKind::Load {
            local: n("bal"),
            field: n("_balance"),
        }),
        s(StmtKind::ReadFromBc {
            local: n("blk"),
            fact: n("BLOCKNUMBER"),
        }),
    ];
    let conf = exec(&stmts, configuration(Env::new(), vec![]), &mut backend).unwrap();
    assert_eq!(backend.get(&n("count")), Some(&Value::uint32(42)));
    assert_eq!(conf.env.get(&n("c")), Some(&Value::uint32(42)));
    assert_eq!(conf.env.get(&n("bal")), Some(&Value::uint128(500)));
    assert_eq!(conf.env.get(&n("blk")), Some(&Value::BNum(12)));
}

#[test]
fn test_store_to_unknown_field_fails() {
    let mut backend = store();
    let stmts = vec![
        bind("x", lit(1)),
        s(StmtKind::Store {
            field: n("missing"),
            local: n("x"),
        }),
    ];
    let err = exec(&stmts, configuration(Env::new(), vec![]), &mut backend).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UnknownField { .. }));
}

#[test]
fn test_nested_map_update_and_get() {
    let mut backend = store();
    let stmts = vec![
        bind("k1", lit(1)),
        bind("k2", lit(2)),
        bind("v", e(ExprKind::Literal(Literal::string("alice")))),
        s(StmtKind::MapUpdate {
            map: n("owners"),
            keys: vec![n("k1"), n("k2")],
            value: Some(n("v")),
        }),
        s(StmtKind::MapGet {
            local: n("hit"),
            map: n("owners"),
            keys: vec![n("k1"), n("k2")],
            fetch: true,
        }),
        s(StmtKind::MapGet {
            local: n("miss"),
            map: n("owners"),
            keys: vec![n("k2"), n("k1")],
            fetch: true,
        }),
        s(StmtKind::MapGet {
            local: n("present"),
            map: n("owners"),
            keys: vec![n("k1")],
            fetch: false,
        }),
    ];
    let conf = exec(&stmts, configuration(Env::new(), vec![]), &mut backend).unwrap();
    assert_eq!(
        conf.env.get(&n("hit")),
        Some(&Value::some(Type::string(), Value::string("alice")))
    );
    assert_eq!(conf.env.get(&n("miss")), Some(&Value::none(Type::string())));
    assert_eq!(conf.env.get(&n("present")), Some(&Value::bool(true)));
}

#[test]
fn test_match_statement_bindings_do_not_escape() {
    let mut backend = store();
    let stmts = vec![
        bind("x", lit(3)),
        bind("o", ctor("Some", vec![Type::uint32()], &["x"])),
        s(StmtKind::Match {
            scrutinee: n("o"),
            arms: vec![StmtArm {
                pattern: pctor("Some", vec![Pattern::Binder(n("inner"))]),
                body: vec![s(StmtKind::Store {
                    field: n("count"),
                    local: n("inner"),
                })],
            }],
        }),
    ];
    let conf = exec(&stmts, configuration(Env::new(), vec![]), &mut backend).unwrap();
    assert_eq!(backend.get(&n("count")), Some(&Value::uint32(3)));
    assert!(!conf.env.contains(&n("inner")));
}

#[test]
fn test_send_validates_messages() {
    let mut backend = store();
    let msg = |with_amount: bool| {
        let mut entries = vec![
            (n("_tag"), Payload::Lit(Literal::string("go"))),
            (n("_recipient"), Payload::Lit(Literal::ByStrX(vec![0; 20]))),
        ];
        if with_amount {
            entries.push((n("_amount"), Payload::Lit(Literal::uint128(5))));
        }
        e(ExprKind::Message(entries))
    };
    let good = vec![bind("m", msg(true)), s(StmtKind::SendMsgs(n("m")))];
    let conf = exec(&good, configuration(Env::new(), vec![]), &mut backend).unwrap();
    assert_eq!(conf.messages.len(), 1);
    assert_eq!(conf.outgoing_total(), Some(5));

    let bad = vec![bind("m", msg(false)), s(StmtKind::SendMsgs(n("m")))];
    let err = exec(&bad, configuration(Env::new(), vec![]), &mut backend).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::MalformedMessage { .. }));
}

#[test]
fn test_procedures_see_entry_scope_not_caller_locals() {
    let mut backend = store();
    let init_env = Env::new().bind(n("base"), Value::uint32(100));
    let reads_base = procedure(
        "ReadsBase",
        &["a"],
        vec![
            bind("sum", builtin("add", &["base", "a"])),
            s(StmtKind::Store {
                field: n("count"),
                local: n("sum"),
            }),
        ],
    );
    let reads_local = procedure(
        "ReadsLocal",
        &[],
        vec![s(StmtKind::Store {
            field: n("count"),
            local: n("local"),
        })],
    );
    let procs = vec![reads_base, reads_local];

    let ok = vec![
        bind("two", lit(2)),
        s(StmtKind::CallProc {
            proc: n("ReadsBase"),
            args: vec![n("two")],
        }),
    ];
    let conf = exec(&ok, configuration(init_env.clone(), procs.clone()), &mut backend).unwrap();
    assert_eq!(backend.get(&n("count")), Some(&Value::uint32(102)));
    assert!(conf.env.contains(&n("two")));
    assert_eq!(conf.procedures.len(), 2);

    let leaks = vec![
        bind("local", lit(1)),
        s(StmtKind::CallProc {
            proc: n("ReadsLocal"),
            args: vec![],
        }),
    ];
    let err = exec(&leaks, configuration(init_env, procs), &mut backend).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UnboundName { .. }));
}

#[test]
fn test_procedure_cannot_call_later_procedure() {
    let mut backend = store();
    let first = procedure(
        "First",
        &[],
        vec![s(StmtKind::CallProc {
            proc: n("Second"),
            args: vec![],
        })],
    );
    let second = procedure("Second", &[], vec![]);
    let stmts = vec![s(StmtKind::CallProc {
        proc: n("First"),
        args: vec![],
    })];
    let err = exec(&stmts, configuration(Env::new(), vec![first, second]), &mut backend)
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UnboundName { .. }));
}

#[test]
fn test_iterate_calls_procedure_per_element() {
    let mut backend = store();
    let accumulate = procedure(
        "Accumulate",
        &["x"],
        vec![
            s(StmtKind::Load {
                local: n("c"),
                field: n("count"),
            }),
            bind("c2", builtin("add", &["c", "x"])),
            s(StmtKind::Store {
                field: n("count"),
                local: n("c2"),
            }),
        ],
    );
    let init_env = Env::new().bind(
        n("xs"),
        Value::list(
            Type::uint32(),
            vec![Value::uint32(1), Value::uint32(2), Value::uint32(3)],
        ),
    );
    let stmts = vec![s(StmtKind::Iterate {
        list: n("xs"),
        proc: n("Accumulate"),
    })];
    exec(&stmts, configuration(init_env, vec![accumulate]), &mut backend).unwrap();
    assert_eq!(backend.get(&n("count")), Some(&Value::uint32(6)));
}

#[test]
fn test_throw_carries_call_stack() {
    let mut backend = store();
    let fail = procedure(
        "Fail",
        &[],
        vec![
            bind("why", e(ExprKind::Literal(Literal::string("nope")))),
            s(StmtKind::Throw(Some(n("why")))),
        ],
    );
    let stmts = vec![s(StmtKind::CallProc {
        proc: n("Fail"),
        args: vec![],
    })];
    let err = exec(&stmts, configuration(Env::new(), vec![fail]), &mut backend).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::UserAbort {
            message: Some("\"nope\"".to_string())
        }
    );
    let frames: Vec<String> = err
        .backtrace
        .unwrap()
        .frames()
        .iter()
        .map(|f| f.name.to_string())
        .collect();
    assert_eq!(frames, vec!["Main".to_string(), "Fail".to_string()]);
}

#[test]
fn test_statement_gas_marker() {
    let mut backend = store();
    let stmts = vec![
        s(StmtKind::Gas {
            cost: CostExpr::Static(GAS + 1),
        }),
        bind("x", lit(1)),
    ];
    let err = exec(&stmts, configuration(Env::new(), vec![]), &mut backend).unwrap_err();
    assert!(err.is_out_of_gas());
}
