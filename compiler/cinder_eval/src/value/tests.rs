use cinder_ir::{Expr, ExprKind, Literal};
use pretty_assertions::assert_eq;

use super::*;

fn closure() -> Value {
    Value::Closure(Heap::new(ClosureValue {
        param: Name::new("x"),
        param_ty: Type::uint32(),
        body: Arc::new(Expr::synthetic(ExprKind::Literal(Literal::uint32(0)))),
        captures: Env::new(),
        fix: None,
    }))
}

#[test]
fn test_purity_looks_inside_containers() {
    let pure = Value::some(Type::uint32(), Value::uint32(1));
    assert!(pure.is_pure());

    let nested = Value::list(
        Type::option(Type::fun(Type::uint32(), Type::uint32())),
        vec![Value::some(
            Type::fun(Type::uint32(), Type::uint32()),
            closure(),
        )],
    );
    assert!(!nested.is_pure());

    let msg = Value::message(vec![(Name::new("f"), closure())]);
    assert!(!msg.is_pure());
}

#[test]
fn test_type_of_values() {
    assert_eq!(Value::uint128(5).type_of().unwrap(), Type::uint128());
    assert_eq!(Value::address([1; 20]).type_of().unwrap(), Type::address());
    assert_eq!(
        Value::nil(Type::string()).type_of().unwrap(),
        Type::list(Type::string())
    );
    assert_eq!(
        Value::empty_map(Type::string(), Type::uint32())
            .type_of()
            .unwrap(),
        Type::map(Type::string(), Type::uint32())
    );
    assert!(closure().type_of().is_err());
}

#[test]
fn test_literal_size() {
    assert_eq!(Value::uint32(7).literal_size(), 4);
    assert_eq!(Value::uint128(7).literal_size(), 16);
    assert_eq!(Value::string("abc").literal_size(), 3);
    // One for the constructor plus the argument.
    assert_eq!(
        Value::some(Type::uint32(), Value::uint32(1)).literal_size(),
        5
    );
}

#[test]
fn test_closures_are_never_equal() {
    let f = closure();
    assert_ne!(f, f.clone());
    assert_eq!(Value::string("a"), Value::string("a"));
    assert_ne!(Value::uint32(1), Value::uint128(1));
}

#[test]
fn test_list_elements() {
    let xs = Value::list(Type::uint32(), vec![Value::uint32(1), Value::uint32(2)]);
    assert_eq!(
        xs.list_elements().unwrap(),
        vec![Value::uint32(1), Value::uint32(2)]
    );
    assert!(Value::uint32(1).list_elements().is_none());
    assert!(Value::some(Type::uint32(), Value::uint32(1))
        .list_elements()
        .is_none());
}

#[test]
fn test_message_entry_lookup() {
    let msg = Value::message(vec![
        (Name::new(TAG_LABEL), Value::string("Transfer")),
        (Name::new(AMOUNT_LABEL), Value::uint128(10)),
    ]);
    assert_eq!(
        msg.message_entry(TAG_LABEL).and_then(Value::as_str),
        Some("Transfer")
    );
    assert_eq!(
        msg.message_entry(AMOUNT_LABEL).and_then(Value::as_uint128),
        Some(10)
    );
    assert!(msg.message_entry(SENDER_LABEL).is_none());
}

#[test]
fn test_serialization_rejects_closures() {
    let pure = Value::message(vec![
        (Name::new(TAG_LABEL), Value::string("Ping")),
        (
            Name::new("xs"),
            Value::list(Type::uint32(), vec![Value::uint32(3)]),
        ),
    ]);
    assert!(bincode::serialize(&pure).is_ok());

    let impure = Value::message(vec![(Name::new("f"), closure())]);
    assert!(bincode::serialize(&impure).is_err());
}

#[test]
fn test_display() {
    let pair = Value::adt(
        "Pair",
        "Pair",
        vec![Type::uint32(), Type::string()],
        vec![Value::uint32(1), Value::string("a")],
    );
    assert_eq!(pair.to_string(), "(Pair 1 \"a\")");
    assert_eq!(Value::bystrx(vec![0xab, 0x01]).to_string(), "0xab01");
    assert_eq!(Value::bool(true).to_string(), "True");
}
