use super::*;

fn x() -> Name {
    Name::new("x")
}

#[test]
fn test_bind_lookup() {
    let env = Env::new().bind(x(), Value::uint32(1));
    assert_eq!(env.lookup(&x()).unwrap(), Value::uint32(1));
}

#[test]
fn test_bind_is_persistent() {
    let outer = Env::new().bind(x(), Value::uint32(1));
    let inner = outer.bind(x(), Value::uint32(2));

    assert_eq!(inner.lookup(&x()).unwrap(), Value::uint32(2));
    // The original environment never observes the shadowing binding.
    assert_eq!(outer.lookup(&x()).unwrap(), Value::uint32(1));
}

#[test]
fn test_lookup_unbound() {
    let err = Env::new().lookup(&x()).unwrap_err();
    assert!(matches!(
        err.kind,
        crate::errors::EvalErrorKind::UnboundName { ref name } if name == "x"
    ));
}

#[test]
fn test_extend_prefers_other() {
    let base = Env::new()
        .bind(x(), Value::uint32(1))
        .bind(Name::new("y"), Value::uint32(9));
    let over = Env::new().bind(x(), Value::uint32(2));
    let merged = base.extend(&over);
    assert_eq!(merged.lookup(&x()).unwrap(), Value::uint32(2));
    assert_eq!(merged.lookup(&Name::new("y")).unwrap(), Value::uint32(9));
}

#[test]
fn test_retain_filters_names() {
    let env = Env::new()
        .bind(x(), Value::uint32(1))
        .bind(Name::new("hidden"), Value::uint32(2));
    let kept = env.retain(|name| name == "x");
    assert_eq!(kept.len(), 1);
    assert!(!kept.contains(&Name::new("hidden")));
}

#[test]
fn test_prelude_reserves_version() {
    let prelude = Prelude::standard();
    let version = Name::new("_cinder_version");
    assert!(prelude.is_reserved(&version));
    assert!(prelude.check_not_reserved(&x()).is_ok());
    assert!(prelude.check_not_reserved(&version).is_err());
    assert_eq!(
        prelude.base_env().lookup(&version).unwrap(),
        Value::uint32(CINDER_VERSION)
    );
}

#[test]
fn test_prelude_checks_params() {
    let prelude = Prelude::from_bindings([(Name::new("reserved"), Value::uint32(0))]);
    let ok = [(x(), Type::uint32())];
    let bad = [(Name::new("reserved"), Type::uint32())];
    assert!(prelude.check_params(&ok).is_ok());
    assert!(prelude.check_params(&bad).is_err());
}
