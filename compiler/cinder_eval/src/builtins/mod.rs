//! Builtin function dictionary.
//!
//! A builtin is resolved by name and the runtime types of its arguments;
//! resolution yields the implementation together with its cost formula. The
//! evaluator charges the cost before invoking the implementation.

use cinder_ir::{IntLit, IntWidth, Name, PrimType, Type};
use rustc_hash::FxHashMap;

use crate::errors::{builtin_error, division_by_zero, integer_overflow, EvalError, EvalResult};
use crate::gas::ceil_log2;
use crate::value::{MapKey, Value};

/// Implementation of a resolved builtin.
pub type BuiltinOp = fn(&[Value]) -> EvalResult<Value>;

/// Cost formula of a resolved builtin, over the actual arguments.
pub type BuiltinCost = fn(&[Value]) -> u64;

/// A builtin resolved for a concrete argument signature.
#[derive(Clone, Copy)]
pub struct ResolvedBuiltin {
    pub name: &'static str,
    pub cost: BuiltinCost,
    pub op: BuiltinOp,
}

impl std::fmt::Debug for ResolvedBuiltin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedBuiltin")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Type-directed builtin lookup.
pub trait BuiltinDictionary: Send + Sync {
    /// Resolve `name` for arguments of the given runtime types.
    fn resolve(&self, name: &Name, arg_types: &[Type]) -> EvalResult<ResolvedBuiltin>;
}

struct Overload {
    accepts: fn(&[Type]) -> bool,
    cost: BuiltinCost,
    op: BuiltinOp,
}

/// The standard builtin library.
pub struct StdBuiltins {
    table: FxHashMap<&'static str, Vec<Overload>>,
}

impl StdBuiltins {
    pub fn new() -> Self {
        let mut builtins = StdBuiltins {
            table: FxHashMap::default(),
        };
        builtins.register("eq", same_prim, eq_cost, eq);
        builtins.register("add", same_int, int_cost, add);
        builtins.register("sub", same_int, int_cost, sub);
        builtins.register("mul", same_int, wide_int_cost, mul);
        builtins.register("div", same_int, wide_int_cost, div);
        builtins.register("rem", same_int, wide_int_cost, rem);
        builtins.register("lt", same_int, int_cost, lt);
        builtins.register("concat", concat_args, concat_cost, concat);
        builtins.register("strlen", one_string, strlen_cost, strlen);
        builtins.register("blt", two_bnums, bnum_cost, blt);
        builtins.register("badd", bnum_and_uint, bnum_cost, badd);
        builtins.register("put", map_key_value, map_cost, put);
        builtins.register("get", map_key, map_cost, get);
        builtins.register("contains", map_key, map_cost, contains);
        builtins.register("remove", map_key, map_cost, remove);
        builtins.register("size", one_map, unit_cost, size);
        builtins
    }

    fn register(
        &mut self,
        name: &'static str,
        accepts: fn(&[Type]) -> bool,
        cost: BuiltinCost,
        op: BuiltinOp,
    ) {
        self.table
            .entry(name)
            .or_default()
            .push(Overload { accepts, cost, op });
    }
}

impl Default for StdBuiltins {
    fn default() -> Self {
        StdBuiltins::new()
    }
}

impl BuiltinDictionary for StdBuiltins {
    fn resolve(&self, name: &Name, arg_types: &[Type]) -> EvalResult<ResolvedBuiltin> {
        let Some((key, overloads)) = self.table.get_key_value(name.as_str()) else {
            return Err(builtin_error(format!("unknown builtin {name}")));
        };
        overloads
            .iter()
            .find(|o| (o.accepts)(arg_types))
            .map(|o| ResolvedBuiltin {
                name: *key,
                cost: o.cost,
                op: o.op,
            })
            .ok_or_else(|| {
                let sig = arg_types
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                builtin_error(format!("builtin {name} is not defined for ({sig})"))
            })
    }
}

// Signatures

fn same_prim(tys: &[Type]) -> bool {
    matches!(tys, [Type::Prim(a), Type::Prim(b)] if a == b && *a != PrimType::Message)
}

fn same_int(tys: &[Type]) -> bool {
    matches!(
        tys,
        [Type::Prim(a @ (PrimType::Int(_) | PrimType::Uint(_))), Type::Prim(b)] if a == b
    )
}

fn concat_args(tys: &[Type]) -> bool {
    matches!(
        tys,
        [Type::Prim(PrimType::String), Type::Prim(PrimType::String)]
            | [Type::Prim(PrimType::ByStrX(_)), Type::Prim(PrimType::ByStrX(_))]
            | [Type::Prim(PrimType::ByStr), Type::Prim(PrimType::ByStr)]
    )
}

fn one_string(tys: &[Type]) -> bool {
    matches!(tys, [Type::Prim(PrimType::String)])
}

fn two_bnums(tys: &[Type]) -> bool {
    matches!(tys, [Type::Prim(PrimType::BNum), Type::Prim(PrimType::BNum)])
}

fn bnum_and_uint(tys: &[Type]) -> bool {
    matches!(tys, [Type::Prim(PrimType::BNum), Type::Prim(PrimType::Uint(_))])
}

fn map_key_value(tys: &[Type]) -> bool {
    matches!(tys, [Type::Map(k, v), key, value] if **k == *key && **v == *value)
}

fn map_key(tys: &[Type]) -> bool {
    matches!(tys, [Type::Map(k, _), key] if **k == *key)
}

fn one_map(tys: &[Type]) -> bool {
    matches!(tys, [Type::Map(_, _)])
}

// Costs

fn width_bytes(v: &Value) -> u64 {
    v.as_int().map_or(IntWidth::W128, IntLit::width).bytes()
}

fn int_cost(args: &[Value]) -> u64 {
    args.first().map_or(0, width_bytes)
}

fn wide_int_cost(args: &[Value]) -> u64 {
    int_cost(args).saturating_mul(2)
}

fn eq_cost(args: &[Value]) -> u64 {
    match args {
        [a, b] => a.literal_size().min(b.literal_size()).saturating_add(1),
        _ => 1,
    }
}

fn concat_cost(args: &[Value]) -> u64 {
    args.iter()
        .fold(0u64, |acc, v| acc.saturating_add(v.literal_size()))
}

fn strlen_cost(args: &[Value]) -> u64 {
    args.first().map_or(0, Value::literal_size)
}

fn bnum_cost(_: &[Value]) -> u64 {
    8
}

fn map_cost(args: &[Value]) -> u64 {
    let len = args
        .first()
        .and_then(Value::as_map)
        .map_or(0, |m| m.len() as u128);
    ceil_log2(len.saturating_add(1)).saturating_add(1)
}

fn unit_cost(_: &[Value]) -> u64 {
    1
}

// Implementations

fn arity_error(op: &str, expected: usize, got: usize) -> EvalError {
    builtin_error(format!("{op} expects {expected} arguments, got {got}"))
}

fn two_ints(op: &str, args: &[Value]) -> EvalResult<(IntLit, IntLit)> {
    match args {
        [Value::Int(a), Value::Int(b)] => Ok((*a, *b)),
        _ => Err(arity_error(op, 2, args.len())),
    }
}

fn eq(args: &[Value]) -> EvalResult<Value> {
    match args {
        [a, b] => Ok(Value::bool(a == b)),
        _ => Err(arity_error("eq", 2, args.len())),
    }
}

fn add(args: &[Value]) -> EvalResult<Value> {
    let (a, b) = two_ints("add", args)?;
    a.checked_add(b)
        .map(Value::Int)
        .ok_or_else(|| integer_overflow("add"))
}

fn sub(args: &[Value]) -> EvalResult<Value> {
    let (a, b) = two_ints("sub", args)?;
    a.checked_sub(b)
        .map(Value::Int)
        .ok_or_else(|| integer_overflow("sub"))
}

fn mul(args: &[Value]) -> EvalResult<Value> {
    let (a, b) = two_ints("mul", args)?;
    a.checked_mul(b)
        .map(Value::Int)
        .ok_or_else(|| integer_overflow("mul"))
}

fn div(args: &[Value]) -> EvalResult<Value> {
    let (a, b) = two_ints("div", args)?;
    if b.is_zero() {
        return Err(division_by_zero());
    }
    a.checked_div(b)
        .map(Value::Int)
        .ok_or_else(|| integer_overflow("div"))
}

fn rem(args: &[Value]) -> EvalResult<Value> {
    let (a, b) = two_ints("rem", args)?;
    if b.is_zero() {
        return Err(division_by_zero());
    }
    a.checked_rem(b)
        .map(Value::Int)
        .ok_or_else(|| integer_overflow("rem"))
}

fn lt(args: &[Value]) -> EvalResult<Value> {
    let (a, b) = two_ints("lt", args)?;
    let ord = a
        .compare(b)
        .ok_or_else(|| builtin_error("lt applied to integers of different types"))?;
    Ok(Value::bool(ord.is_lt()))
}

fn concat(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::Str(a), Value::Str(b)] => Ok(Value::string(format!("{}{}", a.as_str(), b.as_str()))),
        [Value::ByStrX(a), Value::ByStrX(b)] => Ok(Value::bystrx([a.as_slice(), b.as_slice()].concat())),
        [Value::ByStr(a), Value::ByStr(b)] => Ok(Value::bystr([a.as_slice(), b.as_slice()].concat())),
        _ => Err(arity_error("concat", 2, args.len())),
    }
}

fn strlen(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::Str(s)] => u32::try_from(s.len())
            .map(Value::uint32)
            .map_err(|_| integer_overflow("strlen")),
        _ => Err(arity_error("strlen", 1, args.len())),
    }
}

fn blt(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::BNum(a), Value::BNum(b)] => Ok(Value::bool(a < b)),
        _ => Err(arity_error("blt", 2, args.len())),
    }
}

fn badd(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::BNum(a), Value::Int(delta)] => delta
            .to_u64()
            .and_then(|d| a.checked_add(d))
            .map(Value::BNum)
            .ok_or_else(|| integer_overflow("badd")),
        _ => Err(arity_error("badd", 2, args.len())),
    }
}

fn put(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::Map(m), key, value] => Ok(m
            .insert(MapKey::try_from(key)?, value.clone())
            .into_value()),
        _ => Err(arity_error("put", 3, args.len())),
    }
}

fn get(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::Map(m), key] => Ok(match m.get(&MapKey::try_from(key)?) {
            Some(v) => Value::some(m.val_ty.clone(), v.clone()),
            None => Value::none(m.val_ty.clone()),
        }),
        _ => Err(arity_error("get", 2, args.len())),
    }
}

fn contains(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::Map(m), key] => Ok(Value::bool(m.contains(&MapKey::try_from(key)?))),
        _ => Err(arity_error("contains", 2, args.len())),
    }
}

fn remove(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::Map(m), key] => Ok(m.remove(&MapKey::try_from(key)?).into_value()),
        _ => Err(arity_error("remove", 2, args.len())),
    }
}

fn size(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::Map(m)] => u32::try_from(m.len())
            .map(Value::uint32)
            .map_err(|_| integer_overflow("size")),
        _ => Err(arity_error("size", 1, args.len())),
    }
}
