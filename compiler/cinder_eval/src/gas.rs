//! Gas accounting.
//!
//! Every charge is compared against the remaining gas and subtracted before
//! the charged computation starts. On exhaustion the meter is left untouched
//! and the computation never runs.
//! `eval_cost` resolves a `CostExpr` against the live environment as a pure
//! function, independent of the operation being charged.

use cinder_ir::{CostExpr, Name, Span};

use crate::environment::Env;
use crate::errors::{out_of_gas, type_mismatch, EvalResult};
use crate::value::Value;

/// Remaining gas for one invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasMeter {
    remaining: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        GasMeter { remaining: limit }
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Deduct `cost`, or fail without deducting anything.
    pub fn consume(&mut self, cost: u64, span: Span) -> EvalResult<()> {
        match self.remaining.checked_sub(cost) {
            Some(rest) => {
                self.remaining = rest;
                tracing::trace!(cost, remaining = rest, "gas charged");
                Ok(())
            }
            None => Err(out_of_gas(cost, self.remaining).or_span(span)),
        }
    }
}

/// `ceil(log2(n))`, with `log2(0)` and `log2(1)` both 0.
pub fn ceil_log2(n: u128) -> u64 {
    if n <= 1 {
        0
    } else {
        u64::from(128 - (n - 1).leading_zeros())
    }
}

/// Resolve `cost` against the current bindings of `env`.
pub fn eval_cost(cost: &CostExpr, env: &Env) -> EvalResult<u64> {
    match cost {
        CostExpr::Static(n) => Ok(*n),
        CostExpr::SizeOf(var) => Ok(env.lookup(var)?.literal_size()),
        CostExpr::ValueOf(var) => integer_of(var, &env.lookup(var)?),
        CostExpr::LengthOf(var) => length_of(var, &env.lookup(var)?),
        CostExpr::LogOf(var) => {
            let value = env.lookup(var)?;
            let n = integer_of(var, &value)?;
            Ok(ceil_log2(u128::from(n)))
        }
        CostExpr::MapSortCost(var) => {
            let value = env.lookup(var)?;
            let Some(map) = value.as_map() else {
                return Err(type_mismatch(
                    format!("a map in {var}"),
                    value.kind_name(),
                ));
            };
            let n = map.len() as u64;
            Ok(n.saturating_mul(ceil_log2(u128::from(n))))
        }
        CostExpr::Sum(a, b) => Ok(eval_cost(a, env)?.saturating_add(eval_cost(b, env)?)),
        CostExpr::Prod(a, b) => Ok(eval_cost(a, env)?.saturating_mul(eval_cost(b, env)?)),
        CostExpr::DivCeil(a, divisor) => {
            let n = eval_cost(a, env)?;
            if *divisor == 0 {
                return Err(crate::errors::division_by_zero());
            }
            Ok(n.div_ceil(*divisor))
        }
        CostExpr::Min(a, b) => Ok(eval_cost(a, env)?.min(eval_cost(b, env)?)),
    }
}

/// Non-negative integer content of a value, saturated to `u64`.
fn integer_of(var: &Name, value: &Value) -> EvalResult<u64> {
    match value {
        Value::Int(i) => match i.to_u128() {
            Some(n) => Ok(u64::try_from(n).unwrap_or(u64::MAX)),
            None => Err(type_mismatch(
                format!("a non-negative integer in {var}"),
                i,
            )),
        },
        Value::BNum(b) => Ok(*b),
        other => Err(type_mismatch(
            format!("an integer in {var}"),
            other.kind_name(),
        )),
    }
}

fn length_of(var: &Name, value: &Value) -> EvalResult<u64> {
    if let Some(map) = value.as_map() {
        return Ok(map.len() as u64);
    }
    match value.list_elements() {
        Some(items) => Ok(items.len() as u64),
        None => Err(type_mismatch(
            format!("a map or list in {var}"),
            value.kind_name(),
        )),
    }
}
