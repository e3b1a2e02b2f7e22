//! Gas cost expressions.
//!
//! A cost expression is attached to an expression or statement and resolved
//! against the live environment at the moment the charge happens.

use crate::Name;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CostExpr {
    /// A constant.
    Static(u64),
    /// Serialized size of the variable's value.
    SizeOf(Name),
    /// The variable's integer value.
    ValueOf(Name),
    /// Number of elements of a map or list.
    LengthOf(Name),
    /// `ceil(log2(v))` of the variable's integer value.
    LogOf(Name),
    /// `n * ceil(log2(n))` where `n` is the map's size.
    MapSortCost(Name),
    Sum(Box<CostExpr>, Box<CostExpr>),
    Prod(Box<CostExpr>, Box<CostExpr>),
    /// `ceil(expr / divisor)`.
    DivCeil(Box<CostExpr>, u64),
    Min(Box<CostExpr>, Box<CostExpr>),
}

impl CostExpr {
    pub fn sum(a: CostExpr, b: CostExpr) -> Self {
        CostExpr::Sum(Box::new(a), Box::new(b))
    }

    pub fn prod(a: CostExpr, b: CostExpr) -> Self {
        CostExpr::Prod(Box::new(a), Box::new(b))
    }

    pub fn div_ceil(a: CostExpr, divisor: u64) -> Self {
        CostExpr::DivCeil(Box::new(a), divisor)
    }

    pub fn min(a: CostExpr, b: CostExpr) -> Self {
        CostExpr::Min(Box::new(a), Box::new(b))
    }
}
