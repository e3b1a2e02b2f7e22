//! Literal constants and fixed-width integer scalars.
//!
//! `IntLit` deliberately does not implement the arithmetic operator traits.
//! Every operation goes through a checked method that rejects width
//! mismatches and overflow, so wrapping arithmetic cannot slip into contract
//! execution.

use std::cmp::Ordering;
use std::fmt;

use crate::{IntWidth, PrimType, Type};

/// A fixed-width signed or unsigned integer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntLit {
    I32(i32),
    I64(i64),
    I128(i128),
    U32(u32),
    U64(u64),
    U128(u128),
}

impl IntLit {
    /// The primitive type of this integer.
    pub fn prim_type(self) -> PrimType {
        match self {
            IntLit::I32(_) => PrimType::Int(IntWidth::W32),
            IntLit::I64(_) => PrimType::Int(IntWidth::W64),
            IntLit::I128(_) => PrimType::Int(IntWidth::W128),
            IntLit::U32(_) => PrimType::Uint(IntWidth::W32),
            IntLit::U64(_) => PrimType::Uint(IntWidth::W64),
            IntLit::U128(_) => PrimType::Uint(IntWidth::W128),
        }
    }

    /// Bit width of this integer.
    pub fn width(self) -> IntWidth {
        match self.prim_type() {
            PrimType::Int(w) | PrimType::Uint(w) => w,
            _ => IntWidth::W128,
        }
    }

    /// The value as an unsigned 128-bit integer, if it is non-negative.
    pub fn to_u128(self) -> Option<u128> {
        match self {
            IntLit::I32(v) => u128::try_from(v).ok(),
            IntLit::I64(v) => u128::try_from(v).ok(),
            IntLit::I128(v) => u128::try_from(v).ok(),
            IntLit::U32(v) => Some(u128::from(v)),
            IntLit::U64(v) => Some(u128::from(v)),
            IntLit::U128(v) => Some(v),
        }
    }

    /// The value as a `u64`, if it is non-negative and fits.
    pub fn to_u64(self) -> Option<u64> {
        self.to_u128().and_then(|v| u64::try_from(v).ok())
    }

    /// Build an integer of type `prim` from a 128-bit value, checking range.
    pub fn from_i128(prim: &PrimType, value: i128) -> Option<IntLit> {
        Some(match prim {
            PrimType::Int(IntWidth::W32) => IntLit::I32(i32::try_from(value).ok()?),
            PrimType::Int(IntWidth::W64) => IntLit::I64(i64::try_from(value).ok()?),
            PrimType::Int(IntWidth::W128) => IntLit::I128(value),
            PrimType::Uint(IntWidth::W32) => IntLit::U32(u32::try_from(value).ok()?),
            PrimType::Uint(IntWidth::W64) => IntLit::U64(u64::try_from(value).ok()?),
            PrimType::Uint(IntWidth::W128) => IntLit::U128(u128::try_from(value).ok()?),
            _ => return None,
        })
    }

    /// Checked addition. `None` on overflow or width mismatch.
    pub fn checked_add(self, rhs: IntLit) -> Option<IntLit> {
        match (self, rhs) {
            (IntLit::I32(a), IntLit::I32(b)) => a.checked_add(b).map(IntLit::I32),
            (IntLit::I64(a), IntLit::I64(b)) => a.checked_add(b).map(IntLit::I64),
            (IntLit::I128(a), IntLit::I128(b)) => a.checked_add(b).map(IntLit::I128),
            (IntLit::U32(a), IntLit::U32(b)) => a.checked_add(b).map(IntLit::U32),
            (IntLit::U64(a), IntLit::U64(b)) => a.checked_add(b).map(IntLit::U64),
            (IntLit::U128(a), IntLit::U128(b)) => a.checked_add(b).map(IntLit::U128),
            _ => None,
        }
    }

    /// Checked subtraction. `None` on overflow or width mismatch.
    pub fn checked_sub(self, rhs: IntLit) -> Option<IntLit> {
        match (self, rhs) {
            (IntLit::I32(a), IntLit::I32(b)) => a.checked_sub(b).map(IntLit::I32),
            (IntLit::I64(a), IntLit::I64(b)) => a.checked_sub(b).map(IntLit::I64),
            (IntLit::I128(a), IntLit::I128(b)) => a.checked_sub(b).map(IntLit::I128),
            (IntLit::U32(a), IntLit::U32(b)) => a.checked_sub(b).map(IntLit::U32),
            (IntLit::U64(a), IntLit::U64(b)) => a.checked_sub(b).map(IntLit::U64),
            (IntLit::U128(a), IntLit::U128(b)) => a.checked_sub(b).map(IntLit::U128),
            _ => None,
        }
    }

    /// Checked multiplication. `None` on overflow or width mismatch.
    pub fn checked_mul(self, rhs: IntLit) -> Option<IntLit> {
        match (self, rhs) {
            (IntLit::I32(a), IntLit::I32(b)) => a.checked_mul(b).map(IntLit::I32),
            (IntLit::I64(a), IntLit::I64(b)) => a.checked_mul(b).map(IntLit::I64),
            (IntLit::I128(a), IntLit::I128(b)) => a.checked_mul(b).map(IntLit::I128),
            (IntLit::U32(a), IntLit::U32(b)) => a.checked_mul(b).map(IntLit::U32),
            (IntLit::U64(a), IntLit::U64(b)) => a.checked_mul(b).map(IntLit::U64),
            (IntLit::U128(a), IntLit::U128(b)) => a.checked_mul(b).map(IntLit::U128),
            _ => None,
        }
    }

    /// Checked division. `None` on division by zero, overflow or width mismatch.
    pub fn checked_div(self, rhs: IntLit) -> Option<IntLit> {
        match (self, rhs) {
            (IntLit::I32(a), IntLit::I32(b)) => a.checked_div(b).map(IntLit::I32),
            (IntLit::I64(a), IntLit::I64(b)) => a.checked_div(b).map(IntLit::I64),
            (IntLit::I128(a), IntLit::I128(b)) => a.checked_div(b).map(IntLit::I128),
            (IntLit::U32(a), IntLit::U32(b)) => a.checked_div(b).map(IntLit::U32),
            (IntLit::U64(a), IntLit::U64(b)) => a.checked_div(b).map(IntLit::U64),
            (IntLit::U128(a), IntLit::U128(b)) => a.checked_div(b).map(IntLit::U128),
            _ => None,
        }
    }

    /// Checked remainder. `None` on division by zero, overflow or width mismatch.
    pub fn checked_rem(self, rhs: IntLit) -> Option<IntLit> {
        match (self, rhs) {
            (IntLit::I32(a), IntLit::I32(b)) => a.checked_rem(b).map(IntLit::I32),
            (IntLit::I64(a), IntLit::I64(b)) => a.checked_rem(b).map(IntLit::I64),
            (IntLit::I128(a), IntLit::I128(b)) => a.checked_rem(b).map(IntLit::I128),
            (IntLit::U32(a), IntLit::U32(b)) => a.checked_rem(b).map(IntLit::U32),
            (IntLit::U64(a), IntLit::U64(b)) => a.checked_rem(b).map(IntLit::U64),
            (IntLit::U128(a), IntLit::U128(b)) => a.checked_rem(b).map(IntLit::U128),
            _ => None,
        }
    }

    /// Compare two integers of the same type. `None` on width mismatch.
    pub fn compare(self, rhs: IntLit) -> Option<Ordering> {
        match (self, rhs) {
            (IntLit::I32(a), IntLit::I32(b)) => Some(a.cmp(&b)),
            (IntLit::I64(a), IntLit::I64(b)) => Some(a.cmp(&b)),
            (IntLit::I128(a), IntLit::I128(b)) => Some(a.cmp(&b)),
            (IntLit::U32(a), IntLit::U32(b)) => Some(a.cmp(&b)),
            (IntLit::U64(a), IntLit::U64(b)) => Some(a.cmp(&b)),
            (IntLit::U128(a), IntLit::U128(b)) => Some(a.cmp(&b)),
            _ => None,
        }
    }

    /// Whether this integer is zero.
    pub fn is_zero(self) -> bool {
        self.to_u128() == Some(0)
    }
}

impl PartialOrd for IntLit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order used for deterministic map keys: by type first, then value.
impl Ord for IntLit {
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(lit: IntLit) -> u8 {
            match lit {
                IntLit::I32(_) => 0,
                IntLit::I64(_) => 1,
                IntLit::I128(_) => 2,
                IntLit::U32(_) => 3,
                IntLit::U64(_) => 4,
                IntLit::U128(_) => 5,
            }
        }
        self.compare(*other)
            .unwrap_or_else(|| rank(*self).cmp(&rank(*other)))
    }
}

impl fmt::Display for IntLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntLit::I32(v) => write!(f, "{v}"),
            IntLit::I64(v) => write!(f, "{v}"),
            IntLit::I128(v) => write!(f, "{v}"),
            IntLit::U32(v) => write!(f, "{v}"),
            IntLit::U64(v) => write!(f, "{v}"),
            IntLit::U128(v) => write!(f, "{v}"),
        }
    }
}

/// A literal constant in source code.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Int(IntLit),
    String(String),
    BNum(u64),
    /// Fixed-width byte string; the width is the byte length.
    ByStrX(Vec<u8>),
    ByStr(Vec<u8>),
    /// `Emp key_type value_type`.
    EmptyMap(Type, Type),
}

impl Literal {
    pub fn uint32(v: u32) -> Self {
        Literal::Int(IntLit::U32(v))
    }

    pub fn uint128(v: u128) -> Self {
        Literal::Int(IntLit::U128(v))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Literal::String(s.into())
    }
}
