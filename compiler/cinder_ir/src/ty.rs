//! Types as they appear in annotations and as reported for runtime values.

use std::collections::BTreeSet;
use std::fmt;

use crate::Name;

/// Bit width of a fixed-width integer type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntWidth {
    W32,
    W64,
    W128,
}

impl IntWidth {
    /// Width in bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
            IntWidth::W128 => 128,
        }
    }

    /// Width in bytes.
    #[inline]
    pub const fn bytes(self) -> u64 {
        (self.bits() / 8) as u64
    }
}

/// Primitive (non-algebraic) types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimType {
    Int(IntWidth),
    Uint(IntWidth),
    String,
    /// Block number.
    BNum,
    /// Message or event payload.
    Message,
    /// Fixed-width byte string of the given length.
    ByStrX(u32),
    /// Raw byte string of arbitrary length.
    ByStr,
}

impl fmt::Display for PrimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimType::Int(w) => write!(f, "Int{}", w.bits()),
            PrimType::Uint(w) => write!(f, "Uint{}", w.bits()),
            PrimType::String => f.write_str("String"),
            PrimType::BNum => f.write_str("BNum"),
            PrimType::Message => f.write_str("Message"),
            PrimType::ByStrX(len) => write!(f, "ByStr{len}"),
            PrimType::ByStr => f.write_str("ByStr"),
        }
    }
}

/// A Cinder type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Prim(PrimType),
    /// `Map key value`.
    Map(Box<Type>, Box<Type>),
    /// Algebraic data type applied to its type arguments.
    Adt(Name, Vec<Type>),
    /// `arg -> result`.
    Fun(Box<Type>, Box<Type>),
    TypeVar(Name),
    /// `forall 'a. body`.
    PolyFun(Name, Box<Type>),
    Unit,
}

impl Type {
    pub fn int(width: IntWidth) -> Self {
        Type::Prim(PrimType::Int(width))
    }

    pub fn uint(width: IntWidth) -> Self {
        Type::Prim(PrimType::Uint(width))
    }

    pub fn uint32() -> Self {
        Type::uint(IntWidth::W32)
    }

    pub fn uint128() -> Self {
        Type::uint(IntWidth::W128)
    }

    pub fn string() -> Self {
        Type::Prim(PrimType::String)
    }

    pub fn bnum() -> Self {
        Type::Prim(PrimType::BNum)
    }

    pub fn message() -> Self {
        Type::Prim(PrimType::Message)
    }

    pub fn bystrx(len: u32) -> Self {
        Type::Prim(PrimType::ByStrX(len))
    }

    /// Account address type.
    pub fn address() -> Self {
        Type::bystrx(20)
    }

    pub fn bool() -> Self {
        Type::Adt(Name::new("Bool"), Vec::new())
    }

    pub fn option(inner: Type) -> Self {
        Type::Adt(Name::new("Option"), vec![inner])
    }

    pub fn list(elem: Type) -> Self {
        Type::Adt(Name::new("List"), vec![elem])
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::Map(Box::new(key), Box::new(value))
    }

    pub fn fun(arg: Type, result: Type) -> Self {
        Type::Fun(Box::new(arg), Box::new(result))
    }

    pub fn var(name: impl Into<Name>) -> Self {
        Type::TypeVar(name.into())
    }

    /// Whether values of this type may be used as map keys.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Prim(_))
    }

    /// Type variables occurring free in this type.
    pub fn free_vars(&self) -> BTreeSet<Name> {
        let mut out = BTreeSet::new();
        self.collect_free_vars(&mut BTreeSet::new(), &mut out);
        out
    }

    fn collect_free_vars(&self, bound: &mut BTreeSet<Name>, out: &mut BTreeSet<Name>) {
        match self {
            Type::Prim(_) | Type::Unit => {}
            Type::TypeVar(v) => {
                if !bound.contains(v) {
                    out.insert(v.clone());
                }
            }
            Type::Map(k, v) | Type::Fun(k, v) => {
                k.collect_free_vars(bound, out);
                v.collect_free_vars(bound, out);
            }
            Type::Adt(_, args) => {
                for arg in args {
                    arg.collect_free_vars(bound, out);
                }
            }
            Type::PolyFun(v, body) => {
                let fresh = bound.insert(v.clone());
                body.collect_free_vars(bound, out);
                if fresh {
                    bound.remove(v);
                }
            }
        }
    }

    /// Substitute `ty` for free occurrences of `tvar`.
    ///
    /// Binders that would capture a free variable of `ty` are renamed first.
    #[must_use]
    pub fn subst(&self, tvar: &Name, ty: &Type) -> Type {
        match self {
            Type::Prim(_) | Type::Unit => self.clone(),
            Type::TypeVar(v) if v == tvar => ty.clone(),
            Type::TypeVar(_) => self.clone(),
            Type::Map(k, v) => Type::map(k.subst(tvar, ty), v.subst(tvar, ty)),
            Type::Fun(a, r) => Type::fun(a.subst(tvar, ty), r.subst(tvar, ty)),
            Type::Adt(name, args) => Type::Adt(
                name.clone(),
                args.iter().map(|arg| arg.subst(tvar, ty)).collect(),
            ),
            Type::PolyFun(v, _) if v == tvar => self.clone(),
            Type::PolyFun(v, body) => {
                let ty_free = ty.free_vars();
                if ty_free.contains(v) {
                    let mut avoid = ty_free;
                    avoid.extend(body.free_vars());
                    avoid.insert(tvar.clone());
                    let renamed = fresh_type_var(v, &avoid);
                    let body = body.subst(v, &Type::TypeVar(renamed.clone()));
                    Type::PolyFun(renamed, Box::new(body.subst(tvar, ty)))
                } else {
                    Type::PolyFun(v.clone(), Box::new(body.subst(tvar, ty)))
                }
            }
        }
    }
}

/// Deterministically derive a type variable name not present in `avoid`.
pub fn fresh_type_var(base: &Name, avoid: &BTreeSet<Name>) -> Name {
    let mut candidate = format!("{base}'");
    while avoid.contains(candidate.as_str()) {
        candidate.push('\'');
    }
    Name::from(candidate)
}

impl From<PrimType> for Type {
    fn from(prim: PrimType) -> Self {
        Type::Prim(prim)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Prim(p) => write!(f, "{p}"),
            Type::Map(k, v) => write!(f, "Map ({k}) ({v})"),
            Type::Adt(name, args) => {
                write!(f, "{name}")?;
                for arg in args {
                    write!(f, " ({arg})")?;
                }
                Ok(())
            }
            Type::Fun(a, r) => write!(f, "({a}) -> ({r})"),
            Type::TypeVar(v) => write!(f, "{v}"),
            Type::PolyFun(v, body) => write!(f, "forall {v}. {body}"),
            Type::Unit => f.write_str("Unit"),
        }
    }
}
