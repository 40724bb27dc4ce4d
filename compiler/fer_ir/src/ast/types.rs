//! Type expressions as written in source.

use crate::{Ident, Span, Spanned};

/// A type written in source, before resolution.
#[derive(Clone, PartialEq, Debug)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, span: Span) -> Self {
        TypeExpr { kind, span }
    }
}

impl Spanned for TypeExpr {
    fn span(&self) -> Span {
        self.span
    }
}

/// Type expression kinds.
#[derive(Clone, PartialEq, Debug)]
pub enum TypeExprKind {
    /// Named reference: a builtin name or a (possibly qualified) UDT name.
    Named(Ident),
    /// Pointer derivation `*T`.
    Pointer(Box<TypeExpr>),
    /// Reference derivation `&T`.
    Reference(Box<TypeExpr>),
    /// Slice derivation `[]T`.
    Slice(Box<TypeExpr>),
    /// Tuple `(T, U, ...)`.
    Tuple(Vec<TypeExpr>),
    /// Fixed-length vector `[T; n]`.
    Vector { elem: Box<TypeExpr>, len: u32 },
    /// Function type `fn(params...) -> ret`.
    Function {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
        varargs: bool,
    },
}
