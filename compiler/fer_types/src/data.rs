//! Internal type representation stored in the pool.
//!
//! External code works with `TypeId` (u32 indices) for O(1) equality.
//! Compound types store `TypeId` children, never boxed types.

use fer_ir::{Ident, Name, Span, StorageFlags, UdtKind};
use smallvec::SmallVec;

use crate::{Builtin, ScopeId};

/// Interned type id. An index into the [`TypePool`](crate::TypePool).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    // Builtins are pre-interned in `Builtin::ALL` order.
    pub const I8: TypeId = TypeId(0);
    pub const I16: TypeId = TypeId(1);
    pub const I32: TypeId = TypeId(2);
    pub const I64: TypeId = TypeId(3);
    pub const ISIZE: TypeId = TypeId(4);
    pub const U8: TypeId = TypeId(5);
    pub const U16: TypeId = TypeId(6);
    pub const U32: TypeId = TypeId(7);
    pub const U64: TypeId = TypeId(8);
    pub const USIZE: TypeId = TypeId(9);
    pub const F32: TypeId = TypeId(10);
    pub const F64: TypeId = TypeId(11);
    pub const BOOL: TypeId = TypeId(12);
    pub const CHAR: TypeId = TypeId(13);
    pub const VOID: TypeId = TypeId(14);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        TypeId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Index of a structure entry in the pool's nominal table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct UdtId(pub u32);

impl UdtId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of an alias entry in the pool's nominal table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct AliasId(pub u32);

impl AliasId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One attribute in a derivation stack.
///
/// All three introduce indirection, so a derived type never forces its base
/// to be complete by value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DerivedAttr {
    Pointer,
    Reference,
    Slice,
}

impl DerivedAttr {
    pub fn mangle_code(self) -> char {
        match self {
            DerivedAttr::Pointer => 'P',
            DerivedAttr::Reference => 'R',
            DerivedAttr::Slice => 'A',
        }
    }
}

/// Type representation stored in the pool.
///
/// A closed sum; variant discrimination is always a `match`, never a
/// downcast chain.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeKind {
    /// Builtin scalar (pre-interned at a fixed id).
    Builtin(Builtin),
    /// Named structure; body lives in the pool's nominal table.
    Structure(UdtId),
    /// Named alias; backing lives in the pool's nominal table.
    Aliased(AliasId),
    /// Base type wrapped in an ordered attribute stack, outermost first.
    Derived {
        base: TypeId,
        attrs: SmallVec<[DerivedAttr; 2]>,
    },
    /// Function signature.
    Function {
        params: Vec<TypeId>,
        ret: TypeId,
        varargs: bool,
    },
    /// Anonymous tuple.
    Tuple(Vec<TypeId>),
    /// Fixed-length vector.
    Vector { elem: TypeId, len: u32 },
    /// A named reference that has not been resolved to a declaration yet.
    Incomplete(Ident),
}

/// A field of a user-defined type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Field {
    pub name: Name,
    pub ty: TypeId,
    pub is_public: bool,
    pub is_mutable: bool,
    pub storage: StorageFlags,
    pub span: Span,
}

/// Body of a user-defined type.
#[derive(Clone, Debug)]
pub struct UdtData {
    /// Fully qualified name.
    pub name: Ident,
    pub kind: UdtKind,
    /// Ordered field list; field types mutate during resolution.
    pub fields: Vec<Field>,
    /// The scope the declaration appeared in.
    pub scope: ScopeId,
    /// True once every field type transitively resolves to a declaration.
    pub complete: bool,
    pub span: Span,
}

/// Body of a type alias.
#[derive(Clone, Debug)]
pub struct AliasData {
    /// Fully qualified name.
    pub name: Ident,
    /// Backing type; may be `Incomplete` until resolution.
    pub backing: TypeId,
    pub scope: ScopeId,
    pub span: Span,
}
