//! Top-level declarations.

use bitflags::bitflags;

use super::{Stmt, TypeExpr};
use crate::{Ident, Name, Span, Spanned};

/// A top-level (or UDT-nested) declaration.
#[derive(Clone, PartialEq, Debug)]
pub struct Item {
    pub kind: ItemKind,
    pub span: Span,
}

impl Item {
    pub fn new(kind: ItemKind, span: Span) -> Self {
        Item { kind, span }
    }
}

impl Spanned for Item {
    fn span(&self) -> Span {
        self.span
    }
}

/// Declaration kinds.
#[derive(Clone, PartialEq, Debug)]
pub enum ItemKind {
    /// struct/class/enum-class/trait/attribute declaration.
    Udt(StructDecl),
    /// `type Name = Backing` alias.
    TypeAlias(TypeAliasDecl),
    /// Function prototype or definition.
    Function(FunctionDecl),
}

/// What kind of user-defined type a declaration introduces.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UdtKind {
    Struct,
    Class,
    EnumClass,
    Trait,
    Attribute,
}

impl UdtKind {
    pub fn keyword(self) -> &'static str {
        match self {
            UdtKind::Struct => "struct",
            UdtKind::Class => "class",
            UdtKind::EnumClass => "enum class",
            UdtKind::Trait => "trait",
            UdtKind::Attribute => "attrib",
        }
    }
}

bitflags! {
    /// Storage modifiers on a field.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct StorageFlags: u8 {
        const STATIC = 1 << 0;
        const CONST  = 1 << 1;
        const TLS    = 1 << 2;
    }
}

/// A field inside a UDT declaration.
#[derive(Clone, PartialEq, Debug)]
pub struct FieldDecl {
    pub name: Name,
    pub ty: TypeExpr,
    pub is_public: bool,
    pub is_mutable: bool,
    pub storage: StorageFlags,
    pub span: Span,
}

/// A struct/class/enum-class/trait/attribute declaration.
///
/// `items` holds declarations nested inside the UDT body; they open a new
/// lexical scope named after the UDT.
#[derive(Clone, PartialEq, Debug)]
pub struct StructDecl {
    pub name: Name,
    pub kind: UdtKind,
    pub fields: Vec<FieldDecl>,
    pub items: Vec<Item>,
}

/// A `type Name = Backing` declaration.
#[derive(Clone, PartialEq, Debug)]
pub struct TypeAliasDecl {
    pub name: Name,
    pub backing: TypeExpr,
}

/// Calling convention for a function.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum CallConv {
    #[default]
    Cdecl,
    FastCall,
    StdCall,
    ThisCall,
}

/// A function parameter.
#[derive(Clone, PartialEq, Debug)]
pub struct Param {
    pub name: Name,
    pub ty: TypeExpr,
    pub span: Span,
}

/// A function prototype or definition.
#[derive(Clone, PartialEq, Debug)]
pub struct FunctionDecl {
    pub name: Name,
    pub call_conv: CallConv,
    pub params: Vec<Param>,
    pub ret: TypeExpr,
    pub varargs: bool,
    pub is_extern: bool,
    /// Generic parameter names. Empty means the function is monomorphic.
    pub generic_params: Vec<Name>,
    /// `None` for a bare prototype.
    pub body: Option<Vec<Stmt>>,
}

impl FunctionDecl {
    /// A function with no unresolved generic parameters can have its body
    /// emitted directly.
    pub fn is_monomorphic(&self) -> bool {
        self.generic_params.is_empty()
    }

    pub fn qualified_name(&self, scope: &Ident) -> Ident {
        scope.child(self.name)
    }
}
