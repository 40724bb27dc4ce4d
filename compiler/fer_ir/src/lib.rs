//! Source representation for the Ferrous compiler.
//!
//! This crate contains the data the semantic core consumes:
//! - Spans for source locations
//! - Interned names and qualified identifiers
//! - The syntax tree handed over by the external parser
//!
//! # Design
//!
//! - **Intern everything**: strings become `Name(u32)`, identifiers are
//!   short sequences of interned segments.
//! - **Closed node sets**: the syntax tree is a family of tagged unions
//!   walked with `match`; there is no visitor dispatch.

pub mod ast;
mod ident;
mod interner;
mod name;
mod span;

pub use ast::{
    BinaryOp, CallConv, Expr, ExprKind, FieldDecl, FunctionDecl, Item, ItemKind, Literal, Param,
    Stmt, StmtKind, StorageFlags, StructDecl, TypeAliasDecl, TypeExpr, TypeExprKind, UdtKind,
    UnaryOp,
};
pub use ident::Ident;
pub use interner::StringInterner;
pub use name::Name;
pub use span::{Span, Spanned};
