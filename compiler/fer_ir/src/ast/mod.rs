//! Syntax tree consumed from the external parser.
//!
//! A closed set of tagged unions. The semantic core walks these with
//! `match`; node kinds never grow behind trait objects.

mod expr;
mod item;
mod stmt;
mod types;

pub use expr::{BinaryOp, Expr, ExprKind, Literal, UnaryOp};
pub use item::{
    CallConv, FieldDecl, FunctionDecl, Item, ItemKind, Param, StorageFlags, StructDecl,
    TypeAliasDecl, UdtKind,
};
pub use stmt::{Stmt, StmtKind};
pub use types::{TypeExpr, TypeExprKind};
