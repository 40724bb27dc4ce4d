//! Statements.

use super::{Expr, TypeExpr};
use crate::{Name, Span, Spanned};

/// Statement node.
#[derive(Clone, PartialEq, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }

    /// Whether this statement ends the enclosing scope's control flow.
    ///
    /// The function-body walker uses this to decide between synthesizing an
    /// implicit return and reporting a missing one.
    pub fn terminates_scope(&self) -> bool {
        matches!(self.kind, StmtKind::Return(_))
    }
}

impl Spanned for Stmt {
    fn span(&self) -> Span {
        self.span
    }
}

/// Statement kinds.
#[derive(Clone, PartialEq, Debug)]
pub enum StmtKind {
    /// `let [mut] name [: ty] [= init]`.
    Let {
        name: Name,
        ty: Option<TypeExpr>,
        init: Option<Expr>,
        mutable: bool,
    },
    /// `return [expr]`.
    Return(Option<Expr>),
    /// Expression evaluated for effect; result discarded.
    Expr(Expr),
    /// A named label preceding a loop.
    Label(Name),
}
