//! Semantic analysis for the Ferrous compiler.
//!
//! Two sequential passes over one compilation unit:
//!
//! 1. **Collection** ([`collect`]): a single walk of the parsed items that
//!    registers every user-defined type, alias, and function prototype.
//!    Duplicate declarations are diagnosed and skipped; the first
//!    registration wins.
//! 2. **Resolution** ([`Resolver`]): builds a dependency graph over the
//!    registered types, orders it child-before-parent, substitutes resolved
//!    definitions into fields, alias backings, and function signatures, and
//!    materializes the completed types through the target machine in
//!    dependency order.
//!
//! Both passes accumulate diagnostics into a [`DiagnosticQueue`] rather than
//! failing fast, so one compilation can surface many independent problems.
//!
//! [`DiagnosticQueue`]: fer_diagnostic::DiagnosticQueue

mod collect;
mod resolve;

pub use collect::{collect, lower_type_expr};
pub use resolve::Resolver;

use fer_types::{FunctionTable, ScopeArena, TypePool, UdtRegistry};

/// Per-compilation-unit analysis state.
///
/// Created fresh for every `compile` invocation and dropped afterwards;
/// nothing here survives across independent compilations.
pub struct AnalysisState {
    pub pool: TypePool,
    pub scopes: ScopeArena,
    pub registry: UdtRegistry,
    pub functions: FunctionTable,
}

impl AnalysisState {
    pub fn new() -> Self {
        AnalysisState {
            pool: TypePool::new(),
            scopes: ScopeArena::new(),
            registry: UdtRegistry::new(),
            functions: FunctionTable::new(),
        }
    }
}

impl Default for AnalysisState {
    fn default() -> Self {
        Self::new()
    }
}
