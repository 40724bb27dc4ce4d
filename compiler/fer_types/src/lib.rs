//! Type graph for the Ferrous compiler.
//!
//! Every distinct type value exists exactly once per compilation unit:
//! structural types (derivations, functions, tuples, vectors) are interned
//! in a [`TypePool`] keyed by their structure, while structures and aliases
//! are nominal entries whose bodies mutate as resolution progresses.
//! External code works with [`TypeId`] indices, so equality is O(1).
//!
//! The pool is created per compilation unit and passed by reference through
//! the pipeline; only the fixed builtin table is process-wide.

mod builtin;
mod data;
mod error;
mod pool;
mod registry;
mod scope;
mod target;

pub use builtin::Builtin;
pub use data::{AliasData, AliasId, DerivedAttr, Field, TypeId, TypeKind, UdtData, UdtId};
pub use error::TypeError;
pub use pool::TypePool;
pub use registry::{FuncDecl, FuncId, FunctionTable, UdtRegistry};
pub use scope::{ScopeArena, ScopeId, ScopeKind, ScopeStack};
pub use target::{BackendType, BackendValue, TargetMachine};
