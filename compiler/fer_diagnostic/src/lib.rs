//! Diagnostic system for the Ferrous compiler.
//!
//! Diagnostics carry a stable error code, labeled spans, and a message.
//! Recoverable problems are accumulated into a [`DiagnosticQueue`] so a
//! single pass can surface many independent errors; only internal
//! invariant violations abort compilation.

mod diagnostic;
mod error_code;
mod queue;

pub use diagnostic::{
    duplicate_type, missing_return, unresolved_type, Diagnostic, Label, Severity,
};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticQueue, QueueConfig};
