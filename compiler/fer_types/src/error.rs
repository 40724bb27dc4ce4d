//! Type graph errors.

use crate::TypeId;

/// Errors raised by the type pool and target-machine surface.
///
/// `Incomplete` at materialization time indicates the resolver failed to
/// gate correctly; callers treat it as an internal invariant violation
/// rather than an ordinary diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// The given id does not name a registered type.
    #[error("type {0:?} is not registered in this pool")]
    Unregistered(TypeId),

    /// The type is not complete; it cannot be materialized or mangled.
    #[error("type `{0}` is incomplete")]
    Incomplete(String),
}
