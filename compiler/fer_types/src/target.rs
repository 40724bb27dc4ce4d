//! Target-machine surface.
//!
//! The resolver materializes completed types through this trait without
//! knowing which backend is behind it. Backend handles are opaque u32 ids;
//! only the implementing backend can interpret them.

use crate::{TypeError, TypeId, TypePool};

/// Opaque handle to a backend type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct BackendType(pub u32);

/// Opaque handle to a backend value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct BackendValue(pub u32);

/// A code-generation target.
///
/// Implementations memoize materialization, so repeated calls for the same
/// id are cheap and return the same handle.
pub trait TargetMachine {
    /// Lower a complete type to its backend representation.
    ///
    /// Callers gate on [`TypePool::is_complete`] first; an `Incomplete`
    /// error here means that gate was bypassed.
    fn materialize_type(&mut self, pool: &TypePool, id: TypeId) -> Result<BackendType, TypeError>;

    /// Pointer width in bytes. Decides the width of `isize`/`usize`.
    fn pointer_size(&self) -> u32;

    /// ABI alignment of a type in bytes.
    fn type_alignment(&self, pool: &TypePool, id: TypeId) -> u32;
}
