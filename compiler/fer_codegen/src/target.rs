//! Reference target machine.
//!
//! Materializes types into opaque handles with memoization, enforcing the
//! complete-types-only contract. Real backends plug in behind the same
//! [`TargetMachine`] trait; this one exists so the pipeline and tests can
//! run without a native code generator.

use fer_types::{BackendType, Builtin, TargetMachine, TypeError, TypeId, TypeKind, TypePool};
use rustc_hash::FxHashMap;
use tracing::trace;

/// In-memory target with a configurable pointer width.
pub struct SimpleTarget {
    pointer_size: u32,
    memo: FxHashMap<TypeId, BackendType>,
    next: u32,
}

impl SimpleTarget {
    pub fn new() -> Self {
        Self::with_pointer_size(8)
    }

    pub fn with_pointer_size(pointer_size: u32) -> Self {
        SimpleTarget {
            pointer_size,
            memo: FxHashMap::default(),
            next: 0,
        }
    }

    /// Number of distinct types materialized so far.
    pub fn materialized_count(&self) -> usize {
        self.memo.len()
    }

    fn alloc(&mut self, id: TypeId) -> BackendType {
        let handle = BackendType(self.next);
        self.next += 1;
        self.memo.insert(id, handle);
        handle
    }
}

impl Default for SimpleTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetMachine for SimpleTarget {
    fn materialize_type(&mut self, pool: &TypePool, id: TypeId) -> Result<BackendType, TypeError> {
        if let Some(&handle) = self.memo.get(&id) {
            return Ok(handle);
        }
        if !pool.is_complete(id) {
            return Err(TypeError::Incomplete(format!("{id:?}")));
        }
        // Composite construction needs member handles first.
        match pool.kind(id).clone() {
            TypeKind::Builtin(_) | TypeKind::Derived { .. } => {}
            TypeKind::Structure(udt) => {
                let fields = pool.udt(udt).fields.clone();
                for field in fields {
                    self.materialize_type(pool, field.ty)?;
                }
            }
            TypeKind::Aliased(alias) => {
                let backing = pool.alias(alias).backing;
                self.materialize_type(pool, backing)?;
            }
            TypeKind::Function { params, ret, .. } => {
                for param in params {
                    self.materialize_type(pool, param)?;
                }
                self.materialize_type(pool, ret)?;
            }
            TypeKind::Tuple(elems) => {
                for elem in elems {
                    self.materialize_type(pool, elem)?;
                }
            }
            TypeKind::Vector { elem, .. } => {
                self.materialize_type(pool, elem)?;
            }
            TypeKind::Incomplete(_) => return Err(TypeError::Incomplete(format!("{id:?}"))),
        }
        trace!(?id, "materialized type");
        Ok(self.alloc(id))
    }

    fn pointer_size(&self) -> u32 {
        self.pointer_size
    }

    fn type_alignment(&self, pool: &TypePool, id: TypeId) -> u32 {
        // A structure aligns to its widest field.
        if let Some(fields) = pool.fields_of(id) {
            return fields
                .iter()
                .map(|f| self.type_alignment(pool, f.ty))
                .max()
                .unwrap_or(1);
        }
        match pool.kind(pool.resolve_alias(id)) {
            TypeKind::Builtin(builtin) => match builtin {
                Builtin::ISize | Builtin::USize => self.pointer_size,
                Builtin::Void => 1,
                other => other.bit_width().map_or(1, |w| w.div_ceil(8).max(1)),
            },
            TypeKind::Tuple(elems) => elems
                .iter()
                .map(|&e| self.type_alignment(pool, e))
                .max()
                .unwrap_or(1),
            TypeKind::Vector { elem, .. } => self.type_alignment(pool, *elem),
            // Pointers, functions, unresolved aliases.
            _ => self.pointer_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_materialization_is_memoized() {
        let pool = TypePool::new();
        let mut target = SimpleTarget::new();
        let a = target.materialize_type(&pool, TypeId::I32).expect("builtin is complete");
        let b = target.materialize_type(&pool, TypeId::I32).expect("builtin is complete");
        assert_eq!(a, b);
        assert_eq!(target.materialized_count(), 1);
    }

    #[test]
    fn test_incomplete_is_rejected() {
        let interner = fer_ir::StringInterner::new();
        let mut pool = TypePool::new();
        let dangling = pool.incomplete(fer_ir::Ident::parse("Ghost", &interner));
        let mut target = SimpleTarget::new();
        assert!(matches!(
            target.materialize_type(&pool, dangling),
            Err(TypeError::Incomplete(_))
        ));
    }

    #[test]
    fn test_alignment() {
        let mut pool = TypePool::new();
        let target = SimpleTarget::with_pointer_size(8);
        assert_eq!(target.type_alignment(&pool, TypeId::U8), 1);
        assert_eq!(target.type_alignment(&pool, TypeId::F64), 8);
        assert_eq!(target.type_alignment(&pool, TypeId::USIZE), 8);
        let ptr = pool.pointer(TypeId::VOID).expect("registered base");
        assert_eq!(target.type_alignment(&pool, ptr), 8);
    }

    #[test]
    fn test_struct_alignment_is_widest_field() {
        use fer_ir::{Ident, Span, StorageFlags, StringInterner, UdtKind};
        use fer_types::{Field, ScopeId, UdtData};

        let interner = StringInterner::new();
        let mut pool = TypePool::new();
        let field = |name: &str, ty: TypeId| Field {
            name: interner.intern(name),
            ty,
            is_public: true,
            is_mutable: false,
            storage: StorageFlags::empty(),
            span: Span::DUMMY,
        };
        let (udt, ty) = pool.register_structure(UdtData {
            name: Ident::parse("Mixed", &interner),
            kind: UdtKind::Struct,
            fields: vec![field("a", TypeId::U8), field("b", TypeId::F64)],
            scope: ScopeId::GLOBAL,
            complete: false,
            span: Span::DUMMY,
        });
        pool.mark_complete(udt);

        let target = SimpleTarget::with_pointer_size(8);
        assert_eq!(target.type_alignment(&pool, ty), 8);
    }
}
