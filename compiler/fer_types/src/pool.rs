//! Per-compilation-unit type pool.
//!
//! Structural types are interned by their shape: deriving the same base
//! with the same attribute stack twice returns the same `TypeId`.
//! Structures and aliases are nominal; their ids are handed out at
//! registration and their bodies mutate as the resolver substitutes
//! incomplete references.

use fer_ir::{Ident, StringInterner};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::trace;

use crate::{
    AliasData, AliasId, Builtin, DerivedAttr, Field, TypeError, TypeId, TypeKind, UdtData, UdtId,
};

/// The type pool for one compilation unit.
///
/// Confined to one unit's sequential pipeline; independent compilations use
/// independent pools. Only the builtin table layout is process-wide.
pub struct TypePool {
    kinds: Vec<TypeKind>,
    intern: FxHashMap<TypeKind, TypeId>,
    udts: Vec<UdtData>,
    aliases: Vec<AliasData>,
}

impl TypePool {
    /// Create a pool with the builtin table pre-interned at fixed ids.
    pub fn new() -> Self {
        let mut pool = TypePool {
            kinds: Vec::with_capacity(64),
            intern: FxHashMap::default(),
            udts: Vec::new(),
            aliases: Vec::new(),
        };
        for builtin in Builtin::ALL {
            let id = TypeId::from_raw(
                u32::try_from(pool.kinds.len()).unwrap_or_else(|_| unreachable!()),
            );
            pool.kinds.push(TypeKind::Builtin(builtin));
            pool.intern.insert(TypeKind::Builtin(builtin), id);
        }
        pool
    }

    /// The fixed id of a builtin.
    pub fn builtin(builtin: Builtin) -> TypeId {
        match builtin {
            Builtin::I8 => TypeId::I8,
            Builtin::I16 => TypeId::I16,
            Builtin::I32 => TypeId::I32,
            Builtin::I64 => TypeId::I64,
            Builtin::ISize => TypeId::ISIZE,
            Builtin::U8 => TypeId::U8,
            Builtin::U16 => TypeId::U16,
            Builtin::U32 => TypeId::U32,
            Builtin::U64 => TypeId::U64,
            Builtin::USize => TypeId::USIZE,
            Builtin::F32 => TypeId::F32,
            Builtin::F64 => TypeId::F64,
            Builtin::Bool => TypeId::BOOL,
            Builtin::Char => TypeId::CHAR,
            Builtin::Void => TypeId::VOID,
        }
    }

    /// Number of distinct types in the pool.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Intern a type by structure, returning the existing id when present.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.intern.get(&kind) {
            return id;
        }
        let id = TypeId::from_raw(
            u32::try_from(self.kinds.len()).unwrap_or_else(|_| unreachable!()),
        );
        self.kinds.push(kind.clone());
        self.intern.insert(kind, id);
        id
    }

    /// Look up a type's representation.
    ///
    /// # Panics
    /// Panics if the id was not produced by this pool; ids never cross
    /// pool boundaries.
    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.kinds[id.index()]
    }

    /// Fallible lookup for callers validating foreign ids.
    pub fn try_kind(&self, id: TypeId) -> Result<&TypeKind, TypeError> {
        self.kinds.get(id.index()).ok_or(TypeError::Unregistered(id))
    }

    // === Nominal tables ===

    /// Register a structure body, yielding its nominal id and type id.
    pub fn register_structure(&mut self, data: UdtData) -> (UdtId, TypeId) {
        let udt_id = UdtId(u32::try_from(self.udts.len()).unwrap_or_else(|_| unreachable!()));
        self.udts.push(data);
        let type_id = self.intern(TypeKind::Structure(udt_id));
        trace!(udt = udt_id.0, ty = type_id.raw(), "registered structure");
        (udt_id, type_id)
    }

    /// Register an alias body, yielding its nominal id and type id.
    pub fn register_alias(&mut self, data: AliasData) -> (AliasId, TypeId) {
        let alias_id =
            AliasId(u32::try_from(self.aliases.len()).unwrap_or_else(|_| unreachable!()));
        self.aliases.push(data);
        let type_id = self.intern(TypeKind::Aliased(alias_id));
        (alias_id, type_id)
    }

    pub fn udt(&self, id: UdtId) -> &UdtData {
        &self.udts[id.index()]
    }

    pub fn udt_mut(&mut self, id: UdtId) -> &mut UdtData {
        &mut self.udts[id.index()]
    }

    pub fn alias(&self, id: AliasId) -> &AliasData {
        &self.aliases[id.index()]
    }

    pub fn alias_mut(&mut self, id: AliasId) -> &mut AliasData {
        &mut self.aliases[id.index()]
    }

    /// The nominal structure id behind a type, if it is one.
    pub fn as_structure(&self, id: TypeId) -> Option<UdtId> {
        match self.kind(id) {
            TypeKind::Structure(udt) => Some(*udt),
            _ => None,
        }
    }

    /// The nominal alias id behind a type, if it is one.
    pub fn as_alias(&self, id: TypeId) -> Option<AliasId> {
        match self.kind(id) {
            TypeKind::Aliased(alias) => Some(*alias),
            _ => None,
        }
    }

    /// Replace one field's type during resolution.
    pub fn set_field_type(&mut self, udt: UdtId, field: usize, ty: TypeId) {
        self.udts[udt.index()].fields[field].ty = ty;
    }

    /// Mark a structure as fully resolved.
    pub fn mark_complete(&mut self, udt: UdtId) {
        trace!(udt = udt.0, "structure complete");
        self.udts[udt.index()].complete = true;
    }

    // === Construction helpers ===

    /// Derive a type by wrapping `base` in an attribute stack.
    ///
    /// Repeated calls with the same base and attributes return the same
    /// interned id. Deriving an already-derived base prepends the new
    /// attributes onto its stack, so `*(*T)` and `**T` intern identically.
    pub fn derive(&mut self, base: TypeId, attrs: &[DerivedAttr]) -> Result<TypeId, TypeError> {
        self.try_kind(base)?;
        if attrs.is_empty() {
            return Ok(base);
        }
        let (root, stack) = match self.kind(base) {
            TypeKind::Derived { base: inner, attrs: existing } => {
                let mut stack: SmallVec<[DerivedAttr; 2]> = attrs.iter().copied().collect();
                stack.extend_from_slice(existing);
                (*inner, stack)
            }
            _ => (base, attrs.iter().copied().collect()),
        };
        Ok(self.intern(TypeKind::Derived { base: root, attrs: stack }))
    }

    /// `*base`.
    pub fn pointer(&mut self, base: TypeId) -> Result<TypeId, TypeError> {
        self.derive(base, &[DerivedAttr::Pointer])
    }

    /// `&base`.
    pub fn reference(&mut self, base: TypeId) -> Result<TypeId, TypeError> {
        self.derive(base, &[DerivedAttr::Reference])
    }

    /// `[]base`.
    pub fn slice(&mut self, base: TypeId) -> Result<TypeId, TypeError> {
        self.derive(base, &[DerivedAttr::Slice])
    }

    /// A function signature type.
    pub fn function(&mut self, params: Vec<TypeId>, ret: TypeId, varargs: bool) -> TypeId {
        self.intern(TypeKind::Function { params, ret, varargs })
    }

    /// An anonymous tuple type.
    pub fn tuple(&mut self, elems: Vec<TypeId>) -> TypeId {
        self.intern(TypeKind::Tuple(elems))
    }

    /// A fixed-length vector type.
    pub fn vector(&mut self, elem: TypeId, len: u32) -> TypeId {
        self.intern(TypeKind::Vector { elem, len })
    }

    /// A not-yet-resolved named reference.
    pub fn incomplete(&mut self, name: Ident) -> TypeId {
        self.intern(TypeKind::Incomplete(name))
    }

    // === Completeness ===

    /// Whether a type and everything it references by value is resolved.
    ///
    /// Builtins are always complete. Indirection (pointer/reference/slice
    /// derivations) only requires the base to name a declaration, so
    /// mutually recursive types through pointers are complete. Structure
    /// completeness consults the flag maintained by the resolver, which
    /// processes dependencies first.
    pub fn is_complete(&self, id: TypeId) -> bool {
        let mut visiting = FxHashSet::default();
        self.complete_inner(id, &mut visiting)
    }

    fn complete_inner(&self, id: TypeId, visiting: &mut FxHashSet<TypeId>) -> bool {
        if !visiting.insert(id) {
            // Already under consideration on this path; alias or vector
            // cycles are reported elsewhere, do not loop here.
            return false;
        }
        let result = match self.kind(id) {
            TypeKind::Builtin(_) => true,
            TypeKind::Incomplete(_) => false,
            TypeKind::Structure(udt) => self.udt(*udt).complete,
            TypeKind::Aliased(alias) => self.complete_inner(self.alias(*alias).backing, visiting),
            TypeKind::Derived { base, .. } => self.names_resolved(*base, visiting),
            TypeKind::Function { params, ret, varargs: _ } => {
                params.iter().all(|p| self.complete_inner(*p, visiting))
                    && self.complete_inner(*ret, visiting)
            }
            TypeKind::Tuple(elems) => elems.iter().all(|e| self.complete_inner(*e, visiting)),
            TypeKind::Vector { elem, .. } => self.complete_inner(*elem, visiting),
        };
        visiting.remove(&id);
        result
    }

    /// Whether a type behind indirection resolves to a declaration,
    /// without requiring the declaration itself to be complete.
    fn names_resolved(&self, id: TypeId, visiting: &mut FxHashSet<TypeId>) -> bool {
        match self.kind(id) {
            TypeKind::Incomplete(_) => false,
            TypeKind::Aliased(alias) => {
                if !visiting.insert(id) {
                    return false;
                }
                let resolved = self.names_resolved(self.alias(*alias).backing, visiting);
                visiting.remove(&id);
                resolved
            }
            _ => true,
        }
    }

    /// Follow an alias chain to its ultimate backing type.
    ///
    /// Returns the input unchanged for non-aliases; stops on alias cycles.
    pub fn resolve_alias(&self, id: TypeId) -> TypeId {
        let mut current = id;
        let mut seen = FxHashSet::default();
        while let TypeKind::Aliased(alias) = self.kind(current) {
            if !seen.insert(current) {
                break;
            }
            current = self.alias(*alias).backing;
        }
        current
    }

    /// Ordered field list of a structure type, following aliases.
    pub fn fields_of(&self, id: TypeId) -> Option<&[Field]> {
        match self.kind(self.resolve_alias(id)) {
            TypeKind::Structure(udt) => Some(&self.udt(*udt).fields),
            _ => None,
        }
    }

    // === Rendering ===

    /// Human-readable form for diagnostics.
    pub fn display(&self, id: TypeId, interner: &StringInterner) -> String {
        match self.kind(id) {
            TypeKind::Builtin(builtin) => builtin.name().to_owned(),
            TypeKind::Structure(udt) => self.udt(*udt).name.display(interner),
            TypeKind::Aliased(alias) => self.alias(*alias).name.display(interner),
            TypeKind::Derived { base, attrs } => {
                let mut out = String::new();
                for attr in attrs {
                    out.push_str(match attr {
                        DerivedAttr::Pointer => "*",
                        DerivedAttr::Reference => "&",
                        DerivedAttr::Slice => "[]",
                    });
                }
                out.push_str(&self.display(*base, interner));
                out
            }
            TypeKind::Function { params, ret, varargs } => {
                let mut out = String::from("fn(");
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.display(*p, interner));
                }
                if *varargs {
                    out.push_str(", ...");
                }
                out.push_str(") -> ");
                out.push_str(&self.display(*ret, interner));
                out
            }
            TypeKind::Tuple(elems) => {
                let mut out = String::from("(");
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.display(*e, interner));
                }
                out.push(')');
                out
            }
            TypeKind::Vector { elem, len } => {
                format!("[{}; {}]", self.display(*elem, interner), len)
            }
            TypeKind::Incomplete(name) => format!("<incomplete {}>", name.display(interner)),
        }
    }

    /// Mangled form for symbol emission.
    ///
    /// Incomplete types cannot be mangled; the resolver must have finished
    /// with a type before any symbol referencing it is emitted.
    pub fn mangled_name(&self, id: TypeId, interner: &StringInterner) -> Result<String, TypeError> {
        match self.kind(id) {
            TypeKind::Builtin(builtin) => Ok(builtin.mangle_code().to_string()),
            TypeKind::Structure(udt) => {
                let data = self.udt(*udt);
                if !data.complete {
                    return Err(TypeError::Incomplete(data.name.display(interner)));
                }
                Ok(format!("T{}", data.name.display(interner)))
            }
            TypeKind::Aliased(alias) => {
                let backing = self.alias(*alias).backing;
                self.mangled_name(backing, interner)
            }
            TypeKind::Derived { base, attrs } => {
                let mut out: String = attrs.iter().map(|a| a.mangle_code()).collect();
                out.push_str(&self.mangled_name(*base, interner)?);
                Ok(out)
            }
            TypeKind::Function { params, ret, varargs } => {
                let mut out = String::from("F");
                for p in params {
                    out.push_str(&self.mangled_name(*p, interner)?);
                }
                if *varargs {
                    out.push('V');
                }
                out.push('E');
                out.push_str(&self.mangled_name(*ret, interner)?);
                Ok(out)
            }
            TypeKind::Tuple(elems) => {
                let mut out = String::from("U");
                for e in elems {
                    out.push_str(&self.mangled_name(*e, interner)?);
                }
                out.push('E');
                Ok(out)
            }
            TypeKind::Vector { elem, len } => {
                Ok(format!("W{}{}", len, self.mangled_name(*elem, interner)?))
            }
            TypeKind::Incomplete(name) => Err(TypeError::Incomplete(name.display(interner))),
        }
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}
