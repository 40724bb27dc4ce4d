//! Declaration registries populated by the collection pass.
//!
//! The type registry preserves declaration order so later passes see a
//! deterministic sequence, and exposes `reorder` for the dependency sort.
//! The function table groups declarations into overload sets keyed by
//! qualified name; an exact parameter-signature collision is rejected at
//! insertion so the caller can diagnose it against the surviving entry.

use fer_ir::{CallConv, Ident, Span, Stmt, StringInterner};
use rustc_hash::FxHashMap;

use crate::{ScopeId, TypeError, TypeId, TypePool};

/// Insertion-ordered registry of named types in one compilation unit.
pub struct UdtRegistry {
    entries: Vec<(Ident, TypeId)>,
    index: FxHashMap<Ident, usize>,
}

impl UdtRegistry {
    pub fn new() -> Self {
        UdtRegistry {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Register a type under its qualified name.
    ///
    /// Returns the previously registered id on collision, leaving the
    /// original entry in place.
    pub fn insert(&mut self, name: Ident, ty: TypeId) -> Result<(), TypeId> {
        if let Some(&slot) = self.index.get(&name) {
            return Err(self.entries[slot].1);
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, ty));
        Ok(())
    }

    pub fn get(&self, name: &Ident) -> Option<TypeId> {
        self.index.get(name).map(|&slot| self.entries[slot].1)
    }

    pub fn contains(&self, name: &Ident) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in their current order.
    pub fn iter(&self) -> impl Iterator<Item = (&Ident, TypeId)> + '_ {
        self.entries.iter().map(|(name, ty)| (name, *ty))
    }

    /// Replace the iteration order.
    ///
    /// Names in `order` come first, in the given sequence; entries not
    /// mentioned keep their relative order and follow at the end. Unknown
    /// names in `order` are ignored.
    pub fn reorder(&mut self, order: &[Ident]) {
        let mut reordered = Vec::with_capacity(self.entries.len());
        let mut taken = vec![false; self.entries.len()];
        for name in order {
            if let Some(&slot) = self.index.get(name) {
                if !taken[slot] {
                    taken[slot] = true;
                    reordered.push(self.entries[slot].clone());
                }
            }
        }
        for (slot, entry) in self.entries.iter().enumerate() {
            if !taken[slot] {
                reordered.push(entry.clone());
            }
        }
        self.entries = reordered;
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(slot, (name, _))| (name.clone(), slot))
            .collect();
    }
}

impl Default for UdtRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of a function in a [`FunctionTable`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct FuncId(u32);

impl FuncId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        FuncId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A collected function declaration.
#[derive(Clone, Debug)]
pub struct FuncDecl {
    /// Fully qualified name.
    pub name: Ident,
    pub call_conv: CallConv,
    /// Interned `TypeKind::Function` signature.
    pub signature: TypeId,
    /// Parameter names paired with their types, in declaration order.
    pub params: Vec<(fer_ir::Name, TypeId)>,
    pub varargs: bool,
    pub is_extern: bool,
    /// Unbound generic parameter names; non-empty means no body is emitted.
    pub generic_params: Vec<fer_ir::Name>,
    pub body: Option<Vec<Stmt>>,
    /// The scope the declaration appeared in.
    pub scope: ScopeId,
    pub span: Span,
}

impl FuncDecl {
    /// Whether a body can be emitted for this declaration.
    pub fn is_monomorphic(&self) -> bool {
        self.generic_params.is_empty()
    }

    /// The linker-visible symbol.
    ///
    /// Extern declarations keep their bare final segment; everything else
    /// gets the qualified path with the parameter signature appended, so
    /// overloads emit distinct symbols.
    pub fn mangled_name(
        &self,
        pool: &TypePool,
        interner: &StringInterner,
    ) -> Result<String, TypeError> {
        if self.is_extern {
            let last = self.name.last().unwrap_or(fer_ir::Name::EMPTY);
            return Ok(interner.lookup(last).to_owned());
        }
        let mut out = String::from("_F");
        for (i, segment) in self.name.segments().iter().enumerate() {
            if i > 0 {
                out.push('_');
            }
            out.push_str(interner.lookup(*segment));
        }
        out.push_str("__");
        for (_, ty) in &self.params {
            out.push_str(&pool.mangled_name(*ty, interner)?);
        }
        if self.varargs {
            out.push('V');
        }
        Ok(out)
    }
}

/// All function declarations in one compilation unit, grouped by name.
pub struct FunctionTable {
    funcs: Vec<FuncDecl>,
    overloads: FxHashMap<Ident, Vec<FuncId>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        FunctionTable {
            funcs: Vec::new(),
            overloads: FxHashMap::default(),
        }
    }

    /// Add a declaration to its overload set.
    ///
    /// Two declarations under one name may coexist as long as their
    /// parameter lists differ; an exact collision returns the id of the
    /// entry already holding that signature.
    pub fn insert(&mut self, decl: FuncDecl) -> Result<FuncId, FuncId> {
        if let Some(set) = self.overloads.get(&decl.name) {
            for &existing in set {
                let prior = &self.funcs[existing.index()];
                let prior_params: Vec<TypeId> = prior.params.iter().map(|(_, t)| *t).collect();
                let new_params: Vec<TypeId> = decl.params.iter().map(|(_, t)| *t).collect();
                if prior_params == new_params && prior.varargs == decl.varargs {
                    return Err(existing);
                }
            }
        }
        let id = FuncId(u32::try_from(self.funcs.len()).unwrap_or_else(|_| unreachable!()));
        self.overloads.entry(decl.name.clone()).or_default().push(id);
        self.funcs.push(decl);
        Ok(id)
    }

    pub fn get(&self, id: FuncId) -> &FuncDecl {
        &self.funcs[id.index()]
    }

    pub fn get_mut(&mut self, id: FuncId) -> &mut FuncDecl {
        &mut self.funcs[id.index()]
    }

    /// The overload set registered under a qualified name.
    pub fn overloads(&self, name: &Ident) -> &[FuncId] {
        self.overloads.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// Iterate declarations in collection order.
    pub fn iter(&self) -> impl Iterator<Item = (FuncId, &FuncDecl)> + '_ {
        self.funcs
            .iter()
            .enumerate()
            .map(|(i, decl)| (FuncId(i as u32), decl))
    }
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::new()
    }
}
