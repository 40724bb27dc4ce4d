//! Lexical scope arena.
//!
//! Scopes form a tree rooted at the global scope. Each scope stores the
//! index of its parent rather than a back-pointer, so the arena is a flat
//! `Vec` and walking outward is an index chase. The analyzer threads a
//! [`ScopeStack`] through its traversal and captures clones of it for
//! deferred sub-walks (field layout runs after the enclosing item walk).

use fer_ir::{Ident, Name, StringInterner};

/// Index of a scope in a [`ScopeArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The root scope, present in every arena.
    pub const GLOBAL: ScopeId = ScopeId(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ScopeId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What kind of construct opened a scope.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ScopeKind {
    Global,
    /// A user-defined type body. Contributes a segment to qualified names.
    Udt,
    Function,
    Block,
    Loop,
}

impl ScopeKind {
    /// Whether names declared here are qualified by this scope's name.
    pub fn qualifies(self) -> bool {
        matches!(self, ScopeKind::Udt)
    }
}

#[derive(Clone, Debug)]
struct ScopeData {
    kind: ScopeKind,
    /// Unqualified scope name; `Name::EMPTY` for anonymous scopes.
    name: Name,
    /// `None` only for the global scope.
    parent: Option<ScopeId>,
}

/// Flat arena of all scopes in one compilation unit.
pub struct ScopeArena {
    scopes: Vec<ScopeData>,
}

impl ScopeArena {
    pub fn new() -> Self {
        ScopeArena {
            scopes: vec![ScopeData {
                kind: ScopeKind::Global,
                name: Name::EMPTY,
                parent: None,
            }],
        }
    }

    /// Allocate a child scope.
    pub fn push(&mut self, kind: ScopeKind, name: Name, parent: ScopeId) -> ScopeId {
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or_else(|_| unreachable!()));
        self.scopes.push(ScopeData { kind, name, parent: Some(parent) });
        id
    }

    pub fn kind(&self, id: ScopeId) -> ScopeKind {
        self.scopes[id.index()].kind
    }

    pub fn name(&self, id: ScopeId) -> Name {
        self.scopes[id.index()].name
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes[id.index()].parent
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Iterate from `id` outward to the global scope, inclusive.
    pub fn chain(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        let mut current = Some(id);
        std::iter::from_fn(move || {
            let id = current?;
            current = self.parent(id);
            Some(id)
        })
    }

    /// The qualified name formed by the name-contributing scopes from the
    /// global scope down to `id`, with `name` appended.
    pub fn qualify(&self, id: ScopeId, name: Ident) -> Ident {
        let mut segments: Vec<Name> = self
            .chain(id)
            .filter(|&s| self.kind(s).qualifies())
            .map(|s| self.name(s))
            .collect();
        segments.reverse();
        let mut qualified = Ident::from_segments(segments);
        for segment in name.segments() {
            qualified = qualified.child(*segment);
        }
        qualified
    }

    /// Debug rendering of a scope path.
    pub fn display(&self, id: ScopeId, interner: &StringInterner) -> String {
        if id == ScopeId::GLOBAL {
            return "<global>".to_owned();
        }
        let mut names: Vec<&str> = self
            .chain(id)
            .filter(|&s| s != ScopeId::GLOBAL)
            .map(|s| interner.lookup(self.name(s)))
            .collect();
        names.reverse();
        names.join(".")
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

/// The analyzer's current position in the scope tree.
///
/// Cheap to clone; deferred walks capture a snapshot and resume from it.
#[derive(Clone, Debug)]
pub struct ScopeStack {
    stack: Vec<ScopeId>,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack { stack: vec![ScopeId::GLOBAL] }
    }

    /// Snapshot positioned at an arbitrary scope, for deferred walks.
    pub fn at(arena: &ScopeArena, id: ScopeId) -> Self {
        let mut stack: Vec<ScopeId> = arena.chain(id).collect();
        stack.reverse();
        ScopeStack { stack }
    }

    pub fn current(&self) -> ScopeId {
        *self.stack.last().unwrap_or(&ScopeId::GLOBAL)
    }

    /// Enter a freshly allocated child of the current scope.
    pub fn enter(&mut self, arena: &mut ScopeArena, kind: ScopeKind, name: Name) -> ScopeId {
        let id = arena.push(kind, name, self.current());
        self.stack.push(id);
        id
    }

    pub fn exit(&mut self) {
        debug_assert!(self.stack.len() > 1, "cannot exit the global scope");
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_chain_walks_outward() {
        let mut arena = ScopeArena::new();
        let a = arena.push(ScopeKind::Udt, Name::EMPTY, ScopeId::GLOBAL);
        let b = arena.push(ScopeKind::Function, Name::EMPTY, a);
        let chain: Vec<ScopeId> = arena.chain(b).collect();
        assert_eq!(chain, vec![b, a, ScopeId::GLOBAL]);
    }

    #[test]
    fn test_qualify_uses_udt_scopes_only() {
        let interner = StringInterner::new();
        let outer = interner.intern("Outer");
        let inner = interner.intern("Inner");
        let field = interner.intern("size");

        let mut arena = ScopeArena::new();
        let udt = arena.push(ScopeKind::Udt, outer, ScopeId::GLOBAL);
        let f = arena.push(ScopeKind::Function, Name::EMPTY, udt);
        let nested = arena.push(ScopeKind::Udt, inner, f);

        let qualified = arena.qualify(nested, Ident::simple(field));
        assert_eq!(qualified.display(&interner), "Outer.Inner.size");
    }

    #[test]
    fn test_stack_enter_exit() {
        let mut arena = ScopeArena::new();
        let mut stack = ScopeStack::new();
        assert_eq!(stack.current(), ScopeId::GLOBAL);

        let udt = stack.enter(&mut arena, ScopeKind::Udt, Name::EMPTY);
        assert_eq!(stack.current(), udt);
        stack.exit();
        assert_eq!(stack.current(), ScopeId::GLOBAL);
    }

    #[test]
    fn test_snapshot_resumes_deferred_walks() {
        let mut arena = ScopeArena::new();
        let mut stack = ScopeStack::new();
        let udt = stack.enter(&mut arena, ScopeKind::Udt, Name::EMPTY);
        stack.exit();

        let resumed = ScopeStack::at(&arena, udt);
        assert_eq!(resumed.current(), udt);
        assert_eq!(resumed.depth(), 2);
    }
}
