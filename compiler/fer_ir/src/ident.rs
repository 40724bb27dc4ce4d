//! Qualified identifiers.

use smallvec::SmallVec;

use crate::{Name, StringInterner};

/// Immutable qualified name: an ordered sequence of path segments.
///
/// `vec2.x` is two segments; a bare name is one. Equality is structural
/// over the interned segments. Most identifiers are short, so segments are
/// stored inline.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Ident {
    segments: SmallVec<[Name; 2]>,
}

impl Ident {
    /// The empty identifier (zero segments). Names the global scope.
    pub const EMPTY: Ident = Ident {
        segments: SmallVec::new_const(),
    };

    /// Create a single-segment identifier.
    pub fn simple(name: Name) -> Self {
        let mut segments = SmallVec::new();
        segments.push(name);
        Ident { segments }
    }

    /// Create from an ordered list of segments.
    pub fn from_segments(segments: impl IntoIterator<Item = Name>) -> Self {
        Ident {
            segments: segments.into_iter().collect(),
        }
    }

    /// Intern a dotted path like `"outer.inner"`.
    pub fn parse(path: &str, interner: &StringInterner) -> Self {
        if path.is_empty() {
            return Ident::EMPTY;
        }
        Ident {
            segments: path.split('.').map(|s| interner.intern(s)).collect(),
        }
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check for the empty identifier.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether this identifier has more than one segment.
    pub fn is_qualified(&self) -> bool {
        self.segments.len() > 1
    }

    /// The ordered segments.
    pub fn segments(&self) -> &[Name] {
        &self.segments
    }

    /// The final segment, if any.
    pub fn last(&self) -> Option<Name> {
        self.segments.last().copied()
    }

    /// Join another identifier onto the end of this one.
    #[must_use]
    pub fn join(&self, other: &Ident) -> Ident {
        let mut segments = self.segments.clone();
        segments.extend_from_slice(&other.segments);
        Ident { segments }
    }

    /// Append a single segment.
    #[must_use]
    pub fn child(&self, name: Name) -> Ident {
        let mut segments = self.segments.clone();
        segments.push(name);
        Ident { segments }
    }

    /// Drop the final segment. Returns `None` for the empty identifier.
    pub fn parent(&self) -> Option<Ident> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Ident {
            segments: self.segments[..self.segments.len() - 1].iter().copied().collect(),
        })
    }

    /// A prefix of the first `n` segments.
    #[must_use]
    pub fn prefix(&self, n: usize) -> Ident {
        Ident {
            segments: self.segments[..n.min(self.segments.len())]
                .iter()
                .copied()
                .collect(),
        }
    }

    /// Render with `.` separators.
    pub fn display(&self, interner: &StringInterner) -> String {
        let mut out = String::new();
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(interner.lookup(*seg));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_and_display() {
        let interner = StringInterner::new();
        let id = Ident::parse("outer.inner.Vec2", &interner);
        assert_eq!(id.len(), 3);
        assert!(id.is_qualified());
        assert_eq!(id.display(&interner), "outer.inner.Vec2");
    }

    #[test]
    fn test_structural_equality() {
        let interner = StringInterner::new();
        let a = Ident::parse("a.b", &interner);
        let b = Ident::simple(interner.intern("a")).child(interner.intern("b"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_join_and_parent() {
        let interner = StringInterner::new();
        let scope = Ident::parse("outer", &interner);
        let name = Ident::parse("Vec2", &interner);
        let joined = scope.join(&name);
        assert_eq!(joined.display(&interner), "outer.Vec2");
        assert_eq!(joined.parent(), Some(scope));
        assert_eq!(Ident::EMPTY.parent(), None);
    }

    #[test]
    fn test_prefix() {
        let interner = StringInterner::new();
        let id = Ident::parse("a.b.c", &interner);
        assert_eq!(id.prefix(2).display(&interner), "a.b");
        assert_eq!(id.prefix(9), id);
        assert!(id.prefix(0).is_empty());
    }

    #[test]
    fn test_empty_join_is_identity() {
        let interner = StringInterner::new();
        let id = Ident::parse("Vec2", &interner);
        assert_eq!(Ident::EMPTY.join(&id), id);
    }
}
