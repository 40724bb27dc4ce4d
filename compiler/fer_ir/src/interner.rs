//! String interner backing [`Name`] ids.
//!
//! Interned strings are leaked to obtain `'static` lifetimes, so lookups
//! can hand out references without lifetime plumbing. One interner lives
//! for the duration of the process; the per-unit type tables reference it.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

struct InternTable {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

impl InternTable {
    fn new() -> Self {
        let mut table = InternTable {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        // Empty string lives at index 0 so Name::EMPTY always resolves.
        table.map.insert("", 0);
        table.strings.push("");
        table
    }
}

/// String interner with O(1) lookup and equality.
///
/// Guarded by a single `RwLock`; the compilation pipeline is sequential per
/// unit, so the lock is uncontended in practice.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    /// Create a new interner with builtin type names pre-interned.
    pub fn new() -> Self {
        let interner = StringInterner {
            table: RwLock::new(InternTable::new()),
        };
        interner.pre_intern_builtins();
        interner
    }

    /// Intern a string, returning its `Name`.
    pub fn intern(&self, s: &str) -> Name {
        {
            let guard = self.table.read();
            if let Some(&idx) = guard.map.get(s) {
                return Name::from_raw(idx);
            }
        }

        let mut guard = self.table.write();
        // Re-check after acquiring the write lock.
        if let Some(&idx) = guard.map.get(s) {
            return Name::from_raw(idx);
        }

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let idx = u32::try_from(guard.strings.len())
            .unwrap_or_else(|_| panic!("interner exceeded {} strings", u32::MAX));
        guard.strings.push(leaked);
        guard.map.insert(leaked, idx);
        Name::from_raw(idx)
    }

    /// Look up the string for a `Name`.
    ///
    /// Interned strings are leaked, so the reference is `'static`.
    pub fn lookup(&self, name: Name) -> &'static str {
        let guard = self.table.read();
        guard.strings[name.index()]
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// Check if only the empty string is interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    fn pre_intern_builtins(&self) {
        const BUILTINS: &[&str] = &[
            "i8", "i16", "i32", "i64", "isize", "u8", "u16", "u32", "u64", "usize", "f32", "f64",
            "bool", "char", "void",
        ];
        for name in BUILTINS {
            self.intern(name);
        }
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_lookup() {
        let interner = StringInterner::new();
        let a = interner.intern("Vec2");
        let b = interner.intern("Mat4");
        let a2 = interner.intern("Vec2");

        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(interner.lookup(a), "Vec2");
        assert_eq!(interner.lookup(b), "Mat4");
    }

    #[test]
    fn test_empty_string() {
        let interner = StringInterner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert_eq!(interner.lookup(Name::EMPTY), "");
    }

    #[test]
    fn test_builtins_pre_interned() {
        let interner = StringInterner::new();
        let before = interner.len();
        interner.intern("i32");
        interner.intern("void");
        assert_eq!(interner.len(), before);
    }
}
