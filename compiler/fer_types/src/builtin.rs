//! Builtin types.

use std::fmt;

/// Builtin scalar types.
///
/// Pre-interned at fixed [`TypeId`](crate::TypeId) indices; never
/// re-interned per compilation unit. `isize`/`usize` widths are resolved by
/// the target machine at materialization time.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Builtin {
    I8,
    I16,
    I32,
    I64,
    ISize,
    U8,
    U16,
    U32,
    U64,
    USize,
    F32,
    F64,
    Bool,
    Char,
    Void,
}

impl Builtin {
    /// All builtins, in pool pre-interning order.
    pub const ALL: [Builtin; 15] = [
        Builtin::I8,
        Builtin::I16,
        Builtin::I32,
        Builtin::I64,
        Builtin::ISize,
        Builtin::U8,
        Builtin::U16,
        Builtin::U32,
        Builtin::U64,
        Builtin::USize,
        Builtin::F32,
        Builtin::F64,
        Builtin::Bool,
        Builtin::Char,
        Builtin::Void,
    ];

    /// Source-level name.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::I8 => "i8",
            Builtin::I16 => "i16",
            Builtin::I32 => "i32",
            Builtin::I64 => "i64",
            Builtin::ISize => "isize",
            Builtin::U8 => "u8",
            Builtin::U16 => "u16",
            Builtin::U32 => "u32",
            Builtin::U64 => "u64",
            Builtin::USize => "usize",
            Builtin::F32 => "f32",
            Builtin::F64 => "f64",
            Builtin::Bool => "bool",
            Builtin::Char => "char",
            Builtin::Void => "void",
        }
    }

    /// Look up a builtin by source name.
    pub fn from_name(name: &str) -> Option<Builtin> {
        Builtin::ALL.iter().copied().find(|b| b.name() == name)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Builtin::F32 | Builtin::F64)
    }

    pub fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            Builtin::U8 | Builtin::U16 | Builtin::U32 | Builtin::U64 | Builtin::USize
        )
    }

    pub fn is_signed_int(self) -> bool {
        matches!(
            self,
            Builtin::I8 | Builtin::I16 | Builtin::I32 | Builtin::I64 | Builtin::ISize
        )
    }

    pub fn is_int(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    pub fn is_void(self) -> bool {
        matches!(self, Builtin::Void)
    }

    /// Bit width where target-independent; `None` for isize/usize and void.
    pub fn bit_width(self) -> Option<u32> {
        match self {
            Builtin::I8 | Builtin::U8 => Some(8),
            Builtin::I16 | Builtin::U16 => Some(16),
            Builtin::I32 | Builtin::U32 | Builtin::F32 | Builtin::Char => Some(32),
            Builtin::I64 | Builtin::U64 | Builtin::F64 => Some(64),
            Builtin::Bool => Some(1),
            Builtin::ISize | Builtin::USize | Builtin::Void => None,
        }
    }

    /// One-letter mangle code.
    pub fn mangle_code(self) -> char {
        match self {
            Builtin::I8 => 'b',
            Builtin::I16 => 's',
            Builtin::I32 => 'i',
            Builtin::I64 => 'l',
            Builtin::ISize => 'z',
            Builtin::U8 => 'B',
            Builtin::U16 => 'S',
            Builtin::U32 => 'I',
            Builtin::U64 => 'L',
            Builtin::USize => 'Z',
            Builtin::F32 => 'f',
            Builtin::F64 => 'd',
            Builtin::Bool => 'o',
            Builtin::Char => 'c',
            Builtin::Void => 'v',
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::from_name("Vec2"), None);
    }

    #[test]
    fn test_kind_predicates() {
        assert!(Builtin::F32.is_float());
        assert!(Builtin::U64.is_unsigned_int());
        assert!(Builtin::ISize.is_signed_int());
        assert!(!Builtin::Bool.is_int());
        assert!(Builtin::Void.is_void());
    }

    #[test]
    fn test_target_dependent_widths() {
        assert_eq!(Builtin::ISize.bit_width(), None);
        assert_eq!(Builtin::USize.bit_width(), None);
        assert_eq!(Builtin::I32.bit_width(), Some(32));
    }
}
