use std::fmt;

/// Error codes for all compiler diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E3xxx: declaration collection and type resolution
/// - E4xxx: lowering
/// - E9xxx: internal compiler errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Collection/resolution errors (E3xxx)
    /// Type already defined in an enclosing scope
    E3000,
    /// Unresolved type reference in a field or alias backing
    E3001,
    /// Cyclic by-value type definition
    E3002,
    /// Function with identical signature already defined
    E3003,

    // Lowering errors (E4xxx)
    /// Missing return in a non-void function
    E4000,
    /// Invalid assignment target
    E4001,
    /// Assignment to an immutable binding
    E4002,
    /// Unsupported operator for operand type
    E4003,
    /// Unknown binding referenced in a function body
    E4004,

    // Internal errors (E9xxx)
    /// Internal compiler error
    E9000,
    /// Too many errors
    E9001,
}

impl ErrorCode {
    /// Get the numeric code as a string (e.g., "E3000").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E3000 => "E3000",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E4000 => "E4000",
            ErrorCode::E4001 => "E4001",
            ErrorCode::E4002 => "E4002",
            ErrorCode::E4003 => "E4003",
            ErrorCode::E4004 => "E4004",
            ErrorCode::E9000 => "E9000",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// Check if this is a resolution-phase error (E3xxx range).
    pub fn is_resolution_error(&self) -> bool {
        self.as_str().starts_with("E3")
    }

    /// Check if this is a lowering-phase error (E4xxx range).
    pub fn is_lowering_error(&self) -> bool {
        self.as_str().starts_with("E4")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
