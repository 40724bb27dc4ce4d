//! Low-level instruction representation.
//!
//! Instructions live in a per-function arena; a [`ValueId`] is both the
//! instruction's identity and the SSA value it produces. Operands are always
//! `ValueId`s, so constants are instructions too.

use fer_types::TypeId;

/// An instruction in a function's arena, and the value it yields.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct ValueId(pub u32);

impl ValueId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A basic block within one function.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct BlockId(pub u32);

impl BlockId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Integer comparison predicates.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

/// Ordered floating-point comparison predicates.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum RealPredicate {
    Oeq,
    One,
    Olt,
    Ole,
    Ogt,
    Oge,
}

/// Instruction kinds.
///
/// Arithmetic comes in signed/unsigned/float variants where the underlying
/// machine distinguishes them; bitwise operations do not.
#[derive(Clone, PartialEq, Debug)]
pub enum Inst {
    // Constants
    ConstInt { ty: TypeId, value: i128 },
    ConstReal { ty: TypeId, value: f64 },
    ConstBool { value: bool },
    ConstNull { ty: TypeId },
    /// The n-th formal parameter of the enclosing function.
    Param { index: u32, ty: TypeId },

    // Integer arithmetic
    Add { lhs: ValueId, rhs: ValueId },
    Sub { lhs: ValueId, rhs: ValueId },
    Mul { lhs: ValueId, rhs: ValueId },
    SDiv { lhs: ValueId, rhs: ValueId },
    UDiv { lhs: ValueId, rhs: ValueId },
    SRem { lhs: ValueId, rhs: ValueId },
    URem { lhs: ValueId, rhs: ValueId },

    // Float arithmetic
    FAdd { lhs: ValueId, rhs: ValueId },
    FSub { lhs: ValueId, rhs: ValueId },
    FMul { lhs: ValueId, rhs: ValueId },
    FDiv { lhs: ValueId, rhs: ValueId },
    FRem { lhs: ValueId, rhs: ValueId },

    // Bitwise (signedness-agnostic)
    And { lhs: ValueId, rhs: ValueId },
    Or { lhs: ValueId, rhs: ValueId },
    Xor { lhs: ValueId, rhs: ValueId },
    Shl { lhs: ValueId, rhs: ValueId },
    LShr { lhs: ValueId, rhs: ValueId },
    AShr { lhs: ValueId, rhs: ValueId },

    // Unary
    Neg { value: ValueId },
    FNeg { value: ValueId },
    Not { value: ValueId },

    // Comparison
    ICmp { pred: IntPredicate, lhs: ValueId, rhs: ValueId },
    FCmp { pred: RealPredicate, lhs: ValueId, rhs: ValueId },

    // Memory
    Alloca { ty: TypeId },
    Store { ptr: ValueId, value: ValueId },
    Load { ptr: ValueId },

    // Conversion
    Cast { value: ValueId, to: TypeId },

    // Control flow
    Br { dest: BlockId },
    CondBr { cond: ValueId, then_dest: BlockId, else_dest: BlockId },
    /// Merge values per predecessor block. Loops route mutable bindings
    /// through stack slots, so nothing lowers to a phi yet.
    Phi { incoming: Vec<(ValueId, BlockId)> },
    Ret { value: ValueId },
    RetVoid,
}

impl Inst {
    /// Whether this instruction ends its block.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Inst::Br { .. } | Inst::CondBr { .. } | Inst::Ret { .. } | Inst::RetVoid
        )
    }

    /// Short mnemonic for disassembly-style printing.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Inst::ConstInt { .. } => "const.int",
            Inst::ConstReal { .. } => "const.real",
            Inst::ConstBool { .. } => "const.bool",
            Inst::ConstNull { .. } => "const.null",
            Inst::Param { .. } => "param",
            Inst::Add { .. } => "add",
            Inst::Sub { .. } => "sub",
            Inst::Mul { .. } => "mul",
            Inst::SDiv { .. } => "sdiv",
            Inst::UDiv { .. } => "udiv",
            Inst::SRem { .. } => "srem",
            Inst::URem { .. } => "urem",
            Inst::FAdd { .. } => "fadd",
            Inst::FSub { .. } => "fsub",
            Inst::FMul { .. } => "fmul",
            Inst::FDiv { .. } => "fdiv",
            Inst::FRem { .. } => "frem",
            Inst::And { .. } => "and",
            Inst::Or { .. } => "or",
            Inst::Xor { .. } => "xor",
            Inst::Shl { .. } => "shl",
            Inst::LShr { .. } => "lshr",
            Inst::AShr { .. } => "ashr",
            Inst::Neg { .. } => "neg",
            Inst::FNeg { .. } => "fneg",
            Inst::Not { .. } => "not",
            Inst::ICmp { .. } => "icmp",
            Inst::FCmp { .. } => "fcmp",
            Inst::Alloca { .. } => "alloca",
            Inst::Store { .. } => "store",
            Inst::Load { .. } => "load",
            Inst::Cast { .. } => "cast",
            Inst::Br { .. } => "br",
            Inst::CondBr { .. } => "condbr",
            Inst::Phi { .. } => "phi",
            Inst::Ret { .. } => "ret",
            Inst::RetVoid => "ret.void",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminators() {
        assert!(Inst::RetVoid.is_terminator());
        assert!(Inst::Br { dest: BlockId(0) }.is_terminator());
        assert!(!Inst::Load { ptr: ValueId(0) }.is_terminator());
    }
}
