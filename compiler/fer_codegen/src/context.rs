//! Per-function IR context and block builders.
//!
//! One context is created per lowered function and owns every basic block
//! and instruction produced for it. Named blocks are memoized: requesting
//! the same name twice yields the same block. The context keeps a stack of
//! block builders; the top of the stack is where instructions land.

use rustc_hash::FxHashMap;

use crate::inst::{BlockId, Inst, ValueId};

/// A basic block: a label and the ordered instructions inside it.
#[derive(Clone, Debug)]
pub struct Block {
    pub label: String,
    pub insts: Vec<ValueId>,
}

/// The finished IR of one function body.
#[derive(Clone, Debug)]
pub struct FunctionIr {
    /// Linker-visible symbol.
    pub symbol: String,
    blocks: Vec<Block>,
    insts: Vec<Inst>,
}

impl FunctionIr {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn inst(&self, id: ValueId) -> &Inst {
        &self.insts[id.index()]
    }

    pub fn block_by_label(&self, label: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.label == label)
    }

    /// The last instruction of a block, if any.
    pub fn terminator_of(&self, block: &Block) -> Option<&Inst> {
        block.insts.last().map(|&id| self.inst(id))
    }

    /// Disassembly-style rendering for tests and debugging.
    pub fn display(&self) -> String {
        let mut out = format!("fn {} {{\n", self.symbol);
        for block in &self.blocks {
            out.push_str(&format!("{}:\n", block.label));
            for &id in &block.insts {
                out.push_str(&format!("  %{} = {}\n", id.0, self.render(self.inst(id))));
            }
        }
        out.push('}');
        out
    }

    fn label_of(&self, block: BlockId) -> &str {
        &self.blocks[block.index()].label
    }

    fn render(&self, inst: &Inst) -> String {
        let m = inst.mnemonic();
        match inst {
            Inst::ConstInt { value, .. } => format!("{m} {value}"),
            Inst::ConstReal { value, .. } => format!("{m} {value}"),
            Inst::ConstBool { value } => format!("{m} {value}"),
            Inst::ConstNull { .. } | Inst::Alloca { .. } | Inst::RetVoid => m.to_owned(),
            Inst::Param { index, .. } => format!("{m} {index}"),
            Inst::Add { lhs, rhs }
            | Inst::Sub { lhs, rhs }
            | Inst::Mul { lhs, rhs }
            | Inst::SDiv { lhs, rhs }
            | Inst::UDiv { lhs, rhs }
            | Inst::SRem { lhs, rhs }
            | Inst::URem { lhs, rhs }
            | Inst::FAdd { lhs, rhs }
            | Inst::FSub { lhs, rhs }
            | Inst::FMul { lhs, rhs }
            | Inst::FDiv { lhs, rhs }
            | Inst::FRem { lhs, rhs }
            | Inst::And { lhs, rhs }
            | Inst::Or { lhs, rhs }
            | Inst::Xor { lhs, rhs }
            | Inst::Shl { lhs, rhs }
            | Inst::LShr { lhs, rhs }
            | Inst::AShr { lhs, rhs } => format!("{m} %{}, %{}", lhs.0, rhs.0),
            Inst::ICmp { pred, lhs, rhs } => format!("{m} {pred:?} %{}, %{}", lhs.0, rhs.0),
            Inst::FCmp { pred, lhs, rhs } => format!("{m} {pred:?} %{}, %{}", lhs.0, rhs.0),
            Inst::Neg { value }
            | Inst::FNeg { value }
            | Inst::Not { value }
            | Inst::Cast { value, .. }
            | Inst::Ret { value } => format!("{m} %{}", value.0),
            Inst::Store { ptr, value } => format!("{m} %{}, %{}", value.0, ptr.0),
            Inst::Load { ptr } => format!("{m} %{}", ptr.0),
            Inst::Br { dest } => format!("{m} {}", self.label_of(*dest)),
            Inst::CondBr { cond, then_dest, else_dest } => format!(
                "{m} %{}, {}, {}",
                cond.0,
                self.label_of(*then_dest),
                self.label_of(*else_dest)
            ),
            Inst::Phi { incoming } => {
                let arms: Vec<String> = incoming
                    .iter()
                    .map(|(value, block)| format!("[%{}, {}]", value.0, self.label_of(*block)))
                    .collect();
                format!("{m} {}", arms.join(", "))
            }
        }
    }
}

/// Builder state for one function.
///
/// Scoped resource: [`dispose`](FunctionIrContext::dispose) releases the
/// per-block builder state and is idempotent; [`finish`](FunctionIrContext::finish)
/// disposes and yields the built [`FunctionIr`].
pub struct FunctionIrContext {
    ir: FunctionIr,
    by_name: FxHashMap<String, BlockId>,
    stack: Vec<BlockId>,
    label_counter: u32,
    disposed: bool,
}

impl FunctionIrContext {
    pub const ENTRY: &'static str = "entry";

    /// Create a context with an entry block as the current builder.
    pub fn new(symbol: impl Into<String>) -> Self {
        let mut ctx = FunctionIrContext {
            ir: FunctionIr {
                symbol: symbol.into(),
                blocks: Vec::new(),
                insts: Vec::new(),
            },
            by_name: FxHashMap::default(),
            stack: Vec::new(),
            label_counter: 0,
            disposed: false,
        };
        let entry = ctx.block(Self::ENTRY);
        ctx.stack.push(entry);
        ctx
    }

    /// Get or create the block with this name.
    pub fn block(&mut self, name: &str) -> BlockId {
        debug_assert!(!self.disposed, "context used after dispose");
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = BlockId(u32::try_from(self.ir.blocks.len()).unwrap_or_else(|_| unreachable!()));
        self.ir.blocks.push(Block {
            label: name.to_owned(),
            insts: Vec::new(),
        });
        self.by_name.insert(name.to_owned(), id);
        id
    }

    /// The block currently receiving instructions.
    pub fn current(&self) -> BlockId {
        *self.stack.last().unwrap_or(&BlockId(0))
    }

    /// Make `block` the current builder, keeping the previous one below it.
    pub fn push_block(&mut self, block: BlockId) {
        self.stack.push(block);
    }

    /// Return to the previous builder.
    pub fn pop_block(&mut self) {
        self.stack.pop();
    }

    /// Replace the current builder in place.
    pub fn set_current(&mut self, block: BlockId) {
        if let Some(top) = self.stack.last_mut() {
            *top = block;
        } else {
            self.stack.push(block);
        }
    }

    /// Append an instruction to the current block.
    pub fn append(&mut self, inst: Inst) -> ValueId {
        self.append_to(self.current(), inst)
    }

    /// Append an instruction to a specific block.
    pub fn append_to(&mut self, block: BlockId, inst: Inst) -> ValueId {
        debug_assert!(!self.disposed, "context used after dispose");
        let id = ValueId(u32::try_from(self.ir.insts.len()).unwrap_or_else(|_| unreachable!()));
        self.ir.insts.push(inst);
        self.ir.blocks[block.index()].insts.push(id);
        id
    }

    /// Whether a block already ends in a terminator.
    pub fn is_terminated(&self, block: BlockId) -> bool {
        self.ir.blocks[block.index()]
            .insts
            .last()
            .is_some_and(|&id| self.ir.insts[id.index()].is_terminator())
    }

    /// A fresh deterministic label: `loop0`, `loop1`, ...
    pub fn next_label(&mut self, prefix: &str) -> String {
        let label = format!("{prefix}{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    /// Release builder state. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.stack.clear();
        self.by_name.clear();
        self.disposed = true;
    }

    /// Dispose and yield the built function IR.
    pub fn finish(mut self) -> FunctionIr {
        self.dispose();
        self.ir
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_named_blocks_are_memoized() {
        let mut ctx = FunctionIrContext::new("f");
        let a = ctx.block("loop0");
        let b = ctx.block("loop0");
        assert_eq!(a, b);
        let c = ctx.block("loop0.end");
        assert_ne!(a, c);
    }

    #[test]
    fn test_builder_stack() {
        let mut ctx = FunctionIrContext::new("f");
        let entry = ctx.current();
        let body = ctx.block("body");

        ctx.push_block(body);
        ctx.append(Inst::RetVoid);
        ctx.pop_block();

        assert_eq!(ctx.current(), entry);
        assert!(ctx.is_terminated(body));
        assert!(!ctx.is_terminated(entry));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut ctx = FunctionIrContext::new("f");
        ctx.append(Inst::RetVoid);
        ctx.dispose();
        ctx.dispose();
        let ir = ctx.finish();
        assert_eq!(ir.blocks().len(), 1);
    }

    #[test]
    fn test_display_renders_mnemonics_and_operands() {
        use fer_types::TypeId;

        let mut ctx = FunctionIrContext::new("sum");
        let a = ctx.append(Inst::ConstInt { ty: TypeId::I32, value: 2 });
        let b = ctx.append(Inst::ConstInt { ty: TypeId::I32, value: 40 });
        let total = ctx.append(Inst::Add { lhs: a, rhs: b });
        ctx.append(Inst::Ret { value: total });

        let text = ctx.finish().display();
        assert!(text.contains("%0 = const.int 2"));
        assert!(text.contains("%2 = add %0, %1"));
        assert!(text.contains("%3 = ret %2"));
    }

    #[test]
    fn test_labels_are_deterministic() {
        let mut ctx = FunctionIrContext::new("f");
        assert_eq!(ctx.next_label("loop"), "loop0");
        assert_eq!(ctx.next_label("loop"), "loop1");
    }
}
