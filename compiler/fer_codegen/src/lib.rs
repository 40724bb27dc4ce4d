//! IR lowering and module emission for the Ferrous compiler.
//!
//! Consumes the analysis state produced by `fer_sema` and turns function
//! bodies into block-structured low-level instructions, collected into an
//! output [`Module`]. Backend values and types are opaque ids; a native
//! code generator sits behind the [`TargetMachine`](fer_types::TargetMachine)
//! trait, with [`SimpleTarget`] as the in-memory reference implementation.

mod context;
mod emit;
mod inst;
mod lower;
mod module;
mod pipeline;
mod target;

pub use context::{Block, FunctionIr, FunctionIrContext};
pub use emit::Emitter;
pub use inst::{BlockId, Inst, IntPredicate, RealPredicate, ValueId};
pub use lower::lower_function;
pub use module::{EmittedFunction, Module};
pub use pipeline::{compile_unit, CompileResult};
pub use target::SimpleTarget;
