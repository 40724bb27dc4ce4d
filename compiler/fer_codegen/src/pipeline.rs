//! Compilation pipeline entry point.
//!
//! Runs the phases in order over one translation unit: collect, resolve and
//! order types, materialize them, then emit functions. Every invocation
//! starts from fresh state; nothing survives between calls except the
//! process-wide builtin table and string interner.

use fer_diagnostic::{Diagnostic, DiagnosticQueue};
use fer_ir::{Item, StringInterner};
use fer_sema::{collect, AnalysisState, Resolver};
use fer_types::TargetMachine;
use tracing::debug;

use crate::emit::Emitter;
use crate::module::Module;

/// Outcome of compiling one translation unit.
pub struct CompileResult {
    pub module: Module,
    /// All diagnostics, sorted by source position.
    pub diagnostics: Vec<Diagnostic>,
    /// False if any error diagnostic was reported.
    pub success: bool,
}

impl CompileResult {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }
}

/// Compile one translation unit into a backend module.
pub fn compile_unit(
    items: &[Item],
    interner: &StringInterner,
    target: &mut dyn TargetMachine,
    module_name: &str,
) -> CompileResult {
    let mut state = AnalysisState::new();
    let mut queue = DiagnosticQueue::new();
    let mut module = Module::new(module_name);

    debug!(module = module_name, items = items.len(), "compiling unit");
    collect(items, interner, &mut state, &mut queue);

    let type_handles = {
        let mut resolver = Resolver::new(interner, &mut state, &mut queue);
        resolver.sort_types();
        resolver.resolve_types();
        resolver.resolve_functions();
        resolver.materialize_types(target)
    };
    for handle in type_handles {
        module.add_type(handle);
    }

    Emitter::new(interner, &mut state, &mut queue).emit(&mut module, target);

    let success = !queue.has_errors();
    CompileResult {
        module,
        diagnostics: queue.flush(),
        success,
    }
}
