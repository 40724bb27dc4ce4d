//! Two-phase function emission.
//!
//! Phase one declares a prototype for every collected function; phase two
//! lowers and attaches bodies, but only for monomorphic functions — generic
//! templates wait for a monomorphization pass that is out of scope here.
//! Both phases are memoized, so emitting twice is a no-op.

use fer_diagnostic::DiagnosticQueue;
use fer_ir::StringInterner;
use fer_sema::AnalysisState;
use fer_types::{BackendValue, FuncDecl, FuncId, TargetMachine};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::lower::lower_function;
use crate::module::Module;

pub struct Emitter<'a> {
    interner: &'a StringInterner,
    state: &'a mut AnalysisState,
    queue: &'a mut DiagnosticQueue,
    prototypes: FxHashMap<FuncId, BackendValue>,
    bodies: FxHashSet<FuncId>,
}

impl<'a> Emitter<'a> {
    pub fn new(
        interner: &'a StringInterner,
        state: &'a mut AnalysisState,
        queue: &'a mut DiagnosticQueue,
    ) -> Self {
        Emitter {
            interner,
            state,
            queue,
            prototypes: FxHashMap::default(),
            bodies: FxHashSet::default(),
        }
    }

    /// Emit all collected functions into the module.
    pub fn emit(&mut self, module: &mut Module, target: &mut dyn TargetMachine) {
        let decls: Vec<(FuncId, FuncDecl)> = self
            .state
            .functions
            .iter()
            .map(|(id, decl)| (id, decl.clone()))
            .collect();

        for (id, decl) in &decls {
            self.prototype(module, target, *id, decl);
        }
        for (id, decl) in &decls {
            self.body(module, *id, decl);
        }
    }

    /// Declare one function's backend signature. Memoized per function.
    pub fn prototype(
        &mut self,
        module: &mut Module,
        target: &mut dyn TargetMachine,
        id: FuncId,
        decl: &FuncDecl,
    ) -> BackendValue {
        if let Some(&proto) = self.prototypes.get(&id) {
            return proto;
        }
        let symbol = self.symbol_for(decl);
        debug!(symbol, "declaring function prototype");
        if self.state.pool.is_complete(decl.signature) {
            // Signature types referencing generics stay unmaterialized.
            let _ = target.materialize_type(&self.state.pool, decl.signature);
        }
        let proto = module.declare_function(&symbol, decl.signature);
        self.prototypes.insert(id, proto);
        proto
    }

    /// Lower and attach one function's body, if it has one and is
    /// monomorphic. Memoized per function.
    fn body(&mut self, module: &mut Module, id: FuncId, decl: &FuncDecl) {
        if !decl.is_monomorphic() || decl.body.is_none() {
            return;
        }
        if !self.bodies.insert(id) {
            return;
        }
        let symbol = self.symbol_for(decl);
        let ir = lower_function(decl, &symbol, self.interner, self.state, self.queue);
        module.attach_body(&symbol, ir);
    }

    /// The linker symbol for a declaration. Generic templates carry
    /// unresolved parameter types that cannot be mangled; they keep their
    /// display name since no object code is emitted for them.
    fn symbol_for(&self, decl: &FuncDecl) -> String {
        decl.mangled_name(&self.state.pool, self.interner)
            .unwrap_or_else(|_| {
                format!("_F{}", decl.name.display(self.interner).replace('.', "_"))
            })
    }
}
