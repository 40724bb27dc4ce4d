//! Output module.
//!
//! Collects the results of one compilation: materialized type handles in
//! dependency order, function prototypes, and the lowered bodies attached to
//! them. Handed to an external object writer; its on-disk format is not this
//! crate's concern.

use fer_types::{BackendType, BackendValue, TypeId};
use rustc_hash::FxHashMap;

use crate::context::FunctionIr;

/// One function in the output module.
#[derive(Clone, Debug)]
pub struct EmittedFunction {
    pub symbol: String,
    pub signature: TypeId,
    pub proto: BackendValue,
    /// `None` for prototypes without an emitted body (extern or generic).
    pub body: Option<FunctionIr>,
}

/// A populated backend module.
pub struct Module {
    pub name: String,
    types: Vec<BackendType>,
    functions: Vec<EmittedFunction>,
    by_symbol: FxHashMap<String, usize>,
    next_value: u32,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            types: Vec::new(),
            functions: Vec::new(),
            by_symbol: FxHashMap::default(),
            next_value: 0,
        }
    }

    /// Record a materialized type handle, in materialization order.
    pub fn add_type(&mut self, handle: BackendType) {
        self.types.push(handle);
    }

    pub fn types(&self) -> &[BackendType] {
        &self.types
    }

    /// Declare a function prototype. Idempotent per symbol: redeclaring
    /// returns the existing handle.
    pub fn declare_function(&mut self, symbol: &str, signature: TypeId) -> BackendValue {
        if let Some(&slot) = self.by_symbol.get(symbol) {
            return self.functions[slot].proto;
        }
        let proto = BackendValue(self.next_value);
        self.next_value += 1;
        self.by_symbol.insert(symbol.to_owned(), self.functions.len());
        self.functions.push(EmittedFunction {
            symbol: symbol.to_owned(),
            signature,
            proto,
            body: None,
        });
        proto
    }

    /// Attach a lowered body to a declared prototype.
    ///
    /// Returns `false` if the symbol is unknown or already has a body; the
    /// first body wins.
    pub fn attach_body(&mut self, symbol: &str, ir: FunctionIr) -> bool {
        let Some(&slot) = self.by_symbol.get(symbol) else {
            return false;
        };
        let func = &mut self.functions[slot];
        if func.body.is_some() {
            return false;
        }
        func.body = Some(ir);
        true
    }

    pub fn function(&self, symbol: &str) -> Option<&EmittedFunction> {
        self.by_symbol.get(symbol).map(|&slot| &self.functions[slot])
    }

    pub fn functions(&self) -> &[EmittedFunction] {
        &self.functions
    }

    /// Disassembly-style rendering for tests and debugging.
    pub fn display(&self) -> String {
        let mut out = format!("module {} ({} types)\n", self.name, self.types.len());
        for func in &self.functions {
            match &func.body {
                Some(ir) => {
                    out.push_str(&ir.display());
                    out.push('\n');
                }
                None => out.push_str(&format!("declare {}\n", func.symbol)),
            }
        }
        out
    }
}
