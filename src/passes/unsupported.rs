//! Detection of calls the verifier cannot model

use super::resolve::resolve_call;
use super::ModulePass;
use crate::config::{NameSet, PrepareConfig};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::ir::{Instruction, Module};
use crate::Result;

/// Location of a denylisted call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedCall {
    /// Function containing the call
    pub function: String,
    /// Label of the containing block
    pub block: String,
    /// Position within the block
    pub index: usize,
    /// Resolved callee name
    pub callee: String,
}

/// Read-only pass reporting calls to denylisted functions
#[derive(Debug, Clone)]
pub struct UnsupportedCallDetector {
    denylist: NameSet,
}

impl UnsupportedCallDetector {
    /// Creates a detector for the configured denylist
    pub fn new(config: &PrepareConfig) -> Self {
        Self {
            denylist: NameSet::new(&config.unsupported_calls),
        }
    }

    /// All denylisted call sites, in function then instruction order
    pub fn detect(&self, module: &Module) -> Result<Vec<UnsupportedCall>> {
        let mut found = Vec::new();
        for function in module.functions.values() {
            for block in function.blocks() {
                for (index, inst) in block.instructions.iter().enumerate() {
                    let Instruction::Call(call) = inst else {
                        continue;
                    };
                    let Some(callee) = resolve_call(module, &function.name, call)?.classifiable()
                    else {
                        continue;
                    };
                    if self.denylist.contains(&callee.name) {
                        found.push(UnsupportedCall {
                            function: function.name.clone(),
                            block: block.label.clone(),
                            index,
                            callee: callee.name.clone(),
                        });
                    }
                }
            }
        }
        Ok(found)
    }
}

impl ModulePass for UnsupportedCallDetector {
    fn name(&self) -> &'static str {
        "check-unsupported"
    }

    fn run(&self, module: &mut Module, diagnostics: &mut Vec<Diagnostic>) -> Result<bool> {
        for site in self.detect(module)? {
            Diagnostic::at_call(DiagnosticKind::UnsupportedCall, &site.function, &site.callee)
                .emit(diagnostics);
        }
        Ok(false)
    }
}
