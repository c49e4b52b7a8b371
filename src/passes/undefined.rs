//! Unsound removal of calls to undefined functions

use super::resolve::resolve_call;
use super::ModulePass;
use crate::config::{AllowList, PrepareConfig};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::ir::{Constant, Instruction, Module, Reg, Value};
use crate::{Error, Result};

/// A call scheduled for deletion
#[derive(Debug)]
struct Removal {
    block: usize,
    index: usize,
    callee: String,
    /// Result register and the zero that replaces its uses
    replacement: Option<(Reg, Constant)>,
}

/// Deletes calls to declared, non-allow-listed functions
///
/// The result of a deleted call is replaced by the zero value of its type,
/// never by an undefined value: every use of one removed result must see the
/// same concrete value.
#[derive(Debug, Clone)]
pub struct UndefinedCallEliminator {
    allow: AllowList,
}

impl UndefinedCallEliminator {
    /// Creates the pass for the configured allow-list
    pub fn new(config: &PrepareConfig) -> Self {
        Self {
            allow: AllowList::from_config(config),
        }
    }

    /// Callee name is trusted to exist at verification time
    pub fn allows(&self, name: &str) -> bool {
        self.allow.allows(name)
    }

    /// Scans one function without touching it
    fn collect_removals(&self, module: &Module, name: &str) -> Result<Vec<Removal>> {
        let Some(function) = module.get_function(name) else {
            return Ok(Vec::new());
        };
        let mut removals = Vec::new();
        for (block, bb) in function.blocks().iter().enumerate() {
            for (index, inst) in bb.instructions.iter().enumerate() {
                let Instruction::Call(call) = inst else {
                    continue;
                };
                let Some(callee) = resolve_call(module, name, call)?.classifiable() else {
                    continue;
                };
                if self.allows(&callee.name) || !callee.is_declaration() {
                    continue;
                }
                let replacement = match call.result {
                    Some(reg) if !call.ret_ty.is_void() => {
                        let zero = Constant::null_value(&call.ret_ty).ok_or_else(|| {
                            Error::NoZeroValue {
                                symbol: callee.name.clone(),
                                ty: call.ret_ty.to_string(),
                            }
                        })?;
                        Some((reg, zero))
                    }
                    _ => None,
                };
                removals.push(Removal {
                    block,
                    index,
                    callee: callee.name.clone(),
                    replacement,
                });
            }
        }
        Ok(removals)
    }
}

impl ModulePass for UndefinedCallEliminator {
    fn name(&self) -> &'static str {
        "delete-undefined"
    }

    fn run(&self, module: &mut Module, diagnostics: &mut Vec<Diagnostic>) -> Result<bool> {
        // Scan every function before touching any: a missing zero value
        // aborts with the module unchanged, and erasing while scanning
        // would shift later indices.
        let mut planned = Vec::new();
        for name in module.functions.keys() {
            let removals = self.collect_removals(module, name)?;
            if !removals.is_empty() {
                planned.push((name.clone(), removals));
            }
        }

        let modified = !planned.is_empty();
        for (name, removals) in planned {
            let Some(function) = module.get_function_mut(&name) else {
                continue;
            };

            for removal in &removals {
                Diagnostic::at_call(DiagnosticKind::RemovedCall, &name, &removal.callee)
                    .emit(diagnostics);
                if let Some((reg, zero)) = &removal.replacement {
                    let uses = function.replace_all_uses(*reg, &Value::Const(zero.clone()));
                    tracing::debug!(
                        "replaced {} use(s) of {} in '{}' with {}",
                        uses,
                        reg,
                        name,
                        zero
                    );
                }
            }

            if let Some(blocks) = function.blocks.as_mut() {
                for removal in removals.iter().rev() {
                    blocks[removal.block].instructions.remove(removal.index);
                }
            }
        }

        Ok(modified)
    }
}
