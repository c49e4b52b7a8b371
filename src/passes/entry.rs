//! # Symbolic Entry Preparation
//!
//! Final module-level normalization before the verifier harness loads the
//! module:
//! - oracle definitions lose their bodies and become uninterpreted sources
//! - uninitialized mutable globals get the zero value of their type
//! - an internal constant table of entry points, seeded with `main`, is
//!   published under a reserved name
//!
//! Preconditions (entry function present, no conflicting table, every
//! global zero-initializable) are checked before any sub-step mutates, so a
//! fatal failure leaves the module untouched.

use super::ModulePass;
use crate::config::{EntryTablePolicy, PrepareConfig};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::ir::{Constant, GlobalVariable, IrType, Linkage, Module};
use crate::oracle;
use crate::{Error, Result};

/// What the entry-table sub-step will do, decided up front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPlan {
    /// Publish a new table
    Create,
    /// A table from an earlier run is present and stays as it is
    Keep,
}

/// Module pass stripping oracles, zero-initializing globals and publishing
/// the entry table
#[derive(Debug, Clone)]
pub struct SymbolicEntryPreparer {
    strip_bodies: Vec<String>,
    entry_function: String,
    entry_table: String,
    policy: EntryTablePolicy,
}

impl SymbolicEntryPreparer {
    /// Creates the pass from the configuration
    pub fn new(config: &PrepareConfig) -> Self {
        Self {
            strip_bodies: config.strip_bodies.clone(),
            entry_function: config.entry_function.clone(),
            entry_table: config.entry_table.clone(),
            policy: config.entry_table_policy,
        }
    }

    /// Validates everything the sub-steps need without mutating
    pub fn check_preconditions(&self, module: &Module) -> Result<EntryPlan> {
        if module.get_function(&self.entry_function).is_none() {
            return Err(Error::MissingEntryPoint {
                name: self.entry_function.clone(),
            });
        }

        for global in module.globals.values() {
            if needs_initializer(global) && Constant::null_value(&global.ty).is_none() {
                return Err(Error::NoZeroValue {
                    symbol: global.name.clone(),
                    ty: global.ty.to_string(),
                });
            }
        }

        if module.get_function(&self.entry_table).is_some() {
            return Err(Error::DuplicateSymbol {
                name: self.entry_table.clone(),
            });
        }
        match (module.get_global(&self.entry_table), self.policy) {
            (None, _) => Ok(EntryPlan::Create),
            (Some(_), EntryTablePolicy::Keep) => Ok(EntryPlan::Keep),
            (Some(_), EntryTablePolicy::Reject) => Err(Error::EntryTableExists {
                name: self.entry_table.clone(),
            }),
        }
    }

    /// Deletes the bodies of configured oracle definitions
    pub fn strip_oracle_bodies(
        &self,
        module: &mut Module,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        let mut stripped = false;
        for name in &self.strip_bodies {
            let Some(function) = module.get_function_mut(name) else {
                continue;
            };
            if function.delete_body() {
                Diagnostic::on_symbol(DiagnosticKind::StrippedBody, name).emit(diagnostics);
                match (oracle::canonical(name), oracle::nondet_type(name)) {
                    (Some(canon), Some(ty)) => tracing::debug!(
                        "'{}' ({}) now yields an unconstrained {}",
                        name,
                        canon,
                        ty.ir_type()
                    ),
                    _ if oracle::is_primitive(name) => {
                        tracing::debug!("'{}' left to the verifier runtime", name)
                    }
                    _ => {}
                }
                stripped = true;
            }
        }
        stripped
    }

    /// Gives every mutable, uninitialized global its zero value
    pub fn zero_initialize_globals(
        &self,
        module: &mut Module,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<bool> {
        let mut initialized = false;
        for global in module.globals.values_mut() {
            if !needs_initializer(global) {
                continue;
            }
            let zero = Constant::null_value(&global.ty).ok_or_else(|| Error::NoZeroValue {
                symbol: global.name.clone(),
                ty: global.ty.to_string(),
            })?;
            global.initializer = Some(zero);
            Diagnostic::on_symbol(DiagnosticKind::InitializedGlobal, &global.name)
                .emit(diagnostics);
            initialized = true;
        }
        Ok(initialized)
    }

    /// The table global seeded with the entry function
    pub fn entry_table_global(&self) -> GlobalVariable {
        let slot = IrType::generic_ptr();
        GlobalVariable {
            name: self.entry_table.clone(),
            ty: slot.clone().array_of(1),
            is_constant: true,
            linkage: Linkage::Internal,
            initializer: Some(Constant::Array {
                elem: slot.clone(),
                elems: vec![Constant::Bitcast {
                    value: Box::new(Constant::FunctionAddr(self.entry_function.clone())),
                    to: slot,
                }],
            }),
        }
    }

    fn publish_entry_table(
        &self,
        module: &mut Module,
        plan: EntryPlan,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<()> {
        match plan {
            EntryPlan::Create => {
                module.add_global(self.entry_table_global())?;
                Diagnostic::on_symbol(DiagnosticKind::EntryTableCreated, &self.entry_table)
                    .emit(diagnostics);
            }
            EntryPlan::Keep => {
                Diagnostic::on_symbol(DiagnosticKind::EntryTableKept, &self.entry_table)
                    .emit(diagnostics);
            }
        }
        Ok(())
    }
}

fn needs_initializer(global: &GlobalVariable) -> bool {
    !global.is_constant && global.initializer.is_none()
}

impl ModulePass for SymbolicEntryPreparer {
    fn name(&self) -> &'static str {
        "prepare"
    }

    fn run(&self, module: &mut Module, diagnostics: &mut Vec<Diagnostic>) -> Result<bool> {
        let plan = self.check_preconditions(module)?;
        self.strip_oracle_bodies(module, diagnostics);
        self.zero_initialize_globals(module, diagnostics)?;
        self.publish_entry_table(module, plan, diagnostics)?;
        Ok(true)
    }
}
