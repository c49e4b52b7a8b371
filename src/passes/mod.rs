//! # Preparation Passes
//!
//! The three stages of the pipeline, in the order the driver runs them:
//!
//! | Stage | Pass | Mutates |
//! |-------|------|---------|
//! | `check-unsupported` | [`UnsupportedCallDetector`] | no |
//! | `delete-undefined` | [`UndefinedCallEliminator`] | call sites |
//! | `prepare` | [`SymbolicEntryPreparer`] | bodies, globals, entry table |
//!
//! All of them classify calls through [`resolve_call`]. Inline assembly,
//! indirect calls and intrinsics are never reported or rewritten.

pub mod entry;
pub mod resolve;
pub mod undefined;
pub mod unsupported;

pub use entry::{EntryPlan, SymbolicEntryPreparer};
pub use resolve::{resolve_call, resolve_callee, CallTarget};
pub use undefined::UndefinedCallEliminator;
pub use unsupported::{UnsupportedCall, UnsupportedCallDetector};

use crate::config::{PrepareConfig, Stage};
use crate::diagnostics::Diagnostic;
use crate::ir::Module;
use crate::Result;

/// A whole-module transformation or check
pub trait ModulePass {
    /// Stage name used in logs
    fn name(&self) -> &'static str;

    /// Runs the pass, appending diagnostics; returns whether the module changed
    fn run(&self, module: &mut Module, diagnostics: &mut Vec<Diagnostic>) -> Result<bool>;
}

/// Instantiates the pass implementing `stage`
pub fn pass_for(stage: Stage, config: &PrepareConfig) -> Box<dyn ModulePass> {
    match stage {
        Stage::CheckUnsupported => Box::new(UnsupportedCallDetector::new(config)),
        Stage::DeleteUndefined => Box::new(UndefinedCallEliminator::new(config)),
        Stage::Prepare => Box::new(SymbolicEntryPreparer::new(config)),
    }
}
