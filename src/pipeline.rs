//! # Preparation Pipeline
//!
//! ```text
//! Module → verify → check-unsupported → delete-undefined → prepare → verify
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use symprep::{Module, PrepareConfig, Preparer};
//!
//! let mut module = Module::from_json(&std::fs::read_to_string("prog.json")?)?;
//! let report = Preparer::new(PrepareConfig::default()).run(&mut module)?;
//! for diagnostic in &report.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! ```

use crate::config::{PrepareConfig, Stage};
use crate::diagnostics::PrepareReport;
use crate::ir::Module;
use crate::passes::{pass_for, SymbolicEntryPreparer};
use crate::Result;

/// Drives the configured stages over one module
#[derive(Debug, Clone, Default)]
pub struct Preparer {
    config: PrepareConfig,
}

impl Preparer {
    /// Create a preparer with options
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    /// Options in use
    pub fn config(&self) -> &PrepareConfig {
        &self.config
    }

    /// Runs every configured stage in order
    ///
    /// Fatal preconditions are checked before the first stage mutates:
    /// a malformed input or a missing entry function leaves the module
    /// exactly as it was passed in.
    pub fn run(&self, module: &mut Module) -> Result<PrepareReport> {
        self.config.validate()?;

        // Phase 1: Preconditions
        if self.config.verify_input {
            module.verify()?;
        }
        if self.config.runs(Stage::Prepare) {
            SymbolicEntryPreparer::new(&self.config).check_preconditions(module)?;
        }

        // Phase 2: Stages
        let mut report = PrepareReport::default();
        for stage in &self.config.stages {
            let pass = pass_for(*stage, &self.config);
            let before = report.diagnostics.len();
            let changed = pass.run(module, &mut report.diagnostics)?;
            tracing::debug!(
                "stage {} finished: {} diagnostic(s), modified={}",
                pass.name(),
                report.diagnostics.len() - before,
                changed
            );
            report.modified |= changed;
        }

        // Phase 3: Output check
        if self.config.verify_output {
            module.verify()?;
        }

        Ok(report)
    }
}
