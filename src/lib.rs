//! # symprep - IR preparation for symbolic-execution verifiers
//!
//! Takes a whole-program IR module and makes it consumable by a
//! symbolic-execution verifier harness:
//!
//! 1. **check-unsupported** reports calls to functions the verifier cannot
//!    model (thread creation by default).
//! 2. **delete-undefined** removes calls to bodiless functions that are not
//!    verifier primitives or well-understood library calls, replacing their
//!    results with typed zeros. This is deliberately unsound.
//! 3. **prepare** strips the bodies of oracle generators, zero-initializes
//!    mutable globals without an initializer and publishes a constant table
//!    of entry points seeded with `main`.
//!
//! ## Quick Start
//!
//! ```rust
//! use symprep::ir::{BasicBlock, CallInst, Function, Instruction, IrType};
//! use symprep::{DiagnosticKind, Module, Preparer};
//!
//! # fn main() -> symprep::Result<()> {
//! let mut module = Module::new("demo")
//!     .with_function(Function::declare("log_event", IrType::Void, vec![]))?
//!     .with_function(Function::define(
//!         "main",
//!         IrType::Void,
//!         vec![],
//!         vec![BasicBlock::new("entry")
//!             .with(Instruction::Call(CallInst::direct(None, IrType::Void, "log_event", vec![])))
//!             .with(Instruction::Ret(None))],
//!     ))?;
//!
//! let report = Preparer::default().run(&mut module)?;
//!
//! assert_eq!(report.symbols(DiagnosticKind::RemovedCall), vec!["log_event"]);
//! assert!(module.get_global("__ai_init_functions").is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Informational and unsound-but-intentional actions are
//! [`Diagnostic`]s; a missing entry point or a malformed module is an
//! [`Error`] that aborts the run before anything is mutated.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod oracle;
pub mod passes;
pub mod pipeline;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types
pub use config::{EntryTablePolicy, PrepareConfig, Stage};
pub use diagnostics::{Diagnostic, DiagnosticKind, PrepareReport, Severity};
pub use error::{Error, Result};
pub use ir::Module;
pub use passes::{
    ModulePass, SymbolicEntryPreparer, UndefinedCallEliminator, UnsupportedCall,
    UnsupportedCallDetector,
};
pub use pipeline::Preparer;
