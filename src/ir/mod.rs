//! # Intermediate Representation (IR)
//!
//! A small whole-program IR with the capabilities the preparation passes
//! rely on: iterate instructions, resolve a call's callee, replace all uses
//! of a value, erase an instruction, strip a body, add a global.
//!
//! ## Module Structure
//!
//! ```text
//! ir/
//! ├── mod.rs          # This file - module definition and re-exports
//! ├── types.rs        # IrType
//! ├── value.rs        # Reg, Constant, Value (operands)
//! ├── instruction.rs  # CallInst, Instruction enum
//! ├── function.rs     # BasicBlock, Function, Linkage
//! ├── module.rs       # GlobalVariable, Module (+ JSON and text listing)
//! └── verify.rs       # Structural well-formedness checks
//! ```
//!
//! The whole model derives serde traits; [`Module::from_json`] and
//! [`Module::to_json`] are the on-disk format used by the CLI.

mod function;
mod instruction;
mod module;
mod types;
mod value;
pub mod verify;

// Re-export all public types
pub use function::{BasicBlock, Function, Linkage};
pub use instruction::{CallInst, Instruction};
pub use module::{GlobalVariable, Module};
pub use types::IrType;
pub use value::{Constant, Reg, Value};
pub use verify::{verify_module, VerifyError};
