//! # Module Verifier
//!
//! Structural well-formedness checks run before the pipeline touches a
//! module and again on its output. The passes assume everything checked
//! here; a failure is an internal-consistency error, not a diagnostic.

use super::instruction::Instruction;
use super::module::Module;
use super::value::{Constant, Reg, Value};
use crate::{Error, Result};
use std::collections::HashSet;
use std::fmt;

/// Verification finding
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyError {
    /// Function or global with an empty name.
    UnnamedSymbol,

    /// Operand names a function the module does not contain.
    UnknownFunction {
        /// Function containing the operand (or the global initializer's owner)
        owner: String,
        /// Referenced name
        name: String,
    },

    /// Operand names a global the module does not contain.
    UnknownGlobal {
        /// Function containing the operand (or the global initializer's owner)
        owner: String,
        /// Referenced name
        name: String,
    },

    /// Register defined more than once in a function.
    RedefinedReg {
        /// Function name
        function: String,
        /// Register
        reg: Reg,
    },

    /// Register used but never defined in a function.
    UndefinedReg {
        /// Function name
        function: String,
        /// Register
        reg: Reg,
    },

    /// Void call binding a result register.
    ///
    /// Non-void calls may leave their result unbound.
    CallResultMismatch {
        /// Function containing the call
        function: String,
        /// Callee, printed
        callee: String,
    },
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::UnnamedSymbol => write!(f, "symbol with empty name"),
            VerifyError::UnknownFunction { owner, name } => {
                write!(f, "'{}' references unknown function '{}'", owner, name)
            }
            VerifyError::UnknownGlobal { owner, name } => {
                write!(f, "'{}' references unknown global '{}'", owner, name)
            }
            VerifyError::RedefinedReg { function, reg } => {
                write!(f, "{} defined more than once in '{}'", reg, function)
            }
            VerifyError::UndefinedReg { function, reg } => {
                write!(f, "{} used but not defined in '{}'", reg, function)
            }
            VerifyError::CallResultMismatch { function, callee } => {
                write!(
                    f,
                    "void call to {} in '{}' binds a result register",
                    callee, function
                )
            }
        }
    }
}

/// Check a module, collecting every finding
pub fn verify_module(module: &Module) -> std::result::Result<(), Vec<VerifyError>> {
    let mut errors = Vec::new();

    for global in module.globals.values() {
        if global.name.is_empty() {
            errors.push(VerifyError::UnnamedSymbol);
        }
        if let Some(init) = &global.initializer {
            check_constant(module, &global.name, init, &mut errors);
        }
    }

    for function in module.functions.values() {
        if function.name.is_empty() {
            errors.push(VerifyError::UnnamedSymbol);
        }

        let mut defined = HashSet::new();
        for inst in function.instructions() {
            if let Some(reg) = inst.result() {
                if !defined.insert(reg) {
                    errors.push(VerifyError::RedefinedReg {
                        function: function.name.clone(),
                        reg,
                    });
                }
            }
        }

        for inst in function.instructions() {
            if let Instruction::Call(call) = inst {
                if call.ret_ty.is_void() && call.result.is_some() {
                    errors.push(VerifyError::CallResultMismatch {
                        function: function.name.clone(),
                        callee: call.callee.to_string(),
                    });
                }
            }
            for operand in inst.operands() {
                check_value(module, &function.name, operand, &defined, &mut errors);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl Module {
    /// [`verify_module`] folded into a single [`Error::MalformedModule`]
    pub fn verify(&self) -> Result<()> {
        verify_module(self).map_err(|errors| {
            Error::MalformedModule(errors.iter().map(|e| e.to_string()).collect())
        })
    }
}

fn check_value(
    module: &Module,
    owner: &str,
    value: &Value,
    defined: &HashSet<Reg>,
    errors: &mut Vec<VerifyError>,
) {
    match value {
        Value::Function(name) => check_function_ref(module, owner, name, errors),
        Value::Global(name) => check_global_ref(module, owner, name, errors),
        Value::Reg(reg) => {
            if !defined.contains(reg) {
                errors.push(VerifyError::UndefinedReg {
                    function: owner.to_string(),
                    reg: *reg,
                });
            }
        }
        Value::Const(c) => check_constant(module, owner, c, errors),
        Value::Cast { value, .. } => check_value(module, owner, value, defined, errors),
        Value::Arg(_) | Value::InlineAsm { .. } => {}
    }
}

fn check_constant(
    module: &Module,
    owner: &str,
    constant: &Constant,
    errors: &mut Vec<VerifyError>,
) {
    match constant {
        Constant::FunctionAddr(name) => check_function_ref(module, owner, name, errors),
        Constant::GlobalAddr(name) => check_global_ref(module, owner, name, errors),
        Constant::Bitcast { value, .. } => check_constant(module, owner, value, errors),
        Constant::Array { elems, .. } => {
            for elem in elems {
                check_constant(module, owner, elem, errors);
            }
        }
        _ => {}
    }
}

fn check_function_ref(module: &Module, owner: &str, name: &str, errors: &mut Vec<VerifyError>) {
    if module.get_function(name).is_none() {
        errors.push(VerifyError::UnknownFunction {
            owner: owner.to_string(),
            name: name.to_string(),
        });
    }
}

fn check_global_ref(module: &Module, owner: &str, name: &str, errors: &mut Vec<VerifyError>) {
    if module.get_global(name).is_none() {
        errors.push(VerifyError::UnknownGlobal {
            owner: owner.to_string(),
            name: name.to_string(),
        });
    }
}
