//! IR instruction definitions

use super::types::IrType;
use super::value::{Reg, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Call instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallInst {
    /// Register receiving the result (`None` for void calls)
    #[serde(default)]
    pub result: Option<Reg>,
    /// Result type
    pub ret_ty: IrType,
    /// Called value: a function, a pointer cast of one, or anything indirect
    pub callee: Value,
    /// Arguments, in order
    #[serde(default)]
    pub args: Vec<Value>,
}

impl CallInst {
    /// Call to a named function
    pub fn direct(result: Option<Reg>, ret_ty: IrType, callee: &str, args: Vec<Value>) -> Self {
        Self {
            result,
            ret_ty,
            callee: Value::function(callee),
            args,
        }
    }

    /// Inline assembly is recognized on the callee operand itself, not through casts
    pub fn is_inline_asm(&self) -> bool {
        matches!(self.callee, Value::InlineAsm { .. })
    }
}

/// IR instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// Function call
    Call(CallInst),
    /// Any other value-producing or side-effecting operation
    Op {
        /// Result register, if the operation produces a value
        #[serde(default)]
        result: Option<Reg>,
        /// Result type (`void` when there is no result)
        ty: IrType,
        /// Operation mnemonic (`add`, `load`, `icmp eq`, `br`, ...)
        opcode: String,
        /// Operands, in order
        #[serde(default)]
        operands: Vec<Value>,
    },
    /// Store `value` through `ptr`
    Store {
        /// Stored value
        value: Value,
        /// Destination address
        ptr: Value,
    },
    /// Return from the function
    Ret(Option<Value>),
}

impl Instruction {
    /// Register defined by this instruction
    pub fn result(&self) -> Option<Reg> {
        match self {
            Instruction::Call(call) => call.result,
            Instruction::Op { result, .. } => *result,
            Instruction::Store { .. } | Instruction::Ret(_) => None,
        }
    }

    /// Returns the call payload, if this is a call
    pub fn as_call(&self) -> Option<&CallInst> {
        match self {
            Instruction::Call(call) => Some(call),
            _ => None,
        }
    }

    /// All operands, callee included
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Instruction::Call(call) => std::iter::once(&call.callee)
                .chain(call.args.iter())
                .collect(),
            Instruction::Op { operands, .. } => operands.iter().collect(),
            Instruction::Store { value, ptr } => vec![value, ptr],
            Instruction::Ret(value) => value.iter().collect(),
        }
    }

    /// All operands, mutably
    pub fn operands_mut(&mut self) -> Vec<&mut Value> {
        match self {
            Instruction::Call(call) => std::iter::once(&mut call.callee)
                .chain(call.args.iter_mut())
                .collect(),
            Instruction::Op { operands, .. } => operands.iter_mut().collect(),
            Instruction::Store { value, ptr } => vec![value, ptr],
            Instruction::Ret(value) => value.iter_mut().collect(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Call(call) => {
                if let Some(r) = call.result {
                    write!(f, "{} = ", r)?;
                }
                write!(f, "call {} {}(", call.ret_ty, call.callee)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Instruction::Op {
                result,
                ty,
                opcode,
                operands,
            } => {
                if let Some(r) = result {
                    write!(f, "{} = ", r)?;
                }
                write!(f, "{} {}", opcode, ty)?;
                for (i, op) in operands.iter().enumerate() {
                    write!(f, "{}{}", if i == 0 { " " } else { ", " }, op)?;
                }
                Ok(())
            }
            Instruction::Store { value, ptr } => write!(f, "store {}, {}", value, ptr),
            Instruction::Ret(Some(value)) => write!(f, "ret {}", value),
            Instruction::Ret(None) => write!(f, "ret void"),
        }
    }
}
