//! Functions and basic blocks

use super::instruction::Instruction;
use super::types::IrType;
use super::value::{Reg, Value};
use serde::{Deserialize, Serialize};

/// Symbol linkage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    /// Visible to other modules
    #[default]
    External,
    /// Only visible within this module
    Internal,
}

/// Straight-line sequence of instructions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    /// Label identifying this basic block
    pub label: String,
    /// Instructions in order
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    /// Create an empty basic block with the given label
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            instructions: Vec::new(),
        }
    }

    /// Appends an instruction, builder style
    pub fn with(mut self, inst: Instruction) -> Self {
        self.instructions.push(inst);
        self
    }
}

/// IR function, either defined (with blocks) or declared (external)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// Symbol name
    pub name: String,
    /// Return type
    pub ret_ty: IrType,
    /// Parameter types
    #[serde(default)]
    pub params: Vec<IrType>,
    /// Accepts variadic arguments
    #[serde(default)]
    pub variadic: bool,
    /// Linkage
    #[serde(default)]
    pub linkage: Linkage,
    /// Body; `None` for declarations
    #[serde(default)]
    pub blocks: Option<Vec<BasicBlock>>,
}

impl Function {
    /// A bodiless external function
    pub fn declare(name: &str, ret_ty: IrType, params: Vec<IrType>) -> Self {
        Self {
            name: name.to_string(),
            ret_ty,
            params,
            variadic: false,
            linkage: Linkage::External,
            blocks: None,
        }
    }

    /// A function with a body
    pub fn define(
        name: &str,
        ret_ty: IrType,
        params: Vec<IrType>,
        blocks: Vec<BasicBlock>,
    ) -> Self {
        Self {
            blocks: Some(blocks),
            ..Self::declare(name, ret_ty, params)
        }
    }

    /// Marks the signature variadic, builder style
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Has no body; an empty block list counts as none
    pub fn is_declaration(&self) -> bool {
        self.blocks.as_ref().map_or(true, |blocks| blocks.is_empty())
    }

    /// Compiler builtin, always considered defined and supported
    pub fn is_intrinsic(&self) -> bool {
        self.name.starts_with("llvm.")
    }

    /// Signature as a function type
    pub fn fn_type(&self) -> IrType {
        IrType::Function {
            ret: Box::new(self.ret_ty.clone()),
            params: self.params.clone(),
            variadic: self.variadic,
        }
    }

    /// Drops the body, turning a definition into an external declaration
    ///
    /// Returns false if the function had no body.
    pub fn delete_body(&mut self) -> bool {
        let had_body = !self.is_declaration();
        self.blocks = None;
        self.linkage = Linkage::External;
        had_body
    }

    /// Blocks of the body (empty for declarations)
    pub fn blocks(&self) -> &[BasicBlock] {
        self.blocks.as_deref().unwrap_or(&[])
    }

    /// Instructions in block order
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks().iter().flat_map(|b| b.instructions.iter())
    }

    /// Rewrites every use of `reg` in the body to `with`, returning the count
    pub fn replace_all_uses(&mut self, reg: Reg, with: &Value) -> usize {
        let mut replaced = 0;
        for block in self.blocks.iter_mut().flatten() {
            for inst in &mut block.instructions {
                for operand in inst.operands_mut() {
                    replaced += operand.replace_reg(reg, with);
                }
            }
        }
        replaced
    }

    /// Number of operands referencing `reg`
    pub fn count_uses(&self, reg: Reg) -> usize {
        self.instructions()
            .flat_map(|inst| inst.operands())
            .filter(|op| op.uses_reg(reg))
            .count()
    }
}
