//! Operands and constants

use super::types::IrType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Virtual register holding an instruction result (SSA name, unique per function)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reg(pub u32);

impl Reg {
    /// Creates a register with the given id
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Compile-time constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constant {
    /// Integer constant of the given width
    Int {
        /// Bit width
        bits: u32,
        /// Value (sign-extended)
        value: i64,
    },
    /// Floating point constant
    Float {
        /// `float` or `double`
        ty: IrType,
        /// Value
        value: f64,
    },
    /// Null pointer of the given pointer type
    Null(IrType),
    /// All-zero aggregate
    ZeroInit(IrType),
    /// Address of a function
    FunctionAddr(String),
    /// Address of a global variable
    GlobalAddr(String),
    /// Constant pointer reinterpretation
    Bitcast {
        /// Constant being cast
        value: Box<Constant>,
        /// Target type
        to: IrType,
    },
    /// Constant array
    Array {
        /// Element type
        elem: IrType,
        /// Elements, in order
        elems: Vec<Constant>,
    },
}

impl Constant {
    /// Integer constant
    pub fn int(bits: u32, value: i64) -> Self {
        Constant::Int { bits, value }
    }

    /// The canonical zero of `ty`, or `None` when `ty` has no values
    pub fn null_value(ty: &IrType) -> Option<Self> {
        match ty {
            IrType::Void | IrType::Function { .. } => None,
            IrType::Int(bits) => Some(Constant::Int {
                bits: *bits,
                value: 0,
            }),
            IrType::Float | IrType::Double => Some(Constant::Float {
                ty: ty.clone(),
                value: 0.0,
            }),
            IrType::Ptr(_) => Some(Constant::Null(ty.clone())),
            IrType::Array { .. } | IrType::Struct(_) => Some(Constant::ZeroInit(ty.clone())),
        }
    }

    /// Type of the constant when it is known without a module
    ///
    /// Symbol addresses return `None`; their type depends on the symbol.
    pub fn ty(&self) -> Option<IrType> {
        match self {
            Constant::Int { bits, .. } => Some(IrType::Int(*bits)),
            Constant::Float { ty, .. } | Constant::Null(ty) | Constant::ZeroInit(ty) => {
                Some(ty.clone())
            }
            Constant::FunctionAddr(_) | Constant::GlobalAddr(_) => None,
            Constant::Bitcast { to, .. } => Some(to.clone()),
            Constant::Array { elem, elems } => Some(elem.clone().array_of(elems.len() as u64)),
        }
    }

    /// Returns true if this is the canonical zero of its type
    pub fn is_null_value(&self) -> bool {
        match self {
            Constant::Int { value, .. } => *value == 0,
            Constant::Float { value, .. } => *value == 0.0 && value.is_sign_positive(),
            Constant::Null(_) | Constant::ZeroInit(_) => true,
            _ => false,
        }
    }

    /// Symbol names this constant refers to
    pub fn symbols(&self) -> Vec<&str> {
        match self {
            Constant::FunctionAddr(name) | Constant::GlobalAddr(name) => vec![name.as_str()],
            Constant::Bitcast { value, .. } => value.symbols(),
            Constant::Array { elems, .. } => elems.iter().flat_map(|c| c.symbols()).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int { bits, value } => write!(f, "i{} {}", bits, value),
            Constant::Float { ty, value } => write!(f, "{} {:?}", ty, value),
            Constant::Null(ty) => write!(f, "{} null", ty),
            Constant::ZeroInit(ty) => write!(f, "{} zeroinitializer", ty),
            Constant::FunctionAddr(name) | Constant::GlobalAddr(name) => write!(f, "@{}", name),
            Constant::Bitcast { value, to } => write!(f, "bitcast ({} to {})", value, to),
            Constant::Array { elem, elems } => {
                write!(f, "[{} x {}] [", elems.len(), elem)?;
                for (i, c) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Instruction operand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Direct reference to a named function
    Function(String),
    /// Address of a named global variable
    Global(String),
    /// Result of another instruction in the same function
    Reg(Reg),
    /// Function parameter by position
    Arg(u32),
    /// Constant operand
    Const(Constant),
    /// Pointer cast wrapper around another value
    Cast {
        /// Value being cast
        value: Box<Value>,
        /// Target pointer type
        to: IrType,
    },
    /// Inline machine-code sequence used as a callee
    InlineAsm {
        /// Assembly template
        asm: String,
        /// Operand constraints
        #[serde(default)]
        constraints: String,
    },
}

impl Value {
    /// Direct function reference
    pub fn function(name: impl Into<String>) -> Self {
        Value::Function(name.into())
    }

    /// Wraps `self` in a pointer cast to `to`
    pub fn cast_to(self, to: IrType) -> Self {
        Value::Cast {
            value: Box::new(self),
            to,
        }
    }

    /// Follows pointer casts down to the underlying value
    pub fn strip_pointer_casts(&self) -> &Value {
        let mut current = self;
        while let Value::Cast { value, .. } = current {
            current = value;
        }
        current
    }

    /// Returns true if `reg` occurs in this operand, casts included
    pub fn uses_reg(&self, reg: Reg) -> bool {
        match self.strip_pointer_casts() {
            Value::Reg(r) => *r == reg,
            _ => false,
        }
    }

    /// Replaces every occurrence of `reg` with `with`, returning the count
    pub fn replace_reg(&mut self, reg: Reg, with: &Value) -> usize {
        match self {
            Value::Reg(r) if *r == reg => {
                *self = with.clone();
                1
            }
            Value::Cast { value, .. } => value.replace_reg(reg, with),
            _ => 0,
        }
    }

    /// Symbol names this operand refers to
    pub fn symbols(&self) -> Vec<&str> {
        match self {
            Value::Function(name) | Value::Global(name) => vec![name.as_str()],
            Value::Const(c) => c.symbols(),
            Value::Cast { value, .. } => value.symbols(),
            _ => Vec::new(),
        }
    }
}

impl From<Constant> for Value {
    fn from(c: Constant) -> Self {
        Value::Const(c)
    }
}

impl From<Reg> for Value {
    fn from(r: Reg) -> Self {
        Value::Reg(r)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Function(name) | Value::Global(name) => write!(f, "@{}", name),
            Value::Reg(r) => write!(f, "{}", r),
            Value::Arg(i) => write!(f, "%arg{}", i),
            Value::Const(c) => write!(f, "{}", c),
            Value::Cast { value, to } => write!(f, "bitcast ({} to {})", value, to),
            Value::InlineAsm { asm, constraints } => {
                write!(f, "asm {:?}, {:?}", asm, constraints)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_values_per_type() {
        assert_eq!(
            Constant::null_value(&IrType::i32()),
            Some(Constant::int(32, 0))
        );
        assert_eq!(
            Constant::null_value(&IrType::generic_ptr()),
            Some(Constant::Null(IrType::generic_ptr()))
        );
        let agg = IrType::Struct(vec![IrType::i8(), IrType::Double]);
        assert_eq!(
            Constant::null_value(&agg),
            Some(Constant::ZeroInit(agg.clone()))
        );
        assert_eq!(Constant::null_value(&IrType::Void), None);
        for ty in [IrType::Float, IrType::Double, agg] {
            let zero = Constant::null_value(&ty).unwrap();
            assert!(zero.is_null_value());
            assert_eq!(zero.ty(), Some(ty));
        }
    }

    #[test]
    fn test_replace_reg_inside_cast() {
        let mut v = Value::Reg(Reg(3)).cast_to(IrType::generic_ptr());
        let zero = Value::Const(Constant::Null(IrType::i32().ptr_to()));
        assert!(v.uses_reg(Reg(3)));
        assert_eq!(v.replace_reg(Reg(3), &zero), 1);
        assert!(!v.uses_reg(Reg(3)));
        assert_eq!(v.strip_pointer_casts(), &zero);
    }

    #[test]
    fn test_strip_nested_casts() {
        let v = Value::function("g")
            .cast_to(IrType::generic_ptr())
            .cast_to(IrType::i64().ptr_to());
        assert_eq!(v.strip_pointer_casts(), &Value::function("g"));
        assert_eq!(v.symbols(), vec!["g"]);
    }
}
