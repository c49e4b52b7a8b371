//! IR type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// First-class and aggregate IR types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrType {
    /// No value (only valid as a function return type)
    Void,
    /// Integer of the given bit width (`i1` is boolean)
    Int(u32),
    /// 32-bit IEEE float
    Float,
    /// 64-bit IEEE float
    Double,
    /// Typed pointer
    Ptr(Box<IrType>),
    /// Fixed-length array
    Array {
        /// Element type
        elem: Box<IrType>,
        /// Number of elements
        len: u64,
    },
    /// Anonymous struct
    Struct(Vec<IrType>),
    /// Function signature (only behind a pointer as an operand type)
    Function {
        /// Return type
        ret: Box<IrType>,
        /// Parameter types
        params: Vec<IrType>,
        /// Accepts extra variadic arguments
        #[serde(default)]
        variadic: bool,
    },
}

impl IrType {
    /// `i1`
    pub fn bool() -> Self {
        IrType::Int(1)
    }

    /// `i8`
    pub fn i8() -> Self {
        IrType::Int(8)
    }

    /// `i32`
    pub fn i32() -> Self {
        IrType::Int(32)
    }

    /// `i64`
    pub fn i64() -> Self {
        IrType::Int(64)
    }

    /// Pointer to `self`
    pub fn ptr_to(self) -> Self {
        IrType::Ptr(Box::new(self))
    }

    /// Array of `len` elements of `self`
    pub fn array_of(self, len: u64) -> Self {
        IrType::Array {
            elem: Box::new(self),
            len,
        }
    }

    /// The uniform generic pointer (`i8*`) every entry-table slot is cast to
    pub fn generic_ptr() -> Self {
        IrType::i8().ptr_to()
    }

    /// Returns true for `void`
    pub fn is_void(&self) -> bool {
        matches!(self, IrType::Void)
    }

    /// Returns true for pointer types
    pub fn is_pointer(&self) -> bool {
        matches!(self, IrType::Ptr(_))
    }

    /// Types a value (and therefore a zero value) can have
    pub fn is_first_class(&self) -> bool {
        !matches!(self, IrType::Void | IrType::Function { .. })
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::Int(bits) => write!(f, "i{}", bits),
            IrType::Float => write!(f, "float"),
            IrType::Double => write!(f, "double"),
            IrType::Ptr(pointee) => write!(f, "{}*", pointee),
            IrType::Array { elem, len } => write!(f, "[{} x {}]", len, elem),
            IrType::Struct(fields) => {
                write!(f, "{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, " }}")
            }
            IrType::Function {
                ret,
                params,
                variadic,
            } => {
                write!(f, "{} (", ret)?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                if *variadic {
                    if !params.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "...")?;
                }
                write!(f, ")")
            }
        }
    }
}
