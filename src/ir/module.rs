//! Module and global variables

use super::function::{Function, Linkage};
use super::types::IrType;
use super::value::Constant;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Global variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVariable {
    /// Symbol name
    pub name: String,
    /// Type of the stored value
    pub ty: IrType,
    /// Read-only storage
    #[serde(default)]
    pub is_constant: bool,
    /// Linkage
    #[serde(default)]
    pub linkage: Linkage,
    /// Initial value; `None` for external / uninitialized storage
    #[serde(default)]
    pub initializer: Option<Constant>,
}

impl GlobalVariable {
    /// Mutable global without an initializer
    pub fn external(name: &str, ty: IrType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            is_constant: false,
            linkage: Linkage::External,
            initializer: None,
        }
    }

    /// Global with an initializer
    pub fn with_initializer(name: &str, ty: IrType, init: Constant) -> Self {
        Self {
            initializer: Some(init),
            ..Self::external(name, ty)
        }
    }

    /// Marks the global read-only, builder style
    pub fn constant(mut self) -> Self {
        self.is_constant = true;
        self
    }
}

/// Whole-program IR module
///
/// Functions and globals are keyed by their unique name and iterate in
/// insertion order, which keeps every pass deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    /// Module identifier
    #[serde(default)]
    pub name: String,
    /// Functions by name
    #[serde(default, with = "keyed_functions")]
    pub functions: IndexMap<String, Function>,
    /// Globals by name
    #[serde(default, with = "keyed_globals")]
    pub globals: IndexMap<String, GlobalVariable>,
}

impl Module {
    /// Create an empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds a function; names must be unique across the module
    pub fn add_function(&mut self, function: Function) -> Result<()> {
        if self.has_symbol(&function.name) {
            return Err(Error::DuplicateSymbol {
                name: function.name,
            });
        }
        self.functions.insert(function.name.clone(), function);
        Ok(())
    }

    /// Adds a global; names must be unique across the module
    pub fn add_global(&mut self, global: GlobalVariable) -> Result<()> {
        if self.has_symbol(&global.name) {
            return Err(Error::DuplicateSymbol { name: global.name });
        }
        self.globals.insert(global.name.clone(), global);
        Ok(())
    }

    /// Builder-style [`add_function`](Self::add_function)
    pub fn with_function(mut self, function: Function) -> Result<Self> {
        self.add_function(function)?;
        Ok(self)
    }

    /// Builder-style [`add_global`](Self::add_global)
    pub fn with_global(mut self, global: GlobalVariable) -> Result<Self> {
        self.add_global(global)?;
        Ok(self)
    }

    /// Function by name
    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Function by name, mutably
    pub fn get_function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.get_mut(name)
    }

    /// Global by name
    pub fn get_global(&self, name: &str) -> Option<&GlobalVariable> {
        self.globals.get(name)
    }

    /// Either a function or a global carries this name
    pub fn has_symbol(&self, name: &str) -> bool {
        self.functions.contains_key(name) || self.globals.contains_key(name)
    }

    /// Number of instructions across all function bodies
    pub fn instruction_count(&self) -> usize {
        self.functions.values().map(|f| f.instructions().count()).sum()
    }

    /// Decode a module from JSON
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::parse(e.to_string()))
    }

    /// Encode the module as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::parse(e.to_string()))
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module '{}'", self.name)?;
        for global in self.globals.values() {
            let linkage = match global.linkage {
                Linkage::Internal => "internal ",
                Linkage::External => "",
            };
            let kind = if global.is_constant { "constant" } else { "global" };
            match &global.initializer {
                Some(init) => writeln!(f, "@{} = {}{} {}", global.name, linkage, kind, init)?,
                None => writeln!(f, "@{} = external {} {}", global.name, kind, global.ty)?,
            }
        }
        for function in self.functions.values() {
            writeln!(f)?;
            let keyword = if function.is_declaration() {
                "declare"
            } else {
                "define"
            };
            write!(f, "{} {} @{}(", keyword, function.ret_ty, function.name)?;
            for (i, param) in function.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", param)?;
            }
            if function.variadic {
                write!(f, "{}...", if function.params.is_empty() { "" } else { ", " })?;
            }
            write!(f, ")")?;
            if function.is_declaration() {
                writeln!(f)?;
                continue;
            }
            writeln!(f, " {{")?;
            for block in function.blocks() {
                writeln!(f, "{}:", block.label)?;
                for inst in &block.instructions {
                    writeln!(f, "  {}", inst)?;
                }
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

/// Serializes the function map as a plain list, keyed back by name on load
mod keyed_functions {
    use super::Function;
    use indexmap::IndexMap;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        map: &IndexMap<String, Function>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<IndexMap<String, Function>, D::Error> {
        let list = Vec::<Function>::deserialize(deserializer)?;
        let mut map = IndexMap::with_capacity(list.len());
        for function in list {
            if map.contains_key(&function.name) {
                return Err(D::Error::custom(format!(
                    "duplicate function '{}'",
                    function.name
                )));
            }
            map.insert(function.name.clone(), function);
        }
        Ok(map)
    }
}

/// Same as [`keyed_functions`] for globals
mod keyed_globals {
    use super::GlobalVariable;
    use indexmap::IndexMap;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        map: &IndexMap<String, GlobalVariable>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<IndexMap<String, GlobalVariable>, D::Error> {
        let list = Vec::<GlobalVariable>::deserialize(deserializer)?;
        let mut map = IndexMap::with_capacity(list.len());
        for global in list {
            if map.contains_key(&global.name) {
                return Err(D::Error::custom(format!(
                    "duplicate global '{}'",
                    global.name
                )));
            }
            map.insert(global.name.clone(), global);
        }
        Ok(map)
    }
}
