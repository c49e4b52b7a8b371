//! Call target resolution through pointer casts

use crate::ir::{CallInst, Function, Module, Value};
use crate::{Error, Result};

/// Statically known target of a call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallTarget<'m> {
    /// Fixed named function
    Resolved(&'m Function),
    /// Truly indirect, inline assembly, or not a function
    Unresolved,
}

impl<'m> CallTarget<'m> {
    /// The target if the passes may classify it: resolved and not an intrinsic
    pub fn classifiable(self) -> Option<&'m Function> {
        match self {
            CallTarget::Resolved(f) if !f.is_intrinsic() => Some(f),
            _ => None,
        }
    }
}

/// Name of the function `callee` reaches through zero or more pointer casts
pub fn resolve_callee(callee: &Value) -> Option<&str> {
    match callee.strip_pointer_casts() {
        Value::Function(name) => Some(name),
        _ => None,
    }
}

/// Resolves the target of `call` inside `module`
///
/// `function` names the caller and only feeds error messages. A resolved
/// name that is empty or absent from the module breaks the module's
/// well-formedness and is returned as an error.
pub fn resolve_call<'m>(
    module: &'m Module,
    function: &str,
    call: &CallInst,
) -> Result<CallTarget<'m>> {
    if call.is_inline_asm() {
        return Ok(CallTarget::Unresolved);
    }
    let Some(name) = resolve_callee(&call.callee) else {
        return Ok(CallTarget::Unresolved);
    };
    if name.is_empty() {
        return Err(Error::UnnamedCallee {
            function: function.to_string(),
        });
    }
    module
        .get_function(name)
        .map(CallTarget::Resolved)
        .ok_or_else(|| Error::DanglingSymbol {
            function: function.to_string(),
            symbol: name.to_string(),
        })
}
