//! Oracle runtime surface
//!
//! Names of the symbolic-value primitives a prepared program may call. The
//! runtime that implements them lives outside this crate; the pipeline only
//! needs the names to decide what to keep, what to strip and how to report.

use crate::ir::IrType;

/// Prefix shared by every verifier primitive
pub const VERIFIER_PREFIX: &str = "__VERIFIER_";

/// Canonical nondeterministic generators and the type each one yields
pub const NONDET_GENERATORS: &[(&str, NondetType)] = &[
    ("__VERIFIER_nondet_char", NondetType::Signed(8)),
    ("__VERIFIER_nondet_short", NondetType::Signed(16)),
    ("__VERIFIER_nondet_int", NondetType::Signed(32)),
    ("__VERIFIER_nondet_long", NondetType::Signed(64)),
    ("__VERIFIER_nondet_uchar", NondetType::Unsigned(8)),
    ("__VERIFIER_nondet_ushort", NondetType::Unsigned(16)),
    ("__VERIFIER_nondet_uint", NondetType::Unsigned(32)),
    ("__VERIFIER_nondet_ulong", NondetType::Unsigned(64)),
    ("__VERIFIER_nondet_float", NondetType::Float),
    ("__VERIFIER_nondet_double", NondetType::Double),
    ("__VERIFIER_nondet__Bool", NondetType::Bool),
    ("__VERIFIER_nondet_pointer", NondetType::Pointer),
];

/// Alias generators and the canonical generator each delegates to
pub const NONDET_ALIASES: &[(&str, &str)] = &[
    ("__VERIFIER_nondet_bool", "__VERIFIER_nondet__Bool"),
    ("__VERIFIER_nondet_pchar", "__VERIFIER_nondet_pointer"),
    ("__VERIFIER_nondet_unsigned", "__VERIFIER_nondet_uint"),
    ("__VERIFIER_nondet_u8", "__VERIFIER_nondet_uchar"),
    ("__VERIFIER_nondet_U8", "__VERIFIER_nondet_uchar"),
    ("__VERIFIER_nondet_u16", "__VERIFIER_nondet_ushort"),
    ("__VERIFIER_nondet_U16", "__VERIFIER_nondet_ushort"),
    ("__VERIFIER_nondet_u32", "__VERIFIER_nondet_uint"),
    ("__VERIFIER_nondet_U32", "__VERIFIER_nondet_uint"),
    ("__VERIFIER_nondet_size_t", "__VERIFIER_nondet_uint"),
    ("__VERIFIER_nondet_loff_t", "__VERIFIER_nondet_ulong"),
    ("__VERIFIER_nondet_pthread_t", "__VERIFIER_nondet_ulong"),
    ("__VERIFIER_nondet_sector_t", "__VERIFIER_nondet_ulong"),
    ("nondet_char", "__VERIFIER_nondet_char"),
    ("nondet_short", "__VERIFIER_nondet_short"),
    ("nondet_int", "__VERIFIER_nondet_int"),
    ("nondet_long", "__VERIFIER_nondet_long"),
];

/// Path-constraining primitive
pub const ASSUME: &str = "__VERIFIER_assume";

/// Non-generator primitives: path constraints, error reporting, atomic sections
pub const CONTROL_PRIMITIVES: &[&str] = &[
    ASSUME,
    "__VERIFIER_assert",
    "__VERIFIER_error",
    "__VERIFIER_atomic_begin",
    "__VERIFIER_atomic_end",
];

/// Result type of a nondeterministic generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NondetType {
    /// Signed integer of the given width
    Signed(u32),
    /// Unsigned integer of the given width
    Unsigned(u32),
    /// `float`
    Float,
    /// `double`
    Double,
    /// `_Bool`
    Bool,
    /// `void *`
    Pointer,
}

impl NondetType {
    /// IR type the generator returns
    pub fn ir_type(&self) -> IrType {
        match self {
            NondetType::Signed(bits) | NondetType::Unsigned(bits) => IrType::Int(*bits),
            NondetType::Float => IrType::Float,
            NondetType::Double => IrType::Double,
            NondetType::Bool => IrType::bool(),
            NondetType::Pointer => IrType::generic_ptr(),
        }
    }
}

/// Resolves an alias to the canonical generator it delegates to
///
/// Canonical names map to themselves; unknown names yield `None`.
pub fn canonical(name: &str) -> Option<&'static str> {
    if let Some((canon, _)) = NONDET_GENERATORS.iter().find(|(n, _)| *n == name) {
        return Some(*canon);
    }
    NONDET_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canon)| *canon)
}

/// Result type of a generator or alias
pub fn nondet_type(name: &str) -> Option<NondetType> {
    let canon = canonical(name)?;
    NONDET_GENERATORS
        .iter()
        .find(|(n, _)| *n == canon)
        .map(|(_, ty)| *ty)
}

/// Returns true if `name` is a generator, an alias or a control primitive
pub fn is_primitive(name: &str) -> bool {
    canonical(name).is_some() || CONTROL_PRIMITIVES.contains(&name)
}

/// Pre-`__VERIFIER_` oracles still found in older benchmarks
pub const LEGACY_ORACLES: &[&str] = &["kzalloc", "nondet_int"];

/// Aliases that programs commonly define themselves instead of declaring
pub const STRIPPED_ALIASES: &[&str] = &[
    "__VERIFIER_nondet_pchar",
    "__VERIFIER_nondet_unsigned",
    "__VERIFIER_nondet_u32",
    "__VERIFIER_nondet_bool",
];

/// Default set of oracle definitions whose bodies get stripped
///
/// Legacy oracles, `assume`, every canonical generator and the aliases in
/// [`STRIPPED_ALIASES`].
pub fn default_strip_set() -> Vec<String> {
    LEGACY_ORACLES
        .iter()
        .copied()
        .chain(std::iter::once(ASSUME))
        .chain(NONDET_GENERATORS.iter().map(|(name, _)| *name))
        .chain(STRIPPED_ALIASES.iter().copied())
        .map(String::from)
        .collect()
}

/// Default exact-match names whose undefined calls are never removed
pub fn default_leave_set() -> Vec<String> {
    [
        "nondet_int",
        "klee_int",
        "__assert_fail",
        "exit",
        "sprintf",
        "snprintf",
        "swprintf",
        "malloc",
        "free",
        "memset",
        "memcmp",
        "memcpy",
        "memmove",
        "kzalloc",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_generators() {
        for (alias, canon) in NONDET_ALIASES {
            assert_eq!(canonical(alias), Some(*canon), "{}", alias);
            assert!(nondet_type(alias).is_some(), "{}", alias);
        }
        assert_eq!(canonical("__VERIFIER_nondet_int"), Some("__VERIFIER_nondet_int"));
        assert_eq!(canonical("rand"), None);
    }

    #[test]
    fn test_nondet_types() {
        assert_eq!(
            nondet_type("__VERIFIER_nondet_u16").map(|t| t.ir_type()),
            Some(IrType::Int(16))
        );
        assert_eq!(
            nondet_type("__VERIFIER_nondet_pchar").map(|t| t.ir_type()),
            Some(IrType::generic_ptr())
        );
    }

    #[test]
    fn test_strip_set_covers_every_width() {
        let strip = default_strip_set();
        for name in [ASSUME, "__VERIFIER_nondet_ulong", "__VERIFIER_nondet_float"] {
            assert!(strip.iter().any(|s| s == name), "{}", name);
        }
        assert_eq!(strip.len(), 19);
    }

    #[test]
    fn test_strip_set_comes_from_catalog() {
        for name in default_strip_set() {
            assert!(
                LEGACY_ORACLES.contains(&name.as_str()) || is_primitive(&name),
                "{}",
                name
            );
        }
        for alias in STRIPPED_ALIASES {
            assert!(NONDET_ALIASES.iter().any(|(a, _)| a == alias), "{}", alias);
        }
    }

    #[test]
    fn test_primitives() {
        assert!(is_primitive("__VERIFIER_atomic_begin"));
        assert!(is_primitive("nondet_long"));
        assert!(!is_primitive("kzalloc"));
    }
}
