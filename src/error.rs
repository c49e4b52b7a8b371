//! Error types for the symprep pipeline

use thiserror::Error;

/// Fatal pipeline errors
///
/// Everything in here aborts the whole run. Non-fatal findings (unsupported
/// calls, unsound removals, stripped bodies) are reported as
/// [`Diagnostic`](crate::Diagnostic)s instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The designated entry function is absent
    ///
    /// **Triggered by:** running the `prepare` stage on a module without `main`
    /// **Prevention:** link the harness or the program's `main` before preparing
    #[error("Entry point '{name}' not found in module")]
    MissingEntryPoint {
        /// Name of the function that was looked up
        name: String,
    },

    /// A call resolved to a function symbol with an empty name
    #[error("Call in '{function}' resolves to an unnamed function")]
    UnnamedCallee {
        /// Function containing the call
        function: String,
    },

    /// An operand references a function or global the module does not own
    #[error("'{function}' references unknown symbol '{symbol}'")]
    DanglingSymbol {
        /// Function containing the reference
        function: String,
        /// Missing symbol name
        symbol: String,
    },

    /// A zero value was requested for a type that has none (void, function)
    #[error("No zero value of type {ty} for '{symbol}'")]
    NoZeroValue {
        /// Symbol the zero value was needed for
        symbol: String,
        /// Offending type, printed
        ty: String,
    },

    /// Two functions or globals share a name
    #[error("Duplicate symbol: {name}")]
    DuplicateSymbol {
        /// Conflicting name
        name: String,
    },

    /// The entry table already exists and the policy forbids reusing it
    #[error("Entry table '{name}' already exists")]
    EntryTableExists {
        /// Reserved table name
        name: String,
    },

    /// The module failed structural verification
    #[error("Malformed module: {}", .0.join("; "))]
    MalformedModule(Vec<String>),

    /// Module text could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration could not be decoded or is inconsistent
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a parse error with a message
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create a config error with a message
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether the error stems from a broken input module rather than a
    /// missing precondition or bad configuration
    pub fn is_internal_consistency(&self) -> bool {
        matches!(
            self,
            Error::UnnamedCallee { .. }
                | Error::DanglingSymbol { .. }
                | Error::NoZeroValue { .. }
                | Error::DuplicateSymbol { .. }
                | Error::MalformedModule(_)
        )
    }
}

/// Result type for symprep operations
pub type Result<T> = std::result::Result<T, Error>;
