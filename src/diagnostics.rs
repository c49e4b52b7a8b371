//! Diagnostics emitted by the preparation passes
//!
//! Each detection or mutation produces one [`Diagnostic`]. They are logged
//! through `tracing` as they happen and collected into the
//! [`PrepareReport`] handed back to the driver.

use std::fmt;

/// How much a diagnostic affects the soundness of the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational, the module's meaning is unchanged
    Info,
    /// Intentional, semantics-changing action
    Unsound,
}

/// Kind of action or finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Call to a function the verifier cannot model
    UnsupportedCall,
    /// Call to an undefined function was deleted
    RemovedCall,
    /// Oracle definition lost its body
    StrippedBody,
    /// Uninitialized mutable global got a zero initializer
    InitializedGlobal,
    /// Entry table was published
    EntryTableCreated,
    /// Entry table already existed and was left alone
    EntryTableKept,
}

impl DiagnosticKind {
    /// Severity of this kind
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::RemovedCall | DiagnosticKind::StrippedBody => Severity::Unsound,
            _ => Severity::Info,
        }
    }
}

/// One reported action, naming the symbol it concerns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What happened
    pub kind: DiagnosticKind,
    /// Symbol the action concerns (callee, function, global or table)
    pub symbol: String,
    /// Function the call site lives in, for call-site diagnostics
    pub function: Option<String>,
}

impl Diagnostic {
    /// Diagnostic about a call site inside `function`
    pub fn at_call(kind: DiagnosticKind, function: &str, callee: &str) -> Self {
        Self {
            kind,
            symbol: callee.to_string(),
            function: Some(function.to_string()),
        }
    }

    /// Diagnostic about a module-level symbol
    pub fn on_symbol(kind: DiagnosticKind, symbol: &str) -> Self {
        Self {
            kind,
            symbol: symbol.to_string(),
            function: None,
        }
    }

    /// Severity of the underlying kind
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// Logs the diagnostic and appends it to `sink`
    pub fn emit(self, sink: &mut Vec<Diagnostic>) {
        match self.severity() {
            Severity::Unsound => tracing::warn!("{}", self),
            Severity::Info => tracing::info!("{}", self),
        }
        sink.push(self);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let site = self.function.as_deref().unwrap_or("?");
        match self.kind {
            DiagnosticKind::UnsupportedCall => {
                write!(f, "unsupported call to '{}' in '{}'", self.symbol, site)
            }
            DiagnosticKind::RemovedCall => {
                write!(f, "removing call to '{}' in '{}' (unsound)", self.symbol, site)
            }
            DiagnosticKind::StrippedBody => write!(f, "deleting body of '{}'", self.symbol),
            DiagnosticKind::InitializedGlobal => {
                write!(f, "making '{}' non-extern (zero-initialized)", self.symbol)
            }
            DiagnosticKind::EntryTableCreated => {
                write!(f, "publishing entry table '{}'", self.symbol)
            }
            DiagnosticKind::EntryTableKept => {
                write!(f, "entry table '{}' already present, keeping it", self.symbol)
            }
        }
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Default)]
pub struct PrepareReport {
    /// Every diagnostic, in emission order
    pub diagnostics: Vec<Diagnostic>,
    /// Some stage changed the module
    pub modified: bool,
}

impl PrepareReport {
    /// Diagnostics of one kind
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    /// Symbols named by diagnostics of one kind
    pub fn symbols(&self, kind: DiagnosticKind) -> Vec<&str> {
        self.of_kind(kind).map(|d| d.symbol.as_str()).collect()
    }

    /// Count of semantics-changing actions
    pub fn unsound_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Unsound)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_name_symbol() {
        let d = Diagnostic::at_call(DiagnosticKind::RemovedCall, "f", "g");
        assert_eq!(d.to_string(), "removing call to 'g' in 'f' (unsound)");
        assert_eq!(d.severity(), Severity::Unsound);

        let d = Diagnostic::on_symbol(DiagnosticKind::InitializedGlobal, "counter");
        assert!(d.to_string().contains("'counter'"));
        assert_eq!(d.severity(), Severity::Info);
    }

    #[test]
    fn test_report_filters() {
        let mut report = PrepareReport::default();
        Diagnostic::at_call(DiagnosticKind::UnsupportedCall, "main", "pthread_create")
            .emit(&mut report.diagnostics);
        Diagnostic::on_symbol(DiagnosticKind::StrippedBody, "nondet_int")
            .emit(&mut report.diagnostics);
        assert_eq!(report.symbols(DiagnosticKind::UnsupportedCall), vec!["pthread_create"]);
        assert_eq!(report.unsound_count(), 1);
    }
}
