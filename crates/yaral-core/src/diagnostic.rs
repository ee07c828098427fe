//! Diagnostic messages emitted while parsing and checking rules.

use crate::Span;

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[salsa::accumulator]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
    pub severity: DiagnosticSeverity,
    pub phase: CompilationPhase,
}

impl Diagnostic {
    pub fn error(phase: CompilationPhase, span: Span, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span,
            severity: DiagnosticSeverity::Error,
            phase,
        }
    }

    pub fn warning(phase: CompilationPhase, span: Span, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span,
            severity: DiagnosticSeverity::Warning,
            phase,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

/// Severity level of a diagnostic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

/// Phase in which a diagnostic was emitted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, derive_more::Display)]
pub enum CompilationPhase {
    #[display("parsing")]
    Parsing,
    #[display("lowering")]
    Lowering,
    #[display("validation")]
    Validation,
}

impl std::fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Info => write!(f, "info"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let error = Diagnostic::error(CompilationPhase::Parsing, Span::new(0, 1), "bad");
        assert!(error.is_error());
        assert_eq!(error.message, "bad");

        let warning = Diagnostic::warning(CompilationPhase::Validation, Span::new(2, 3), "hmm");
        assert!(!warning.is_error());
        assert_eq!(warning.severity, DiagnosticSeverity::Warning);
    }

    #[test]
    fn test_display() {
        assert_eq!(DiagnosticSeverity::Warning.to_string(), "warning");
        assert_eq!(CompilationPhase::Validation.to_string(), "validation");
    }
}
