//! Shared building blocks for the YARA-L toolchain.
pub mod diagnostic;
pub mod source;

pub use diagnostic::{CompilationPhase, Diagnostic, DiagnosticSeverity};
pub use source::{SourceFile, Span, Spanned};
