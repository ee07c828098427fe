//! YARA-L 2.0 rule parsing and checking.

pub mod database;
pub mod diagnostics;
pub mod pipeline;

pub use database::YaralDatabaseImpl;
pub use pipeline::{CheckResult, check, check_with_diagnostics, validate};
pub use yaral_ast::{Rule, RuleSet, parse_source_file, parse_with_thread_local};
pub use yaral_core::{CompilationPhase, Diagnostic, DiagnosticSeverity, SourceFile, Span};
