//! Diagnostic formatting utilities for the yaral CLI.

use std::io;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use yaral_core::{Diagnostic, DiagnosticSeverity};

/// Get the display color for a severity.
pub fn severity_color(severity: DiagnosticSeverity) -> Color {
    match severity {
        DiagnosticSeverity::Error => Color::Red,
        DiagnosticSeverity::Warning => Color::Yellow,
        DiagnosticSeverity::Info => Color::Blue,
    }
}

fn report_kind(severity: DiagnosticSeverity) -> ReportKind<'static> {
    match severity {
        DiagnosticSeverity::Error => ReportKind::Error,
        DiagnosticSeverity::Warning => ReportKind::Warning,
        DiagnosticSeverity::Info => ReportKind::Advice,
    }
}

/// Normalize a span to ensure end > start (required by ariadne).
pub fn normalize_span(start: usize, end: usize) -> (usize, usize) {
    (start, end.max(start + 1))
}

/// Render a diagnostic with ariadne into `out`.
pub fn write_diagnostic(
    diag: &Diagnostic,
    source: &str,
    file_path: &str,
    color: bool,
    out: impl io::Write,
) -> io::Result<()> {
    let (start, end) = normalize_span(diag.span.start, diag.span.end);
    let label_color = severity_color(diag.severity);

    Report::build(report_kind(diag.severity), (file_path, start..end))
        .with_config(Config::default().with_color(color))
        .with_code(diag.phase)
        .with_message(&diag.message)
        .with_label(
            Label::new((file_path, start..end))
                .with_message(&diag.message)
                .with_color(label_color),
        )
        .finish()
        .write((file_path, Source::from(source.to_string())), out)
}

/// Print a diagnostic using ariadne for pretty output.
pub fn print_diagnostic(diag: &Diagnostic, source: &str, file_path: &str) {
    write_diagnostic(diag, source, file_path, true, io::stderr()).ok();
}
