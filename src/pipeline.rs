//! Checking pipeline for YARA-L source files.
//!
//! ```text
//! SourceFile
//!     │
//!     ▼
//! parse_source_file ─► RuleSet (syntax diagnostics)
//!     │
//!     ▼
//! check ─► RuleSet (validation diagnostics)
//! ```
//!
//! Both stages are Salsa tracked functions. Diagnostics are emitted through
//! the [`Diagnostic`] accumulator and collected by [`check_with_diagnostics`].

use std::collections::HashSet;

use salsa::Accumulator;
use yaral_ast::{Rule, RuleSet, SectionKind, Statement, parse_source_file};
use yaral_core::{CompilationPhase, Diagnostic, SourceFile};

/// Sections every rule needs before it can match anything.
const REQUIRED_SECTIONS: [SectionKind; 2] = [SectionKind::Events, SectionKind::Condition];

/// Parse and validate a source file.
#[salsa::tracked]
pub fn check<'db>(db: &'db dyn salsa::Database, source: SourceFile) -> RuleSet<'db> {
    let rule_set = parse_source_file(db, source);
    let diagnostics = validate(rule_set.rules(db));
    tracing::debug!(
        path = %source.path(db).display(),
        count = diagnostics.len(),
        "validated rules"
    );
    for diagnostic in diagnostics {
        diagnostic.accumulate(db);
    }
    rule_set
}

/// Checks structural constraints that the grammar does not enforce.
pub fn validate(rules: &[Rule]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut names = HashSet::new();

    for rule in rules {
        if !rule.name.is_empty() && !names.insert(rule.name.as_str()) {
            diagnostics.push(Diagnostic::error(
                CompilationPhase::Validation,
                rule.name_span,
                format!("rule `{}` is defined more than once", rule.name),
            ));
        }
        validate_rule(rule, &mut diagnostics);
    }

    diagnostics
}

fn validate_rule(rule: &Rule, diagnostics: &mut Vec<Diagnostic>) {
    if rule.sections.is_empty() {
        diagnostics.push(Diagnostic::warning(
            CompilationPhase::Validation,
            rule.name_span,
            format!("rule `{}` is empty", rule.name),
        ));
        return;
    }

    let mut seen = Vec::new();
    for section in &rule.sections {
        if seen.contains(&section.kind) {
            diagnostics.push(Diagnostic::error(
                CompilationPhase::Validation,
                section.span,
                format!(
                    "section `{}` appears more than once in rule `{}`",
                    section.kind, rule.name
                ),
            ));
        } else {
            seen.push(section.kind);
        }

        if section.kind == SectionKind::Match {
            for statement in &section.statements {
                if !matches!(statement, Statement::Match(_)) {
                    diagnostics.push(Diagnostic::warning(
                        CompilationPhase::Validation,
                        statement.span(),
                        "statement in `match` section is not a match expression",
                    ));
                }
            }
        }
    }

    for required in REQUIRED_SECTIONS {
        if !seen.contains(&required) {
            diagnostics.push(Diagnostic::error(
                CompilationPhase::Validation,
                rule.name_span,
                format!("rule `{}` has no `{required}` section", rule.name),
            ));
        }
    }
}

/// Outcome of checking one file.
#[derive(Debug)]
pub struct CheckResult<'db> {
    pub rule_set: RuleSet<'db>,
    /// Every diagnostic from parsing and validation, ordered by position.
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckResult<'_> {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// Run the pipeline and collect its diagnostics.
pub fn check_with_diagnostics<'db>(
    db: &'db dyn salsa::Database,
    source: SourceFile,
) -> CheckResult<'db> {
    let rule_set = check(db, source);
    let mut diagnostics: Vec<Diagnostic> = check::accumulated::<Diagnostic>(db, source)
        .into_iter()
        .cloned()
        .collect();
    diagnostics.sort_by_key(|diagnostic| diagnostic.span.start);

    CheckResult {
        rule_set,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yaral_ast::{lower_tree, parse_with_thread_local};
    use yaral_core::DiagnosticSeverity;

    fn rules(source: &str) -> Vec<Rule> {
        let tree = parse_with_thread_local(source, None)
            .expect("Error loading Yaral grammar")
            .expect("tree");
        let lowered = lower_tree(&tree, source);
        assert!(lowered.errors.is_empty(), "{:?}", lowered.errors);
        lowered.rules
    }

    fn messages(source: &str) -> Vec<(DiagnosticSeverity, String)> {
        validate(&rules(source))
            .into_iter()
            .map(|diagnostic| (diagnostic.severity, diagnostic.message))
            .collect()
    }

    #[test]
    fn test_valid_rule() {
        let source = r#"
rule ok {
  events:
    $e.metadata.event_type = "USER_LOGIN"
  match:
    $user over 5m
  condition:
    $e
}
"#;
        assert!(messages(source).is_empty());
    }

    #[test]
    fn test_duplicate_rule_names() {
        let source = "rule a { events: $e.x = 1 condition: $e }\n\
                      rule a { events: $e.x = 2 condition: $e }";
        let diagnostics = validate(&rules(source));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "rule `a` is defined more than once");
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Error);
        assert_eq!(&source[diagnostics[0].span.range()], "a");
        assert!(diagnostics[0].span.start > 40);
    }

    #[test]
    fn test_duplicate_section() {
        let source = "rule r { events: $e.x = 1 events: $e.y = 2 condition: $e }";
        assert_eq!(
            messages(source),
            [(
                DiagnosticSeverity::Error,
                "section `events` appears more than once in rule `r`".to_string()
            )]
        );
    }

    #[test]
    fn test_missing_required_sections() {
        assert_eq!(
            messages("rule r { meta: author = \"me\" }"),
            [
                (
                    DiagnosticSeverity::Error,
                    "rule `r` has no `events` section".to_string()
                ),
                (
                    DiagnosticSeverity::Error,
                    "rule `r` has no `condition` section".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_empty_rule_is_a_warning() {
        assert_eq!(
            messages("rule r {}"),
            [(DiagnosticSeverity::Warning, "rule `r` is empty".to_string())]
        );
    }

    #[test]
    fn test_non_match_statement_in_match_section() {
        let source = "rule r { events: $e.x = 1 match: $a = $b condition: $e }";
        assert_eq!(
            messages(source),
            [(
                DiagnosticSeverity::Warning,
                "statement in `match` section is not a match expression".to_string()
            )]
        );
    }

    #[test]
    fn test_check_with_diagnostics_orders_by_position() {
        let db = salsa::DatabaseImpl::default();
        let source = SourceFile::new(
            &db,
            "rules.yaral".into(),
            "rule a {}\nrule b { condition: $e\n".to_string(),
        );
        let result = check_with_diagnostics(&db, source);
        let starts: Vec<usize> = result.diagnostics.iter().map(|d| d.span.start).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
        assert!(result.has_errors());
        assert_eq!(result.rule_set.rules(&db).len(), 2);
    }
}
