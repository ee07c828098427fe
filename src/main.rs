//! yaral CLI entry point.

mod cli;

use std::path::PathBuf;

use clap::Parser;
use cli::{Cli, Command};
use salsa::Database;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use yaral::diagnostics::print_diagnostic;
use yaral::pipeline::check_with_diagnostics;
use yaral::{YaralDatabaseImpl, parse_source_file};

fn main() {
    let cli = Cli::parse();
    init_logger(cli.log_filter());

    match cli.command {
        Command::Parse { file } => parse_file(file),
        Command::Ast { file, json } => print_ast(file, json),
        Command::Check { files } => {
            if !check_files(files) {
                std::process::exit(1);
            }
        }
    }
}

fn init_logger(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn load(db: &YaralDatabaseImpl, path: PathBuf) -> yaral::SourceFile {
    match db.input(path.clone()) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

/// `to_sexp` recurses once per level.
const MAX_PRINT_DEPTH: usize = 10_000;

fn tree_depth(tree: &tree_sitter::Tree) -> usize {
    let mut cursor = tree.walk();
    let (mut depth, mut max) = (0, 0);
    loop {
        if cursor.goto_first_child() {
            depth += 1;
            max = max.max(depth);
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return max;
            }
            depth -= 1;
        }
    }
}

fn parse_file(path: PathBuf) {
    let db = YaralDatabaseImpl::default();
    let source = load(&db, path);
    match db.syntax_tree(source) {
        Ok(Some(tree)) if tree_depth(&tree) > MAX_PRINT_DEPTH => {
            eprintln!("Syntax tree is nested more than {MAX_PRINT_DEPTH} levels deep");
            std::process::exit(1);
        }
        Ok(Some(tree)) => println!("{}", tree.root_node().to_sexp()),
        Ok(None) => {
            eprintln!("Parsing was cancelled");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error loading Yaral grammar: {e}");
            std::process::exit(1);
        }
    }
}

fn print_ast(path: PathBuf, json: bool) {
    let db = YaralDatabaseImpl::default();
    let source = load(&db, path);

    db.attach(|db| {
        let rules = parse_source_file(db, source).rules(db);
        if json {
            match serde_json::to_string_pretty(rules) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("Error serializing rules: {e}");
                    std::process::exit(1);
                }
            }
        } else {
            println!("{rules:#?}");
        }
    });
}

/// Returns false if any file could not be read or has errors.
fn check_files(files: Vec<PathBuf>) -> bool {
    let db = YaralDatabaseImpl::default();
    let mut ok = true;
    let (mut errors, mut warnings) = (0, 0);

    for path in files {
        let source = match db.input(path.clone()) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("Error reading {}: {e}", path.display());
                ok = false;
                continue;
            }
        };

        let result = check_with_diagnostics(&db, source);
        tracing::info!(
            path = %path.display(),
            rules = result.rule_set.rules(&db).len(),
            diagnostics = result.diagnostics.len(),
            "checked file"
        );
        let file_path = path.display().to_string();
        for diag in &result.diagnostics {
            print_diagnostic(diag, source.text(&db), &file_path);
        }
        errors += result.error_count();
        warnings += result.diagnostics.len() - result.error_count();
    }

    if errors + warnings > 0 {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }
    ok && errors == 0
}
