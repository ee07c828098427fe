//! Command-line interface for the yaral rule checker.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "yaral")]
#[command(about = "YARA-L 2.0 rule parser and checker", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the syntax tree of a file as an S-expression
    Parse { file: PathBuf },
    /// Print the typed rules of a file
    Ast {
        file: PathBuf,
        /// Print JSON instead of the debug representation
        #[arg(long)]
        json: bool,
    },
    /// Check rule files and report diagnostics
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

impl Cli {
    /// Default log filter when RUST_LOG is unset.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
