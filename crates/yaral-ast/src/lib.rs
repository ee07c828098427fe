//! Typed syntax tree for YARA-L rules and the lowering from the concrete tree.
pub mod ast;
mod escape;
mod lower;
mod parser;

pub use ast::*;
pub use escape::{StringLiteralError, process_escape_sequences};
pub use lower::{LowerError, Lowered, MAX_EXPRESSION_DEPTH, lower_tree, parse_source_file};
pub use parser::{new_parser, parse_with_thread_local};
