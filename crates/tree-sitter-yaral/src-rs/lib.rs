//! Tree-sitter grammar for YARA-L 2.0 detection rules.
//!
//! ```
//! let mut parser = tree_sitter::Parser::new();
//! parser
//!     .set_language(&tree_sitter_yaral::language())
//!     .expect("Error loading Yaral grammar");
//! let tree = parser.parse("rule r { condition: $e }", None).unwrap();
//! assert!(!tree.root_node().has_error());
//! ```

unsafe extern "C" {
    fn tree_sitter_yaral() -> tree_sitter::Language;
}

/// The tree-sitter Language for YARA-L.
pub fn language() -> tree_sitter::Language {
    unsafe { tree_sitter_yaral() }
}

/// The content of the [`node-types.json`][] file for this grammar.
///
/// [`node-types.json`]: https://tree-sitter.github.io/tree-sitter/using-parsers#static-node-types
pub const NODE_TYPES: &str = include_str!("../src/node-types.json");
