use std::cell::RefCell;

use tree_sitter::{LanguageError, Parser, Tree};

thread_local! {
    static PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

pub fn new_parser() -> Result<Parser, LanguageError> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_yaral::language())?;
    Ok(parser)
}

/// Parses `text` with this thread's parser, creating it on first use.
///
/// `None` means the parse was cancelled, which only happens when a timeout or
/// cancellation flag has been set on the parser.
pub fn parse_with_thread_local(
    text: &str,
    old_tree: Option<&Tree>,
) -> Result<Option<Tree>, LanguageError> {
    PARSER.with_borrow_mut(|slot| {
        let mut parser = match slot.take() {
            Some(parser) => parser,
            None => new_parser()?,
        };
        let tree = parser.parse(text, old_tree);
        *slot = Some(parser);
        Ok(tree)
    })
}
