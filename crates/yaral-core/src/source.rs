//! Source files and byte spans.

use std::ops::Range;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A span of source code, represented as byte offsets.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// A value paired with its source span.
pub type Spanned<T> = (T, Span);

/// A YARA-L source file known to the database.
#[salsa::input(debug)]
pub struct SourceFile {
    #[returns(ref)]
    pub path: PathBuf,
    #[returns(deref)]
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_from_range() {
        let span = Span::from(3..8);
        assert_eq!(span, Span::new(3, 8));
        assert_eq!(span.len(), 5);
        assert_eq!(span.range(), 3..8);
    }

    #[test]
    fn test_empty_span() {
        assert!(Span::new(4, 4).is_empty());
        assert_eq!(Span::new(5, 2).len(), 0);
    }

    #[test]
    fn test_source_file_fields() {
        let db = salsa::DatabaseImpl::default();
        let file = SourceFile::new(&db, PathBuf::from("rules/login.yaral"), "rule r {}".into());
        assert_eq!(file.path(&db), &PathBuf::from("rules/login.yaral"));
        assert_eq!(file.text(&db), "rule r {}");
    }
}
