use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tree_sitter::{LanguageError, Tree};
use yaral_ast::parse_with_thread_local;
use yaral_core::SourceFile;

#[derive(Default, Clone)]
#[salsa::db]
pub struct YaralDatabaseImpl {
    storage: salsa::Storage<Self>,
    /// Loaded files, keyed by canonical path.
    files: Arc<DashMap<PathBuf, SourceFile>>,
}

#[salsa::db]
impl salsa::Database for YaralDatabaseImpl {}

impl YaralDatabaseImpl {
    /// Loads `path` once; later calls return the same input.
    pub fn input(
        &self,
        path: PathBuf,
    ) -> Result<SourceFile, Box<dyn std::error::Error + Send + Sync>> {
        let path = path.canonicalize()?;
        match self.files.entry(path) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let contents = std::fs::read_to_string(entry.key())?;
                tracing::debug!(path = %entry.key().display(), bytes = contents.len(), "loaded source file");
                let source_file = SourceFile::new(self, entry.key().clone(), contents);
                entry.insert(source_file);
                Ok(source_file)
            }
        }
    }

    /// Concrete syntax tree of a loaded file, parsed with this thread's parser.
    pub fn syntax_tree(&self, source: SourceFile) -> Result<Option<Tree>, LanguageError> {
        parse_with_thread_local(source.text(self), None)
    }

    pub fn source_file(&self, path: &std::path::Path) -> Option<SourceFile> {
        let path = path.canonicalize().ok()?;
        self.files.get(&path).map(|entry| *entry)
    }
}
