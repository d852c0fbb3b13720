//! Tree-sitter query matching over an already-parsed document.

use crate::document::SourceDocument;
use crate::error::{PatchError, Result};
use crate::lang::LanguageRegistry;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Query, QueryCursor, Tree};

/// Match result containing the matched text and its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstMatch {
    pub text: String,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_row: usize,
    pub start_col: usize,
    pub capture_name: String,
}

/// AST-based matching using tree-sitter queries.
#[derive(Debug, Default, Clone)]
pub struct AstMatcher {
    queries: Vec<String>,
    capture_names: Vec<String>,
}

impl AstMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tree-sitter query pattern.
    ///
    /// Text predicates (`#eq?`, `#match?`) are honored:
    /// - `(import_statement source: (string) @source)` captures import sources
    /// - `(call_expression function: (identifier) @fn (#eq? @fn "require"))`
    pub fn query(mut self, pattern: impl Into<String>) -> Self {
        self.queries.push(pattern.into());
        self
    }

    /// Keeps only matches with the given capture name.
    pub fn capture(mut self, name: impl Into<String>) -> Self {
        self.capture_names.push(name.into());
        self
    }

    /// Finds all matches in a parsed code document. Documents without a
    /// code tree have no matches.
    pub fn find_matches(&self, doc: &SourceDocument) -> Result<Vec<AstMatch>> {
        let Some(tree) = doc.code_tree() else {
            return Ok(Vec::new());
        };
        let registry = LanguageRegistry::new();
        let lang = registry
            .for_dialect(doc.dialect())
            .ok_or_else(|| PatchError::UnsupportedDialect(doc.dialect().to_string()))?;

        let mut all_matches = Vec::new();
        for query_str in &self.queries {
            let query = lang.query(query_str)?;
            all_matches.extend(self.execute_query(&query, tree, doc.text()));
        }

        if !self.capture_names.is_empty() {
            all_matches.retain(|m| self.capture_names.contains(&m.capture_name));
        }
        Ok(all_matches)
    }

    fn execute_query(&self, query: &Query, tree: &Tree, source: &str) -> Vec<AstMatch> {
        let mut cursor = QueryCursor::new();
        let source_bytes = source.as_bytes();
        let mut matches = Vec::new();

        let mut query_matches = cursor.matches(query, tree.root_node(), source_bytes);
        while let Some(query_match) = query_matches.next() {
            for capture in query_match.captures {
                let node = capture.node;
                matches.push(AstMatch {
                    text: node.utf8_text(source_bytes).unwrap_or("").to_string(),
                    start_byte: node.start_byte(),
                    end_byte: node.end_byte(),
                    start_row: node.start_position().row,
                    start_col: node.start_position().column,
                    capture_name: query.capture_names()[capture.index as usize].to_string(),
                });
            }
        }
        matches
    }

    /// Returns true if the document contains any matches.
    pub fn has_matches(&self, doc: &SourceDocument) -> Result<bool> {
        Ok(!self.find_matches(doc)?.is_empty())
    }
}
