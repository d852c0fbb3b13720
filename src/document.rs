//! Parsed source documents.
//!
//! A [`SourceDocument`] owns the raw text of one file together with its
//! parsed tree. Trees only ever point into the text they were parsed from,
//! so printing an unmodified document returns the original bytes.

use crate::error::{PatchError, Result};
use crate::jsonc::{self, JsonNode};
use crate::lang::{Dialect, LanguageRegistry};
use crate::syntax::line_ending;
use crate::transform::TextEdit;
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::Tree;

/// The parsed representation of a document.
#[derive(Debug, Clone)]
pub enum SyntaxTree {
    Code(Tree),
    Json(JsonNode),
}

/// One file's text, dialect and tree.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    text: String,
    dialect: Dialect,
    tree: Option<SyntaxTree>,
}

impl SourceDocument {
    /// Parses text for the dialect implied by `path`.
    ///
    /// TOML and line-oriented files are accepted without a tree.
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let dialect = Dialect::from_path(&path);
        Self::parse_as(path, text, dialect)
    }

    /// Parses text with an explicit dialect.
    pub fn parse_as(path: impl Into<PathBuf>, text: impl Into<String>, dialect: Dialect) -> Result<Self> {
        let path = path.into();
        let text = text.into();
        let tree = parse_tree(&path, &text, dialect)?;
        Ok(Self {
            path,
            text,
            dialect,
            tree,
        })
    }

    /// Reads and parses a file. The file handle does not outlive the call.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(path, text)
    }

    /// Wraps text without parsing it (used for line-oriented files and for
    /// probing files that failed to parse).
    pub fn unparsed(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        let dialect = Dialect::from_path(&path);
        Self {
            path,
            text: text.into(),
            dialect,
            tree: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn tree(&self) -> Option<&SyntaxTree> {
        self.tree.as_ref()
    }

    /// Returns the tree-sitter tree of a code document.
    pub fn code_tree(&self) -> Option<&Tree> {
        match &self.tree {
            Some(SyntaxTree::Code(tree)) => Some(tree),
            _ => None,
        }
    }

    /// Returns the root node of a JSON document.
    pub fn json_root(&self) -> Option<&JsonNode> {
        match &self.tree {
            Some(SyntaxTree::Json(root)) => Some(root),
            _ => None,
        }
    }

    /// Serializes the document. For an unmodified document this is the
    /// original text.
    pub fn print(&self) -> &str {
        &self.text
    }

    /// Splices edits into the text and re-parses the result.
    ///
    /// Inserted text takes the document's line ending. A result that no
    /// longer parses is rejected, so a mutator can never hand a broken file
    /// to the writer.
    pub fn with_edits(&self, edits: Vec<TextEdit>) -> Result<SourceDocument> {
        if edits.is_empty() {
            return Ok(self.clone());
        }
        let eol = line_ending(&self.text);
        let edits = edits.into_iter().map(|e| e.with_line_ending(eol)).collect();
        let text = crate::transform::apply_edits(&self.text, edits)?;
        let tree = parse_tree(&self.path, &text, self.dialect).map_err(|e| {
            PatchError::TransformFailed {
                message: format!("edited {} no longer parses: {e}", self.path.display()),
            }
        })?;
        Ok(SourceDocument {
            path: self.path.clone(),
            text,
            dialect: self.dialect,
            tree,
        })
    }
}

fn parse_tree(path: &Path, text: &str, dialect: Dialect) -> Result<Option<SyntaxTree>> {
    match dialect {
        Dialect::JavaScript | Dialect::TypeScript | Dialect::Tsx => {
            let registry = LanguageRegistry::new();
            let lang = registry
                .for_dialect(dialect)
                .ok_or_else(|| PatchError::UnsupportedDialect(dialect.to_string()))?;
            let tree = lang.parse(text, path)?;
            let root = tree.root_node();
            if root.has_error() {
                return Err(PatchError::Parse {
                    path: path.to_path_buf(),
                    message: first_error_message(&tree),
                });
            }
            Ok(Some(SyntaxTree::Code(tree)))
        }
        Dialect::Json | Dialect::Jsonc => {
            let root = jsonc::parse(text).map_err(|e| PatchError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            Ok(Some(SyntaxTree::Json(root)))
        }
        Dialect::Toml | Dialect::LineOriented => Ok(None),
    }
}

fn first_error_message(tree: &Tree) -> String {
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            return format!("syntax error at line {}, column {}", pos.row + 1, pos.column + 1);
        }
        // Descend only into subtrees that contain the error.
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return "syntax error".to_string();
            }
        }
    }
}
