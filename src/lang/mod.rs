//! Dialect detection and tree-sitter language support.

mod typescript;

pub use typescript::{Tsx, TypeScript};

use crate::error::{PatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tree_sitter::{Language as TsLanguage, Parser, Query, Tree};

/// The syntax family of a file, decided from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    JavaScript,
    TypeScript,
    Tsx,
    Json,
    Jsonc,
    /// Detected read-only; never rewritten structurally.
    Toml,
    /// Gradle, Podfile, Gemfile, shell scripts and Xcode project text.
    LineOriented,
}

impl Dialect {
    /// Detects the dialect from a file path.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("js" | "jsx" | "mjs" | "cjs") => Dialect::JavaScript,
            Some("ts" | "mts" | "cts") => Dialect::TypeScript,
            Some("tsx") => Dialect::Tsx,
            Some("json") => Dialect::Json,
            Some("jsonc" | "json5") => Dialect::Jsonc,
            Some("toml") => Dialect::Toml,
            _ => Dialect::LineOriented,
        }
    }

    /// Returns true for dialects parsed with tree-sitter.
    pub fn is_code(self) -> bool {
        matches!(self, Dialect::JavaScript | Dialect::TypeScript | Dialect::Tsx)
    }

    /// Returns true for JSON and JSONC.
    pub fn is_json(self) -> bool {
        matches!(self, Dialect::Json | Dialect::Jsonc)
    }

    /// Returns the lowercase name of the dialect.
    pub fn name(self) -> &'static str {
        match self {
            Dialect::JavaScript => "javascript",
            Dialect::TypeScript => "typescript",
            Dialect::Tsx => "tsx",
            Dialect::Json => "json",
            Dialect::Jsonc => "jsonc",
            Dialect::Toml => "toml",
            Dialect::LineOriented => "text",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tree-sitter backed language.
pub trait Language: Send + Sync {
    /// Returns the name of the language.
    fn name(&self) -> &'static str;

    /// Returns the file extensions associated with this language.
    fn extensions(&self) -> &[&'static str];

    /// Returns the tree-sitter language grammar.
    fn grammar(&self) -> TsLanguage;

    /// Parses source code into a tree-sitter AST.
    fn parse(&self, source: &str, path: &Path) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar())
            .map_err(|e| PatchError::Parse {
                path: path.to_path_buf(),
                message: format!("Failed to set language: {e}"),
            })?;

        parser.parse(source, None).ok_or_else(|| PatchError::Parse {
            path: path.to_path_buf(),
            message: "Failed to parse source".to_string(),
        })
    }

    /// Creates a tree-sitter query for this language.
    fn query(&self, pattern: &str) -> Result<Query> {
        Ok(Query::new(&self.grammar(), pattern)?)
    }

    /// Checks if this language handles the given file extension.
    fn matches_extension(&self, ext: &str) -> bool {
        self.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Registry of tree-sitter languages.
#[derive(Default)]
pub struct LanguageRegistry {
    languages: Vec<Box<dyn Language>>,
}

impl LanguageRegistry {
    /// Creates a new registry with all built-in languages.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(Box::new(TypeScript));
        registry.register(Box::new(Tsx));
        registry
    }

    /// Registers a new language.
    pub fn register(&mut self, lang: Box<dyn Language>) {
        self.languages.push(lang);
    }

    /// Finds a language by file extension.
    pub fn by_extension(&self, ext: &str) -> Option<&dyn Language> {
        self.languages
            .iter()
            .find(|l| l.matches_extension(ext))
            .map(|l| l.as_ref())
    }

    /// Finds the language used to parse a code dialect.
    pub fn for_dialect(&self, dialect: Dialect) -> Option<&dyn Language> {
        let name = match dialect {
            Dialect::TypeScript => "typescript",
            Dialect::JavaScript | Dialect::Tsx => "tsx",
            _ => return None,
        };
        self.languages
            .iter()
            .find(|l| l.name() == name)
            .map(|l| l.as_ref())
    }

    /// Detects the language for a given file path.
    pub fn detect(&self, path: &Path) -> Option<&dyn Language> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_extension(ext))
    }

    /// Returns all registered languages.
    pub fn all(&self) -> &[Box<dyn Language>] {
        &self.languages
    }
}
