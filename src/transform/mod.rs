//! Mutators: pure `(document, patch) -> document` transformations.
//!
//! Every mutator works by computing byte-range [`TextEdit`]s against the
//! original text and splicing them in. Nothing is re-printed from a tree, so
//! bytes outside the edited ranges are never touched.

pub mod js;
pub mod json;
pub mod lines;
pub(crate) mod merge;
pub mod patch;
pub mod xcode;

pub use lines::{GradlePlugin, InsertLine, LinePatch};
pub use patch::{
    ArraySpec, ArrayTarget, ConfigUpdate, ElementMatch, ImportBinding, ImportSpec, MergeStrategy,
    ModuleStyle, Patch, PropertySpec, WrapMode, WrapSpec,
};
pub use xcode::{BuildPhaseSpec, ObjectIdGenerator, SequentialIdGenerator};

use crate::document::SourceDocument;
use crate::error::{PatchError, Result};
use crate::value::RenderStyle;
use serde::Serialize;
use std::io::Write as _;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Replaces a byte range of the source with new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub text: String,
}

impl TextEdit {
    /// Inserts text at an offset.
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            range: at..at,
            text: text.into(),
        }
    }

    /// Replaces a range.
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// Rewrites the line breaks of the inserted text to `eol`.
    pub fn with_line_ending(mut self, eol: &str) -> Self {
        if eol != "\n" && self.text.contains('\n') {
            self.text = self.text.replace("\r\n", "\n").replace('\n', eol);
        }
        self
    }
}

/// Splices edits into the source.
///
/// Edits are ordered by position. Inserts at the same offset keep the order
/// they were given in. Overlapping replacements are rejected.
pub fn apply_edits(source: &str, mut edits: Vec<TextEdit>) -> Result<String> {
    edits.sort_by_key(|e| (e.range.start, e.range.end));

    for pair in edits.windows(2) {
        if pair[0].range.end > pair[1].range.start {
            return Err(PatchError::TransformFailed {
                message: format!(
                    "overlapping edits at {:?} and {:?}",
                    pair[0].range, pair[1].range
                ),
            });
        }
    }
    if let Some(last) = edits.last() {
        if last.range.end > source.len() {
            return Err(PatchError::TransformFailed {
                message: format!("edit {:?} is past the end of the source", last.range),
            });
        }
    }

    let mut result = source.to_string();
    // Apply in reverse so earlier offsets stay valid.
    for edit in edits.iter().rev() {
        if !result.is_char_boundary(edit.range.start) || !result.is_char_boundary(edit.range.end) {
            return Err(PatchError::TransformFailed {
                message: format!("edit {:?} splits a character", edit.range),
            });
        }
        result.replace_range(edit.range.clone(), &edit.text);
    }
    Ok(result)
}

/// A change to a parsed document.
pub trait Transform: Send + Sync {
    /// Applies the change. An already-applied change returns the document
    /// unchanged.
    fn apply(&self, doc: &SourceDocument) -> Result<SourceDocument>;

    /// Returns a description of the change.
    fn describe(&self) -> String;

    /// Returns the lines a user would add by hand to make this change.
    fn instructions(&self, doc: &SourceDocument) -> Vec<String>;
}

impl Transform for Patch {
    fn apply(&self, doc: &SourceDocument) -> Result<SourceDocument> {
        if doc.dialect().is_json() {
            return match self {
                Patch::SetOrMergeProperty(spec) => json::set_property(doc, spec),
                other => Err(PatchError::UnsupportedDialect(format!(
                    "{} cannot be applied to {}",
                    other.describe(),
                    doc.dialect()
                ))),
            };
        }
        match self {
            Patch::AddImport(spec) => js::add_import(doc, spec),
            Patch::WrapDefaultExport(spec) => js::wrap_default_export(doc, spec),
            Patch::AddArrayElement(spec) => js::add_array_element(doc, spec),
            Patch::SetOrMergeProperty(spec) => js::set_or_merge_property(doc, spec),
        }
    }

    fn describe(&self) -> String {
        match self {
            Patch::AddImport(spec) => match spec.binding.local_name() {
                Some(name) => format!("import {name} from '{}'", spec.module),
                None => format!("import '{}'", spec.module),
            },
            Patch::WrapDefaultExport(spec) => format!("wrap the default export with {}()", spec.callee),
            Patch::AddArrayElement(spec) => match &spec.target {
                ArrayTarget::DefaultExport => "add elements to the exported array".to_string(),
                ArrayTarget::Property(path) => format!("add elements to `{}`", path.join(".")),
            },
            Patch::SetOrMergeProperty(spec) => {
                let mut path = spec.path.clone();
                path.push(spec.key.clone());
                format!("set `{}` ({:?})", path.join("."), spec.strategy)
            }
        }
    }

    fn instructions(&self, doc: &SourceDocument) -> Vec<String> {
        let style = if doc.dialect().is_json() {
            RenderStyle::json()
        } else {
            RenderStyle::javascript('\'')
        };
        let text = match self {
            Patch::AddImport(spec) => js::import_statement(spec, true, '\'', true),
            Patch::WrapDefaultExport(spec) => {
                js::render_call(spec, "<your existing export>", &style, "")
            }
            Patch::AddArrayElement(spec) => {
                let items: Vec<String> = spec
                    .elements
                    .iter()
                    .map(|e| format!("{},", e.render(&style, "")))
                    .collect();
                items.join("\n")
            }
            Patch::SetOrMergeProperty(spec) => {
                let member = style.member(&spec.key, &spec.value, "");
                spec.path.iter().rev().fold(member, |inner, segment| {
                    let nested: String = inner.lines().map(|l| format!("\n  {l}")).collect();
                    format!("{}: {{{nested}\n}}", style.key(segment))
                })
            }
        };
        text.lines().map(str::to_string).collect()
    }
}

/// Chains transformations; each sees the previous one's output.
#[derive(Default)]
pub struct TransformBuilder {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a patch.
    pub fn patch(mut self, patch: Patch) -> Self {
        self.transforms.push(Box::new(patch));
        self
    }

    /// Adds several patches in order.
    pub fn patches(mut self, patches: impl IntoIterator<Item = Patch>) -> Self {
        for patch in patches {
            self.transforms.push(Box::new(patch));
        }
        self
    }

    /// Adds a custom transformation.
    pub fn custom<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    /// Applies all transformations in order.
    pub fn apply(&self, doc: &SourceDocument) -> Result<SourceDocument> {
        let mut current = doc.clone();
        for transform in &self.transforms {
            current = transform.apply(&current)?;
        }
        Ok(current)
    }

    /// Returns descriptions of all transformations.
    pub fn describe(&self) -> Vec<String> {
        self.transforms.iter().map(|t| t.describe()).collect()
    }

    /// Returns the combined manual instructions, one blank line between
    /// transformations.
    pub fn instructions(&self, doc: &SourceDocument) -> Vec<String> {
        let mut lines = Vec::new();
        for transform in &self.transforms {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(transform.instructions(doc));
        }
        lines
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// A computed change to one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileChange {
    pub path: PathBuf,
    pub original: String,
    pub transformed: String,
}

impl FileChange {
    pub fn new(path: impl Into<PathBuf>, original: impl Into<String>, transformed: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            original: original.into(),
            transformed: transformed.into(),
        }
    }

    /// Returns true if the content was modified.
    pub fn is_modified(&self) -> bool {
        self.original != self.transformed
    }

    /// Returns the unified diff of the change.
    pub fn diff(&self) -> String {
        crate::diff::unified_diff(&self.original, &self.transformed, &self.path)
    }

    /// Writes the transformed content to disk.
    ///
    /// The content goes to a temporary file in the same directory which is
    /// then renamed over the target, so the target is either fully old or
    /// fully new.
    pub fn write(&self) -> Result<()> {
        if !self.is_modified() {
            return Ok(());
        }
        write_atomic(&self.path, &self.transformed)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let wrap = |source: std::io::Error| PatchError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(wrap)?;
    tmp.write_all(contents.as_bytes()).map_err(wrap)?;
    tmp.as_file().sync_all().map_err(wrap)?;
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions()).map_err(wrap)?;
    }
    tmp.persist(path).map_err(|e| wrap(e.error))?;
    Ok(())
}
