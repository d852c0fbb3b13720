//! Copy-paste instructions shown when a file cannot be patched safely.

use crate::diff::{GREEN, RED, RESET};
use crate::error::PatchError;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::fmt;
use std::path::PathBuf;

/// How a snippet line relates to the user's file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTag {
    Unchanged,
    Added,
    Removed,
}

impl LineTag {
    fn sign(self) -> char {
        match self {
            LineTag::Unchanged => ' ',
            LineTag::Added => '+',
            LineTag::Removed => '-',
        }
    }
}

/// An ordered list of tagged lines. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FallbackSnippet {
    lines: Vec<(LineTag, String)>,
}

impl FallbackSnippet {
    /// Builds a snippet from a line diff, keeping three lines of context
    /// around each change.
    pub fn from_diff(original: &str, proposed: &str) -> Self {
        let diff = TextDiff::from_lines(original, proposed);
        let mut lines = Vec::new();
        for group in diff.grouped_ops(3) {
            for op in group {
                for change in diff.iter_changes(&op) {
                    let tag = match change.tag() {
                        ChangeTag::Equal => LineTag::Unchanged,
                        ChangeTag::Insert => LineTag::Added,
                        ChangeTag::Delete => LineTag::Removed,
                    };
                    lines.push((tag, change.value().trim_end_matches(['\n', '\r']).to_string()));
                }
            }
        }
        Self { lines }
    }

    /// Builds a snippet of lines to add.
    pub fn added<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(|l| (LineTag::Added, l.into())).collect(),
        }
    }

    pub fn lines(&self) -> &[(LineTag, String)] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines the user has to add.
    pub fn added_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|(tag, _)| *tag == LineTag::Added)
            .map(|(_, line)| line.as_str())
    }

    /// Renders the snippet with `+`/`-` markers, optionally ANSI-colored.
    pub fn render(&self, color: bool) -> String {
        let mut out = String::new();
        for (tag, line) in &self.lines {
            let code = match tag {
                LineTag::Added if color => GREEN,
                LineTag::Removed if color => RED,
                _ => "",
            };
            let reset = if code.is_empty() { "" } else { RESET };
            out.push_str(&format!("{code}{} {line}{reset}\n", tag.sign()));
        }
        out
    }
}

impl fmt::Display for FallbackSnippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// Why a file was not patched automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    ParseFailed,
    LocatorMiss,
    TransformFailed,
    WriteFailed,
    Unsupported,
}

impl FallbackReason {
    /// Classifies an error raised while patching a file.
    pub fn for_error(err: &PatchError) -> Self {
        match err {
            PatchError::Parse { .. } => FallbackReason::ParseFailed,
            PatchError::LocatorMiss { .. } => FallbackReason::LocatorMiss,
            PatchError::Write { .. } => FallbackReason::WriteFailed,
            PatchError::UnsupportedDialect(_) => FallbackReason::Unsupported,
            _ => FallbackReason::TransformFailed,
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FallbackReason::ParseFailed => "could not parse the file",
            FallbackReason::LocatorMiss => "could not find where to make the change",
            FallbackReason::TransformFailed => "the change could not be applied safely",
            FallbackReason::WriteFailed => "could not write the file",
            FallbackReason::Unsupported => "this file type is not patched automatically",
        })
    }
}

/// Instructions for changing one file by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fallback {
    pub path: PathBuf,
    pub reason: FallbackReason,
    pub message: String,
    pub snippet: FallbackSnippet,
}

impl Fallback {
    /// Renders a header line followed by the snippet.
    pub fn render(&self, color: bool) -> String {
        format!(
            "Please update {} manually ({}: {}):\n\n{}",
            self.path.display(),
            self.reason,
            self.message,
            self.snippet.render(color)
        )
    }
}
