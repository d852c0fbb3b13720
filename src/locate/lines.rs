//! Regex-anchored locators for line-oriented files (Podfile, Gemfile,
//! Gradle, shell scripts).

use super::InsertionPoint;
use crate::error::Result;
use crate::syntax::line_indent;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which match of an anchor pattern to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occurrence {
    First,
    #[default]
    Last,
}

/// A line pattern to insert after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// Regex matched against each line (without its newline).
    pub pattern: String,
    #[serde(default)]
    pub occurrence: Occurrence,
}

impl Anchor {
    /// Anchors after the last line matching `pattern`.
    pub fn last(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            occurrence: Occurrence::Last,
        }
    }

    /// Anchors after the first line matching `pattern`.
    pub fn first(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            occurrence: Occurrence::First,
        }
    }
}

/// Tries anchors in precedence order and stops at the first that matches.
pub struct LineLocator {
    anchors: Vec<(Regex, Occurrence)>,
}

impl LineLocator {
    /// Compiles the anchor patterns.
    pub fn new(anchors: &[Anchor]) -> Result<Self> {
        let anchors = anchors
            .iter()
            .map(|a| Ok((Regex::new(&a.pattern)?, a.occurrence)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { anchors })
    }

    /// Finds the insertion point, or `None` when no anchor matches.
    pub fn locate<'d>(&self, text: &'d str) -> Option<InsertionPoint<'d>> {
        for (pattern, occurrence) in &self.anchors {
            let mut matches = lines(text).filter(|(_, line)| pattern.is_match(line));
            let found = match occurrence {
                Occurrence::First => matches.next(),
                Occurrence::Last => matches.last(),
            };
            if let Some((start, line)) = found {
                return Some(InsertionPoint::AfterLine {
                    end: start + line.len(),
                    indent: line_indent(text, start),
                });
            }
        }
        None
    }
}

/// Iterates lines with their start offsets; the line text excludes `\r\n`.
pub fn lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        (start, raw.trim_end_matches(['\n', '\r']))
    })
}

/// The body of a `name { ... }` block in Groovy/Kotlin build scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan<'d> {
    /// Offset of the opening `{`.
    pub open: usize,
    /// Offset of the matching `}`.
    pub close: usize,
    /// Indentation of the block's own line.
    pub indent: &'d str,
    /// Indentation of the first statement inside the block, if any.
    pub inner_indent: Option<&'d str>,
}

/// Finds the first top-level-looking `name {` block and its matching brace.
///
/// Braces inside string literals and comments are ignored.
pub fn find_block<'d>(text: &'d str, name: &str) -> Option<BlockSpan<'d>> {
    let pattern = Regex::new(&format!(r"(?m)^[ \t]*{}\s*\{{", regex::escape(name))).ok()?;
    let m = pattern.find(text)?;
    let open = m.end() - 1;
    let close = matching_brace(text, open)?;
    let inner_indent = lines(&text[open + 1..close])
        .map(|(start, line)| (open + 1 + start, line))
        .find(|(_, line)| !line.trim().is_empty() && !line.trim_start().starts_with('}'))
        .filter(|(start, _)| *start > open + 1 || text[..open + 1].ends_with('\n'))
        .map(|(start, _)| line_indent(text, start));
    Some(BlockSpan {
        open,
        close,
        indent: line_indent(text, m.start()),
        inner_indent,
    })
}

fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else {
            match b {
                b'"' | b'\'' => quote = Some(b),
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                    continue;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = text[i + 2..].find("*/").map(|end| i + 2 + end + 2)?;
                    continue;
                }
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}
