//! Diff generation for previewing changes.

use similar::{ChangeTag, TextDiff};
use std::fmt;
use std::path::Path;

// ANSI color codes
pub(crate) const RED: &str = "\x1b[31m";
pub(crate) const GREEN: &str = "\x1b[32m";
pub(crate) const CYAN: &str = "\x1b[36m";
pub(crate) const RESET: &str = "\x1b[0m";

fn render(original: &str, modified: &str, path: &Path, color: bool) -> String {
    let diff = TextDiff::from_lines(original, modified);
    let paint = |code: &'static str| if color { code } else { "" };
    let mut output = String::new();

    output.push_str(&format!("{}--- a/{}{}\n", paint(CYAN), path.display(), paint(RESET)));
    output.push_str(&format!("{}+++ b/{}{}\n", paint(CYAN), path.display(), paint(RESET)));

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            output.push_str("...\n");
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let (sign, code) = match change.tag() {
                    ChangeTag::Delete => ("-", RED),
                    ChangeTag::Insert => ("+", GREEN),
                    ChangeTag::Equal => (" ", ""),
                };
                let value = change.value();
                let newline = if value.ends_with('\n') { "" } else { "\n" };
                if code.is_empty() || !color {
                    output.push_str(&format!("{sign}{value}{newline}"));
                } else {
                    output.push_str(&format!(
                        "{code}{sign}{}{RESET}\n",
                        value.trim_end_matches('\n')
                    ));
                }
            }
        }
    }

    output
}

/// Generates a unified diff between two strings.
pub fn unified_diff(original: &str, modified: &str, path: &Path) -> String {
    render(original, modified, path, false)
}

/// Colorized diff output for terminal display.
pub fn colorized_diff(original: &str, modified: &str, path: &Path) -> String {
    render(original, modified, path, true)
}

/// Represents a summary of changes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiffSummary {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    /// Creates a summary from original and modified content.
    pub fn from_diff(original: &str, modified: &str) -> Self {
        let diff = TextDiff::from_lines(original, modified);
        let mut insertions = 0;
        let mut deletions = 0;

        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => insertions += 1,
                ChangeTag::Delete => deletions += 1,
                ChangeTag::Equal => {}
            }
        }

        Self {
            files_changed: usize::from(insertions > 0 || deletions > 0),
            insertions,
            deletions,
        }
    }

    /// Combines two summaries.
    pub fn merge(&mut self, other: &DiffSummary) {
        self.files_changed += other.files_changed;
        self.insertions += other.insertions;
        self.deletions += other.deletions;
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) changed, {} insertions(+), {} deletions(-)",
            self.files_changed, self.insertions, self.deletions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_diff() {
        let diff = unified_diff("pod 'A'\n", "pod 'A'\npod 'Sentry'\n", Path::new("Podfile"));
        assert_eq!(diff, "--- a/Podfile\n+++ b/Podfile\n pod 'A'\n+pod 'Sentry'\n");
    }

    #[test]
    fn test_missing_final_newline_is_terminated() {
        let diff = unified_diff("a", "b", Path::new("x"));
        assert!(diff.ends_with("-a\n+b\n"));
    }

    #[test]
    fn test_colorized_diff_marks_additions() {
        let diff = colorized_diff("a\n", "a\nb\n", Path::new("x"));
        assert!(diff.contains(&format!("{GREEN}+b{RESET}\n")));
    }

    #[test]
    fn test_summary() {
        let mut total = DiffSummary::from_diff("a\nb\n", "a\nc\nd\n");
        assert_eq!(total.insertions, 2);
        assert_eq!(total.deletions, 1);
        total.merge(&DiffSummary::from_diff("x\n", "x\n"));
        assert_eq!(total.to_string(), "1 file(s) changed, 2 insertions(+), 1 deletions(-)");
    }
}
