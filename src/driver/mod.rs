//! File-kind drivers: load, probe, locate, mutate, print and write one file.
//!
//! ```text
//! Start -> Loaded -> Probed -> AlreadyConfigured
//!                           -> Located -> Mutated -> Printed -> Written
//!                           -> (parse, locator or write failure) -> FallbackShown
//! ```
//!
//! Every failure after the file was read ends in [`Outcome::FallbackShown`]
//! and leaves the file untouched. Only a failure to read the file is an
//! `Err`.

mod code;
mod config;
mod text;

pub use config::toml_instructions;

use crate::error::{PatchError, Result};
use crate::fallback::{Fallback, FallbackReason, FallbackSnippet};
use crate::probe::{ProbeResult, Signature, probe_file};
use crate::transform::{ConfigUpdate, FileChange, LinePatch, Patch};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What happened to a file.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The change was written (or, in dry-run mode, computed).
    Applied(FileChange),
    /// The change is already present; the file was not touched.
    AlreadyConfigured { reason: String },
    /// The change could not be made safely; instructions were shown.
    FallbackShown(Fallback),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn is_already_configured(&self) -> bool {
        matches!(self, Outcome::AlreadyConfigured { .. })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::FallbackShown(_))
    }

    /// Short name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Applied(_) => "applied",
            Outcome::AlreadyConfigured { .. } => "already_configured",
            Outcome::FallbackShown(_) => "fallback",
        }
    }

    pub fn change(&self) -> Option<&FileChange> {
        match self {
            Outcome::Applied(change) => Some(change),
            _ => None,
        }
    }

    pub fn fallback(&self) -> Option<&Fallback> {
        match self {
            Outcome::FallbackShown(fallback) => Some(fallback),
            _ => None,
        }
    }
}

/// Runs file operations with shared options.
#[derive(Debug, Clone)]
pub struct Driver {
    dry_run: bool,
    color: bool,
    quiet: bool,
}

impl Default for Driver {
    fn default() -> Self {
        Self {
            dry_run: false,
            color: true,
            quiet: false,
        }
    }
}

impl Driver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes changes without writing them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Colors fallback snippets with ANSI codes.
    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Suppresses printing fallbacks to stderr. They are still returned.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn already_configured(&self, path: &Path, reason: impl Into<String>) -> Outcome {
        let reason = reason.into();
        info!(path = %path.display(), %reason, "already configured");
        Outcome::AlreadyConfigured { reason }
    }

    /// Builds, logs and prints a fallback.
    fn fallback(
        &self,
        path: &Path,
        reason: FallbackReason,
        message: impl Into<String>,
        snippet: FallbackSnippet,
    ) -> Outcome {
        let fallback = Fallback {
            path: path.to_path_buf(),
            reason,
            message: message.into(),
            snippet,
        };
        warn!(path = %path.display(), reason = ?reason, message = %fallback.message, "falling back to manual instructions");
        if !self.quiet {
            eprintln!("{}", fallback.render(self.color));
        }
        Outcome::FallbackShown(fallback)
    }

    fn fallback_for_error(&self, path: &Path, err: &PatchError, instructions: Vec<String>) -> Outcome {
        self.fallback(
            path,
            FallbackReason::for_error(err),
            err.to_string(),
            FallbackSnippet::added(instructions),
        )
    }

    /// Writes (or, in dry-run mode, only reports) a computed change.
    fn finish(&self, path: &Path, original: String, transformed: String) -> Outcome {
        if original == transformed {
            return self.already_configured(path, "no changes needed");
        }
        let change = FileChange::new(path, original, transformed);
        if self.dry_run {
            info!(path = %path.display(), "dry run, not writing");
            return Outcome::Applied(change);
        }
        match change.write() {
            Ok(()) => {
                info!(path = %path.display(), "updated");
                Outcome::Applied(change)
            }
            Err(err) => self.fallback(
                path,
                FallbackReason::WriteFailed,
                err.to_string(),
                FallbackSnippet::from_diff(&change.original, &change.transformed),
            ),
        }
    }
}

fn read(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

/// Applies JS/TS patches to a module, unless all signatures already match.
pub fn apply_code_mutation(
    path: impl Into<PathBuf>,
    patches: &[Patch],
    signatures: &[Signature],
) -> Result<Outcome> {
    Driver::new().apply_code(&path.into(), patches, signatures)
}

/// Applies ordered updates to a JSON/JSONC config. TOML gets instructions.
pub fn apply_config_mutation(path: impl Into<PathBuf>, updates: &[ConfigUpdate]) -> Result<Outcome> {
    Driver::new().apply_config(&path.into(), updates)
}

/// Applies a line-oriented patch.
pub fn apply_text_mutation(path: impl Into<PathBuf>, patch: &LinePatch) -> Result<Outcome> {
    Driver::new().apply_text(&path.into(), patch)
}

/// Probes a file without changing it.
pub fn probe(path: impl Into<PathBuf>, signatures: &[Signature]) -> Result<ProbeResult> {
    probe_file(&path.into(), signatures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_failure_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("next.config.js");
        assert!(apply_code_mutation(&missing, &[], &[]).is_err());
        assert!(probe(&missing, &[]).is_err());
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Podfile");
        std::fs::write(&path, "pod 'A'\n").unwrap();
        let patch = LinePatch::InsertLine(crate::transform::InsertLine {
            content: "pod 'Sentry'".to_string(),
            already: "pod 'Sentry'".to_string(),
            anchors: vec![crate::locate::Anchor::last(r"^\s*pod\s")],
        });
        let outcome = Driver::new().dry_run(true).apply_text(&path, &patch).unwrap();
        assert!(outcome.is_applied());
        assert!(outcome.change().unwrap().diff().contains("+pod 'Sentry'"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "pod 'A'\n");
    }

    #[test]
    fn test_write_failure_falls_back_with_diff() {
        let driver = Driver::new().quiet(true);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone").join("Podfile");
        let outcome = driver.finish(&path, "a\n".to_string(), "a\nb\n".to_string());
        let fallback = outcome.fallback().unwrap();
        assert_eq!(fallback.reason, FallbackReason::WriteFailed);
        assert_eq!(fallback.snippet.added_lines().collect::<Vec<_>>(), vec!["b"]);
    }
}
