//! Line-oriented driver (Podfile, Gemfile, Gradle, shell scripts, pbxproj).

use super::{Driver, Outcome, read};
use crate::error::Result;
use crate::transform::{LinePatch, ObjectIdGenerator, SequentialIdGenerator};
use std::path::Path;

impl Driver {
    /// Applies a line patch. Xcode object IDs are seeded from the path.
    pub fn apply_text(&self, path: &Path, patch: &LinePatch) -> Result<Outcome> {
        let mut ids = SequentialIdGenerator::seeded(&path.to_string_lossy());
        self.apply_text_with(path, patch, &mut ids)
    }

    /// Applies a line patch with an explicit object-ID generator.
    pub fn apply_text_with(
        &self,
        path: &Path,
        patch: &LinePatch,
        ids: &mut dyn ObjectIdGenerator,
    ) -> Result<Outcome> {
        let text = read(path)?;
        match patch.is_applied(&text) {
            Ok(true) => {
                return Ok(self.already_configured(path, format!("already has: {}", patch.describe())));
            }
            Ok(false) => {}
            Err(err) => return Ok(self.fallback_for_error(path, &err, patch.instructions())),
        }
        match patch.apply(&text, ids) {
            Ok(patched) => Ok(self.finish(path, text, patched)),
            Err(err) => Ok(self.fallback_for_error(path, &err, patch.instructions())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackReason;
    use crate::locate::Anchor;
    use crate::transform::InsertLine;
    use tempfile::TempDir;

    #[test]
    fn test_missing_anchor_falls_back_with_the_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Gemfile");
        std::fs::write(&path, "# empty\n").unwrap();
        let patch = LinePatch::InsertLine(InsertLine {
            content: "gem 'fastlane-plugin-sentry'".to_string(),
            already: "fastlane-plugin-sentry".to_string(),
            anchors: vec![Anchor::last(r"^\s*gem\s")],
        });

        let outcome = Driver::new().quiet(true).apply_text(&path, &patch).unwrap();
        let fallback = outcome.fallback().unwrap();
        assert_eq!(fallback.reason, FallbackReason::LocatorMiss);
        assert_eq!(
            fallback.snippet.added_lines().collect::<Vec<_>>(),
            vec!["gem 'fastlane-plugin-sentry'"]
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# empty\n");
    }

    #[test]
    fn test_bad_detection_regex_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Podfile");
        std::fs::write(&path, "pod 'A'\n").unwrap();
        let patch = LinePatch::InsertLine(InsertLine {
            content: "pod 'Sentry'".to_string(),
            already: "(".to_string(),
            anchors: vec![Anchor::last(r"^\s*pod\s")],
        });
        let outcome = Driver::new().quiet(true).apply_text(&path, &patch).unwrap();
        assert_eq!(outcome.fallback().unwrap().reason, FallbackReason::TransformFailed);
    }
}
