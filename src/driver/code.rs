//! JS/TS module driver.

use super::{Driver, Outcome, read};
use crate::document::SourceDocument;
use crate::error::Result;
use crate::probe::{Signature, has_integration};
use crate::transform::{Patch, TransformBuilder};
use std::path::Path;
use tracing::debug;

impl Driver {
    /// Probes, patches and writes one module.
    pub fn apply_code(&self, path: &Path, patches: &[Patch], signatures: &[Signature]) -> Result<Outcome> {
        let text = read(path)?;
        let builder = TransformBuilder::new().patches(patches.iter().cloned());

        let doc = match SourceDocument::parse(path, text.as_str()) {
            Ok(doc) => doc,
            Err(err) => {
                let unparsed = SourceDocument::unparsed(path, text);
                return Ok(self.fallback_for_error(path, &err, builder.instructions(&unparsed)));
            }
        };
        debug!(path = %path.display(), dialect = %doc.dialect(), "loaded");

        if !signatures.is_empty() {
            match has_integration(&doc, signatures) {
                Ok(result) if result.configured => {
                    return Ok(self.already_configured(path, result.reason.unwrap_or_default()));
                }
                Ok(result) => debug!(path = %path.display(), reason = ?result.reason, "probe"),
                Err(err) => return Ok(self.fallback_for_error(path, &err, builder.instructions(&doc))),
            }
        }

        match builder.apply(&doc) {
            Ok(patched) => Ok(self.finish(path, text, patched.print().to_string())),
            Err(err) => Ok(self.fallback_for_error(path, &err, builder.instructions(&doc))),
        }
    }
}
