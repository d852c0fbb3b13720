//! Mutators for JSON/JSONC documents.

use super::merge::{Merger, ValueView, detect_indent_unit, detect_trailing_commas};
use super::patch::ConfigUpdate;
use crate::document::SourceDocument;
use crate::error::{PatchError, Result};
use crate::lang::Dialect;
use crate::value::RenderStyle;

fn json_style(doc: &SourceDocument) -> RenderStyle {
    // Strict JSON never gets trailing commas.
    let trailing = doc.dialect() == Dialect::Jsonc && detect_trailing_commas(doc.text());
    RenderStyle::json()
        .with_indent(detect_indent_unit(doc.text()))
        .with_trailing_commas(trailing)
}

/// Applies one update to the document's root object.
pub fn set_property(doc: &SourceDocument, update: &ConfigUpdate) -> Result<SourceDocument> {
    let root = doc
        .json_root()
        .ok_or_else(|| PatchError::UnsupportedDialect(doc.dialect().to_string()))?;
    let ValueView::Object(object) = ValueView::from_json(root, doc.text()) else {
        return Err(PatchError::locator_miss("root object"));
    };
    let mut merger = Merger::new(doc.text(), json_style(doc));
    merger.merge_at_path(&object, &update.path, &update.key, &update.value, update.strategy.into())?;
    doc.with_edits(merger.into_edits())
}

/// Applies updates in order, re-parsing between them.
pub fn apply_config_updates(doc: &SourceDocument, updates: &[ConfigUpdate]) -> Result<SourceDocument> {
    updates
        .iter()
        .try_fold(doc.clone(), |current, update| set_property(&current, update))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ConfigValue;

    const WRANGLER: &str = r#"/**
 * For more details on how to configure Wrangler, refer to:
 * https://developers.cloudflare.com/workers/wrangler/configuration/
 */
{
	"$schema": "node_modules/wrangler/config-schema.json",
	"name": "my-worker",
	"main": "src/index.ts",
	// Compatibility
	"compatibility_date": "2025-01-01",
	"compatibility_flags": ["nodejs_compat"],
}
"#;

    fn updates() -> Vec<ConfigUpdate> {
        vec![
            ConfigUpdate::union("compatibility_flags", ConfigValue::strings(["nodejs_als"])),
            ConfigUpdate::overwrite("upload_source_maps", true.into()),
            ConfigUpdate::deep_merge(
                "version_metadata",
                ConfigValue::object([("binding", ConfigValue::string("CF_VERSION_METADATA"))]),
            ),
        ]
    }

    #[test]
    fn test_wrangler_updates_preserve_comments_and_style() {
        let doc = SourceDocument::parse("wrangler.jsonc", WRANGLER).unwrap();
        let out = apply_config_updates(&doc, &updates()).unwrap();
        let expected = WRANGLER.replace(
            "\t\"compatibility_flags\": [\"nodejs_compat\"],\n}",
            "\t\"compatibility_flags\": [\"nodejs_compat\", \"nodejs_als\"],\n\t\"upload_source_maps\": true,\n\t\"version_metadata\": {\n\t\t\"binding\": \"CF_VERSION_METADATA\",\n\t},\n}",
        );
        assert_eq!(out.text(), expected);
        assert_eq!(apply_config_updates(&out, &updates()).unwrap().text(), out.text());
    }

    #[test]
    fn test_strict_json_never_gets_trailing_commas() {
        let src = "{\n  \"name\": \"w\"\n}\n";
        let doc = SourceDocument::parse("wrangler.json", src).unwrap();
        let out = apply_config_updates(&doc, &updates()).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.text()).unwrap();
        assert_eq!(value["compatibility_flags"], serde_json::json!(["nodejs_als"]));
        assert_eq!(value["version_metadata"]["binding"], "CF_VERSION_METADATA");
    }

    #[test]
    fn test_non_object_root_is_a_miss() {
        let doc = SourceDocument::parse("a.json", "[1, 2]").unwrap();
        let err = set_property(&doc, &updates()[1]).unwrap_err();
        assert!(matches!(err, PatchError::LocatorMiss { .. }));
    }
}
