//! JSON/JSONC config driver. TOML is detected but never rewritten.

use super::{Driver, Outcome, read};
use crate::document::SourceDocument;
use crate::error::Result;
use crate::fallback::{FallbackReason, FallbackSnippet};
use crate::lang::Dialect;
use crate::probe::{Signature, has_integration};
use crate::transform::json::apply_config_updates;
use crate::transform::{ConfigUpdate, Patch};
use crate::value::{ConfigValue, RenderStyle};
use std::path::Path;
use tracing::debug;

impl Driver {
    /// Applies ordered updates to a config file.
    ///
    /// JS/TS config modules are patched through their exported object.
    pub fn apply_config(&self, path: &Path, updates: &[ConfigUpdate]) -> Result<Outcome> {
        self.apply_config_probed(path, updates, &[])
    }

    /// Like [`Driver::apply_config`], but first returns `AlreadyConfigured`
    /// when every signature matches. TOML files are probed as text, so a
    /// configured one gets no fallback.
    pub fn apply_config_probed(
        &self,
        path: &Path,
        updates: &[ConfigUpdate],
        signatures: &[Signature],
    ) -> Result<Outcome> {
        let dialect = Dialect::from_path(path);
        match dialect {
            Dialect::Toml | Dialect::LineOriented => {
                // Read so that a missing file is still an error.
                let text = read(path)?;
                let snippet = if dialect == Dialect::Toml {
                    toml_instructions(updates)
                } else {
                    FallbackSnippet::added(json_instructions(updates))
                };
                if !signatures.is_empty() {
                    match has_integration(&SourceDocument::unparsed(path, text), signatures) {
                        Ok(result) if result.configured => {
                            return Ok(self.already_configured(path, result.reason.unwrap_or_default()));
                        }
                        Ok(_) => {}
                        Err(err) => {
                            let reason = FallbackReason::for_error(&err);
                            return Ok(self.fallback(path, reason, err.to_string(), snippet));
                        }
                    }
                }
                Ok(self.fallback(
                    path,
                    FallbackReason::Unsupported,
                    format!("{dialect} files are not rewritten"),
                    snippet,
                ))
            }
            d if d.is_code() => {
                let patches: Vec<Patch> = updates.iter().cloned().map(Patch::SetOrMergeProperty).collect();
                self.apply_code(path, &patches, signatures)
            }
            _ => {
                let text = read(path)?;
                let instructions = || json_instructions(updates);
                let doc = match SourceDocument::parse(path, text.as_str()) {
                    Ok(doc) => doc,
                    Err(err) => return Ok(self.fallback_for_error(path, &err, instructions())),
                };
                debug!(path = %path.display(), %dialect, updates = updates.len(), "loaded config");
                if !signatures.is_empty() {
                    match has_integration(&doc, signatures) {
                        Ok(result) if result.configured => {
                            return Ok(self.already_configured(path, result.reason.unwrap_or_default()));
                        }
                        Ok(_) => {}
                        Err(err) => return Ok(self.fallback_for_error(path, &err, instructions())),
                    }
                }
                match apply_config_updates(&doc, updates) {
                    Ok(patched) => Ok(self.finish(path, text, patched.print().to_string())),
                    Err(err) => Ok(self.fallback_for_error(path, &err, instructions())),
                }
            }
        }
    }
}

fn json_instructions(updates: &[ConfigUpdate]) -> Vec<String> {
    let style = RenderStyle::json();
    updates
        .iter()
        .flat_map(|u| {
            let mut member = style.member(&u.key, &u.value, "");
            for segment in u.path.iter().rev() {
                let nested: String = member.lines().map(|l| format!("\n  {l}")).collect();
                member = format!("{}: {{{nested}\n}}", style.key(segment));
            }
            member.push(',');
            member.lines().map(str::to_string).collect::<Vec<_>>()
        })
        .collect()
}

fn toml_value(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Null => "\"\"".to_string(),
        ConfigValue::Bool(b) => b.to_string(),
        ConfigValue::Number(n) => n.to_string(),
        ConfigValue::String(s) => RenderStyle::json().quote_string(s),
        ConfigValue::Raw(text) => text.clone(),
        ConfigValue::Array(items) => {
            let items: Vec<String> = items.iter().map(toml_value).collect();
            format!("[{}]", items.join(", "))
        }
        ConfigValue::Object(pairs) => {
            let pairs: Vec<String> = pairs
                .iter()
                .map(|(k, v)| format!("{} = {}", toml_key(k), toml_value(v)))
                .collect();
            format!("{{ {} }}", pairs.join(", "))
        }
    }
}

fn toml_key(key: &str) -> String {
    if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        key.to_string()
    } else {
        RenderStyle::json().quote_string(key)
    }
}

/// Renders config updates as TOML lines for a user to paste.
///
/// Object values become their own `[table]`; other values are plain
/// `key = value` lines under the table of their path.
pub fn toml_instructions(updates: &[ConfigUpdate]) -> FallbackSnippet {
    let mut root = Vec::new();
    let mut tables = Vec::new();
    for update in updates {
        let mut table_path: Vec<String> = update.path.iter().map(|s| toml_key(s)).collect();
        match &update.value {
            ConfigValue::Object(pairs) => {
                table_path.push(toml_key(&update.key));
                tables.push(String::new());
                tables.push(format!("[{}]", table_path.join(".")));
                for (k, v) in pairs {
                    tables.push(format!("{} = {}", toml_key(k), toml_value(v)));
                }
            }
            value if table_path.is_empty() => {
                root.push(format!("{} = {}", toml_key(&update.key), toml_value(value)));
            }
            value => {
                tables.push(String::new());
                tables.push(format!("[{}]", table_path.join(".")));
                tables.push(format!("{} = {}", toml_key(&update.key), toml_value(value)));
            }
        }
    }
    if root.is_empty() && tables.first().is_some_and(String::is_empty) {
        tables.remove(0);
    }
    root.extend(tables);
    FallbackSnippet::added(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn wrangler_updates() -> Vec<ConfigUpdate> {
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
    fn test_toml_instructions() {
        let snippet = toml_instructions(&wrangler_updates());
        assert_eq!(
            snippet.added_lines().collect::<Vec<_>>(),
            vec![
                "compatibility_flags = [\"nodejs_als\"]",
                "upload_source_maps = true",
                "",
                "[version_metadata]",
                "binding = \"CF_VERSION_METADATA\"",
            ]
        );
    }

    #[test]
    fn test_toml_always_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wrangler.toml");
        let original = "name = \"worker\"\nmain = \"src/index.ts\"\n";
        std::fs::write(&path, original).unwrap();

        let outcome = Driver::new().quiet(true).apply_config(&path, &wrangler_updates()).unwrap();
        assert_eq!(outcome.fallback().unwrap().reason, FallbackReason::Unsupported);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_jsonc_applied_then_already_configured() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wrangler.jsonc");
        std::fs::write(&path, "{\n  // worker\n  \"name\": \"w\",\n}\n").unwrap();

        let driver = Driver::new().quiet(true);
        assert!(driver.apply_config(&path, &wrangler_updates()).unwrap().is_applied());
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("// worker"));
        assert!(written.contains("\"upload_source_maps\": true,"));

        let again = driver.apply_config(&path, &wrangler_updates()).unwrap();
        assert!(again.is_already_configured());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), written);
    }

    #[test]
    fn test_broken_json_falls_back_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wrangler.json");
        std::fs::write(&path, "{ \"name\": ").unwrap();
        let outcome = Driver::new().quiet(true).apply_config(&path, &wrangler_updates()).unwrap();
        let fallback = outcome.fallback().unwrap();
        assert_eq!(fallback.reason, FallbackReason::ParseFailed);
        assert!(fallback.snippet.added_lines().any(|l| l == "\"upload_source_maps\": true,"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ \"name\": ");
    }
}
