//! Recipes for Cloudflare `wrangler` configuration.

use super::{Change, Recipe, RecipeParams};
use crate::jsonc;
use crate::lang::Dialect;
use crate::probe::{Signature, ValueShape};
use crate::transform::ConfigUpdate;
use crate::value::ConfigValue;
use regex::Regex;
use std::path::Path;

const VERSION_BINDING: &str = "CF_VERSION_METADATA";

fn updates() -> Vec<ConfigUpdate> {
    vec![
        ConfigUpdate::union("compatibility_flags", ConfigValue::strings(["nodejs_als"])),
        ConfigUpdate::overwrite("upload_source_maps", true.into()),
        ConfigUpdate::deep_merge(
            "version_metadata",
            ConfigValue::object([("binding", ConfigValue::string(VERSION_BINDING))]),
        ),
    ]
}

/// Finds the worker entry module (`main`) in a wrangler config.
pub fn wrangler_main_entry(text: &str, dialect: Dialect) -> Option<String> {
    match dialect {
        Dialect::Toml => {
            let re = Regex::new(r#"(?m)^\s*main\s*=\s*["']([^"']+)["']"#).ok()?;
            re.captures(text).map(|c| c[1].to_string())
        }
        Dialect::Json | Dialect::Jsonc => {
            let root = jsonc::parse(text).ok()?;
            match root.as_object()?.get("main")?.to_value() {
                serde_json::Value::String(main) => Some(main),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Enables the flags and bindings the Sentry SDK needs in `wrangler.json(c)`.
pub struct WranglerJsonc;

impl Recipe for WranglerJsonc {
    fn name(&self) -> &str {
        "wrangler-jsonc"
    }

    fn description(&self) -> &str {
        "Enable nodejs_als, source map upload and version metadata in wrangler.jsonc"
    }

    fn default_path(&self) -> &str {
        "wrangler.jsonc"
    }

    fn signatures(&self, _params: &RecipeParams) -> Vec<Signature> {
        vec![
            Signature::config_key(
                ["compatibility_flags"],
                ValueShape::ContainsAll(vec![ConfigValue::string("nodejs_als")]),
            ),
            Signature::config_key(["upload_source_maps"], ValueShape::Equals(true.into())),
            Signature::config_key(
                ["version_metadata", "binding"],
                ValueShape::Equals(ConfigValue::string(VERSION_BINDING)),
            ),
        ]
    }

    fn change(&self, _path: &Path, _params: &RecipeParams) -> Change {
        Change::Config(updates())
    }
}

/// The same settings for `wrangler.toml`, which is never rewritten: unless
/// the file already has them, the driver prints the TOML to paste instead.
pub struct WranglerToml;

impl Recipe for WranglerToml {
    fn name(&self) -> &str {
        "wrangler-toml"
    }

    fn description(&self) -> &str {
        "Show the wrangler.toml settings the Sentry SDK needs"
    }

    fn default_path(&self) -> &str {
        "wrangler.toml"
    }

    fn signatures(&self, _params: &RecipeParams) -> Vec<Signature> {
        vec![
            Signature::matches(r#"(?m)^\s*compatibility_flags\s*=.*["']nodejs_als["']"#),
            Signature::matches(r"(?m)^\s*upload_source_maps\s*=\s*true\b"),
            Signature::matches(r"(?m)^\s*\[version_metadata\]"),
        ]
    }

    fn change(&self, _path: &Path, _params: &RecipeParams) -> Change {
        Change::Config(updates())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Driver;
    use crate::fallback::FallbackReason;
    use tempfile::TempDir;

    #[test]
    fn test_main_entry() {
        assert_eq!(
            wrangler_main_entry("name = \"w\"\nmain = \"src/index.ts\"\n", Dialect::Toml).as_deref(),
            Some("src/index.ts")
        );
        assert_eq!(
            wrangler_main_entry("{\n  // entry\n  \"main\": \"src/worker.js\",\n}", Dialect::Jsonc).as_deref(),
            Some("src/worker.js")
        );
        assert_eq!(wrangler_main_entry("{}", Dialect::Json), None);
        assert_eq!(wrangler_main_entry("main = 1", Dialect::Toml), None);
    }

    #[test]
    fn test_toml_recipe_falls_back_and_probes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wrangler.toml");
        let original = "name = \"w\"\nmain = \"src/index.ts\"\n";
        std::fs::write(&path, original).unwrap();

        let params = RecipeParams::default();
        let outcome = WranglerToml.run(&Driver::new().quiet(true), &path, &params).unwrap();
        assert_eq!(outcome.fallback().unwrap().reason, FallbackReason::Unsupported);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
        assert!(!WranglerToml.probe(&path, &params).unwrap().configured);

        std::fs::write(
            &path,
            "compatibility_flags = [\"nodejs_als\"]\nupload_source_maps = true\n\n[version_metadata]\nbinding = \"CF_VERSION_METADATA\"\n",
        )
        .unwrap();
        assert!(WranglerToml.probe(&path, &params).unwrap().configured);
        let outcome = WranglerToml.run(&Driver::new().quiet(true), &path, &params).unwrap();
        assert!(outcome.is_already_configured());
    }

    #[test]
    fn test_jsonc_recipe_probe() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wrangler.jsonc");
        std::fs::write(&path, "{\n  \"compatibility_flags\": [\"nodejs_compat\"]\n}\n").unwrap();

        let params = RecipeParams::default();
        assert!(!WranglerJsonc.probe(&path, &params).unwrap().configured);
        assert!(WranglerJsonc.run(&Driver::new().quiet(true), &path, &params).unwrap().is_applied());
        assert!(WranglerJsonc.probe(&path, &params).unwrap().configured);
    }
}
