//! "Is the integration already there?" checks.
//!
//! A document counts as configured only when every signature matches. An
//! empty signature set never matches, and AST signatures never match a
//! document that failed to parse.

pub mod query;

pub use query::{AstMatch, AstMatcher};

use crate::document::SourceDocument;
use crate::error::Result;
use crate::locate::{exported_object, named_object_property};
use crate::syntax::{named_children, text, unwrap_expression};
use crate::transform::js::detect_style;
use crate::value::{ConfigValue, ElementKey, normalize_source};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tree_sitter::Node;

const IMPORT_QUERIES: [&str; 3] = [
    "(import_statement source: (string) @source)",
    "(call_expression function: (identifier) @fn arguments: (arguments . (string) @source) (#eq? @fn \"require\"))",
    "(call_expression function: (import) arguments: (arguments . (string) @source))",
];

const CALL_QUERY: &str =
    "(call_expression function: [(identifier) (member_expression)] @callee)";

/// Expected shape of a config value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    #[default]
    Present,
    Equals(ConfigValue),
    /// An array holding every listed element.
    ContainsAll(Vec<ConfigValue>),
}

/// One piece of evidence that a change was already applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signature {
    /// The module is imported or required.
    ImportsModule { module: String },
    /// A call to the callee (`withSentryConfig`, `Sentry.init`) exists.
    CallsFunction { callee: String },
    /// The raw text contains a substring.
    Contains { text: String },
    /// The raw text matches a regex.
    Matches { pattern: String },
    /// A config key path holds a value of the expected shape.
    ConfigKey {
        path: Vec<String>,
        #[serde(default)]
        shape: ValueShape,
    },
}

impl Signature {
    pub fn imports(module: impl Into<String>) -> Self {
        Signature::ImportsModule {
            module: module.into(),
        }
    }

    pub fn calls(callee: impl Into<String>) -> Self {
        Signature::CallsFunction {
            callee: callee.into(),
        }
    }

    pub fn contains(text: impl Into<String>) -> Self {
        Signature::Contains { text: text.into() }
    }

    pub fn matches(pattern: impl Into<String>) -> Self {
        Signature::Matches {
            pattern: pattern.into(),
        }
    }

    pub fn config_key<S: Into<String>>(path: impl IntoIterator<Item = S>, shape: ValueShape) -> Self {
        Signature::ConfigKey {
            path: path.into_iter().map(Into::into).collect(),
            shape,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::ImportsModule { module } => write!(f, "imports {module}"),
            Signature::CallsFunction { callee } => write!(f, "calls {callee}()"),
            Signature::Contains { text } => write!(f, "contains `{text}`"),
            Signature::Matches { pattern } => write!(f, "matches /{pattern}/"),
            Signature::ConfigKey { path, .. } => write!(f, "sets `{}`", path.join(".")),
        }
    }
}

/// Result of a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub configured: bool,
    pub reason: Option<String>,
}

impl ProbeResult {
    fn configured(reason: String) -> Self {
        Self {
            configured: true,
            reason: Some(reason),
        }
    }

    fn missing(reason: String) -> Self {
        Self {
            configured: false,
            reason: Some(reason),
        }
    }
}

/// Checks whether all signatures match the document.
pub fn has_integration(doc: &SourceDocument, signatures: &[Signature]) -> Result<ProbeResult> {
    if signatures.is_empty() {
        return Ok(ProbeResult::missing("no signatures to check".to_string()));
    }
    for signature in signatures {
        if !signature_matches(doc, signature)? {
            return Ok(ProbeResult::missing(format!("missing: {signature}")));
        }
    }
    let found: Vec<String> = signatures.iter().map(ToString::to_string).collect();
    Ok(ProbeResult::configured(format!("found: {}", found.join(", "))))
}

/// Loads a file and probes it. An unparseable file is probed as raw text.
pub fn probe_file(path: &Path, signatures: &[Signature]) -> Result<ProbeResult> {
    let text = std::fs::read_to_string(path)?;
    let doc = match SourceDocument::parse(path, text.as_str()) {
        Ok(doc) => doc,
        Err(_) => SourceDocument::unparsed(path, text),
    };
    has_integration(&doc, signatures)
}

fn signature_matches(doc: &SourceDocument, signature: &Signature) -> Result<bool> {
    match signature {
        Signature::Contains { text } => Ok(doc.text().contains(text.as_str())),
        Signature::Matches { pattern } => Ok(Regex::new(pattern)?.is_match(doc.text())),
        Signature::ImportsModule { module } => {
            let mut matcher = AstMatcher::new().capture("source");
            for query in IMPORT_QUERIES {
                matcher = matcher.query(query);
            }
            Ok(matcher
                .find_matches(doc)?
                .iter()
                .any(|m| crate::value::unquote(&m.text).as_deref() == Some(module.as_str())))
        }
        Signature::CallsFunction { callee } => {
            let wanted = callee.replace(char::is_whitespace, "");
            Ok(AstMatcher::new()
                .query(CALL_QUERY)
                .find_matches(doc)?
                .iter()
                .any(|m| m.text.replace(char::is_whitespace, "") == wanted))
        }
        Signature::ConfigKey { path, shape } => Ok(config_key_matches(doc, path, shape)),
    }
}

fn config_key_matches(doc: &SourceDocument, path: &[String], shape: &ValueShape) -> bool {
    if let Some(root) = doc.json_root() {
        let Some(node) = root.pointer(path) else {
            return false;
        };
        let actual = node.to_value();
        return match shape {
            ValueShape::Present => true,
            ValueShape::Equals(expected) => actual == Value::from(expected.clone()),
            ValueShape::ContainsAll(items) => match actual {
                Value::Array(elements) => items
                    .iter()
                    .all(|item| elements.contains(&Value::from(item.clone()))),
                _ => false,
            },
        };
    }

    let Some(node) = code_value_at(doc, path) else {
        return false;
    };
    let source = doc.text();
    match shape {
        ValueShape::Present => true,
        ValueShape::Equals(expected) => {
            normalize_source(text(node, source))
                == normalize_source(&expected.render(&detect_style(doc), ""))
        }
        ValueShape::ContainsAll(items) => {
            if node.kind() != "array" {
                return false;
            }
            let keys: Vec<ElementKey> = named_children(node)
                .into_iter()
                .map(|e| ElementKey::from_source(text(e, source)))
                .collect();
            items.iter().all(|item| keys.contains(&item.element_key()))
        }
    }
}

fn code_value_at<'d>(doc: &'d SourceDocument, path: &[String]) -> Option<Node<'d>> {
    let source = doc.text();
    let mut current = exported_object(doc)?;
    for (i, key) in path.iter().enumerate() {
        let property = named_object_property(current, key, source)?;
        let value = unwrap_expression(property.child_by_field_name("value")?);
        if i + 1 == path.len() {
            return Some(value);
        }
        current = value;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str, src: &str) -> SourceDocument {
        SourceDocument::parse(path, src).unwrap()
    }

    #[test]
    fn test_all_signatures_must_match() {
        let d = doc(
            "next.config.js",
            "const { withSentryConfig } = require('@sentry/nextjs');\nmodule.exports = withSentryConfig({}, {});\n",
        );
        let both = [Signature::imports("@sentry/nextjs"), Signature::calls("withSentryConfig")];
        assert!(has_integration(&d, &both).unwrap().configured);

        let d = doc("next.config.js", "const { withSentryConfig } = require('@sentry/nextjs');\n");
        let result = has_integration(&d, &both).unwrap();
        assert!(!result.configured);
        assert_eq!(result.reason.as_deref(), Some("missing: calls withSentryConfig()"));
    }

    #[test]
    fn test_empty_signatures_never_match() {
        let d = doc("a.js", "export default {};\n");
        assert!(!has_integration(&d, &[]).unwrap().configured);
    }

    #[test]
    fn test_member_callee_and_dynamic_import() {
        let d = doc("a.ts", "const m = await import(\"@sentry/cloudflare\");\nexport default Sentry.withSentry(() => ({}), {});\n");
        assert!(has_integration(&d, &[Signature::imports("@sentry/cloudflare")]).unwrap().configured);
        assert!(has_integration(&d, &[Signature::calls("Sentry.withSentry")]).unwrap().configured);
        assert!(!has_integration(&d, &[Signature::calls("withSentry")]).unwrap().configured);
    }

    #[test]
    fn test_ast_signatures_ignore_unparsed_documents() {
        let d = SourceDocument::unparsed("a.js", "import x from '@sentry/nextjs'\n{{{");
        assert!(!has_integration(&d, &[Signature::imports("@sentry/nextjs")]).unwrap().configured);
        assert!(has_integration(&d, &[Signature::contains("@sentry/nextjs")]).unwrap().configured);
    }

    #[test]
    fn test_config_key_shapes_in_jsonc() {
        let d = doc(
            "wrangler.jsonc",
            "{\n  // flags\n  \"compatibility_flags\": [\"nodejs_compat\", \"nodejs_als\"],\n  \"upload_source_maps\": true,\n}",
        );
        let sigs = [
            Signature::config_key(["compatibility_flags"], ValueShape::ContainsAll(vec!["nodejs_als".into()])),
            Signature::config_key(["upload_source_maps"], ValueShape::Equals(true.into())),
        ];
        assert!(has_integration(&d, &sigs).unwrap().configured);
        let missing = [Signature::config_key(["version_metadata", "binding"], ValueShape::Present)];
        assert!(!has_integration(&d, &missing).unwrap().configured);
    }

    #[test]
    fn test_config_key_in_code() {
        let d = doc(
            "vite.config.ts",
            "export default defineConfig({\n  build: { sourcemap: true },\n  plugins: [react(), 'x'],\n});\n",
        );
        assert!(has_integration(
            &d,
            &[Signature::config_key(["build", "sourcemap"], ValueShape::Equals(true.into()))]
        )
        .unwrap()
        .configured);
        assert!(has_integration(
            &d,
            &[Signature::config_key(
                ["plugins"],
                ValueShape::ContainsAll(vec![ConfigValue::raw("react( )"), "x".into()])
            )]
        )
        .unwrap()
        .configured);
    }

    #[test]
    fn test_signature_yaml() {
        let sigs: Vec<Signature> = serde_yaml::from_str(
            "- type: imports_module\n  module: \"@sentry/vite-plugin\"\n- type: config_key\n  path: [build, sourcemap]\n  shape:\n    equals: true\n",
        )
        .unwrap();
        assert_eq!(sigs[0], Signature::imports("@sentry/vite-plugin"));
        assert_eq!(
            sigs[1],
            Signature::config_key(["build", "sourcemap"], ValueShape::Equals(true.into()))
        );
    }
}
