//! Values written into code and config files.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Key used in plan files to mark a verbatim JavaScript expression.
pub const RAW_EXPR_KEY: &str = "$expr";

/// An ordered JSON-like value that can also carry a verbatim expression.
///
/// `Raw` lets a patch place code such as `!process.env.CI` or
/// `sentryVitePlugin({...})` where a literal would otherwise go. In plan
/// files it is written as `{"$expr": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<ConfigValue>),
    Object(Vec<(String, ConfigValue)>),
    Raw(String),
}

impl ConfigValue {
    /// Creates a verbatim expression value.
    pub fn raw(expr: impl Into<String>) -> Self {
        ConfigValue::Raw(expr.into())
    }

    /// Creates a string value.
    pub fn string(s: impl Into<String>) -> Self {
        ConfigValue::String(s.into())
    }

    /// Creates an object from key/value pairs, keeping their order.
    pub fn object<K: Into<String>>(pairs: impl IntoIterator<Item = (K, ConfigValue)>) -> Self {
        ConfigValue::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Creates an array of strings.
    pub fn strings<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        ConfigValue::Array(items.into_iter().map(|s| ConfigValue::String(s.into())).collect())
    }

    pub fn is_object(&self) -> bool {
        matches!(self, ConfigValue::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ConfigValue::Array(_))
    }

    fn is_inline(&self) -> bool {
        match self {
            ConfigValue::Array(items) => items.is_empty(),
            ConfigValue::Object(pairs) => pairs.is_empty(),
            ConfigValue::Raw(text) => !text.contains('\n'),
            _ => true,
        }
    }

    /// Renders the value as source text.
    ///
    /// `indent` is the indentation of the line the value starts on; nested
    /// lines are indented one `style.indent_unit` deeper.
    pub fn render(&self, style: &RenderStyle, indent: &str) -> String {
        match self {
            ConfigValue::Null => "null".to_string(),
            ConfigValue::Bool(b) => b.to_string(),
            ConfigValue::Number(n) => n.to_string(),
            ConfigValue::String(s) => style.quote_string(s),
            ConfigValue::Raw(text) => text.clone(),
            ConfigValue::Array(items) => {
                if items.is_empty() {
                    return "[]".to_string();
                }
                if items.iter().all(ConfigValue::is_inline) {
                    let parts: Vec<String> = items.iter().map(|i| i.render(style, indent)).collect();
                    return format!("[{}]", parts.join(", "));
                }
                let inner = format!("{indent}{}", style.indent_unit);
                let parts: Vec<String> = items
                    .iter()
                    .map(|i| format!("{inner}{}", i.render(style, &inner)))
                    .collect();
                style.block('[', ']', &parts, indent)
            }
            ConfigValue::Object(pairs) => {
                if pairs.is_empty() {
                    return "{}".to_string();
                }
                let inner = format!("{indent}{}", style.indent_unit);
                let parts: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{inner}{}", style.member(k, v, &inner)))
                    .collect();
                style.block('{', '}', &parts, indent)
            }
        }
    }

    /// Returns the identity used when deduplicating array elements.
    pub fn element_key(&self) -> ElementKey {
        match self {
            ConfigValue::String(s) => ElementKey::Literal(s.clone()),
            ConfigValue::Raw(text) => ElementKey::from_source(text),
            other => ElementKey::Text(normalize_source(&other.render(&RenderStyle::json(), ""))),
        }
    }

    /// Returns the callee name if the value is a raw call expression.
    pub fn callee(&self) -> Option<&str> {
        match self {
            ConfigValue::Raw(text) => callee_of(text),
            _ => None,
        }
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ConfigValue::Null,
            Value::Bool(b) => ConfigValue::Bool(b),
            Value::Number(n) => ConfigValue::Number(n),
            Value::String(s) => ConfigValue::String(s),
            Value::Array(items) => ConfigValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                if map.len() == 1 {
                    if let Some(Value::String(expr)) = map.get(RAW_EXPR_KEY) {
                        return ConfigValue::Raw(expr.clone());
                    }
                }
                ConfigValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<ConfigValue> for Value {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Null => Value::Null,
            ConfigValue::Bool(b) => Value::Bool(b),
            ConfigValue::Number(n) => Value::Number(n),
            ConfigValue::String(s) => Value::String(s),
            ConfigValue::Array(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            ConfigValue::Object(pairs) => {
                Value::Object(pairs.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            ConfigValue::Raw(expr) => {
                let mut map = Map::new();
                map.insert(RAW_EXPR_KEY.to_string(), Value::String(expr));
                Value::Object(map)
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

/// How new values are spelled in a particular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderStyle {
    /// JSON output: quoted keys, double-quoted strings, no raw expressions.
    pub json: bool,
    pub quote: char,
    pub indent_unit: String,
    pub trailing_commas: bool,
}

impl RenderStyle {
    /// Plain JSON with two-space indentation.
    pub fn json() -> Self {
        Self {
            json: true,
            quote: '"',
            indent_unit: "  ".to_string(),
            trailing_commas: false,
        }
    }

    /// JavaScript object-literal style.
    pub fn javascript(quote: char) -> Self {
        Self {
            json: false,
            quote,
            indent_unit: "  ".to_string(),
            trailing_commas: true,
        }
    }

    /// Sets the indentation unit.
    pub fn with_indent(mut self, unit: impl Into<String>) -> Self {
        self.indent_unit = unit.into();
        self
    }

    /// Sets whether multi-line containers end with a comma.
    pub fn with_trailing_commas(mut self, trailing: bool) -> Self {
        self.trailing_commas = trailing;
        self
    }

    /// Quotes a string literal.
    pub fn quote_string(&self, s: &str) -> String {
        if self.json || self.quote == '"' {
            return serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""));
        }
        let mut out = String::with_capacity(s.len() + 2);
        out.push(self.quote);
        for ch in s.chars() {
            match ch {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c == self.quote => {
                    out.push('\\');
                    out.push(c);
                }
                c => out.push(c),
            }
        }
        out.push(self.quote);
        out
    }

    /// Renders an object key.
    pub fn key(&self, key: &str) -> String {
        if !self.json && is_identifier(key) {
            key.to_string()
        } else {
            self.quote_string(key)
        }
    }

    /// Renders `key: value` at the given indentation.
    pub fn member(&self, key: &str, value: &ConfigValue, indent: &str) -> String {
        format!("{}: {}", self.key(key), value.render(self, indent))
    }

    fn block(&self, open: char, close: char, parts: &[String], indent: &str) -> String {
        let mut out = String::new();
        out.push(open);
        out.push('\n');
        out.push_str(&parts.join(",\n"));
        if self.trailing_commas {
            out.push(',');
        }
        out.push('\n');
        out.push_str(indent);
        out.push(close);
        out
    }
}

/// Identity of an array element for union/dedupe comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKey {
    /// A string literal, by decoded content.
    Literal(String),
    /// Anything else, by normalized source text.
    Text(String),
}

impl ElementKey {
    /// Computes the key of an element from its source text.
    pub fn from_source(text: &str) -> Self {
        match unquote(text.trim()) {
            Some(s) => ElementKey::Literal(s),
            None => ElementKey::Text(normalize_source(text)),
        }
    }
}

/// Returns true if `s` can be used as a bare JavaScript property name.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Decodes a single- or double-quoted string literal.
pub fn unquote(text: &str) -> Option<String> {
    let quote = text.chars().next()?;
    if !(quote == '"' || quote == '\'') || text.len() < 2 || !text.ends_with(quote) {
        return None;
    }
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                other => out.push(other),
            },
            c if c == quote => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

/// Normalizes source text for textual identity: whitespace outside strings
/// is dropped, quotes are unified and trailing commas are removed.
pub fn normalize_source(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string: Option<char> = None;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if let Some(q) = in_string {
            match c {
                '\\' => {
                    out.push(c);
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                c if c == q => {
                    out.push('"');
                    in_string = None;
                }
                '"' => out.push_str("\\\""),
                c => out.push(c),
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => {
                in_string = Some(c);
                out.push(if c == '`' { '`' } else { '"' });
            }
            c if c.is_whitespace() => {}
            ')' | ']' | '}' => {
                if out.ends_with(',') {
                    out.pop();
                }
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Returns the callee of a call expression written as source text.
pub fn callee_of(text: &str) -> Option<&str> {
    let trimmed = text.trim_start();
    let trimmed = trimmed.strip_prefix("new ").map(str::trim_start).unwrap_or(trimmed);
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'))
        .unwrap_or(trimmed.len());
    let name = &trimmed[..end];
    if name.is_empty() || !trimmed[end..].trim_start().starts_with('(') {
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_json_object() {
        let value = ConfigValue::from(json!({"binding": "CF_VERSION_METADATA", "n": [1, 2]}));
        assert_eq!(
            value.render(&RenderStyle::json(), ""),
            "{\n  \"binding\": \"CF_VERSION_METADATA\",\n  \"n\": [1, 2]\n}"
        );
    }

    #[test]
    fn test_render_javascript_object() {
        let value = ConfigValue::object([
            ("org", ConfigValue::string("acme")),
            ("silent", ConfigValue::raw("!process.env.CI")),
            ("project-name", ConfigValue::string("it's")),
        ]);
        let style = RenderStyle::javascript('\'').with_indent("    ");
        assert_eq!(
            value.render(&style, "  "),
            "{\n      org: 'acme',\n      silent: !process.env.CI,\n      'project-name': 'it\\'s',\n  }"
        );
    }

    #[test]
    fn test_raw_round_trip_through_json() {
        let value: ConfigValue = serde_json::from_value(json!({"$expr": "foo()"})).unwrap();
        assert_eq!(value, ConfigValue::raw("foo()"));
        assert_eq!(serde_json::to_value(&value).unwrap(), json!({"$expr": "foo()"}));
    }

    #[test]
    fn test_element_keys() {
        assert_eq!(
            ElementKey::from_source("'nodejs_als'"),
            ConfigValue::string("nodejs_als").element_key()
        );
        assert_eq!(
            ElementKey::from_source("route( 'a', 'b', )"),
            ConfigValue::raw("route(\"a\", \"b\")").element_key()
        );
        assert_ne!(
            ElementKey::from_source("route('a')"),
            ElementKey::from_source("route('b')")
        );
    }

    #[test]
    fn test_callee_of() {
        assert_eq!(callee_of("sentryVitePlugin({ org })"), Some("sentryVitePlugin"));
        assert_eq!(callee_of("Sentry.withSentry (x)"), Some("Sentry.withSentry"));
        assert_eq!(callee_of("react()"), Some("react"));
        assert_eq!(callee_of("plugin"), None);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'a\\'b'"), Some("a'b".to_string()));
        assert_eq!(unquote("\"x\""), Some("x".to_string()));
        assert_eq!(unquote("'a' + 'b'"), None);
        assert_eq!(unquote("x"), None);
    }
}
