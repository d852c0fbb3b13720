//! Mutators for JavaScript/TypeScript modules.

use super::merge::{MergeOp, Merger, ValueView, detect_indent_unit, detect_trailing_commas};
use super::patch::{
    ArraySpec, ArrayTarget, ImportBinding, ImportSpec, ModuleStyle, PropertySpec, WrapMode,
    WrapSpec,
};
use super::TextEdit;
use crate::document::SourceDocument;
use crate::error::{PatchError, Result};
use crate::locate::js::{is_import_like, require_source};
use crate::locate::{
    InsertionPoint, array_literal_export, default_export_declaration, exported_expression,
    exported_object, last_import_position, module_exports_assignment, wrapping_call,
};
use crate::syntax::{
    call_arguments, children, closing_offset, end_of_content_before, has_trailing_comma,
    line_indent, named_children, same_line, string_value, text,
};
use crate::value::{ConfigValue, RenderStyle, normalize_source};
use tracing::debug;
use tree_sitter::Node;

fn require_code(doc: &SourceDocument) -> Result<()> {
    if doc.code_tree().is_none() {
        return Err(PatchError::UnsupportedDialect(doc.dialect().to_string()));
    }
    Ok(())
}

fn top_level(doc: &SourceDocument) -> Vec<Node<'_>> {
    doc.code_tree()
        .map(|tree| named_children(tree.root_node()))
        .unwrap_or_default()
}

/// Detects the quote character of the first string literal in the module.
pub(crate) fn detect_quote(doc: &SourceDocument) -> char {
    let Some(tree) = doc.code_tree() else {
        return '"';
    };
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if node.kind() == "string" {
            return text(node, doc.text()).chars().next().unwrap_or('"');
        }
        let mut kids = named_children(node);
        kids.reverse();
        stack.extend(kids);
    }
    '"'
}

/// Returns true unless the module's statements consistently omit semicolons.
pub(crate) fn detect_semicolons(doc: &SourceDocument) -> bool {
    let source = doc.text();
    let statements: Vec<Node<'_>> = top_level(doc)
        .into_iter()
        .filter(|n| {
            matches!(
                n.kind(),
                "import_statement" | "expression_statement" | "lexical_declaration" | "variable_declaration"
            )
        })
        .collect();
    statements.is_empty() || statements.iter().any(|n| text(*n, source).ends_with(';'))
}

/// The object-literal rendering style of a module.
pub(crate) fn detect_style(doc: &SourceDocument) -> RenderStyle {
    RenderStyle::javascript(detect_quote(doc))
        .with_indent(detect_indent_unit(doc.text()))
        .with_trailing_commas(detect_trailing_commas(doc.text()))
}

fn uses_esm(doc: &SourceDocument, style: ModuleStyle) -> bool {
    match style {
        ModuleStyle::Esm => true,
        ModuleStyle::CommonJs => false,
        ModuleStyle::Auto => {
            let source = doc.text();
            let nodes = top_level(doc);
            if nodes
                .iter()
                .any(|n| matches!(n.kind(), "import_statement" | "export_statement"))
            {
                return true;
            }
            if module_exports_assignment(doc).is_some()
                || nodes.iter().any(|n| is_import_like(*n, source))
            {
                return false;
            }
            !matches!(
                doc.path().extension().and_then(|e| e.to_str()),
                Some("cjs" | "cts")
            )
        }
    }
}

/// Renders an import statement for the given binding.
pub fn import_statement(spec: &ImportSpec, esm: bool, quote: char, semicolon: bool) -> String {
    let module = RenderStyle::javascript(quote).quote_string(&spec.module);
    let mut stmt = match (&spec.binding, esm) {
        (ImportBinding::Default(name), true) => format!("import {name} from {module}"),
        (ImportBinding::Named(name), true) => format!("import {{ {name} }} from {module}"),
        (ImportBinding::Namespace(name), true) => format!("import * as {name} from {module}"),
        (ImportBinding::SideEffect, true) => format!("import {module}"),
        (ImportBinding::Default(name) | ImportBinding::Namespace(name), false) => {
            format!("const {name} = require({module})")
        }
        (ImportBinding::Named(name), false) => format!("const {{ {name} }} = require({module})"),
        (ImportBinding::SideEffect, false) => format!("require({module})"),
    };
    if semicolon {
        stmt.push(';');
    }
    stmt
}

fn is_type_only(import: Node<'_>) -> bool {
    children(import)
        .iter()
        .take(2)
        .any(|c| c.kind() == "type")
}

/// What an existing import of the module looks like.
#[derive(Default)]
struct ExistingImport<'t> {
    bound: bool,
    named_list: Option<Node<'t>>,
}

fn scan_esm_import<'t>(
    import: Node<'t>,
    binding: &ImportBinding,
    source: &str,
    found: &mut ExistingImport<'t>,
) {
    let Some(clause) = named_children(import)
        .into_iter()
        .find(|c| c.kind() == "import_clause")
    else {
        return;
    };
    for part in named_children(clause) {
        match (part.kind(), binding) {
            ("identifier", ImportBinding::Default(name)) if text(part, source) == name => {
                found.bound = true;
            }
            ("namespace_import", ImportBinding::Namespace(name)) => {
                if named_children(part)
                    .iter()
                    .any(|id| text(*id, source) == name)
                {
                    found.bound = true;
                }
            }
            ("named_imports", _) => {
                if let ImportBinding::Named(name) = binding {
                    let bound = named_children(part).iter().any(|spec| {
                        let imported = spec.child_by_field_name("name").map(|n| text(n, source));
                        let local = spec
                            .child_by_field_name("alias")
                            .map(|n| text(n, source))
                            .or(imported);
                        imported == Some(name.as_str()) && local == Some(name.as_str())
                    });
                    found.bound |= bound;
                }
                found.named_list.get_or_insert(part);
            }
            _ => {}
        }
    }
}

fn scan_require(declarator: Node<'_>, binding: &ImportBinding, source: &str) -> bool {
    let Some(pattern) = declarator.child_by_field_name("name") else {
        return false;
    };
    match (pattern.kind(), binding) {
        ("identifier", ImportBinding::Default(name) | ImportBinding::Namespace(name)) => {
            text(pattern, source) == name
        }
        ("object_pattern", ImportBinding::Named(name)) => named_children(pattern).iter().any(|p| {
            match p.kind() {
                "shorthand_property_identifier_pattern" => text(*p, source) == name,
                "pair_pattern" => {
                    p.child_by_field_name("key").map(|k| text(k, source)) == Some(name.as_str())
                        && p.child_by_field_name("value").map(|v| text(v, source))
                            == Some(name.as_str())
                }
                _ => false,
            }
        }),
        _ => false,
    }
}

fn find_existing_import<'d>(doc: &'d SourceDocument, spec: &ImportSpec) -> ExistingImport<'d> {
    let source = doc.text();
    let mut found = ExistingImport::default();
    for node in top_level(doc) {
        match node.kind() {
            "import_statement" if !is_type_only(node) => {
                let module = node
                    .child_by_field_name("source")
                    .and_then(|s| string_value(s, source));
                if module.as_deref() != Some(spec.module.as_str()) {
                    continue;
                }
                if spec.binding == ImportBinding::SideEffect {
                    found.bound = true;
                } else {
                    scan_esm_import(node, &spec.binding, source, &mut found);
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                for declarator in named_children(node) {
                    let Some(value) = declarator.child_by_field_name("value") else {
                        continue;
                    };
                    if require_source(value, source).as_deref() != Some(spec.module.as_str()) {
                        continue;
                    }
                    if spec.binding == ImportBinding::SideEffect
                        || scan_require(declarator, &spec.binding, source)
                    {
                        found.bound = true;
                    }
                }
            }
            "expression_statement" if spec.binding == ImportBinding::SideEffect => {
                if named_children(node)
                    .first()
                    .and_then(|expr| require_source(*expr, source))
                    .as_deref()
                    == Some(spec.module.as_str())
                {
                    found.bound = true;
                }
            }
            _ => {}
        }
    }
    found
}

fn add_to_named_list(source: &str, list: Node<'_>, name: &str) -> TextEdit {
    let specifiers = named_children(list);
    let close = closing_offset(list);
    let Some(last) = specifiers.last() else {
        return TextEdit::replace(list.start_byte() + 1..close, format!(" {name} "));
    };
    if same_line(source, list.start_byte(), last.start_byte()) {
        return TextEdit::insert(last.end_byte(), format!(", {name}"));
    }
    let indent = line_indent(source, last.start_byte());
    if has_trailing_comma(list) {
        TextEdit::insert(
            end_of_content_before(source, close),
            format!("\n{indent}{name},"),
        )
    } else {
        TextEdit::insert(last.end_byte(), format!(",\n{indent}{name}"))
    }
}

/// Adds an import unless the module already binds the same local name.
pub fn add_import(doc: &SourceDocument, spec: &ImportSpec) -> Result<SourceDocument> {
    require_code(doc)?;
    let existing = find_existing_import(doc, spec);
    if existing.bound {
        debug!(module = %spec.module, "import already present");
        return Ok(doc.clone());
    }
    if let (ImportBinding::Named(name), Some(list)) = (&spec.binding, existing.named_list) {
        return doc.with_edits(vec![add_to_named_list(doc.text(), list, name)]);
    }
    let statement = import_statement(
        spec,
        uses_esm(doc, spec.style),
        detect_quote(doc),
        detect_semicolons(doc),
    );
    insert_after_last_import(doc, &statement)
}

/// Inserts a statement after the leading import block, unless an identical
/// top-level statement already exists.
pub fn insert_after_last_import(doc: &SourceDocument, statement: &str) -> Result<SourceDocument> {
    require_code(doc)?;
    let wanted = normalize_source(statement.trim_end_matches(';'));
    let source = doc.text();
    if top_level(doc)
        .iter()
        .any(|n| normalize_source(text(*n, source).trim_end_matches(';')) == wanted)
    {
        return Ok(doc.clone());
    }
    let point = last_import_position(doc).ok_or_else(|| PatchError::locator_miss("import block"))?;
    let edit = match point {
        InsertionPoint::Start => TextEdit::insert(0, format!("{statement}\n")),
        other => TextEdit::insert(other.offset(), format!("\n{statement}")),
    };
    doc.with_edits(vec![edit])
}

/// Renders `callee(leading..., inner, trailing...)`.
pub fn render_call(spec: &WrapSpec, inner: &str, style: &RenderStyle, indent: &str) -> String {
    let args: Vec<String> = spec
        .leading_args
        .iter()
        .map(|a| a.render(style, indent))
        .chain(std::iter::once(inner.to_string()))
        .chain(spec.trailing_args.iter().map(|a| a.render(style, indent)))
        .collect();
    format!("{}({})", spec.callee, args.join(", "))
}

/// Wraps the module's exported expression in a call.
pub fn wrap_default_export(doc: &SourceDocument, spec: &WrapSpec) -> Result<SourceDocument> {
    require_code(doc)?;
    let source = doc.text();
    let Some(exported) = exported_expression(doc) else {
        let target = if default_export_declaration(doc).is_some() {
            "an exported expression (function and class declarations cannot be wrapped)"
        } else {
            "a default export or module.exports assignment"
        };
        return Err(PatchError::locator_miss(target));
    };
    let style = detect_style(doc);

    if let Some(existing) = wrapping_call(doc, &spec.callee) {
        if spec.mode == WrapMode::KeepExisting {
            debug!(callee = %spec.callee, "export already wrapped");
            return Ok(doc.clone());
        }
        let args = call_arguments(existing);
        let wrapped = args
            .get(spec.leading_args.len())
            .ok_or_else(|| PatchError::locator_miss(format!("wrapped argument of {}()", spec.callee)))?;
        let indent = line_indent(source, existing.start_byte());
        let rewrapped = render_call(spec, text(*wrapped, source), &style, indent);
        if normalize_source(&rewrapped) == normalize_source(text(existing, source)) {
            return Ok(doc.clone());
        }
        return doc.with_edits(vec![TextEdit::replace(existing.byte_range(), rewrapped)]);
    }

    let indent = line_indent(source, exported.start_byte());
    let wrapped = render_call(spec, text(exported, source), &style, indent);
    doc.with_edits(vec![TextEdit::replace(exported.byte_range(), wrapped)])
}

/// Appends elements to the exported array or to an array property.
pub fn add_array_element(doc: &SourceDocument, spec: &ArraySpec) -> Result<SourceDocument> {
    require_code(doc)?;
    let source = doc.text();
    let style = detect_style(doc);
    match &spec.target {
        ArrayTarget::DefaultExport => {
            if let Some(array) = array_literal_export(doc) {
                let ValueView::Array(view) = ValueView::from_js(array, source) else {
                    return Err(PatchError::locator_miss("array literal default export"));
                };
                let mut merger = Merger::new(source, style);
                merger.append_elements(&view, &spec.elements, spec.matching);
                return doc.with_edits(merger.into_edits());
            }
            if default_export_declaration(doc).is_some() || module_exports_assignment(doc).is_some() {
                return Err(PatchError::locator_miss("array literal default export"));
            }
            let items: Vec<String> = spec.elements.iter().map(|e| e.render(&style, "")).collect();
            let semicolon = if detect_semicolons(doc) { ";" } else { "" };
            let separator = if source.is_empty() || source.ends_with('\n') { "" } else { "\n" };
            let statement = format!("{separator}export default [{}]{semicolon}\n", items.join(", "));
            doc.with_edits(vec![TextEdit::insert(source.len(), statement)])
        }
        ArrayTarget::Property(path) => {
            let Some((key, parents)) = path.split_last() else {
                return Err(PatchError::InvalidConfig(
                    "array property target needs a key path".to_string(),
                ));
            };
            let view = exported_object_view(doc)?;
            let mut merger = Merger::new(source, style);
            merger.merge_at_path(
                &view,
                parents,
                key,
                &ConfigValue::Array(spec.elements.clone()),
                MergeOp::Union(spec.matching),
            )?;
            doc.with_edits(merger.into_edits())
        }
    }
}

/// Sets or merges a property of the exported config object.
pub fn set_or_merge_property(doc: &SourceDocument, spec: &PropertySpec) -> Result<SourceDocument> {
    require_code(doc)?;
    let view = exported_object_view(doc)?;
    let mut merger = Merger::new(doc.text(), detect_style(doc));
    merger.merge_at_path(&view, &spec.path, &spec.key, &spec.value, spec.strategy.into())?;
    doc.with_edits(merger.into_edits())
}

fn exported_object_view(doc: &SourceDocument) -> Result<super::merge::ObjectView> {
    let object = exported_object(doc).ok_or_else(|| PatchError::locator_miss("exported config object"))?;
    match ValueView::from_js(object, doc.text()) {
        ValueView::Object(view) => Ok(view),
        _ => Err(PatchError::locator_miss("exported config object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::patch::{ElementMatch, MergeStrategy};

    fn doc(path: &str, src: &str) -> SourceDocument {
        SourceDocument::parse(path, src).unwrap()
    }

    fn named(module: &str, name: &str) -> ImportSpec {
        ImportSpec::named(module, name)
    }

    #[test]
    fn test_add_import_after_leading_block() {
        let d = doc("a.js", "import A from 'a';\nconst x = 1;\nimport B from 'b';\n");
        let out = add_import(&d, &named("@sentry/nextjs", "withSentryConfig")).unwrap();
        assert_eq!(
            out.text(),
            "import A from 'a';\nimport { withSentryConfig } from '@sentry/nextjs';\nconst x = 1;\nimport B from 'b';\n"
        );
        assert_eq!(add_import(&out, &named("@sentry/nextjs", "withSentryConfig")).unwrap().text(), out.text());
    }

    #[test]
    fn test_add_import_merges_into_named_list() {
        let d = doc("a.ts", "import { a } from \"m\"\n\nexport default {}\n");
        let out = add_import(&d, &named("m", "b")).unwrap();
        assert_eq!(out.text(), "import { a, b } from \"m\"\n\nexport default {}\n");

        let d = doc("a.ts", "import {\n  a,\n} from \"m\";\n");
        let out = add_import(&d, &named("m", "b")).unwrap();
        assert_eq!(out.text(), "import {\n  a,\n  b,\n} from \"m\";\n");
    }

    #[test]
    fn test_add_import_uses_commonjs_in_cjs_modules() {
        let d = doc("next.config.js", "const path = require(\"path\")\n\nmodule.exports = {}\n");
        let out = add_import(&d, &named("@sentry/nextjs", "withSentryConfig")).unwrap();
        assert_eq!(
            out.text(),
            "const path = require(\"path\")\nconst { withSentryConfig } = require(\"@sentry/nextjs\")\n\nmodule.exports = {}\n"
        );
        assert_eq!(add_import(&out, &named("@sentry/nextjs", "withSentryConfig")).unwrap().text(), out.text());
    }

    #[test]
    fn test_add_import_ignores_type_only_imports() {
        let d = doc("a.ts", "import type { Config } from 'm';\n");
        let out = add_import(&d, &named("m", "Config")).unwrap();
        assert!(out.text().contains("import { Config } from 'm';"));
    }

    #[test]
    fn test_add_namespace_import_at_start() {
        let d = doc("index.ts", "export default {\n  fetch() {},\n};\n");
        let out = add_import(&d, &ImportSpec::namespace("@sentry/cloudflare", "Sentry")).unwrap();
        assert!(out.text().starts_with("import * as Sentry from \"@sentry/cloudflare\";\nexport default"));
    }

    #[test]
    fn test_add_import_below_ts_check_header() {
        let d = doc(
            "next.config.js",
            "// @ts-check\n/** @type {import('next').NextConfig} */\nmodule.exports = {};\n",
        );
        let out = add_import(&d, &named("@sentry/nextjs", "withSentryConfig")).unwrap();
        assert_eq!(
            out.text(),
            "// @ts-check\nconst { withSentryConfig } = require(\"@sentry/nextjs\");\n/** @type {import('next').NextConfig} */\nmodule.exports = {};\n"
        );
    }

    #[test]
    fn test_add_import_keeps_crlf() {
        let d = doc("a.js", "import a from 'a';\r\nexport default a;\r\n");
        let out = add_import(&d, &named("m", "b")).unwrap();
        assert_eq!(
            out.text(),
            "import a from 'a';\r\nimport { b } from 'm';\r\nexport default a;\r\n"
        );
    }

    #[test]
    fn test_wrap_default_export() {
        let d = doc("next.config.mjs", "const nextConfig = {};\n\nexport default nextConfig;\n");
        let spec = WrapSpec::new("withSentryConfig")
            .trailing_arg(ConfigValue::object([("org", ConfigValue::string("acme"))]));
        let out = wrap_default_export(&d, &spec).unwrap();
        assert_eq!(
            out.text(),
            "const nextConfig = {};\n\nexport default withSentryConfig(nextConfig, {\n  org: \"acme\"\n});\n"
        );
        assert_eq!(wrap_default_export(&out, &spec).unwrap().text(), out.text());
    }

    #[test]
    fn test_rewrap_replaces_options() {
        let d = doc("next.config.js", "module.exports = withSentryConfig(cfg, {org:\"old\"});\n");
        let spec = WrapSpec::new("withSentryConfig")
            .trailing_arg(ConfigValue::object([("org", ConfigValue::string("new"))]))
            .rewrap();
        let out = wrap_default_export(&d, &spec).unwrap();
        assert_eq!(out.text().matches("withSentryConfig(").count(), 1);
        assert!(out.text().contains("\"new\""));
        assert!(!out.text().contains("\"old\""));
        assert_eq!(wrap_default_export(&out, &spec).unwrap().text(), out.text());
    }

    #[test]
    fn test_rewrap_finds_wrapper_behind_binding_and_outer_call() {
        let spec = WrapSpec::new("withSentryConfig")
            .trailing_arg(ConfigValue::object([("org", ConfigValue::string("new"))]))
            .rewrap();

        let d = doc(
            "next.config.mjs",
            "const config = withSentryConfig({}, {org:\"old\"});\nexport default config;\n",
        );
        let out = wrap_default_export(&d, &spec).unwrap();
        assert_eq!(out.text().matches("withSentryConfig(").count(), 1);
        assert!(out.text().starts_with("const config = withSentryConfig({}, {"));
        assert!(out.text().ends_with("export default config;\n"));
        assert!(!out.text().contains("\"old\""));

        let d = doc(
            "next.config.mjs",
            "export default withBundleAnalyzer(withSentryConfig(cfg,{org:\"old\"}));\n",
        );
        let out = wrap_default_export(&d, &spec).unwrap();
        assert_eq!(out.text().matches("withSentryConfig(").count(), 1);
        assert!(out.text().starts_with("export default withBundleAnalyzer(withSentryConfig(cfg, {"));
        assert_eq!(wrap_default_export(&out, &spec).unwrap().text(), out.text());

        let keep = WrapSpec::new("withSentryConfig");
        assert_eq!(wrap_default_export(&d, &keep).unwrap().text(), d.text());
    }

    #[test]
    fn test_wrap_with_leading_args() {
        let d = doc("src/index.ts", "export default {\n  async fetch() {},\n} satisfies ExportedHandler<Env>;\n");
        let spec = WrapSpec::new("Sentry.withSentry").leading_arg(ConfigValue::raw("(env) => ({})"));
        let out = wrap_default_export(&d, &spec).unwrap();
        assert!(out.text().starts_with("export default Sentry.withSentry((env) => ({}), {"));
        assert!(out.text().contains("} satisfies ExportedHandler<Env>);"));
        assert_eq!(wrap_default_export(&out, &spec).unwrap().text(), out.text());
    }

    #[test]
    fn test_wrap_rejects_function_declaration() {
        let d = doc("a.ts", "export default class Handler {}\n");
        let err = wrap_default_export(&d, &WrapSpec::new("wrap")).unwrap_err();
        assert!(matches!(err, PatchError::LocatorMiss { .. }));
    }

    #[test]
    fn test_add_array_element_to_satisfies_export() {
        let src = "import { index } from \"@react-router/dev/routes\";\n\nexport default [\n  index(\"routes/home.tsx\"),\n] satisfies RouteConfig;\n";
        let d = doc("app/routes.ts", src);
        let spec = ArraySpec {
            target: ArrayTarget::DefaultExport,
            elements: vec![ConfigValue::raw("route('sentry-example-page', 'routes/sentry-example-page.tsx')")],
            matching: ElementMatch::Text,
        };
        let out = add_array_element(&d, &spec).unwrap();
        assert!(out.text().contains(
            "  index(\"routes/home.tsx\"),\n  route('sentry-example-page', 'routes/sentry-example-page.tsx'),\n] satisfies RouteConfig;"
        ));
        assert_eq!(add_array_element(&out, &spec).unwrap().text(), out.text());
    }

    #[test]
    fn test_add_array_element_synthesizes_export() {
        let d = doc("routes.ts", "import { index } from 'x';\n");
        let spec = ArraySpec {
            target: ArrayTarget::DefaultExport,
            elements: vec![ConfigValue::raw("index('a')")],
            matching: ElementMatch::Text,
        };
        let out = add_array_element(&d, &spec).unwrap();
        assert_eq!(out.text(), "import { index } from 'x';\nexport default [index('a')];\n");

        let d = doc("routes.ts", "export default flatRoutes();\n");
        assert!(matches!(
            add_array_element(&d, &spec).unwrap_err(),
            PatchError::LocatorMiss { .. }
        ));
    }

    #[test]
    fn test_add_plugin_by_callee() {
        let d = doc(
            "vite.config.ts",
            "export default defineConfig({\n  plugins: [react(), sentryVitePlugin({ org: 'old' })],\n});\n",
        );
        let spec = ArraySpec {
            target: ArrayTarget::Property(vec!["plugins".to_string()]),
            elements: vec![ConfigValue::raw("sentryVitePlugin({ org: 'acme' })")],
            matching: ElementMatch::Callee,
        };
        assert_eq!(add_array_element(&d, &spec).unwrap().text(), d.text());

        let d = doc("vite.config.ts", "export default defineConfig({\n  server: {},\n});\n");
        let out = add_array_element(&d, &spec).unwrap();
        assert!(out.text().contains("plugins: [sentryVitePlugin({ org: 'acme' })]"));
    }

    #[test]
    fn test_set_property_on_shorthand_and_bindings() {
        let d = doc(
            "next.config.mjs",
            "const nextConfig = {\n  reactStrictMode: true,\n};\n\nexport default nextConfig;\n",
        );
        let spec = PropertySpec::new("productionBrowserSourceMaps", true.into(), MergeStrategy::Overwrite);
        let out = set_or_merge_property(&d, &spec).unwrap();
        assert_eq!(
            out.text(),
            "const nextConfig = {\n  reactStrictMode: true,\n  productionBrowserSourceMaps: true,\n};\n\nexport default nextConfig;\n"
        );

        let d = doc("a.js", "const build = 1;\nexport default { build };\n");
        let out = set_or_merge_property(&d, &PropertySpec::overwrite("build", ConfigValue::object([("sourcemap", true.into())]))).unwrap();
        assert!(out.text().contains("export default { build: {"));
    }

    #[test]
    fn test_overwrite_with_equal_value_is_noop() {
        let d = doc("a.js", "export default { a: 'x' };\n");
        let out = set_or_merge_property(&d, &PropertySpec::overwrite("a", ConfigValue::string("x"))).unwrap();
        assert_eq!(out.text(), d.text());
    }
}
