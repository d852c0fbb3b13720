//! Structural locators over JavaScript/TypeScript modules.

use super::InsertionPoint;
use crate::document::SourceDocument;
use crate::syntax::{
    call_arguments, callee_name, named_children, property_key, string_value, text,
    unwrap_expression,
};
use tree_sitter::Node;

/// How many identifier/call hops `exported_object` follows.
const MAX_RESOLVE_DEPTH: usize = 4;

fn top_level<'d>(doc: &'d SourceDocument) -> Vec<Node<'d>> {
    doc.code_tree()
        .map(|tree| named_children(tree.root_node()))
        .unwrap_or_default()
}

/// Returns true for `import ... from "x"` and `const x = require("x")`.
pub(crate) fn is_import_like(node: Node<'_>, source: &str) -> bool {
    match node.kind() {
        "import_statement" => true,
        "lexical_declaration" | "variable_declaration" => {
            let declarators = named_children(node);
            !declarators.is_empty()
                && declarators.iter().all(|d| {
                    d.child_by_field_name("value")
                        .map(|v| require_source(v, source).is_some())
                        .unwrap_or(false)
                })
        }
        _ => false,
    }
}

/// Returns the module of a `require("x")` call.
pub(crate) fn require_source(node: Node<'_>, source: &str) -> Option<String> {
    let node = unwrap_expression(node);
    if callee_name(node, source)? != "require" {
        return None;
    }
    let args = call_arguments(node);
    match args.as_slice() {
        [arg] => string_value(*arg, source),
        _ => None,
    }
}

fn is_directive(node: Node<'_>) -> bool {
    node.kind() == "expression_statement"
        && named_children(node)
            .first()
            .map(|n| n.kind() == "string")
            .unwrap_or(false)
}

/// Finds the position after the last import of the leading import block.
///
/// The block is the longest run of import declarations (and `require`
/// declarations) at the top of the module. An import that follows any other
/// statement is not part of it. With no leading imports the position is after
/// the module header: a hash-bang line, the directive prologue and leading
/// comments such as `// @ts-check` or a license block. A `/** */` comment
/// directly above the first statement documents that statement and stays
/// with it.
pub fn last_import_position(doc: &SourceDocument) -> Option<InsertionPoint<'_>> {
    let tree = doc.code_tree()?;
    let root = tree.root_node();
    let source = doc.text();
    let mut cursor = root.walk();
    let statements: Vec<Node<'_>> = root.named_children(&mut cursor).collect();

    let mut header: Vec<Node<'_>> = Vec::new();
    let mut last_import: Option<Node<'_>> = None;
    let mut first_statement: Option<Node<'_>> = None;
    let mut in_prologue = true;

    for node in statements {
        match node.kind() {
            "comment" => {
                if last_import.is_none() {
                    header.push(node);
                }
            }
            "hash_bang_line" => header.push(node),
            _ if in_prologue && last_import.is_none() && is_directive(node) => header.push(node),
            _ if is_import_like(node, source) => {
                in_prologue = false;
                last_import = Some(node);
            }
            _ => {
                first_statement = Some(node);
                break;
            }
        }
    }

    if let Some(import) = last_import {
        return Some(InsertionPoint::After(import));
    }
    if let Some(statement) = first_statement {
        let mut next = statement;
        while let Some(comment) = header.last().copied() {
            if !is_attached_doc_comment(comment, next, source) {
                break;
            }
            header.pop();
            next = comment;
        }
    }
    Some(match header.last() {
        Some(node) => InsertionPoint::After(*node),
        None => InsertionPoint::Start,
    })
}

fn is_attached_doc_comment(comment: Node<'_>, next: Node<'_>, source: &str) -> bool {
    comment.kind() == "comment"
        && text(comment, source).starts_with("/**")
        && source[comment.end_byte()..next.start_byte()].matches('\n').count() <= 1
}

/// Finds the `export default ...` statement. A module has at most one.
pub fn default_export_declaration(doc: &SourceDocument) -> Option<Node<'_>> {
    top_level(doc).into_iter().find(|node| {
        node.kind() == "export_statement"
            && crate::syntax::children(*node)
                .iter()
                .any(|c| c.kind() == "default")
    })
}

/// Returns the exported expression of `export default <expr>`.
///
/// Default-exported function and class declarations have no expression and
/// yield `None`.
pub fn default_export_value(doc: &SourceDocument) -> Option<Node<'_>> {
    default_export_declaration(doc)?.child_by_field_name("value")
}

/// Finds the top-level `module.exports = ...` assignment expression.
pub fn module_exports_assignment(doc: &SourceDocument) -> Option<Node<'_>> {
    let source = doc.text();
    top_level(doc)
        .into_iter()
        .filter(|n| n.kind() == "expression_statement")
        .filter_map(|n| named_children(n).into_iter().next())
        .filter(|expr| expr.kind() == "assignment_expression")
        .filter(|assign| {
            assign
                .child_by_field_name("left")
                .map(|left| text(left, source).replace(char::is_whitespace, "") == "module.exports")
                .unwrap_or(false)
        })
        .last()
}

/// Returns the module's exported expression: the default export value, or
/// the right-hand side of `module.exports = ...`.
pub fn exported_expression(doc: &SourceDocument) -> Option<Node<'_>> {
    default_export_value(doc).or_else(|| {
        module_exports_assignment(doc).and_then(|assign| assign.child_by_field_name("right"))
    })
}

/// Finds a property of an object literal by exact key.
///
/// Only immediate properties are searched. When a key is repeated, the last
/// occurrence wins since that is the one the runtime keeps.
pub fn named_object_property<'t>(object: Node<'t>, key: &str, source: &str) -> Option<Node<'t>> {
    if object.kind() != "object" {
        return None;
    }
    named_children(object)
        .into_iter()
        .filter(|p| property_key(*p, source).as_deref() == Some(key))
        .last()
}

/// Finds a default-exported array literal, looking through one `satisfies`
/// or `as` wrapper.
pub fn array_literal_export(doc: &SourceDocument) -> Option<Node<'_>> {
    let value = default_export_value(doc)?;
    let inner = unwrap_expression(value);
    (inner.kind() == "array").then_some(inner)
}

/// Finds a top-level `const name = <value>` initializer.
pub fn top_level_binding<'d>(doc: &'d SourceDocument, name: &str) -> Option<Node<'d>> {
    let source = doc.text();
    top_level(doc)
        .into_iter()
        .flat_map(|stmt| match stmt.kind() {
            "lexical_declaration" | "variable_declaration" => named_children(stmt),
            "export_statement" => stmt
                .child_by_field_name("declaration")
                .map(named_children)
                .unwrap_or_default(),
            _ => Vec::new(),
        })
        .filter(|d| d.kind() == "variable_declarator")
        .filter(|d| {
            d.child_by_field_name("name")
                .map(|n| text(n, source) == name)
                .unwrap_or(false)
        })
        .filter_map(|d| d.child_by_field_name("value"))
        .last()
}

/// Finds the object literal that configures the module's export.
///
/// Follows the first argument of a wrapping call (`defineConfig({...})`,
/// `withX(config)`) and identifiers bound by top-level declarations
/// (`const nextConfig = {...}; export default nextConfig`).
pub fn exported_object(doc: &SourceDocument) -> Option<Node<'_>> {
    let source = doc.text();
    let mut current = unwrap_expression(exported_expression(doc)?);
    for _ in 0..MAX_RESOLVE_DEPTH {
        match current.kind() {
            "object" => return Some(current),
            "call_expression" => {
                current = unwrap_expression(*call_arguments(current).first()?);
            }
            "identifier" => {
                current = unwrap_expression(top_level_binding(doc, text(current, source))?);
            }
            _ => return None,
        }
    }
    (current.kind() == "object").then_some(current)
}

/// Finds an existing `callee(...)` call wrapping the module's export.
///
/// Looks at the exported expression itself, through identifiers bound by
/// top-level declarations, and into the first argument of enclosing calls
/// (`withA(withSentryConfig(config))`).
pub fn wrapping_call<'d>(doc: &'d SourceDocument, callee: &str) -> Option<Node<'d>> {
    let source = doc.text();
    let mut current = unwrap_expression(exported_expression(doc)?);
    for _ in 0..MAX_RESOLVE_DEPTH {
        match current.kind() {
            "call_expression" if callee_name(current, source) == Some(callee) => {
                return Some(current);
            }
            "call_expression" => {
                current = unwrap_expression(*call_arguments(current).first()?);
            }
            "identifier" => {
                current = unwrap_expression(top_level_binding(doc, text(current, source))?);
            }
            _ => return None,
        }
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
    fn test_last_import_is_leading_block_only() {
        let d = doc("a.js", "import A from 'a';\nconst x = 1;\nimport B from 'b';\n");
        let point = last_import_position(&d).unwrap();
        assert_eq!(&d.text()[..point.offset()], "import A from 'a';");
    }

    #[test]
    fn test_last_import_counts_require_and_skips_comments() {
        let src = "// header\nconst a = require('a');\n/* c */\nimport b from 'b';\nfoo();\n";
        let d = doc("a.js", src);
        let point = last_import_position(&d).unwrap();
        assert_eq!(point.offset(), src.find("foo").unwrap() - 1);
    }

    #[test]
    fn test_last_import_without_imports() {
        let d = doc("a.js", "module.exports = {};\n");
        assert_eq!(last_import_position(&d).unwrap(), InsertionPoint::Start);

        let src = "\"use client\";\nexport default 1;\n";
        let d = doc("a.js", src);
        assert_eq!(last_import_position(&d).unwrap().offset(), "\"use client\";".len());
    }

    #[test]
    fn test_last_import_without_imports_skips_header_comments() {
        let src = "// @ts-check\n/** @type {import('next').NextConfig} */\nmodule.exports = {};\n";
        let d = doc("next.config.js", src);
        assert_eq!(last_import_position(&d).unwrap().offset(), "// @ts-check".len());

        let src = "#!/usr/bin/env node\n/* Copyright Acme */\n\nrun();\n";
        let d = doc("a.js", src);
        assert_eq!(
            last_import_position(&d).unwrap().offset(),
            "#!/usr/bin/env node\n/* Copyright Acme */".len()
        );

        let d = doc("a.js", "/** Docs. */\nexport default 1;\n");
        assert_eq!(last_import_position(&d).unwrap(), InsertionPoint::Start);
    }

    #[test]
    fn test_default_export_value() {
        let d = doc("a.ts", "const c = {};\nexport default withX(c);\n");
        let value = default_export_value(&d).unwrap();
        assert_eq!(text(value, d.text()), "withX(c)");

        let d = doc("a.ts", "export default class Handler {}\n");
        assert!(default_export_declaration(&d).is_some());

        let d = doc("a.js", "export const x = 1;\n");
        assert!(default_export_declaration(&d).is_none());
    }

    #[test]
    fn test_module_exports_assignment() {
        let d = doc("next.config.js", "const c = {};\nmodule.exports = withX(c);\n");
        let assign = module_exports_assignment(&d).unwrap();
        assert_eq!(text(assign.child_by_field_name("right").unwrap(), d.text()), "withX(c)");
        assert_eq!(text(exported_expression(&d).unwrap(), d.text()), "withX(c)");
    }

    #[test]
    fn test_array_literal_export_unwraps_satisfies() {
        let d = doc(
            "routes.ts",
            "export default [index('routes/home.tsx')] satisfies RouteConfig;\n",
        );
        let array = array_literal_export(&d).unwrap();
        assert_eq!(text(array, d.text()), "[index('routes/home.tsx')]");

        let d = doc("routes.ts", "export default flatRoutes();\n");
        assert!(array_literal_export(&d).is_none());
    }

    #[test]
    fn test_exported_object_follows_calls_and_bindings() {
        let d = doc(
            "vite.config.ts",
            "import { defineConfig } from 'vite';\nexport default defineConfig({ plugins: [] });\n",
        );
        assert_eq!(text(exported_object(&d).unwrap(), d.text()), "{ plugins: [] }");

        let d = doc(
            "next.config.mjs",
            "const nextConfig = { reactStrictMode: true };\nexport default nextConfig;\n",
        );
        assert_eq!(
            text(exported_object(&d).unwrap(), d.text()),
            "{ reactStrictMode: true }"
        );

        let d = doc("vite.config.ts", "export default defineConfig(() => ({}));\n");
        assert!(exported_object(&d).is_none());
    }

    #[test]
    fn test_wrapping_call_through_bindings_and_outer_calls() {
        let d = doc(
            "next.config.mjs",
            "const config = withSentryConfig({}, { org: 'old' });\nexport default config;\n",
        );
        let call = wrapping_call(&d, "withSentryConfig").unwrap();
        assert_eq!(text(call, d.text()), "withSentryConfig({}, { org: 'old' })");

        let d = doc(
            "next.config.js",
            "module.exports = withBundleAnalyzer(withSentryConfig(cfg, { org: 'old' }));\n",
        );
        let call = wrapping_call(&d, "withSentryConfig").unwrap();
        assert_eq!(text(call, d.text()), "withSentryConfig(cfg, { org: 'old' })");
        assert!(wrapping_call(&d, "withOther").is_none());
    }

    #[test]
    fn test_named_object_property_last_wins() {
        let d = doc("a.js", "export default { a: 1, b: 2, a: 3 };\n");
        let object = exported_object(&d).unwrap();
        let prop = named_object_property(object, "a", d.text()).unwrap();
        assert_eq!(text(prop, d.text()), "a: 3");
        assert!(named_object_property(object, "c", d.text()).is_none());
    }
}
