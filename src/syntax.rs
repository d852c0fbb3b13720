//! Small helpers over tree-sitter nodes of the TypeScript grammars.

use tree_sitter::Node;

/// Returns the named children of a node, skipping comments.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

/// Returns all children of a node, including anonymous tokens.
pub fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Returns the source text of a node.
pub fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.start_byte()..node.end_byte()]
}

/// Strips parentheses and TypeScript `satisfies`/`as`/`!` wrappers.
pub fn unwrap_expression(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    loop {
        match current.kind() {
            "parenthesized_expression" | "satisfies_expression" | "as_expression"
            | "non_null_expression" => match named_children(current).first() {
                Some(inner) => current = *inner,
                None => return current,
            },
            _ => return current,
        }
    }
}

/// Returns the decoded value of a `string` node.
pub fn string_value(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    crate::value::unquote(text(node, source))
}

/// Returns the callee text of a call expression (`withX`, `Sentry.init`).
pub fn callee_name<'s>(call: Node<'_>, source: &'s str) -> Option<&'s str> {
    if call.kind() != "call_expression" {
        return None;
    }
    let function = call.child_by_field_name("function")?;
    match function.kind() {
        "identifier" | "member_expression" => Some(text(function, source)),
        _ => None,
    }
}

/// Returns the argument expressions of a call, without punctuation.
pub fn call_arguments(call: Node<'_>) -> Vec<Node<'_>> {
    call.child_by_field_name("arguments")
        .map(named_children)
        .unwrap_or_default()
}

/// Returns the key of an object property as written (`pair`, shorthand).
pub fn property_key(property: Node<'_>, source: &str) -> Option<String> {
    match property.kind() {
        "pair" => {
            let key = property.child_by_field_name("key")?;
            match key.kind() {
                "property_identifier" | "number" => Some(text(key, source).to_string()),
                "string" => string_value(key, source),
                _ => None,
            }
        }
        "shorthand_property_identifier" => Some(text(property, source).to_string()),
        _ => None,
    }
}

/// Returns true if the last token before the closing bracket is a comma.
pub fn has_trailing_comma(container: Node<'_>) -> bool {
    let tokens: Vec<Node<'_>> = children(container)
        .into_iter()
        .filter(|n| n.kind() != "comment")
        .collect();
    tokens.len() >= 2 && tokens[tokens.len() - 2].kind() == ","
}

/// Returns the offset of the closing bracket of an object or array node.
pub fn closing_offset(container: Node<'_>) -> usize {
    container.end_byte().saturating_sub(1)
}

/// Returns the leading whitespace of the line containing `pos`.
pub fn line_indent(source: &str, pos: usize) -> &str {
    let start = source[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &source[start..];
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

/// Returns true if two offsets are on the same line.
pub fn same_line(source: &str, a: usize, b: usize) -> bool {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    !source[lo..hi].contains('\n')
}

/// Returns the offset just after the last non-whitespace byte before `pos`.
pub fn end_of_content_before(source: &str, pos: usize) -> usize {
    source[..pos].trim_end().len()
}

/// Returns the line ending a text uses. Any CRLF makes the whole file CRLF.
pub fn line_ending(source: &str) -> &'static str {
    if source.contains("\r\n") { "\r\n" } else { "\n" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{Language, TypeScript};
    use std::path::Path;

    fn first_statement_expr(source: &str) -> (tree_sitter::Tree, String) {
        let tree = TypeScript.parse(source, Path::new("a.ts")).unwrap();
        (tree, source.to_string())
    }

    #[test]
    fn test_unwrap_satisfies_and_parens() {
        let (tree, src) = first_statement_expr("export default ([1, 2] satisfies number[]);");
        let export = named_children(tree.root_node())[0];
        let value = export.child_by_field_name("value").unwrap();
        let inner = unwrap_expression(value);
        assert_eq!(inner.kind(), "array");
        assert_eq!(text(inner, &src), "[1, 2]");
    }

    #[test]
    fn test_property_keys_and_trailing_comma() {
        let (tree, src) = first_statement_expr("const o = { a: 1, 'b-c': 2, d, };");
        let decl = named_children(tree.root_node())[0];
        let declarator = named_children(decl)[0];
        let object = declarator.child_by_field_name("value").unwrap();
        let keys: Vec<String> = named_children(object)
            .into_iter()
            .filter_map(|p| property_key(p, &src))
            .collect();
        assert_eq!(keys, vec!["a", "b-c", "d"]);
        assert!(has_trailing_comma(object));
        assert_eq!(&src[closing_offset(object)..closing_offset(object) + 1], "}");
    }

    #[test]
    fn test_line_helpers() {
        let src = "a\n    b: 1,\n}";
        let b = src.find('b').unwrap();
        assert_eq!(line_indent(src, b), "    ");
        assert!(!same_line(src, 0, b));
        assert_eq!(end_of_content_before(src, src.len() - 1), src.find(',').unwrap() + 1);
    }
}
