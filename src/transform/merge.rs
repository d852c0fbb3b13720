//! Layout-preserving object/array merging shared by the JS and JSONC
//! mutators.
//!
//! Both tree kinds are first projected onto a small view (objects, arrays,
//! opaque scalars with spans). Merging produces text edits against the
//! original source, reusing the container's indentation, single- or
//! multi-line layout and trailing-comma style.

use super::TextEdit;
use super::patch::{ElementMatch, MergeStrategy};
use crate::error::{PatchError, Result};
use crate::jsonc::{JsonKind, JsonNode};
use crate::syntax::{
    self, callee_name, closing_offset, end_of_content_before, has_trailing_comma, line_indent,
    named_children, property_key, same_line, unwrap_expression,
};
use crate::value::{ConfigValue, ElementKey, RenderStyle, normalize_source};
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use tree_sitter::Node;

#[derive(Debug, Clone)]
pub(crate) enum ValueView {
    Object(ObjectView),
    Array(ArrayView),
    Scalar {
        span: Range<usize>,
        key: ElementKey,
        callee: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct ObjectView {
    pub span: Range<usize>,
    pub members: Vec<MemberView>,
    pub trailing_comma: bool,
    pub close: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct MemberView {
    /// `None` for spreads and methods.
    pub key: Option<String>,
    pub span: Range<usize>,
    pub value: ValueView,
    /// `{ key }` shorthand: the value has no separate span.
    pub shorthand: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ArrayView {
    pub span: Range<usize>,
    pub elements: Vec<ValueView>,
    pub trailing_comma: bool,
    pub close: usize,
}

impl ValueView {
    pub fn span(&self) -> Range<usize> {
        match self {
            ValueView::Object(o) => o.span.clone(),
            ValueView::Array(a) => a.span.clone(),
            ValueView::Scalar { span, .. } => span.clone(),
        }
    }

    fn element_key(&self, source: &str) -> ElementKey {
        match self {
            ValueView::Scalar { key, .. } => key.clone(),
            other => ElementKey::Text(normalize_source(&source[other.span()])),
        }
    }

    fn callee(&self) -> Option<&str> {
        match self {
            ValueView::Scalar { callee, .. } => callee.as_deref(),
            _ => None,
        }
    }

    /// Builds a view of a JavaScript expression node.
    pub fn from_js(node: Node<'_>, source: &str) -> Self {
        let node = unwrap_expression(node);
        match node.kind() {
            "object" => ValueView::Object(ObjectView {
                span: node.byte_range(),
                members: named_children(node)
                    .into_iter()
                    .map(|p| MemberView::from_js(p, source))
                    .collect(),
                trailing_comma: has_trailing_comma(node),
                close: closing_offset(node),
            }),
            "array" => ValueView::Array(ArrayView {
                span: node.byte_range(),
                elements: named_children(node)
                    .into_iter()
                    .map(|e| ValueView::from_js(e, source))
                    .collect(),
                trailing_comma: has_trailing_comma(node),
                close: closing_offset(node),
            }),
            _ => ValueView::Scalar {
                span: node.byte_range(),
                key: ElementKey::from_source(syntax::text(node, source)),
                callee: callee_name(node, source).map(str::to_string),
            },
        }
    }

    /// Builds a view of a JSONC node.
    pub fn from_json(node: &JsonNode, source: &str) -> Self {
        match &node.kind {
            JsonKind::Object(obj) => ValueView::Object(ObjectView {
                span: node.span.clone(),
                members: obj
                    .members
                    .iter()
                    .map(|m| MemberView {
                        key: Some(m.key.clone()),
                        span: m.span(),
                        value: ValueView::from_json(&m.value, source),
                        shorthand: false,
                    })
                    .collect(),
                trailing_comma: obj.trailing_comma,
                close: obj.close,
            }),
            JsonKind::Array(arr) => ValueView::Array(ArrayView {
                span: node.span.clone(),
                elements: arr
                    .elements
                    .iter()
                    .map(|e| ValueView::from_json(e, source))
                    .collect(),
                trailing_comma: arr.trailing_comma,
                close: arr.close,
            }),
            JsonKind::String(s) => ValueView::Scalar {
                span: node.span.clone(),
                key: ElementKey::Literal(s.clone()),
                callee: None,
            },
            _ => ValueView::Scalar {
                span: node.span.clone(),
                key: ElementKey::Text(normalize_source(&source[node.span.clone()])),
                callee: None,
            },
        }
    }
}

impl MemberView {
    fn from_js(property: Node<'_>, source: &str) -> Self {
        let key = property_key(property, source);
        match property.kind() {
            "pair" => {
                let value = property
                    .child_by_field_name("value")
                    .map(|v| ValueView::from_js(v, source))
                    .unwrap_or_else(|| opaque(property, source));
                MemberView {
                    key,
                    span: property.byte_range(),
                    value,
                    shorthand: false,
                }
            }
            "shorthand_property_identifier" => MemberView {
                key,
                span: property.byte_range(),
                value: opaque(property, source),
                shorthand: true,
            },
            _ => MemberView {
                key: None,
                span: property.byte_range(),
                value: opaque(property, source),
                shorthand: false,
            },
        }
    }
}

fn opaque(node: Node<'_>, source: &str) -> ValueView {
    ValueView::Scalar {
        span: node.byte_range(),
        key: ElementKey::Text(normalize_source(syntax::text(node, source))),
        callee: None,
    }
}

impl ObjectView {
    /// The last member with the given key.
    pub fn member(&self, key: &str) -> Option<&MemberView> {
        self.members
            .iter()
            .rev()
            .find(|m| m.key.as_deref() == Some(key))
    }
}

/// The operation applied at the end of a key path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MergeOp {
    Overwrite,
    Union(ElementMatch),
    Deep,
}

impl From<MergeStrategy> for MergeOp {
    fn from(strategy: MergeStrategy) -> Self {
        match strategy {
            MergeStrategy::Overwrite => MergeOp::Overwrite,
            MergeStrategy::UnionDedupe => MergeOp::Union(ElementMatch::Text),
            MergeStrategy::DeepMergeObject => MergeOp::Deep,
        }
    }
}

/// A container that new items are inserted into.
struct Slot {
    open: usize,
    close: usize,
    first_start: Option<usize>,
    last_end: Option<usize>,
    trailing_comma: bool,
    is_object: bool,
}

/// Collects edits for one merge against one source text.
pub(crate) struct Merger<'a> {
    source: &'a str,
    style: RenderStyle,
    edits: Vec<TextEdit>,
}

impl<'a> Merger<'a> {
    pub fn new(source: &'a str, style: RenderStyle) -> Self {
        Self {
            source,
            style,
            edits: Vec::new(),
        }
    }

    pub fn into_edits(self) -> Vec<TextEdit> {
        self.edits
    }

    /// Applies `op` to `key` of the object found by following `path` from
    /// `object`. Missing intermediate objects are created.
    pub fn merge_at_path(
        &mut self,
        object: &ObjectView,
        path: &[String],
        key: &str,
        value: &ConfigValue,
        op: MergeOp,
    ) -> Result<()> {
        let Some((first, rest)) = path.split_first() else {
            return match object.member(key) {
                Some(member) => self.merge_member(member, value, op),
                None => {
                    let value = match op {
                        MergeOp::Union(matching) => dedupe_new(value, matching),
                        _ => value.clone(),
                    };
                    self.insert_members(object, &[(key.to_string(), value)]);
                    Ok(())
                }
            };
        };

        match object.member(first) {
            Some(MemberView {
                value: ValueView::Object(inner),
                ..
            }) => self.merge_at_path(inner, rest, key, value, op),
            Some(_) => Err(PatchError::locator_miss(format!("object literal at `{first}`"))),
            None => {
                let nested = rest.iter().rev().fold(
                    ConfigValue::object([(key.to_string(), value.clone())]),
                    |inner, segment| ConfigValue::object([(segment.clone(), inner)]),
                );
                self.insert_members(object, &[(first.clone(), nested)]);
                Ok(())
            }
        }
    }

    /// Appends elements to an array, skipping those already present.
    pub fn append_elements(&mut self, array: &ArrayView, items: &[ConfigValue], matching: ElementMatch) {
        let mut seen: HashSet<ElementKey> = array
            .elements
            .iter()
            .map(|e| e.element_key(self.source))
            .collect();
        let mut callees: HashSet<String> = array
            .elements
            .iter()
            .filter_map(|e| e.callee().map(str::to_string))
            .collect();

        let fresh: Vec<&ConfigValue> = items
            .iter()
            .filter(|item| {
                if matching == ElementMatch::Callee {
                    if let Some(callee) = item.callee() {
                        if !callees.insert(callee.to_string()) {
                            return false;
                        }
                    }
                }
                seen.insert(item.element_key())
            })
            .collect();
        if fresh.is_empty() {
            return;
        }

        let slot = Slot {
            open: array.span.start,
            close: array.close,
            first_start: array.elements.first().map(|e| e.span().start),
            last_end: array.elements.last().map(|e| e.span().end),
            trailing_comma: array.trailing_comma,
            is_object: false,
        };
        let style = self.style.clone();
        self.insert_into(slot, |indent| {
            fresh.iter().map(|item| item.render(&style, indent)).collect()
        });
    }

    fn merge_member(&mut self, member: &MemberView, value: &ConfigValue, op: MergeOp) -> Result<()> {
        match (op, &member.value, value) {
            (MergeOp::Union(matching), ValueView::Array(array), ConfigValue::Array(items)) => {
                self.append_elements(array, items, matching);
                Ok(())
            }
            (MergeOp::Union(matching), ValueView::Array(array), item) => {
                self.append_elements(array, std::slice::from_ref(item), matching);
                Ok(())
            }
            (MergeOp::Union(_), _, _) => Err(PatchError::locator_miss(format!(
                "array literal at `{}`",
                member.key.as_deref().unwrap_or("?")
            ))),
            (MergeOp::Deep, ValueView::Object(object), ConfigValue::Object(pairs)) => {
                self.merge_object(object, pairs)
            }
            _ => {
                self.overwrite(member, value);
                Ok(())
            }
        }
    }

    fn merge_object(&mut self, object: &ObjectView, pairs: &[(String, ConfigValue)]) -> Result<()> {
        let mut additions = Vec::new();
        for (key, value) in pairs {
            match object.member(key) {
                Some(member) => self.merge_member(member, value, MergeOp::Deep)?,
                None => additions.push((key.clone(), value.clone())),
            }
        }
        if !additions.is_empty() {
            self.insert_members(object, &additions);
        }
        Ok(())
    }

    fn overwrite(&mut self, member: &MemberView, value: &ConfigValue) {
        let indent = line_indent(self.source, member.span.start).to_string();
        let rendered = value.render(&self.style, &indent);
        let key = member.key.as_deref().unwrap_or_default();
        if member.shorthand {
            self.edits.push(TextEdit::replace(
                member.span.clone(),
                self.style.member(key, value, &indent),
            ));
            return;
        }
        let span = member.value.span();
        if normalize_source(&self.source[span.clone()]) == normalize_source(&rendered) {
            return;
        }
        self.edits.push(TextEdit::replace(span, rendered));
    }

    fn insert_members(&mut self, object: &ObjectView, additions: &[(String, ConfigValue)]) {
        let slot = Slot {
            open: object.span.start,
            close: object.close,
            first_start: object.members.first().map(|m| m.span.start),
            last_end: object.members.last().map(|m| m.span.end),
            trailing_comma: object.trailing_comma,
            is_object: true,
        };
        let style = self.style.clone();
        self.insert_into(slot, |indent| {
            additions
                .iter()
                .map(|(k, v)| style.member(k, v, indent))
                .collect()
        });
    }

    fn insert_into(&mut self, slot: Slot, render: impl Fn(&str) -> Vec<String>) {
        let source = self.source;
        match (slot.first_start, slot.last_end) {
            (Some(first), Some(last)) if same_line(source, slot.open, first) => {
                let items = render(line_indent(source, slot.open));
                self.edits
                    .push(TextEdit::insert(last, format!(", {}", items.join(", "))));
            }
            (Some(first), Some(last)) => {
                let indent = line_indent(source, first).to_string();
                let items = render(&indent);
                if !slot.trailing_comma {
                    self.edits.push(TextEdit::insert(last, ","));
                }
                let text = if slot.trailing_comma {
                    items.iter().map(|i| format!("\n{indent}{i},")).collect::<String>()
                } else {
                    items
                        .iter()
                        .map(|i| format!("\n{indent}{i}"))
                        .collect::<Vec<_>>()
                        .join(",")
                };
                let anchor = end_of_content_before(source, slot.close);
                self.edits.push(TextEdit::insert(anchor, text));
            }
            _ => {
                let interior = &source[slot.open + 1..slot.close];
                let outer = line_indent(source, slot.open).to_string();
                let indent = format!("{outer}{}", self.style.indent_unit);
                if !interior.trim().is_empty() {
                    // Only comments inside: keep them and add after.
                    let items = render(&indent);
                    let text = items
                        .iter()
                        .map(|i| format!("\n{indent}{i}"))
                        .collect::<Vec<_>>()
                        .join(",");
                    let anchor = end_of_content_before(source, slot.close);
                    self.edits.push(TextEdit::insert(anchor, format!("{text}\n{outer}")));
                } else if slot.is_object || interior.contains('\n') {
                    let items = render(&indent);
                    let mut text = String::from("\n");
                    text.push_str(
                        &items
                            .iter()
                            .map(|i| format!("{indent}{i}"))
                            .collect::<Vec<_>>()
                            .join(",\n"),
                    );
                    if self.style.trailing_commas {
                        text.push(',');
                    }
                    text.push('\n');
                    text.push_str(&outer);
                    self.edits
                        .push(TextEdit::replace(slot.open + 1..slot.close, text));
                } else {
                    let items = render(&outer);
                    self.edits
                        .push(TextEdit::replace(slot.open + 1..slot.close, items.join(", ")));
                }
            }
        }
    }
}

fn dedupe_new(value: &ConfigValue, matching: ElementMatch) -> ConfigValue {
    let ConfigValue::Array(items) = value else {
        return ConfigValue::Array(vec![value.clone()]);
    };
    let mut seen = HashSet::new();
    let mut callees = HashSet::new();
    ConfigValue::Array(
        items
            .iter()
            .filter(|item| {
                if matching == ElementMatch::Callee {
                    if let Some(callee) = item.callee() {
                        if !callees.insert(callee.to_string()) {
                            return false;
                        }
                    }
                }
                seen.insert(item.element_key())
            })
            .cloned()
            .collect(),
    )
}

/// Detects the indentation unit of a file (tab or the smallest run of
/// leading spaces). Defaults to two spaces.
pub(crate) fn detect_indent_unit(source: &str) -> String {
    let mut smallest: Option<usize> = None;
    for line in source.lines() {
        if line.starts_with('\t') {
            return "\t".to_string();
        }
        let spaces = line.len() - line.trim_start_matches(' ').len();
        let rest = line.trim_start();
        if spaces == 0 || rest.is_empty() || rest.starts_with('*') {
            continue;
        }
        smallest = Some(smallest.map_or(spaces, |s| s.min(spaces)));
    }
    " ".repeat(smallest.unwrap_or(2))
}

/// Returns true if any multi-line container in the source ends with a comma.
pub(crate) fn detect_trailing_commas(source: &str) -> bool {
    Regex::new(r",[ \t]*\r?\n[ \t]*[}\]]")
        .map(|re| re.is_match(source))
        .unwrap_or(false)
}
