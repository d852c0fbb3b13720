//! Insertion-point locators.
//!
//! Every locator answers with `None` when it cannot find a strictly safe
//! place. Callers treat `None` as "cannot auto-patch" and fall back to
//! copy-paste instructions; nothing here guesses an approximate location.

pub mod js;
pub mod lines;

pub use js::{
    array_literal_export, default_export_declaration, default_export_value, exported_expression,
    exported_object, last_import_position, module_exports_assignment, named_object_property,
    top_level_binding, wrapping_call,
};
pub use lines::{Anchor, LineLocator, Occurrence};

use tree_sitter::Node;

/// A place in one document where new text goes.
///
/// Borrows the document it was located in, so it cannot be carried over to
/// another document or across a re-parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint<'doc> {
    /// The very start of the document.
    Start,
    /// Directly after a syntax node; new statements start on the next line.
    After(Node<'doc>),
    /// After a whole line of a text document.
    AfterLine {
        /// Offset just past the line's content (before its newline, if any).
        end: usize,
        /// Indentation of the anchor line.
        indent: &'doc str,
    },
}

impl InsertionPoint<'_> {
    /// Returns the byte offset of the insertion.
    pub fn offset(&self) -> usize {
        match self {
            InsertionPoint::Start => 0,
            InsertionPoint::After(node) => node.end_byte(),
            InsertionPoint::AfterLine { end, .. } => *end,
        }
    }
}
