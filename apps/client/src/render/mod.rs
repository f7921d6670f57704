//! Structural Renderer — turns an untyped extraction result into a labelled field tree.
//!
//! `render` is a pure, structurally recursive function over `serde_json::Value`:
//! one case per variant, no shared state between branches. The same input always
//! yields the same tree, in the same order.

pub mod text;
pub mod text_block;

use serde_json::Value;

pub use text::to_text;
pub use text_block::TextBlock;

pub const NOT_PROVIDED: &str = "Not provided";
pub const NONE_LISTED: &str = "None listed";
pub const LIST_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldNode {
    /// A null value, shown as "Not provided".
    Missing,
    /// An empty list, shown as "None listed".
    NoneListed,
    /// A single scalar.
    Text(TextBlock),
    /// A list of scalars joined into one block. `items` is the list length.
    Joined { block: TextBlock, items: usize },
    /// A list with composite elements: "Entry 1", "Entry 2", …
    Entries(Vec<Entry>),
    /// A mapping: one row per key, in insertion order.
    Rows { depth: usize, rows: Vec<FieldRow> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// 1-based position in the source list.
    pub index: usize,
    pub node: FieldNode,
}

impl Entry {
    pub fn label(&self) -> String {
        format!("Entry {}", self.index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRow {
    pub key: String,
    pub label: String,
    /// Set when the value is a mapping or a list. Presentation only.
    pub complex: bool,
    pub value: FieldNode,
}

/// Renders `value` found at nesting level `depth` (0 for the document root).
pub fn render(value: &Value, depth: usize) -> FieldNode {
    match value {
        Value::Null => FieldNode::Missing,
        Value::Array(items) => render_list(items, depth),
        Value::Object(map) => FieldNode::Rows {
            depth,
            rows: map
                .iter()
                .map(|(key, child)| FieldRow {
                    key: key.clone(),
                    label: format_label(key),
                    complex: is_composite(child),
                    value: render(child, depth + 1),
                })
                .collect(),
        },
        scalar => FieldNode::Text(TextBlock::new(scalar_text(scalar))),
    }
}

fn render_list(items: &[Value], depth: usize) -> FieldNode {
    if items.is_empty() {
        return FieldNode::NoneListed;
    }

    if !items.iter().any(is_composite) {
        let joined = items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR);
        return FieldNode::Joined {
            block: TextBlock::new(joined),
            items: items.len(),
        };
    }

    FieldNode::Entries(
        items
            .iter()
            .enumerate()
            .map(|(i, item)| Entry {
                index: i + 1,
                node: render(item, depth + 1),
            })
            .collect(),
    )
}

pub fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// Display form of a scalar. Strings are unquoted; null inside a joined list is empty.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `years_of_experience` → `Years Of Experience`.
///
/// Underscores become spaces, then every ASCII letter or digit that starts a word
/// is uppercased.
pub fn format_label(key: &str) -> String {
    let mut label = String::with_capacity(key.len());
    let mut prev_is_word = false;
    for c in key.chars() {
        let c = if c == '_' { ' ' } else { c };
        let is_word = c.is_ascii_alphanumeric();
        if is_word && !prev_is_word {
            label.push(c.to_ascii_uppercase());
        } else {
            label.push(c);
        }
        prev_is_word = is_word;
    }
    label
}

impl FieldNode {
    /// Scalar and null values of the source covered by this tree. A joined list
    /// covers each of its elements; an empty list covers none.
    pub fn scalar_leaves(&self) -> usize {
        match self {
            FieldNode::Missing | FieldNode::Text(_) => 1,
            FieldNode::NoneListed => 0,
            FieldNode::Joined { items, .. } => *items,
            FieldNode::Entries(entries) => entries.iter().map(|e| e.node.scalar_leaves()).sum(),
            FieldNode::Rows { rows, .. } => rows.iter().map(|r| r.value.scalar_leaves()).sum(),
        }
    }

    /// True for nodes that print as a single block of text.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, FieldNode::Entries(_) | FieldNode::Rows { .. })
    }

    /// Rows of a mapping node, or an empty slice.
    pub fn rows(&self) -> &[FieldRow] {
        match self {
            FieldNode::Rows { rows, .. } => rows,
            _ => &[],
        }
    }

    /// Finds a row by its original key.
    pub fn row(&self, key: &str) -> Option<&FieldRow> {
        self.rows().iter().find(|r| r.key == key)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            FieldNode::Missing => Some(NOT_PROVIDED),
            FieldNode::NoneListed => Some(NONE_LISTED),
            FieldNode::Text(block) | FieldNode::Joined { block, .. } => Some(block.text()),
            _ => None,
        }
    }
}
