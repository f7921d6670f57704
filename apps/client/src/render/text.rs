use std::fmt::Write;

use super::{FieldNode, TextBlock, NONE_LISTED, NOT_PROVIDED};
use super::text_block::DEFAULT_WIDTH;

const INDENT: &str = "  ";

/// Lays a field tree out as indented terminal text, wrapped at the default width.
pub fn to_text(node: &FieldNode) -> String {
    to_text_with_width(node, DEFAULT_WIDTH)
}

/// Rows whose value renders to a single block sit on one line (`Label: value`);
/// rows holding entries or nested rows open an indented block underneath.
/// Text blocks are resized to the width left at their indent and grow a line per row.
pub fn to_text_with_width(node: &FieldNode, width: usize) -> String {
    let mut out = String::new();
    write_node(&mut out, node, 0, width);
    out
}

fn write_node(out: &mut String, node: &FieldNode, level: usize, width: usize) {
    let pad = INDENT.repeat(level);
    match node {
        FieldNode::Entries(entries) => {
            for entry in entries {
                let _ = writeln!(out, "{pad}{}", entry.label());
                write_node(out, &entry.node, level + 1, width);
            }
        }
        FieldNode::Rows { rows, .. } => {
            for row in rows {
                if !row.complex || row.value.is_leaf() {
                    let cont = format!("{pad}{INDENT}");
                    let text = leaf_text(&row.value, width.saturating_sub(cont.len()), &cont);
                    let _ = writeln!(out, "{pad}{}: {text}", row.label);
                } else {
                    let _ = writeln!(out, "{pad}{}:", row.label);
                    write_node(out, &row.value, level + 1, width);
                }
            }
        }
        leaf => {
            let _ = writeln!(out, "{pad}{}", leaf_text(leaf, width.saturating_sub(pad.len()), &pad));
        }
    }
}

/// A leaf as text; continuation lines start with `pad`.
fn leaf_text(node: &FieldNode, width: usize, pad: &str) -> String {
    match node {
        FieldNode::Missing => NOT_PROVIDED.to_string(),
        FieldNode::NoneListed => NONE_LISTED.to_string(),
        FieldNode::Text(block) | FieldNode::Joined { block, .. } => {
            fit_lines(block, width).join(&format!("\n{pad}"))
        }
        _ => String::new(),
    }
}

fn fit_lines(block: &TextBlock, width: usize) -> Vec<String> {
    let mut block = block.clone();
    block.set_width(width);
    block.lines()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;
    use serde_json::json;

    #[test]
    fn test_flat_document() {
        let tree = render(&json!({"name": "Jane Doe", "skills": ["Go", "Rust"], "phone": null}), 0);
        assert_eq!(
            to_text(&tree),
            "Name: Jane Doe\nSkills: Go, Rust\nPhone: Not provided\n"
        );
    }

    #[test]
    fn test_nested_entries_are_indented() {
        let data = json!({
            "experience": [
                {"company": "Acme", "responsibilities": []},
                {"company": "Globex", "responsibilities": ["Ship", "Review"]}
            ]
        });
        let expected = "\
Experience:
  Entry 1
    Company: Acme
    Responsibilities: None listed
  Entry 2
    Company: Globex
    Responsibilities: Ship, Review
";
        assert_eq!(to_text(&render(&data, 0)), expected);
    }

    #[test]
    fn test_multiline_value_stays_under_row() {
        let tree = render(&json!({"summary": "Line one\nLine two"}), 0);
        assert_eq!(to_text(&tree), "Summary: Line one\n  Line two\n");
    }

    #[test]
    fn test_long_value_wraps_under_row() {
        let tree = render(&json!({"summary": "abcdefghijkl"}), 0);
        assert_eq!(to_text_with_width(&tree, 8), "Summary: abcdef\n  ghijkl\n");
    }

    #[test]
    fn test_root_scalar_and_placeholder() {
        assert_eq!(to_text(&render(&json!("plain"), 0)), "plain\n");
        assert_eq!(to_text(&render(&json!(null), 0)), "Not provided\n");
    }
}
