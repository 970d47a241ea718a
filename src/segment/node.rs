//! Document tree produced by the structure builder

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Level of a node in the agreement hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Document,
    Article,
    Section,
}

/// A node of the segmented agreement.
///
/// Line ranges are half-open: a closed node covers `[start_line, end_line)`.
/// A node whose `end_line` is `None` is still open; trees returned by
/// [`StructureBuilder::build`](super::StructureBuilder::build) are always
/// fully closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    pub kind: NodeKind,
    pub title: String,
    /// Roman numeral (Article) or section number (Section) as written
    pub numeral: Option<String>,
    pub citation: Option<String>,
    pub start_line: usize,
    pub end_line: Option<usize>,
    pub children: Vec<DocumentNode>,
    pub body_lines: Vec<String>,
}

impl DocumentNode {
    pub(crate) fn new(kind: NodeKind, title: impl Into<String>, start_line: usize) -> Self {
        Self {
            kind,
            title: title.into(),
            numeral: None,
            citation: None,
            start_line,
            end_line: None,
            children: Vec::new(),
            body_lines: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_line.is_none()
    }

    /// Line span of a closed node.
    pub fn span(&self) -> Option<Range<usize>> {
        self.end_line.map(|end| self.start_line..end)
    }

    /// Direct Article children, in document order.
    pub fn articles(&self) -> impl Iterator<Item = &DocumentNode> {
        self.children.iter().filter(|c| c.kind == NodeKind::Article)
    }

    /// Find a direct Article child by numeral.
    pub fn article(&self, numeral: &str) -> Option<&DocumentNode> {
        self.articles().find(|a| a.numeral.as_deref() == Some(numeral))
    }

    /// Find a direct Section child by number.
    pub fn section(&self, number: &str) -> Option<&DocumentNode> {
        self.children
            .iter()
            .find(|c| c.kind == NodeKind::Section && c.numeral.as_deref() == Some(number))
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Body text joined with newlines.
    pub fn body_text(&self) -> String {
        self.body_lines.join("\n")
    }

    /// Ranges owned directly by this node: its span minus its children's spans.
    pub fn own_ranges(&self) -> Vec<Range<usize>> {
        let Some(span) = self.span() else {
            return Vec::new();
        };
        let mut ranges = Vec::new();
        let mut cursor = span.start;
        for child in &self.children {
            if let Some(child_span) = child.span() {
                if child_span.start > cursor {
                    ranges.push(cursor..child_span.start);
                }
                cursor = cursor.max(child_span.end);
            }
        }
        if span.end > cursor {
            ranges.push(cursor..span.end);
        }
        ranges
    }

    /// Count of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(DocumentNode::node_count).sum::<usize>()
    }
}
