//! Flat export of the document tree for storage

use super::node::{DocumentNode, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One storable unit of the agreement: a leaf Section, or an Article that
/// has no Sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRow {
    /// `None` for a Section found outside any Article
    pub article_numeral: Option<String>,
    pub article_title: String,
    pub title: String,
    pub citation: Option<String>,
    pub section_index: Option<u32>,
    pub body_text: String,
    /// Article text that precedes its first Section; set on that first Section's row
    pub preamble: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    /// Set when an earlier row already carries the same citation
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub repeated: bool,
}

impl StructureRow {
    fn from_node(node: &DocumentNode, article: Option<&DocumentNode>) -> Self {
        let section_index = match node.kind {
            NodeKind::Section => node.numeral.as_deref().and_then(|n| n.parse().ok()),
            _ => None,
        };
        Self {
            article_numeral: article.and_then(|a| a.numeral.clone()),
            article_title: article.map(|a| a.title.clone()).unwrap_or_default(),
            title: node.title.clone(),
            citation: node.citation.clone(),
            section_index,
            body_text: node.body_text(),
            preamble: None,
            start_line: node.start_line,
            end_line: node.end_line.unwrap_or(node.start_line),
            repeated: false,
        }
    }

    /// Key the row is stored under: its citation, or its position when it has
    /// none. A repeated citation is qualified with its position.
    pub fn key(&self) -> String {
        match &self.citation {
            Some(citation) if self.repeated => format!("{}@line:{}", citation, self.start_line),
            Some(citation) => citation.clone(),
            None => format!("line:{}", self.start_line),
        }
    }
}

/// Flatten a DOCUMENT root into rows, in document order.
///
/// Front matter owned by the root itself is not exported.
pub fn flatten(root: &DocumentNode) -> Vec<StructureRow> {
    let mut rows = Vec::new();
    for child in &root.children {
        match child.kind {
            NodeKind::Article if child.is_leaf() => {
                rows.push(StructureRow::from_node(child, Some(child)));
            }
            NodeKind::Article => {
                let preamble = child.body_text();
                for (i, section) in child.children.iter().enumerate() {
                    let mut row = StructureRow::from_node(section, Some(child));
                    if i == 0 && !preamble.is_empty() {
                        row.preamble = Some(preamble.clone());
                    }
                    rows.push(row);
                }
            }
            _ => rows.push(StructureRow::from_node(child, None)),
        }
    }

    let mut seen = HashSet::new();
    for row in &mut rows {
        if let Some(citation) = &row.citation {
            row.repeated = !seen.insert(citation.clone());
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{AnomalyKind, RawLine, StructureBuilder};

    #[test]
    fn one_row_per_leaf_section_or_sectionless_article() {
        let text = "\
Section 9. Stray.
orphan body
ARTICLE I
Definitions
Intro to definitions.
Section 1. Terms.
term text
Section 2. Scope.
scope text
ARTICLE II
Contracts
contract text
";
        let seg = StructureBuilder::new().build(&RawLine::split(text));
        let rows = flatten(&seg.root);
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].article_numeral, None);
        assert_eq!(rows[0].section_index, Some(9));
        assert_eq!(rows[0].key(), "line:0");

        assert_eq!(rows[1].article_numeral.as_deref(), Some("I"));
        assert_eq!(rows[1].article_title, "Definitions");
        assert_eq!(rows[1].title, "Terms");
        assert_eq!(rows[1].citation.as_deref(), Some("Article I, Section 1"));
        assert_eq!(rows[1].preamble.as_deref(), Some("Intro to definitions."));
        assert_eq!(rows[1].body_text, "term text");

        assert_eq!(rows[2].preamble, None);
        assert_eq!(rows[2].key(), "Article I, Section 2");

        assert_eq!(rows[3].citation.as_deref(), Some("Article II"));
        assert_eq!(rows[3].section_index, None);
        assert_eq!(rows[3].body_text, "contract text");
        assert_eq!((rows[3].start_line, rows[3].end_line), (9, 12));
    }

    #[test]
    fn repeated_section_number_gets_its_own_key() {
        let text = "ARTICLE I\nTitle\nSection 1. Alpha.\na\nSection 1. Beta.\nb\n";
        let seg = StructureBuilder::new().build(&RawLine::split(text));

        let duplicates: Vec<_> = seg
            .warnings()
            .filter(|a| a.kind == AnomalyKind::DuplicateSection)
            .map(|a| a.line)
            .collect();
        assert_eq!(duplicates, vec![4]);

        let rows = flatten(&seg.root);
        let keys: Vec<_> = rows.iter().map(StructureRow::key).collect();
        assert_eq!(keys, vec!["Article I, Section 1", "Article I, Section 1@line:4"]);
        assert!(rows.iter().all(|r| r.citation.as_deref() == Some("Article I, Section 1")));
    }
}
