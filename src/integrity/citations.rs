//! Citation integrity: do records point at structure that actually exists?

use super::record::DerivedRecord;
use crate::citation::{detect_malformed, repair, Citation};
use crate::segment::{DocumentNode, NodeKind, StructureRow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Every Article and Section citation a segmented document can resolve.
#[derive(Debug, Clone, Default)]
pub struct CitationIndex {
    known: HashSet<Citation>,
}

impl CitationIndex {
    pub fn from_root(root: &DocumentNode) -> Self {
        let mut known = HashSet::new();
        for article in root.articles() {
            let Some(numeral) = article.numeral.as_deref() else {
                continue;
            };
            known.insert(Citation::article(numeral));
            for section in &article.children {
                if section.kind != NodeKind::Section {
                    continue;
                }
                if let Some(number) = section.numeral.as_deref() {
                    known.insert(Citation::article(numeral).with_section(number));
                }
            }
        }
        Self { known }
    }

    /// Build from exported rows, e.g. a structure loaded back from the store.
    pub fn from_rows(rows: &[StructureRow]) -> Self {
        let mut known = HashSet::new();
        for row in rows {
            if let Some(numeral) = row.article_numeral.as_deref() {
                known.insert(Citation::article(numeral));
            }
            if let Some(citation) = row.citation.as_deref().and_then(Citation::parse) {
                known.insert(citation);
            }
        }
        Self { known }
    }

    pub fn contains(&self, citation: &Citation) -> bool {
        self.known.contains(citation)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Parse `text` and look it up.
    pub fn resolves(&self, text: &str) -> bool {
        Citation::parse(text).is_some_and(|c| self.contains(&c))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CitationIssueKind {
    /// Duplicated tokens; the repaired form resolves
    Malformed,
    /// Well formed (possibly after repair) but names no known location
    Unresolved,
    /// Not a citation at all
    Unparseable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationIssue {
    pub record_id: String,
    pub kind: CitationIssueKind,
    pub original: String,
    /// Set when the citation was malformed
    pub repaired: Option<String>,
}

/// Check each record's citation against `index`, in input order.
///
/// Records without a citation are skipped. At most one issue per record.
pub fn audit_citations(records: &[DerivedRecord], index: &CitationIndex) -> Vec<CitationIssue> {
    let mut issues = Vec::new();
    for record in records {
        let Some(original) = record.citation.as_deref() else {
            continue;
        };
        let repaired = detect_malformed(original).then(|| repair(original));
        let candidate = repaired.as_deref().unwrap_or(original);

        let kind = match Citation::parse(candidate) {
            None => Some(CitationIssueKind::Unparseable),
            Some(citation) if !index.contains(&citation) => Some(CitationIssueKind::Unresolved),
            Some(_) if repaired.is_some() => Some(CitationIssueKind::Malformed),
            Some(_) => None,
        };

        if let Some(kind) = kind {
            issues.push(CitationIssue {
                record_id: record.id.clone(),
                kind,
                original: original.to_string(),
                repaired,
            });
        }
    }
    tracing::debug!(
        checked = records.len(),
        issues = issues.len(),
        "citation audit complete"
    );
    issues
}
