//! Non-fatal structural findings recorded while building the tree

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    /// Section heading seen while no Article was open
    OrphanSection,
    /// Article numeral already accepted earlier in the document
    DuplicateNumeral,
    /// Article heading before the configured minimum offset (front matter)
    HeadingBeforeOffset,
    /// Accepted Article with no title in the lookahead window
    UntitledArticle,
    /// Accepted Article numeral lower than the one before it
    OutOfOrderNumeral,
    /// Section number already used inside the same Article
    DuplicateSection,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OrphanSection => "orphan section",
            Self::DuplicateNumeral => "duplicate numeral",
            Self::HeadingBeforeOffset => "heading before offset",
            Self::UntitledArticle => "untitled article",
            Self::OutOfOrderNumeral => "out-of-order numeral",
            Self::DuplicateSection => "duplicate section",
        };
        f.write_str(name)
    }
}

/// A structural irregularity, returned alongside a successfully built tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralAnomaly {
    pub line: usize,
    pub kind: AnomalyKind,
    pub detail: String,
}

impl StructuralAnomaly {
    pub fn new(line: usize, kind: AnomalyKind, detail: impl Into<String>) -> Self {
        Self {
            line,
            kind,
            detail: detail.into(),
        }
    }

    /// Anomalies a reviewer should look at, as opposed to informational ones.
    pub fn is_warning(&self) -> bool {
        matches!(
            self.kind,
            AnomalyKind::OrphanSection
                | AnomalyKind::DuplicateNumeral
                | AnomalyKind::DuplicateSection
        )
    }
}

impl fmt::Display for StructuralAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({})", self.line, self.kind, self.detail)
    }
}
