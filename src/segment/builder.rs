//! Structure builder
//!
//! Single forward pass over classified lines, keeping at most one open
//! Article and one open Section beneath the root. Irregular input never
//! fails the build: it is attached under the nearest open ancestor and
//! recorded as a [`StructuralAnomaly`].

use super::anomaly::{AnomalyKind, StructuralAnomaly};
use super::classify::{
    classify, match_section, section_marker, BoundaryMarker, MarkerKind, RawLine, SectionPattern,
    LOOKAHEAD_WINDOW,
};
use super::node::{DocumentNode, NodeKind};
use super::numerals::numeral_to_ordinal;
use crate::citation::normalize;
use crate::config::{check_lookahead, ConfigResult, SegmentConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;

/// Output of a build: the closed tree plus everything irregular found on the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segmentation {
    pub root: DocumentNode,
    pub anomalies: Vec<StructuralAnomaly>,
    pub line_count: usize,
}

/// A maximal line range owned directly by one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: NodeKind,
    pub citation: Option<String>,
    pub range: Range<usize>,
}

impl Segmentation {
    /// Every directly-owned range in the tree, in line order.
    ///
    /// Together these cover `[0, line_count)` exactly once.
    pub fn segments(&self) -> Vec<Segment> {
        fn walk(node: &DocumentNode, out: &mut Vec<Segment>) {
            for range in node.own_ranges() {
                out.push(Segment {
                    kind: node.kind,
                    citation: node.citation.clone(),
                    range,
                });
            }
            for child in &node.children {
                walk(child, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out.sort_by_key(|s| s.range.start);
        out
    }

    /// Accepted Article nodes, in document order.
    pub fn articles(&self) -> impl Iterator<Item = &DocumentNode> {
        self.root.articles()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &StructuralAnomaly> {
        self.anomalies.iter().filter(|a| a.is_warning())
    }
}

/// Builds a [`DocumentNode`] tree from raw lines.
#[derive(Debug, Clone)]
pub struct StructureBuilder {
    title: String,
    min_offset: usize,
    lookahead: usize,
    section_pattern: SectionPattern,
}

impl Default for StructureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self {
            title: "Document".to_string(),
            min_offset: 0,
            lookahead: LOOKAHEAD_WINDOW,
            section_pattern: SectionPattern::default(),
        }
    }

    pub fn from_config(config: &SegmentConfig) -> ConfigResult<Self> {
        Ok(Self::new()
            .with_min_offset(config.min_offset)
            .with_lookahead(config.lookahead)?
            .with_section_pattern(config.section_pattern))
    }

    /// Title given to the DOCUMENT root.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// First line index at which Article headings are accepted.
    ///
    /// Headings earlier than this (tables of contents, index pages) are
    /// treated as body text of the front matter.
    pub fn with_min_offset(mut self, min_offset: usize) -> Self {
        self.min_offset = min_offset;
        self
    }

    /// Lines searched for an Article title; at most [`LOOKAHEAD_WINDOW`].
    pub fn with_lookahead(mut self, lookahead: usize) -> ConfigResult<Self> {
        check_lookahead(lookahead)?;
        self.lookahead = lookahead;
        Ok(self)
    }

    pub fn with_section_pattern(mut self, pattern: SectionPattern) -> Self {
        self.section_pattern = pattern;
        self
    }

    pub fn build(&self, lines: &[RawLine]) -> Segmentation {
        let line_count = lines.last().map(|l| l.index + 1).unwrap_or(0);
        let mut state = BuildState::new(DocumentNode::new(NodeKind::Document, &self.title, 0));

        for (pos, line) in lines.iter().enumerate() {
            if state.consumed_title == Some(line.index) {
                state.consumed_title = None;
                continue;
            }

            let window_end = (pos + 1 + self.lookahead).min(lines.len());
            let lookahead = &lines[pos + 1..window_end];

            match classify(line, lookahead) {
                Some(marker) if marker.kind == MarkerKind::Separator => {}
                Some(marker) => self.on_article(&mut state, marker, lookahead, line),
                None => match section_marker(line, self.section_pattern) {
                    Some(marker) => state.open_section(marker),
                    None => state.push_body(line),
                },
            }
        }

        state.finish(line_count)
    }

    fn on_article(
        &self,
        state: &mut BuildState,
        mut marker: BoundaryMarker,
        lookahead: &[RawLine],
        line: &RawLine,
    ) {
        let numeral = marker.numeral.clone().unwrap_or_default();

        if marker.raw_index < self.min_offset {
            state.anomaly(StructuralAnomaly::new(
                marker.raw_index,
                AnomalyKind::HeadingBeforeOffset,
                format!("ARTICLE {} before offset {}", numeral, self.min_offset),
            ));
            state.push_body(line);
            return;
        }

        if state.accepted.contains(&numeral) {
            state.anomaly(StructuralAnomaly::new(
                marker.raw_index,
                AnomalyKind::DuplicateNumeral,
                format!("ARTICLE {} already accepted", numeral),
            ));
            state.push_body(line);
            return;
        }

        // A Section heading right under the Article is structure, not its title.
        if let Some(title_index) = marker.title_index {
            let title_line = lookahead.iter().find(|l| l.index == title_index);
            if title_line.is_some_and(|l| match_section(&l.text, self.section_pattern).is_some()) {
                marker.label.clear();
                marker.title_index = None;
            }
        }

        state.open_article(marker, numeral);
    }
}

struct BuildState {
    root: DocumentNode,
    article: Option<DocumentNode>,
    section: Option<DocumentNode>,
    accepted: HashSet<String>,
    last_ordinal: Option<usize>,
    consumed_title: Option<usize>,
    anomalies: Vec<StructuralAnomaly>,
}

impl BuildState {
    fn new(root: DocumentNode) -> Self {
        Self {
            root,
            article: None,
            section: None,
            accepted: HashSet::new(),
            last_ordinal: None,
            consumed_title: None,
            anomalies: Vec::new(),
        }
    }

    fn anomaly(&mut self, anomaly: StructuralAnomaly) {
        if anomaly.is_warning() {
            tracing::warn!(line = anomaly.line, kind = %anomaly.kind, "{}", anomaly.detail);
        } else {
            tracing::debug!(line = anomaly.line, kind = %anomaly.kind, "{}", anomaly.detail);
        }
        self.anomalies.push(anomaly);
    }

    fn close_section(&mut self, at: usize) {
        if let Some(mut section) = self.section.take() {
            section.end_line = Some(at);
            match self.article.as_mut() {
                Some(article) => article.children.push(section),
                None => self.root.children.push(section),
            }
        }
    }

    fn close_article(&mut self, at: usize) {
        self.close_section(at);
        if let Some(mut article) = self.article.take() {
            article.end_line = Some(at);
            self.root.children.push(article);
        }
    }

    fn open_article(&mut self, marker: BoundaryMarker, numeral: String) {
        let at = marker.raw_index;
        self.close_article(at);

        let ordinal = numeral_to_ordinal(&numeral);
        if let (Some(prev), Some(current)) = (self.last_ordinal, ordinal) {
            if current < prev {
                self.anomaly(StructuralAnomaly::new(
                    at,
                    AnomalyKind::OutOfOrderNumeral,
                    format!("ARTICLE {} follows a higher numeral", numeral),
                ));
            }
        }
        if marker.label.is_empty() {
            self.anomaly(StructuralAnomaly::new(
                at,
                AnomalyKind::UntitledArticle,
                format!("no title found for ARTICLE {}", numeral),
            ));
        }

        let mut node = DocumentNode::new(NodeKind::Article, marker.label, at);
        node.citation = Some(normalize(&[numeral.as_str()]));
        node.numeral = Some(numeral.clone());

        self.consumed_title = marker.title_index;
        self.last_ordinal = ordinal.or(self.last_ordinal);
        self.accepted.insert(numeral);
        self.article = Some(node);
    }

    fn open_section(&mut self, marker: BoundaryMarker) {
        let at = marker.raw_index;
        self.close_section(at);

        let number = marker.numeral.unwrap_or_default();
        let mut node = DocumentNode::new(NodeKind::Section, marker.label, at);

        let open_article = self.article.as_ref().and_then(|a| {
            let numeral = a.numeral.clone()?;
            let earlier = a
                .children
                .iter()
                .find(|c| c.numeral.as_deref() == Some(number.as_str()))
                .map(|c| c.start_line);
            Some((numeral, earlier))
        });

        match open_article {
            Some((article_numeral, earlier)) => {
                let citation = normalize(&[article_numeral.as_str(), number.as_str()]);
                if let Some(first_line) = earlier {
                    self.anomaly(StructuralAnomaly::new(
                        at,
                        AnomalyKind::DuplicateSection,
                        format!("{} already opened at line {}", citation, first_line),
                    ));
                }
                node.citation = Some(citation);
            }
            None => self.anomaly(StructuralAnomaly::new(
                at,
                AnomalyKind::OrphanSection,
                format!("Section {} outside any Article", number),
            )),
        }

        node.numeral = Some(number);
        self.section = Some(node);
    }

    fn push_body(&mut self, line: &RawLine) {
        if line.is_blank() {
            return;
        }
        let text = line.text.trim_end().to_string();
        let target = match (self.section.as_mut(), self.article.as_mut()) {
            (Some(section), _) => section,
            (None, Some(article)) => article,
            (None, None) => &mut self.root,
        };
        target.body_lines.push(text);
    }

    fn finish(mut self, line_count: usize) -> Segmentation {
        self.close_article(line_count);
        self.root.end_line = Some(line_count);
        Segmentation {
            root: self.root,
            anomalies: self.anomalies,
            line_count,
        }
    }
}
