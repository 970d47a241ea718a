//! Line classification
//!
//! Decides, one line at a time, whether a line of the agreement is a
//! structural boundary. Article headings and separators are recognized from
//! the line alone (plus a short lookahead for the Article title). Section
//! headings depend on which Article is open, so they are exposed as a pure
//! pattern test the builder calls with its own context.

use super::numerals::is_article_numeral;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

/// How many following lines the classifier may inspect for an Article title.
pub const LOOKAHEAD_WINDOW: usize = 4;

/// Minimum run of `-` / `=` characters that counts as a separator.
const MIN_SEPARATOR_LEN: usize = 3;

static ARTICLE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ARTICLE\s+([IVXL]+)$").unwrap());

static LABELED_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^section\s+(\d{1,3})\.(?:\s+(.*))?$").unwrap());

static BARE_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3})\.\s+([A-Z].*)$").unwrap());

/// One line of source text, addressed by its zero-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    pub index: usize,
    pub text: String,
}

impl RawLine {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Split a text blob on line boundaries (`\n` or `\r\n`).
    pub fn split(text: &str) -> Vec<RawLine> {
        text.lines()
            .enumerate()
            .map(|(index, line)| RawLine::new(index, line))
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Kind of structural boundary a line represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Article,
    Section,
    Separator,
}

/// A line recognized as a structural boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryMarker {
    pub kind: MarkerKind,
    pub raw_index: usize,
    /// Human-readable title (Article/Section) or the separator text itself
    pub label: String,
    /// Roman numeral for Articles, section number for Sections
    pub numeral: Option<String>,
    /// Line the Article title was read from, if any
    pub title_index: Option<usize>,
}

/// Document-specific shape of a Section heading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionPattern {
    /// `Section 3.` or `Section 3. Definitions.`
    #[default]
    Labeled,
    /// `3. Definitions`
    Bare,
}

impl FromStr for SectionPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "labeled" => Ok(Self::Labeled),
            "bare" => Ok(Self::Bare),
            other => Err(format!("unknown section pattern '{}'", other)),
        }
    }
}

/// A successful Section pattern test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch {
    pub number: u32,
    pub heading: String,
}

/// True for a line made only of repeated `-` / `=` characters.
pub fn is_separator(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.chars().count() >= MIN_SEPARATOR_LEN && trimmed.chars().all(|c| c == '-' || c == '=')
}

/// The numeral of a canonical Article heading (`ARTICLE VII`), if the line is one.
pub fn article_numeral(text: &str) -> Option<&str> {
    let caps = ARTICLE_HEADING.captures(text.trim())?;
    let numeral = caps.get(1)?.as_str();
    is_article_numeral(numeral).then_some(numeral)
}

/// Test a line against the Section pattern.
pub fn match_section(text: &str, pattern: SectionPattern) -> Option<SectionMatch> {
    let trimmed = text.trim();
    let caps = match pattern {
        SectionPattern::Labeled => LABELED_SECTION.captures(trimmed)?,
        SectionPattern::Bare => BARE_SECTION.captures(trimmed)?,
    };
    let number = caps.get(1)?.as_str().parse().ok()?;
    let heading = caps
        .get(2)
        .map(|m| m.as_str().trim().trim_end_matches('.').trim().to_string())
        .unwrap_or_default();
    Some(SectionMatch { number, heading })
}

/// Build a Section marker for a line, if it matches the pattern.
pub fn section_marker(line: &RawLine, pattern: SectionPattern) -> Option<BoundaryMarker> {
    let found = match_section(&line.text, pattern)?;
    Some(BoundaryMarker {
        kind: MarkerKind::Section,
        raw_index: line.index,
        label: found.heading,
        numeral: Some(found.number.to_string()),
        title_index: None,
    })
}

/// Classify a line as an Article heading, a separator, or neither.
///
/// `lookahead` holds the lines that follow; only the first
/// [`LOOKAHEAD_WINDOW`] are inspected for the Article title. Section
/// headings are not recognized here, see [`match_section`].
pub fn classify(line: &RawLine, lookahead: &[RawLine]) -> Option<BoundaryMarker> {
    if is_separator(&line.text) {
        return Some(BoundaryMarker {
            kind: MarkerKind::Separator,
            raw_index: line.index,
            label: line.text.trim().to_string(),
            numeral: None,
            title_index: None,
        });
    }

    let numeral = article_numeral(&line.text)?;
    let mut label = String::new();
    let mut title_index = None;

    for next in lookahead.iter().take(LOOKAHEAD_WINDOW) {
        if next.is_blank() || is_separator(&next.text) {
            continue;
        }
        if article_numeral(&next.text).is_some() {
            break;
        }
        label = next.text.trim().to_string();
        title_index = Some(next.index);
        break;
    }

    Some(BoundaryMarker {
        kind: MarkerKind::Article,
        raw_index: line.index,
        label,
        numeral: Some(numeral.to_string()),
        title_index,
    })
}
