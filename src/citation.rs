//! Citation normalization
//!
//! Canonical form: `Article VII` or `Article VII, Section 3`.
//!
//! Earlier generation passes built citations by naive concatenation and left
//! duplicated tokens behind (`Article Article XI`). [`detect_malformed`] finds
//! those and [`repair`] collapses them; `repair` is idempotent, so it is safe
//! to run over a whole collection repeatedly.

use crate::segment::numerals::is_article_numeral;
use serde::{Deserialize, Serialize};
use std::fmt;

const ARTICLE_KEYWORD: &str = "article";
const SECTION_KEYWORD: &str = "section";

/// A parsed structural location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub numeral: String,
    pub section: Option<String>,
}

impl Citation {
    pub fn article(numeral: impl Into<String>) -> Self {
        Self {
            numeral: numeral.into(),
            section: None,
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Parse a citation, repairing duplicated tokens first.
    ///
    /// Returns `None` unless the text is `Article <numeral>` with an optional
    /// `, Section <number>` and the numeral is in the I..XLII vocabulary.
    pub fn parse(text: &str) -> Option<Self> {
        let repaired = repair(text);
        let (article_part, section_part) = match repaired.split_once(',') {
            Some((a, s)) => (a, Some(s)),
            None => (repaired.as_str(), None),
        };

        let mut tokens = article_part.split_whitespace();
        if !tokens.next()?.eq_ignore_ascii_case(ARTICLE_KEYWORD) {
            return None;
        }
        let numeral = tokens.next()?.to_string();
        if tokens.next().is_some() || !is_article_numeral(&numeral) {
            return None;
        }

        let section = match section_part {
            None => None,
            Some(part) => {
                let mut tokens = part.split_whitespace();
                if !tokens.next()?.eq_ignore_ascii_case(SECTION_KEYWORD) {
                    return None;
                }
                let number = tokens.next()?.trim_end_matches('.');
                if tokens.next().is_some() || number.parse::<u32>().is_err() {
                    return None;
                }
                Some(number.to_string())
            }
        };

        Some(Self { numeral, section })
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Article {}", self.numeral)?;
        if let Some(section) = &self.section {
            write!(f, ", Section {}", section)?;
        }
        Ok(())
    }
}

/// Drop any leading occurrences of `keyword` and surrounding punctuation.
fn strip_keyword(part: &str, keyword: &str) -> String {
    let tokens: Vec<&str> = part
        .split_whitespace()
        .skip_while(|t| t.trim_matches(|c| c == ',' || c == '.').eq_ignore_ascii_case(keyword))
        .collect();
    tokens
        .join(" ")
        .trim_matches(|c: char| c == ',' || c == '.' || c.is_whitespace())
        .to_string()
}

/// Compose a canonical citation from a structural path.
///
/// The first element names the Article (`VII` or `ARTICLE VII`), the optional
/// second names the Section (`3` or `Section 3.`). Further elements are
/// finer than citation granularity and are ignored.
pub fn normalize<S: AsRef<str>>(path: &[S]) -> String {
    let Some(first) = path.first() else {
        return String::new();
    };
    let numeral = strip_keyword(first.as_ref(), ARTICLE_KEYWORD);
    let mut citation = format!("Article {}", numeral);

    if let Some(second) = path.get(1) {
        let section = strip_keyword(second.as_ref(), SECTION_KEYWORD);
        if !section.is_empty() {
            citation.push_str(", Section ");
            citation.push_str(&section);
        }
    }
    citation
}

fn token_key(token: &str) -> String {
    let key = token.trim_matches(',');
    if key.is_empty() {
        token.to_lowercase()
    } else {
        key.to_lowercase()
    }
}

/// True if the citation repeats a token back-to-back (e.g. `Article Article XI`).
pub fn detect_malformed(citation: &str) -> bool {
    let keys: Vec<String> = citation.split_whitespace().map(token_key).collect();
    keys.windows(2).any(|pair| pair[0] == pair[1])
}

/// Collapse each run of duplicated tokens to its first occurrence and
/// normalize whitespace.
pub fn repair(citation: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut last_key: Option<String> = None;
    for token in citation.split_whitespace() {
        let key = token_key(token);
        if last_key.as_deref() == Some(key.as_str()) {
            continue;
        }
        kept.push(token);
        last_key = Some(key);
    }
    kept.join(" ")
}
