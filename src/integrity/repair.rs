//! Bounded repair proposals for integrity violations
//!
//! The planner only proposes. It never mutates a record and never falls
//! back to a default index: when the evidence does not single out exactly
//! one option the action is [`RepairKind::Unresolved`] and a human decides.

use super::audit::ViolationReport;
use super::record::{AnswerRef, DerivedRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairKind {
    SetIndex(usize),
    Unresolved,
}

/// A proposed fix, with enough context for a reviewer to accept or reject it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairAction {
    pub kind: RepairKind,
    pub confidence: Confidence,
    pub reason: String,
}

impl RepairAction {
    fn set_index(index: usize, confidence: Confidence, reason: impl Into<String>) -> Self {
        Self {
            kind: RepairKind::SetIndex(index),
            confidence,
            reason: reason.into(),
        }
    }

    fn unresolved(reason: impl Into<String>) -> Self {
        Self {
            kind: RepairKind::Unresolved,
            confidence: Confidence::Low,
            reason: reason.into(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.kind, RepairKind::SetIndex(_))
    }
}

impl fmt::Display for RepairAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RepairKind::SetIndex(i) => write!(f, "SET_INDEX({}) {}", i, self.confidence)?,
            RepairKind::Unresolved => write!(f, "UNRESOLVED {}", self.confidence)?,
        }
        write!(f, ": {}", self.reason)
    }
}

/// What the planner may use to pick an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    /// Every keyword must occur (case-insensitively) in the chosen option
    Keywords(Vec<String>),
    /// Answer text of a sibling record covering the same clause
    SiblingAnswer(String),
}

/// Propose a repair from hint keywords. An empty hint list means no hints.
pub fn plan<S: AsRef<str>>(
    record: &DerivedRecord,
    report: &ViolationReport,
    hints: &[S],
) -> RepairAction {
    let keywords = hints.iter().map(|h| h.as_ref().to_string()).collect();
    plan_with_evidence(record, report, &Evidence::Keywords(keywords))
}

/// Propose a repair from any [`Evidence`].
pub fn plan_with_evidence(
    record: &DerivedRecord,
    report: &ViolationReport,
    evidence: &Evidence,
) -> RepairAction {
    let options = record.option_texts();
    if record.options.is_none() {
        return RepairAction::unresolved("record has no options list");
    }

    let action = match evidence {
        Evidence::Keywords(keywords) => by_keywords(&options, keywords),
        Evidence::SiblingAnswer(answer) => by_sibling(&options, answer),
    };

    tracing::debug!(
        record = %report.record_id,
        violation = %report.kind,
        action = %action,
        "repair planned"
    );
    action
}

fn by_keywords(options: &[&str], keywords: &[String]) -> RepairAction {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return RepairAction::unresolved("no hint keywords supplied");
    }

    let matches: Vec<usize> = options
        .iter()
        .enumerate()
        .filter(|(_, text)| {
            let text = text.to_lowercase();
            keywords.iter().all(|k| text.contains(k.as_str()))
        })
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [only] => RepairAction::set_index(
            *only,
            Confidence::Medium,
            format!("only option {} contains {}", only, keywords.join(", ")),
        ),
        [] => RepairAction::unresolved(format!("no option contains {}", keywords.join(", "))),
        many => RepairAction::unresolved(format!(
            "{} options contain {}",
            many.len(),
            keywords.join(", ")
        )),
    }
}

fn by_sibling(options: &[&str], answer: &str) -> RepairAction {
    let wanted = normalize_text(answer);
    if wanted.is_empty() {
        return RepairAction::unresolved("sibling answer is empty");
    }

    let matches: Vec<usize> = options
        .iter()
        .enumerate()
        .filter(|(_, text)| normalize_text(text) == wanted)
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [only] => RepairAction::set_index(
            *only,
            Confidence::High,
            format!("option {} matches sibling answer", only),
        ),
        [] => RepairAction::unresolved("no option matches sibling answer"),
        many => RepairAction::unresolved(format!("{} options match sibling answer", many.len())),
    }
}

/// Lowercase, collapse whitespace, drop trailing punctuation.
fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase()
}

/// Return a corrected copy of `record`, or `None` for an unresolved action
/// or an index the record cannot hold.
pub fn apply_action(record: &DerivedRecord, action: &RepairAction) -> Option<DerivedRecord> {
    let RepairKind::SetIndex(index) = action.kind else {
        return None;
    };
    let count = record.options.as_ref()?.len();
    if index >= count {
        return None;
    }

    let mut fixed = record.clone();
    match record.effective_answer() {
        Some(AnswerRef::Index { .. }) | None => {
            fixed.answer = Some(AnswerRef::Index {
                index: index as i64,
            });
        }
        Some(AnswerRef::Flags) => {
            fixed.answer = Some(AnswerRef::Flags);
            if let Some(options) = fixed.options.as_mut() {
                for (i, option) in options.iter_mut().enumerate() {
                    option.correct = i == index;
                }
            }
        }
    }
    Some(fixed)
}
