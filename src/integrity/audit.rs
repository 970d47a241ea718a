//! Referential integrity audit over derived records

use super::record::AnswerKeyed;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// Exactly one position marked, but it does not address an option
    OutOfRange,
    /// No option marked correct (or no options at all)
    NoneMarked,
    /// More than one option marked correct
    MultipleMarked,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::NoneMarked => "NONE_MARKED",
            Self::MultipleMarked => "MULTIPLE_MARKED",
        };
        f.write_str(name)
    }
}

/// Why one record's answer reference does not resolve to exactly one option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationReport {
    pub record_id: String,
    pub kind: ViolationKind,
    pub detail: String,
}

impl ViolationReport {
    fn new(record_id: &str, kind: ViolationKind, detail: impl Into<String>) -> Self {
        Self {
            record_id: record_id.to_string(),
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ViolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.record_id, self.kind, self.detail)
    }
}

/// Check a single record. `None` means the record is valid.
pub fn check<R: AnswerKeyed + ?Sized>(record: &R) -> Option<ViolationReport> {
    let id = record.record_id();
    let Some(count) = record.option_count() else {
        return Some(ViolationReport::new(
            id,
            ViolationKind::NoneMarked,
            "options list missing",
        ));
    };

    if !record.has_answer_ref() {
        return Some(ViolationReport::new(
            id,
            ViolationKind::NoneMarked,
            "answer reference missing",
        ));
    }

    let marked = record.marked_positions();
    match marked.as_slice() {
        [] => Some(ViolationReport::new(
            id,
            ViolationKind::NoneMarked,
            "no option marked correct",
        )),
        [position] => {
            let in_range = usize::try_from(*position).is_ok_and(|p| p < count);
            if in_range {
                None
            } else {
                Some(ViolationReport::new(
                    id,
                    ViolationKind::OutOfRange,
                    format!("index {}, {} options", position, count),
                ))
            }
        }
        many => {
            let positions: Vec<String> = many.iter().map(i64::to_string).collect();
            Some(ViolationReport::new(
                id,
                ViolationKind::MultipleMarked,
                format!("positions {} marked correct", positions.join(", ")),
            ))
        }
    }
}

/// Audit records in order, returning one report per invalid record.
///
/// Never fails: every malformed shape maps onto a [`ViolationKind`].
pub fn audit<R: AnswerKeyed>(records: &[R]) -> Vec<ViolationReport> {
    let reports: Vec<ViolationReport> = records.iter().filter_map(|r| check(r)).collect();
    tracing::debug!(
        checked = records.len(),
        violations = reports.len(),
        "integrity audit complete"
    );
    reports
}

/// Per-kind tallies for a batch audit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub checked: usize,
    pub out_of_range: usize,
    pub none_marked: usize,
    pub multiple_marked: usize,
}

impl AuditSummary {
    pub fn record(&mut self, report: &ViolationReport) {
        match report.kind {
            ViolationKind::OutOfRange => self.out_of_range += 1,
            ViolationKind::NoneMarked => self.none_marked += 1,
            ViolationKind::MultipleMarked => self.multiple_marked += 1,
        }
    }

    pub fn violations(&self) -> usize {
        self.out_of_range + self.none_marked + self.multiple_marked
    }

    pub fn from_reports(checked: usize, reports: &[ViolationReport]) -> Self {
        let mut summary = Self {
            checked,
            ..Default::default()
        };
        for report in reports {
            summary.record(report);
        }
        summary
    }
}
