//! Referential integrity for derived study records
//!
//! Generated questions, flashcards and scenarios carry an answer reference
//! into their own options list and a citation back into the agreement. This
//! module checks both and proposes bounded repairs.
//!
//! # Architecture
//!
//! - [`AnswerKeyed`]: the capability the auditor needs, independent of
//!   whether a record encodes its answer as an index or as option flags
//! - [`audit`]: total classification into [`ViolationReport`]s
//! - [`plan`] / [`plan_with_evidence`]: repair proposals, never applied here
//! - [`audit_citations`]: citations checked against a [`CitationIndex`]
//!
//! # Example
//!
//! ```
//! use covenant::integrity::{audit, plan, DerivedRecord, RepairKind};
//!
//! let record = DerivedRecord::indexed("q-1", "Which?", ["A", "B optional", "C"], 5);
//! let reports = audit(std::slice::from_ref(&record));
//! assert_eq!(reports[0].detail, "index 5, 3 options");
//!
//! let action = plan(&record, &reports[0], &["optional"]);
//! assert_eq!(action.kind, RepairKind::SetIndex(1));
//! ```

mod audit;
mod citations;
mod record;
mod repair;

pub use audit::{audit, check, AuditSummary, ViolationKind, ViolationReport};
pub use citations::{audit_citations, CitationIndex, CitationIssue, CitationIssueKind};
pub use record::{AnswerKeyed, AnswerRef, DerivedRecord, OptionRecord};
pub use repair::{apply_action, plan, plan_with_evidence, Confidence, Evidence, RepairAction, RepairKind};
