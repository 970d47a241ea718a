//! End-to-end operations over the pure stages and a store
//!
//! The segmentation and audit stages never fail. The functions here are
//! where hard errors can occur: empty input, bad configuration, storage.

use crate::citation::{detect_malformed, repair};
use crate::config::{ConfigError, SegmentConfig};
use crate::coverage::{self, CoverageReport};
use crate::integrity::{self, apply_action, AuditSummary, RepairAction, ViolationReport};
use crate::segment::{flatten, RawLine, Segmentation, StructureBuilder, StructureRow};
use crate::storage::{RecordFilter, RecordStore, StorageError, StoredRecord};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input '{0}' is empty")]
    EmptyInput(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything derived from one agreement text
#[derive(Debug, Clone)]
pub struct Ingestion {
    pub source: String,
    pub segmentation: Segmentation,
    pub rows: Vec<StructureRow>,
    pub coverage: CoverageReport,
}

/// Segment `text`, export its rows and audit its coverage.
pub fn ingest(source: &str, text: &str, config: &SegmentConfig) -> PipelineResult<Ingestion> {
    if text.trim().is_empty() {
        return Err(PipelineError::EmptyInput(source.to_string()));
    }

    let lines = RawLine::split(text);
    let segmentation = StructureBuilder::from_config(config)?
        .with_title(source)
        .build(&lines);
    let rows = flatten(&segmentation.root);
    let coverage = coverage::audit(&segmentation.root, &config.expected_numerals);

    tracing::info!(
        source,
        lines = segmentation.line_count,
        articles = segmentation.articles().count(),
        rows = rows.len(),
        anomalies = segmentation.anomalies.len(),
        coverage = coverage.coverage_ratio,
        "ingested agreement"
    );
    if !coverage.is_complete() {
        tracing::warn!(missing = ?coverage.missing_numerals, "expected articles not found");
    }

    Ok(Ingestion {
        source: source.to_string(),
        segmentation,
        rows,
        coverage,
    })
}

/// Persist an ingestion's rows under its source name.
pub fn store_ingestion<S: RecordStore + ?Sized>(
    store: &S,
    ingestion: &Ingestion,
) -> PipelineResult<usize> {
    Ok(store.save_structure(&ingestion.source, &ingestion.rows)?)
}

/// A violation together with the stored record it was found on
#[derive(Debug, Clone)]
pub struct Finding {
    pub stored: StoredRecord,
    pub report: ViolationReport,
}

/// Result of auditing one stored collection
#[derive(Debug, Clone, Default)]
pub struct CollectionAudit {
    /// Records visited, valid or not
    pub checked: usize,
    pub findings: Vec<Finding>,
}

impl CollectionAudit {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn reports(&self) -> Vec<ViolationReport> {
        self.findings.iter().map(|f| f.report.clone()).collect()
    }

    pub fn summary(&self) -> AuditSummary {
        AuditSummary::from_reports(self.checked, &self.reports())
    }
}

/// Outcome of a citation repair run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationRepairs {
    pub changed: usize,
    /// Ids skipped because another writer updated them first
    pub conflicts: Vec<String>,
}

/// Walk every page of `filter` over `collection`, yielding each stored record.
fn for_each_page<S, F>(
    store: &S,
    collection: &str,
    filter: &RecordFilter,
    page_size: usize,
    mut visit: F,
) -> PipelineResult<usize>
where
    S: RecordStore + ?Sized,
    F: FnMut(StoredRecord) -> PipelineResult<()>,
{
    let page_size = page_size.max(1);
    let mut offset = filter.offset.unwrap_or(0);
    let mut remaining = filter.limit;
    let mut seen = 0usize;

    loop {
        let take = remaining.map_or(page_size, |r| r.min(page_size));
        if take == 0 {
            break;
        }
        let page_filter = RecordFilter {
            limit: Some(take),
            offset: Some(offset),
            ..filter.clone()
        };
        let page = store.find_records(collection, &page_filter)?;
        let fetched = page.len();
        for stored in page {
            visit(stored)?;
        }

        seen += fetched;
        offset += fetched;
        remaining = remaining.map(|r| r - fetched);
        if fetched < take {
            break;
        }
    }
    Ok(seen)
}

/// Audit every record in `collection` matching `filter`, `page_size` at a time.
pub fn audit_collection<S: RecordStore + ?Sized>(
    store: &S,
    collection: &str,
    filter: &RecordFilter,
    page_size: usize,
) -> PipelineResult<CollectionAudit> {
    let mut findings = Vec::new();
    let checked = for_each_page(store, collection, filter, page_size, |stored| {
        if let Some(report) = integrity::check(&stored.record) {
            findings.push(Finding { stored, report });
        }
        Ok(())
    })?;

    tracing::info!(collection, checked, violations = findings.len(), "collection audited");
    Ok(CollectionAudit { checked, findings })
}

/// Write a planned repair through to the store.
///
/// Uses the version the record was read at, so a concurrent writer surfaces
/// as [`StorageError::VersionConflict`]. Returns `None` when the action
/// changes nothing (unresolved).
pub fn apply_repair<S: RecordStore + ?Sized>(
    store: &S,
    collection: &str,
    stored: &StoredRecord,
    action: &RepairAction,
) -> PipelineResult<Option<u64>> {
    let Some(fixed) = apply_action(&stored.record, action) else {
        return Ok(None);
    };
    let version = store.update_record(collection, &fixed, stored.version)?;
    tracing::info!(collection, id = %fixed.id, action = %action, version, "repair applied");
    Ok(Some(version))
}

/// Rewrite every malformed citation in `collection` to its repaired form.
///
/// A second run changes nothing. Records another writer updated since they
/// were read are skipped and listed in [`CitationRepairs::conflicts`].
pub fn repair_citations<S: RecordStore + ?Sized>(
    store: &S,
    collection: &str,
    page_size: usize,
) -> PipelineResult<CitationRepairs> {
    let mut pending = Vec::new();
    for_each_page(store, collection, &RecordFilter::new(), page_size, |stored| {
        if stored.record.citation.as_deref().is_some_and(detect_malformed) {
            pending.push(stored);
        }
        Ok(())
    })?;

    let mut outcome = CitationRepairs::default();
    for stored in pending {
        let mut record = stored.record;
        let Some(original) = record.citation.take() else {
            continue;
        };
        let repaired = repair(&original);
        tracing::debug!(id = %record.id, %original, %repaired, "citation repaired");
        record.citation = Some(repaired);
        match store.update_record(collection, &record, stored.version) {
            Ok(_) => outcome.changed += 1,
            Err(StorageError::VersionConflict { id, .. }) => {
                tracing::warn!(collection, %id, "citation repair skipped: record changed");
                outcome.conflicts.push(id);
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        collection,
        changed = outcome.changed,
        conflicts = outcome.conflicts.len(),
        "citations repaired"
    );
    Ok(outcome)
}
