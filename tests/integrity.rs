//! Study-record integrity against an on-disk store
//!
//! Imports a collection with one record per defect kind, audits it, plans
//! and applies repairs, and checks citations against stored structure.

mod common;

use common::{defective_collection, drafting_question, AgreementFixture, FixtureArticle};
use covenant::integrity::{
    audit, audit_citations, check, plan, plan_with_evidence, CitationIndex, CitationIssueKind,
    Confidence, Evidence, RepairKind, ViolationKind,
};
use covenant::pipeline::{apply_repair, audit_collection, repair_citations, store_ingestion};
use covenant::{
    ingest, DerivedRecord, OpenStore, PipelineError, RecordFilter, RecordStore, SegmentConfig, SqliteStore,
    StorageError,
};
use tempfile::TempDir;

fn open_store() -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("covenant.db")).unwrap();
    (dir, store)
}

fn seeded_store() -> (TempDir, SqliteStore) {
    let (dir, store) = open_store();
    for record in defective_collection() {
        store.save_record("study", &record).unwrap();
    }
    (dir, store)
}

// === Scenario: audit then hint-driven repair ===

#[test]
fn out_of_range_index_is_repaired_from_hints() {
    let record = drafting_question("q-1");
    let reports = audit(std::slice::from_ref(&record));
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, ViolationKind::OutOfRange);
    assert_eq!(reports[0].detail, "index 5, 3 options");

    let action = plan(&record, &reports[0], &["optional", "pre-draft"]);
    assert_eq!(action.kind, RepairKind::SetIndex(1));
    assert_eq!(action.confidence, Confidence::Medium);
}

#[test]
fn collection_audit_finds_each_defect_kind() {
    let (_dir, store) = seeded_store();
    let audit = audit_collection(&store, "study", &RecordFilter::new(), 2).unwrap();
    assert_eq!(audit.checked, 4);

    let kinds: Vec<_> = audit
        .findings
        .iter()
        .map(|f| (f.report.record_id.as_str(), f.report.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("q-01", ViolationKind::OutOfRange),
            ("s-01", ViolationKind::NoneMarked),
            ("s-02", ViolationKind::MultipleMarked),
        ]
    );
}

#[test]
fn filtered_audit_only_sees_matching_records() {
    let (_dir, store) = seeded_store();
    let filter = RecordFilter::new()
        .with_category("question")
        .with_field_above("difficulty", 2.0);
    let audit = audit_collection(&store, "study", &filter, 10).unwrap();

    assert_eq!(audit.checked, 1);
    assert_eq!(audit.findings.len(), 1);
    assert_eq!(audit.findings[0].stored.record.id, "q-01");
}

#[test]
fn applied_repairs_clear_the_audit() {
    let (_dir, store) = seeded_store();
    let audit = audit_collection(&store, "study", &RecordFilter::new(), 10).unwrap();

    for finding in &audit.findings {
        let action = match finding.report.record_id.as_str() {
            "q-01" => plan(&finding.stored.record, &finding.report, &["pre-draft"]),
            "s-01" => plan_with_evidence(
                &finding.stored.record,
                &finding.report,
                &Evidence::SiblingAnswer("grieve".to_string()),
            ),
            _ => plan(&finding.stored.record, &finding.report, &["30 days"]),
        };
        assert!(action.is_resolved(), "{}", action);
        apply_repair(&store, "study", &finding.stored, &action).unwrap();
    }

    let remaining = audit_collection(&store, "study", &RecordFilter::new(), 10).unwrap();
    assert!(remaining.is_clean());
    assert_eq!(remaining.summary().checked, 4);
}

#[test]
fn unresolved_repair_leaves_the_record_untouched() {
    let (_dir, store) = seeded_store();
    let stored = store.load_record("study", "q-01").unwrap().unwrap();
    let report = check(&stored.record).unwrap();
    let action = plan::<&str>(&stored.record, &report, &[]);

    assert_eq!(action.kind, RepairKind::Unresolved);
    assert_eq!(apply_repair(&store, "study", &stored, &action).unwrap(), None);
    assert_eq!(store.load_record("study", "q-01").unwrap().unwrap(), stored);
}

#[test]
fn concurrent_write_surfaces_as_version_conflict() {
    let (_dir, store) = seeded_store();
    let stale = store.load_record("study", "q-01").unwrap().unwrap();
    let report = check(&stale.record).unwrap();
    let action = plan(&stale.record, &report, &["optional"]);

    store.save_record("study", &stale.record).unwrap();

    let err = apply_repair(&store, "study", &stale, &action).unwrap_err();
    match err {
        PipelineError::Storage(StorageError::VersionConflict { id, expected, found }) => {
            assert_eq!(id, "q-01");
            assert_eq!((expected, found), (1, 2));
        }
        other => panic!("expected version conflict, got {}", other),
    }
}

#[test]
fn imported_record_without_answer_key_is_audited() {
    let (_dir, store) = open_store();
    let batch: Vec<DerivedRecord> = serde_json::from_str(
        r#"[
            { "id": "q-8", "prompt_text": "p", "options": ["A", "B"], "answerRef": 1 },
            { "id": "q-9", "prompt_text": "p", "options": ["A", "B", "C"] },
            { "id": "q-10", "prompt_text": "p", "options": ["A", "B", "C"], "answerRef": 5 }
        ]"#,
    )
    .unwrap();
    for record in &batch {
        store.save_record("study", record).unwrap();
    }

    let audit = audit_collection(&store, "study", &RecordFilter::new(), 10).unwrap();
    assert_eq!(audit.checked, 3);
    let reports: Vec<_> = audit
        .findings
        .iter()
        .map(|f| (f.report.record_id.as_str(), f.report.kind, f.report.detail.as_str()))
        .collect();
    assert_eq!(
        reports,
        vec![
            ("q-10", ViolationKind::OutOfRange, "index 5, 3 options"),
            ("q-9", ViolationKind::NoneMarked, "answer reference missing"),
        ]
    );

    let keyless = &audit.findings[1];
    let action = plan(&keyless.stored.record, &keyless.report, &["B"]);
    assert_eq!(action.kind, RepairKind::SetIndex(1));
    apply_repair(&store, "study", &keyless.stored, &action).unwrap();
    let fixed = store.load_record("study", "q-9").unwrap().unwrap();
    assert!(check(&fixed.record).is_none());
}

// === Scenario: citations checked against stored structure ===

#[test]
fn citations_resolve_against_stored_rows() {
    let (_dir, store) = seeded_store();
    let fixture = AgreementFixture::new()
        .article(
            &FixtureArticle::new("VII", "Grievance Procedure")
                .with_section("Definitions")
                .with_section("Time Limits"),
        )
        .article(&FixtureArticle::new("XI", "Seniority"));
    let ingestion = ingest("county", &fixture.text(), &SegmentConfig::default()).unwrap();
    store_ingestion(&store, &ingestion).unwrap();

    let index = CitationIndex::from_rows(&store.load_structure("county").unwrap());
    let records: Vec<_> = store
        .find_records("study", &RecordFilter::new())
        .unwrap()
        .into_iter()
        .map(|s| s.record)
        .collect();

    let issues = audit_citations(&records, &index);
    let kinds: Vec<_> = issues
        .iter()
        .map(|i| (i.record_id.as_str(), i.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("s-01", CitationIssueKind::Malformed),
            ("s-02", CitationIssueKind::Unresolved),
        ]
    );
    assert_eq!(issues[0].repaired.as_deref(), Some("Article XI"));
}

#[test]
fn stored_citation_repair_runs_once() {
    let (_dir, store) = seeded_store();
    assert_eq!(repair_citations(&store, "study", 3).unwrap().changed, 1);
    let second = repair_citations(&store, "study", 3).unwrap();
    assert_eq!(second.changed, 0);
    assert!(second.conflicts.is_empty());

    let fixed = store.load_record("study", "s-01").unwrap().unwrap();
    assert_eq!(fixed.record.citation.as_deref(), Some("Article XI"));
    assert_eq!(fixed.version, 2);
}
