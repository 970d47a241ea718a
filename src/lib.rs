//! Covenant: Agreement Segmentation and Referential Integrity
//!
//! Splits the flat text of a collective bargaining agreement into its
//! Articles and Sections, exports that structure as citation-keyed rows, and
//! audits the study records generated from it.
//!
//! # Core Concepts
//!
//! - **Segmentation**: DOCUMENT → ARTICLE → SECTION tree built in one pass,
//!   with structural anomalies reported rather than raised
//! - **Citations**: canonical `Article VII, Section 3` locators, with repair
//!   for duplicated tokens
//! - **Coverage**: which expected Articles (I..XLII) were found
//! - **Integrity**: whether each record's answer reference resolves to
//!   exactly one option, plus bounded repair proposals
//!
//! # Example
//!
//! ```
//! use covenant::{ingest, SegmentConfig};
//!
//! let config = SegmentConfig {
//!     expected_numerals: vec!["I".into(), "II".into()],
//!     ..Default::default()
//! };
//! let ingestion = ingest("cba", "ARTICLE I\nRecognition\nThe Employer recognizes...\n", &config)?;
//! assert_eq!(ingestion.rows[0].citation.as_deref(), Some("Article I"));
//! assert_eq!(ingestion.coverage.missing_numerals, vec!["II"]);
//! # Ok::<(), covenant::PipelineError>(())
//! ```

pub mod citation;
pub mod config;
pub mod coverage;
pub mod integrity;
pub mod pipeline;
pub mod segment;
pub mod storage;

pub use citation::{detect_malformed, normalize, repair, Citation};
pub use config::{ConfigError, SegmentConfig};
pub use coverage::CoverageReport;
pub use integrity::{
    AnswerKeyed, Confidence, DerivedRecord, RepairAction, RepairKind, ViolationKind, ViolationReport,
};
pub use pipeline::{ingest, Ingestion, PipelineError, PipelineResult};
pub use segment::{DocumentNode, NodeKind, Segmentation, StructuralAnomaly, StructureBuilder, StructureRow};
pub use storage::{OpenStore, RecordFilter, RecordStore, SqliteStore, StorageError, StorageResult, StoredRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
