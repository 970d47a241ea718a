//! Storage trait definitions

use crate::integrity::DerivedRecord;
use crate::segment::StructureRow;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Version conflict on {id}: expected {expected}, found {found}")]
    VersionConflict { id: String, expected: u64, found: u64 },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A record as persisted, with the version used for optimistic updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub record: DerivedRecord,
    pub version: u64,
}

/// Filter criteria for querying records
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Exact match on the record's category (e.g., "question", "flashcard")
    pub category: Option<String>,
    /// Numeric top-level field strictly greater than the value
    pub field_above: Option<(String, f64)>,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Results to skip, for paging
    pub offset: Option<usize>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_field_above(mut self, field: impl Into<String>, value: f64) -> Self {
        self.field_above = Some((field.into(), value));
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Trait for record and structure storage backends
///
/// Implementations must be thread-safe (Send + Sync). Reads and writes are
/// individually atomic; a read-plan-write sequence is not, so writers that
/// act on something they read pass the version they saw to
/// [`update_record`](RecordStore::update_record).
pub trait RecordStore: Send + Sync {
    // === Structure Operations ===

    /// Replace the stored structure of `document` with `rows`
    fn save_structure(&self, document: &str, rows: &[StructureRow]) -> StorageResult<usize>;

    /// Load a document's rows in document order (empty if unknown)
    fn load_structure(&self, document: &str) -> StorageResult<Vec<StructureRow>>;

    /// List documents that have stored structure
    fn list_documents(&self) -> StorageResult<Vec<String>>;

    // === Record Operations ===

    /// Insert or overwrite a record, returning its new version
    fn save_record(&self, collection: &str, record: &DerivedRecord) -> StorageResult<u64>;

    /// Load a record by ID
    fn load_record(&self, collection: &str, id: &str) -> StorageResult<Option<StoredRecord>>;

    /// Find records matching filter criteria, ordered by ID
    fn find_records(&self, collection: &str, filter: &RecordFilter) -> StorageResult<Vec<StoredRecord>>;

    /// Overwrite a record only if its stored version is `expected_version`
    ///
    /// Returns the new version. Fails with `VersionConflict` if someone else
    /// wrote in between, or `NotFound` if the record is gone.
    fn update_record(
        &self,
        collection: &str,
        record: &DerivedRecord,
        expected_version: u64,
    ) -> StorageResult<u64>;

    /// Delete a record
    fn delete_record(&self, collection: &str, id: &str) -> StorageResult<bool>;

    /// List collection names
    fn list_collections(&self) -> StorageResult<Vec<String>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: RecordStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
