//! Storage backends for covenant
//!
//! Exported structure rows and derived records are persisted through the
//! `RecordStore` trait. The primary implementation is `SqliteStore`.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{OpenStore, RecordFilter, RecordStore, StorageError, StorageResult, StoredRecord};
