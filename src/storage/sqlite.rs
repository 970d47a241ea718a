//! SQLite storage backend for covenant

use super::traits::{OpenStore, RecordFilter, RecordStore, StorageError, StorageResult, StoredRecord};
use crate::integrity::DerivedRecord;
use crate::segment::StructureRow;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

/// SQLite-backed record and structure store
///
/// Uses a single SQLite database file with one table for exported structure
/// rows and one for derived records. Thread-safe via internal mutex on the
/// connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Exported structure, one row per leaf unit
            CREATE TABLE IF NOT EXISTS structure_rows (
                document TEXT NOT NULL,
                position INTEGER NOT NULL,
                row_id TEXT NOT NULL,
                row_key TEXT NOT NULL,
                row_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (document, position)
            );

            CREATE INDEX IF NOT EXISTS idx_structure_key
                ON structure_rows(document, row_key);

            -- Derived records, versioned for optimistic updates
            CREATE TABLE IF NOT EXISTS records (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                category TEXT,
                version INTEGER NOT NULL,
                body_json TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_records_category
                ON records(collection, category);

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    /// Stable key for a structure row: UUID v5 over document name and row key.
    pub fn row_id(document: &str, row: &StructureRow) -> Uuid {
        Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("{}\u{1f}{}", document, row.key()).as_bytes(),
        )
    }

    fn row_to_record(body_json: String, version: i64) -> StorageResult<StoredRecord> {
        Ok(StoredRecord {
            record: serde_json::from_str(&body_json)?,
            version: version as u64,
        })
    }

    fn current_version(conn: &Connection, collection: &str, id: &str) -> StorageResult<Option<u64>> {
        let version: Option<i64> = conn
            .query_row(
                "SELECT version FROM records WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version.map(|v| v as u64))
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl RecordStore for SqliteStore {
    // === Structure Operations ===

    fn save_structure(&self, document: &str, rows: &[StructureRow]) -> StorageResult<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let created_at = Utc::now().to_rfc3339();

        tx.execute(
            "DELETE FROM structure_rows WHERE document = ?1",
            params![document],
        )?;
        for (position, row) in rows.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO structure_rows (document, position, row_id, row_key, row_json, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    document,
                    position as i64,
                    Self::row_id(document, row).to_string(),
                    row.key(),
                    serde_json::to_string(row)?,
                    created_at,
                ],
            )?;
        }
        tx.commit()?;

        tracing::debug!(document, rows = rows.len(), "structure saved");
        Ok(rows.len())
    }

    fn load_structure(&self, document: &str) -> StorageResult<Vec<StructureRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT row_json FROM structure_rows WHERE document = ?1 ORDER BY position",
        )?;
        let rows_iter = stmt.query_map(params![document], |row| row.get::<_, String>(0))?;

        let mut rows = Vec::new();
        for row in rows_iter {
            rows.push(serde_json::from_str(&row?)?);
        }
        Ok(rows)
    }

    fn list_documents(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT DISTINCT document FROM structure_rows ORDER BY document")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    // === Record Operations ===

    fn save_record(&self, collection: &str, record: &DerivedRecord) -> StorageResult<u64> {
        let conn = self.conn.lock().unwrap();
        let body_json = serde_json::to_string(record)?;

        let version: i64 = conn.query_row(
            r#"
            INSERT INTO records (collection, id, category, version, body_json, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?5)
            ON CONFLICT(collection, id) DO UPDATE SET
                category = excluded.category,
                version = records.version + 1,
                body_json = excluded.body_json,
                updated_at = excluded.updated_at
            RETURNING version
            "#,
            params![
                collection,
                record.id,
                record.category,
                body_json,
                Utc::now().to_rfc3339(),
            ],
            |row| row.get(0),
        )?;

        Ok(version as u64)
    }

    fn load_record(&self, collection: &str, id: &str) -> StorageResult<Option<StoredRecord>> {
        let conn = self.conn.lock().unwrap();
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT body_json, version FROM records WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(body, version)| Self::row_to_record(body, version))
            .transpose()
    }

    fn find_records(&self, collection: &str, filter: &RecordFilter) -> StorageResult<Vec<StoredRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from("SELECT body_json, version FROM records WHERE collection = ?1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(collection.to_string())];

        if let Some(ref category) = filter.category {
            sql.push_str(" AND category = ?");
            params_vec.push(Box::new(category.clone()));
        }

        if let Some((ref field, value)) = filter.field_above {
            sql.push_str(" AND CAST(json_extract(body_json, ?) AS REAL) > ?");
            params_vec.push(Box::new(format!("$.{}", field)));
            params_vec.push(Box::new(value));
        }

        sql.push_str(" ORDER BY id");

        match (filter.limit, filter.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();

        let rows_iter = stmt.query_map(params_refs.as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows_iter {
            let (body, version) = row?;
            records.push(Self::row_to_record(body, version)?);
        }
        Ok(records)
    }

    fn update_record(
        &self,
        collection: &str,
        record: &DerivedRecord,
        expected_version: u64,
    ) -> StorageResult<u64> {
        let conn = self.conn.lock().unwrap();
        let body_json = serde_json::to_string(record)?;

        let updated = conn.execute(
            r#"
            UPDATE records
            SET category = ?1, body_json = ?2, version = version + 1, updated_at = ?3
            WHERE collection = ?4 AND id = ?5 AND version = ?6
            "#,
            params![
                record.category,
                body_json,
                Utc::now().to_rfc3339(),
                collection,
                record.id,
                expected_version as i64,
            ],
        )?;

        if updated == 1 {
            tracing::debug!(collection, id = %record.id, version = expected_version + 1, "record updated");
            return Ok(expected_version + 1);
        }

        match Self::current_version(&conn, collection, &record.id)? {
            Some(found) => Err(StorageError::VersionConflict {
                id: record.id.clone(),
                expected: expected_version,
                found,
            }),
            None => Err(StorageError::NotFound {
                collection: collection.to_string(),
                id: record.id.clone(),
            }),
        }
    }

    fn delete_record(&self, collection: &str, id: &str) -> StorageResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "DELETE FROM records WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        Ok(rows > 0)
    }

    fn list_collections(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT DISTINCT collection FROM records ORDER BY collection")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}
