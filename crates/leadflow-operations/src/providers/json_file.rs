use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicU64;

use async_trait::async_trait;
use leadflow_core::{Fields, Record, RecordId};
use tokio::sync::Mutex;
use tracing::debug;

use super::memory::{
    TableSnapshot, clear_named, insert_new, merge_fields, read_record, remove_record,
    table_records,
};
use crate::traits::RecordStore;
use crate::{OperationError, Result};

/// Record store persisted to a JSON document.
///
/// The document maps table name to record id to field name to value. Nothing
/// is cached: every call reads the current document, and every write is a
/// read-modify-write of the whole file, so changes made by other processes
/// between calls are seen and kept. A write that fails leaves the file as it
/// was.
#[derive(Debug)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    next_id: AtomicU64,
    file_lock: Mutex<()>,
}

impl JsonFileRecordStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            next_id: AtomicU64::new(0),
            file_lock: Mutex::new(()),
        };
        let tables = store.load().await?;
        debug!(path = %store.path.display(), tables = tables.len(), "opened record store");
        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records of a table in insertion order, as currently on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or parsed.
    pub async fn records(&self, table: &str) -> Result<Vec<Record>> {
        let _guard = self.file_lock.lock().await;
        Ok(table_records(&self.load().await?, table))
    }

    async fn load(&self) -> Result<TableSnapshot> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(TableSnapshot::new()),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| OperationError::StoreParse {
                    path: self.path.clone(),
                    source,
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(TableSnapshot::new()),
            Err(source) => Err(OperationError::StoreRead {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn save(&self, tables: &TableSnapshot) -> Result<()> {
        let content =
            serde_json::to_string_pretty(tables).map_err(OperationError::StoreSerialize)?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| OperationError::StoreWrite {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn create_record(&self, table: &str, fields: Fields) -> Result<RecordId> {
        let _guard = self.file_lock.lock().await;
        let mut tables = self.load().await?;
        let id = insert_new(&mut tables, &self.next_id, table, fields);
        self.save(&tables).await?;
        Ok(id)
    }

    async fn update_record(&self, table: &str, id: &RecordId, fields: Fields) -> Result<()> {
        let _guard = self.file_lock.lock().await;
        let mut tables = self.load().await?;
        merge_fields(&mut tables, table, id, fields)?;
        self.save(&tables).await
    }

    async fn clear_fields(&self, table: &str, id: &RecordId, fields: &[String]) -> Result<()> {
        let _guard = self.file_lock.lock().await;
        let mut tables = self.load().await?;
        clear_named(&mut tables, table, id, fields)?;
        self.save(&tables).await
    }

    async fn delete_record(&self, table: &str, id: &RecordId) -> Result<()> {
        let _guard = self.file_lock.lock().await;
        let mut tables = self.load().await?;
        remove_record(&mut tables, table, id)?;
        self.save(&tables).await
    }

    async fn get_record(&self, table: &str, id: &RecordId) -> Result<Option<Record>> {
        let _guard = self.file_lock.lock().await;
        Ok(read_record(&self.load().await?, table, id))
    }
}
