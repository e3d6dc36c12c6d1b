use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use indexmap::IndexMap;
use leadflow_core::{Fields, Record, RecordId};
use tracing::debug;

use crate::traits::RecordStore;
use crate::{OperationError, Result};

/// Every table of a store, keyed by table name then record id.
pub type TableSnapshot = IndexMap<String, IndexMap<RecordId, Fields>>;

/// Record store held entirely in memory.
///
/// Ids are assigned as `rec` followed by a zero-padded counter, skipping any
/// id already present so seeded records are never overwritten.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: Mutex<TableSnapshot>,
    next_id: AtomicU64,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record with a fixed id.
    #[must_use]
    pub fn with_record(self, table: &str, id: impl Into<RecordId>, fields: Fields) -> Self {
        self.insert_record(table, id.into(), fields);
        self
    }

    /// Insert or replace a record with a fixed id.
    pub fn insert_record(&self, table: &str, id: RecordId, fields: Fields) {
        self.lock()
            .entry(table.to_string())
            .or_default()
            .insert(id, fields);
    }

    /// All records of a table in insertion order.
    #[must_use]
    pub fn records(&self, table: &str) -> Vec<Record> {
        table_records(&self.lock(), table)
    }

    #[must_use]
    pub fn count(&self, table: &str) -> usize {
        self.lock().get(table).map_or(0, IndexMap::len)
    }

    /// Total number of records across every table.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.lock().values().map(IndexMap::len).sum()
    }

    fn lock(&self) -> MutexGuard<'_, TableSnapshot> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Insert `fields` under the next free `rec` id of the counter.
pub(crate) fn insert_new(
    tables: &mut TableSnapshot,
    next_id: &AtomicU64,
    table: &str,
    fields: Fields,
) -> RecordId {
    let id = loop {
        let n = next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = RecordId::new(format!("rec{n:014}"));
        if !tables.values().any(|rows| rows.contains_key(&id)) {
            break id;
        }
    };
    tables
        .entry(table.to_string())
        .or_default()
        .insert(id.clone(), fields);
    debug!(table, record_id = %id, "created record");
    id
}

pub(crate) fn merge_fields(
    tables: &mut TableSnapshot,
    table: &str,
    id: &RecordId,
    fields: Fields,
) -> Result<()> {
    let existing = tables
        .get_mut(table)
        .and_then(|rows| rows.get_mut(id))
        .ok_or_else(|| not_found(table, id))?;
    existing.extend(fields);
    debug!(table, record_id = %id, "updated record");
    Ok(())
}

pub(crate) fn clear_named(
    tables: &mut TableSnapshot,
    table: &str,
    id: &RecordId,
    names: &[String],
) -> Result<()> {
    let existing = tables
        .get_mut(table)
        .and_then(|rows| rows.get_mut(id))
        .ok_or_else(|| not_found(table, id))?;
    for name in names {
        existing.shift_remove(name);
    }
    debug!(table, record_id = %id, cleared = names.len(), "cleared fields");
    Ok(())
}

pub(crate) fn remove_record(tables: &mut TableSnapshot, table: &str, id: &RecordId) -> Result<()> {
    tables
        .get_mut(table)
        .and_then(|rows| rows.shift_remove(id))
        .ok_or_else(|| not_found(table, id))?;
    debug!(table, record_id = %id, "deleted record");
    Ok(())
}

pub(crate) fn read_record(tables: &TableSnapshot, table: &str, id: &RecordId) -> Option<Record> {
    tables
        .get(table)
        .and_then(|rows| rows.get(id))
        .map(|fields| Record::new(id.clone(), fields.clone()))
}

pub(crate) fn table_records(tables: &TableSnapshot, table: &str) -> Vec<Record> {
    tables
        .get(table)
        .map(|rows| {
            rows.iter()
                .map(|(id, fields)| Record::new(id.clone(), fields.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn not_found(table: &str, id: &RecordId) -> OperationError {
    OperationError::RecordNotFound {
        table: table.to_string(),
        id: id.clone(),
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create_record(&self, table: &str, fields: Fields) -> Result<RecordId> {
        Ok(insert_new(&mut self.lock(), &self.next_id, table, fields))
    }

    async fn update_record(&self, table: &str, id: &RecordId, fields: Fields) -> Result<()> {
        merge_fields(&mut self.lock(), table, id, fields)
    }

    async fn clear_fields(&self, table: &str, id: &RecordId, fields: &[String]) -> Result<()> {
        clear_named(&mut self.lock(), table, id, fields)
    }

    async fn delete_record(&self, table: &str, id: &RecordId) -> Result<()> {
        remove_record(&mut self.lock(), table, id)
    }

    async fn get_record(&self, table: &str, id: &RecordId) -> Result<Option<Record>> {
        Ok(read_record(&self.lock(), table, id))
    }
}
