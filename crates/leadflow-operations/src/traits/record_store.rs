use async_trait::async_trait;
use leadflow_core::{Fields, Record, RecordId};

use crate::Result;

/// Table-oriented access to the external record store.
///
/// The store has no transactions: every call is an independent write, which
/// is why multi-record changes go through a saga.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Creates a record and returns the id the store assigned to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the record.
    async fn create_record(&self, table: &str, fields: Fields) -> Result<RecordId>;

    /// Merges `fields` into an existing record. Fields not named are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not exist or the write fails.
    async fn update_record(&self, table: &str, id: &RecordId, fields: Fields) -> Result<()>;

    /// Empties the named fields of an existing record. Fields it never had
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not exist or the write fails.
    async fn clear_fields(&self, table: &str, id: &RecordId, fields: &[String]) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the record does not exist or the delete fails.
    async fn delete_record(&self, table: &str, id: &RecordId) -> Result<()>;

    /// Returns `Ok(None)` when the record does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn get_record(&self, table: &str, id: &RecordId) -> Result<Option<Record>>;
}
