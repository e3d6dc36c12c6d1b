#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use leadflow_config::{AppConfig, PollSettings, RetrySettings};
use leadflow_core::{Attachment, FieldValue, Fields, Record, RecordId};
use leadflow_operations::providers::MemoryRecordStore;
use leadflow_operations::traits::{Notifier, RecordStore, WebhookAck};
use leadflow_operations::{OperationError, Result};
use serde_json::{Value, json};

pub const LEAD_ID: &str = "recLead0001";

pub fn fields(entries: &[(&str, FieldValue)]) -> Fields {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

pub fn parent_lead() -> Fields {
    fields(&[
        ("Convert to Client", FieldValue::Checkbox(true)),
        ("Lead Type", FieldValue::select("Parent")),
        ("Lead Status", FieldValue::select("Contacted")),
        ("Parent First Name", FieldValue::text("Jane")),
        ("Parent Last Name", FieldValue::text("Doe")),
        ("Parent Email", FieldValue::text("jane.doe@example.com")),
        ("Parent Phone", FieldValue::text("+852 5555 0101")),
        ("Student First Name", FieldValue::text("Tom")),
        ("Student Last Name", FieldValue::text("Doe")),
        ("Grade/Year", FieldValue::select("Year 10")),
        ("Academic Goals", FieldValue::text("IGCSE maths A*")),
        (
            "Preferred Modes",
            FieldValue::MultiSelect(vec!["Online".to_string(), "In-person".to_string()]),
        ),
    ])
}

pub fn student_lead() -> Fields {
    fields(&[
        ("Convert to Client", FieldValue::Checkbox(true)),
        ("Lead Type", FieldValue::select("Student")),
        ("Lead Status", FieldValue::select("New")),
        ("Student First Name", FieldValue::text("Amy")),
        ("Student Last Name", FieldValue::text("Chan")),
        ("Student Email", FieldValue::text("amy.chan@example.com")),
    ])
}

pub fn config() -> AppConfig {
    AppConfig::default()
        .with_retry(RetrySettings {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(400),
            request_timeout: Duration::from_secs(2),
        })
        .with_polling(PollSettings {
            max_attempts: 4,
            interval: Duration::from_secs(5),
        })
}

pub fn find(records: Vec<Record>, id: &str) -> Record {
    records
        .into_iter()
        .find(|record| record.id.as_str() == id)
        .expect("record exists")
}

/// Store wrapper that rejects chosen writes.
pub struct FaultyStore {
    inner: Arc<MemoryRecordStore>,
    fail_create_in: Mutex<Option<String>>,
    fail_update_in: Mutex<Option<String>>,
    fail_write_number: Option<u32>,
    fail_deletes: bool,
    writes: AtomicU32,
    deleted: Mutex<Vec<String>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryRecordStore>) -> Self {
        Self {
            inner,
            fail_create_in: Mutex::new(None),
            fail_update_in: Mutex::new(None),
            fail_write_number: None,
            fail_deletes: false,
            writes: AtomicU32::new(0),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_create(self, table: &str) -> Self {
        *self.fail_create_in.lock().expect("fault lock") = Some(table.to_string());
        self
    }

    pub fn failing_update(self, table: &str) -> Self {
        *self.fail_update_in.lock().expect("fault lock") = Some(table.to_string());
        self
    }

    /// Reject the `n`th create or update, counting from 1. Later writes pass.
    pub fn failing_write(mut self, n: u32) -> Self {
        self.fail_write_number = Some(n);
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    /// Tables of the records deleted so far, in order.
    pub fn deleted_tables(&self) -> Vec<String> {
        self.deleted.lock().expect("delete log lock").clone()
    }

    fn rejects(slot: &Mutex<Option<String>>, table: &str) -> bool {
        slot.lock().expect("fault lock").as_deref() == Some(table)
    }

    fn count_write(&self, table: &str) -> Result<()> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_write_number == Some(n) {
            return Err(OperationError::StoreRejected(format!("write {n} in {table} refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn create_record(&self, table: &str, fields: Fields) -> Result<RecordId> {
        if Self::rejects(&self.fail_create_in, table) {
            return Err(OperationError::StoreRejected(format!("create in {table} refused")));
        }
        self.count_write(table)?;
        self.inner.create_record(table, fields).await
    }

    async fn update_record(&self, table: &str, id: &RecordId, fields: Fields) -> Result<()> {
        if Self::rejects(&self.fail_update_in, table) {
            return Err(OperationError::StoreRejected(format!("update in {table} refused")));
        }
        self.count_write(table)?;
        self.inner.update_record(table, id, fields).await
    }

    async fn clear_fields(&self, table: &str, id: &RecordId, fields: &[String]) -> Result<()> {
        self.inner.clear_fields(table, id, fields).await
    }

    async fn delete_record(&self, table: &str, id: &RecordId) -> Result<()> {
        if self.fail_deletes {
            return Err(OperationError::StoreRejected(format!("delete in {table} refused")));
        }
        self.inner.delete_record(table, id).await?;
        self.deleted
            .lock()
            .expect("delete log lock")
            .push(table.to_string());
        Ok(())
    }

    async fn get_record(&self, table: &str, id: &RecordId) -> Result<Option<Record>> {
        self.inner.get_record(table, id).await
    }
}

/// Stands in for the workflow engine: acknowledges the webhook and, when
/// given a contact id, writes it onto the user named in the payload. Given an
/// invoice URL, it attaches the PDF to the payment record named instead.
pub struct EngineNotifier {
    store: Arc<MemoryRecordStore>,
    contact_id: Option<String>,
    invoice_url: Option<String>,
    failures_left: AtomicU32,
    calls: AtomicU32,
    payloads: Mutex<Vec<Value>>,
}

impl EngineNotifier {
    pub fn new(store: Arc<MemoryRecordStore>) -> Self {
        Self {
            store,
            contact_id: None,
            invoice_url: None,
            failures_left: AtomicU32::new(0),
            calls: AtomicU32::new(0),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn assigning_contact(mut self, contact_id: &str) -> Self {
        self.contact_id = Some(contact_id.to_string());
        self
    }

    pub fn attaching_invoice(mut self, url: &str) -> Self {
        self.invoice_url = Some(url.to_string());
        self
    }

    pub fn failing_times(self, failures: u32) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.payloads.lock().expect("payload lock").clone()
    }
}

#[async_trait]
impl Notifier for EngineNotifier {
    async fn notify(&self, payload: &Value) -> Result<WebhookAck> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads
            .lock()
            .expect("payload lock")
            .push(payload.clone());

        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
        {
            return Err(OperationError::WebhookStatus {
                status: 503,
                body: "engine unavailable".to_string(),
            });
        }

        if let (Some(contact_id), Some(user_id)) = (&self.contact_id, payload["userId"].as_str()) {
            let update = fields(&[("Xero Contact ID", FieldValue::text(contact_id))]);
            self.store
                .update_record("Users", &RecordId::new(user_id), update)
                .await?;
        }
        let payment_id = payload["invoiceData"]["paymentRecordId"].as_str();
        if let (Some(url), Some(payment_id)) = (&self.invoice_url, payment_id) {
            let pdf = Attachment {
                url: url.clone(),
                filename: Some("invoice.pdf".to_string()),
            };
            let update = fields(&[("Invoice PDF", FieldValue::Attachments(vec![pdf]))]);
            self.store
                .update_record("Payments", &RecordId::new(payment_id), update)
                .await?;
        }
        Ok(WebhookAck {
            status: 200,
            body: Some(json!({ "message": "Workflow was started" })),
        })
    }
}
