use std::sync::Arc;

use leadflow_config::{AppConfig, Schema};
use leadflow_core::RecordId;
use leadflow_saga::{Saga, SagaBuilder};
use tracing::{debug, error, info, warn};

use super::context::InvoiceContext;
use super::invoice_data::{FeesInvoiceData, FeesPackage};
use super::saga_steps::{CreatePaymentRecordStep, RequestInvoiceStep, StampInvoiceCreatedStep};
use crate::error::error_chain;
use crate::operations::notifications::{self, InvoiceSummary};
use crate::operations::notify::RetryPolicy;
use crate::operations::poll::PollPolicy;
use crate::providers::{HttpNotifier, MemoryRecordStore};
use crate::traits::{AdminNotifier, Notifier, RecordStore};
use crate::{OperationError, Result};

type InvoiceSaga<S, N> = Saga<FeesInvoiceData, FeesInvoiceData, InvoiceContext<S, N>, OperationError>;

#[derive(Debug, Clone)]
pub struct FeesInvoiceInput {
    pub package_id: RecordId,
}

/// Why a package was accepted but no invoice was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeesInvoiceSkip {
    NoAdditionalFees,
    /// The package already carries an invoice timestamp.
    AlreadyInvoiced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeesInvoiceOutput {
    pub payment_record_id: RecordId,
    pub invoice_pdf_url: String,
    /// Success notification, when it could be written.
    pub notification_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeesInvoiceOutcome {
    Skipped(FeesInvoiceSkip),
    Created(FeesInvoiceOutput),
}

/// Creates the separate invoice for a completed package's additional fees.
///
/// A payment record is created first and the workflow engine attaches the
/// invoice PDF to it. If the engine cannot be reached or the PDF never
/// arrives, the payment record is deleted again.
pub struct FeesInvoiceOperation<S, N, A> {
    store: Arc<S>,
    notifier: Arc<N>,
    admin: Arc<A>,
    schema: Arc<Schema>,
    retry: RetryPolicy,
    poll: PollPolicy,
}

impl<S, N, A> FeesInvoiceOperation<S, N, A>
where
    S: RecordStore + 'static,
    N: Notifier + 'static,
    A: AdminNotifier,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, admin: Arc<A>, config: &AppConfig) -> Self {
        Self {
            store,
            notifier,
            admin,
            schema: Arc::new(config.schema().clone()),
            retry: config.retry().into(),
            poll: config.polling().into(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the package is missing or has no billing contact
    /// id, or if the invoice could not be created (after deleting the
    /// payment record). Every error is also reported as an urgent admin
    /// notification.
    pub async fn execute(&self, input: &FeesInvoiceInput) -> Result<FeesInvoiceOutcome> {
        info!(package_id = %input.package_id, "creating additional fees invoice");
        match self.run(&input.package_id).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!(package_id = %input.package_id, error = %error_chain(&err), "additional fees invoice failed");
                let notification =
                    notifications::additional_fees_invoice_failed(&input.package_id, &error_chain(&err));
                if let Err(e) = self.admin.create_notification(&notification).await {
                    warn!(error = %e, "could not create failure notification");
                }
                Err(err)
            }
        }
    }

    async fn run(&self, package_id: &RecordId) -> Result<FeesInvoiceOutcome> {
        let packages = &self.schema.packages;
        let record = self
            .store
            .get_record(&packages.table, package_id)
            .await?
            .ok_or_else(|| OperationError::PackageNotFound(package_id.clone()))?;

        if record.is_present(&packages.additional_fees_invoice_created_at) {
            info!(package_id = %package_id, "additional fees already invoiced");
            return Ok(FeesInvoiceOutcome::Skipped(FeesInvoiceSkip::AlreadyInvoiced));
        }
        let package = FeesPackage::read(packages, &record);
        if !package.has_additional_fees() {
            info!(package_id = %package_id, "no additional fees to invoice");
            return Ok(FeesInvoiceOutcome::Skipped(FeesInvoiceSkip::NoAdditionalFees));
        }
        if package.billing_contact_id.is_empty() {
            return Err(OperationError::MissingBillingContact(package_id.clone()));
        }

        let ctx = InvoiceContext::new(
            Arc::clone(&self.store),
            Arc::clone(&self.notifier),
            Arc::clone(&self.schema),
            self.retry,
            self.poll,
        );
        let data = FeesInvoiceData::new(package_id.clone(), package);
        let (result, audit_log) = build_saga::<S, N>().execute_with_audit(&ctx, data).await;
        let created = match result {
            Ok(created) => created,
            Err(saga_error) => {
                debug!(audit = %audit_log.summary(), "invoice saga rolled back");
                return Err(saga_error.into());
            }
        };

        let FeesInvoiceData {
            package,
            payment_record_id,
            invoice_pdf_url,
            ..
        } = created;
        let payment_record_id = payment_record_id.ok_or(OperationError::MissingCreatedRecord {
            record: "payment record",
        })?;
        let invoice_pdf_url = invoice_pdf_url.unwrap_or_default();
        info!(package_id = %package_id, payment_id = %payment_record_id, "additional fees invoice created");

        let summary = InvoiceSummary {
            package_id: &package.package_id,
            student_name: &package.student_name,
            payment_record_id: &payment_record_id,
            total_amount: package.total_amount,
            over_delivered_hours: package.over_delivered_hours,
            hourly_lesson_rate: package.hourly_lesson_rate,
            transportation_reimbursement: package.transportation_reimbursement,
            late_cancellation_fees: package.late_cancellation_fees,
            adjustment: package.adjustment,
        };
        let notification_id = match self
            .admin
            .create_notification(&notifications::additional_fees_invoice_created(&summary))
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "could not create invoice notification");
                None
            }
        };

        Ok(FeesInvoiceOutcome::Created(FeesInvoiceOutput {
            payment_record_id,
            invoice_pdf_url,
            notification_id,
        }))
    }
}

/// Saga steps an additional-fees invoice is created through, in order.
#[must_use]
pub fn fees_invoice_step_names() -> Vec<&'static str> {
    build_saga::<MemoryRecordStore, HttpNotifier>().step_names()
}

fn build_saga<S, N>() -> InvoiceSaga<S, N>
where
    S: RecordStore + 'static,
    N: Notifier + 'static,
{
    SagaBuilder::new()
        .first_step(CreatePaymentRecordStep::<S, N>::new())
        .then(RequestInvoiceStep::new())
        .then(StampInvoiceCreatedStep::new())
        .build()
}
