use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;
use leadflow_core::{FieldValue, Fields, RecordId};
use leadflow_saga::SagaStep;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use super::context::InvoiceContext;
use super::invoice_data::{FeesInvoiceData, FeesPackage};
use crate::OperationError;
use crate::operations::notify::notify_with_retry;
use crate::operations::poll::poll_until;
use crate::traits::{Notifier, RecordStore};

/// Payment type of the record the engine attaches the invoice to.
pub(crate) const ADDITIONAL_FEES_PAYMENT_TYPE: &str = "Additional Fees Invoice";

macro_rules! invoice_step {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub(crate) struct $name<S, N> {
            _marker: PhantomData<fn() -> (S, N)>,
        }

        impl<S, N> $name<S, N> {
            #[must_use]
            pub fn new() -> Self {
                Self {
                    _marker: PhantomData,
                }
            }
        }

        impl<S, N> Default for $name<S, N> {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// Missing payment record id after the payment step ran.
fn payment_missing() -> OperationError {
    OperationError::MissingCreatedRecord {
        record: "payment record",
    }
}

invoice_step!(
    /// Creates the payment record the invoice PDF ends up on.
    CreatePaymentRecordStep
);

#[async_trait]
impl<S, N> SagaStep for CreatePaymentRecordStep<S, N>
where
    S: RecordStore + 'static,
    N: Notifier + 'static,
{
    type Input = FeesInvoiceData;
    type Output = FeesInvoiceData;
    type Context = InvoiceContext<S, N>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "create_payment_record"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let payments = &ctx.schema().payments;
        let mut fields = Fields::new();
        fields.insert(
            payments.payment_type.clone(),
            FieldValue::select(ADDITIONAL_FEES_PAYMENT_TYPE),
        );
        fields.insert(
            payments.tutoring_package.clone(),
            FieldValue::link(&input.package_record_id),
        );

        let id = ctx.store().create_record(&payments.table, fields).await?;
        debug!(record_id = %id, "created payment record");
        input.payment_record_id = Some(id);
        Ok(input)
    }

    async fn compensate(&self, ctx: &Self::Context, output: Self::Output) -> Result<(), Self::Error> {
        if let Some(id) = &output.payment_record_id {
            ctx.store().delete_record(&ctx.schema().payments.table, id).await?;
            debug!(record_id = %id, "deleted payment record");
        }
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "delete created payment record".to_string()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceData<'a> {
    #[serde(flatten)]
    package: &'a FeesPackage,
    payment_record_id: &'a RecordId,
}

invoice_step!(
    /// Asks the workflow engine for the invoice and waits until its PDF is
    /// attached to the payment record.
    RequestInvoiceStep
);

#[async_trait]
impl<S, N> SagaStep for RequestInvoiceStep<S, N>
where
    S: RecordStore + 'static,
    N: Notifier + 'static,
{
    type Input = FeesInvoiceData;
    type Output = FeesInvoiceData;
    type Context = InvoiceContext<S, N>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "request_invoice"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let payment_id = input.payment_record_id.clone().ok_or_else(payment_missing)?;
        let invoice_data = InvoiceData {
            package: &input.package,
            payment_record_id: &payment_id,
        };
        let payload = json!({
            "packageRecordId": input.package_record_id,
            "invoiceData": invoice_data,
        });
        notify_with_retry(ctx.notifier(), &payload, ctx.retry()).await?;
        info!(payment_id = %payment_id, "invoice requested, waiting for PDF");

        let payments = &ctx.schema().payments;
        let store = ctx.store();
        let payment_id = &payment_id;
        let url = poll_until(
            move || async move {
                let payment = store
                    .get_record(&payments.table, payment_id)
                    .await?
                    .ok_or_else(|| OperationError::RecordNotFound {
                        table: payments.table.clone(),
                        id: payment_id.clone(),
                    })?;
                Ok(payment.first_attachment_url(&payments.invoice_pdf).map(str::to_string))
            },
            ctx.poll(),
        )
        .await?;

        debug!(url = %url, "invoice PDF attached");
        input.invoice_pdf_url = Some(url);
        Ok(input)
    }
}

invoice_step!(
    /// Records on the package that its additional-fees invoice exists.
    StampInvoiceCreatedStep
);

#[async_trait]
impl<S, N> SagaStep for StampInvoiceCreatedStep<S, N>
where
    S: RecordStore + 'static,
    N: Notifier + 'static,
{
    type Input = FeesInvoiceData;
    type Output = FeesInvoiceData;
    type Context = InvoiceContext<S, N>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "stamp_invoice_created"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let packages = &ctx.schema().packages;
        let mut fields = Fields::new();
        fields.insert(
            packages.additional_fees_invoice_created_at.clone(),
            FieldValue::DateTime(Utc::now()),
        );
        ctx.store()
            .update_record(&packages.table, &input.package_record_id, fields)
            .await?;
        Ok(input)
    }

    async fn compensate(&self, ctx: &Self::Context, output: Self::Output) -> Result<(), Self::Error> {
        let packages = &ctx.schema().packages;
        ctx.store()
            .clear_fields(
                &packages.table,
                &output.package_record_id,
                &[packages.additional_fees_invoice_created_at.clone()],
            )
            .await
    }

    fn compensation_description(&self) -> String {
        "clear additional fees invoice timestamp".to_string()
    }
}
