use std::sync::Arc;

use chrono::Utc;
use leadflow_config::{AppConfig, Schema};
use leadflow_core::{FieldValue, Fields, LeadStatus, LeadType, Record, RecordId};
use leadflow_saga::{Saga, SagaBuilder};
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::context::ConversionContext;
use super::saga_data::{ConversionData, CreatedRecords, LeadPlan};
use super::saga_steps::{
    CreateParentRecordStep, CreateParentUserStep, CreateStudentRecordStep, CreateStudentUserStep,
    LinkParentUserStep, LinkStudentUserStep, MarkLeadConvertedStep,
};
use super::validator::LeadValidator;
use crate::error::error_chain;
use crate::operations::notifications::{self, ConversionSummary, format_timestamp};
use crate::operations::notify::{RetryPolicy, notify_with_retry};
use crate::operations::poll::PollPolicy;
use crate::operations::sync_billing_contact::wait_for_billing_contact;
use crate::providers::MemoryRecordStore;
use crate::traits::{AdminNotifier, Notifier, RecordStore};
use crate::{OperationError, Result};

type ConversionSaga<S> = Saga<ConversionData, ConversionData, ConversionContext<S>, OperationError>;

/// Stage name reported when waiting for the billing contact undoes a conversion.
pub const WAIT_FOR_BILLING_CONTACT_STAGE: &str = "wait_for_billing_contact";

#[derive(Debug, Clone)]
pub struct ConvertLeadInput {
    pub lead_id: RecordId,
}

/// Why a trigger was accepted but nothing was converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TriggerNotSet,
    AlreadyConverted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutput {
    pub lead_type: LeadType,
    pub created: CreatedRecords,
    /// User the billing contact is created for (`userIdForXero`).
    pub user_id_for_billing: RecordId,
    /// Set when the conversion waited for the id.
    pub billing_contact_id: Option<String>,
    /// Success notification, when it could be written.
    pub notification_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Skipped(SkipReason),
    Converted(ConversionOutput),
}

/// Converts a lead into user, parent and student records.
///
/// Record creation runs as a saga: if any write fails, every record created
/// so far is deleted again and the lead is restored. Once the records exist
/// the billing-contact webhook is called; its failure leaves the records in
/// place for a manual retry of the webhook.
pub struct ConvertLeadOperation<S, N, A> {
    store: Arc<S>,
    notifier: Arc<N>,
    admin: Arc<A>,
    schema: Arc<Schema>,
    retry: RetryPolicy,
    poll: PollPolicy,
    wait_for_external_id: bool,
    utc_offset_minutes: i32,
}

impl<S, N, A> ConvertLeadOperation<S, N, A>
where
    S: RecordStore + 'static,
    N: Notifier,
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
            wait_for_external_id: config.wait_for_external_id(),
            utc_offset_minutes: config.notification_utc_offset_minutes(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the lead is missing or invalid, record creation
    /// fails (after rolling back), the webhook stays unreachable, or the
    /// billing-contact id never appears while waiting for it. Every error is
    /// also reported as an urgent admin notification.
    pub async fn execute(&self, input: &ConvertLeadInput) -> Result<ConversionOutcome> {
        info!(lead_id = %input.lead_id, "converting lead");
        match self.run(&input.lead_id).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!(lead_id = %input.lead_id, error = %error_chain(&err), "lead conversion failed");
                self.report_failure(&input.lead_id, &err).await;
                Err(err)
            }
        }
    }

    async fn run(&self, lead_id: &RecordId) -> Result<ConversionOutcome> {
        let leads = &self.schema.leads;
        let lead = self
            .store
            .get_record(&leads.table, lead_id)
            .await?
            .ok_or_else(|| OperationError::LeadNotFound(lead_id.clone()))?;

        if !lead.checkbox(&leads.convert_to_client) {
            info!(lead_id = %lead_id, "convert trigger not set, nothing to do");
            return Ok(ConversionOutcome::Skipped(SkipReason::TriggerNotSet));
        }
        if lead.text(&leads.lead_status) == Some(LeadStatus::Converted.as_str()) {
            warn!(lead_id = %lead_id, "lead already converted, skipping to avoid duplicates");
            self.clear_trigger(lead_id).await;
            return Ok(ConversionOutcome::Skipped(SkipReason::AlreadyConverted));
        }

        let plan = LeadValidator::new(leads).validate(&lead)?;
        info!(lead_id = %lead_id, lead_type = %plan.lead_type, "lead validated");
        self.convert(plan).await.map(ConversionOutcome::Converted)
    }

    async fn convert(&self, plan: LeadPlan) -> Result<ConversionOutput> {
        let saga = build_saga::<S>(plan.lead_type);
        let ctx = ConversionContext::new(Arc::clone(&self.store), Arc::clone(&self.schema));

        let uncommitted = match saga.execute_uncommitted(&ctx, ConversionData::new(plan)).await {
            Ok(uncommitted) => uncommitted,
            Err((saga_error, audit_log)) => {
                debug!(audit = %audit_log.summary(), "conversion saga rolled back");
                return Err(saga_error.into());
            }
        };

        let ConversionData { plan, created } = uncommitted.output().clone();
        let user_id = created.primary_user_id(plan.lead_type)?.clone();
        info!(
            lead_id = %plan.lead_id,
            records = created.count(),
            user_id = %user_id,
            "records created, calling billing contact webhook"
        );

        let payload = json!({ "userId": user_id });
        if let Err(err) = notify_with_retry(&*self.notifier, &payload, &self.retry).await {
            // Records stay in place when the webhook fails.
            uncommitted.commit();
            return Err(err);
        }

        let billing_contact_id = if self.wait_for_external_id {
            match wait_for_billing_contact(&*self.store, &self.schema, &user_id, &self.poll).await {
                Ok(id) => Some(id),
                Err(err) => {
                    warn!(user_id = %user_id, error = %err, "billing contact never appeared, undoing conversion");
                    let (saga_error, audit_log) = uncommitted
                        .abort_with_audit(&ctx, WAIT_FOR_BILLING_CONTACT_STAGE, err)
                        .await;
                    debug!(audit = %audit_log.summary(), "conversion saga rolled back");
                    return Err(saga_error.into());
                }
            }
        } else {
            None
        };
        uncommitted.commit();

        let notification_id = self
            .notify_success(&plan, &created, &user_id, billing_contact_id.as_deref())
            .await;
        info!(lead_id = %plan.lead_id, user_id = %user_id, "lead converted");

        Ok(ConversionOutput {
            lead_type: plan.lead_type,
            created,
            user_id_for_billing: user_id,
            billing_contact_id,
            notification_id,
        })
    }

    async fn notify_success(
        &self,
        plan: &LeadPlan,
        created: &CreatedRecords,
        user_id: &RecordId,
        billing_contact_id: Option<&str>,
    ) -> Option<RecordId> {
        let lead_name = plan.lead_name();
        let records = created.summary();
        let converted_at = format_timestamp(Utc::now(), self.utc_offset_minutes);
        let summary = ConversionSummary {
            lead_name: &lead_name,
            lead_type: plan.lead_type.as_str(),
            records: &records,
            user_id,
            converted_at: &converted_at,
        };
        let notification = match billing_contact_id {
            Some(id) => notifications::conversion_completed(&summary, id),
            None => notifications::conversion_pending(&summary),
        };

        match self.admin.create_notification(&notification).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "could not create conversion notification");
                None
            }
        }
    }

    async fn clear_trigger(&self, lead_id: &RecordId) {
        let leads = &self.schema.leads;
        let mut fields = Fields::new();
        fields.insert(leads.convert_to_client.clone(), FieldValue::Checkbox(false));
        if let Err(e) = self.store.update_record(&leads.table, lead_id, fields).await {
            warn!(lead_id = %lead_id, error = %e, "could not clear convert trigger");
        }
    }

    async fn report_failure(&self, lead_id: &RecordId, err: &OperationError) {
        self.clear_trigger(lead_id).await;

        let leads = &self.schema.leads;
        let lead = match self.store.get_record(&leads.table, lead_id).await {
            Ok(lead) => lead,
            Err(e) => {
                debug!(error = %e, "could not re-read lead for failure notification");
                None
            }
        };
        let (lead_name, lead_type) = lead
            .as_ref()
            .map_or(("Unknown".to_string(), "Unknown".to_string()), |lead| {
                describe_lead(&self.schema, lead)
            });

        let notification =
            notifications::conversion_failed(lead_id, &lead_name, &lead_type, &error_chain(err));
        if let Err(e) = self.admin.create_notification(&notification).await {
            warn!(error = %e, "could not create failure notification");
        }
    }
}

/// Name and type of a lead for notifications, tolerating missing fields.
fn describe_lead(schema: &Schema, lead: &Record) -> (String, String) {
    let leads = &schema.leads;
    let lead_type = lead.text(&leads.lead_type).unwrap_or("Unknown").to_string();
    let (first, last) = if lead_type == LeadType::Parent.as_str() {
        (&leads.parent_first_name, &leads.parent_last_name)
    } else {
        (&leads.student_first_name, &leads.student_last_name)
    };
    let name = format!("{} {}", lead.text_or_empty(first), lead.text_or_empty(last));
    let name = name.trim();
    let name = if name.is_empty() { "Unknown" } else { name };
    (name.to_string(), lead_type)
}

/// Saga steps a lead of `lead_type` is converted through, in order.
#[must_use]
pub fn conversion_step_names(lead_type: LeadType) -> Vec<&'static str> {
    build_saga::<MemoryRecordStore>(lead_type).step_names()
}

fn build_saga<S>(lead_type: LeadType) -> ConversionSaga<S>
where
    S: RecordStore + 'static,
{
    match lead_type {
        LeadType::Parent => SagaBuilder::new()
            .first_step(CreateParentUserStep::<S>::new())
            .then(CreateParentRecordStep::new())
            .then(LinkParentUserStep::new())
            .then(CreateStudentUserStep::new())
            .then(CreateStudentRecordStep::new())
            .then(LinkStudentUserStep::new())
            .then(MarkLeadConvertedStep::new())
            .build(),
        LeadType::Student => SagaBuilder::new()
            .first_step(CreateStudentUserStep::<S>::new())
            .then(CreateStudentRecordStep::new())
            .then(LinkStudentUserStep::new())
            .then(MarkLeadConvertedStep::new())
            .build(),
    }
}
