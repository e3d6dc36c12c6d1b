use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;
use leadflow_config::schema::UserSchema;
use leadflow_core::{FieldValue, Fields, LeadStatus, RecordId, UserRole, UserStatus};
use leadflow_saga::SagaStep;
use tracing::debug;

use super::context::ConversionContext;
use super::saga_data::{ContactDetails, ConversionData};
use crate::OperationError;
use crate::traits::RecordStore;

/// Declares a stateless step generic over the record store.
macro_rules! conversion_step {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub(crate) struct $name<S> {
            _marker: PhantomData<fn() -> S>,
        }

        impl<S> $name<S> {
            #[must_use]
            pub fn new() -> Self {
                Self {
                    _marker: PhantomData,
                }
            }
        }

        impl<S> Default for $name<S> {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

fn user_fields(users: &UserSchema, contact: &ContactDetails, role: UserRole) -> Fields {
    let mut fields = Fields::new();
    fields.insert(users.first_name.clone(), FieldValue::text(&contact.first_name));
    fields.insert(users.last_name.clone(), FieldValue::text(&contact.last_name));
    fields.insert(users.email.clone(), FieldValue::text(&contact.email));
    if let Some(phone) = &contact.phone {
        fields.insert(users.phone.clone(), FieldValue::text(phone));
    }
    fields.insert(users.role.clone(), FieldValue::select(role));
    fields.insert(users.status.clone(), FieldValue::select(UserStatus::Active));
    fields
}

fn single_field(name: &str, value: FieldValue) -> Fields {
    let mut fields = Fields::new();
    fields.insert(name.to_string(), value);
    fields
}

async fn delete_created<S: RecordStore>(
    ctx: &ConversionContext<S>,
    table: &str,
    id: Option<&RecordId>,
) -> Result<(), OperationError> {
    if let Some(id) = id {
        ctx.store().delete_record(table, id).await?;
        debug!(table, record_id = %id, "deleted record created by conversion");
    }
    Ok(())
}

conversion_step!(CreateParentUserStep);

#[async_trait]
impl<S> SagaStep for CreateParentUserStep<S>
where
    S: RecordStore + 'static,
{
    type Input = ConversionData;
    type Output = ConversionData;
    type Context = ConversionContext<S>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "create_parent_user"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let users = &ctx.schema().users;
        let fields = input
            .plan
            .parent
            .as_ref()
            .map(|parent| user_fields(users, parent, UserRole::Parent));
        let Some(fields) = fields else {
            debug!("lead has no parent, skipping parent user");
            return Ok(input);
        };

        let id = ctx.store().create_record(&users.table, fields).await?;
        debug!(record_id = %id, "created parent user");
        input.created.parent_user_id = Some(id);
        Ok(input)
    }

    async fn compensate(&self, ctx: &Self::Context, output: Self::Output) -> Result<(), Self::Error> {
        let table = &ctx.schema().users.table;
        delete_created(ctx, table, output.created.parent_user_id.as_ref()).await
    }

    fn compensation_description(&self) -> String {
        "delete created parent user".to_string()
    }
}

conversion_step!(CreateParentRecordStep);

#[async_trait]
impl<S> SagaStep for CreateParentRecordStep<S>
where
    S: RecordStore + 'static,
{
    type Input = ConversionData;
    type Output = ConversionData;
    type Context = ConversionContext<S>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "create_parent_record"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let Some(user_id) = input.created.parent_user_id.clone() else {
            debug!("no parent user, skipping parent record");
            return Ok(input);
        };

        let parents = &ctx.schema().parents;
        let fields = single_field(&parents.user, FieldValue::link(&user_id));
        let id = ctx.store().create_record(&parents.table, fields).await?;
        debug!(record_id = %id, user_id = %user_id, "created parent record");
        input.created.parent_record_id = Some(id);
        Ok(input)
    }

    async fn compensate(&self, ctx: &Self::Context, output: Self::Output) -> Result<(), Self::Error> {
        let table = &ctx.schema().parents.table;
        delete_created(ctx, table, output.created.parent_record_id.as_ref()).await
    }

    fn compensation_description(&self) -> String {
        "delete created parent record".to_string()
    }
}

conversion_step!(
    /// Back-links the parent user to its parent record. Undone by deleting the
    /// user, so there is nothing to compensate here.
    LinkParentUserStep
);

#[async_trait]
impl<S> SagaStep for LinkParentUserStep<S>
where
    S: RecordStore + 'static,
{
    type Input = ConversionData;
    type Output = ConversionData;
    type Context = ConversionContext<S>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "link_parent_user"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let (Some(user_id), Some(record_id)) = (
            input.created.parent_user_id.clone(),
            input.created.parent_record_id.clone(),
        ) else {
            return Ok(input);
        };

        let users = &ctx.schema().users;
        let fields = single_field(&users.link_to_parent_record, FieldValue::link(&record_id));
        ctx.store()
            .update_record(&users.table, &user_id, fields)
            .await?;
        debug!(user_id = %user_id, record_id = %record_id, "linked parent user");
        Ok(input)
    }
}

conversion_step!(CreateStudentUserStep);

#[async_trait]
impl<S> SagaStep for CreateStudentUserStep<S>
where
    S: RecordStore + 'static,
{
    type Input = ConversionData;
    type Output = ConversionData;
    type Context = ConversionContext<S>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "create_student_user"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let users = &ctx.schema().users;
        let role = input.plan.lead_type.student_role();
        let fields = user_fields(users, &input.plan.student, role);

        let id = ctx.store().create_record(&users.table, fields).await?;
        debug!(record_id = %id, %role, "created student user");
        input.created.student_user_id = Some(id);
        Ok(input)
    }

    async fn compensate(&self, ctx: &Self::Context, output: Self::Output) -> Result<(), Self::Error> {
        let table = &ctx.schema().users.table;
        delete_created(ctx, table, output.created.student_user_id.as_ref()).await
    }

    fn compensation_description(&self) -> String {
        "delete created student user".to_string()
    }
}

conversion_step!(CreateStudentRecordStep);

#[async_trait]
impl<S> SagaStep for CreateStudentRecordStep<S>
where
    S: RecordStore + 'static,
{
    type Input = ConversionData;
    type Output = ConversionData;
    type Context = ConversionContext<S>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "create_student_record"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let user_id = input
            .created
            .student_user_id
            .clone()
            .ok_or(OperationError::MissingCreatedRecord {
                record: "student user",
            })?;
        let students = &ctx.schema().students;
        let profile = &input.plan.profile;

        let mut fields = single_field(&students.user, FieldValue::link(&user_id));
        if let Some(parent_record_id) = &input.created.parent_record_id {
            fields.insert(students.parents.clone(), FieldValue::link(parent_record_id));
        }
        if let Some(grade) = &profile.grade_year {
            fields.insert(students.grade_year.clone(), FieldValue::select(grade));
        }
        for (field, value) in [
            (&students.learning_preferences, &profile.learning_preferences),
            (&students.academic_goals, &profile.academic_goals),
            (&students.special_accommodations, &profile.special_accommodations),
            (&students.preferred_days_times, &profile.preferred_days_times),
            (&students.preferred_frequency, &profile.preferred_frequency),
        ] {
            if let Some(value) = value {
                fields.insert(field.clone(), FieldValue::text(value));
            }
        }
        if !profile.preferred_modes.is_empty() {
            fields.insert(
                students.preferred_modes.clone(),
                FieldValue::MultiSelect(profile.preferred_modes.clone()),
            );
        }

        let id = ctx.store().create_record(&students.table, fields).await?;
        debug!(record_id = %id, user_id = %user_id, "created student record");
        input.created.student_record_id = Some(id);
        Ok(input)
    }

    async fn compensate(&self, ctx: &Self::Context, output: Self::Output) -> Result<(), Self::Error> {
        let table = &ctx.schema().students.table;
        delete_created(ctx, table, output.created.student_record_id.as_ref()).await
    }

    fn compensation_description(&self) -> String {
        "delete created student record".to_string()
    }
}

conversion_step!(LinkStudentUserStep);

#[async_trait]
impl<S> SagaStep for LinkStudentUserStep<S>
where
    S: RecordStore + 'static,
{
    type Input = ConversionData;
    type Output = ConversionData;
    type Context = ConversionContext<S>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "link_student_user"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let (Some(user_id), Some(record_id)) = (
            input.created.student_user_id.clone(),
            input.created.student_record_id.clone(),
        ) else {
            return Err(OperationError::MissingCreatedRecord {
                record: "student record",
            });
        };

        let users = &ctx.schema().users;
        let fields = single_field(&users.link_to_student_record, FieldValue::link(&record_id));
        ctx.store()
            .update_record(&users.table, &user_id, fields)
            .await?;
        debug!(user_id = %user_id, record_id = %record_id, "linked student user");
        Ok(input)
    }
}

conversion_step!(
    /// Marks the lead Converted and links it to everything created. Runs
    /// inside the saga so a lead is never left looking unconverted while its
    /// records exist.
    MarkLeadConvertedStep
);

#[async_trait]
impl<S> SagaStep for MarkLeadConvertedStep<S>
where
    S: RecordStore + 'static,
{
    type Input = ConversionData;
    type Output = ConversionData;
    type Context = ConversionContext<S>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "mark_lead_converted"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let leads = &ctx.schema().leads;
        let created = &input.created;
        let primary_user = created.primary_user_id(input.plan.lead_type)?;

        let mut fields = Fields::new();
        fields.insert(
            leads.lead_status.clone(),
            FieldValue::select(LeadStatus::Converted),
        );
        fields.insert(leads.converted_at.clone(), FieldValue::DateTime(Utc::now()));
        fields.insert(leads.convert_to_client.clone(), FieldValue::Checkbox(false));
        if let Some(parent_record_id) = &created.parent_record_id {
            fields.insert(leads.link_to_parents.clone(), FieldValue::link(parent_record_id));
        }
        if let Some(student_record_id) = &created.student_record_id {
            fields.insert(leads.link_to_students.clone(), FieldValue::link(student_record_id));
        }
        fields.insert(leads.link_to_users.clone(), FieldValue::link(primary_user));

        ctx.store()
            .update_record(&leads.table, &input.plan.lead_id, fields)
            .await?;
        debug!(lead_id = %input.plan.lead_id, "marked lead converted");
        Ok(input)
    }

    async fn compensate(&self, ctx: &Self::Context, output: Self::Output) -> Result<(), Self::Error> {
        let leads = &ctx.schema().leads;
        let prior = &output.plan.prior;

        let mut fields = prior.values.clone();
        fields.insert(leads.convert_to_client.clone(), FieldValue::Checkbox(true));
        ctx.store()
            .update_record(&leads.table, &output.plan.lead_id, fields)
            .await?;
        if prior.absent.is_empty() {
            return Ok(());
        }
        ctx.store()
            .clear_fields(&leads.table, &output.plan.lead_id, &prior.absent)
            .await
    }

    fn compensation_description(&self) -> String {
        "restore lead status and clear conversion links".to_string()
    }
}
