use leadflow_core::{Fields, LeadType, RecordId};
use serde::Serialize;

use crate::{OperationError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl ContactDetails {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Optional tutoring preferences copied onto the student record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentProfile {
    pub grade_year: Option<String>,
    pub learning_preferences: Option<String>,
    pub academic_goals: Option<String>,
    pub special_accommodations: Option<String>,
    pub preferred_days_times: Option<String>,
    pub preferred_frequency: Option<String>,
    pub preferred_modes: Vec<String>,
}

/// Lead fields the conversion overwrites, as they were before it ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorLeadFields {
    /// Values present before conversion.
    pub values: Fields,
    /// Fields that were empty before conversion.
    pub absent: Vec<String>,
}

/// Everything read from a validated lead that the conversion writes out.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadPlan {
    pub lead_id: RecordId,
    pub lead_type: LeadType,
    /// Restored onto the lead if the conversion is undone.
    pub prior: PriorLeadFields,
    /// Present for parent leads only.
    pub parent: Option<ContactDetails>,
    pub student: ContactDetails,
    pub profile: StudentProfile,
}

impl LeadPlan {
    /// Name of the lead's primary contact.
    #[must_use]
    pub fn lead_name(&self) -> String {
        self.parent.as_ref().unwrap_or(&self.student).full_name()
    }
}

/// Ids of the records a conversion created, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRecords {
    pub parent_user_id: Option<RecordId>,
    pub parent_record_id: Option<RecordId>,
    pub student_user_id: Option<RecordId>,
    pub student_record_id: Option<RecordId>,
}

impl CreatedRecords {
    /// The user the billing contact is created for: the parent user for
    /// parent leads, the student user otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if that user was never created.
    pub fn primary_user_id(&self, lead_type: LeadType) -> Result<&RecordId> {
        let (id, record) = match lead_type {
            LeadType::Parent => (&self.parent_user_id, "parent user"),
            LeadType::Student => (&self.student_user_id, "student user"),
        };
        id.as_ref()
            .ok_or(OperationError::MissingCreatedRecord { record })
    }

    /// Bullet list of the created records for notifications.
    #[must_use]
    pub fn summary(&self) -> String {
        [
            ("Parent User", &self.parent_user_id),
            ("Parent Record", &self.parent_record_id),
            ("Student User", &self.student_user_id),
            ("Student Record", &self.student_record_id),
        ]
        .into_iter()
        .filter_map(|(label, id)| id.as_ref().map(|id| format!("- {label}: {id}")))
        .collect::<Vec<_>>()
        .join("\n")
    }

    #[must_use]
    pub fn count(&self) -> usize {
        [
            &self.parent_user_id,
            &self.parent_record_id,
            &self.student_user_id,
            &self.student_record_id,
        ]
        .into_iter()
        .filter(|id| id.is_some())
        .count()
    }
}

/// Value threaded through the conversion saga.
#[derive(Debug, Clone)]
pub(crate) struct ConversionData {
    pub plan: LeadPlan,
    pub created: CreatedRecords,
}

impl ConversionData {
    pub fn new(plan: LeadPlan) -> Self {
        Self {
            plan,
            created: CreatedRecords::default(),
        }
    }
}
