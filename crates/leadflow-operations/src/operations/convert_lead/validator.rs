use leadflow_config::schema::LeadSchema;
use leadflow_core::{LeadType, Record, resolve_student_email};

use super::saga_data::{ContactDetails, LeadPlan, PriorLeadFields, StudentProfile};

/// A single reason a lead cannot be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingLeadType,
    UnknownLeadType { value: String },
    /// A required field is blank or absent.
    MissingField { field: String },
    /// No student email was given and none can be derived from a parent email.
    StudentEmailUnavailable,
}

impl ValidationError {
    /// Returns an actionable tip for resolving this error.
    #[must_use]
    pub fn tip(&self) -> String {
        match self {
            Self::MissingLeadType | Self::UnknownLeadType { .. } => {
                "Set Lead Type to 'Parent' or 'Student' and tick the convert box again".to_string()
            }
            Self::MissingField { field } => {
                format!("Fill in '{field}' on the lead and tick the convert box again")
            }
            Self::StudentEmailUnavailable => {
                "Enter a student email, or a parent email to derive one from".to_string()
            }
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLeadType => write!(f, "lead type not specified"),
            Self::UnknownLeadType { value } => write!(f, "invalid lead type '{value}'"),
            Self::MissingField { field } => write!(f, "required field '{field}' is empty"),
            Self::StudentEmailUnavailable => write!(f, "could not determine student email"),
        }
    }
}

/// Non-empty collection of validation errors.
#[derive(Debug)]
#[allow(clippy::len_without_is_empty)]
pub struct ValidationErrors {
    first: ValidationError,
    rest: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Returns `None` if `errors` is empty.
    #[must_use]
    pub fn try_from_vec(mut errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            return None;
        }
        let first = errors.remove(0);
        Some(Self {
            first,
            rest: errors,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lead has {} problem(s):", self.len())?;
        for (i, error) in self.iter().enumerate() {
            write!(f, "\n  {}. {error}", i + 1)?;
            write!(f, "\n     Tip: {}", error.tip())?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            first: error,
            rest: Vec::new(),
        }
    }
}

/// Reads a lead record into a [`LeadPlan`], collecting every problem.
pub struct LeadValidator<'a> {
    fields: &'a LeadSchema,
}

impl<'a> LeadValidator<'a> {
    #[must_use]
    pub fn new(fields: &'a LeadSchema) -> Self {
        Self { fields }
    }

    /// # Errors
    ///
    /// Returns every validation failure found on the lead. No record-store
    /// write happens before this succeeds.
    pub fn validate(&self, lead: &Record) -> Result<LeadPlan, ValidationErrors> {
        let lead_type = self.lead_type(lead)?;
        let mut errors = Vec::new();

        let parent = match lead_type {
            LeadType::Parent => Some(self.parent_contact(lead, &mut errors)),
            LeadType::Student => None,
        };
        let student_first = self.required(lead, &self.fields.student_first_name, &mut errors);
        let student_last = self.required(lead, &self.fields.student_last_name, &mut errors);

        let parent_email = match &parent {
            Some(parent) => Some(parent.email.as_str()),
            None => lead.text(&self.fields.parent_email),
        };
        let student_email = if student_first.is_empty() {
            None
        } else {
            resolve_student_email(
                lead.text(&self.fields.student_email),
                parent_email.filter(|email| !email.is_empty()),
                &student_first,
            )
        };
        let parent_email_missing = parent.as_ref().is_some_and(|p| p.email.is_empty());
        if student_email.is_none() && !student_first.is_empty() && !parent_email_missing {
            errors.push(ValidationError::StudentEmailUnavailable);
        }

        if let Some(errors) = ValidationErrors::try_from_vec(errors) {
            return Err(errors);
        }

        let student_phone = lead
            .text(&self.fields.student_phone)
            .map(str::to_string)
            .or_else(|| parent.as_ref().and_then(|p| p.phone.clone()));

        Ok(LeadPlan {
            lead_id: lead.id.clone(),
            lead_type,
            prior: self.prior_fields(lead),
            parent,
            student: ContactDetails {
                first_name: student_first,
                last_name: student_last,
                email: student_email.unwrap_or_default(),
                phone: student_phone,
            },
            profile: self.profile(lead),
        })
    }

    fn prior_fields(&self, lead: &Record) -> PriorLeadFields {
        let mut prior = PriorLeadFields::default();
        for name in [
            &self.fields.lead_status,
            &self.fields.converted_at,
            &self.fields.link_to_parents,
            &self.fields.link_to_students,
            &self.fields.link_to_users,
        ] {
            match lead.get(name) {
                Some(value) => {
                    prior.values.insert(name.clone(), value.clone());
                }
                None => prior.absent.push(name.clone()),
            }
        }
        prior
    }

    fn lead_type(&self, lead: &Record) -> Result<LeadType, ValidationError> {
        let raw = lead
            .text(&self.fields.lead_type)
            .ok_or(ValidationError::MissingLeadType)?;
        raw.parse().map_err(|_| ValidationError::UnknownLeadType {
            value: raw.to_string(),
        })
    }

    fn parent_contact(&self, lead: &Record, errors: &mut Vec<ValidationError>) -> ContactDetails {
        ContactDetails {
            first_name: self.required(lead, &self.fields.parent_first_name, errors),
            last_name: self.required(lead, &self.fields.parent_last_name, errors),
            email: self.required(lead, &self.fields.parent_email, errors),
            phone: lead.text(&self.fields.parent_phone).map(str::to_string),
        }
    }

    fn required(&self, lead: &Record, field: &str, errors: &mut Vec<ValidationError>) -> String {
        if let Some(value) = lead.text(field) {
            value.to_string()
        } else {
            errors.push(ValidationError::MissingField {
                field: field.to_string(),
            });
            String::new()
        }
    }

    fn profile(&self, lead: &Record) -> StudentProfile {
        let text = |field: &str| lead.text(field).map(str::to_string);
        StudentProfile {
            grade_year: lead.select(&self.fields.grade_year).map(str::to_string),
            learning_preferences: text(&self.fields.learning_preferences),
            academic_goals: text(&self.fields.academic_goals),
            special_accommodations: text(&self.fields.special_accommodations),
            preferred_days_times: text(&self.fields.preferred_days_times),
            preferred_frequency: text(&self.fields.preferred_frequency),
            preferred_modes: lead.multi_select(&self.fields.preferred_modes),
        }
    }
}

#[cfg(test)]
mod tests {
    use leadflow_core::{FieldValue, Fields, RecordId};

    use super::*;

    fn lead(pairs: Vec<(&str, FieldValue)>) -> Record {
        Record::new(
            RecordId::new("recLead"),
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<Fields>(),
        )
    }

    fn parent_lead() -> Vec<(&'static str, FieldValue)> {
        vec![
            ("Lead Type", FieldValue::select("Parent")),
            ("Lead Status", FieldValue::select("Contacted")),
            ("Parent First Name", FieldValue::text("Jane")),
            ("Parent Last Name", FieldValue::text("Doe")),
            ("Parent Email", FieldValue::text("jane.doe@example.com")),
            ("Parent Phone", FieldValue::text("+852 5555 0101")),
            ("Student First Name", FieldValue::text("Mary Anne")),
            ("Student Last Name", FieldValue::text("Doe")),
        ]
    }

    fn validate(record: &Record) -> Result<LeadPlan, ValidationErrors> {
        let schema = LeadSchema::default();
        LeadValidator::new(&schema).validate(record)
    }

    #[test]
    fn complete_parent_lead_derives_student_contact() -> anyhow::Result<()> {
        let plan = validate(&lead(parent_lead()))?;

        assert_eq!(plan.lead_type, LeadType::Parent);
        assert_eq!(
            plan.prior.values.get("Lead Status"),
            Some(&FieldValue::select("Contacted"))
        );
        assert!(plan.prior.absent.contains(&"Converted At".to_string()));
        assert_eq!(plan.student.email, "jane.doe+maryanne@example.com");
        assert_eq!(plan.student.phone.as_deref(), Some("+852 5555 0101"));
        assert_eq!(plan.lead_name(), "Jane Doe");
        Ok(())
    }

    #[test]
    fn missing_parent_email_is_reported() {
        let mut fields = parent_lead();
        fields.retain(|(name, _)| *name != "Parent Email");

        let errors = validate(&lead(fields)).expect_err("should fail");

        assert!(errors.iter().any(|e| *e
            == ValidationError::MissingField {
                field: "Parent Email".to_string()
            }));
    }

    #[test]
    fn all_missing_fields_are_collected() {
        let errors = validate(&lead(vec![("Lead Type", FieldValue::select("Parent"))]))
            .expect_err("should fail");

        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn missing_lead_type_is_reported() {
        let errors = validate(&lead(vec![])).expect_err("should fail");

        assert_eq!(errors.iter().next(), Some(&ValidationError::MissingLeadType));
    }

    #[test]
    fn unknown_lead_type_is_reported() {
        let errors =
            validate(&lead(vec![("Lead Type", FieldValue::select("Tutor"))])).expect_err("fail");

        assert!(errors.to_string().contains("invalid lead type 'Tutor'"));
    }

    #[test]
    fn student_lead_uses_parent_email_present_on_lead() -> anyhow::Result<()> {
        let plan = validate(&lead(vec![
            ("Lead Type", FieldValue::select("Student")),
            ("Student First Name", FieldValue::text("Tom")),
            ("Student Last Name", FieldValue::text("Lee")),
            ("Student Email", FieldValue::text("  ")),
            ("Parent Email", FieldValue::text("mum@example.com")),
        ]))?;

        assert!(plan.parent.is_none());
        assert_eq!(plan.student.email, "mum+tom@example.com");
        assert_eq!(plan.lead_name(), "Tom Lee");
        Ok(())
    }

    #[test]
    fn student_lead_without_any_email_is_rejected() {
        let errors = validate(&lead(vec![
            ("Lead Type", FieldValue::select("Student")),
            ("Student First Name", FieldValue::text("Tom")),
            ("Student Last Name", FieldValue::text("Lee")),
        ]))
        .expect_err("should fail");

        assert_eq!(
            errors.iter().collect::<Vec<_>>(),
            vec![&ValidationError::StudentEmailUnavailable]
        );
    }

    #[test]
    fn optional_profile_fields_are_read_when_present() -> anyhow::Result<()> {
        let mut fields = parent_lead();
        fields.push(("Grade/Year", FieldValue::select("Year 10")));
        fields.push((
            "Preferred Modes",
            FieldValue::MultiSelect(vec!["Online".to_string(), "In-Person".to_string()]),
        ));
        fields.push(("Academic Goals", FieldValue::text("IGCSE Maths A*")));

        let plan = validate(&lead(fields))?;

        assert_eq!(plan.profile.grade_year.as_deref(), Some("Year 10"));
        assert_eq!(plan.profile.preferred_modes.len(), 2);
        assert_eq!(plan.profile.academic_goals.as_deref(), Some("IGCSE Maths A*"));
        assert_eq!(plan.profile.learning_preferences, None);
        Ok(())
    }
}
