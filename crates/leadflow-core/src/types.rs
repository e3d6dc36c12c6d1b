use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Declares a closed vocabulary of single-select option names.
///
/// Each variant maps to the exact option label stored in the record store, and
/// parsing accepts only those labels.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Option label as stored in the record store.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok(Self::$variant),)+
                    other => Err(CoreError::UnknownValue {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

vocabulary! {
    /// Who the lead describes: a parent enquiring for a child, or a student
    /// enquiring for themselves.
    LeadType, "lead type" {
        Parent => "Parent",
        Student => "Student",
    }
}

vocabulary! {
    LeadStatus, "lead status" {
        New => "New",
        Contacted => "Contacted",
        Converted => "Converted",
        Lost => "Lost",
    }
}

vocabulary! {
    UserRole, "user role" {
        Parent => "Parent",
        StudentDependent => "Student (Dependent)",
        StudentIndependent => "Student (Independent)",
    }
}

vocabulary! {
    UserStatus, "user status" {
        Active => "Active",
        Inactive => "Inactive",
    }
}

vocabulary! {
    Priority, "notification priority" {
        Regular => "Regular",
        Urgent => "Urgent",
    }
}

vocabulary! {
    NotificationCategory, "notification category" {
        Leads => "Leads",
        Packages => "Packages",
        SystemError => "System Error",
    }
}

vocabulary! {
    ActionStatus, "action status" {
        Pending => "Pending",
        Completed => "Completed",
    }
}

impl LeadType {
    /// Role given to the user created for the lead's student.
    #[must_use]
    pub fn student_role(self) -> UserRole {
        match self {
            Self::Parent => UserRole::StudentDependent,
            Self::Student => UserRole::StudentIndependent,
        }
    }
}
