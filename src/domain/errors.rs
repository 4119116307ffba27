use thiserror::Error;

use super::person::{PersonId, MINIMUM_AGE};
use super::race::RaceId;

/// Which eligibility rule a person failed for a race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityRule {
    /// Younger than the minimum competitor age
    TooYoung { age: u32 },
    /// Already holds a registration for this race
    AlreadyRegistered,
    /// Gender does not match the race constraint
    GenderMismatch,
    /// Registered to another race whose window overlaps this one
    OverlappingRace { race_id: RaceId },
}

impl std::fmt::Display for EligibilityRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EligibilityRule::TooYoung { age } => {
                write!(f, "must be at least {} years old (is {})", MINIMUM_AGE, age)
            }
            EligibilityRule::AlreadyRegistered => write!(f, "already registered to this race"),
            EligibilityRule::GenderMismatch => write!(f, "gender does not match the race"),
            EligibilityRule::OverlappingRace { race_id } => {
                write!(f, "already registered to overlapping race {}", race_id)
            }
        }
    }
}

/// Errors surfaced by the enrollment engine
#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Remote authority unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Validation failed: {0}")]
    ValidationViolation(String),

    #[error("Person {person_id} is not eligible: {rule}")]
    Ineligible {
        person_id: PersonId,
        rule: EligibilityRule,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Local cache error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl EnrollmentError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True for business-rule outcomes the caller must show rather than retry
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            EnrollmentError::NotFound { .. }
                | EnrollmentError::ValidationViolation(_)
                | EnrollmentError::Ineligible { .. }
                | EnrollmentError::Conflict(_)
        )
    }
}

pub type EnrollmentResult<T> = Result<T, EnrollmentError>;
