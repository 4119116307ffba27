use serde::{Deserialize, Serialize};

use crate::domain::errors::{EnrollmentError, EnrollmentResult};
use crate::domain::ids::uuid_id;

uuid_id!(
    /// Identifier of a team, generated client-side
    TeamId
);

/// Manager approval state of a team's registration to one race
///
/// # State Transitions
/// ```text
/// Unvalidated <-> Validated
/// ```
/// Both states can be re-entered; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationState {
    #[default]
    Unvalidated,
    Validated,
}

impl ValidationState {
    pub fn from_flag(validated: bool) -> Self {
        if validated {
            ValidationState::Validated
        } else {
            ValidationState::Unvalidated
        }
    }

    pub fn is_validated(&self) -> bool {
        matches!(self, ValidationState::Validated)
    }

    /// Whether moving to `next` changes anything
    ///
    /// # Example
    /// ```
    /// use raid_enrollment::domain::team::ValidationState;
    ///
    /// assert!(ValidationState::Unvalidated.changes_to(ValidationState::Validated));
    /// assert!(!ValidationState::Validated.changes_to(ValidationState::Validated));
    /// ```
    pub fn changes_to(&self, next: ValidationState) -> bool {
        *self != next
    }
}

impl std::fmt::Display for ValidationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationState::Unvalidated => write!(f, "unvalidated"),
            ValidationState::Validated => write!(f, "validated"),
        }
    }
}

/// Race-scoped sequential entry number (dossard)
///
/// # Invariants
/// - Always at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct EntryNumber(u32);

impl EntryNumber {
    pub const FIRST: EntryNumber = EntryNumber(1);

    pub fn new(value: u32) -> EnrollmentResult<Self> {
        if value == 0 {
            return Err(EnrollmentError::ValidationViolation(
                "entry numbers start at 1".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// The number following this one
    pub fn next(&self) -> EntryNumber {
        EntryNumber(self.0.saturating_add(1))
    }
}

impl TryFrom<u32> for EntryNumber {
    type Error = EnrollmentError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        EntryNumber::new(value)
    }
}

impl From<EntryNumber> for u32 {
    fn from(number: EntryNumber) -> Self {
        number.0
    }
}

impl std::fmt::Display for EntryNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
