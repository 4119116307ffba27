use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::TeamId;
use crate::domain::errors::{EnrollmentError, EnrollmentResult};
use crate::domain::person::PersonId;

/// Team aggregate root
///
/// A team is created once per enrollment and carries a client-generated id,
/// so a creation replayed against the remote authority is recognised as the
/// same team.
///
/// # Invariants
/// - Name is not blank
/// - The id never changes after creation
///
/// # Example
/// ```
/// use raid_enrollment::domain::person::PersonId;
/// use raid_enrollment::domain::team::Team;
///
/// let team = Team::new("Les Chamois", PersonId::new(), None).expect("valid team");
/// assert_eq!(team.name(), "Les Chamois");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    id: TeamId,
    name: String,
    image: Option<String>,
    manager_id: PersonId,
    created_at: DateTime<Utc>,
}

impl Team {
    /// Creates a new Team with a fresh id
    ///
    /// # Arguments
    /// * `name` - Display name (trimmed, cannot be blank)
    /// * `manager_id` - Person managing the team
    /// * `image` - Optional image reference
    ///
    /// # Returns
    /// * `Err(EnrollmentError::ValidationViolation)` - If the name is blank
    pub fn new(
        name: impl Into<String>,
        manager_id: PersonId,
        image: Option<String>,
    ) -> EnrollmentResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(EnrollmentError::ValidationViolation(
                "Team name cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            id: TeamId::new(),
            name,
            image,
            manager_id,
            created_at: Utc::now(),
        })
    }

    // ===== Getters =====

    pub fn id(&self) -> TeamId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn manager_id(&self) -> PersonId {
        self.manager_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reconstructs a Team from the remote authority or the local cache
    ///
    /// Bypasses name validation; the data was validated when first stored.
    pub fn from_persistence(
        id: TeamId,
        name: String,
        image: Option<String>,
        manager_id: PersonId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            image,
            manager_id,
            created_at,
        }
    }
}
