use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Credential;
use crate::domain::errors::EnrollmentError;
use crate::domain::person::{Person, PersonId};
use crate::domain::race::{Race, RaceId};
use crate::domain::registration::{Enrollment, PersonRaceEntry, TeamEntry};
use crate::domain::team::TeamId;

/// Failure reported by the remote authority
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network error, timeout, unexpected status, or unreadable body
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    #[error("not found on remote: {0}")]
    NotFound(String),

    /// A unique resource (entry number, registration) is already taken
    #[error("remote conflict: {0}")]
    Conflict(String),

    /// A business rule rejected the request, or the request can never
    /// succeed as sent
    #[error("remote rejected request: {0}")]
    Rejected(String),

    /// The credential was refused; every request made with it will fail
    #[error("remote refused credential: {0}")]
    Unauthorized(String),
}

impl From<RemoteError> for EnrollmentError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Unavailable(message) => EnrollmentError::RemoteUnavailable(message),
            RemoteError::NotFound(message) => EnrollmentError::NotFound {
                entity: "Remote resource",
                id: message,
            },
            RemoteError::Conflict(message) => EnrollmentError::Conflict(message),
            RemoteError::Rejected(message) => EnrollmentError::ValidationViolation(message),
            RemoteError::Unauthorized(message) => EnrollmentError::Unauthorized(message),
        }
    }
}

/// The authoritative enrollment service
///
/// Every call forwards the caller's credential.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Fetch one race; `Ok(None)` when the authority does not know it
    async fn fetch_race(
        &self,
        credential: &Credential,
        race_id: RaceId,
    ) -> Result<Option<Race>, RemoteError>;

    /// Fetch every person the caller may enroll
    async fn fetch_people(&self, credential: &Credential) -> Result<Vec<Person>, RemoteError>;

    /// Fetch every person registration, each with its race
    async fn fetch_person_registrations(
        &self,
        credential: &Credential,
    ) -> Result<Vec<PersonRaceEntry>, RemoteError>;

    /// Fetch the teams registered to a race
    async fn fetch_team_entries(
        &self,
        credential: &Credential,
        race_id: RaceId,
    ) -> Result<Vec<TeamEntry>, RemoteError>;

    /// Apply a whole enrollment atomically; idempotent on the team id
    async fn create_enrollment(
        &self,
        credential: &Credential,
        enrollment: &Enrollment,
    ) -> Result<(), RemoteError>;

    async fn set_validation(
        &self,
        credential: &Credential,
        team_id: TeamId,
        race_id: RaceId,
        validated: bool,
    ) -> Result<(), RemoteError>;

    async fn remove_member(
        &self,
        credential: &Credential,
        team_id: TeamId,
        person_id: PersonId,
        race_id: RaceId,
    ) -> Result<(), RemoteError>;

    async fn delete_team(&self, credential: &Credential, team_id: TeamId)
        -> Result<(), RemoteError>;
}
