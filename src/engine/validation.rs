//! Manager approval of a team's race registration.

use super::EnrollmentEngine;
use crate::auth::Credential;
use crate::domain::errors::{EnrollmentError, EnrollmentResult};
use crate::domain::race::RaceId;
use crate::domain::team::{TeamId, ValidationState};

impl EnrollmentEngine {
    /// Marks the registration validated; a no-op when it already is
    pub async fn validate(
        &self,
        credential: &Credential,
        team_id: TeamId,
        race_id: RaceId,
    ) -> EnrollmentResult<ValidationState> {
        self.transition(credential, team_id, race_id, ValidationState::Validated)
            .await
    }

    /// Withdraws validation; a no-op when the registration is unvalidated
    pub async fn invalidate(
        &self,
        credential: &Credential,
        team_id: TeamId,
        race_id: RaceId,
    ) -> EnrollmentResult<ValidationState> {
        self.transition(credential, team_id, race_id, ValidationState::Unvalidated)
            .await
    }

    async fn transition(
        &self,
        credential: &Credential,
        team_id: TeamId,
        race_id: RaceId,
        target: ValidationState,
    ) -> EnrollmentResult<ValidationState> {
        // Queued changes to this registration must land before its current
        // state decides whether anything is written
        self.catch_up(credential).await?;

        let mut registration = self
            .repository
            .team_entry(credential, team_id, race_id)
            .await?
            .map(|entry| entry.registration)
            .ok_or_else(|| EnrollmentError::not_found("Team registration", team_id))?;

        let Some(event) = registration.set_validation(target) else {
            tracing::debug!(team_id = %team_id, race_id = %race_id, state = %target, "Validation unchanged");
            return Ok(target);
        };

        let sync = self
            .repository
            .set_validation(credential, team_id, race_id, target.is_validated())
            .await?;

        tracing::info!(
            event = event.kind(),
            team_id = %team_id,
            race_id = %race_id,
            synced = sync.is_synced(),
            "Team validation changed"
        );

        Ok(registration.validation())
    }
}
