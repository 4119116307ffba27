//! Team creation and registration as one enrollment, plus member removal and
//! team deletion.

use std::collections::HashSet;

use super::dossard::{DossardAllocator, MAX_ALLOCATION_ATTEMPTS};
use super::eligibility::RegistrationIndex;
use super::EnrollmentEngine;
use crate::auth::Credential;
use crate::domain::errors::{EnrollmentError, EnrollmentResult};
use crate::domain::person::{Person, PersonId};
use crate::domain::race::{Race, RaceId};
use crate::domain::registration::Enrollment;
use crate::domain::team::events::TeamEvent;
use crate::domain::team::{EntryNumber, Team, TeamId};
use crate::infrastructure::repositories::SyncStatus;

/// Team details supplied by the manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    pub name: String,
    pub manager_id: PersonId,
    pub image: Option<String>,
}

impl NewTeam {
    pub fn new(name: impl Into<String>, manager_id: PersonId) -> Self {
        Self {
            name: name.into(),
            manager_id,
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Result of a successful enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentReceipt {
    pub team_id: TeamId,
    pub entry_number: EntryNumber,
    pub sync: SyncStatus,
}

fn check_member_list(member_ids: &[PersonId]) -> EnrollmentResult<()> {
    if member_ids.is_empty() {
        return Err(EnrollmentError::ValidationViolation(
            "A team needs at least one member".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(member_ids.len());
    if let Some(duplicate) = member_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(EnrollmentError::ValidationViolation(format!(
            "Person {} is listed twice",
            duplicate
        )));
    }

    Ok(())
}

impl EnrollmentEngine {
    /// Creates a team, registers it to the race with the next entry number,
    /// and registers every member to the race
    ///
    /// Members are re-checked against the eligibility rules at commit time;
    /// the first failure is reported as [`EnrollmentError::Ineligible`].
    /// When the authority is unreachable the enrollment is applied locally
    /// and queued, and the receipt reports [`SyncStatus::Queued`].
    pub async fn create_team_and_register(
        &self,
        credential: &Credential,
        new_team: NewTeam,
        member_ids: Vec<PersonId>,
        race_id: RaceId,
    ) -> EnrollmentResult<EnrollmentReceipt> {
        check_member_list(&member_ids)?;
        // Before the race lock: a replayed creation may need it to renumber
        self.catch_up(credential).await?;

        let race = self.require_race(credential, race_id).await?;
        self.check_members(credential, &race, &member_ids).await?;

        let team = Team::new(new_team.name, new_team.manager_id, new_team.image)?;
        let team_id = team.id();

        let _guard = self.allocator.lock(race_id).await;

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let entries = self.repository.team_entries(credential, race_id).await?;
            let high_water = self.repository.highest_entry_number(race_id).await?;
            let entry_number = DossardAllocator::next_number(
                entries.iter().map(|entry| entry.registration.entry_number()),
                high_water,
            );

            let enrollment = Enrollment {
                team: team.clone(),
                member_ids: member_ids.clone(),
                race_id,
                entry_number,
            };

            match self.repository.enroll(credential, &enrollment).await {
                Ok(sync) => {
                    let event = TeamEvent::Enrolled {
                        team_id,
                        race_id,
                        entry_number,
                    };
                    tracing::info!(
                        event = event.kind(),
                        team_id = %team_id,
                        race_id = %race_id,
                        entry_number = %entry_number,
                        synced = sync.is_synced(),
                        "Team enrolled"
                    );

                    return Ok(EnrollmentReceipt {
                        team_id,
                        entry_number,
                        sync,
                    });
                }
                Err(EnrollmentError::Conflict(message)) => {
                    tracing::warn!(
                        attempt,
                        race_id = %race_id,
                        entry_number = %entry_number,
                        error = %message,
                        "Entry number taken, retrying"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Err(EnrollmentError::Conflict(format!(
            "No free entry number for race {} after {} attempts",
            race_id, MAX_ALLOCATION_ATTEMPTS
        )))
    }

    async fn check_members(
        &self,
        credential: &Credential,
        race: &Race,
        member_ids: &[PersonId],
    ) -> EnrollmentResult<()> {
        let people = self.repository.people(credential).await?;
        let registrations = self.repository.person_registrations(credential).await?;
        let index = RegistrationIndex::new(&registrations);
        let today = self.today();

        for person_id in member_ids {
            let person: &Person = people
                .iter()
                .find(|person| person.id == *person_id)
                .ok_or_else(|| EnrollmentError::not_found("Person", person_id))?;

            index
                .check(person, race, today)
                .map_err(|rule| EnrollmentError::Ineligible {
                    person_id: *person_id,
                    rule,
                })?;
        }

        Ok(())
    }

    /// Removes a member from the team and drops their registration to the race
    pub async fn remove_member(
        &self,
        credential: &Credential,
        team_id: TeamId,
        person_id: PersonId,
        race_id: RaceId,
    ) -> EnrollmentResult<SyncStatus> {
        self.catch_up(credential).await?;
        let entry = self
            .repository
            .team_entry(credential, team_id, race_id)
            .await?
            .ok_or_else(|| EnrollmentError::not_found("Team registration", team_id))?;

        if !entry.member_ids.contains(&person_id) {
            return Err(EnrollmentError::not_found("Team member", person_id));
        }

        let sync = self
            .repository
            .remove_member(credential, team_id, person_id, race_id)
            .await?;

        let event = TeamEvent::MemberRemoved {
            team_id,
            person_id,
            race_id,
        };
        tracing::info!(
            event = event.kind(),
            team_id = %team_id,
            person_id = %person_id,
            synced = sync.is_synced(),
            "Member removed"
        );

        Ok(sync)
    }

    /// Deletes the team with its memberships and registrations
    pub async fn delete_team(
        &self,
        credential: &Credential,
        team_id: TeamId,
    ) -> EnrollmentResult<SyncStatus> {
        self.catch_up(credential).await?;
        let sync = self.repository.delete_team(credential, team_id).await?;

        let event = TeamEvent::Deleted { team_id };
        tracing::info!(
            event = event.kind(),
            team_id = %team_id,
            synced = sync.is_synced(),
            "Team deleted"
        );

        Ok(sync)
    }
}
