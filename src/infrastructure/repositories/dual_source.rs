//! Repository reading and writing through the remote authority with the
//! local cache as fallback.
//!
//! Reads go to the authority first and refresh the cache; any failure falls
//! back to the cache. Writes go to the authority first and are mirrored
//! locally; when the authority is unreachable they are applied to the cache
//! and queued for replay.
//!
//! While queued writes remain, the cache is the only view that includes
//! them: team and registration reads are served from it, and new writes
//! queue behind the earlier ones instead of overtaking them.

use std::sync::Arc;

use crate::auth::Credential;
use crate::domain::errors::EnrollmentResult;
use crate::domain::pending_action::PendingAction;
use crate::domain::person::{Person, PersonId};
use crate::domain::race::{Race, RaceId};
use crate::domain::registration::{Enrollment, PersonRaceEntry, TeamEntry};
use crate::domain::repositories::{LocalCache, RemoteAuthority, RemoteError};
use crate::domain::team::{EntryNumber, TeamId};
use crate::engine::dossard::DossardAllocator;

use super::pending_queue::PendingActionQueue;

/// Whether a write reached the authority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Acknowledged by the authority and mirrored locally
    Synced,
    /// Applied locally; waiting in the pending-action queue
    Queued,
}

impl SyncStatus {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncStatus::Synced)
    }
}

pub struct DualSourceRepository {
    remote: Arc<dyn RemoteAuthority>,
    cache: Arc<dyn LocalCache>,
    queue: PendingActionQueue,
}

impl DualSourceRepository {
    pub fn new(
        remote: Arc<dyn RemoteAuthority>,
        cache: Arc<dyn LocalCache>,
        allocator: Arc<DossardAllocator>,
    ) -> Self {
        let queue = PendingActionQueue::new(Arc::clone(&cache), Arc::clone(&remote), allocator);
        Self {
            remote,
            cache,
            queue,
        }
    }

    pub fn queue(&self) -> &PendingActionQueue {
        &self.queue
    }

    /// Replays queued writes, if any; true when none are left
    ///
    /// Called before an operation reads team state or writes, so the
    /// authority sees earlier offline writes first.
    pub async fn catch_up(&self, credential: &Credential) -> EnrollmentResult<bool> {
        if !self.queue.has_pending().await? {
            return Ok(true);
        }

        let report = self.queue.replay_all(credential).await?;
        Ok(report.is_drained())
    }

    fn fallback(what: &str, err: &RemoteError) {
        tracing::warn!(error = %err, "Remote read of {} failed, using local cache", what);
    }

    fn write_through_failed(what: &str, err: &dyn std::fmt::Display) {
        tracing::warn!(error = %err, "Failed to refresh cached {}", what);
    }

    pub async fn race(
        &self,
        credential: &Credential,
        race_id: RaceId,
    ) -> EnrollmentResult<Option<Race>> {
        match self.remote.fetch_race(credential, race_id).await {
            Ok(Some(race)) => {
                if let Err(err) = self.cache.upsert_race(&race).await {
                    Self::write_through_failed("race", &err);
                }
                Ok(Some(race))
            }
            Ok(None) => {
                tracing::debug!(race_id = %race_id, "Race unknown to remote, checking local cache");
                self.cache.find_race(race_id).await
            }
            Err(err) => {
                Self::fallback("race", &err);
                self.cache.find_race(race_id).await
            }
        }
    }

    pub async fn people(&self, credential: &Credential) -> EnrollmentResult<Vec<Person>> {
        match self.remote.fetch_people(credential).await {
            Ok(people) => {
                if let Err(err) = self.cache.upsert_people(&people).await {
                    Self::write_through_failed("people", &err);
                }
                Ok(people)
            }
            Err(err) => {
                Self::fallback("people", &err);
                self.cache.list_people().await
            }
        }
    }

    pub async fn person_registrations(
        &self,
        credential: &Credential,
    ) -> EnrollmentResult<Vec<PersonRaceEntry>> {
        if self.queue.has_pending().await? {
            tracing::debug!("Writes still queued, reading person registrations from local cache");
            return self.cache.list_person_registrations().await;
        }

        match self.remote.fetch_person_registrations(credential).await {
            Ok(entries) => {
                if let Err(err) = self.cache.upsert_person_registrations(&entries).await {
                    Self::write_through_failed("person registrations", &err);
                }
                Ok(entries)
            }
            Err(err) => {
                Self::fallback("person registrations", &err);
                self.cache.list_person_registrations().await
            }
        }
    }

    /// Teams registered to a race, ordered by entry number
    pub async fn team_entries(
        &self,
        credential: &Credential,
        race_id: RaceId,
    ) -> EnrollmentResult<Vec<TeamEntry>> {
        if self.queue.has_pending().await? {
            tracing::debug!(race_id = %race_id, "Writes still queued, reading team entries from local cache");
            return self.cache.list_team_entries(race_id).await;
        }

        match self.remote.fetch_team_entries(credential, race_id).await {
            Ok(mut entries) => {
                if let Err(err) = self.cache.upsert_team_entries(race_id, &entries).await {
                    Self::write_through_failed("team entries", &err);
                }
                entries.sort_by_key(|entry| entry.registration.entry_number());
                Ok(entries)
            }
            Err(err) => {
                Self::fallback("team entries", &err);
                self.cache.list_team_entries(race_id).await
            }
        }
    }

    pub async fn team_entry(
        &self,
        credential: &Credential,
        team_id: TeamId,
        race_id: RaceId,
    ) -> EnrollmentResult<Option<TeamEntry>> {
        let entries = self.team_entries(credential, race_id).await?;
        Ok(entries.into_iter().find(|entry| entry.team.id() == team_id))
    }

    /// Highest number ever applied locally for the race
    pub async fn highest_entry_number(
        &self,
        race_id: RaceId,
    ) -> EnrollmentResult<Option<EntryNumber>> {
        self.cache.entry_number_high_water(race_id).await
    }

    pub async fn enroll(
        &self,
        credential: &Credential,
        enrollment: &Enrollment,
    ) -> EnrollmentResult<SyncStatus> {
        let action = PendingAction::CreateEnrollment {
            enrollment: enrollment.clone(),
        };
        if self.queue.has_pending().await? {
            return self.defer(&action).await;
        }

        let outcome = self.remote.create_enrollment(credential, enrollment).await;
        self.settle(outcome, action).await
    }

    pub async fn set_validation(
        &self,
        credential: &Credential,
        team_id: TeamId,
        race_id: RaceId,
        validated: bool,
    ) -> EnrollmentResult<SyncStatus> {
        let action = PendingAction::SetValidation {
            team_id,
            race_id,
            validated,
        };
        if self.queue.has_pending().await? {
            return self.defer(&action).await;
        }

        let outcome = self
            .remote
            .set_validation(credential, team_id, race_id, validated)
            .await;
        self.settle(outcome, action).await
    }

    pub async fn remove_member(
        &self,
        credential: &Credential,
        team_id: TeamId,
        person_id: PersonId,
        race_id: RaceId,
    ) -> EnrollmentResult<SyncStatus> {
        let action = PendingAction::RemoveMember {
            team_id,
            person_id,
            race_id,
        };
        if self.queue.has_pending().await? {
            return self.defer(&action).await;
        }

        let outcome = self
            .remote
            .remove_member(credential, team_id, person_id, race_id)
            .await;
        self.settle(outcome, action).await
    }

    pub async fn delete_team(
        &self,
        credential: &Credential,
        team_id: TeamId,
    ) -> EnrollmentResult<SyncStatus> {
        let action = PendingAction::DeleteTeam { team_id };
        if self.queue.has_pending().await? {
            return self.defer(&action).await;
        }

        let outcome = self.remote.delete_team(credential, team_id).await;
        self.settle(outcome, action).await
    }

    /// Mirrors an acknowledged write, or applies and queues it when the
    /// authority was unreachable; rejections are returned untouched
    async fn settle(
        &self,
        outcome: Result<(), RemoteError>,
        action: PendingAction,
    ) -> EnrollmentResult<SyncStatus> {
        match outcome {
            Ok(()) => {
                if let Err(err) = self.apply_locally(&action).await {
                    Self::write_through_failed(action.kind(), &err);
                }
                Ok(SyncStatus::Synced)
            }
            Err(RemoteError::Unavailable(message)) => {
                tracing::warn!(
                    kind = action.kind(),
                    error = %message,
                    "Remote unavailable, applying locally"
                );
                self.defer(&action).await
            }
            Err(err) => {
                tracing::info!(kind = action.kind(), error = %err, "Authority rejected write");
                Err(err.into())
            }
        }
    }

    /// Applies the write to the cache and queues it behind earlier ones
    async fn defer(&self, action: &PendingAction) -> EnrollmentResult<SyncStatus> {
        self.apply_locally(action).await?;
        self.queue.enqueue(action).await?;
        Ok(SyncStatus::Queued)
    }

    async fn apply_locally(&self, action: &PendingAction) -> EnrollmentResult<()> {
        match action {
            PendingAction::CreateEnrollment { enrollment } => {
                self.cache.apply_enrollment(enrollment).await
            }
            PendingAction::SetValidation {
                team_id,
                race_id,
                validated,
            } => {
                let found = self
                    .cache
                    .set_validation(*team_id, *race_id, *validated)
                    .await?;
                if !found {
                    tracing::debug!(team_id = %team_id, race_id = %race_id, "No cached registration to update");
                }
                Ok(())
            }
            PendingAction::RemoveMember {
                team_id,
                person_id,
                race_id,
            } => {
                self.cache
                    .remove_member(*team_id, *person_id, *race_id)
                    .await
            }
            PendingAction::DeleteTeam { team_id } => self.cache.delete_team(*team_id).await,
        }
    }
}
