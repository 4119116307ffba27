//! Enrollment engine: eligibility, entry numbers, team enrollment and
//! validation on top of the dual-source repository.

pub mod dossard;
pub mod eligibility;
pub mod enrollment;
pub mod validation;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::auth::Credential;
use crate::domain::errors::{EnrollmentError, EnrollmentResult};
use crate::domain::person::Person;
use crate::domain::race::{Race, RaceId};
use crate::domain::repositories::{LocalCache, RemoteAuthority};
use crate::domain::team::EntryNumber;
use crate::infrastructure::repositories::DualSourceRepository;

pub use crate::infrastructure::repositories::{ReplayReport, SyncStatus};
pub use dossard::DossardAllocator;
pub use enrollment::{EnrollmentReceipt, NewTeam};

/// Entry point for every enrollment operation
///
/// Cheap to share behind an `Arc`; every operation takes the caller's
/// credential explicitly.
pub struct EnrollmentEngine {
    repository: DualSourceRepository,
    allocator: Arc<DossardAllocator>,
    fixed_today: Option<NaiveDate>,
}

impl EnrollmentEngine {
    pub fn new(remote: Arc<dyn RemoteAuthority>, cache: Arc<dyn LocalCache>) -> Self {
        let allocator = Arc::new(DossardAllocator::new());
        Self {
            repository: DualSourceRepository::new(remote, cache, Arc::clone(&allocator)),
            allocator,
            fixed_today: None,
        }
    }

    /// Evaluates ages against `today` instead of the system clock
    pub fn with_fixed_date(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn repository(&self) -> &DualSourceRepository {
        &self.repository
    }

    fn today(&self) -> NaiveDate {
        self.fixed_today.unwrap_or_else(|| Utc::now().date_naive())
    }

    async fn require_race(&self, credential: &Credential, race_id: RaceId) -> EnrollmentResult<Race> {
        self.repository
            .race(credential, race_id)
            .await?
            .ok_or_else(|| EnrollmentError::not_found("Race", race_id))
    }

    /// Sends queued writes before an operation reads team state or writes
    async fn catch_up(&self, credential: &Credential) -> EnrollmentResult<()> {
        if !self.repository.catch_up(credential).await? {
            tracing::debug!("Queued writes remain, working from local cache");
        }
        Ok(())
    }

    /// People who may join a team for the race
    pub async fn eligible_users(
        &self,
        credential: &Credential,
        race_id: RaceId,
    ) -> EnrollmentResult<Vec<Person>> {
        self.catch_up(credential).await?;
        let race = self.require_race(credential, race_id).await?;
        let people = self.repository.people(credential).await?;
        let registrations = self.repository.person_registrations(credential).await?;

        let eligible = eligibility::eligible_users(&race, people, &registrations, self.today());
        tracing::debug!(race_id = %race_id, count = eligible.len(), "Computed eligible users");

        Ok(eligible)
    }

    /// Number the next enrollment to the race would receive
    pub async fn next_entry_number(
        &self,
        credential: &Credential,
        race_id: RaceId,
    ) -> EnrollmentResult<EntryNumber> {
        self.catch_up(credential).await?;
        let entries = self.repository.team_entries(credential, race_id).await?;
        let high_water = self.repository.highest_entry_number(race_id).await?;

        Ok(DossardAllocator::next_number(
            entries.iter().map(|entry| entry.registration.entry_number()),
            high_water,
        ))
    }

    /// Sends queued writes to the authority, oldest first
    pub async fn replay_all(&self, credential: &Credential) -> EnrollmentResult<ReplayReport> {
        self.repository.queue().replay_all(credential).await
    }
}
