use async_trait::async_trait;

use crate::domain::errors::EnrollmentResult;
use crate::domain::pending_action::{PendingAction, QueuedAction};
use crate::domain::person::{Person, PersonId};
use crate::domain::race::{Race, RaceId};
use crate::domain::registration::{Enrollment, PersonRaceEntry, TeamEntry};
use crate::domain::team::{EntryNumber, TeamId};

/// On-device mirror of the remote authority
///
/// Only the dual-source repository and its pending-action queue write to it.
/// Every upsert replaces an existing row with the same key.
#[async_trait]
pub trait LocalCache: Send + Sync {
    async fn upsert_race(&self, race: &Race) -> EnrollmentResult<()>;

    async fn find_race(&self, race_id: RaceId) -> EnrollmentResult<Option<Race>>;

    async fn upsert_people(&self, people: &[Person]) -> EnrollmentResult<()>;

    async fn list_people(&self) -> EnrollmentResult<Vec<Person>>;

    /// Stores registrations and the races they reference
    async fn upsert_person_registrations(&self, entries: &[PersonRaceEntry])
        -> EnrollmentResult<()>;

    async fn list_person_registrations(&self) -> EnrollmentResult<Vec<PersonRaceEntry>>;

    /// Stores authoritative team entries for a race
    ///
    /// A cached row of another team holding the same entry number is
    /// displaced.
    async fn upsert_team_entries(&self, race_id: RaceId, entries: &[TeamEntry])
        -> EnrollmentResult<()>;

    /// Team entries of a race ordered by entry number
    async fn list_team_entries(&self, race_id: RaceId) -> EnrollmentResult<Vec<TeamEntry>>;

    /// Highest entry number ever applied for a race, including removed ones
    async fn entry_number_high_water(&self, race_id: RaceId)
        -> EnrollmentResult<Option<EntryNumber>>;

    /// Applies team, memberships, team registration and member
    /// registrations in one transaction
    ///
    /// Idempotent for the same team. Returns `Conflict` when another team
    /// holds the entry number.
    async fn apply_enrollment(&self, enrollment: &Enrollment) -> EnrollmentResult<()>;

    /// Returns false when no such registration is cached
    async fn set_validation(
        &self,
        team_id: TeamId,
        race_id: RaceId,
        validated: bool,
    ) -> EnrollmentResult<bool>;

    /// Drops the membership and the member's registration for the race
    async fn remove_member(
        &self,
        team_id: TeamId,
        person_id: PersonId,
        race_id: RaceId,
    ) -> EnrollmentResult<()>;

    /// Drops the team, its registrations, and its members' registrations to
    /// those races
    async fn delete_team(&self, team_id: TeamId) -> EnrollmentResult<()>;

    /// Appends to the pending-action queue, returning the queue id
    async fn enqueue_action(&self, action: &PendingAction) -> EnrollmentResult<i64>;

    /// Queued actions in insertion order, parked ones excluded
    async fn pending_actions(&self) -> EnrollmentResult<Vec<QueuedAction>>;

    /// Counts one refusal of a queued action and stores the reason,
    /// returning the new attempt count
    async fn record_rejection(&self, id: i64, reason: &str) -> EnrollmentResult<u32>;

    /// Takes an action out of replay without deleting it
    async fn park_action(&self, id: i64) -> EnrollmentResult<()>;

    /// Actions taken out of replay, in insertion order
    async fn parked_actions(&self) -> EnrollmentResult<Vec<QueuedAction>>;

    /// Rewrites the payload of a queued action in place
    async fn replace_action(&self, id: i64, action: &PendingAction) -> EnrollmentResult<()>;

    async fn delete_action(&self, id: i64) -> EnrollmentResult<()>;
}
