use serde::{Deserialize, Serialize};

use super::person_registration::PersonRaceRegistration;
use super::team_registration::{TeamEntry, TeamRaceRegistration};
use crate::domain::person::PersonId;
use crate::domain::race::RaceId;
use crate::domain::team::{EntryNumber, Team};

/// Everything one enrollment writes: team, memberships, team registration,
/// and the members' race registrations
///
/// Sent as a single request to the remote authority and stored verbatim in
/// the pending-action queue when that request fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub team: Team,
    pub member_ids: Vec<PersonId>,
    pub race_id: RaceId,
    pub entry_number: EntryNumber,
}

impl Enrollment {
    /// The unvalidated team registration this enrollment creates
    pub fn team_registration(&self) -> TeamRaceRegistration {
        TeamRaceRegistration::new(self.team.id(), self.race_id, self.entry_number)
    }

    /// One blank registration per member
    pub fn person_registrations(&self) -> Vec<PersonRaceRegistration> {
        self.member_ids
            .iter()
            .map(|person_id| PersonRaceRegistration::new(*person_id, self.race_id))
            .collect()
    }

    /// Same enrollment under a different entry number
    pub fn renumbered(&self, entry_number: EntryNumber) -> Self {
        Self {
            entry_number,
            ..self.clone()
        }
    }

    pub fn into_entry(self) -> TeamEntry {
        let registration = self.team_registration();
        TeamEntry {
            team: self.team,
            member_ids: self.member_ids,
            registration,
        }
    }
}
