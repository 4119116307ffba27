use chrono::NaiveTime;

use crate::domain::person::PersonId;
use crate::domain::race::RaceId;
use crate::domain::team::{EntryNumber, Team, TeamEvent, TeamId, ValidationState};

/// A team's registration to one race
///
/// # Invariants
/// - At most one per (team, race)
/// - Entry number is assigned once and unique within the race
/// - Validation changes never touch the entry number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRaceRegistration {
    team_id: TeamId,
    race_id: RaceId,
    entry_number: EntryNumber,
    validation: ValidationState,
    finish_time: Option<NaiveTime>,
}

impl TeamRaceRegistration {
    /// Fresh, unvalidated registration
    pub fn new(team_id: TeamId, race_id: RaceId, entry_number: EntryNumber) -> Self {
        Self {
            team_id,
            race_id,
            entry_number,
            validation: ValidationState::Unvalidated,
            finish_time: None,
        }
    }

    pub fn from_persistence(
        team_id: TeamId,
        race_id: RaceId,
        entry_number: EntryNumber,
        validation: ValidationState,
        finish_time: Option<NaiveTime>,
    ) -> Self {
        Self {
            team_id,
            race_id,
            entry_number,
            validation,
            finish_time,
        }
    }

    pub fn team_id(&self) -> TeamId {
        self.team_id
    }

    pub fn race_id(&self) -> RaceId {
        self.race_id
    }

    pub fn entry_number(&self) -> EntryNumber {
        self.entry_number
    }

    pub fn validation(&self) -> ValidationState {
        self.validation
    }

    pub fn finish_time(&self) -> Option<NaiveTime> {
        self.finish_time
    }

    /// Moves to `next`, returning the event only when the state changed
    pub fn set_validation(&mut self, next: ValidationState) -> Option<TeamEvent> {
        if !self.validation.changes_to(next) {
            return None;
        }

        self.validation = next;
        let (team_id, race_id) = (self.team_id, self.race_id);
        Some(match next {
            ValidationState::Validated => TeamEvent::Validated { team_id, race_id },
            ValidationState::Unvalidated => TeamEvent::Invalidated { team_id, race_id },
        })
    }
}

/// A team, its members, and its registration to one race
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamEntry {
    pub team: Team,
    pub member_ids: Vec<PersonId>,
    pub registration: TeamRaceRegistration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> TeamRaceRegistration {
        TeamRaceRegistration::new(TeamId::new(), RaceId::new(), EntryNumber::FIRST)
    }

    #[test]
    fn new_registration_is_unvalidated_without_time() {
        let reg = registration();

        assert_eq!(reg.validation(), ValidationState::Unvalidated);
        assert!(reg.finish_time().is_none());
    }

    #[test]
    fn validate_emits_event_once() {
        let mut reg = registration();

        let first = reg.set_validation(ValidationState::Validated);
        let second = reg.set_validation(ValidationState::Validated);

        assert!(matches!(first, Some(TeamEvent::Validated { .. })));
        assert!(second.is_none());
        assert_eq!(reg.validation(), ValidationState::Validated);
    }

    #[test]
    fn invalidate_unvalidated_is_a_no_op() {
        let mut reg = registration();
        let before = reg.clone();

        assert!(reg.set_validation(ValidationState::Unvalidated).is_none());
        assert!(reg.set_validation(ValidationState::Unvalidated).is_none());
        assert_eq!(reg, before);
    }

    #[test]
    fn toggle_back_and_forth_keeps_entry_number() {
        let mut reg = registration();
        let number = reg.entry_number();

        reg.set_validation(ValidationState::Validated);
        let event = reg.set_validation(ValidationState::Unvalidated);

        assert!(matches!(event, Some(TeamEvent::Invalidated { .. })));
        assert_eq!(reg.entry_number(), number);
    }
}
