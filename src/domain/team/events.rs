use super::value_objects::{EntryNumber, TeamId};
use crate::domain::person::PersonId;
use crate::domain::race::RaceId;

/// Domain events emitted when a team's race registration changes
///
/// The engine logs them; callers may forward them elsewhere.
///
/// # Example
/// ```
/// use raid_enrollment::domain::race::RaceId;
/// use raid_enrollment::domain::team::events::TeamEvent;
/// use raid_enrollment::domain::team::TeamId;
///
/// let event = TeamEvent::Validated {
///     team_id: TeamId::new(),
///     race_id: RaceId::new(),
/// };
/// assert_eq!(event.kind(), "validated");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamEvent {
    /// Team created and registered to a race
    Enrolled {
        team_id: TeamId,
        race_id: RaceId,
        entry_number: EntryNumber,
    },
    /// Manager approved the team for a race
    Validated { team_id: TeamId, race_id: RaceId },
    /// Manager withdrew approval
    Invalidated { team_id: TeamId, race_id: RaceId },
    /// Member removed from the team and from the race
    MemberRemoved {
        team_id: TeamId,
        person_id: PersonId,
        race_id: RaceId,
    },
    /// Team and all of its registrations removed
    Deleted { team_id: TeamId },
}

impl TeamEvent {
    pub fn team_id(&self) -> TeamId {
        match self {
            TeamEvent::Enrolled { team_id, .. } => *team_id,
            TeamEvent::Validated { team_id, .. } => *team_id,
            TeamEvent::Invalidated { team_id, .. } => *team_id,
            TeamEvent::MemberRemoved { team_id, .. } => *team_id,
            TeamEvent::Deleted { team_id } => *team_id,
        }
    }

    /// Short name used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            TeamEvent::Enrolled { .. } => "enrolled",
            TeamEvent::Validated { .. } => "validated",
            TeamEvent::Invalidated { .. } => "invalidated",
            TeamEvent::MemberRemoved { .. } => "member_removed",
            TeamEvent::Deleted { .. } => "deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_event_reports_its_team() {
        let team_id = TeamId::new();
        let race_id = RaceId::new();

        let events = [
            TeamEvent::Enrolled {
                team_id,
                race_id,
                entry_number: EntryNumber::FIRST,
            },
            TeamEvent::Validated { team_id, race_id },
            TeamEvent::Invalidated { team_id, race_id },
            TeamEvent::MemberRemoved {
                team_id,
                person_id: PersonId::new(),
                race_id,
            },
            TeamEvent::Deleted { team_id },
        ];

        for event in &events {
            assert_eq!(event.team_id(), team_id);
        }
    }

    #[test]
    fn event_kinds() {
        let team_id = TeamId::new();
        assert_eq!(TeamEvent::Deleted { team_id }.kind(), "deleted");
        assert_eq!(
            TeamEvent::Invalidated {
                team_id,
                race_id: RaceId::new()
            }
            .kind(),
            "invalidated"
        );
    }
}
