use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::person::PersonId;
use super::race::RaceId;
use super::registration::Enrollment;
use super::team::TeamId;

/// A mutation that failed against the remote authority and awaits replay
///
/// Stored as tagged JSON in the local cache, so replay is a plain `match`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingAction {
    CreateEnrollment {
        enrollment: Enrollment,
    },
    SetValidation {
        team_id: TeamId,
        race_id: RaceId,
        validated: bool,
    },
    RemoveMember {
        team_id: TeamId,
        person_id: PersonId,
        race_id: RaceId,
    },
    DeleteTeam {
        team_id: TeamId,
    },
}

impl PendingAction {
    /// Stable name of the variant, stored next to the payload
    pub fn kind(&self) -> &'static str {
        match self {
            PendingAction::CreateEnrollment { .. } => "create_enrollment",
            PendingAction::SetValidation { .. } => "set_validation",
            PendingAction::RemoveMember { .. } => "remove_member",
            PendingAction::DeleteTeam { .. } => "delete_team",
        }
    }
}

/// A pending action as stored in the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedAction {
    /// Insertion-ordered queue id
    pub id: i64,
    pub action: PendingAction,
    pub queued_at: DateTime<Utc>,
    /// Replay passes in which the authority refused the action
    pub attempts: u32,
}
