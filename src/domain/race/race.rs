use super::value_objects::{GenderConstraint, RaceId, RaceWindow, RaidId};

/// A race within a raid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Race {
    pub id: RaceId,
    pub raid_id: RaidId,
    pub name: String,
    pub window: RaceWindow,
    pub gender: GenderConstraint,
}
