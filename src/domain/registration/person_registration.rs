use crate::domain::person::PersonId;
use crate::domain::race::{Race, RaceId};

/// A person's registration to a race, independent of team
///
/// # Invariants
/// - At most one per (person, race)
/// - A person never holds two registrations whose race windows overlap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRaceRegistration {
    pub person_id: PersonId,
    pub race_id: RaceId,
    pub chip_id: Option<String>,
    pub medical_form_valid: Option<bool>,
}

impl PersonRaceRegistration {
    /// Registration with chip and medical form left unset
    pub fn new(person_id: PersonId, race_id: RaceId) -> Self {
        Self {
            person_id,
            race_id,
            chip_id: None,
            medical_form_valid: None,
        }
    }
}

/// A person registration together with the race it points at
///
/// The race window is what the overlap rule needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRaceEntry {
    pub registration: PersonRaceRegistration,
    pub race: Race,
}

impl PersonRaceEntry {
    pub fn person_id(&self) -> PersonId {
        self.registration.person_id
    }
}
