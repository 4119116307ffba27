//! Eligibility filter: which people may join a team for a given race.
//!
//! The same algorithm runs whether the inputs came from the remote authority
//! or from the local cache.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::person::{Person, PersonId, MINIMUM_AGE};
use crate::domain::race::Race;
use crate::domain::registration::PersonRaceEntry;
use crate::domain::EligibilityRule;

/// Person registrations indexed by person
#[derive(Debug, Default)]
pub struct RegistrationIndex<'a> {
    by_person: HashMap<PersonId, Vec<&'a PersonRaceEntry>>,
}

impl<'a> RegistrationIndex<'a> {
    pub fn new(entries: &'a [PersonRaceEntry]) -> Self {
        let mut by_person: HashMap<PersonId, Vec<&'a PersonRaceEntry>> = HashMap::new();
        for entry in entries {
            by_person.entry(entry.person_id()).or_default().push(entry);
        }

        Self { by_person }
    }

    fn for_person(&self, person_id: PersonId) -> &[&'a PersonRaceEntry] {
        self.by_person
            .get(&person_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First rule `person` fails for `race`, checked in this order:
    /// age, existing registration, gender, overlapping race
    pub fn check(&self, person: &Person, race: &Race, today: NaiveDate) -> Result<(), EligibilityRule> {
        let age = person.age_on(today);
        if age < MINIMUM_AGE {
            return Err(EligibilityRule::TooYoung { age });
        }

        let registrations = self.for_person(person.id);
        if registrations.iter().any(|e| e.race.id == race.id) {
            return Err(EligibilityRule::AlreadyRegistered);
        }

        if !race.gender.admits(person.gender) {
            return Err(EligibilityRule::GenderMismatch);
        }

        if let Some(conflict) = registrations
            .iter()
            .find(|e| e.race.id != race.id && e.race.window.overlaps(&race.window))
        {
            return Err(EligibilityRule::OverlappingRace {
                race_id: conflict.race.id,
            });
        }

        Ok(())
    }
}

/// First rule `person` fails for `race` given their registrations
pub fn check_eligibility(
    person: &Person,
    race: &Race,
    registrations: &[PersonRaceEntry],
    today: NaiveDate,
) -> Result<(), EligibilityRule> {
    RegistrationIndex::new(registrations).check(person, race, today)
}

/// People allowed to join a team for `race`, ordered by last name, then
/// first name
///
/// Names compare ordinally; the id breaks remaining ties so the order is
/// fully deterministic.
pub fn eligible_users(
    race: &Race,
    people: Vec<Person>,
    registrations: &[PersonRaceEntry],
    today: NaiveDate,
) -> Vec<Person> {
    let index = RegistrationIndex::new(registrations);

    let mut eligible: Vec<Person> = people
        .into_iter()
        .filter(|person| index.check(person, race, today).is_ok())
        .collect();

    eligible.sort_by(|a, b| {
        a.last_name
            .cmp(&b.last_name)
            .then_with(|| a.first_name.cmp(&b.first_name))
            .then_with(|| a.id.cmp(&b.id))
    });

    eligible
}
