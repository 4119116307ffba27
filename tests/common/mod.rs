//! Shared fixtures for integration tests
//!
//! `FakeRemote` is an in-memory authority that can be taken offline or
//! told to fail the next writes.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use raid_enrollment::auth::Credential;
use raid_enrollment::domain::person::{Gender, Person, PersonId};
use raid_enrollment::domain::race::{GenderConstraint, Race, RaceId, RaceWindow, RaidId};
use raid_enrollment::domain::registration::{
    Enrollment, PersonRaceEntry, PersonRaceRegistration, TeamEntry,
};
use raid_enrollment::domain::repositories::{RemoteAuthority, RemoteError};
use raid_enrollment::domain::team::{TeamId, ValidationState};
use raid_enrollment::infrastructure::cache::SqliteLocalCache;
use raid_enrollment::EnrollmentEngine;

/// Day every test evaluates ages on
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
}

pub fn credential() -> Credential {
    Credential::bearer("test-token")
}

/// Race on June 1st 2026 between the given hours (UTC)
pub fn race(name: &str, gender: GenderConstraint, start_hour: u32, end_hour: u32) -> Race {
    Race {
        id: RaceId::new(),
        raid_id: RaidId::new(),
        name: name.to_string(),
        window: RaceWindow::new(
            Utc.with_ymd_and_hms(2026, 6, 1, start_hour, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 6, 1, end_hour, 0, 0).unwrap(),
        )
        .unwrap(),
        gender,
    }
}

pub fn person(first: &str, last: &str, gender: Gender, birth_year: i32) -> Person {
    Person {
        id: PersonId::new(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        birth_date: NaiveDate::from_ymd_opt(birth_year, 3, 15).unwrap(),
        gender,
        club_id: None,
        license_number: None,
    }
}

#[derive(Default)]
struct State {
    offline: bool,
    races: HashMap<RaceId, Race>,
    people: Vec<Person>,
    registrations: Vec<PersonRaceEntry>,
    teams: Vec<TeamEntry>,
    scripted_read_errors: VecDeque<RemoteError>,
    scripted_write_errors: VecDeque<RemoteError>,
    writes: Vec<String>,
}

#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<State>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// The next write fails with `err` before touching any state
    pub fn fail_next_write(&self, err: RemoteError) {
        self.state().scripted_write_errors.push_back(err);
    }

    /// The next read fails with `err`
    pub fn fail_next_read(&self, err: RemoteError) {
        self.state().scripted_read_errors.push_back(err);
    }

    pub fn add_race(&self, race: &Race) {
        self.state().races.insert(race.id, race.clone());
    }

    pub fn remove_race(&self, race_id: RaceId) {
        self.state().races.remove(&race_id);
    }

    pub fn add_people(&self, people: &[Person]) {
        self.state().people.extend_from_slice(people);
    }

    pub fn register_person(&self, person: &Person, race: &Race) {
        self.state().registrations.push(PersonRaceEntry {
            registration: PersonRaceRegistration::new(person.id, race.id),
            race: race.clone(),
        });
    }

    /// Simulates another client's enrollment reaching the authority
    pub fn insert_team_entry(&self, entry: TeamEntry) {
        self.state().teams.push(entry);
    }

    pub fn team_entries(&self, race_id: RaceId) -> Vec<TeamEntry> {
        let mut entries: Vec<_> = self
            .state()
            .teams
            .iter()
            .filter(|entry| entry.registration.race_id() == race_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.registration.entry_number());
        entries
    }

    pub fn person_registrations(&self) -> Vec<PersonRaceEntry> {
        self.state().registrations.clone()
    }

    /// Successful writes, in the order the authority applied them
    pub fn writes(&self) -> Vec<String> {
        self.state().writes.clone()
    }

    fn check_read(&self) -> Result<(), RemoteError> {
        let mut state = self.state();
        if state.offline {
            return Err(RemoteError::Unavailable("connection refused".to_string()));
        }
        match state.scripted_read_errors.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn check_write(&self) -> Result<(), RemoteError> {
        let mut state = self.state();
        if state.offline {
            return Err(RemoteError::Unavailable("connection refused".to_string()));
        }
        match state.scripted_write_errors.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteAuthority for FakeRemote {
    async fn fetch_race(
        &self,
        _credential: &Credential,
        race_id: RaceId,
    ) -> Result<Option<Race>, RemoteError> {
        self.check_read()?;
        Ok(self.state().races.get(&race_id).cloned())
    }

    async fn fetch_people(&self, _credential: &Credential) -> Result<Vec<Person>, RemoteError> {
        self.check_read()?;
        Ok(self.state().people.clone())
    }

    async fn fetch_person_registrations(
        &self,
        _credential: &Credential,
    ) -> Result<Vec<PersonRaceEntry>, RemoteError> {
        self.check_read()?;
        Ok(self.state().registrations.clone())
    }

    async fn fetch_team_entries(
        &self,
        _credential: &Credential,
        race_id: RaceId,
    ) -> Result<Vec<TeamEntry>, RemoteError> {
        self.check_read()?;
        Ok(self.team_entries(race_id))
    }

    async fn create_enrollment(
        &self,
        _credential: &Credential,
        enrollment: &Enrollment,
    ) -> Result<(), RemoteError> {
        self.check_write()?;
        let mut state = self.state();

        let race = state
            .races
            .get(&enrollment.race_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(enrollment.race_id.to_string()))?;

        let team_id = enrollment.team.id();
        let taken = state.teams.iter().any(|entry| {
            entry.registration.race_id() == enrollment.race_id
                && entry.registration.entry_number() == enrollment.entry_number
                && entry.team.id() != team_id
        });
        if taken {
            return Err(RemoteError::Conflict(format!(
                "entry number {} already taken",
                enrollment.entry_number
            )));
        }

        state
            .teams
            .retain(|entry| !(entry.team.id() == team_id && entry.registration.race_id() == race.id));
        state.teams.push(enrollment.clone().into_entry());

        for registration in enrollment.person_registrations() {
            let known = state.registrations.iter().any(|entry| {
                entry.registration.person_id == registration.person_id
                    && entry.race.id == registration.race_id
            });
            if !known {
                state.registrations.push(PersonRaceEntry {
                    registration,
                    race: race.clone(),
                });
            }
        }

        state
            .writes
            .push(format!("create:{}", enrollment.team.name()));
        Ok(())
    }

    async fn set_validation(
        &self,
        _credential: &Credential,
        team_id: TeamId,
        race_id: RaceId,
        validated: bool,
    ) -> Result<(), RemoteError> {
        self.check_write()?;
        let mut state = self.state();

        let entry = state
            .teams
            .iter_mut()
            .find(|entry| entry.team.id() == team_id && entry.registration.race_id() == race_id)
            .ok_or_else(|| RemoteError::NotFound(team_id.to_string()))?;
        entry
            .registration
            .set_validation(ValidationState::from_flag(validated));
        let name = entry.team.name().to_string();

        state.writes.push(format!("validation:{}:{}", name, validated));
        Ok(())
    }

    async fn remove_member(
        &self,
        _credential: &Credential,
        team_id: TeamId,
        person_id: PersonId,
        race_id: RaceId,
    ) -> Result<(), RemoteError> {
        self.check_write()?;
        let mut state = self.state();

        let entry = state
            .teams
            .iter_mut()
            .find(|entry| entry.team.id() == team_id && entry.registration.race_id() == race_id)
            .ok_or_else(|| RemoteError::NotFound(team_id.to_string()))?;
        entry.member_ids.retain(|id| *id != person_id);
        let name = entry.team.name().to_string();

        state.registrations.retain(|entry| {
            !(entry.registration.person_id == person_id && entry.race.id == race_id)
        });
        state.writes.push(format!("remove_member:{}", name));
        Ok(())
    }

    async fn delete_team(
        &self,
        _credential: &Credential,
        team_id: TeamId,
    ) -> Result<(), RemoteError> {
        self.check_write()?;
        let mut state = self.state();

        let removed: Vec<TeamEntry> = state
            .teams
            .iter()
            .filter(|entry| entry.team.id() == team_id)
            .cloned()
            .collect();
        if removed.is_empty() {
            return Err(RemoteError::NotFound(team_id.to_string()));
        }

        state.teams.retain(|entry| entry.team.id() != team_id);
        for entry in &removed {
            let race_id = entry.registration.race_id();
            state.registrations.retain(|reg| {
                !(reg.race.id == race_id && entry.member_ids.contains(&reg.registration.person_id))
            });
        }
        state
            .writes
            .push(format!("delete:{}", removed[0].team.name()));
        Ok(())
    }
}

/// Engine over a fresh in-memory cache and the given fake authority
pub async fn engine(remote: Arc<FakeRemote>) -> (EnrollmentEngine, Arc<SqliteLocalCache>) {
    let cache = Arc::new(SqliteLocalCache::in_memory().await.unwrap());
    let engine = EnrollmentEngine::new(remote, cache.clone()).with_fixed_date(today());
    (engine, cache)
}
