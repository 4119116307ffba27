//! Row adapters between the cache's UPPER_SNAKE columns and domain types.
//!
//! One row type per table (or join), each with conversions in both
//! directions. Nullable columns map to `Option` fields.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::errors::{EnrollmentError, EnrollmentResult};
use crate::domain::pending_action::{PendingAction, QueuedAction};
use crate::domain::person::{Gender, Person};
use crate::domain::race::{GenderConstraint, Race, RaceWindow};
use crate::domain::registration::{PersonRaceEntry, PersonRaceRegistration, TeamRaceRegistration};
use crate::domain::team::{EntryNumber, Team, ValidationState};

fn corrupt(column: &str, value: impl std::fmt::Display) -> EnrollmentError {
    EnrollmentError::Storage(format!("unexpected {} value in cache: {}", column, value))
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PersonRow {
    #[sqlx(rename = "PERSON_ID")]
    pub person_id: Uuid,
    #[sqlx(rename = "PERSON_FIRST_NAME")]
    pub first_name: String,
    #[sqlx(rename = "PERSON_LAST_NAME")]
    pub last_name: String,
    #[sqlx(rename = "PERSON_BIRTH_DATE")]
    pub birth_date: NaiveDate,
    #[sqlx(rename = "PERSON_GENDER")]
    pub gender: String,
    #[sqlx(rename = "CLUB_ID")]
    pub club_id: Option<Uuid>,
    #[sqlx(rename = "PERSON_LICENSE_NUMBER")]
    pub license_number: Option<String>,
}

impl From<&Person> for PersonRow {
    fn from(person: &Person) -> Self {
        Self {
            person_id: person.id.as_uuid(),
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            birth_date: person.birth_date,
            gender: person.gender.as_str().to_string(),
            club_id: person.club_id.map(|id| id.as_uuid()),
            license_number: person.license_number.clone(),
        }
    }
}

impl TryFrom<PersonRow> for Person {
    type Error = EnrollmentError;

    fn try_from(row: PersonRow) -> EnrollmentResult<Self> {
        let gender = Gender::parse(&row.gender).ok_or_else(|| corrupt("PERSON_GENDER", &row.gender))?;

        Ok(Person {
            id: row.person_id.into(),
            first_name: row.first_name,
            last_name: row.last_name,
            birth_date: row.birth_date,
            gender,
            club_id: row.club_id.map(Into::into),
            license_number: row.license_number,
        })
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct RaceRow {
    #[sqlx(rename = "RACE_ID")]
    pub race_id: Uuid,
    #[sqlx(rename = "RAID_ID")]
    pub raid_id: Uuid,
    #[sqlx(rename = "RACE_NAME")]
    pub name: String,
    #[sqlx(rename = "RACE_START_TIME")]
    pub start_time: DateTime<Utc>,
    #[sqlx(rename = "RACE_END_TIME")]
    pub end_time: DateTime<Utc>,
    #[sqlx(rename = "RACE_GENDER")]
    pub gender: String,
}

impl From<&Race> for RaceRow {
    fn from(race: &Race) -> Self {
        Self {
            race_id: race.id.as_uuid(),
            raid_id: race.raid_id.as_uuid(),
            name: race.name.clone(),
            start_time: race.window.start(),
            end_time: race.window.end(),
            gender: race.gender.as_str().to_string(),
        }
    }
}

impl TryFrom<RaceRow> for Race {
    type Error = EnrollmentError;

    fn try_from(row: RaceRow) -> EnrollmentResult<Self> {
        let gender = GenderConstraint::parse(&row.gender)
            .ok_or_else(|| corrupt("RACE_GENDER", &row.gender))?;

        Ok(Race {
            id: row.race_id.into(),
            raid_id: row.raid_id.into(),
            name: row.name,
            window: RaceWindow::new(row.start_time, row.end_time)?,
            gender,
        })
    }
}

/// `PERSON_RACE` joined with its `RACE`
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PersonRaceRow {
    #[sqlx(rename = "PERSON_ID")]
    pub person_id: Uuid,
    #[sqlx(rename = "PERSON_RACE_CHIP")]
    pub chip: Option<String>,
    #[sqlx(rename = "PERSON_RACE_MEDICAL_FORM")]
    pub medical_form: Option<bool>,
    #[sqlx(flatten)]
    pub race: RaceRow,
}

impl From<&PersonRaceEntry> for PersonRaceRow {
    fn from(entry: &PersonRaceEntry) -> Self {
        Self {
            person_id: entry.registration.person_id.as_uuid(),
            chip: entry.registration.chip_id.clone(),
            medical_form: entry.registration.medical_form_valid,
            race: RaceRow::from(&entry.race),
        }
    }
}

impl TryFrom<PersonRaceRow> for PersonRaceEntry {
    type Error = EnrollmentError;

    fn try_from(row: PersonRaceRow) -> EnrollmentResult<Self> {
        let race = Race::try_from(row.race)?;

        Ok(PersonRaceEntry {
            registration: PersonRaceRegistration {
                person_id: row.person_id.into(),
                race_id: race.id,
                chip_id: row.chip,
                medical_form_valid: row.medical_form,
            },
            race,
        })
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TeamRow {
    #[sqlx(rename = "TEAM_ID")]
    pub team_id: Uuid,
    #[sqlx(rename = "TEAM_NAME")]
    pub name: String,
    #[sqlx(rename = "TEAM_IMAGE")]
    pub image: Option<String>,
    #[sqlx(rename = "MANAGER_ID")]
    pub manager_id: Uuid,
    #[sqlx(rename = "TEAM_CREATED_AT")]
    pub created_at: DateTime<Utc>,
}

impl From<&Team> for TeamRow {
    fn from(team: &Team) -> Self {
        Self {
            team_id: team.id().as_uuid(),
            name: team.name().to_string(),
            image: team.image().map(str::to_string),
            manager_id: team.manager_id().as_uuid(),
            created_at: team.created_at(),
        }
    }
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Team::from_persistence(
            row.team_id.into(),
            row.name,
            row.image,
            row.manager_id.into(),
            row.created_at,
        )
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TeamRaceRow {
    #[sqlx(rename = "TEAM_ID")]
    pub team_id: Uuid,
    #[sqlx(rename = "RACE_ID")]
    pub race_id: Uuid,
    #[sqlx(rename = "TEAM_RACE_NUMBER")]
    pub number: i64,
    #[sqlx(rename = "TEAM_RACE_VALIDATED")]
    pub validated: bool,
    #[sqlx(rename = "TEAM_RACE_TIME")]
    pub finish_time: Option<NaiveTime>,
}

impl From<&TeamRaceRegistration> for TeamRaceRow {
    fn from(registration: &TeamRaceRegistration) -> Self {
        Self {
            team_id: registration.team_id().as_uuid(),
            race_id: registration.race_id().as_uuid(),
            number: i64::from(registration.entry_number().value()),
            validated: registration.validation().is_validated(),
            finish_time: registration.finish_time(),
        }
    }
}

impl TryFrom<TeamRaceRow> for TeamRaceRegistration {
    type Error = EnrollmentError;

    fn try_from(row: TeamRaceRow) -> EnrollmentResult<Self> {
        Ok(TeamRaceRegistration::from_persistence(
            row.team_id.into(),
            row.race_id.into(),
            entry_number(row.number)?,
            ValidationState::from_flag(row.validated),
            row.finish_time,
        ))
    }
}

/// `TEAM_RACE` joined with its `TEAM`; members are loaded separately
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TeamEntryRow {
    #[sqlx(flatten)]
    pub team: TeamRow,
    #[sqlx(flatten)]
    pub registration: TeamRaceRow,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MemberRow {
    #[sqlx(rename = "TEAM_ID")]
    pub team_id: Uuid,
    #[sqlx(rename = "PERSON_ID")]
    pub person_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PendingActionRow {
    #[sqlx(rename = "ACTION_ID")]
    pub id: i64,
    #[sqlx(rename = "ACTION_KIND")]
    pub kind: String,
    #[sqlx(rename = "ACTION_PAYLOAD")]
    pub payload: String,
    #[sqlx(rename = "ACTION_QUEUED_AT")]
    pub queued_at: DateTime<Utc>,
    #[sqlx(rename = "ACTION_ATTEMPTS")]
    pub attempts: i64,
}

impl TryFrom<PendingActionRow> for QueuedAction {
    type Error = EnrollmentError;

    fn try_from(row: PendingActionRow) -> EnrollmentResult<Self> {
        let action: PendingAction = serde_json::from_str(&row.payload)?;
        if action.kind() != row.kind {
            return Err(corrupt("ACTION_KIND", &row.kind));
        }

        let attempts =
            u32::try_from(row.attempts).map_err(|_| corrupt("ACTION_ATTEMPTS", row.attempts))?;

        Ok(QueuedAction {
            id: row.id,
            action,
            queued_at: row.queued_at,
            attempts,
        })
    }
}

/// Converts a stored `TEAM_RACE_NUMBER` / `LAST_NUMBER`
pub fn entry_number(value: i64) -> EnrollmentResult<EntryNumber> {
    let value = u32::try_from(value).map_err(|_| corrupt("TEAM_RACE_NUMBER", value))?;
    EntryNumber::new(value).map_err(|_| corrupt("TEAM_RACE_NUMBER", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::person::{ClubId, PersonId};
    use crate::domain::race::{RaceId, RaidId};
    use crate::domain::team::TeamId;
    use chrono::TimeZone;

    fn race() -> Race {
        Race {
            id: RaceId::new(),
            raid_id: RaidId::new(),
            name: "VTT".to_string(),
            window: RaceWindow::new(
                Utc.with_ymd_and_hms(2026, 7, 4, 8, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 7, 4, 11, 30, 0).unwrap(),
            )
            .unwrap(),
            gender: GenderConstraint::Male,
        }
    }

    #[test]
    fn person_row_round_trip() {
        let person = Person {
            id: PersonId::new(),
            first_name: "Jules".to_string(),
            last_name: "Fabre".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1988, 11, 30).unwrap(),
            gender: Gender::Male,
            club_id: Some(ClubId::new()),
            license_number: None,
        };

        let row = PersonRow::from(&person);
        assert_eq!(row.gender, "male");
        assert_eq!(Person::try_from(row).unwrap(), person);
    }

    #[test]
    fn unknown_gender_is_a_storage_error() {
        let mut row = PersonRow::from(&Person {
            id: PersonId::new(),
            first_name: "X".to_string(),
            last_name: "Y".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            gender: Gender::Female,
            club_id: None,
            license_number: None,
        });
        row.gender = "F".to_string();

        assert!(matches!(Person::try_from(row), Err(EnrollmentError::Storage(_))));
    }

    #[test]
    fn race_row_round_trip() {
        let race = race();
        assert_eq!(Race::try_from(RaceRow::from(&race)).unwrap(), race);
    }

    #[test]
    fn person_race_row_round_trip() {
        let race = race();
        let entry = PersonRaceEntry {
            registration: PersonRaceRegistration {
                person_id: PersonId::new(),
                race_id: race.id,
                chip_id: None,
                medical_form_valid: Some(false),
            },
            race,
        };

        assert_eq!(PersonRaceEntry::try_from(PersonRaceRow::from(&entry)).unwrap(), entry);
    }

    #[test]
    fn team_race_row_round_trip() {
        let registration = TeamRaceRegistration::from_persistence(
            TeamId::new(),
            RaceId::new(),
            EntryNumber::new(42).unwrap(),
            ValidationState::Validated,
            NaiveTime::from_hms_opt(3, 12, 45),
        );

        let row = TeamRaceRow::from(&registration);
        assert_eq!(row.number, 42);
        assert!(row.validated);
        assert_eq!(TeamRaceRegistration::try_from(row).unwrap(), registration);
    }

    #[test]
    fn team_row_round_trip() {
        let team = Team::new("Marmottes", PersonId::new(), None).unwrap();
        assert_eq!(Team::from(TeamRow::from(&team)), team);
    }

    #[test]
    fn stored_entry_number_must_be_positive() {
        assert!(entry_number(0).is_err());
        assert!(entry_number(-3).is_err());
        assert_eq!(entry_number(7).unwrap().value(), 7);
    }

    #[test]
    fn pending_row_kind_must_match_payload() {
        let action = PendingAction::DeleteTeam {
            team_id: TeamId::new(),
        };
        let row = PendingActionRow {
            id: 1,
            kind: "set_validation".to_string(),
            payload: serde_json::to_string(&action).unwrap(),
            queued_at: Utc::now(),
            attempts: 0,
        };

        assert!(QueuedAction::try_from(row).is_err());
    }
}
