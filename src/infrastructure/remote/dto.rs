//! Wire representation used by the remote authority.
//!
//! The authority speaks snake_case JSON with nested `team`, `race`, `club`
//! and `members` objects. Each entity has exactly one DTO here with
//! conversions to and from the domain type; optional fields default to
//! `None` when absent and unknown fields are ignored.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{EnrollmentError, EnrollmentResult};
use crate::domain::person::{Gender, Person};
use crate::domain::race::{GenderConstraint, Race, RaceWindow};
use crate::domain::registration::{
    Enrollment, PersonRaceEntry, PersonRaceRegistration, TeamEntry, TeamRaceRegistration,
};
use crate::domain::team::{EntryNumber, Team, ValidationState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceDto {
    pub race_id: Uuid,
    pub raid_id: Uuid,
    pub race_name: String,
    pub race_start_time: DateTime<Utc>,
    pub race_end_time: DateTime<Utc>,
    pub race_gender: GenderConstraint,
}

impl From<&Race> for RaceDto {
    fn from(race: &Race) -> Self {
        Self {
            race_id: race.id.as_uuid(),
            raid_id: race.raid_id.as_uuid(),
            race_name: race.name.clone(),
            race_start_time: race.window.start(),
            race_end_time: race.window.end(),
            race_gender: race.gender,
        }
    }
}

impl TryFrom<RaceDto> for Race {
    type Error = EnrollmentError;

    fn try_from(dto: RaceDto) -> EnrollmentResult<Self> {
        Ok(Race {
            id: dto.race_id.into(),
            raid_id: dto.raid_id.into(),
            name: dto.race_name,
            window: RaceWindow::new(dto.race_start_time, dto.race_end_time)?,
            gender: dto.race_gender,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubDto {
    pub club_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDto {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub club: Option<ClubDto>,
    #[serde(default)]
    pub license_number: Option<String>,
}

impl From<&Person> for UserDto {
    fn from(person: &Person) -> Self {
        Self {
            user_id: person.id.as_uuid(),
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            birth_date: person.birth_date,
            gender: person.gender,
            club: person.club_id.map(|id| ClubDto {
                club_id: id.as_uuid(),
            }),
            license_number: person.license_number.clone(),
        }
    }
}

impl From<UserDto> for Person {
    fn from(dto: UserDto) -> Self {
        Person {
            id: dto.user_id.into(),
            first_name: dto.first_name,
            last_name: dto.last_name,
            birth_date: dto.birth_date,
            gender: dto.gender,
            club_id: dto.club.map(|club| club.club_id.into()),
            license_number: dto.license_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRegistrationDto {
    pub user_id: Uuid,
    pub race: RaceDto,
    #[serde(default)]
    pub chip_number: Option<String>,
    #[serde(default)]
    pub medical_form_valid: Option<bool>,
}

impl From<&PersonRaceEntry> for PersonRegistrationDto {
    fn from(entry: &PersonRaceEntry) -> Self {
        Self {
            user_id: entry.registration.person_id.as_uuid(),
            race: RaceDto::from(&entry.race),
            chip_number: entry.registration.chip_id.clone(),
            medical_form_valid: entry.registration.medical_form_valid,
        }
    }
}

impl TryFrom<PersonRegistrationDto> for PersonRaceEntry {
    type Error = EnrollmentError;

    fn try_from(dto: PersonRegistrationDto) -> EnrollmentResult<Self> {
        let race = Race::try_from(dto.race)?;
        Ok(PersonRaceEntry {
            registration: PersonRaceRegistration {
                person_id: dto.user_id.into(),
                race_id: race.id,
                chip_id: dto.chip_number,
                medical_form_valid: dto.medical_form_valid,
            },
            race,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDto {
    pub team_id: Uuid,
    pub team_name: String,
    #[serde(default)]
    pub team_image: Option<String>,
    pub manager_id: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Team> for TeamDto {
    fn from(team: &Team) -> Self {
        Self {
            team_id: team.id().as_uuid(),
            team_name: team.name().to_string(),
            team_image: team.image().map(str::to_string),
            manager_id: team.manager_id().as_uuid(),
            created_at: Some(team.created_at()),
        }
    }
}

impl From<TeamDto> for Team {
    fn from(dto: TeamDto) -> Self {
        Team::from_persistence(
            dto.team_id.into(),
            dto.team_name,
            dto.team_image,
            dto.manager_id.into(),
            dto.created_at.unwrap_or_else(Utc::now),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDto {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEntryDto {
    pub team: TeamDto,
    pub race_id: Uuid,
    #[serde(default)]
    pub members: Vec<MemberDto>,
    pub team_race_number: u32,
    #[serde(default)]
    pub team_race_validated: bool,
    #[serde(default)]
    pub team_race_time: Option<NaiveTime>,
}

impl From<&TeamEntry> for TeamEntryDto {
    fn from(entry: &TeamEntry) -> Self {
        Self {
            team: TeamDto::from(&entry.team),
            race_id: entry.registration.race_id().as_uuid(),
            members: members(&entry.member_ids),
            team_race_number: entry.registration.entry_number().value(),
            team_race_validated: entry.registration.validation().is_validated(),
            team_race_time: entry.registration.finish_time(),
        }
    }
}

impl TryFrom<TeamEntryDto> for TeamEntry {
    type Error = EnrollmentError;

    fn try_from(dto: TeamEntryDto) -> EnrollmentResult<Self> {
        let team = Team::from(dto.team);
        let registration = TeamRaceRegistration::from_persistence(
            team.id(),
            dto.race_id.into(),
            EntryNumber::new(dto.team_race_number)?,
            ValidationState::from_flag(dto.team_race_validated),
            dto.team_race_time,
        );

        Ok(TeamEntry {
            team,
            member_ids: dto.members.into_iter().map(|m| m.user_id.into()).collect(),
            registration,
        })
    }
}

/// Body of `POST /races/{race_id}/teams`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRequestDto {
    pub team: TeamDto,
    pub race_id: Uuid,
    pub members: Vec<MemberDto>,
    pub team_race_number: u32,
}

impl From<&Enrollment> for EnrollmentRequestDto {
    fn from(enrollment: &Enrollment) -> Self {
        Self {
            team: TeamDto::from(&enrollment.team),
            race_id: enrollment.race_id.as_uuid(),
            members: members(&enrollment.member_ids),
            team_race_number: enrollment.entry_number.value(),
        }
    }
}

impl TryFrom<EnrollmentRequestDto> for Enrollment {
    type Error = EnrollmentError;

    fn try_from(dto: EnrollmentRequestDto) -> EnrollmentResult<Self> {
        Ok(Enrollment {
            team: Team::from(dto.team),
            member_ids: dto.members.into_iter().map(|m| m.user_id.into()).collect(),
            race_id: dto.race_id.into(),
            entry_number: EntryNumber::new(dto.team_race_number)?,
        })
    }
}

/// Body of `PUT /races/{race_id}/teams/{team_id}/validation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRequestDto {
    pub team_race_validated: bool,
}

fn members(ids: &[crate::domain::person::PersonId]) -> Vec<MemberDto> {
    ids.iter()
        .map(|id| MemberDto {
            user_id: id.as_uuid(),
        })
        .collect()
}
