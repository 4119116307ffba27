use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use super::rows::{
    entry_number, MemberRow, PendingActionRow, PersonRaceRow, PersonRow, RaceRow, TeamEntryRow,
    TeamRaceRow, TeamRow,
};
use super::schema::SCHEMA;
use crate::domain::errors::{EnrollmentError, EnrollmentResult};
use crate::domain::pending_action::{PendingAction, QueuedAction};
use crate::domain::person::{Person, PersonId};
use crate::domain::race::{Race, RaceId};
use crate::domain::registration::{
    Enrollment, PersonRaceEntry, TeamEntry, TeamRaceRegistration,
};
use crate::domain::repositories::LocalCache;
use crate::domain::team::{EntryNumber, Team, TeamId};

/// Maps a sqlx error, turning unique-constraint violations into `Conflict`
fn db_error(context: &str, e: sqlx::Error) -> EnrollmentError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            EnrollmentError::Conflict(format!("{}: {}", context, db.message()))
        }
        _ => EnrollmentError::Storage(format!("{}: {}", context, e)),
    }
}

/// SQLite implementation of [`LocalCache`]
///
/// Multi-row writes run in one transaction each.
#[derive(Debug, Clone)]
pub struct SqliteLocalCache {
    pool: SqlitePool,
}

impl SqliteLocalCache {
    /// Wraps an existing pool; call [`SqliteLocalCache::migrate`] before use
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the cache database at `url` and applies
    /// the schema
    pub async fn connect(url: &str) -> EnrollmentResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| EnrollmentError::Configuration(format!("cache url {}: {}", url, e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| db_error("Failed to open local cache", e))?;

        let cache = Self::new(pool);
        cache.migrate().await?;
        Ok(cache)
    }

    /// Private in-memory cache on a single pinned connection
    pub async fn in_memory() -> EnrollmentResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| EnrollmentError::Configuration(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| db_error("Failed to open in-memory cache", e))?;

        let cache = Self::new(pool);
        cache.migrate().await?;
        Ok(cache)
    }

    /// Creates missing tables
    pub async fn migrate(&self) -> EnrollmentResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("Failed to apply cache schema", e))?;
        }

        Ok(())
    }

    async fn begin(&self) -> EnrollmentResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin cache transaction", e))
    }

    async fn commit(tx: Transaction<'static, Sqlite>) -> EnrollmentResult<()> {
        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit cache transaction", e))
    }

    async fn upsert_race_in(tx: &mut Transaction<'static, Sqlite>, race: &Race) -> EnrollmentResult<()> {
        let row = RaceRow::from(race);
        sqlx::query(
            r#"
            INSERT INTO RACE (RACE_ID, RAID_ID, RACE_NAME, RACE_START_TIME, RACE_END_TIME, RACE_GENDER)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (RACE_ID) DO UPDATE SET
                RAID_ID = excluded.RAID_ID,
                RACE_NAME = excluded.RACE_NAME,
                RACE_START_TIME = excluded.RACE_START_TIME,
                RACE_END_TIME = excluded.RACE_END_TIME,
                RACE_GENDER = excluded.RACE_GENDER
            "#,
        )
        .bind(row.race_id)
        .bind(row.raid_id)
        .bind(row.name)
        .bind(row.start_time)
        .bind(row.end_time)
        .bind(row.gender)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_error("Failed to save race", e))?;

        Ok(())
    }

    async fn upsert_team_in(tx: &mut Transaction<'static, Sqlite>, team: &Team) -> EnrollmentResult<()> {
        let row = TeamRow::from(team);
        sqlx::query(
            r#"
            INSERT INTO TEAM (TEAM_ID, TEAM_NAME, TEAM_IMAGE, MANAGER_ID, TEAM_CREATED_AT)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (TEAM_ID) DO UPDATE SET
                TEAM_NAME = excluded.TEAM_NAME,
                TEAM_IMAGE = excluded.TEAM_IMAGE,
                MANAGER_ID = excluded.MANAGER_ID
            "#,
        )
        .bind(row.team_id)
        .bind(row.name)
        .bind(row.image)
        .bind(row.manager_id)
        .bind(row.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_error("Failed to save team", e))?;

        Ok(())
    }

    async fn insert_member_in(
        tx: &mut Transaction<'static, Sqlite>,
        team_id: TeamId,
        person_id: PersonId,
    ) -> EnrollmentResult<()> {
        sqlx::query(
            "INSERT INTO TEAM_MEMBER (TEAM_ID, PERSON_ID) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(team_id.as_uuid())
        .bind(person_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| db_error("Failed to save team member", e))?;

        Ok(())
    }

    /// Upserts the registration, keeping its entry number unique per race
    async fn upsert_team_race_in(
        tx: &mut Transaction<'static, Sqlite>,
        registration: &TeamRaceRegistration,
    ) -> EnrollmentResult<()> {
        let row = TeamRaceRow::from(registration);
        sqlx::query(
            r#"
            INSERT INTO TEAM_RACE (TEAM_ID, RACE_ID, TEAM_RACE_NUMBER, TEAM_RACE_VALIDATED, TEAM_RACE_TIME)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (TEAM_ID, RACE_ID) DO UPDATE SET
                TEAM_RACE_NUMBER = excluded.TEAM_RACE_NUMBER,
                TEAM_RACE_VALIDATED = excluded.TEAM_RACE_VALIDATED,
                TEAM_RACE_TIME = excluded.TEAM_RACE_TIME
            "#,
        )
        .bind(row.team_id)
        .bind(row.race_id)
        .bind(row.number)
        .bind(row.validated)
        .bind(row.finish_time)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            db_error(
                &format!(
                    "entry number {} already taken in race {}",
                    registration.entry_number(),
                    registration.race_id()
                ),
                e,
            )
        })?;

        Self::raise_high_water_in(tx, registration.race_id(), registration.entry_number()).await
    }

    async fn raise_high_water_in(
        tx: &mut Transaction<'static, Sqlite>,
        race_id: RaceId,
        number: EntryNumber,
    ) -> EnrollmentResult<()> {
        sqlx::query(
            r#"
            INSERT INTO DOSSARD_COUNTER (RACE_ID, LAST_NUMBER) VALUES (?, ?)
            ON CONFLICT (RACE_ID) DO UPDATE SET
                LAST_NUMBER = MAX(LAST_NUMBER, excluded.LAST_NUMBER)
            "#,
        )
        .bind(race_id.as_uuid())
        .bind(i64::from(number.value()))
        .execute(&mut **tx)
        .await
        .map_err(|e| db_error("Failed to update dossard counter", e))?;

        Ok(())
    }
}

#[async_trait]
impl LocalCache for SqliteLocalCache {
    async fn upsert_race(&self, race: &Race) -> EnrollmentResult<()> {
        let mut tx = self.begin().await?;
        Self::upsert_race_in(&mut tx, race).await?;
        Self::commit(tx).await
    }

    async fn find_race(&self, race_id: RaceId) -> EnrollmentResult<Option<Race>> {
        let row = sqlx::query_as::<_, RaceRow>(
            r#"
            SELECT RACE_ID, RAID_ID, RACE_NAME, RACE_START_TIME, RACE_END_TIME, RACE_GENDER
            FROM RACE
            WHERE RACE_ID = ?
            "#,
        )
        .bind(race_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find race", e))?;

        row.map(Race::try_from).transpose()
    }

    async fn upsert_people(&self, people: &[Person]) -> EnrollmentResult<()> {
        let mut tx = self.begin().await?;
        for person in people {
            let row = PersonRow::from(person);
            sqlx::query(
                r#"
                INSERT INTO PERSON (
                    PERSON_ID, PERSON_FIRST_NAME, PERSON_LAST_NAME, PERSON_BIRTH_DATE,
                    PERSON_GENDER, CLUB_ID, PERSON_LICENSE_NUMBER
                )
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (PERSON_ID) DO UPDATE SET
                    PERSON_FIRST_NAME = excluded.PERSON_FIRST_NAME,
                    PERSON_LAST_NAME = excluded.PERSON_LAST_NAME,
                    PERSON_BIRTH_DATE = excluded.PERSON_BIRTH_DATE,
                    PERSON_GENDER = excluded.PERSON_GENDER,
                    CLUB_ID = excluded.CLUB_ID,
                    PERSON_LICENSE_NUMBER = excluded.PERSON_LICENSE_NUMBER
                "#,
            )
            .bind(row.person_id)
            .bind(row.first_name)
            .bind(row.last_name)
            .bind(row.birth_date)
            .bind(row.gender)
            .bind(row.club_id)
            .bind(row.license_number)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to save person", e))?;
        }
        Self::commit(tx).await
    }

    async fn list_people(&self) -> EnrollmentResult<Vec<Person>> {
        let rows = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT PERSON_ID, PERSON_FIRST_NAME, PERSON_LAST_NAME, PERSON_BIRTH_DATE,
                   PERSON_GENDER, CLUB_ID, PERSON_LICENSE_NUMBER
            FROM PERSON
            ORDER BY PERSON_LAST_NAME, PERSON_FIRST_NAME
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list people", e))?;

        rows.into_iter().map(Person::try_from).collect()
    }

    async fn upsert_person_registrations(
        &self,
        entries: &[PersonRaceEntry],
    ) -> EnrollmentResult<()> {
        let mut tx = self.begin().await?;
        for entry in entries {
            Self::upsert_race_in(&mut tx, &entry.race).await?;

            let row = PersonRaceRow::from(entry);
            sqlx::query(
                r#"
                INSERT INTO PERSON_RACE (PERSON_ID, RACE_ID, PERSON_RACE_CHIP, PERSON_RACE_MEDICAL_FORM)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (PERSON_ID, RACE_ID) DO UPDATE SET
                    PERSON_RACE_CHIP = excluded.PERSON_RACE_CHIP,
                    PERSON_RACE_MEDICAL_FORM = excluded.PERSON_RACE_MEDICAL_FORM
                "#,
            )
            .bind(row.person_id)
            .bind(row.race.race_id)
            .bind(row.chip)
            .bind(row.medical_form)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to save person registration", e))?;
        }
        Self::commit(tx).await
    }

    async fn list_person_registrations(&self) -> EnrollmentResult<Vec<PersonRaceEntry>> {
        let rows = sqlx::query_as::<_, PersonRaceRow>(
            r#"
            SELECT pr.PERSON_ID AS PERSON_ID,
                   pr.PERSON_RACE_CHIP AS PERSON_RACE_CHIP,
                   pr.PERSON_RACE_MEDICAL_FORM AS PERSON_RACE_MEDICAL_FORM,
                   r.RACE_ID AS RACE_ID,
                   r.RAID_ID AS RAID_ID,
                   r.RACE_NAME AS RACE_NAME,
                   r.RACE_START_TIME AS RACE_START_TIME,
                   r.RACE_END_TIME AS RACE_END_TIME,
                   r.RACE_GENDER AS RACE_GENDER
            FROM PERSON_RACE pr
            JOIN RACE r ON r.RACE_ID = pr.RACE_ID
            ORDER BY r.RACE_START_TIME
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list person registrations", e))?;

        rows.into_iter().map(PersonRaceEntry::try_from).collect()
    }

    async fn upsert_team_entries(
        &self,
        race_id: RaceId,
        entries: &[TeamEntry],
    ) -> EnrollmentResult<()> {
        let mut tx = self.begin().await?;
        for entry in entries {
            let registration = &entry.registration;
            Self::upsert_team_in(&mut tx, &entry.team).await?;

            let displaced = sqlx::query(
                r#"
                DELETE FROM TEAM_RACE
                WHERE RACE_ID = ? AND TEAM_RACE_NUMBER = ? AND TEAM_ID <> ?
                "#,
            )
            .bind(race_id.as_uuid())
            .bind(i64::from(registration.entry_number().value()))
            .bind(entry.team.id().as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to displace cached registration", e))?;

            if displaced.rows_affected() > 0 {
                tracing::warn!(
                    race_id = %race_id,
                    entry_number = %registration.entry_number(),
                    "Cached registration displaced by authoritative entry"
                );
            }

            Self::upsert_team_race_in(&mut tx, registration).await?;

            sqlx::query("DELETE FROM TEAM_MEMBER WHERE TEAM_ID = ?")
                .bind(entry.team.id().as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("Failed to reset team members", e))?;

            for person_id in &entry.member_ids {
                Self::insert_member_in(&mut tx, entry.team.id(), *person_id).await?;
            }
        }
        Self::commit(tx).await
    }

    async fn list_team_entries(&self, race_id: RaceId) -> EnrollmentResult<Vec<TeamEntry>> {
        let rows = sqlx::query_as::<_, TeamEntryRow>(
            r#"
            SELECT t.TEAM_ID AS TEAM_ID,
                   t.TEAM_NAME AS TEAM_NAME,
                   t.TEAM_IMAGE AS TEAM_IMAGE,
                   t.MANAGER_ID AS MANAGER_ID,
                   t.TEAM_CREATED_AT AS TEAM_CREATED_AT,
                   tr.RACE_ID AS RACE_ID,
                   tr.TEAM_RACE_NUMBER AS TEAM_RACE_NUMBER,
                   tr.TEAM_RACE_VALIDATED AS TEAM_RACE_VALIDATED,
                   tr.TEAM_RACE_TIME AS TEAM_RACE_TIME
            FROM TEAM_RACE tr
            JOIN TEAM t ON t.TEAM_ID = tr.TEAM_ID
            WHERE tr.RACE_ID = ?
            ORDER BY tr.TEAM_RACE_NUMBER
            "#,
        )
        .bind(race_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list team entries", e))?;

        let members = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT m.TEAM_ID AS TEAM_ID, m.PERSON_ID AS PERSON_ID
            FROM TEAM_MEMBER m
            JOIN TEAM_RACE tr ON tr.TEAM_ID = m.TEAM_ID
            WHERE tr.RACE_ID = ?
            ORDER BY m.ROWID
            "#,
        )
        .bind(race_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list team members", e))?;

        let mut members_by_team: HashMap<Uuid, Vec<PersonId>> = HashMap::new();
        for member in members {
            members_by_team
                .entry(member.team_id)
                .or_default()
                .push(member.person_id.into());
        }

        rows.into_iter()
            .map(|row| {
                let member_ids = members_by_team.remove(&row.team.team_id).unwrap_or_default();
                Ok(TeamEntry {
                    team: Team::from(row.team),
                    member_ids,
                    registration: TeamRaceRegistration::try_from(row.registration)?,
                })
            })
            .collect()
    }

    async fn entry_number_high_water(
        &self,
        race_id: RaceId,
    ) -> EnrollmentResult<Option<EntryNumber>> {
        let highest: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(NUMBER) FROM (
                SELECT LAST_NUMBER AS NUMBER FROM DOSSARD_COUNTER WHERE RACE_ID = ?
                UNION ALL
                SELECT TEAM_RACE_NUMBER AS NUMBER FROM TEAM_RACE WHERE RACE_ID = ?
            )
            "#,
        )
        .bind(race_id.as_uuid())
        .bind(race_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to read dossard counter", e))?;

        highest.map(entry_number).transpose()
    }

    async fn apply_enrollment(&self, enrollment: &Enrollment) -> EnrollmentResult<()> {
        let team_id = enrollment.team.id();
        let mut tx = self.begin().await?;

        Self::upsert_team_in(&mut tx, &enrollment.team).await?;

        for person_id in &enrollment.member_ids {
            Self::insert_member_in(&mut tx, team_id, *person_id).await?;
        }

        Self::upsert_team_race_in(&mut tx, &enrollment.team_registration()).await?;

        // Members already registered to the race keep their chip and form data
        for registration in enrollment.person_registrations() {
            sqlx::query(
                r#"
                INSERT INTO PERSON_RACE (PERSON_ID, RACE_ID, PERSON_RACE_CHIP, PERSON_RACE_MEDICAL_FORM)
                VALUES (?, ?, NULL, NULL)
                ON CONFLICT (PERSON_ID, RACE_ID) DO NOTHING
                "#,
            )
            .bind(registration.person_id.as_uuid())
            .bind(registration.race_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to save person registration", e))?;
        }

        Self::commit(tx).await
    }

    async fn set_validation(
        &self,
        team_id: TeamId,
        race_id: RaceId,
        validated: bool,
    ) -> EnrollmentResult<bool> {
        let result = sqlx::query(
            "UPDATE TEAM_RACE SET TEAM_RACE_VALIDATED = ? WHERE TEAM_ID = ? AND RACE_ID = ?",
        )
        .bind(validated)
        .bind(team_id.as_uuid())
        .bind(race_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update validation", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_member(
        &self,
        team_id: TeamId,
        person_id: PersonId,
        race_id: RaceId,
    ) -> EnrollmentResult<()> {
        let mut tx = self.begin().await?;

        sqlx::query("DELETE FROM TEAM_MEMBER WHERE TEAM_ID = ? AND PERSON_ID = ?")
            .bind(team_id.as_uuid())
            .bind(person_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to remove team member", e))?;

        sqlx::query("DELETE FROM PERSON_RACE WHERE PERSON_ID = ? AND RACE_ID = ?")
            .bind(person_id.as_uuid())
            .bind(race_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to remove person registration", e))?;

        Self::commit(tx).await
    }

    async fn delete_team(&self, team_id: TeamId) -> EnrollmentResult<()> {
        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM PERSON_RACE
            WHERE (PERSON_ID, RACE_ID) IN (
                SELECT m.PERSON_ID, tr.RACE_ID
                FROM TEAM_MEMBER m
                JOIN TEAM_RACE tr ON tr.TEAM_ID = m.TEAM_ID
                WHERE m.TEAM_ID = ?
            )
            "#,
        )
        .bind(team_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to remove member registrations", e))?;

        for statement in [
            "DELETE FROM TEAM_RACE WHERE TEAM_ID = ?",
            "DELETE FROM TEAM_MEMBER WHERE TEAM_ID = ?",
            "DELETE FROM TEAM WHERE TEAM_ID = ?",
        ] {
            sqlx::query(statement)
                .bind(team_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("Failed to delete team", e))?;
        }

        Self::commit(tx).await
    }

    async fn enqueue_action(&self, action: &PendingAction) -> EnrollmentResult<i64> {
        let payload = serde_json::to_string(action)?;
        let result = sqlx::query(
            r#"
            INSERT INTO PENDING_ACTION (ACTION_KIND, ACTION_PAYLOAD, ACTION_QUEUED_AT)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(action.kind())
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to enqueue pending action", e))?;

        Ok(result.last_insert_rowid())
    }

    async fn pending_actions(&self) -> EnrollmentResult<Vec<QueuedAction>> {
        let rows = sqlx::query_as::<_, PendingActionRow>(
            r#"
            SELECT ACTION_ID, ACTION_KIND, ACTION_PAYLOAD, ACTION_QUEUED_AT, ACTION_ATTEMPTS
            FROM PENDING_ACTION
            WHERE ACTION_PARKED_AT IS NULL
            ORDER BY ACTION_ID
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list pending actions", e))?;

        rows.into_iter().map(QueuedAction::try_from).collect()
    }

    async fn record_rejection(&self, id: i64, reason: &str) -> EnrollmentResult<u32> {
        let attempts: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE PENDING_ACTION
            SET ACTION_ATTEMPTS = ACTION_ATTEMPTS + 1, ACTION_ERROR = ?
            WHERE ACTION_ID = ?
            RETURNING ACTION_ATTEMPTS
            "#,
        )
        .bind(reason)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record rejection", e))?;

        let attempts = attempts.ok_or_else(|| EnrollmentError::not_found("Pending action", id))?;
        u32::try_from(attempts).map_err(|_| {
            EnrollmentError::Storage(format!("unexpected ACTION_ATTEMPTS value in cache: {}", attempts))
        })
    }

    async fn park_action(&self, id: i64) -> EnrollmentResult<()> {
        let result = sqlx::query("UPDATE PENDING_ACTION SET ACTION_PARKED_AT = ? WHERE ACTION_ID = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to park pending action", e))?;

        if result.rows_affected() == 0 {
            return Err(EnrollmentError::not_found("Pending action", id));
        }

        Ok(())
    }

    async fn parked_actions(&self) -> EnrollmentResult<Vec<QueuedAction>> {
        let rows = sqlx::query_as::<_, PendingActionRow>(
            r#"
            SELECT ACTION_ID, ACTION_KIND, ACTION_PAYLOAD, ACTION_QUEUED_AT, ACTION_ATTEMPTS
            FROM PENDING_ACTION
            WHERE ACTION_PARKED_AT IS NOT NULL
            ORDER BY ACTION_ID
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list parked actions", e))?;

        rows.into_iter().map(QueuedAction::try_from).collect()
    }

    async fn replace_action(&self, id: i64, action: &PendingAction) -> EnrollmentResult<()> {
        let payload = serde_json::to_string(action)?;
        let result = sqlx::query(
            "UPDATE PENDING_ACTION SET ACTION_KIND = ?, ACTION_PAYLOAD = ? WHERE ACTION_ID = ?",
        )
        .bind(action.kind())
        .bind(payload)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to rewrite pending action", e))?;

        if result.rows_affected() == 0 {
            return Err(EnrollmentError::not_found("Pending action", id));
        }

        Ok(())
    }

    async fn delete_action(&self, id: i64) -> EnrollmentResult<()> {
        sqlx::query("DELETE FROM PENDING_ACTION WHERE ACTION_ID = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete pending action", e))?;

        Ok(())
    }
}
