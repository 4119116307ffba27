// Local cache schema
// Column names follow the UPPER_SNAKE convention of the on-device store

/// Statements creating the cache tables; every one is idempotent
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS PERSON (
        PERSON_ID             BLOB PRIMARY KEY,
        PERSON_FIRST_NAME     TEXT NOT NULL,
        PERSON_LAST_NAME      TEXT NOT NULL,
        PERSON_BIRTH_DATE     TEXT NOT NULL,
        PERSON_GENDER         TEXT NOT NULL,
        CLUB_ID               BLOB,
        PERSON_LICENSE_NUMBER TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS RACE (
        RACE_ID         BLOB PRIMARY KEY,
        RAID_ID         BLOB NOT NULL,
        RACE_NAME       TEXT NOT NULL,
        RACE_START_TIME TEXT NOT NULL,
        RACE_END_TIME   TEXT NOT NULL,
        RACE_GENDER     TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS TEAM (
        TEAM_ID         BLOB PRIMARY KEY,
        TEAM_NAME       TEXT NOT NULL,
        TEAM_IMAGE      TEXT,
        MANAGER_ID      BLOB NOT NULL,
        TEAM_CREATED_AT TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS TEAM_MEMBER (
        TEAM_ID   BLOB NOT NULL REFERENCES TEAM (TEAM_ID) ON DELETE CASCADE,
        PERSON_ID BLOB NOT NULL,
        PRIMARY KEY (TEAM_ID, PERSON_ID)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS TEAM_RACE (
        TEAM_ID             BLOB NOT NULL REFERENCES TEAM (TEAM_ID) ON DELETE CASCADE,
        RACE_ID             BLOB NOT NULL,
        TEAM_RACE_NUMBER    INTEGER NOT NULL CHECK (TEAM_RACE_NUMBER >= 1),
        TEAM_RACE_VALIDATED INTEGER NOT NULL DEFAULT 0,
        TEAM_RACE_TIME      TEXT,
        PRIMARY KEY (TEAM_ID, RACE_ID),
        UNIQUE (RACE_ID, TEAM_RACE_NUMBER)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS PERSON_RACE (
        PERSON_ID                 BLOB NOT NULL,
        RACE_ID                   BLOB NOT NULL,
        PERSON_RACE_CHIP          TEXT,
        PERSON_RACE_MEDICAL_FORM  INTEGER,
        PRIMARY KEY (PERSON_ID, RACE_ID)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS DOSSARD_COUNTER (
        RACE_ID     BLOB PRIMARY KEY,
        LAST_NUMBER INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS PENDING_ACTION (
        ACTION_ID        INTEGER PRIMARY KEY AUTOINCREMENT,
        ACTION_KIND      TEXT NOT NULL,
        ACTION_PAYLOAD   TEXT NOT NULL,
        ACTION_QUEUED_AT TEXT NOT NULL,
        ACTION_ATTEMPTS  INTEGER NOT NULL DEFAULT 0,
        ACTION_ERROR     TEXT,
        ACTION_PARKED_AT TEXT
    )
    "#,
];
