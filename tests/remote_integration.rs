//! Integration tests for the HTTP remote authority client
//!
//! Each test serves a small axum router on a random local port and points
//! the client at it.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Json, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde_json::json;
use uuid::Uuid;

use common::{credential, person, race, today};
use raid_enrollment::auth::Credential;
use raid_enrollment::domain::person::{Gender, PersonId};
use raid_enrollment::domain::race::GenderConstraint;
use raid_enrollment::domain::registration::{Enrollment, PersonRaceEntry, PersonRaceRegistration};
use raid_enrollment::domain::repositories::{LocalCache, RemoteAuthority, RemoteError};
use raid_enrollment::domain::team::{EntryNumber, Team, ValidationState};
use raid_enrollment::engine::{NewTeam, SyncStatus};
use raid_enrollment::infrastructure::cache::SqliteLocalCache;
use raid_enrollment::infrastructure::remote::dto::{
    EnrollmentRequestDto, PersonRegistrationDto, RaceDto, TeamEntryDto, UserDto,
    ValidationRequestDto,
};
use raid_enrollment::infrastructure::remote::HttpRemoteAuthority;
use raid_enrollment::EnrollmentEngine;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    format!("http://{addr}/api/")
}

fn client(base_url: &str) -> HttpRemoteAuthority {
    HttpRemoteAuthority::new(base_url, Duration::from_secs(5)).expect("client")
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn sample_enrollment() -> Enrollment {
    Enrollment {
        team: Team::new("Edelweiss", PersonId::new(), Some("edelweiss.png".to_string())).unwrap(),
        member_ids: vec![PersonId::new(), PersonId::new()],
        race_id: race("Trail", GenderConstraint::Mixed, 8, 11).id,
        entry_number: EntryNumber::new(7).unwrap(),
    }
}

#[tokio::test]
async fn fetch_race_forwards_bearer_and_decodes() {
    let target = race("Canoe", GenderConstraint::Female, 10, 12);
    let dto = RaceDto::from(&target);
    let app = Router::new().route(
        "/api/races/:race_id",
        get(move |headers: HeaderMap, Path(race_id): Path<Uuid>| {
            let dto = dto.clone();
            async move {
                if bearer(&headers).as_deref() != Some("Bearer test-token") {
                    return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad token"})));
                }
                if race_id != dto.race_id {
                    return (StatusCode::NOT_FOUND, Json(json!({"error": "no such race"})));
                }
                (StatusCode::OK, Json(serde_json::to_value(&dto).unwrap()))
            }
        }),
    );
    let remote = client(&serve(app).await);

    let found = remote.fetch_race(&credential(), target.id).await.unwrap();
    assert_eq!(found, Some(target.clone()));

    let missing = remote
        .fetch_race(&credential(), race("Other", GenderConstraint::Mixed, 8, 9).id)
        .await
        .unwrap();
    assert_eq!(missing, None);

    let refused = remote
        .fetch_race(&Credential::bearer("wrong"), target.id)
        .await;
    assert!(matches!(refused, Err(RemoteError::Unauthorized(_))));
}

#[tokio::test]
async fn list_endpoints_decode_nested_objects() {
    let target = race("Canoe", GenderConstraint::Mixed, 10, 12);
    let runner = person("Ana", "Blanc", Gender::Female, 1990);
    let registration = PersonRaceEntry {
        registration: PersonRaceRegistration {
            person_id: runner.id,
            race_id: target.id,
            chip_id: Some("CHIP-9".to_string()),
            medical_form_valid: Some(true),
        },
        race: target.clone(),
    };
    let entry = sample_enrollment().into_entry();

    let users = json!([UserDto::from(&runner)]);
    let registrations = json!([PersonRegistrationDto::from(&registration)]);
    let teams = json!([TeamEntryDto::from(&entry)]);
    let app = Router::new()
        .route("/api/users", get(move || async move { Json(users) }))
        .route(
            "/api/race-registrations",
            get(move || async move { Json(registrations) }),
        )
        .route(
            "/api/races/:race_id/teams",
            get(move || async move { Json(teams) }),
        );
    let remote = client(&serve(app).await);
    let cred = credential();

    assert_eq!(remote.fetch_people(&cred).await.unwrap(), vec![runner]);
    assert_eq!(
        remote.fetch_person_registrations(&cred).await.unwrap(),
        vec![registration]
    );
    assert_eq!(
        remote
            .fetch_team_entries(&cred, entry.registration.race_id())
            .await
            .unwrap(),
        vec![entry]
    );
}

#[tokio::test]
async fn missing_optional_fields_decode_as_none() {
    let user_id = Uuid::new_v4();
    let app = Router::new().route(
        "/api/users",
        get(move || async move {
            Json(json!([{
                "user_id": user_id,
                "first_name": "Lea",
                "last_name": "Roux",
                "birth_date": "1994-02-11",
                "gender": "female"
            }]))
        }),
    );
    let remote = client(&serve(app).await);

    let people = remote.fetch_people(&credential()).await.unwrap();

    assert_eq!(people.len(), 1);
    assert_eq!(people[0].id.as_uuid(), user_id);
    assert!(people[0].club_id.is_none());
    assert!(people[0].license_number.is_none());
}

#[tokio::test]
async fn undecodable_body_is_unavailable() {
    let app = Router::new().route("/api/users", get(|| async { "not json" }));
    let remote = client(&serve(app).await);

    let result = remote.fetch_people(&credential()).await;

    assert!(matches!(result, Err(RemoteError::Unavailable(_))));
}

#[tokio::test]
async fn create_enrollment_posts_the_whole_payload() {
    let received: Arc<Mutex<Option<EnrollmentRequestDto>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&received);
    let app = Router::new().route(
        "/api/races/:race_id/teams",
        post(move |Json(body): Json<EnrollmentRequestDto>| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock().unwrap() = Some(body);
                StatusCode::CREATED
            }
        }),
    );
    let remote = client(&serve(app).await);
    let enrollment = sample_enrollment();

    remote
        .create_enrollment(&credential(), &enrollment)
        .await
        .unwrap();

    let body = received.lock().unwrap().clone().expect("request body");
    assert_eq!(body, EnrollmentRequestDto::from(&enrollment));
    assert_eq!(body.team_race_number, 7);
    assert_eq!(body.members.len(), 2);
}

#[tokio::test]
async fn write_statuses_map_to_remote_errors() {
    let cases = [
        (StatusCode::NOT_FOUND, "not_found"),
        (StatusCode::CONFLICT, "conflict"),
        (StatusCode::UNPROCESSABLE_ENTITY, "rejected"),
        (StatusCode::BAD_REQUEST, "rejected"),
        (StatusCode::FORBIDDEN, "rejected"),
        (StatusCode::UNAUTHORIZED, "unauthorized"),
        (StatusCode::TOO_MANY_REQUESTS, "unavailable"),
        (StatusCode::INTERNAL_SERVER_ERROR, "unavailable"),
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
    ];

    for (status, expected) in cases {
        let app = Router::new().route(
            "/api/races/:race_id/teams",
            post(move || async move { (status, Json(json!({"message": "refused"}))) }),
        );
        let remote = client(&serve(app).await);

        let err = remote
            .create_enrollment(&credential(), &sample_enrollment())
            .await
            .unwrap_err();

        let actual = match err {
            RemoteError::NotFound(_) => "not_found",
            RemoteError::Conflict(_) => "conflict",
            RemoteError::Rejected(_) => "rejected",
            RemoteError::Unavailable(_) => "unavailable",
            RemoteError::Unauthorized(_) => "unauthorized",
        };
        assert_eq!(actual, expected, "status {}", status);
    }
}

#[tokio::test]
async fn validation_member_and_team_writes_hit_their_routes() {
    let calls: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let (put_log, member_log, team_log) = (calls.clone(), calls.clone(), calls.clone());
    let app = Router::new()
        .route(
            "/api/races/:race_id/teams/:team_id/validation",
            put(move |Json(body): Json<ValidationRequestDto>| {
                let log = put_log.clone();
                async move {
                    log.lock()
                        .unwrap()
                        .push(format!("validation:{}", body.team_race_validated));
                    StatusCode::NO_CONTENT
                }
            }),
        )
        .route(
            "/api/races/:race_id/teams/:team_id/members/:user_id",
            delete(move |Path((_, _, user_id)): Path<(Uuid, Uuid, Uuid)>| {
                let log = member_log.clone();
                async move {
                    log.lock().unwrap().push(format!("member:{}", user_id));
                    StatusCode::NO_CONTENT
                }
            }),
        )
        .route(
            "/api/teams/:team_id",
            delete(move |Path(team_id): Path<Uuid>| {
                let log = team_log.clone();
                async move {
                    log.lock().unwrap().push(format!("team:{}", team_id));
                    StatusCode::NO_CONTENT
                }
            }),
        );
    let remote = client(&serve(app).await);
    let cred = credential();
    let enrollment = sample_enrollment();
    let (team_id, race_id, member) = (
        enrollment.team.id(),
        enrollment.race_id,
        enrollment.member_ids[0],
    );

    remote.set_validation(&cred, team_id, race_id, true).await.unwrap();
    remote.remove_member(&cred, team_id, member, race_id).await.unwrap();
    remote.delete_team(&cred, team_id).await.unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "validation:true".to_string(),
            format!("member:{}", member),
            format!("team:{}", team_id),
        ]
    );
}

#[tokio::test]
async fn slow_or_closed_server_is_unavailable() {
    let app = Router::new().route(
        "/api/users",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!([]))
        }),
    );
    let base = serve(app).await;
    let impatient = HttpRemoteAuthority::new(base, Duration::from_millis(100)).unwrap();

    let slow = impatient.fetch_people(&credential()).await;
    assert!(matches!(slow, Err(RemoteError::Unavailable(_))));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let closed = client(&format!("http://{addr}"));

    let result = closed.fetch_people(&credential()).await;
    assert!(matches!(result, Err(RemoteError::Unavailable(_))));
}

#[tokio::test]
async fn server_error_on_enrollment_is_queued_then_replayed_over_http() {
    let target = race("Trail", GenderConstraint::Mixed, 8, 11);
    let member = person("Ana", "Blanc", Gender::Female, 1990);
    let race_dto = RaceDto::from(&target);
    let users = json!([UserDto::from(&member)]);
    let posts = Arc::new(AtomicUsize::new(0));
    let post_count = Arc::clone(&posts);

    let app = Router::new()
        .route(
            "/api/races/:race_id",
            get(move || {
                let dto = race_dto.clone();
                async move { Json(dto) }
            }),
        )
        .route("/api/users", get(move || async move { Json(users) }))
        .route("/api/race-registrations", get(|| async { Json(json!([])) }))
        .route(
            "/api/races/:race_id/teams",
            get(|| async { Json(json!([])) }).post(move || {
                let count = Arc::clone(&post_count);
                async move {
                    if count.fetch_add(1, Ordering::SeqCst) == 0 {
                        StatusCode::INTERNAL_SERVER_ERROR
                    } else {
                        StatusCode::CREATED
                    }
                }
            }),
        );
    let remote = Arc::new(client(&serve(app).await));
    let cache = Arc::new(SqliteLocalCache::in_memory().await.unwrap());
    let engine = EnrollmentEngine::new(remote, cache.clone()).with_fixed_date(today());
    let cred = credential();

    let receipt = engine
        .create_team_and_register(&cred, NewTeam::new("Chamois", member.id), vec![member.id], target.id)
        .await
        .unwrap();

    assert_eq!(receipt.sync, SyncStatus::Queued);
    assert_eq!(receipt.entry_number.value(), 1);
    assert_eq!(engine.repository().queue().pending().await.unwrap().len(), 1);

    let report = engine.replay_all(&cred).await.unwrap();

    assert_eq!(report.replayed, 1);
    assert!(report.is_drained());
    assert_eq!(posts.load(Ordering::SeqCst), 2);
    assert!(engine.repository().queue().pending().await.unwrap().is_empty());

    let cached = cache.list_team_entries(target.id).await.unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].team.id(), receipt.team_id);
    assert_eq!(cached[0].registration.validation(), ValidationState::Unvalidated);
}
