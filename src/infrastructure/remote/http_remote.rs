//! `reqwest` client for the remote enrollment authority.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::dto::{
    EnrollmentRequestDto, PersonRegistrationDto, RaceDto, TeamEntryDto, UserDto,
    ValidationRequestDto,
};
use crate::auth::Credential;
use crate::domain::errors::{EnrollmentError, EnrollmentResult};
use crate::domain::person::{Person, PersonId};
use crate::domain::race::{Race, RaceId};
use crate::domain::registration::{Enrollment, PersonRaceEntry, TeamEntry};
use crate::domain::repositories::{RemoteAuthority, RemoteError};
use crate::domain::team::TeamId;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP implementation of [`RemoteAuthority`]
#[derive(Debug, Clone)]
pub struct HttpRemoteAuthority {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemoteAuthority {
    /// Creates a client for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> EnrollmentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EnrollmentError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        credential: &Credential,
        request: RequestBuilder,
    ) -> Result<Response, RemoteError> {
        let response = request
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("request failed: {}", e)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.bytes().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
    ) -> Result<T, RemoteError> {
        let response = self.send(credential, self.client.get(self.url(path))).await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    response
        .json::<T>()
        .await
        .map_err(|e| RemoteError::Unavailable(format!("invalid response body: {}", e)))
}

fn malformed(err: EnrollmentError) -> RemoteError {
    RemoteError::Unavailable(format!("malformed response: {}", err))
}

/// Maps a non-2xx status to the remote error taxonomy
fn status_error(status: StatusCode, body: &[u8]) -> RemoteError {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).to_string());

    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        StatusCode::CONFLICT => RemoteError::Conflict(message),
        StatusCode::UNAUTHORIZED => RemoteError::Unauthorized(message),
        // Retrying later may succeed
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            RemoteError::Unavailable(format!("status {}: {}", status, message))
        }
        status if status.is_client_error() => RemoteError::Rejected(message),
        _ => RemoteError::Unavailable(format!("status {}: {}", status, message)),
    }
}

#[async_trait]
impl RemoteAuthority for HttpRemoteAuthority {
    async fn fetch_race(
        &self,
        credential: &Credential,
        race_id: RaceId,
    ) -> Result<Option<Race>, RemoteError> {
        match self
            .get_json::<RaceDto>(credential, &format!("/races/{}", race_id))
            .await
        {
            Ok(dto) => Race::try_from(dto).map(Some).map_err(malformed),
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_people(&self, credential: &Credential) -> Result<Vec<Person>, RemoteError> {
        let users: Vec<UserDto> = self.get_json(credential, "/users").await?;
        Ok(users.into_iter().map(Person::from).collect())
    }

    async fn fetch_person_registrations(
        &self,
        credential: &Credential,
    ) -> Result<Vec<PersonRaceEntry>, RemoteError> {
        let registrations: Vec<PersonRegistrationDto> =
            self.get_json(credential, "/race-registrations").await?;

        registrations
            .into_iter()
            .map(PersonRaceEntry::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(malformed)
    }

    async fn fetch_team_entries(
        &self,
        credential: &Credential,
        race_id: RaceId,
    ) -> Result<Vec<TeamEntry>, RemoteError> {
        let entries: Vec<TeamEntryDto> = self
            .get_json(credential, &format!("/races/{}/teams", race_id))
            .await?;

        entries
            .into_iter()
            .map(TeamEntry::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(malformed)
    }

    async fn create_enrollment(
        &self,
        credential: &Credential,
        enrollment: &Enrollment,
    ) -> Result<(), RemoteError> {
        let body = EnrollmentRequestDto::from(enrollment);
        let request = self
            .client
            .post(self.url(&format!("/races/{}/teams", enrollment.race_id)))
            .json(&body);

        self.send(credential, request).await?;
        Ok(())
    }

    async fn set_validation(
        &self,
        credential: &Credential,
        team_id: TeamId,
        race_id: RaceId,
        validated: bool,
    ) -> Result<(), RemoteError> {
        let request = self
            .client
            .put(self.url(&format!("/races/{}/teams/{}/validation", race_id, team_id)))
            .json(&ValidationRequestDto {
                team_race_validated: validated,
            });

        self.send(credential, request).await?;
        Ok(())
    }

    async fn remove_member(
        &self,
        credential: &Credential,
        team_id: TeamId,
        person_id: PersonId,
        race_id: RaceId,
    ) -> Result<(), RemoteError> {
        let request = self.client.delete(self.url(&format!(
            "/races/{}/teams/{}/members/{}",
            race_id, team_id, person_id
        )));

        self.send(credential, request).await?;
        Ok(())
    }

    async fn delete_team(
        &self,
        credential: &Credential,
        team_id: TeamId,
    ) -> Result<(), RemoteError> {
        let request = self.client.delete(self.url(&format!("/teams/{}", team_id)));

        self.send(credential, request).await?;
        Ok(())
    }
}
