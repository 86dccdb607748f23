//! REST client for the QuickEase backend.
//!
//! Bearer-token auth with a single transparent refresh on HTTP 401. If the
//! refresh is rejected as well the call fails with
//! [`BackendError::SessionExpired`] and the caller is expected to log out.
//! No retries or timeouts beyond reqwest's defaults.

use std::sync::RwLock;

use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use super::models::{
    AuthTokens, EarnedAchievement, Flashcard, GrantOutcome, ListResponse, Note,
    PomodoroSettingsRecord, QuizRecord,
};
use super::traits::{AchievementStore, SettingsStore, StatsSource};
use crate::error::BackendError;
use crate::timer::TimerSettings;

const LOGIN_PATH: &str = "auth/login/";
const REFRESH_PATH: &str = "auth/token/refresh/";
const NOTES_PATH: &str = "notes/";
const FLASHCARDS_PATH: &str = "flashcards/";
const QUIZZES_PATH: &str = "quizzes/";
const ACHIEVEMENTS_PATH: &str = "achievements/";
const POMODORO_PATH: &str = "pomodoro/";

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

pub struct BackendClient {
    http: Client,
    base: Url,
    tokens: RwLock<Option<AuthTokens>>,
}

impl BackendClient {
    /// Create an unauthenticated client. `base_url` is the API root,
    /// e.g. `https://quickease.example/api/`.
    ///
    /// # Errors
    /// Returns `BackendError::InvalidUrl` if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            http: Client::new(),
            base: Url::parse(&base)?,
            tokens: RwLock::new(None),
        })
    }

    pub fn with_tokens(self, tokens: AuthTokens) -> Self {
        self.set_tokens(Some(tokens));
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn tokens(&self) -> Option<AuthTokens> {
        self.tokens.read().ok().and_then(|t| t.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens().is_some()
    }

    /// Forget the held tokens.
    pub fn clear_tokens(&self) {
        self.set_tokens(None);
    }

    fn set_tokens(&self, tokens: Option<AuthTokens>) {
        if let Ok(mut guard) = self.tokens.write() {
            *guard = tokens;
        }
    }

    // ── Auth ─────────────────────────────────────────────────────────

    /// Exchange credentials for a token pair and keep it.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthTokens, BackendError> {
        let url = self.base.join(LOGIN_PATH)?;
        let resp = self
            .http
            .post(url)
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        let tokens: AuthTokens = check(&Method::POST, LOGIN_PATH, resp).await?.json().await?;
        self.set_tokens(Some(tokens.clone()));
        debug!(username, "logged in");
        Ok(tokens)
    }

    /// Trade the refresh token for a new access token.
    pub async fn refresh(&self) -> Result<AuthTokens, BackendError> {
        let current = self.tokens().ok_or(BackendError::NotAuthenticated)?;
        let url = self.base.join(REFRESH_PATH)?;
        let resp = self
            .http
            .post(url)
            .json(&json!({ "refresh": current.refresh }))
            .send()
            .await?;
        let body: RefreshResponse = check(&Method::POST, REFRESH_PATH, resp).await?.json().await?;
        let tokens = AuthTokens {
            access: body.access,
            refresh: body.refresh.unwrap_or(current.refresh),
        };
        self.set_tokens(Some(tokens.clone()));
        debug!("access token refreshed");
        Ok(tokens)
    }

    // ── Requests ─────────────────────────────────────────────────────

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, BackendError> {
        let url = self.base.join(path)?;
        let access = self.tokens().ok_or(BackendError::NotAuthenticated)?.access;
        debug!(%method, path, "backend request");

        let resp = self.request(method.clone(), url.clone(), &access, body).send().await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return check(&method, path, resp).await;
        }

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "token refresh failed");
            return Err(BackendError::SessionExpired);
        }
        let access = self.tokens().ok_or(BackendError::NotAuthenticated)?.access;
        let resp = self.request(method.clone(), url, &access, body).send().await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(BackendError::SessionExpired);
        }
        check(&method, path, resp).await
    }

    fn request(
        &self,
        method: Method,
        url: Url,
        access: &str,
        body: Option<&Value>,
    ) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url).bearer_auth(access);
        match body {
            Some(body) => builder.json(body),
            None => builder,
        }
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, BackendError> {
        let resp = self.send(Method::GET, path, None).await?;
        let list: ListResponse<T> = resp.json().await?;
        Ok(list.into_vec())
    }

    async fn settings_record(&self) -> Result<Option<PomodoroSettingsRecord>, BackendError> {
        let records: Vec<PomodoroSettingsRecord> = self.get_list(POMODORO_PATH).await?;
        Ok(records.into_iter().next())
    }
}

async fn check(method: &Method, path: &str, resp: Response) -> Result<Response, BackendError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(BackendError::Status {
        method: method.to_string(),
        path: path.to_string(),
        status,
        body,
    })
}

/// Whether a failed grant means the badge was already recorded.
fn is_duplicate_grant(err: &BackendError) -> bool {
    match err {
        BackendError::Status { status: 409, .. } => true,
        BackendError::Status {
            status: 400, body, ..
        } => {
            let body = body.to_lowercase();
            body.contains("already") || body.contains("unique")
        }
        _ => false,
    }
}

impl StatsSource for BackendClient {
    async fn list_notes(&self) -> Result<Vec<Note>, BackendError> {
        self.get_list(NOTES_PATH).await
    }

    async fn list_flashcards(&self) -> Result<Vec<Flashcard>, BackendError> {
        self.get_list(FLASHCARDS_PATH).await
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizRecord>, BackendError> {
        self.get_list(QUIZZES_PATH).await
    }
}

impl AchievementStore for BackendClient {
    async fn fetch_earned(&self) -> Result<Vec<String>, BackendError> {
        let earned: Vec<EarnedAchievement> = self.get_list(ACHIEVEMENTS_PATH).await?;
        Ok(earned.into_iter().map(|a| a.badge_id).collect())
    }

    async fn grant(&self, badge_id: &str) -> Result<GrantOutcome, BackendError> {
        let body = json!({ "badge_id": badge_id });
        match self.send(Method::POST, ACHIEVEMENTS_PATH, Some(&body)).await {
            Ok(_) => Ok(GrantOutcome::Granted),
            Err(e) if is_duplicate_grant(&e) => Ok(GrantOutcome::AlreadyGranted),
            Err(e) => Err(e),
        }
    }
}

impl SettingsStore for BackendClient {
    async fn load_settings(&self) -> Result<Option<TimerSettings>, BackendError> {
        Ok(self.settings_record().await?.map(|r| r.settings))
    }

    async fn save_settings(&self, settings: &TimerSettings) -> Result<(), BackendError> {
        let body = serde_json::to_value(settings)?;
        match self.settings_record().await? {
            Some(record) => {
                let path = format!("{POMODORO_PATH}{}/", record.id);
                self.send(Method::PUT, &path, Some(&body)).await?;
            }
            None => {
                self.send(Method::POST, POMODORO_PATH, Some(&body)).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = BackendClient::new("http://localhost:8000/api").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/api/");
        assert_eq!(
            client.base_url().join(NOTES_PATH).unwrap().as_str(),
            "http://localhost:8000/api/notes/"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            BackendClient::new("not a url"),
            Err(BackendError::InvalidUrl(_))
        ));
    }

    #[test]
    fn duplicate_grant_detection() {
        let status = |status, body: &str| BackendError::Status {
            method: "POST".into(),
            path: ACHIEVEMENTS_PATH.into(),
            status,
            body: body.into(),
        };
        assert!(is_duplicate_grant(&status(409, "")));
        assert!(is_duplicate_grant(&status(
            400,
            r#"{"non_field_errors": ["The fields user, badge_id must make a unique set."]}"#
        )));
        assert!(!is_duplicate_grant(&status(400, r#"{"badge_id": ["required"]}"#)));
        assert!(!is_duplicate_grant(&status(500, "already")));
    }

    #[test]
    fn tokens_can_be_cleared() {
        let client = BackendClient::new("http://localhost/api/")
            .unwrap()
            .with_tokens(AuthTokens {
                access: "a".into(),
                refresh: "r".into(),
            });
        assert!(client.is_authenticated());
        client.clear_tokens();
        assert!(!client.is_authenticated());
    }
}
