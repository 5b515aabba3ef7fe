//! API client for the Courtside REST backend.
//!
//! This module provides the `ApiClient` struct for making optionally
//! authenticated requests and normalizing the responses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::{is_placeholder_token, SessionManager};
use crate::models::{
    FantasyLeague, FantasyTeam, Fixture, LeagueDetails, Lineup, LineupRequest, Player,
    PlayerQuery, RegisterRequest, RegisterResponse, SquadPayload, Team, User, UserLeague,
};

use super::backend::{AuthOutcome, FantasyBackend};
use super::wire::{normalize_players, WireFantasyTeam, WireLogin, WirePlayer, WireUser};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Backend used when neither the environment nor the config names one
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the Courtside backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for `base_url` (e.g. `http://localhost:8080`)
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests.
    /// Placeholder tokens are dropped rather than sent.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|t| !is_placeholder_token(t));
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: Option<&str>) -> Self {
        let mut client = self.clone(); // Cheap clone, shares connection pool
        client.set_token(token.map(str::to_string));
        client
    }

    /// Client carrying the session's bearer token, if it has one
    pub fn for_session(&self, session: &SessionManager) -> Self {
        self.with_token(session.token())
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request built by `build`, retrying with exponential backoff
    /// while the backend answers 429.
    async fn send<F>(&self, method: &Method, url: &str, build: F) -> Result<Response, ApiError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            debug!(method = %method, url = url, authenticated = self.has_token(), "Sending request");
            let response = build().send().await?;
            debug!(status = response.status().as_u16(), url = url, "Response received");

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", url, e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self
            .send(&Method::GET, &url, || self.request(Method::GET, &url))
            .await?;
        Self::read_json(response, &url).await
    }

    async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + Sync + ?Sized,
    {
        let url = self.url(path);
        let response = self
            .send(&Method::GET, &url, || self.request(Method::GET, &url).query(query))
            .await?;
        Self::read_json(response, &url).await
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let url = self.url(path);
        let response = self
            .send(&Method::POST, &url, || self.request(Method::POST, &url).json(body))
            .await?;
        Self::read_json(response, &url).await
    }

    // ===== Account =====

    /// Fetch the account behind the current bearer token
    pub async fn me(&self) -> Result<User, ApiError> {
        let user: WireUser = self.get("/api/auth/me").await?;
        Ok(user.normalize())
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.post("/api/auth/register", request).await
    }

    // ===== Players & Teams =====

    pub async fn players(&self, query: &PlayerQuery) -> Result<Vec<Player>, ApiError> {
        let players: Vec<WirePlayer> = self.get_with_query("/api/players", query).await?;
        normalize_players(players)
    }

    pub async fn teams(&self) -> Result<Vec<Team>, ApiError> {
        self.get("/api/teams").await
    }

    pub async fn team_players(&self, team_id: i64) -> Result<Vec<Player>, ApiError> {
        let players: Vec<WirePlayer> = self.get(&format!("/api/teams/{}/players", team_id)).await?;
        normalize_players(players)
    }

    // ===== Fantasy Teams =====

    /// Create an empty fantasy team (no squad)
    pub async fn create_team(&self, team_name: &str, owner_user_id: i64) -> Result<FantasyTeam, ApiError> {
        let body = serde_json::json!({
            "teamName": team_name,
            "ownerUserId": owner_user_id,
        });
        let team: WireFantasyTeam = self.post("/api/user/team", &body).await?;
        team.normalize()
    }

    pub async fn create_lineup(&self, request: &LineupRequest) -> Result<Lineup, ApiError> {
        self.post("/api/user/lineup", request).await
    }

    /// Whether the user has built a fantasy team. A 404 means no.
    pub async fn has_fantasy_team(&self, user_id: i64) -> Result<bool, ApiError> {
        match self
            .get::<bool>(&format!("/api/user/{}/has-fantasy-team", user_id))
            .await
        {
            Ok(has_team) => Ok(has_team),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ===== Fixtures =====

    /// Fixtures for a game week. Entries the backend formats unexpectedly
    /// are skipped.
    pub async fn fixtures(&self, game_week_id: u32) -> Result<Vec<Fixture>, ApiError> {
        let raw: Vec<String> = self
            .get(&format!("/api/gameweek/{}/fixtures/formatted", game_week_id))
            .await?;

        let mut fixtures = Vec::with_capacity(raw.len());
        for entry in &raw {
            match Fixture::parse_formatted(entry) {
                Some(fixture) => fixtures.push(fixture),
                None => warn!(entry = %entry, game_week_id, "Skipping unparseable fixture"),
            }
        }
        debug!("Parsed {} fixtures for game week {}", fixtures.len(), game_week_id);
        Ok(fixtures)
    }

    // ===== Leagues =====

    pub async fn create_league(&self, user_id: i64, name: &str) -> Result<FantasyLeague, ApiError> {
        let body = serde_json::json!({ "name": name });
        self.post(&format!("/api/user/{}/leagues", user_id), &body).await
    }

    /// Join a league by its join code. Returns the backend's confirmation text.
    pub async fn join_league(&self, join_code: &str, user_id: i64) -> Result<String, ApiError> {
        let url = self.url("/api/leagues/join");
        let body = serde_json::json!({
            "joinCode": join_code,
            "userId": user_id,
        });
        let response = self
            .send(&Method::POST, &url, || self.request(Method::POST, &url).json(&body))
            .await?;
        let text = response.text().await?;
        Ok(serde_json::from_str::<String>(&text).unwrap_or(text))
    }

    pub async fn user_leagues(&self, user_id: i64) -> Result<Vec<UserLeague>, ApiError> {
        self.get(&format!("/api/user/{}/leagues", user_id)).await
    }

    pub async fn league_details(&self, league_id: i64) -> Result<LeagueDetails, ApiError> {
        self.get(&format!("/api/leagues/{}", league_id)).await
    }
}

#[async_trait]
impl FantasyBackend for ApiClient {
    async fn authenticate(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<AuthOutcome, ApiError> {
        let body = serde_json::json!({
            "usernameOrEmail": username_or_email,
            "password": password,
        });
        let login: WireLogin = self.post("/api/auth/login", &body).await?;
        let outcome = login.normalize()?;
        debug!(user_id = outcome.user.id, has_token = outcome.token.is_some(), "Authenticated");
        Ok(outcome)
    }

    async fn build_squad(&self, payload: &SquadPayload) -> Result<FantasyTeam, ApiError> {
        let team: WireFantasyTeam = self.post("/api/user/squad/build", payload).await?;
        team.normalize()
    }

    async fn fetch_user_fantasy_team(&self, user_id: i64) -> Result<Option<FantasyTeam>, ApiError> {
        match self
            .get::<WireFantasyTeam>(&format!("/api/user/{}/fantasy-team", user_id))
            .await
        {
            Ok(team) => team.normalize().map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://10.0.2.2:8080/").unwrap();
        assert_eq!(client.base_url(), "http://10.0.2.2:8080");
        assert_eq!(client.url("/api/teams"), "http://10.0.2.2:8080/api/teams");
    }

    #[test]
    fn test_placeholder_tokens_are_not_attached() {
        let client = ApiClient::new(DEFAULT_BASE_URL).unwrap();
        assert!(!client.with_token(Some("")).has_token());
        assert!(!client.with_token(Some("null")).has_token());
        assert!(!client.with_token(None).has_token());
        assert!(client.with_token(Some("eyJ.abc.def")).has_token());
    }

    #[test]
    fn test_bearer_header() {
        let client = ApiClient::new(DEFAULT_BASE_URL).unwrap().with_token(Some("tok"));
        let request = client
            .request(Method::GET, &client.url("/api/auth/me"))
            .build()
            .unwrap();
        let header = request.headers().get(reqwest::header::AUTHORIZATION).unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer tok");

        let anonymous = ApiClient::new(DEFAULT_BASE_URL).unwrap();
        let request = anonymous
            .request(Method::GET, &anonymous.url("/api/teams"))
            .build()
            .unwrap();
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_player_query_string() {
        let client = ApiClient::new(DEFAULT_BASE_URL).unwrap();
        let query = PlayerQuery {
            team_id: Some(3),
            page: Some(0),
            ..Default::default()
        };
        let request = client
            .request(Method::GET, &client.url("/api/players"))
            .query(&query)
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("teamId=3&page=0"));
    }
}
