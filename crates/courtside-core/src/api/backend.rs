use async_trait::async_trait;

use crate::models::{FantasyTeam, SquadPayload, User};

use super::ApiError;

/// Result of a successful login. Some backend builds issue no bearer
/// token, so `token` may be absent even though the user is known.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    pub token: Option<String>,
    pub user: User,
}

/// The backend calls the session and squad logic depend on.
///
/// `ApiClient` is the production implementation; tests substitute fakes.
#[async_trait]
pub trait FantasyBackend: Send + Sync {
    async fn authenticate(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<AuthOutcome, ApiError>;

    /// Create the user's fantasy team with its initial eight players
    async fn build_squad(&self, payload: &SquadPayload) -> Result<FantasyTeam, ApiError>;

    /// The user's saved team, or `None` if they have not built one
    async fn fetch_user_fantasy_team(&self, user_id: i64) -> Result<Option<FantasyTeam>, ApiError>;
}
