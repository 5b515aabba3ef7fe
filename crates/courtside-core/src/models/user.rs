use std::fmt;

use serde::{Deserialize, Serialize};

/// The signed-in account, as cached by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "roles")]
    pub role: Option<String>,
    #[serde(rename = "hasFantasyTeam", default)]
    pub has_fantasy_team: bool,
}

impl User {
    /// Merge the fields set in `patch` into this record
    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(ref username) = patch.username {
            self.username = username.clone();
        }
        if let Some(ref email) = patch.email {
            self.email = email.clone();
        }
        if let Some(ref role) = patch.role {
            self.role = Some(role.clone());
        }
        if let Some(has_team) = patch.has_fantasy_team {
            self.has_fantasy_team = has_team;
        }
    }

    /// Name to greet the user with: username, falling back to email
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            &self.email
        } else {
            &self.username
        }
    }
}

/// Partial update for a [`User`]. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub has_fantasy_team: Option<bool>,
}

impl UserPatch {
    pub fn has_fantasy_team(value: bool) -> Self {
        Self {
            has_fantasy_team: Some(value),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.has_fantasy_team.is_none()
    }
}

#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "favouriteTeamId")]
    pub favourite_team_id: i64,
    pub nationality: String,
}

// Keeps the password out of debug logs
impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .field("favourite_team_id", &self.favourite_team_id)
            .field("nationality", &self.nationality)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub email: String,
}
