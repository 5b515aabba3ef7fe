//! Backend response shapes and their normalization into `models` types.
//!
//! The backend is inconsistent: players arrive with a nested `team` object
//! and `marketValue`, or with flat `teamName`/`teamId` and `price`; login
//! returns either `{token, user}` or a flat `{token, userId, username, role}`.
//! Everything is funneled through these structs so the rest of the crate
//! only ever sees one shape.

use serde::Deserialize;

use crate::models::{FantasyTeam, Player, Position, SquadEntry, TeamRef, User};

use super::backend::AuthOutcome;
use super::ApiError;

const UNKNOWN_TEAM: &str = "Unknown Team";

#[derive(Debug, Deserialize)]
pub(crate) struct WireTeamRef {
    id: Option<i64>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePlayer {
    id: i64,
    #[serde(rename = "firstName", default)]
    first_name: Option<String>,
    #[serde(rename = "lastName", default)]
    last_name: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    team: Option<WireTeamRef>,
    #[serde(rename = "teamName", default)]
    team_name: Option<String>,
    #[serde(rename = "teamId", default)]
    team_id: Option<i64>,
    #[serde(rename = "marketValue", default)]
    market_value: Option<f64>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(rename = "ownershipPct", default)]
    ownership_pct: Option<f64>,
}

impl WirePlayer {
    pub(crate) fn normalize(self) -> Result<Player, ApiError> {
        let raw_position = self.position.unwrap_or_default();
        let position = Position::from_api(&raw_position).ok_or_else(|| {
            ApiError::InvalidResponse(format!(
                "player {} has unknown position {:?}",
                self.id, raw_position
            ))
        })?;

        let (nested_id, nested_name) = match self.team {
            Some(team) => (team.id, team.name),
            None => (None, None),
        };
        let team = TeamRef {
            id: nested_id.or(self.team_id),
            name: nested_name
                .or(self.team_name)
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNKNOWN_TEAM.to_string()),
        };

        let price = self.market_value.or(self.price).unwrap_or(0.0);
        if !price.is_finite() || price < 0.0 {
            return Err(ApiError::InvalidResponse(format!(
                "player {} has invalid price {}",
                self.id, price
            )));
        }

        Ok(Player {
            id: self.id,
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            position,
            team,
            price,
            ownership_pct: self.ownership_pct.unwrap_or(0.0),
        })
    }
}

pub(crate) fn normalize_players(players: Vec<WirePlayer>) -> Result<Vec<Player>, ApiError> {
    players.into_iter().map(WirePlayer::normalize).collect()
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireUser {
    #[serde(alias = "userId")]
    id: i64,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, alias = "roles")]
    role: Option<serde_json::Value>,
    #[serde(rename = "hasFantasyTeam", default)]
    has_fantasy_team: Option<bool>,
}

/// Roles come as a single string or as a list of strings
fn normalize_role(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Array(items) => {
            let roles: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            (!roles.is_empty()).then(|| roles.join(","))
        }
        _ => None,
    }
}

impl WireUser {
    pub(crate) fn normalize(self) -> User {
        User {
            id: self.id,
            username: self.username.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            role: normalize_role(self.role),
            has_fantasy_team: self.has_fantasy_team.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireLogin {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<WireUser>,
    #[serde(rename = "userId", default)]
    user_id: Option<i64>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, alias = "roles")]
    role: Option<serde_json::Value>,
    #[serde(rename = "hasFantasyTeam", default)]
    has_fantasy_team: Option<bool>,
}

impl WireLogin {
    pub(crate) fn normalize(self) -> Result<AuthOutcome, ApiError> {
        let user = match (self.user, self.user_id) {
            (Some(user), _) => user.normalize(),
            (None, Some(id)) => WireUser {
                id,
                username: self.username,
                email: self.email,
                role: self.role,
                has_fantasy_team: self.has_fantasy_team,
            }
            .normalize(),
            (None, None) => {
                return Err(ApiError::InvalidResponse(
                    "login response has no user".to_string(),
                ))
            }
        };
        Ok(AuthOutcome {
            token: self.token.filter(|t| !t.is_empty()),
            user,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireOwner {
    id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSquadEntry {
    #[serde(default)]
    id: Option<i64>,
    player: WirePlayer,
    #[serde(rename = "purchasePrice", default)]
    purchase_price: Option<f64>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(rename = "isCaptain", default)]
    is_captain: Option<bool>,
    #[serde(rename = "isViceCaptain", default)]
    is_vice_captain: Option<bool>,
    #[serde(rename = "isOnBench", default)]
    is_on_bench: Option<bool>,
    #[serde(default)]
    position: Option<String>,
}

impl WireSquadEntry {
    fn normalize(self) -> Result<SquadEntry, ApiError> {
        let player = self.player.normalize()?;
        Ok(SquadEntry {
            id: self.id.unwrap_or(player.id),
            purchase_price: self.purchase_price.unwrap_or(player.price),
            active: self.active.unwrap_or(true),
            is_captain: self.is_captain.unwrap_or(false),
            is_vice_captain: self.is_vice_captain.unwrap_or(false),
            is_on_bench: self.is_on_bench.unwrap_or(false),
            position: self.position.as_deref().and_then(Position::from_api),
            player,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireFantasyTeam {
    #[serde(default)]
    id: Option<i64>,
    #[serde(rename = "teamName")]
    team_name: String,
    #[serde(default)]
    owner: Option<WireOwner>,
    #[serde(rename = "ownerUserId", default)]
    owner_user_id: Option<i64>,
    #[serde(default)]
    budget: Option<f64>,
    #[serde(rename = "totalPoints", default)]
    total_points: Option<f64>,
    #[serde(rename = "transfersRemaining", default)]
    transfers_remaining: Option<i64>,
    #[serde(default)]
    squad: Vec<WireSquadEntry>,
}

impl WireFantasyTeam {
    pub(crate) fn normalize(self) -> Result<FantasyTeam, ApiError> {
        let squad = self
            .squad
            .into_iter()
            .map(WireSquadEntry::normalize)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FantasyTeam {
            id: self.id,
            team_name: self.team_name,
            owner_id: self.owner.and_then(|o| o.id).or(self.owner_user_id),
            budget: self.budget.unwrap_or(0.0),
            total_points: self.total_points.unwrap_or(0.0),
            transfers_remaining: self.transfers_remaining.unwrap_or(0),
            squad,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(json: &str) -> Result<Player, ApiError> {
        serde_json::from_str::<WirePlayer>(json).unwrap().normalize()
    }

    #[test]
    fn test_nested_team_shape() {
        let p = player(
            r#"{"id": 11, "firstName": "Wael", "lastName": "Arakji", "position": "PG",
                "team": {"id": 3, "name": "Al Riyadi", "shortName": "RIY"},
                "nationality": "LB", "marketValue": 14.5, "ownershipPct": 61.2,
                "active": true, "createdAt": "2024-09-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(p.team, TeamRef { id: Some(3), name: "Al Riyadi".to_string() });
        assert_eq!(p.price, 14.5);
        assert_eq!(p.position, Position::PointGuard);
        assert_eq!(p.full_name(), "Wael Arakji");
    }

    #[test]
    fn test_flat_team_shape() {
        let p = player(
            r#"{"id": 12, "firstName": "Ali", "lastName": "Haidar", "position": "Center",
                "teamName": "Sagesse", "teamId": 4, "price": 9.0}"#,
        )
        .unwrap();
        assert_eq!(p.team, TeamRef { id: Some(4), name: "Sagesse".to_string() });
        assert_eq!(p.price, 9.0);
        assert_eq!(p.ownership_pct, 0.0);
    }

    #[test]
    fn test_missing_team_and_unknown_position() {
        let p = player(r#"{"id": 13, "position": "SF"}"#).unwrap();
        assert_eq!(p.team.name, UNKNOWN_TEAM);

        let err = player(r#"{"id": 14, "position": "Sixth Man"}"#).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_invalid_price_rejected() {
        let err = player(r#"{"id": 15, "position": "PG", "marketValue": -3.5}"#).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(ref m) if m.contains("invalid price")));

        for bad in [f64::NAN, f64::INFINITY] {
            let wire = WirePlayer {
                id: 16,
                first_name: None,
                last_name: None,
                position: Some("C".to_string()),
                team: None,
                team_name: None,
                team_id: None,
                market_value: None,
                price: Some(bad),
                ownership_pct: None,
            };
            assert!(matches!(wire.normalize(), Err(ApiError::InvalidResponse(_))));
        }
    }

    #[test]
    fn test_login_nested_user() {
        let login: WireLogin = serde_json::from_str(
            r#"{"token": "abc", "user": {"id": 5, "email": "a@b.c", "roles": ["USER", "ADMIN"], "hasFantasyTeam": true}}"#,
        )
        .unwrap();
        let outcome = login.normalize().unwrap();
        assert_eq!(outcome.token.as_deref(), Some("abc"));
        assert_eq!(outcome.user.role.as_deref(), Some("USER,ADMIN"));
        assert!(outcome.user.has_fantasy_team);
    }

    #[test]
    fn test_login_flat_user_without_token() {
        let login: WireLogin = serde_json::from_str(
            r#"{"userId": 6, "username": "hoops", "role": "USER"}"#,
        )
        .unwrap();
        let outcome = login.normalize().unwrap();
        assert!(outcome.token.is_none());
        assert_eq!(outcome.user.id, 6);
        assert_eq!(outcome.user.username, "hoops");
    }

    #[test]
    fn test_login_without_user_is_invalid() {
        let login: WireLogin = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert!(login.normalize().is_err());
    }

    #[test]
    fn test_build_squad_response() {
        let team: WireFantasyTeam = serde_json::from_str(
            r#"{"teamName": "Cedars", "totalPoints": 0, "squad": [
                {"player": {"id": 1, "position": "PG", "team": {"id": 3, "name": "Riyadi"}, "marketValue": 12.0},
                 "isCaptain": true}
            ]}"#,
        )
        .unwrap();
        let team = team.normalize().unwrap();
        assert!(team.id.is_none());
        assert_eq!(team.squad[0].purchase_price, 12.0);
        assert_eq!(team.squad[0].id, 1);
        assert!(team.squad[0].is_captain);
    }

    #[test]
    fn test_saved_team_owner() {
        let team: WireFantasyTeam = serde_json::from_str(
            r#"{"id": 8, "teamName": "Cedars", "owner": {"id": 5, "username": "hoops"},
                "budget": 3.5, "totalPoints": 120, "transfersRemaining": 2, "squad": []}"#,
        )
        .unwrap();
        let team = team.normalize().unwrap();
        assert_eq!(team.owner_id, Some(5));
        assert_eq!(team.total_points, 120.0);
    }
}
