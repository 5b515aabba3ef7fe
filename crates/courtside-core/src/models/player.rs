use std::fmt;

use serde::{Deserialize, Serialize};

/// Basketball position. The starting five holds exactly one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub enum Position {
    #[serde(rename = "PG")]
    PointGuard,
    #[serde(rename = "SG")]
    ShootingGuard,
    #[serde(rename = "SF")]
    SmallForward,
    #[serde(rename = "PF")]
    PowerForward,
    #[serde(rename = "C")]
    Center,
}

impl Position {
    /// Starting lineup order, as the backend expects `starters`.
    pub const ALL: [Position; 5] = [
        Position::PointGuard,
        Position::ShootingGuard,
        Position::SmallForward,
        Position::PowerForward,
        Position::Center,
    ];

    /// Parse a position as the backend spells it.
    /// Accepts abbreviations ("PG") and full names ("Point Guard"), any case.
    pub fn from_api(s: &str) -> Option<Self> {
        let normalized = s.trim().to_uppercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "PG" | "POINT GUARD" => Some(Position::PointGuard),
            "SG" | "SHOOTING GUARD" => Some(Position::ShootingGuard),
            "SF" | "SMALL FORWARD" => Some(Position::SmallForward),
            "PF" | "POWER FORWARD" => Some(Position::PowerForward),
            "C" | "CENTER" | "CENTRE" => Some(Position::Center),
            _ => None,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Position::PointGuard => "PG",
            Position::ShootingGuard => "SG",
            Position::SmallForward => "SF",
            Position::PowerForward => "PF",
            Position::Center => "C",
        }
    }

    /// Index of this position's slot in the starting five
    pub fn slot_index(&self) -> usize {
        match self {
            Position::PointGuard => 0,
            Position::ShootingGuard => 1,
            Position::SmallForward => 2,
            Position::PowerForward => 3,
            Position::Center => 4,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// The real team a player belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct TeamRef {
    pub id: Option<i64>,
    pub name: String,
}

/// A player available for selection. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Player {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub position: Position,
    pub team: TeamRef,
    /// Price in millions
    pub price: f64,
    #[serde(rename = "ownershipPct")]
    pub ownership_pct: f64,
}

impl Player {
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            _ => self.last_name.clone(),
        }
    }
}

/// Filters for the player listing endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerQuery {
    #[serde(rename = "teamId", skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
    #[serde(rename = "minPrice", skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(rename = "maxPrice", skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(rename = "ownershipGte", skip_serializing_if = "Option::is_none")]
    pub ownership_gte: Option<f64>,
    #[serde(rename = "ownershipLte", skip_serializing_if = "Option::is_none")]
    pub ownership_lte: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_from_api() {
        assert_eq!(Position::from_api("PG"), Some(Position::PointGuard));
        assert_eq!(Position::from_api(" sg "), Some(Position::ShootingGuard));
        assert_eq!(Position::from_api("Small Forward"), Some(Position::SmallForward));
        assert_eq!(Position::from_api("power-forward"), Some(Position::PowerForward));
        assert_eq!(Position::from_api("Centre"), Some(Position::Center));
        assert_eq!(Position::from_api("G"), None);
        assert_eq!(Position::from_api(""), None);
    }

    #[test]
    fn test_slot_index_matches_lineup_order() {
        for (i, pos) in Position::ALL.iter().enumerate() {
            assert_eq!(pos.slot_index(), i);
        }
    }

    #[test]
    fn test_player_query_skips_unset_filters() {
        let query = PlayerQuery {
            team_id: Some(4),
            max_price: Some(12.5),
            ..Default::default()
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json, serde_json::json!({"teamId": 4, "maxPrice": 12.5}));
    }
}
