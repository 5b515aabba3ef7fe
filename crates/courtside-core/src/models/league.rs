use serde::{Deserialize, Serialize};

use crate::utils::format_date;

/// A league as returned right after creating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FantasyLeague {
    pub id: i64,
    pub name: String,
    #[serde(rename = "joinCode")]
    pub join_code: Option<String>,
    #[serde(rename = "inviteCode")]
    pub invite_code: Option<String>,
}

/// A league the user belongs to, with their standing in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLeague {
    #[serde(rename = "leagueId")]
    pub league_id: i64,
    #[serde(rename = "leagueName")]
    pub league_name: String,
    #[serde(rename = "leagueType", default)]
    pub league_type: Option<String>,
    #[serde(rename = "joinedAt", default)]
    pub joined_at: Option<String>,
    #[serde(rename = "totalPoints", default)]
    pub total_points: f64,
    #[serde(default)]
    pub rank: Option<i64>,
}

impl UserLeague {
    pub fn joined_display(&self) -> String {
        self.joined_at
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn rank_display(&self) -> String {
        match self.rank {
            Some(rank) => format!("#{}", rank),
            None => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueStanding {
    #[serde(rename = "teamName")]
    pub team_name: String,
    #[serde(rename = "totalPoints", default)]
    pub total_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueDetails {
    #[serde(rename = "leagueId")]
    pub league_id: i64,
    #[serde(rename = "leagueName", default)]
    pub league_name: Option<String>,
    #[serde(default)]
    pub rankings: Vec<LeagueStanding>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_leagues() {
        let json = r#"[{"leagueId": 5, "leagueName": "Office", "leagueType": "PRIVATE", "joinedAt": "2024-09-21T10:00:00Z", "totalPoints": 341.5, "rank": 2}]"#;
        let leagues: Vec<UserLeague> = serde_json::from_str(json).unwrap();
        assert_eq!(leagues[0].rank_display(), "#2");
        assert_eq!(leagues[0].joined_display(), "Sep 21, 2024");
    }

    #[test]
    fn test_league_details_without_rankings() {
        let details: LeagueDetails = serde_json::from_str(r#"{"leagueId": 5}"#).unwrap();
        assert!(details.rankings.is_empty());
        assert!(details.league_name.is_none());
    }
}
