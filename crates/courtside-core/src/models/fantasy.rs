use serde::{Deserialize, Serialize};

use super::player::{Player, Position};

/// Number of starters; squad entries past this index are the bench when the
/// backend does not flag bench players explicitly.
const STARTERS_IN_SQUAD: usize = 5;

/// A user's saved fantasy team, normalized from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FantasyTeam {
    /// Absent in the squad-build response, which predates the team record
    pub id: Option<i64>,
    #[serde(rename = "teamName")]
    pub team_name: String,
    #[serde(rename = "ownerId")]
    pub owner_id: Option<i64>,
    pub budget: f64,
    #[serde(rename = "totalPoints")]
    pub total_points: f64,
    #[serde(rename = "transfersRemaining")]
    pub transfers_remaining: i64,
    pub squad: Vec<SquadEntry>,
}

/// One player on a saved fantasy team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadEntry {
    pub id: i64,
    pub player: Player,
    #[serde(rename = "purchasePrice")]
    pub purchase_price: f64,
    pub active: bool,
    #[serde(rename = "isCaptain")]
    pub is_captain: bool,
    #[serde(rename = "isViceCaptain")]
    pub is_vice_captain: bool,
    #[serde(rename = "isOnBench")]
    pub is_on_bench: bool,
    pub position: Option<Position>,
}

impl FantasyTeam {
    fn has_bench_flags(&self) -> bool {
        self.squad.iter().any(|e| e.is_on_bench)
    }

    /// Starting five. Uses the bench flags when present, otherwise squad order.
    pub fn starters(&self) -> Vec<&SquadEntry> {
        if self.has_bench_flags() {
            self.squad.iter().filter(|e| !e.is_on_bench).collect()
        } else {
            self.squad.iter().take(STARTERS_IN_SQUAD).collect()
        }
    }

    pub fn bench(&self) -> Vec<&SquadEntry> {
        if self.has_bench_flags() {
            self.squad.iter().filter(|e| e.is_on_bench).collect()
        } else {
            self.squad.iter().skip(STARTERS_IN_SQUAD).collect()
        }
    }

    pub fn captain(&self) -> Option<&SquadEntry> {
        self.squad.iter().find(|e| e.is_captain)
    }

    pub fn vice_captain(&self) -> Option<&SquadEntry> {
        self.squad.iter().find(|e| e.is_vice_captain)
    }

    /// Total purchase price of the squad, in millions
    pub fn squad_value(&self) -> f64 {
        self.squad.iter().map(|e| e.purchase_price).sum()
    }
}

/// Request body for building a fantasy team and its initial squad in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct SquadPayload {
    #[serde(rename = "teamName")]
    pub team_name: String,
    #[serde(rename = "ownerUserId")]
    pub owner_user_id: i64,
    pub starters: Vec<i64>,
    pub bench: Vec<i64>,
    #[serde(rename = "captainPlayerId", skip_serializing_if = "Option::is_none")]
    pub captain_player_id: Option<i64>,
    #[serde(rename = "viceCaptainPlayerId", skip_serializing_if = "Option::is_none")]
    pub vice_captain_player_id: Option<i64>,
}

/// Request body for submitting a game week lineup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupRequest {
    #[serde(rename = "fantasyTeamId")]
    pub fantasy_team_id: i64,
    #[serde(rename = "gameWeekId")]
    pub game_week_id: i64,
    pub starters: Vec<i64>,
    pub bench: Vec<i64>,
    #[serde(rename = "captainPlayerId", skip_serializing_if = "Option::is_none")]
    pub captain_player_id: Option<i64>,
}

/// A lineup as acknowledged by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Lineup {
    pub id: i64,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

impl LineupRequest {
    /// Lineup that keeps a saved team's current starters, bench and captain.
    /// `None` if the team has no id yet.
    pub fn from_team(team: &FantasyTeam, game_week_id: i64) -> Option<Self> {
        Some(Self {
            fantasy_team_id: team.id?,
            game_week_id,
            starters: team.starters().iter().map(|e| e.player.id).collect(),
            bench: team.bench().iter().map(|e| e.player.id).collect(),
            captain_player_id: team.captain().map(|e| e.player.id),
        })
    }
}
