use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Season opener: game week 1 starts on this date, later weeks every 7 days.
const SEASON_START: (i32, u32, u32) = (2024, 9, 20);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Fixture {
    #[serde(rename = "homeTeam")]
    pub home_team: String,
    #[serde(rename = "awayTeam")]
    pub away_team: String,
}

impl Fixture {
    /// Parse the backend's formatted fixture string, e.g. `"[Sagesse, Riyadi]"`.
    pub fn parse_formatted(s: &str) -> Option<Self> {
        let cleaned: String = s.chars().filter(|c| *c != '[' && *c != ']').collect();
        let (home, away) = cleaned.split_once(',')?;
        let (home, away) = (home.trim(), away.trim());
        if home.is_empty() || away.is_empty() {
            return None;
        }
        Some(Self {
            home_team: home.to_string(),
            away_team: away.to_string(),
        })
    }
}

/// First day of a game week (ids start at 1)
pub fn gameweek_start_date(game_week_id: u32) -> Option<NaiveDate> {
    let (year, month, day) = SEASON_START;
    let weeks = game_week_id.checked_sub(1)?;
    NaiveDate::from_ymd_opt(year, month, day)?.checked_add_days(Days::new(u64::from(weeks) * 7))
}
