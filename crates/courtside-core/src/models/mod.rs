//! Data models for Courtside entities.
//!
//! This module contains the canonical client-side types:
//!
//! - `User`, `UserPatch`: the signed-in account as the session caches it
//! - `Player`, `Position`, `TeamRef`: players available for selection
//! - `Team`: real basketball teams
//! - `FantasyTeam`, `SquadEntry`, `SquadPayload`: fantasy squads
//! - League types: `FantasyLeague`, `UserLeague`, `LeagueDetails`
//! - `Fixture`: game week match-ups
//!
//! Backend wire shapes that disagree with these types are normalized in the
//! `api` module, never here.

pub mod fantasy;
pub mod fixture;
pub mod league;
pub mod player;
pub mod team;
pub mod user;

pub use fantasy::{FantasyTeam, Lineup, LineupRequest, SquadEntry, SquadPayload};
pub use fixture::{gameweek_start_date, Fixture};
pub use league::{FantasyLeague, LeagueDetails, LeagueStanding, UserLeague};
pub use player::{Player, PlayerQuery, Position, TeamRef};
pub use team::Team;
pub use user::{RegisterRequest, RegisterResponse, User, UserPatch};
