//! REST API client module for the Courtside backend.
//!
//! This module provides the `ApiClient` for talking to the fantasy
//! basketball backend: authentication, players and teams, fantasy squads,
//! leagues and fixtures.
//!
//! Backend responses come in more than one shape for the same entity; the
//! `wire` module normalizes them into the canonical `models` types before
//! anything else sees them.

pub mod backend;
pub mod client;
pub mod error;
mod wire;

pub use backend::{AuthOutcome, FantasyBackend};
pub use client::ApiClient;
pub use error::ApiError;
