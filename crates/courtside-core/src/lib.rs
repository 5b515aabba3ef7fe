//! Courtside core - shared client logic for the Courtside fantasy basketball backend.
//!
//! This crate holds everything a front end needs besides rendering:
//!
//! - `api`: REST client for the backend, with response normalization
//! - `auth`: session lifecycle (hydrate/login/logout) and keychain credentials
//! - `squad`: the fantasy squad draft and its submission rules
//! - `storage`: async key-value stores the session persists into
//! - `models`: canonical domain types
//! - `config`: user configuration and base URL resolution

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod squad;
pub mod storage;
pub mod utils;

pub use api::{ApiClient, ApiError, FantasyBackend};
pub use auth::{CredentialStore, Session, SessionError, SessionManager};
pub use config::Config;
pub use squad::{SquadDraft, SquadError, ValidationIssue};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
