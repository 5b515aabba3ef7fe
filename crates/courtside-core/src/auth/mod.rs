//! Authentication state for the signed-in user.
//!
//! This module provides:
//! - `SessionManager`: hydrate/login/logout lifecycle over a key-value store
//! - `CredentialStore`: optional OS keychain storage for the login password
//! - `TokenInfo`: claims decoded from the bearer token, for expiry display
//!
//! The session is owned by the front end and passed to whatever needs the
//! bearer token or user record; there is no global instance.

pub mod credentials;
pub mod session;
pub mod token;

pub use credentials::CredentialStore;
pub use session::{
    is_placeholder_token, AuthState, Session, SessionError, SessionManager, SessionPhase,
    TOKEN_KEY, USER_KEY,
};
pub use token::TokenInfo;
