use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{User, UserPatch};
use crate::storage::{KeyValueStore, StorageError};

use super::token::TokenInfo;

/// Store key for the bearer token
pub const TOKEN_KEY: &str = "auth_token";

/// Store key for the serialized user record
pub const USER_KEY: &str = "auth_user";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to persist session: {0}")]
    PersistenceFailure(#[from] StorageError),

    #[error("Failed to encode user record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Startup phase. Moves to `Ready` once and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Initializing,
    Ready,
}

/// Who is signed in.
///
/// Some login flows return a user without a bearer token, so an
/// authenticated session may carry either part alone, never neither.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Anonymous,
    Authenticated {
        token: Option<String>,
        user: Option<User>,
    },
}

impl AuthState {
    fn from_parts(token: Option<String>, user: Option<User>) -> Self {
        if token.is_none() && user.is_none() {
            AuthState::Anonymous
        } else {
            AuthState::Authenticated { token, user }
        }
    }

    fn token(&self) -> Option<&str> {
        match self {
            AuthState::Authenticated { token, .. } => token.as_deref(),
            AuthState::Anonymous => None,
        }
    }

    fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated { user, .. } => user.as_ref(),
            AuthState::Anonymous => None,
        }
    }
}

/// Point-in-time view of the session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
    pub initializing: bool,
}

/// True for tokens that must not be stored or sent: empty, blank, or the
/// stringified null values some backend builds return.
pub fn is_placeholder_token(token: &str) -> bool {
    let trimmed = token.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("undefined")
}

/// Owns the signed-in state and keeps the key-value store in step with it.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    phase: SessionPhase,
    auth: AuthState,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            phase: SessionPhase::Initializing,
            auth: AuthState::Anonymous,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_initializing(&self) -> bool {
        self.phase == SessionPhase::Initializing
    }

    pub fn auth_state(&self) -> &AuthState {
        &self.auth
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::Authenticated { .. })
    }

    /// Bearer token for API requests, if the backend issued one
    pub fn token(&self) -> Option<&str> {
        self.auth.token()
    }

    pub fn user(&self) -> Option<&User> {
        self.auth.user()
    }

    /// Claims of the current token. `None` without a token or when the token
    /// is not JWT-shaped.
    pub fn token_info(&self) -> Option<TokenInfo> {
        self.token().and_then(TokenInfo::decode)
    }

    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.token_info().and_then(|info| info.expires_at)
    }

    /// Whether the token's own expiry claim has passed. `false` when there
    /// is no decodable token; the backend's 401 is the fallback signal.
    pub fn is_token_expired(&self) -> bool {
        self.token_info().is_some_and(|info| info.is_expired())
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user().map(|u| u.id)
    }

    pub fn snapshot(&self) -> Session {
        Session {
            token: self.token().map(str::to_string),
            user: self.user().cloned(),
            initializing: self.is_initializing(),
        }
    }

    /// Restore the persisted session. Never fails: unreadable storage or a
    /// corrupt user record means starting signed out.
    pub async fn hydrate(&mut self) -> Session {
        let (token, user_json) =
            futures::join!(self.store.get(TOKEN_KEY), self.store.get(USER_KEY));

        self.auth = match (token, user_json) {
            (Ok(token), Ok(user_json)) => {
                let user = user_json
                    .map(|json| serde_json::from_str::<User>(&json))
                    .transpose();
                match user {
                    Ok(user) => {
                        let token = token.filter(|t| !is_placeholder_token(t));
                        AuthState::from_parts(token, user)
                    }
                    Err(e) => {
                        warn!(error = %e, "Stored user record is unreadable, starting signed out");
                        AuthState::Anonymous
                    }
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to read stored session, starting signed out");
                AuthState::Anonymous
            }
        };
        self.phase = SessionPhase::Ready;

        debug!(
            authenticated = self.is_authenticated(),
            has_token = self.token().is_some(),
            "Session hydrated"
        );
        self.snapshot()
    }

    /// Adopt a new login.
    ///
    /// A placeholder token is not stored (and clears any stale one). Without
    /// a `user`, the previously cached user is kept. The store is written
    /// first; in-memory state only changes once every write succeeded.
    pub async fn login(&mut self, token: &str, user: Option<User>) -> Result<(), SessionError> {
        let token = (!is_placeholder_token(token)).then(|| token.to_string());
        let user_json = user.as_ref().map(serde_json::to_string).transpose()?;

        let previous_token = self.store.get(TOKEN_KEY).await.ok().flatten();

        match token {
            Some(ref t) => self.store.set(TOKEN_KEY, t).await?,
            None => self.store.remove(TOKEN_KEY).await?,
        }

        if let Some(ref json) = user_json {
            if let Err(e) = self.store.set(USER_KEY, json).await {
                self.restore_token(previous_token).await;
                return Err(e.into());
            }
        }

        let user = user.or_else(|| self.user().cloned());
        info!(
            user_id = ?user.as_ref().map(|u| u.id),
            has_token = token.is_some(),
            "Signed in"
        );
        self.auth = AuthState::from_parts(token, user);
        Ok(())
    }

    async fn restore_token(&self, previous: Option<String>) {
        let result = match previous {
            Some(ref t) => self.store.set(TOKEN_KEY, t).await,
            None => self.store.remove(TOKEN_KEY).await,
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to roll back stored token");
        }
    }

    /// Sign out. In-memory state is cleared even if the store cannot be
    /// updated; the storage error is still reported.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        let (token_removed, user_removed) =
            futures::join!(self.store.remove(TOKEN_KEY), self.store.remove(USER_KEY));

        self.auth = AuthState::Anonymous;
        self.phase = SessionPhase::Ready;
        info!("Signed out");

        token_removed?;
        user_removed?;
        Ok(())
    }

    /// Merge `patch` into the current user and persist it.
    /// Returns `false` without touching anything when no user is loaded or
    /// the patch sets no field.
    pub async fn update_user(&mut self, patch: &UserPatch) -> Result<bool, SessionError> {
        let Some(current) = self.user() else {
            debug!("No user loaded, ignoring update");
            return Ok(false);
        };
        if patch.is_empty() {
            return Ok(false);
        }

        let mut updated = current.clone();
        updated.apply(patch);
        let json = serde_json::to_string(&updated)?;
        self.store.set(USER_KEY, &json).await?;

        let token = self.token().map(str::to_string);
        self.auth = AuthState::from_parts(token, Some(updated));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use async_trait::async_trait;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn user(id: i64) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            role: Some("USER".to_string()),
            has_fantasy_team: false,
        }
    }

    /// Memory store whose writes to one key can be made to fail
    struct FlakyStore {
        inner: MemoryStore,
        failing_key: &'static str,
        fail: AtomicBool,
    }

    impl FlakyStore {
        fn new(failing_key: &'static str) -> Self {
            Self {
                inner: MemoryStore::new(),
                failing_key,
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == self.failing_key && self.fail.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("disk full".to_string()));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn test_hydrate_empty_store() {
        let mut session = SessionManager::new(Arc::new(MemoryStore::new()));
        assert!(session.is_initializing());

        let snapshot = session.hydrate().await;
        assert!(!snapshot.initializing);
        assert!(snapshot.token.is_none());
        assert!(snapshot.user.is_none());
        assert_eq!(session.auth_state(), &AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_login_without_token_survives_restart() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        let mut first = SessionManager::new(store.clone());
        first.hydrate().await;
        first.login("", Some(user(1))).await.unwrap();
        assert!(first.token().is_none());
        assert_eq!(first.user_id(), Some(1));
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);

        let mut second = SessionManager::new(store);
        let restored = second.hydrate().await;
        assert_eq!(restored.user, Some(user(1)));
        assert!(restored.token.is_none());
        assert!(second.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_without_user_keeps_cached_user() {
        let mut session = SessionManager::new(Arc::new(MemoryStore::new()));
        session.hydrate().await;
        session.login("first", Some(user(1))).await.unwrap();
        session.login("second", None).await.unwrap();

        assert_eq!(session.token(), Some("second"));
        assert_eq!(session.user_id(), Some(1));
    }

    #[tokio::test]
    async fn test_placeholder_token_clears_stale_token() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut session = SessionManager::new(store.clone());
        session.hydrate().await;
        session.login("real-token", Some(user(1))).await.unwrap();
        session.login("undefined", None).await.unwrap();

        assert!(session.token().is_none());
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(session.user_id(), Some(1));
    }

    #[tokio::test]
    async fn test_placeholder_login_without_any_user_stays_anonymous() {
        let mut session = SessionManager::new(Arc::new(MemoryStore::new()));
        session.hydrate().await;
        session.login("  ", None).await.unwrap();
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_then_hydrate_is_anonymous() {
        let store = Arc::new(MemoryStore::new());
        let mut session = SessionManager::new(store.clone());
        session.hydrate().await;
        session.login("tok", Some(user(2))).await.unwrap();
        assert_eq!(store.len().await, 2);

        session.logout().await.unwrap();
        assert!(!session.is_authenticated());
        assert!(store.is_empty().await);

        let snapshot = session.hydrate().await;
        assert!(snapshot.token.is_none());
        assert!(snapshot.user.is_none());
    }

    #[tokio::test]
    async fn test_login_before_hydrate_is_not_lost() {
        let mut session = SessionManager::new(Arc::new(MemoryStore::new()));
        session.login("early", Some(user(3))).await.unwrap();
        assert!(session.is_initializing());

        let snapshot = session.hydrate().await;
        assert!(!snapshot.initializing);
        assert_eq!(snapshot.token.as_deref(), Some("early"));
        assert_eq!(snapshot.user.map(|u| u.id), Some(3));
    }

    #[tokio::test]
    async fn test_corrupt_user_record_fails_open() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "tok").await.unwrap();
        store.set(USER_KEY, "{not json").await.unwrap();

        let mut session = SessionManager::new(store);
        let snapshot = session.hydrate().await;
        assert!(!snapshot.initializing);
        assert!(snapshot.token.is_none());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_user_write_leaves_session_untouched() {
        let store = Arc::new(FlakyStore::new(USER_KEY));
        let mut session = SessionManager::new(store.clone());
        session.hydrate().await;
        session.login("old", Some(user(1))).await.unwrap();

        store.fail.store(true, Ordering::SeqCst);
        let result = session.login("new", Some(user(2))).await;
        assert!(matches!(result, Err(SessionError::PersistenceFailure(_))));

        assert_eq!(session.token(), Some("old"));
        assert_eq!(session.user_id(), Some(1));
        assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_update_user_persists_merge() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut session = SessionManager::new(store.clone());
        session.hydrate().await;

        assert!(!session.update_user(&UserPatch::has_fantasy_team(true)).await.unwrap());

        session.login("tok", Some(user(4))).await.unwrap();
        assert!(session.update_user(&UserPatch::has_fantasy_team(true)).await.unwrap());
        assert!(session.user().map(|u| u.has_fantasy_team).unwrap_or(false));

        let stored = store.get(USER_KEY).await.unwrap().unwrap();
        let stored: User = serde_json::from_str(&stored).unwrap();
        assert!(stored.has_fantasy_team);
        assert_eq!(session.token(), Some("tok"));
    }

    #[tokio::test]
    async fn test_empty_patch_writes_nothing() {
        let store = Arc::new(FlakyStore::new(USER_KEY));
        let mut session = SessionManager::new(store.clone());
        session.hydrate().await;
        session.login("tok", Some(user(6))).await.unwrap();

        store.fail.store(true, Ordering::SeqCst);
        assert!(!session.update_user(&UserPatch::default()).await.unwrap());
        assert_eq!(session.user(), Some(&user(6)));
    }

    #[tokio::test]
    async fn test_session_recovers_from_corrupt_store_file() {
        let dir = std::env::temp_dir().join(format!("courtside-session-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("store.json"), r#"{"auth_token": "tr"#).unwrap();

        let mut session = SessionManager::new(Arc::new(FileStore::new(&dir)));
        assert!(!session.hydrate().await.initializing);
        assert!(!session.is_authenticated());

        session.login("tok", Some(user(8))).await.unwrap();
        let mut reopened = SessionManager::new(Arc::new(FileStore::new(&dir)));
        assert_eq!(reopened.hydrate().await.user.map(|u| u.id), Some(8));

        session.logout().await.unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_token_expiry_from_claims() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub": "9", "exp": 4102444800}"#);
        let token = format!("header.{}.signature", payload);

        let mut session = SessionManager::new(Arc::new(MemoryStore::new()));
        session.hydrate().await;
        assert_eq!(session.token_expires_at(), None);
        assert!(!session.is_token_expired());

        session.login(&token, Some(user(9))).await.unwrap();
        assert_eq!(session.token_expires_at(), DateTime::from_timestamp(4_102_444_800, 0));
        assert!(!session.is_token_expired());
        assert_eq!(session.token_info().and_then(|i| i.user_id).as_deref(), Some("9"));

        session.login("opaque", None).await.unwrap();
        assert_eq!(session.token_info(), None);
        assert!(!session.is_token_expired());
    }

    #[tokio::test]
    async fn test_failed_update_keeps_old_user() {
        let store = Arc::new(FlakyStore::new(USER_KEY));
        let mut session = SessionManager::new(store.clone());
        session.hydrate().await;
        session.login("tok", Some(user(5))).await.unwrap();

        store.fail.store(true, Ordering::SeqCst);
        assert!(session.update_user(&UserPatch::has_fantasy_team(true)).await.is_err());
        assert!(!session.user().map(|u| u.has_fantasy_team).unwrap_or(true));
    }

    #[test]
    fn test_is_placeholder_token() {
        assert!(is_placeholder_token(""));
        assert!(is_placeholder_token("   "));
        assert!(is_placeholder_token("null"));
        assert!(is_placeholder_token("Undefined"));
        assert!(!is_placeholder_token("eyJhbGciOi"));
    }
}
