//! Application state shared by every command.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::{debug, info, warn};

use courtside_core::models::User;
use courtside_core::{
    ApiClient, ApiError, Config, CredentialStore, FantasyBackend, FileStore, SessionManager,
};

pub struct App {
    pub config: Config,
    pub session: SessionManager,
    api: ApiClient,
}

impl App {
    /// Load config, open the session store and restore the saved session.
    pub async fn new() -> Result<Self> {
        let config = Config::load()?;
        let cache_dir = config
            .cache_dir()
            .unwrap_or_else(|_| PathBuf::from("./cache"));

        let store = Arc::new(FileStore::new(&cache_dir));
        let mut session = SessionManager::new(store);
        let restored = session.hydrate().await;
        debug!(signed_in = restored.user.is_some(), "Session restored");

        let base_url = config.api_base_url();
        let api = ApiClient::new(&base_url)
            .with_context(|| format!("Failed to create API client for {}", base_url))?;

        Ok(Self {
            config,
            session,
            api,
        })
    }

    /// Client carrying the current session's token
    pub fn client(&self) -> ApiClient {
        self.api.for_session(&self.session)
    }

    pub fn require_user(&self) -> Result<User> {
        self.session
            .user()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Not signed in. Run `courtside login` first."))
    }

    /// Sign in, preferring the keychain password for a known username.
    pub async fn login(&mut self, username: Option<String>) -> Result<User> {
        let username = match username {
            Some(u) => u,
            None => prompt_line_with_default("Username", self.config.last_username.as_deref())?,
        };
        if username.is_empty() {
            anyhow::bail!("Username required");
        }

        let stored = CredentialStore::get_password(&username).ok();
        let used_stored = stored.is_some();
        let password = match stored {
            Some(p) => {
                eprintln!("Using saved password for {}", username);
                p
            }
            None => prompt_password()?,
        };

        let client = self.client();
        let outcome = match client.authenticate(&username, &password).await {
            Ok(outcome) => outcome,
            Err(ApiError::Unauthorized(_)) if used_stored => {
                warn!("Saved password was rejected, asking again");
                let password = prompt_password()?;
                let outcome = client
                    .authenticate(&username, &password)
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message("Login failed")))?;
                self.remember_credentials(&username, &password);
                outcome
            }
            Err(e) => anyhow::bail!(e.user_message("Login failed")),
        };
        if !used_stored {
            self.remember_credentials(&username, &password);
        }

        if outcome.token.is_none() {
            warn!("Backend issued no token; signed in without one");
        }
        let user = outcome.user.clone();
        self.session
            .login(outcome.token.as_deref().unwrap_or_default(), Some(outcome.user))
            .await
            .context("Signed in, but the session could not be saved")?;

        self.config.last_username = Some(username);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        info!(user_id = user.id, "Login complete");
        Ok(user)
    }

    fn remember_credentials(&self, username: &str, password: &str) {
        if let Err(e) = CredentialStore::store(username, password) {
            warn!(error = %e, "Failed to store credentials");
        }
    }

    pub async fn logout(&mut self) -> Result<()> {
        let result = self.session.logout().await;

        if let Some(username) = self.config.last_username.as_deref() {
            if let Err(e) = CredentialStore::delete(username) {
                warn!(error = %e, "Failed to remove stored credentials");
            }
        }

        result.context("Signed out, but the saved session could not be cleared")
    }
}

pub fn prompt_line(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_line_with_default(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => {
            let entered = prompt_line(&format!("{} [{}]", label, d))?;
            Ok(if entered.is_empty() { d.to_string() } else { entered })
        }
        None => prompt_line(label),
    }
}

pub fn prompt_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    Ok(password)
}
