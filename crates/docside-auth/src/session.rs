//! Session manager: anonymous-user lifecycle and user session cache.
//!
//! `get_session` is the single entry point every orchestrator operation goes
//! through. It returns a cached session when one is still valid, otherwise
//! runs the login flow: read stored credentials (creating a brand-new
//! anonymous user when none exist), migrate a stale email domain, log in,
//! and recover exactly once from an `invalid_grant` rejection.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use docside_core::{defaults, Error, Result, Session, UserCredentials};

use crate::client_auth::ClientAuthenticator;
use crate::credentials::CredentialsStore;
use crate::user_center::UserCenterClient;

/// Configuration for the session manager.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Email domain for generated anonymous usernames. When this differs
    /// from the domain embedded in stored credentials, the manager migrates
    /// the account before reusing them.
    pub email_domain: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            email_domain: defaults::EMAIL_DOMAIN.to_string(),
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DOCSIDE_EMAIL_DOMAIN` | `docside.io` | Domain of generated usernames |
    pub fn from_env() -> Self {
        let email_domain = std::env::var("DOCSIDE_EMAIL_DOMAIN")
            .unwrap_or_else(|_| defaults::EMAIL_DOMAIN.to_string());
        Self { email_domain }
    }

    /// Override the email domain.
    pub fn with_email_domain(mut self, domain: impl Into<String>) -> Self {
        self.email_domain = domain.into();
        self
    }
}

/// Produces valid, possibly-cached user sessions for API calls and owns the
/// anonymous-user lifecycle.
pub struct SessionManager {
    user_center: Arc<UserCenterClient>,
    client_auth: ClientAuthenticator,
    store: Arc<dyn CredentialsStore>,
    config: SessionConfig,
    // The lock is held across the whole login flow: concurrent callers wait
    // on a single in-flight attempt and observe the same session or failure.
    cached: Mutex<Option<Session>>,
}

impl SessionManager {
    /// Create a session manager.
    pub fn new(
        user_center: Arc<UserCenterClient>,
        store: Arc<dyn CredentialsStore>,
        config: SessionConfig,
    ) -> Self {
        Self {
            client_auth: ClientAuthenticator::new(user_center.clone()),
            user_center,
            store,
            config,
            cached: Mutex::new(None),
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Return a valid user session.
    ///
    /// Fast path: a cached, unexpired session is returned without any
    /// network traffic. Slow path: the full login flow, including anonymous
    /// user creation and invalid-grant recovery.
    #[instrument(skip(self), fields(subsystem = "auth", component = "session_manager", op = "get_session"))]
    pub async fn get_session(&self) -> Result<Session> {
        let mut cached = self.cached.lock().await;

        if let Some(session) = cached.as_ref() {
            if !session.has_expired() {
                debug!("Reusing cached user session");
                return Ok(session.clone());
            }
            debug!("Cached user session expired");
        }

        let start = Instant::now();
        let session = self.login_flow().await?;
        *cached = Some(session.clone());

        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            "User session established"
        );
        Ok(session)
    }

    /// Run one login flow with at most one credential-recovery cycle.
    async fn login_flow(&self) -> Result<Session> {
        match self.attempt_login().await {
            Err(e) if e.is_invalid_grant() => {
                warn!("Stored credentials rejected, recreating anonymous user");
                self.store.delete().await?;
                let credentials = self.create_anonymous_user().await?;
                // Exactly one retry; a second failure of any kind surfaces.
                self.user_center.login_user(&credentials).await
            }
            other => other,
        }
    }

    /// Obtain credentials (stored, migrated, or freshly created) and log in.
    async fn attempt_login(&self) -> Result<Session> {
        let credentials = match self.store.get().await? {
            Some(stored) => self.migrate_email_domain(stored).await?,
            None => self.create_anonymous_user().await?,
        };
        self.user_center.login_user(&credentials).await
    }

    /// Create a brand-new anonymous user, store its credentials, and return
    /// them. The account is created under a client-level session.
    async fn create_anonymous_user(&self) -> Result<UserCredentials> {
        let credentials = generate_credentials(&self.config.email_domain);
        let client_session = self.client_auth.get_client_session().await?;
        self.user_center
            .create_user(&client_session, &credentials)
            .await?;
        self.store.store(&credentials).await?;
        Ok(credentials)
    }

    /// Rewrite stored credentials onto the configured email domain.
    ///
    /// No-op when the domains already match. Otherwise the existing account
    /// is renamed server-side before any caller observes a session, so a
    /// stale per-installation domain never leaks into new logins.
    async fn migrate_email_domain(&self, stored: UserCredentials) -> Result<UserCredentials> {
        match stored.email_domain() {
            Some(domain) if domain == self.config.email_domain => Ok(stored),
            _ => {
                info!(
                    new_domain = %self.config.email_domain,
                    "Migrating anonymous user to configured email domain"
                );

                let local_part = stored
                    .username
                    .split('@')
                    .next()
                    .filter(|part| !part.is_empty())
                    .ok_or_else(|| {
                        Error::Session(format!(
                            "Stored username {} has no local part",
                            stored.username
                        ))
                    })?;
                let new_username = format!("{}@{}", local_part, self.config.email_domain);

                // The account id is only reachable through a user session.
                let user_session = self.user_center.login_user(&stored).await?;
                let user = self.user_center.current_user(&user_session).await?;

                let client_session = self.client_auth.get_client_session().await?;
                self.user_center
                    .update_email(&client_session, &user.id, &stored.username, &new_username)
                    .await?;

                let migrated = UserCredentials::new(new_username, stored.password.clone());
                self.store.delete().await?;
                self.store.store(&migrated).await?;
                Ok(migrated)
            }
        }
    }
}

/// Generate credentials for a new anonymous user: a random local identifier
/// under the configured domain, and a random password.
fn generate_credentials(email_domain: &str) -> UserCredentials {
    let username = format!("{}@{}", Uuid::new_v4(), email_domain);
    let password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(defaults::GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect();
    UserCredentials::new(username, password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_default_domain() {
        let config = SessionConfig::default();
        assert_eq!(config.email_domain, defaults::EMAIL_DOMAIN);
    }

    #[test]
    fn test_session_config_with_email_domain() {
        let config = SessionConfig::default().with_email_domain("example.org");
        assert_eq!(config.email_domain, "example.org");
    }

    #[test]
    fn test_generated_credentials_use_domain() {
        let creds = generate_credentials("example.org");
        assert_eq!(creds.email_domain(), Some("example.org"));
        assert_eq!(creds.password.len(), defaults::GENERATED_PASSWORD_LEN);
    }

    #[test]
    fn test_generated_credentials_are_unique() {
        let a = generate_credentials("example.org");
        let b = generate_credentials("example.org");
        assert_ne!(a.username, b.username);
        assert_ne!(a.password, b.password);
    }

    #[test]
    fn test_generated_local_part_is_uuid() {
        let creds = generate_credentials("example.org");
        let local = creds.username.split('@').next().unwrap();
        assert!(Uuid::parse_str(local).is_ok());
    }
}
