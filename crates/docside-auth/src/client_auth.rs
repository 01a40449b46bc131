//! Client-level session cache.
//!
//! User creation and email updates authenticate with a client-level session
//! (`grant_type=client_credentials`), not a user session. This cache follows
//! the same reuse-until-expired rule as the user session cache but is fully
//! independent of it; the two sessions are never shared.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use docside_core::{Result, Session};

use crate::user_center::UserCenterClient;

/// Caches the client-level session used for account administration calls.
///
/// Client credentials are immutable configuration, so expiry simply triggers
/// a re-authentication; there is no recovery logic here.
pub struct ClientAuthenticator {
    user_center: Arc<UserCenterClient>,
    cached: Mutex<Option<Session>>,
}

impl ClientAuthenticator {
    /// Create an authenticator backed by the given gateway.
    pub fn new(user_center: Arc<UserCenterClient>) -> Self {
        Self {
            user_center,
            cached: Mutex::new(None),
        }
    }

    /// Return a valid client session, logging in only when the cached one
    /// is absent or expired.
    ///
    /// The cache lock is held across the login so concurrent callers share
    /// a single in-flight authentication.
    pub async fn get_client_session(&self) -> Result<Session> {
        let mut cached = self.cached.lock().await;

        if let Some(session) = cached.as_ref() {
            if !session.has_expired() {
                debug!(
                    subsystem = "auth",
                    component = "client_auth",
                    "Reusing cached client session"
                );
                return Ok(session.clone());
            }
        }

        let session = self.user_center.login_client().await?;
        *cached = Some(session.clone());
        Ok(session)
    }
}
