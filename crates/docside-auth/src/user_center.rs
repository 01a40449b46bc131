//! HTTP gateway for the user-center API.
//!
//! The user center owns anonymous-user accounts and issues OAuth sessions.
//! Two grants are used: `client_credentials` (HTTP Basic with the configured
//! client id/secret) for account administration, and `password` for the
//! per-user session every document operation runs under.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use docside_core::{defaults, Error, Result, Session, UserCredentials};

/// Configuration for the user-center gateway.
#[derive(Debug, Clone)]
pub struct UserCenterConfig {
    /// Base URL of the user-center API.
    pub base_url: String,
    /// OAuth client id (immutable configuration, not user-changeable state).
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for UserCenterConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::USER_CENTER_BASE_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout_seconds: defaults::HTTP_TIMEOUT_SECS,
        }
    }
}

impl UserCenterConfig {
    /// Create a config with the given client credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Self::default()
        }
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DOCSIDE_USER_CENTER_URL` | production endpoint | User-center base URL |
    /// | `DOCSIDE_CLIENT_ID` | *(required)* | OAuth client id |
    /// | `DOCSIDE_CLIENT_SECRET` | *(required)* | OAuth client secret |
    /// | `DOCSIDE_HTTP_TIMEOUT_SECS` | `30` | Request timeout |
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("DOCSIDE_CLIENT_ID")
            .map_err(|_| Error::Config("DOCSIDE_CLIENT_ID is not set".into()))?;
        let client_secret = std::env::var("DOCSIDE_CLIENT_SECRET")
            .map_err(|_| Error::Config("DOCSIDE_CLIENT_SECRET is not set".into()))?;

        let base_url = std::env::var("DOCSIDE_USER_CENTER_URL")
            .unwrap_or_else(|_| defaults::USER_CENTER_BASE_URL.to_string());

        let timeout_seconds = std::env::var("DOCSIDE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::HTTP_TIMEOUT_SECS);

        Ok(Self {
            base_url,
            client_id,
            client_secret,
            timeout_seconds,
        })
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Identity of a user-center account.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    /// Server-issued account id.
    pub id: String,
    /// Current email-like username.
    pub email: String,
}

/// OAuth token response shared by both grants.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: Option<String>,
    expires_in: i64,
}

/// Body of the create-user call.
#[derive(Serialize)]
struct CreateUserRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Body of the email-update call.
#[derive(Serialize)]
struct UpdateEmailRequest<'a> {
    #[serde(rename = "oldEmail")]
    old_email: &'a str,
    email: &'a str,
}

/// HTTP gateway to the user-center API.
pub struct UserCenterClient {
    client: Client,
    config: UserCenterConfig,
}

impl UserCenterClient {
    /// Create a new gateway with the given configuration.
    pub fn new(config: UserCenterConfig) -> Result<Self> {
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(Error::Config(
                "client id and secret must be configured".into(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!("Initializing user-center gateway: url={}", config.base_url);

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &UserCenterConfig {
        &self.config
    }

    /// HTTP Basic authorization value for the configured client id/secret.
    fn basic_auth(&self) -> String {
        let pair = format!("{}:{}", self.config.client_id, self.config.client_secret);
        format!("Basic {}", BASE64.encode(pair))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Obtain a client-level session (`grant_type=client_credentials`).
    #[instrument(skip(self), fields(subsystem = "auth", component = "user_center", op = "login_client"))]
    pub async fn login_client(&self) -> Result<Session> {
        let response = self
            .client
            .post(self.url("/oauth/token"))
            .query(&[("grant_type", "client_credentials")])
            .header("Authorization", self.basic_auth())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::Request(format!("Client login failed: {}", e)))?;

        let token = Self::parse_token_response(response).await?;
        debug!("Client session obtained");
        Ok(token)
    }

    /// Obtain a user session (`grant_type=password`).
    ///
    /// A 400 response carrying `invalid_grant` maps to
    /// [`Error::InvalidGrant`]; the session manager uses that signal to
    /// recover from invalidated credentials.
    #[instrument(skip(self, credentials), fields(subsystem = "auth", component = "user_center", op = "login_user"))]
    pub async fn login_user(&self, credentials: &UserCredentials) -> Result<Session> {
        let response = self
            .client
            .post(self.url("/oauth/token"))
            .query(&[("grant_type", "password")])
            .header("Authorization", self.basic_auth())
            .header("Accept", "application/json")
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Request(format!("User login failed: {}", e)))?;

        Self::parse_token_response(response).await
    }

    /// Create a user-center account for the given credentials.
    ///
    /// Requires a client-level session. Returns the created-resource URI
    /// from the `Location` header.
    #[instrument(skip(self, client_session, credentials), fields(subsystem = "auth", component = "user_center", op = "create_user"))]
    pub async fn create_user(
        &self,
        client_session: &Session,
        credentials: &UserCredentials,
    ) -> Result<String> {
        let body = CreateUserRequest {
            email: &credentials.username,
            password: &credentials.password,
        };

        let response = self
            .client
            .post(self.url("/api/users"))
            .bearer_auth(client_session.access_token())
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Request(format!("User creation failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::status_error("User creation", response).await);
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| {
                Error::Request("User creation response carried no Location header".into())
            })?;

        info!("Created anonymous user account");
        Ok(location)
    }

    /// Fetch the account behind a user session.
    #[instrument(skip(self, user_session), fields(subsystem = "auth", component = "user_center", op = "current_user"))]
    pub async fn current_user(&self, user_session: &Session) -> Result<UserInfo> {
        let response = self
            .client
            .get(self.url("/api/users/me"))
            .bearer_auth(user_session.access_token())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::Request(format!("User info fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::status_error("User info fetch", response).await);
        }

        response
            .json::<UserInfo>()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse user info: {}", e)))
    }

    /// Update an account's email-like username.
    ///
    /// Requires a client-level session; used by the email-domain migration.
    #[instrument(skip(self, client_session), fields(subsystem = "auth", component = "user_center", op = "update_email"))]
    pub async fn update_email(
        &self,
        client_session: &Session,
        user_id: &str,
        old_email: &str,
        new_email: &str,
    ) -> Result<()> {
        let body = UpdateEmailRequest {
            old_email,
            email: new_email,
        };

        let response = self
            .client
            .put(self.url(&format!("/api/users/{}", user_id)))
            .bearer_auth(client_session.access_token())
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Email update failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::status_error("Email update", response).await);
        }

        info!("Updated anonymous user email domain");
        Ok(())
    }

    /// Parse a token response, mapping failures onto the error taxonomy.
    async fn parse_token_response(response: reqwest::Response) -> Result<Session> {
        let status = response.status();

        if status.is_success() {
            let token: TokenResponse = response
                .json()
                .await
                .map_err(|e| Error::Serialization(format!("Failed to parse token: {}", e)))?;
            return Ok(Session::with_expires_in(token.access_token, token.expires_in));
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST && body.contains("invalid_grant") {
            warn!("Login rejected with invalid_grant");
            return Err(Error::InvalidGrant(body));
        }

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Error::Unauthorized(format!("Login returned {}: {}", status, body))
            }
            _ => Error::Request(format!("Login returned {}: {}", status, body)),
        })
    }

    /// Map a non-success response to an error, consuming the body.
    async fn status_error(operation: &str, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Error::Unauthorized(format!("{} returned {}: {}", operation, status, body))
            }
            _ => Error::Request(format!("{} returned {}: {}", operation, status, body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> UserCenterConfig {
        UserCenterConfig::new("client-id", "client-secret")
    }

    #[test]
    fn test_config_default_base_url() {
        let config = test_config();
        assert_eq!(config.base_url, defaults::USER_CENTER_BASE_URL);
        assert_eq!(config.timeout_seconds, defaults::HTTP_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_builder() {
        let config = test_config()
            .with_base_url("http://localhost:9000")
            .with_timeout(5);
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout_seconds, 5);
    }

    #[test]
    fn test_client_requires_credentials() {
        let result = UserCenterClient::new(UserCenterConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_basic_auth_header_value() {
        let client = UserCenterClient::new(test_config()).unwrap();
        // base64("client-id:client-secret")
        assert_eq!(
            client.basic_auth(),
            "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ="
        );
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client =
            UserCenterClient::new(test_config().with_base_url("http://localhost:9000/")).unwrap();
        assert_eq!(client.url("/oauth/token"), "http://localhost:9000/oauth/token");
    }

    #[test]
    fn test_token_response_deserialization() {
        let json = r#"{"access_token": "abc", "token_type": "bearer", "expires_in": 3600}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, 3600);
    }

    #[test]
    fn test_create_user_request_serialization() {
        let body = CreateUserRequest {
            email: "user@docside.io",
            password: "secret",
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"email\":\"user@docside.io\""));
        assert!(json.contains("\"password\":\"secret\""));
    }

    #[test]
    fn test_update_email_request_uses_wire_names() {
        let body = UpdateEmailRequest {
            old_email: "a@old.example",
            email: "a@new.example",
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"oldEmail\":\"a@old.example\""));
        assert!(json.contains("\"email\":\"a@new.example\""));
    }
}
