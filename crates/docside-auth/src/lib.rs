//! # docside-auth
//!
//! Anonymous-user session management for the Docside SDK.
//!
//! This crate provides:
//! - The credentials store port and an in-memory implementation
//! - The user-center HTTP gateway (OAuth grants, account administration)
//! - The client authenticator (client-level session cache)
//! - The session manager (user session cache, anonymous-user lifecycle,
//!   invalid-grant recovery, email-domain migration)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docside_auth::{
//!     MemoryCredentialsStore, SessionConfig, SessionManager, UserCenterClient, UserCenterConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> docside_core::Result<()> {
//!     let user_center = Arc::new(UserCenterClient::new(UserCenterConfig::new(
//!         "client-id",
//!         "client-secret",
//!     ))?);
//!     let store = Arc::new(MemoryCredentialsStore::new());
//!     let manager = SessionManager::new(user_center, store, SessionConfig::default());
//!     let session = manager.get_session().await?;
//!     println!("bearer {}", session.access_token());
//!     Ok(())
//! }
//! ```

pub mod client_auth;
pub mod credentials;
pub mod session;
pub mod user_center;

pub use client_auth::ClientAuthenticator;
pub use credentials::{CredentialsStore, MemoryCredentialsStore};
pub use session::{SessionConfig, SessionManager};
pub use user_center::{UserCenterClient, UserCenterConfig, UserInfo};
