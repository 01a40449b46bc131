//! Document processing client for the Docside service.
//!
//! Wraps the documents API behind [`DocumentManager`], which chains uploads
//! with metadata fetches, polls pending documents with per-document
//! cancellation, cascades deletes through composite parents, and maps wire
//! extractions into the typed model.
//!
//! ```no_run
//! use std::sync::Arc;
//! use docside_auth::{MemoryCredentialsStore, SessionConfig, SessionManager, UserCenterClient, UserCenterConfig};
//! use docside_client::{DocumentManager, DocumentsClient, DocumentsConfig};
//!
//! # async fn run() -> docside_core::Result<()> {
//! let user_center = Arc::new(UserCenterClient::new(UserCenterConfig::from_env()?)?);
//! let sessions = Arc::new(SessionManager::new(
//!     user_center,
//!     Arc::new(MemoryCredentialsStore::new()),
//!     SessionConfig::default(),
//! ));
//! let api = Arc::new(DocumentsClient::new(DocumentsConfig::from_env())?);
//! let manager = DocumentManager::new(api, sessions);
//!
//! let bytes = std::fs::read("invoice.pdf").map_err(|e| docside_core::Error::Config(e.to_string()))?;
//! let document = manager
//!     .create_partial_document(bytes, "application/pdf", Some("invoice.pdf"), None)
//!     .await?;
//! let processed = manager.poll_document(&document).await?;
//! let extractions = manager.get_extractions(&processed).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod extractions;
pub mod manager;
pub mod polling;

pub use api::{DocumentsClient, DocumentsConfig};
pub use manager::{normalize_rotation, DocumentManager};
pub use polling::PollingCoordinator;
