//! Credentials store port and the in-memory reference implementation.
//!
//! The store persists the anonymous user's username/password pair across
//! process restarts. Encryption at rest and platform keychain integration
//! are the implementor's concern; the SDK only relies on atomic read/write
//! of the whole pair.

use async_trait::async_trait;
use tokio::sync::Mutex;

use docside_core::{Result, UserCredentials};

/// Port for persisting the anonymous user's credentials.
#[async_trait]
pub trait CredentialsStore: Send + Sync {
    /// Read the stored credential pair, if one exists.
    async fn get(&self) -> Result<Option<UserCredentials>>;

    /// Store a credential pair, replacing any existing one.
    async fn store(&self, credentials: &UserCredentials) -> Result<()>;

    /// Delete the stored credential pair. Deleting an empty store is a no-op.
    async fn delete(&self) -> Result<()>;
}

/// In-memory credentials store.
///
/// The reference implementation for embedding and tests. Credentials do not
/// survive the process; production callers supply a persistent store.
#[derive(Default)]
pub struct MemoryCredentialsStore {
    inner: Mutex<Option<UserCredentials>>,
}

impl MemoryCredentialsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with credentials.
    pub fn with_credentials(credentials: UserCredentials) -> Self {
        Self {
            inner: Mutex::new(Some(credentials)),
        }
    }
}

#[async_trait]
impl CredentialsStore for MemoryCredentialsStore {
    async fn get(&self) -> Result<Option<UserCredentials>> {
        Ok(self.inner.lock().await.clone())
    }

    async fn store(&self, credentials: &UserCredentials) -> Result<()> {
        *self.inner.lock().await = Some(credentials.clone());
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        *self.inner.lock().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_store_returns_none() {
        let store = MemoryCredentialsStore::new();
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_then_get() {
        let store = MemoryCredentialsStore::new();
        let creds = UserCredentials::new("user@docside.io", "secret");
        store.store(&creds).await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(creds));
    }

    #[tokio::test]
    async fn test_store_replaces_existing() {
        let store =
            MemoryCredentialsStore::with_credentials(UserCredentials::new("old@docside.io", "a"));
        let creds = UserCredentials::new("new@docside.io", "b");
        store.store(&creds).await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(creds));
    }

    #[tokio::test]
    async fn test_delete_clears_store() {
        let store =
            MemoryCredentialsStore::with_credentials(UserCredentials::new("user@docside.io", "a"));
        store.delete().await.unwrap();
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_on_empty_store_is_noop() {
        let store = MemoryCredentialsStore::new();
        store.delete().await.unwrap();
        assert!(store.get().await.unwrap().is_none());
    }
}
