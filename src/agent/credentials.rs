use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Bearer credential plus the backend it belongs to, as handed over by the
/// account dashboard at connect time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub backend_url: String,
}

/// Where the executor keeps its credential between requests.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Option<Credentials>;
    async fn store(&self, credentials: Credentials);
    async fn clear(&self);
}

pub struct InMemoryCredentialStore {
    inner: RwLock<Option<Credentials>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    pub fn with(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(Some(credentials)),
        }
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> Option<Credentials> {
        self.inner.read().await.clone()
    }

    async fn store(&self, credentials: Credentials) {
        *self.inner.write().await = Some(credentials);
    }

    async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

/// JSON-file store used by the CLI host so a sign-in survives restarts.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Option<Credentials> {
        let raw = tokio::fs::read_to_string(&self.path).await.ok()?;
        serde_json::from_str(&raw).ok()
    }

    async fn store(&self, credentials: Credentials) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = tokio::fs::create_dir_all(parent).await {
                tracing::error!("Failed to create credential directory: {}", err);
                return;
            }
        }
        match serde_json::to_string_pretty(&credentials) {
            Ok(raw) => {
                if let Err(err) = tokio::fs::write(&self.path, raw).await {
                    tracing::error!("Failed to persist credentials: {}", err);
                }
            }
            Err(err) => tracing::error!("Failed to serialize credentials: {}", err),
        }
    }

    async fn clear(&self) {
        if let Err(err) = tokio::fs::remove_file(&self.path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::error!("Failed to remove credentials: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        assert!(store.load().await.is_none());

        store
            .store(Credentials {
                token: "tok".to_string(),
                backend_url: "http://localhost:8000".to_string(),
            })
            .await;
        let loaded = store.load().await.expect("credentials should persist");
        assert_eq!(loaded.token, "tok");

        store.clear().await;
        assert!(store.load().await.is_none());
    }
}
