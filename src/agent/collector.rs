use crate::models::{MessageRole, Provider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One complete, ordered capture of a conversation at collection time.
/// Serializes to exactly the `/sync` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub provider: Provider,
    pub external_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub messages: Vec<SnapshotMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotMessage {
    pub role: MessageRole,
    pub content: String,
    pub index: i64,
}

#[derive(thiserror::Error, Debug)]
pub enum CollectError {
    #[error("no conversation is present in the source")]
    NoConversation,
    #[error("failed to read the source: {0}")]
    Source(String),
}

/// The seam between the core and whatever observes the live transcript.
/// The scheduler depends only on this contract, never on page markup.
#[async_trait]
pub trait ChangeCollector: Send + Sync {
    async fn collect(&self) -> Result<Snapshot, CollectError>;
}

/// Collector that reads a snapshot JSON file produced by an external
/// capture step. This is what the CLI host observes.
pub struct FileCollector {
    path: PathBuf,
}

impl FileCollector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ChangeCollector for FileCollector {
    async fn collect(&self) -> Result<Snapshot, CollectError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| CollectError::Source(err.to_string()))?;
        let snapshot: Snapshot =
            serde_json::from_str(&raw).map_err(|err| CollectError::Source(err.to_string()))?;
        if snapshot.messages.is_empty() {
            return Err(CollectError::NoConversation);
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_serializes_to_wire_shape() {
        let snapshot = Snapshot {
            provider: Provider::Chatgpt,
            external_id: "abc".to_string(),
            title: Some("Greetings".to_string()),
            url: None,
            messages: vec![SnapshotMessage {
                role: MessageRole::User,
                content: "Hi".to_string(),
                index: 0,
            }],
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["provider"], "chatgpt");
        assert_eq!(value["externalId"], "abc");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["index"], 0);
        assert!(value.get("url").is_none());
    }
}
