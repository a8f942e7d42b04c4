use crate::models::Provider;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One externally-owned chat thread known to one owner on one provider.
///
/// `(owner_id, provider, external_id)` is the natural key; the row is
/// created on first push and only its metadata is patched afterwards.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub owner_id: String,
    pub provider: Provider,
    pub external_id: String,
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub message_count: i32,
    pub last_synced_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(owner_id: String, provider: Provider, external_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            provider,
            external_id,
            title: None,
            source_url: None,
            message_count: 0,
            last_synced_at: Utc::now(),
            created_at: Utc::now(),
        }
    }
}
