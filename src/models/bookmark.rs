use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// An owner's durable marker on one message.
///
/// Keyed by `(owner_id, conversation_id, position)` rather than by a message
/// row id: message rows are destroyed and recreated on every reconciliation,
/// so position is the only reference that stays resolvable across pushes.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Bookmark {
    pub id: Uuid,
    pub owner_id: String,
    pub conversation_id: Uuid,
    pub position: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(owner_id: String, conversation_id: Uuid, position: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            conversation_id,
            position,
            note: None,
            created_at: Utc::now(),
        }
    }
}

/// A bookmark joined with its conversation and the message currently at its
/// position. The message columns are NULL when the latest snapshot is shorter
/// than the bookmarked position.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BookmarkListEntry {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub position: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub provider: crate::models::Provider,
    pub conversation_title: Option<String>,
    pub role: Option<crate::models::MessageRole>,
    pub preview: Option<String>,
}
