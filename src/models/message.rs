use crate::models::Provider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use std::fmt;
use std::str::FromStr;

/// Number of characters of content kept as the list-view preview.
pub const PREVIEW_LEN: usize = 100;

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase", type_name = "varchar")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => f.write_str("user"),
            MessageRole::Assistant => f.write_str("assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// One turn of a conversation as captured at push time.
///
/// `position` is the 0-based index of the turn in its snapshot and is the
/// only addressing that survives a re-sync; the row id does not, since every
/// reconciliation deletes and reinserts all rows of the conversation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub owner_id: String,
    pub provider: Provider,
    pub role: MessageRole,
    pub content: String,
    pub preview: String,
    pub position: i32,
    pub captured_at: DateTime<Utc>,
}

impl Message {
    pub fn preview_of(content: &str) -> String {
        content.chars().take(PREVIEW_LEN).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_content() {
        let content = "x".repeat(500);
        assert_eq!(Message::preview_of(&content).len(), PREVIEW_LEN);
    }

    #[test]
    fn preview_keeps_short_content() {
        assert_eq!(Message::preview_of("hello"), "hello");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let content = "é".repeat(200);
        assert_eq!(Message::preview_of(&content).chars().count(), PREVIEW_LEN);
    }
}
