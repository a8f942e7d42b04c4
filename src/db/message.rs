use crate::models;
use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

pub async fn fetch_by_conversation(
    pool: &PgPool,
    conversation_id: Uuid,
) -> Result<Vec<models::Message>, String> {
    let query_span = tracing::info_span!("Fetching messages for conversation");
    sqlx::query_as::<_, models::Message>(
        r#"
        SELECT id, conversation_id, owner_id, provider, role, content,
               preview, position, captured_at
        FROM messages
        WHERE conversation_id = $1
        ORDER BY position ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch messages: {:?}", err);
        "Database error".to_string()
    })
}

pub async fn fetch_by_position(
    pool: &PgPool,
    conversation_id: Uuid,
    position: i32,
) -> Result<Option<models::Message>, String> {
    let query_span = tracing::info_span!("Fetching message by position");
    sqlx::query_as::<_, models::Message>(
        r#"
        SELECT id, conversation_id, owner_id, provider, role, content,
               preview, position, captured_at
        FROM messages
        WHERE conversation_id = $1 AND position = $2
        "#,
    )
    .bind(conversation_id)
    .bind(position)
    .fetch_optional(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch message by position: {:?}", err);
        "Database error".to_string()
    })
}
