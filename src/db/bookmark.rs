use crate::models;
use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

pub async fn fetch(
    pool: &PgPool,
    owner_id: &str,
    conversation_id: Uuid,
    position: i32,
) -> Result<Option<models::Bookmark>, String> {
    let query_span = tracing::info_span!("Fetching bookmark");
    sqlx::query_as::<_, models::Bookmark>(
        r#"
        SELECT id, owner_id, conversation_id, position, note, created_at
        FROM bookmarks
        WHERE owner_id = $1 AND conversation_id = $2 AND position = $3
        "#,
    )
    .bind(owner_id)
    .bind(conversation_id)
    .bind(position)
    .fetch_optional(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch bookmark: {:?}", err);
        "Database error".to_string()
    })
}

pub async fn insert(pool: &PgPool, bookmark: models::Bookmark) -> Result<models::Bookmark, String> {
    let query_span = tracing::info_span!("Saving bookmark");
    // ON CONFLICT DO NOTHING: two racing toggles settle on "bookmarked"
    // instead of one of them failing the unique constraint.
    sqlx::query(
        r#"
        INSERT INTO bookmarks (id, owner_id, conversation_id, position, note, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (owner_id, conversation_id, position) DO NOTHING
        "#,
    )
    .bind(bookmark.id)
    .bind(&bookmark.owner_id)
    .bind(bookmark.conversation_id)
    .bind(bookmark.position)
    .bind(&bookmark.note)
    .bind(bookmark.created_at)
    .execute(pool)
    .instrument(query_span)
    .await
    .map(move |_| bookmark)
    .map_err(|err| {
        tracing::error!("Failed to insert bookmark: {:?}", err);
        "Failed to insert bookmark".to_string()
    })
}

pub async fn delete(
    pool: &PgPool,
    owner_id: &str,
    conversation_id: Uuid,
    position: i32,
) -> Result<bool, String> {
    let query_span = tracing::info_span!("Deleting bookmark");
    sqlx::query(
        r#"
        DELETE FROM bookmarks
        WHERE owner_id = $1 AND conversation_id = $2 AND position = $3
        "#,
    )
    .bind(owner_id)
    .bind(conversation_id)
    .bind(position)
    .execute(pool)
    .instrument(query_span)
    .await
    .map(|result| result.rows_affected() > 0)
    .map_err(|err| {
        tracing::error!("Failed to delete bookmark: {:?}", err);
        "Failed to delete bookmark".to_string()
    })
}

pub async fn positions_for_conversation(
    pool: &PgPool,
    owner_id: &str,
    conversation_id: Uuid,
) -> Result<Vec<i32>, String> {
    let query_span = tracing::info_span!("Fetching bookmarked positions");
    sqlx::query_as::<_, (i32,)>(
        r#"
        SELECT position FROM bookmarks
        WHERE owner_id = $1 AND conversation_id = $2
        ORDER BY position ASC
        "#,
    )
    .bind(owner_id)
    .bind(conversation_id)
    .fetch_all(pool)
    .instrument(query_span)
    .await
    .map(|rows| rows.into_iter().map(|row| row.0).collect())
    .map_err(|err| {
        tracing::error!("Failed to fetch bookmarked positions: {:?}", err);
        "Database error".to_string()
    })
}

/// Dashboard listing: each bookmark joined with the current message at its
/// position (NULL when the conversation shrank past it) and its conversation.
pub async fn list_with_context(
    pool: &PgPool,
    owner_id: &str,
) -> Result<Vec<models::BookmarkListEntry>, String> {
    let query_span = tracing::info_span!("Listing bookmarks with context");
    sqlx::query_as::<_, models::BookmarkListEntry>(
        r#"
        SELECT b.id, b.conversation_id, b.position, b.note, b.created_at,
               c.provider, c.title AS conversation_title,
               m.role, m.preview
        FROM bookmarks b
        JOIN conversations c ON c.id = b.conversation_id
        LEFT JOIN messages m
               ON m.conversation_id = b.conversation_id AND m.position = b.position
        WHERE b.owner_id = $1
        ORDER BY b.created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to list bookmarks: {:?}", err);
        "Database error".to_string()
    })
}

pub async fn count_for_owner(pool: &PgPool, owner_id: &str) -> Result<i64, String> {
    let query_span = tracing::info_span!("Counting bookmarks");
    sqlx::query_as::<_, (i64,)>(
        r#"
        SELECT COUNT(*) FROM bookmarks WHERE owner_id = $1
        "#,
    )
    .bind(owner_id)
    .fetch_one(pool)
    .instrument(query_span)
    .await
    .map(|row| row.0)
    .map_err(|err| {
        tracing::error!("Failed to count bookmarks: {:?}", err);
        "Database error".to_string()
    })
}
