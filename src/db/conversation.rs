use crate::forms;
use crate::models;
use chrono::Utc;
use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

pub async fn fetch_by_natural_key(
    pool: &PgPool,
    owner_id: &str,
    provider: models::Provider,
    external_id: &str,
) -> Result<Option<models::Conversation>, String> {
    let query_span = tracing::info_span!("Fetching conversation by natural key");
    sqlx::query_as::<_, models::Conversation>(
        r#"
        SELECT id, owner_id, provider, external_id, title, source_url,
               message_count, last_synced_at, created_at
        FROM conversations
        WHERE owner_id = $1 AND provider = $2 AND external_id = $3
        "#,
    )
    .bind(owner_id)
    .bind(provider)
    .bind(external_id)
    .fetch_optional(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch conversation: {:?}", err);
        "Database error".to_string()
    })
}

pub async fn fetch_by_id(
    pool: &PgPool,
    owner_id: &str,
    id: Uuid,
) -> Result<Option<models::Conversation>, String> {
    let query_span = tracing::info_span!("Fetching conversation by id");
    sqlx::query_as::<_, models::Conversation>(
        r#"
        SELECT id, owner_id, provider, external_id, title, source_url,
               message_count, last_synced_at, created_at
        FROM conversations
        WHERE id = $1 AND owner_id = $2
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch conversation: {:?}", err);
        "Database error".to_string()
    })
}

pub async fn fetch_by_owner(
    pool: &PgPool,
    owner_id: &str,
    provider: Option<models::Provider>,
) -> Result<Vec<models::Conversation>, String> {
    let query_span = tracing::info_span!("Fetching conversations for owner");
    let result = match provider {
        Some(provider) => {
            sqlx::query_as::<_, models::Conversation>(
                r#"
                SELECT id, owner_id, provider, external_id, title, source_url,
                       message_count, last_synced_at, created_at
                FROM conversations
                WHERE owner_id = $1 AND provider = $2
                ORDER BY last_synced_at DESC
                "#,
            )
            .bind(owner_id)
            .bind(provider)
            .fetch_all(pool)
            .instrument(query_span)
            .await
        }
        None => {
            sqlx::query_as::<_, models::Conversation>(
                r#"
                SELECT id, owner_id, provider, external_id, title, source_url,
                       message_count, last_synced_at, created_at
                FROM conversations
                WHERE owner_id = $1
                ORDER BY last_synced_at DESC
                "#,
            )
            .bind(owner_id)
            .fetch_all(pool)
            .instrument(query_span)
            .await
        }
    };

    result.map_err(|err| {
        tracing::error!("Failed to list conversations: {:?}", err);
        "Database error".to_string()
    })
}

/// Reconcile one snapshot into the store.
///
/// Upserts the conversation by its natural key, then replaces its full
/// message set with the snapshot's, all inside one transaction so a crash
/// mid-push can never leave a half-written conversation behind. `position`
/// is assigned from array order; concurrent pushes of the same conversation
/// serialize on the natural-key unique constraint, last writer wins.
#[tracing::instrument(name = "Reconcile snapshot", skip(pool, form))]
pub async fn upsert_snapshot(
    pool: &PgPool,
    owner_id: &str,
    provider: models::Provider,
    form: &forms::SyncForm,
) -> Result<models::Conversation, String> {
    let now = Utc::now();

    let mut tx = pool.begin().await.map_err(|err| {
        tracing::error!("Failed to start transaction: {:?}", err);
        format!("Failed to start transaction: {}", err)
    })?;

    let conversation = sqlx::query_as::<_, models::Conversation>(
        r#"
        INSERT INTO conversations (id, owner_id, provider, external_id, title,
                                   source_url, message_count, last_synced_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        ON CONFLICT (owner_id, provider, external_id) DO UPDATE SET
            title = COALESCE(EXCLUDED.title, conversations.title),
            source_url = COALESCE(EXCLUDED.source_url, conversations.source_url),
            message_count = EXCLUDED.message_count,
            last_synced_at = EXCLUDED.last_synced_at
        RETURNING id, owner_id, provider, external_id, title, source_url,
                  message_count, last_synced_at, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(provider)
    .bind(&form.external_id)
    .bind(&form.title)
    .bind(&form.url)
    .bind(form.messages.len() as i32)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|err| {
        tracing::error!("Failed to upsert conversation: {:?}", err);
        "Failed to upsert conversation".to_string()
    })?;

    // Full replacement: the previous message set is gone regardless of
    // how much of it the new snapshot repeats.
    sqlx::query(
        r#"
        DELETE FROM messages WHERE conversation_id = $1
        "#,
    )
    .bind(conversation.id)
    .execute(&mut *tx)
    .await
    .map_err(|err| {
        tracing::error!("Failed to clear messages: {:?}", err);
        "Failed to clear messages".to_string()
    })?;

    for (position, message) in form.messages.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, owner_id, provider, role,
                                  content, preview, position, captured_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(conversation.id)
        .bind(owner_id)
        .bind(provider)
        .bind(message.role)
        .bind(&message.content)
        .bind(models::Message::preview_of(&message.content))
        .bind(position as i32)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            tracing::error!("Failed to insert message at {}: {:?}", position, err);
            "Failed to insert messages".to_string()
        })?;
    }

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit transaction: {:?}", err);
        format!("Failed to commit transaction: {}", err)
    })?;

    Ok(conversation)
}

/// Owner-initiated delete. Messages and bookmarks go with the conversation
/// through the ON DELETE CASCADE constraints.
pub async fn delete(pool: &PgPool, owner_id: &str, id: Uuid) -> Result<bool, String> {
    let query_span = tracing::info_span!("Deleting conversation");
    sqlx::query(
        r#"
        DELETE FROM conversations WHERE id = $1 AND owner_id = $2
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .instrument(query_span)
    .await
    .map(|result| result.rows_affected() > 0)
    .map_err(|err| {
        tracing::error!("Failed to delete conversation: {:?}", err);
        "Failed to delete conversation".to_string()
    })
}

pub async fn count_by_provider(
    pool: &PgPool,
    owner_id: &str,
) -> Result<Vec<(models::Provider, i64)>, String> {
    let query_span = tracing::info_span!("Counting conversations per provider");
    sqlx::query_as::<_, (models::Provider, i64)>(
        r#"
        SELECT provider, COUNT(*) FROM conversations
        WHERE owner_id = $1
        GROUP BY provider
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to count conversations: {:?}", err);
        "Database error".to_string()
    })
}

pub async fn total_messages(pool: &PgPool, owner_id: &str) -> Result<i64, String> {
    let query_span = tracing::info_span!("Summing message counts");
    sqlx::query_as::<_, (i64,)>(
        r#"
        SELECT COALESCE(SUM(message_count), 0)::BIGINT FROM conversations
        WHERE owner_id = $1
        "#,
    )
    .bind(owner_id)
    .fetch_one(pool)
    .instrument(query_span)
    .await
    .map(|row| row.0)
    .map_err(|err| {
        tracing::error!("Failed to sum message counts: {:?}", err);
        "Database error".to_string()
    })
}
