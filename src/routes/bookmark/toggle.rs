use crate::db;
use crate::forms;
use crate::helpers::{ErrorCode, JsonResponse};
use crate::models;
use actix_web::{post, web, Responder, Result};
use serde::Serialize;
use serde_valid::Validate;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub success: bool,
    pub bookmarked: bool,
    pub message_index: i32,
}

/// Flip the saved state of the message at a snapshot position.
///
/// The message is resolved by `(conversation, position)` and never by a
/// client-cached row id: row ids are invalidated by every reconciliation.
#[tracing::instrument(name = "Toggle bookmark", skip(pg_pool))]
#[post("")]
pub async fn toggle_handler(
    owner: web::ReqData<Arc<models::Owner>>,
    form: web::Json<forms::BookmarkToggleForm>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::bad_request(
            ErrorCode::MissingFields,
            errors.to_string(),
        ));
    }

    let provider = form
        .parse_provider()
        .map_err(|err| JsonResponse::bad_request(ErrorCode::InvalidProvider, err))?;
    let position = i32::try_from(form.message_index).map_err(|_| {
        JsonResponse::bad_request(ErrorCode::MissingFields, "messageIndex is out of range")
    })?;

    let conversation = db::conversation::fetch_by_natural_key(
        pg_pool.get_ref(),
        &owner.id,
        provider,
        &form.external_id,
    )
    .await
    .map_err(JsonResponse::internal_server_error)?
    .ok_or_else(|| JsonResponse::not_found("Conversation not synced yet - sync first"))?;

    db::message::fetch_by_position(pg_pool.get_ref(), conversation.id, position)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .ok_or_else(|| JsonResponse::not_found("No message at this position - sync first"))?;

    let existing = db::bookmark::fetch(pg_pool.get_ref(), &owner.id, conversation.id, position)
        .await
        .map_err(JsonResponse::internal_server_error)?;

    let bookmarked = match existing {
        Some(_) => {
            db::bookmark::delete(pg_pool.get_ref(), &owner.id, conversation.id, position)
                .await
                .map_err(JsonResponse::internal_server_error)?;
            false
        }
        None => {
            let bookmark = models::Bookmark::new(owner.id.clone(), conversation.id, position);
            db::bookmark::insert(pg_pool.get_ref(), bookmark)
                .await
                .map_err(JsonResponse::internal_server_error)?;
            true
        }
    };

    Ok(web::Json(ToggleResponse {
        success: true,
        bookmarked,
        message_index: position,
    }))
}
