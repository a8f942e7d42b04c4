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
pub struct StatusResponse {
    pub success: bool,
    pub bookmarked_indices: Vec<i32>,
}

/// Positions of every bookmark this owner holds on one conversation.
/// Serves the extension's per-message saved markers after a page load.
#[tracing::instrument(name = "Bookmark status for conversation", skip(pg_pool))]
#[post("/status")]
pub async fn status_handler(
    owner: web::ReqData<Arc<models::Owner>>,
    form: web::Json<forms::BookmarkStatusForm>,
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

    let conversation = db::conversation::fetch_by_natural_key(
        pg_pool.get_ref(),
        &owner.id,
        provider,
        &form.external_id,
    )
    .await
    .map_err(JsonResponse::internal_server_error)?
    .ok_or_else(|| JsonResponse::not_found("Conversation not synced yet - sync first"))?;

    let bookmarked_indices =
        db::bookmark::positions_for_conversation(pg_pool.get_ref(), &owner.id, conversation.id)
            .await
            .map_err(JsonResponse::internal_server_error)?;

    Ok(web::Json(StatusResponse {
        success: true,
        bookmarked_indices,
    }))
}
