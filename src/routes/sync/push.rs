use crate::db;
use crate::forms;
use crate::helpers::{ErrorCode, JsonResponse};
use crate::models;
use actix_web::{post, web, Responder, Result};
use serde::Serialize;
use serde_valid::Validate;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,
    pub conversation_id: Uuid,
}

/// Accept one snapshot and reconcile it into the store.
///
/// The owner identity comes exclusively from the verified token the
/// authentication middleware resolved; nothing in the body names an owner.
#[tracing::instrument(name = "Sync conversation snapshot", skip(form, pg_pool))]
#[post("")]
pub async fn push_handler(
    owner: web::ReqData<Arc<models::Owner>>,
    form: web::Json<forms::SyncForm>,
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

    let conversation =
        db::conversation::upsert_snapshot(pg_pool.get_ref(), &owner.id, provider, &form)
            .await
            .map_err(JsonResponse::internal_server_error)?;

    tracing::info!(
        "Conversation {} reconciled with {} messages",
        conversation.id,
        conversation.message_count
    );

    Ok(web::Json(SyncResponse {
        success: true,
        conversation_id: conversation.id,
    }))
}
