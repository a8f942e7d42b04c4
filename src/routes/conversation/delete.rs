use crate::db;
use crate::helpers::JsonResponse;
use crate::models;
use actix_web::{delete, web, Responder, Result};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// The only path that removes a conversation; messages and bookmarks cascade
/// with it.
#[tracing::instrument(name = "Delete conversation", skip(pg_pool))]
#[delete("/{id}")]
pub async fn item_handler(
    owner: web::ReqData<Arc<models::Owner>>,
    path: web::Path<(Uuid,)>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    let (id,) = path.into_inner();

    let deleted = db::conversation::delete(pg_pool.get_ref(), &owner.id, id)
        .await
        .map_err(JsonResponse::internal_server_error)?;

    if !deleted {
        return Err(JsonResponse::not_found("Conversation not found"));
    }

    tracing::info!("Conversation {} deleted", id);
    Ok(web::Json(DeleteResponse { success: true }))
}
