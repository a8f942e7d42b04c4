use crate::db;
use crate::helpers::JsonResponse;
use crate::models;
use actix_web::{get, web, Responder, Result};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub bookmarks: Vec<models::BookmarkListEntry>,
}

#[tracing::instrument(name = "List bookmarks", skip(pg_pool))]
#[get("")]
pub async fn list_handler(
    owner: web::ReqData<Arc<models::Owner>>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    let bookmarks = db::bookmark::list_with_context(pg_pool.get_ref(), &owner.id)
        .await
        .map_err(JsonResponse::internal_server_error)?;

    Ok(web::Json(ListResponse {
        success: true,
        bookmarks,
    }))
}
