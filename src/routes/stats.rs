use crate::db;
use crate::helpers::JsonResponse;
use crate::models;
use actix_web::{get, web, Responder, Result};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub success: bool,
    pub total_conversations: i64,
    pub total_messages: i64,
    pub total_bookmarks: i64,
    pub by_provider: HashMap<models::Provider, i64>,
}

/// Dashboard headline numbers for the signed-in owner.
#[tracing::instrument(name = "Owner stats", skip(pg_pool))]
#[get("")]
pub async fn stats_handler(
    owner: web::ReqData<Arc<models::Owner>>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    let per_provider = db::conversation::count_by_provider(pg_pool.get_ref(), &owner.id)
        .await
        .map_err(JsonResponse::internal_server_error)?;
    let total_messages = db::conversation::total_messages(pg_pool.get_ref(), &owner.id)
        .await
        .map_err(JsonResponse::internal_server_error)?;
    let total_bookmarks = db::bookmark::count_for_owner(pg_pool.get_ref(), &owner.id)
        .await
        .map_err(JsonResponse::internal_server_error)?;

    let total_conversations = per_provider.iter().map(|(_, count)| count).sum();
    let by_provider: HashMap<models::Provider, i64> = per_provider.into_iter().collect();

    Ok(web::Json(StatsResponse {
        success: true,
        total_conversations,
        total_messages,
        total_bookmarks,
        by_provider,
    }))
}
