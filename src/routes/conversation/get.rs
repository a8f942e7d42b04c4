use crate::db;
use crate::helpers::{ErrorCode, JsonResponse};
use crate::models;
use actix_web::{get, web, Responder, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub conversations: Vec<models::Conversation>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub success: bool,
    pub conversation: models::Conversation,
    pub messages: Vec<models::Message>,
}

#[tracing::instrument(name = "List conversations", skip(pg_pool))]
#[get("")]
pub async fn list_handler(
    owner: web::ReqData<Arc<models::Owner>>,
    query: web::Query<ListQuery>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    let provider = match query.provider.as_deref() {
        Some(raw) => Some(
            models::Provider::from_str(raw)
                .map_err(|err| JsonResponse::bad_request(ErrorCode::InvalidProvider, err))?,
        ),
        None => None,
    };

    let conversations = db::conversation::fetch_by_owner(pg_pool.get_ref(), &owner.id, provider)
        .await
        .map_err(JsonResponse::internal_server_error)?;

    Ok(web::Json(ListResponse {
        success: true,
        conversations,
    }))
}

/// One conversation with its messages in position order.
#[tracing::instrument(name = "Get conversation", skip(pg_pool))]
#[get("/{id}")]
pub async fn item_handler(
    owner: web::ReqData<Arc<models::Owner>>,
    path: web::Path<(Uuid,)>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    let (id,) = path.into_inner();

    let conversation = db::conversation::fetch_by_id(pg_pool.get_ref(), &owner.id, id)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .ok_or_else(|| JsonResponse::not_found("Conversation not found"))?;

    let messages = db::message::fetch_by_conversation(pg_pool.get_ref(), conversation.id)
        .await
        .map_err(JsonResponse::internal_server_error)?;

    Ok(web::Json(ItemResponse {
        success: true,
        conversation,
        messages,
    }))
}
