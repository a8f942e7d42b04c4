use actix_web::{get, web, Responder, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[tracing::instrument(name = "Health check")]
#[get("")]
pub async fn health_check() -> Result<impl Responder> {
    Ok(web::Json(HealthResponse { status: "ok" }))
}
