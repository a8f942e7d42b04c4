use crate::configuration::Settings;
use crate::helpers::{token, ErrorCode, JsonResponse};
use crate::middleware::authentication::{extract_bearer_token, get_header};
use crate::models;
use actix_web::{dev::ServiceRequest, web, Error, HttpMessage};
use std::sync::Arc;

/// Authenticate the request from its bearer token.
///
/// The token is fully verified (signature, expiry, issuer) before any claim
/// is read; the verified subject becomes the owner identity for everything
/// downstream. A client-supplied owner field never reaches a handler.
#[tracing::instrument(name = "Authenticate with bearer token", skip(req))]
pub async fn try_jwt(req: &mut ServiceRequest) -> Result<(), Error> {
    let authorization = get_header::<String>(req, "authorization")
        .map_err(|err| JsonResponse::unauthorized(ErrorCode::MissingToken, err))?
        .ok_or_else(|| {
            JsonResponse::unauthorized(ErrorCode::MissingToken, "Unauthorized - missing token")
        })?;

    let token = extract_bearer_token(&authorization)
        .map_err(|_| {
            JsonResponse::unauthorized(ErrorCode::MissingToken, "Unauthorized - missing token")
        })?
        .to_string();

    let settings = req
        .app_data::<web::Data<Settings>>()
        .ok_or_else(|| JsonResponse::internal_server_error("Settings are not configured"))?;

    let claims = token::verify(&token, &settings.auth.secret, &settings.auth.issuer)
        .map_err(|err| {
            tracing::warn!("Token verification failed: {}", err);
            JsonResponse::unauthorized(ErrorCode::InvalidToken, "Unauthorized - invalid token")
        })?;

    if claims.sub.trim().is_empty() {
        return Err(JsonResponse::unauthorized(
            ErrorCode::MissingUserId,
            "Unauthorized - token has no subject",
        ));
    }

    let owner = models::Owner::new(claims.sub);
    if req.extensions_mut().insert(Arc::new(owner)).is_some() {
        tracing::error!("authentication middleware ran twice for one request");
        return Err(JsonResponse::internal_server_error("Authentication failed"));
    }

    Ok(())
}
