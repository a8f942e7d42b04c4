mod manager;
mod manager_middleware;
pub(crate) mod method;

pub use manager::*;
pub use manager_middleware::*;

use actix_web::{dev::ServiceRequest, http::header::HeaderName};
use std::str::FromStr;

pub(crate) fn get_header<T>(
    req: &ServiceRequest,
    header_name: &'static str,
) -> Result<Option<T>, String>
where
    T: FromStr,
{
    let header_value = req.headers().get(HeaderName::from_static(header_name));

    match header_value {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map_err(|_| format!("header {header_name} can't be converted to string"))?
            .parse::<T>()
            .map_err(|_| format!("header {header_name} has wrong type"))
            .map(Some),
    }
}

pub(crate) fn extract_bearer_token(authorization: &str) -> Result<&str, String> {
    let mut parts = authorization.splitn(2, ' ');
    match parts.next() {
        Some("Bearer") => {}
        _ => return Err("Expected Bearer scheme in Authorization header".to_string()),
    }
    match parts.next() {
        Some(token) if !token.trim().is_empty() => Ok(token),
        _ => Err("Bearer token is missing".to_string()),
    }
}
