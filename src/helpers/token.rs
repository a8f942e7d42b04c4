use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub exp: i64,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not a header.payload.signature triple")]
    Malformed,
    #[error("unsupported signing algorithm")]
    Algorithm,
    #[error("signature verification failed")]
    Signature,
    #[error("token expired")]
    Expired,
    #[error("unexpected issuer")]
    Issuer,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Verify an HS256 bearer token and return its claims.
///
/// The signature is checked before the payload is even parsed; claims read
/// out of an unverified token must never gate a privileged operation.
pub fn verify(token: &str, secret: &str, issuer: &str) -> Result<Claims, TokenError> {
    let mut parts = token.split('.');
    let (header_b64, payload_b64, signature_b64) =
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(s), None) => (h, p, s),
            _ => return Err(TokenError::Malformed),
        };

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|_| TokenError::Malformed)?;
    let header: Header =
        serde_json::from_slice(&header_bytes).map_err(|_| TokenError::Malformed)?;
    if header.alg != "HS256" {
        return Err(TokenError::Algorithm);
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| TokenError::Malformed)?;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::Signature)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::Signature)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| TokenError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

    if claims.exp < Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }
    if claims.iss != issuer {
        return Err(TokenError::Issuer);
    }

    Ok(claims)
}

/// Mint an HS256 token for the given claims. Used by the test harness and
/// local tooling; production tokens come from the account service.
pub fn sign(claims: &Claims, secret: &str) -> String {
    let header = Header {
        alg: "HS256".to_string(),
        typ: Some("JWT".to_string()),
    };
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).expect("header is serializable"));
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims are serializable"));

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    format!("{}.{}.{}", header_b64, payload_b64, signature_b64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "test-secret";
    const ISSUER: &str = "chatvault";

    fn claims(expires_in: Duration) -> Claims {
        Claims {
            sub: "user_123".to_string(),
            iss: ISSUER.to_string(),
            exp: (Utc::now() + expires_in).timestamp(),
        }
    }

    #[test]
    fn round_trips_valid_token() {
        let token = sign(&claims(Duration::minutes(30)), SECRET);
        let verified = verify(&token, SECRET, ISSUER).expect("token should verify");
        assert_eq!(verified.sub, "user_123");
    }

    #[test]
    fn rejects_tampered_signature() {
        let token = sign(&claims(Duration::minutes(30)), SECRET);
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(b"forged");
        parts[2] = &forged;
        let tampered = parts.join(".");
        assert_eq!(verify(&tampered, SECRET, ISSUER), Err(TokenError::Signature));
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = sign(&claims(Duration::minutes(30)), "other-secret");
        assert_eq!(verify(&token, SECRET, ISSUER), Err(TokenError::Signature));
    }

    #[test]
    fn rejects_tampered_payload() {
        let token = sign(&claims(Duration::minutes(30)), SECRET);
        let parts: Vec<&str> = token.split('.').collect();
        let other = Claims {
            sub: "user_456".to_string(),
            iss: ISSUER.to_string(),
            exp: (Utc::now() + Duration::minutes(30)).timestamp(),
        };
        let forged_payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&other).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert_eq!(verify(&forged, SECRET, ISSUER), Err(TokenError::Signature));
    }

    #[test]
    fn rejects_expired_token() {
        let token = sign(&claims(Duration::minutes(-5)), SECRET);
        assert_eq!(verify(&token, SECRET, ISSUER), Err(TokenError::Expired));
    }

    #[test]
    fn rejects_foreign_issuer() {
        let mut c = claims(Duration::minutes(30));
        c.iss = "someone-else".to_string();
        let token = sign(&c, SECRET);
        assert_eq!(verify(&token, SECRET, ISSUER), Err(TokenError::Issuer));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(verify("not-a-token", SECRET, ISSUER), Err(TokenError::Malformed));
        assert_eq!(verify("a.b.c", SECRET, ISSUER), Err(TokenError::Malformed));
    }
}
