//! Request signing for the v1.1 API.
//!
//! Every request carries `t` (epoch milliseconds), a random `nonce` and
//! `sign = base64(HMAC-SHA256(secret, token + t + nonce))`.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

/// Authentication headers for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub sign: String,
    pub nonce: String,
    pub t: String,
}

/// Compute the signature for the given timestamp and nonce.
#[must_use]
pub fn sign(token: &str, secret: &str, t: &str, nonce: &str) -> String {
    let payload = format!("{token}{t}{nonce}");
    let mac = hmac_sha256::HMAC::mac(payload.as_bytes(), secret.as_bytes());
    BASE64.encode(mac)
}

/// Sign a request issued at `t_millis` with a fresh nonce.
#[must_use]
pub fn signed_headers(token: &str, secret: &str, t_millis: i64) -> SignedHeaders {
    let nonce = uuid::Uuid::new_v4().to_string();
    let t = t_millis.to_string();
    SignedHeaders {
        sign: sign(token, secret, &t, &nonce),
        nonce,
        t,
    }
}
