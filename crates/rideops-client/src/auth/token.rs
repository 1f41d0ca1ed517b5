//! Bearer-token inspection
//!
//! Tokens are JWT-shaped: three dot-separated base64url segments with a JSON
//! payload in the middle. The client never verifies signatures; it only reads
//! the payload to decide whether the token is close to expiry.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use serde::Deserialize;

/// Look-ahead window before expiry that triggers silent renewal
pub const DEFAULT_RENEWAL_WINDOW_SECS: i64 = 600;

/// Claims read from a token payload
///
/// Only the fields the client acts on are modeled; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Expiry as Unix seconds
    #[serde(default)]
    pub exp: Option<i64>,
    /// Subject (user id)
    #[serde(default)]
    pub sub: Option<String>,
}

/// Decode the payload segment of a JWT-shaped token.
///
/// Any structural failure (wrong segment count, invalid base64, non-object
/// payload) yields `None` rather than an error.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return None,
    };
    // Some issuers pad the segment; the engine rejects padding, so strip it.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Whether the token's expiry falls within `window_secs` of now.
///
/// A token without decodable claims or without an `exp` field is treated as
/// not expiring soon.
pub fn expires_within(token: &str, window_secs: i64) -> bool {
    match decode_claims(token).and_then(|claims| claims.exp) {
        // Claims are unverified, so `exp` can be arbitrary; saturate instead
        // of risking overflow on pathological values.
        Some(exp) => exp.saturating_sub(Utc::now().timestamp()) < window_secs,
        None => false,
    }
}

#[cfg(test)]
pub(crate) fn encode_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    let signature = URL_SAFE_NO_PAD.encode(b"signature");
    format!("{header}.{payload}.{signature}")
}
