// florist/src/session.rs

//! Stateless customer sessions: `base64url(claims) "." base64url(hmac)`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE_NAME: &str = "florist_session";
const MAX_TOKEN_LEN: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionRejection {
  #[error("Session token is malformed.")]
  Malformed,

  #[error("Session signature does not match.")]
  BadSignature,

  #[error("Session has expired.")]
  Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
  /// Customer id.
  pub sub: Uuid,
  pub email: String,
  pub iat: i64,
  pub exp: i64,
}

impl SessionClaims {
  pub fn new(customer_id: Uuid, email: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
    Self {
      sub: customer_id,
      email: email.to_string(),
      iat: now.timestamp(),
      exp: (now + ttl).timestamp(),
    }
  }

  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    now.timestamp() >= self.exp
  }
}

fn session_mac(secret: &[u8], payload_part: &str) -> HmacSha256 {
  let mut mac = match HmacSha256::new_from_slice(secret) {
    Ok(mac) => mac,
    Err(_) => unreachable!("HMAC-SHA256 accepts any key length"),
  };
  mac.update(payload_part.as_bytes());
  mac
}

pub fn sign_session(claims: &SessionClaims, secret: &[u8]) -> String {
  // Serializing a struct of plain fields cannot fail.
  let payload = serde_json::to_vec(claims).unwrap_or_default();
  let payload_part = URL_SAFE_NO_PAD.encode(payload);
  let sig = session_mac(secret, &payload_part).finalize().into_bytes();
  format!("{}.{}", payload_part, URL_SAFE_NO_PAD.encode(sig))
}

/// Verifies the signature (constant time) and expiry of a session token.
pub fn verify_session(token: &str, secret: &[u8], now: DateTime<Utc>) -> Result<SessionClaims, SessionRejection> {
  if token.len() > MAX_TOKEN_LEN {
    return Err(SessionRejection::Malformed);
  }
  let (payload_part, sig_part) = token.split_once('.').ok_or(SessionRejection::Malformed)?;
  if payload_part.is_empty() || sig_part.is_empty() || sig_part.contains('.') {
    return Err(SessionRejection::Malformed);
  }

  let sig = URL_SAFE_NO_PAD
    .decode(sig_part)
    .map_err(|_| SessionRejection::Malformed)?;
  session_mac(secret, payload_part)
    .verify_slice(&sig)
    .map_err(|_| SessionRejection::BadSignature)?;

  let payload = URL_SAFE_NO_PAD
    .decode(payload_part)
    .map_err(|_| SessionRejection::Malformed)?;
  let claims: SessionClaims = serde_json::from_slice(&payload).map_err(|_| SessionRejection::Malformed)?;

  if claims.is_expired(now) {
    return Err(SessionRejection::Expired);
  }
  Ok(claims)
}
