// tests/session_tests.rs
mod common;

use chrono::Duration;
use common::*;
use florist::{sign_session, verify_session, SessionClaims, SessionRejection};
use uuid::Uuid;

#[test]
fn signed_session_verifies_until_expiry() {
  let now = utc(2025, 3, 13, 9, 0);
  let claims = SessionClaims::new(Uuid::new_v4(), "ayse@example.com", now, Duration::days(30));
  let token = sign_session(&claims, SESSION_SECRET);

  assert!(!token.contains('='), "base64url without padding");
  assert_eq!(verify_session(&token, SESSION_SECRET, now + Duration::days(1)), Ok(claims.clone()));
  assert_eq!(
    verify_session(&token, SESSION_SECRET, now + Duration::days(30)),
    Err(SessionRejection::Expired)
  );
}

#[test]
fn tampered_or_foreign_tokens_are_rejected() {
  let now = utc(2025, 3, 13, 9, 0);
  let claims = SessionClaims::new(Uuid::new_v4(), "ayse@example.com", now, Duration::days(30));
  let token = sign_session(&claims, SESSION_SECRET);

  assert_eq!(
    verify_session(&token, b"another-secret", now),
    Err(SessionRejection::BadSignature)
  );

  let forged_claims = SessionClaims::new(Uuid::new_v4(), "mallory@example.com", now, Duration::days(30));
  let forged = sign_session(&forged_claims, b"mallory");
  let (_, original_sig) = token.split_once('.').expect("two parts");
  let (forged_payload, _) = forged.split_once('.').expect("two parts");
  assert_eq!(
    verify_session(&format!("{forged_payload}.{original_sig}"), SESSION_SECRET, now),
    Err(SessionRejection::BadSignature)
  );
}

#[test]
fn malformed_tokens_are_rejected() {
  let now = utc(2025, 3, 13, 9, 0);
  for bad in ["", "abc", "abc.", ".abc", "a.b.c", "!!!.???"] {
    assert_eq!(verify_session(bad, SESSION_SECRET, now), Err(SessionRejection::Malformed), "{bad}");
  }
}
