// storefront/src/services/auth_service.rs

//! Password hashing and the customer session cookie.

use crate::config::AppConfig;
use crate::errors::AppError;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use chrono::{DateTime, Duration, Utc};
use florist::{sign_session, SessionClaims, SESSION_COOKIE_NAME};
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Hashes a plain-text password using Argon2 with a random salt.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(AppError::Validation(format!(
      "Şifre en az {} karakter olmalıdır.",
      MIN_PASSWORD_LEN
    )));
  }

  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(password.as_bytes(), &salt) {
    Ok(hash) => {
      debug!("Password hashed successfully.");
      Ok(hash.to_string())
    }
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(AppError::Internal(format!("Password hashing process failed: {}", argon_err)))
    }
  }
}

/// Verifies a plain-text password against a stored Argon2 hash.
///
/// Returns `Ok(false)` on a mismatch; a corrupt stored hash is an internal error.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool, AppError> {
  if stored_hash.is_empty() || provided_password.is_empty() {
    return Ok(false);
  }

  let parsed_hash = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: Passwords do not match.");
      Ok(false)
    }
    Err(other) => {
      error!(error = %other, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!("Password verification process failed: {}", other)))
    }
  }
}

/// Signed session cookie for `customer_id`, valid for the configured number of days.
pub fn session_cookie(config: &AppConfig, customer_id: Uuid, email: &str, now: DateTime<Utc>) -> Cookie<'static> {
  let claims = SessionClaims::new(customer_id, email, now, Duration::days(config.session_ttl_days));
  let token = sign_session(&claims, config.session_secret.as_bytes());
  Cookie::build(SESSION_COOKIE_NAME, token)
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .secure(config.site_base_url.starts_with("https://"))
    .max_age(CookieDuration::days(config.session_ttl_days))
    .finish()
}

pub fn cleared_session_cookie() -> Cookie<'static> {
  let mut cookie = Cookie::build(SESSION_COOKIE_NAME, "")
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .finish();
  cookie.make_removal();
  cookie
}
