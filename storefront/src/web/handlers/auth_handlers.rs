// storefront/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use florist::otp::{normalize_email, resend_wait_secs, RESEND_COOLDOWN_SECS};
use florist::{can_resend, ContextData, OtpPurpose, OtpRecord, OtpRejection};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::db;
use crate::errors::AppError;
use crate::models::Customer;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::RegisterCtxData;
use crate::services::{auth_service, email};
use crate::state::AppState;
use crate::web::extractors::CustomerSession;

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
pub struct OtpRequestPayload {
  pub email: String,
  pub purpose: OtpPurpose,
}

#[derive(Deserialize)]
pub struct OtpVerifyPayload {
  pub email: String,
  pub purpose: OtpPurpose,
  pub code: String,
  // Registration:
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub phone: Option<String>,
  /// Optional at registration, required for a password reset.
  #[serde(default)]
  pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginPayload {
  pub email: String,
  pub password: String,
}

/// Lowercased, trimmed email, or a validation error when it cannot be an address.
pub(crate) fn checked_email(raw: &str) -> Result<String, AppError> {
  let email = normalize_email(raw);
  let valid = match email.split_once('@') {
    Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !email.contains(' '),
    None => false,
  };
  if !valid {
    return Err(AppError::Validation("Geçerli bir e-posta adresi girin.".to_string()));
  }
  Ok(email)
}

fn check_password_len(password: &str) -> Result<(), AppError> {
  if password.chars().count() < auth_service::MIN_PASSWORD_LEN {
    return Err(AppError::Validation(format!(
      "Şifre en az {} karakter olmalıdır.",
      auth_service::MIN_PASSWORD_LEN
    )));
  }
  Ok(())
}

/// Input the code's purpose will need, checked before the code is spent.
pub(crate) fn check_purpose_input(payload: &OtpVerifyPayload) -> Result<(), AppError> {
  match payload.purpose {
    OtpPurpose::Login => Ok(()),
    OtpPurpose::Registration => {
      if payload.name.as_deref().unwrap_or_default().trim().is_empty() {
        return Err(AppError::Validation("Ad soyad zorunludur.".to_string()));
      }
      match payload.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => check_password_len(password),
        None => Ok(()),
      }
    }
    OtpPurpose::PasswordReset => check_password_len(payload.password.as_deref().unwrap_or_default()),
  }
}

fn signed_in_response(app_state: &AppState, customer: &Customer, status: actix_web::http::StatusCode) -> HttpResponse {
  let cookie = auth_service::session_cookie(&app_state.config, customer.id, &customer.email, Utc::now());
  HttpResponse::build(status)
    .cookie(cookie)
    .json(json!({ "success": true, "customer": customer }))
}

/// Emails a fresh one-time code. Older unconsumed codes for the same email and purpose are dropped.
#[instrument(name = "handler::request_otp", skip(app_state, payload), fields(purpose = %payload.purpose), err(Display))]
pub async fn request_otp_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<OtpRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let email_addr = checked_email(&payload.email)?;
  let purpose = payload.purpose;
  let now = Utc::now();

  let exists = db::customers::email_exists(&app_state.db_pool, &email_addr).await?;
  match purpose {
    OtpPurpose::Registration if exists => {
      return Err(AppError::Conflict(
        "Bu e-posta adresiyle kayıtlı bir hesap zaten var.".to_string(),
      ))
    }
    OtpPurpose::Login | OtpPurpose::PasswordReset if !exists => {
      return Err(AppError::NotFound(
        "Bu e-posta adresiyle kayıtlı bir hesap bulunamadı.".to_string(),
      ))
    }
    _ => {}
  }

  if let Some(previous) = db::otps::latest_open(&app_state.db_pool, &email_addr, purpose).await? {
    if !can_resend(previous.last_sent_at, now) {
      return Err(
        OtpRejection::Cooldown {
          retry_after_secs: resend_wait_secs(previous.last_sent_at, now),
        }
        .into(),
      );
    }
  }

  let (record, code) = OtpRecord::issue(app_state.config.otp_secret.as_bytes(), &email_addr, purpose, now);
  let mut tx = app_state.db_pool.begin().await?;
  db::otps::replace_open(&mut tx, &record).await?;
  tx.commit().await?;

  common_steps::send_email(&app_state, &email::otp_code_email(&email_addr, &code, purpose)).await?;
  info!(otp_id = %record.id, "One-time code issued.");

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "expiresAt": record.expires_at,
    "resendAfterSecs": RESEND_COOLDOWN_SECS,
  })))
}

/// Checks a one-time code and performs its purpose: sign-in, account creation
/// or password reset. The attempt is stored whether or not the code matched.
#[instrument(name = "handler::verify_otp", skip(app_state, payload), fields(purpose = %payload.purpose), err(Display))]
pub async fn verify_otp_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<OtpVerifyPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let email_addr = checked_email(&payload.email)?;
  let now = Utc::now();

  // Fail before spending an attempt.
  check_purpose_input(&payload)?;

  let mut tx = app_state.db_pool.begin().await?;
  let mut record = db::otps::lock_latest_open(&mut tx, &email_addr, payload.purpose)
    .await?
    .ok_or(OtpRejection::NotFound)?;
  let loaded_attempts = record.attempts;
  let verdict = record.verify(app_state.config.otp_secret.as_bytes(), &payload.code, now);
  let saved = db::otps::save_verification(&mut *tx, &record, loaded_attempts).await?;
  tx.commit().await?;
  if let Err(rejection) = verdict {
    warn!(otp_id = %record.id, attempts = record.attempts, "One-time code rejected.");
    return Err(rejection.into());
  }
  if !saved {
    return Err(OtpRejection::AlreadyUsed.into());
  }

  match payload.purpose {
    OtpPurpose::Login => {
      let customer = db::customers::find_by_email(&app_state.db_pool, &email_addr)
        .await?
        .ok_or_else(|| AppError::NotFound("Bu e-posta adresiyle kayıtlı bir hesap bulunamadı.".to_string()))?;
      db::customers::record_login(&app_state.db_pool, customer.id, true, now).await?;
      info!(customer_id = %customer.id, "Customer signed in with a one-time code.");
      Ok(signed_in_response(&app_state, &customer, actix_web::http::StatusCode::OK))
    }
    OtpPurpose::Registration => {
      let name = payload.name.unwrap_or_default();
      let ctx = ContextData::new(RegisterCtxData::new(
        app_state.get_ref().clone(),
        email_addr,
        name,
        payload.phone.filter(|p| !p.trim().is_empty()),
        payload.password.filter(|p| !p.is_empty()),
        now,
      ));
      app_state.workflows.register_customer.run(ctx.clone()).await?;
      let customer = ctx
        .read()
        .customer
        .clone()
        .ok_or_else(|| AppError::Internal("Registration completed without a customer.".to_string()))?;
      Ok(signed_in_response(&app_state, &customer, actix_web::http::StatusCode::CREATED))
    }
    OtpPurpose::PasswordReset => {
      let customer = db::customers::find_by_email(&app_state.db_pool, &email_addr)
        .await?
        .ok_or_else(|| AppError::NotFound("Bu e-posta adresiyle kayıtlı bir hesap bulunamadı.".to_string()))?;
      let hash = auth_service::hash_password(payload.password.as_deref().unwrap_or_default())?;
      db::customers::set_password_hash(&app_state.db_pool, customer.id, &hash).await?;
      db::customers::record_login(&app_state.db_pool, customer.id, true, now).await?;
      info!(customer_id = %customer.id, "Password reset.");
      Ok(signed_in_response(&app_state, &customer, actix_web::http::StatusCode::OK))
    }
  }
}

#[instrument(name = "handler::login", skip(app_state, payload), err(Display))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  let invalid = || AppError::Auth("E-posta veya şifre hatalı.".to_string());
  let email_addr = normalize_email(&payload.email);

  let customer = db::customers::find_by_email(&app_state.db_pool, &email_addr)
    .await?
    .ok_or_else(invalid)?;
  let stored_hash = customer.password_hash.as_deref().unwrap_or_default();
  if !auth_service::verify_password(stored_hash, &payload.password)? {
    warn!(customer_id = %customer.id, "Password sign-in failed.");
    return Err(invalid());
  }

  db::customers::record_login(&app_state.db_pool, customer.id, false, Utc::now()).await?;
  info!(customer_id = %customer.id, "Customer signed in with a password.");
  Ok(signed_in_response(&app_state, &customer, actix_web::http::StatusCode::OK))
}

pub async fn logout_handler() -> HttpResponse {
  HttpResponse::Ok()
    .cookie(auth_service::cleared_session_cookie())
    .json(json!({ "success": true }))
}

#[instrument(name = "handler::me", skip(app_state, session), fields(customer_id = %session.customer_id), err(Display))]
pub async fn me_handler(session: CustomerSession, app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  match db::customers::find_by_id(&app_state.db_pool, session.customer_id).await? {
    Some(customer) => Ok(HttpResponse::Ok().json(json!({ "success": true, "customer": customer }))),
    // Valid signature but the account is gone.
    None => Ok(
      HttpResponse::Unauthorized()
        .cookie(auth_service::cleared_session_cookie())
        .json(json!({ "success": false, "error": "Oturum geçersiz." })),
    ),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_addresses_are_normalized_and_checked() {
    assert_eq!(checked_email("  Ayse@Example.COM ").expect("valid"), "ayse@example.com");
    assert!(checked_email("ayse").is_err());
    assert!(checked_email("@example.com").is_err());
    assert!(checked_email("ayse@localhost").is_err());
  }

  fn verify_payload(purpose: OtpPurpose, name: Option<&str>, password: Option<&str>) -> OtpVerifyPayload {
    OtpVerifyPayload {
      email: "ayse@example.com".to_string(),
      purpose,
      code: "123456".to_string(),
      name: name.map(str::to_string),
      phone: None,
      password: password.map(str::to_string),
    }
  }

  #[test]
  fn registration_input_is_checked_before_the_code_is_spent() {
    let short = verify_payload(OtpPurpose::Registration, Some("Ayşe Yılmaz"), Some("kısa"));
    assert!(matches!(check_purpose_input(&short), Err(AppError::Validation(_))));

    let nameless = verify_payload(OtpPurpose::Registration, Some("  "), None);
    assert!(matches!(check_purpose_input(&nameless), Err(AppError::Validation(_))));

    let passwordless = verify_payload(OtpPurpose::Registration, Some("Ayşe Yılmaz"), None);
    assert!(check_purpose_input(&passwordless).is_ok());
    let empty_password = verify_payload(OtpPurpose::Registration, Some("Ayşe Yılmaz"), Some(""));
    assert!(check_purpose_input(&empty_password).is_ok());
    let with_password = verify_payload(OtpPurpose::Registration, Some("Ayşe Yılmaz"), Some("gül-bahçesi"));
    assert!(check_purpose_input(&with_password).is_ok());
  }

  #[test]
  fn password_reset_needs_a_long_enough_password() {
    assert!(check_purpose_input(&verify_payload(OtpPurpose::PasswordReset, None, None)).is_err());
    assert!(check_purpose_input(&verify_payload(OtpPurpose::PasswordReset, None, Some("1234567"))).is_err());
    assert!(check_purpose_input(&verify_payload(OtpPurpose::PasswordReset, None, Some("12345678"))).is_ok());
    assert!(check_purpose_input(&verify_payload(OtpPurpose::Login, None, None)).is_ok());
  }
}
