// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use florist::{FloristError, OtpRejection, WorkflowError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Auth(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("{message}")]
  RateLimited {
    message: String,
    retry_after_secs: Option<i64>,
  },

  #[error("Payment Processing Error: {0}")]
  Payment(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(sqlx::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: WorkflowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<sqlx::Error> for AppError {
  fn from(err: sqlx::Error) -> Self {
    match &err {
      sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
        let target = db_err.constraint().unwrap_or("unique key").to_string();
        tracing::debug!(constraint = %target, "Unique constraint violated.");
        AppError::Conflict(format!("Bu kayıt zaten mevcut ({}).", target))
      }
      sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
        AppError::Validation("İlişkili kayıt bulunamadı.".to_string())
      }
      _ => AppError::Sqlx(err),
    }
  }
}

impl From<FloristError> for AppError {
  fn from(err: FloristError) -> Self {
    match err {
      FloristError::Delivery(r) => AppError::Validation(r.to_string()),
      FloristError::Coupon(r) => AppError::Validation(r.to_string()),
      FloristError::Otp(r) => r.into(),
      FloristError::Session(r) => AppError::Auth(r.to_string()),
      e @ (FloristError::InvalidTransition { .. } | FloristError::UnknownStatus(_) | FloristError::InvalidInput(_)) => {
        AppError::Validation(e.to_string())
      }
      e @ (FloristError::Key(_) | FloristError::External { .. }) => AppError::Internal(e.to_string()),
    }
  }
}

impl From<OtpRejection> for AppError {
  fn from(r: OtpRejection) -> Self {
    match r {
      OtpRejection::Cooldown { retry_after_secs } => AppError::RateLimited {
        message: r.to_string(),
        retry_after_secs: Some(retry_after_secs),
      },
      OtpRejection::TooManyAttempts => AppError::RateLimited {
        message: r.to_string(),
        retry_after_secs: None,
      },
      OtpRejection::UnknownPurpose(_) => AppError::Validation(r.to_string()),
      OtpRejection::NotFound | OtpRejection::Expired | OtpRejection::AlreadyUsed | OtpRejection::Mismatch { .. } => {
        AppError::Auth(r.to_string())
      }
    }
  }
}

// Handlers use anyhow at service seams; keep typed errors when they were wrapped.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => sqlx_err.into(),
      Err(err) => match err.downcast::<AppError>() {
        Ok(app_err) => app_err,
        Err(err) => AppError::Internal(format!("{:#}", err)),
      },
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
      AppError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    let message = if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with server error");
      "Beklenmeyen bir hata oluştu. Lütfen daha sonra tekrar deneyin.".to_string()
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with client error");
      self.to_string()
    };

    let mut builder = HttpResponse::build(status);
    if let AppError::RateLimited {
      retry_after_secs: Some(secs),
      ..
    } = self
    {
      builder.insert_header(("Retry-After", secs.to_string()));
    }
    builder.json(json!({ "success": false, "error": message }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;
  use florist::{CouponRejection, DeliveryRejection, SessionRejection};

  async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
    let resp = err.error_response();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body()).await.expect("readable body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
  }

  #[actix_web::test]
  async fn domain_rejections_map_to_client_errors() {
    let (status, body) = body_json(FloristError::from(DeliveryRejection::Sunday).into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap_or_default().contains("Pazar"));

    let (status, _) = body_json(FloristError::from(CouponRejection::Expired).into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = body_json(FloristError::from(SessionRejection::BadSignature).into()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = body_json(OtpRejection::Mismatch { remaining: 2 }.into()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[actix_web::test]
  async fn cooldown_is_rate_limited_with_retry_after() {
    let err: AppError = OtpRejection::Cooldown { retry_after_secs: 12 }.into();
    let resp = err.error_response();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
      resp.headers().get("Retry-After").and_then(|v| v.to_str().ok()),
      Some("12")
    );
  }

  #[actix_web::test]
  async fn server_errors_do_not_leak_details() {
    let (status, body) = body_json(AppError::Sqlx(sqlx::Error::PoolTimedOut)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap_or_default();
    assert!(!message.contains("pool"));
  }

  #[test]
  fn anyhow_keeps_wrapped_app_errors() {
    let wrapped = anyhow::Error::new(AppError::NotFound("Sipariş bulunamadı.".to_string()));
    assert!(matches!(AppError::from(wrapped), AppError::NotFound(_)));
    let wrapped = anyhow::Error::new(sqlx::Error::RowNotFound);
    assert!(matches!(AppError::from(wrapped), AppError::Sqlx(sqlx::Error::RowNotFound)));
  }
}
