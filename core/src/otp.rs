// florist/src/otp.rs

//! One-time email codes for login, registration and password reset.
//!
//! Only an HMAC of the code is stored. A record moves
//! `issued -> attempted* -> consumed | expired`, and is `exhausted` once the
//! attempt budget is spent.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const OTP_LENGTH: usize = 6;
pub const OTP_TTL_SECS: i64 = 10 * 60;
pub const RESEND_COOLDOWN_SECS: i64 = 30;
pub const MAX_VERIFY_ATTEMPTS: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
  Login,
  Registration,
  PasswordReset,
}

impl OtpPurpose {
  pub fn as_str(self) -> &'static str {
    match self {
      OtpPurpose::Login => "login",
      OtpPurpose::Registration => "registration",
      OtpPurpose::PasswordReset => "password_reset",
    }
  }
}

impl fmt::Display for OtpPurpose {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OtpPurpose {
  type Err = OtpRejection;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "login" => Ok(OtpPurpose::Login),
      "registration" => Ok(OtpPurpose::Registration),
      "password_reset" => Ok(OtpPurpose::PasswordReset),
      other => Err(OtpRejection::UnknownPurpose(other.to_string())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpRejection {
  #[error("Doğrulama kodu bulunamadı. Lütfen yeni bir kod isteyin.")]
  NotFound,

  #[error("Doğrulama kodunun süresi doldu. Lütfen yeni bir kod isteyin.")]
  Expired,

  #[error("Bu doğrulama kodu zaten kullanıldı.")]
  AlreadyUsed,

  #[error("Çok fazla hatalı deneme. Lütfen yeni bir kod isteyin.")]
  TooManyAttempts,

  #[error("Doğrulama kodu hatalı. Kalan deneme hakkı: {remaining}.")]
  Mismatch { remaining: i32 },

  #[error("Yeni kod istemeden önce lütfen {retry_after_secs} saniye bekleyin.")]
  Cooldown { retry_after_secs: i64 },

  #[error("Bilinmeyen doğrulama amacı: {0}")]
  UnknownPurpose(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpState {
  Issued,
  Attempted,
  Consumed,
  Expired,
  Exhausted,
}

/// Six random decimal digits, leading zeros kept.
pub fn generate_code() -> String {
  let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
  format!("{:06}", n)
}

fn otp_mac(secret: &[u8], code: &str, email: &str, purpose: OtpPurpose) -> HmacSha256 {
  // HMAC accepts keys of any length.
  let mut mac = match HmacSha256::new_from_slice(secret) {
    Ok(mac) => mac,
    Err(_) => unreachable!("HMAC-SHA256 accepts any key length"),
  };
  mac.update(normalize_email(email).as_bytes());
  mac.update(b":");
  mac.update(purpose.as_str().as_bytes());
  mac.update(b":");
  mac.update(code.trim().as_bytes());
  mac
}

/// Hex HMAC-SHA256 of `email:purpose:code`, keyed by the server OTP secret.
pub fn hash_code(secret: &[u8], code: &str, email: &str, purpose: OtpPurpose) -> String {
  hex::encode(otp_mac(secret, code, email, purpose).finalize().into_bytes())
}

pub fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}

/// `false` within the cooldown window after the last send.
pub fn can_resend(last_sent_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
  now - last_sent_at >= Duration::seconds(RESEND_COOLDOWN_SECS)
}

pub fn resend_wait_secs(last_sent_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
  (RESEND_COOLDOWN_SECS - (now - last_sent_at).num_seconds()).max(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRecord {
  pub id: Uuid,
  pub email: String,
  pub purpose: OtpPurpose,
  pub code_hash: String,
  pub attempts: i32,
  pub created_at: DateTime<Utc>,
  pub last_sent_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
  pub consumed_at: Option<DateTime<Utc>>,
}

impl OtpRecord {
  /// Issues a new record and returns it with the plain code to send.
  pub fn issue(secret: &[u8], email: &str, purpose: OtpPurpose, now: DateTime<Utc>) -> (Self, String) {
    let code = generate_code();
    let record = Self {
      id: Uuid::new_v4(),
      email: normalize_email(email),
      purpose,
      code_hash: hash_code(secret, &code, email, purpose),
      attempts: 0,
      created_at: now,
      last_sent_at: now,
      expires_at: now + Duration::seconds(OTP_TTL_SECS),
      consumed_at: None,
    };
    (record, code)
  }

  pub fn state(&self, now: DateTime<Utc>) -> OtpState {
    if self.consumed_at.is_some() {
      OtpState::Consumed
    } else if now >= self.expires_at {
      OtpState::Expired
    } else if self.attempts >= MAX_VERIFY_ATTEMPTS {
      OtpState::Exhausted
    } else if self.attempts > 0 {
      OtpState::Attempted
    } else {
      OtpState::Issued
    }
  }

  /// Checks `code`, counting the attempt. On success the record is consumed.
  ///
  /// Callers must persist `attempts` and `consumed_at` whatever the outcome.
  pub fn verify(&mut self, secret: &[u8], code: &str, now: DateTime<Utc>) -> Result<(), OtpRejection> {
    match self.state(now) {
      OtpState::Consumed => return Err(OtpRejection::AlreadyUsed),
      OtpState::Expired => return Err(OtpRejection::Expired),
      OtpState::Exhausted => return Err(OtpRejection::TooManyAttempts),
      OtpState::Issued | OtpState::Attempted => {}
    }

    self.attempts += 1;
    let expected = hex::decode(&self.code_hash).map_err(|_| OtpRejection::NotFound)?;
    let matches = otp_mac(secret, code, &self.email, self.purpose)
      .verify_slice(&expected)
      .is_ok();

    if matches {
      self.consumed_at = Some(now);
      Ok(())
    } else {
      Err(OtpRejection::Mismatch {
        remaining: (MAX_VERIFY_ATTEMPTS - self.attempts).max(0),
      })
    }
  }
}
