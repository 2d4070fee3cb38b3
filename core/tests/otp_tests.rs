// tests/otp_tests.rs
mod common;

use chrono::Duration;
use common::*;
use florist::otp::{MAX_VERIFY_ATTEMPTS, OTP_TTL_SECS};
use florist::{can_resend, generate_code, hash_code, OtpPurpose, OtpRecord, OtpRejection, OtpState};

#[test]
fn codes_are_always_six_digits() {
  for _ in 0..500 {
    let code = generate_code();
    assert_eq!(code.len(), 6, "{code}");
    assert!(code.chars().all(|c| c.is_ascii_digit()), "{code}");
  }
}

#[test]
fn hash_is_stable_per_triple_and_changes_with_purpose() {
  let a = hash_code(OTP_SECRET, "123456", "ayse@example.com", OtpPurpose::Login);
  let b = hash_code(OTP_SECRET, "123456", "ayse@example.com", OtpPurpose::Login);
  assert_eq!(a, b);

  let other_purpose = hash_code(OTP_SECRET, "123456", "ayse@example.com", OtpPurpose::PasswordReset);
  assert_ne!(a, other_purpose);

  let other_email = hash_code(OTP_SECRET, "123456", "mehmet@example.com", OtpPurpose::Login);
  assert_ne!(a, other_email);

  // Email case and surrounding whitespace do not matter.
  let shouty = hash_code(OTP_SECRET, "123456", "  AYSE@example.com ", OtpPurpose::Login);
  assert_eq!(a, shouty);
}

#[test]
fn resend_cooldown_is_thirty_seconds() {
  let sent = utc(2025, 3, 13, 9, 0);
  assert!(!can_resend(sent, sent));
  assert!(!can_resend(sent, sent + Duration::seconds(29)));
  assert!(can_resend(sent, sent + Duration::seconds(30)));
  assert!(can_resend(sent, sent + Duration::minutes(5)));
}

#[test]
fn verify_consumes_exactly_once() {
  let now = utc(2025, 3, 13, 9, 0);
  let (mut record, code) = OtpRecord::issue(OTP_SECRET, "ayse@example.com", OtpPurpose::Registration, now);
  assert_eq!(record.state(now), OtpState::Issued);

  assert_eq!(record.verify(OTP_SECRET, &code, now + Duration::seconds(10)), Ok(()));
  assert_eq!(record.state(now), OtpState::Consumed);
  assert_eq!(
    record.verify(OTP_SECRET, &code, now + Duration::seconds(20)),
    Err(OtpRejection::AlreadyUsed)
  );
}

#[test]
fn wrong_codes_count_attempts_until_exhausted() {
  let now = utc(2025, 3, 13, 9, 0);
  let (mut record, code) = OtpRecord::issue(OTP_SECRET, "ayse@example.com", OtpPurpose::Login, now);
  let wrong = if code == "000000" { "111111" } else { "000000" };

  assert_eq!(
    record.verify(OTP_SECRET, wrong, now),
    Err(OtpRejection::Mismatch {
      remaining: MAX_VERIFY_ATTEMPTS - 1
    })
  );
  assert_eq!(record.state(now), OtpState::Attempted);

  for _ in 1..MAX_VERIFY_ATTEMPTS {
    assert!(matches!(record.verify(OTP_SECRET, wrong, now), Err(OtpRejection::Mismatch { .. })));
  }
  assert_eq!(record.state(now), OtpState::Exhausted);
  // Even the right code is refused now.
  assert_eq!(record.verify(OTP_SECRET, &code, now), Err(OtpRejection::TooManyAttempts));
}

#[test]
fn expired_codes_are_refused() {
  let now = utc(2025, 3, 13, 9, 0);
  let (mut record, code) = OtpRecord::issue(OTP_SECRET, "ayse@example.com", OtpPurpose::Login, now);
  let later = now + Duration::seconds(OTP_TTL_SECS);
  assert_eq!(record.state(later), OtpState::Expired);
  assert_eq!(record.verify(OTP_SECRET, &code, later), Err(OtpRejection::Expired));
  assert_eq!(record.attempts, 0);
}

#[test]
fn purpose_round_trips_through_strings() {
  for purpose in [OtpPurpose::Login, OtpPurpose::Registration, OtpPurpose::PasswordReset] {
    assert_eq!(purpose.as_str().parse::<OtpPurpose>(), Ok(purpose));
  }
  assert!("sudo".parse::<OtpPurpose>().is_err());
}

#[test]
fn concurrent_guesses_share_one_attempt_budget() {
  use parking_lot::Mutex;
  use std::sync::Arc;

  let now = utc(2025, 3, 13, 9, 0);
  let (record, code) = OtpRecord::issue(OTP_SECRET, "ayse@example.com", OtpPurpose::Login, now);
  let wrong = if code == "000000" { "111111" } else { "000000" };
  // The stored row; each request locks it, verifies and writes back.
  let stored = Arc::new(Mutex::new(record));

  let verdicts: Vec<Result<(), OtpRejection>> = std::thread::scope(|scope| {
    let handles: Vec<_> = (0..20)
      .map(|_| {
        let stored = Arc::clone(&stored);
        scope.spawn(move || {
          let mut row = stored.lock();
          let mut loaded = row.clone();
          let verdict = loaded.verify(OTP_SECRET, wrong, now);
          *row = loaded;
          verdict
        })
      })
      .collect();
    handles.into_iter().map(|h| h.join().expect("thread finished")).collect()
  });

  let evaluated = verdicts
    .iter()
    .filter(|v| matches!(v, Err(OtpRejection::Mismatch { .. })))
    .count();
  let refused = verdicts
    .iter()
    .filter(|v| matches!(v, Err(OtpRejection::TooManyAttempts)))
    .count();
  assert_eq!(evaluated, MAX_VERIFY_ATTEMPTS as usize);
  assert_eq!(refused, 20 - MAX_VERIFY_ATTEMPTS as usize);
  assert_eq!(stored.lock().attempts, MAX_VERIFY_ATTEMPTS);
}
