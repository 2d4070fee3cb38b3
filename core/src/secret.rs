// florist/src/secret.rs
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compares a presented shared secret with the configured one in constant time.
///
/// Both sides are MACed under a fixed key first, so neither content nor length
/// leaks through timing.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
  if expected.is_empty() {
    return false;
  }
  let key = b"florist-secret-compare";
  let (Ok(mut expected_mac), Ok(mut provided_mac)) = (HmacSha256::new_from_slice(key), HmacSha256::new_from_slice(key))
  else {
    return false;
  };
  expected_mac.update(expected.as_bytes());
  let expected_tag = expected_mac.finalize().into_bytes();
  provided_mac.update(provided.as_bytes());
  provided_mac.verify_slice(&expected_tag).is_ok()
}

#[cfg(test)]
mod tests {
  use super::secrets_match;

  #[test]
  fn matches_only_identical_secrets() {
    assert!(secrets_match("cron-secret", "cron-secret"));
    assert!(!secrets_match("cron-secre", "cron-secret"));
    assert!(!secrets_match("", ""));
  }
}
