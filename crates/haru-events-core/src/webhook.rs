//! Webhook signature verification
//!
//! The settlement provider signs webhook bodies with HMAC-SHA256 over
//! `"{timestamp}.{body}"` and sends `t={timestamp},v1={signature}` in the
//! signature header.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{error, warn};

use crate::error::EventsError;

/// Signatures older than this are rejected
const MAX_AGE_SECONDS: i64 = 300;

/// Webhook signature verifier
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
}

impl SignatureVerifier {
    /// Create a new verifier
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify a webhook signature header against the raw body.
    pub fn verify(&self, payload: &[u8], signature: &str) -> Result<(), EventsError> {
        // Parse signature header: t=timestamp,v1=signature
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("Missing timestamp in webhook signature");
            EventsError::Webhook("missing timestamp".to_string())
        })?;

        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("Missing v1 signature in webhook signature");
            EventsError::Webhook("missing signature".to_string())
        })?;

        // Build signed payload
        let signed_payload = format!(
            "{}.{}",
            timestamp,
            std::str::from_utf8(payload)
                .map_err(|_| EventsError::Webhook("invalid payload encoding".to_string()))?
        );

        // Compute expected signature
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .map_err(|_| EventsError::Internal("HMAC error".to_string()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        // Compare signatures (constant-time)
        if !constant_time_eq(sig_v1.as_bytes(), expected.as_bytes()) {
            error!("Webhook signature verification failed");
            return Err(EventsError::Webhook(
                "signature verification failed".to_string(),
            ));
        }

        // Check timestamp freshness
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| EventsError::Webhook("invalid timestamp format".to_string()))?;
        let now = Utc::now().timestamp();
        if (now - ts).abs() > MAX_AGE_SECONDS {
            warn!(timestamp = ts, now = now, "Webhook timestamp too old");
            return Err(EventsError::Webhook("timestamp too old".to_string()));
        }

        Ok(())
    }
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let signed = format!("{}.{}", timestamp, std::str::from_utf8(payload).unwrap());
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed.as_bytes());
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_passes() {
        let verifier = SignatureVerifier::new("whsec_test");
        let payload = br#"{"result":"ok"}"#;
        let sig = sign(payload, "whsec_test", Utc::now().timestamp());

        assert!(verifier.verify(payload, &sig).is_ok());
    }

    #[test]
    fn wrong_secret_fails() {
        let verifier = SignatureVerifier::new("whsec_test");
        let payload = br#"{"result":"ok"}"#;
        let sig = sign(payload, "whsec_other", Utc::now().timestamp());

        assert!(verifier.verify(payload, &sig).is_err());
    }

    #[test]
    fn tampered_payload_fails() {
        let verifier = SignatureVerifier::new("whsec_test");
        let sig = sign(br#"{"amount":100}"#, "whsec_test", Utc::now().timestamp());

        assert!(verifier.verify(br#"{"amount":999}"#, &sig).is_err());
    }

    #[test]
    fn stale_timestamp_fails() {
        let verifier = SignatureVerifier::new("whsec_test");
        let payload = br#"{"result":"ok"}"#;
        let sig = sign(payload, "whsec_test", Utc::now().timestamp() - 400);

        assert!(verifier.verify(payload, &sig).is_err());
    }

    #[test]
    fn malformed_header_fails() {
        let verifier = SignatureVerifier::new("whsec_test");

        assert!(verifier.verify(b"{}", "v1=deadbeef").is_err());
        assert!(verifier.verify(b"{}", "t=123").is_err());
        assert!(verifier.verify(b"{}", "").is_err());
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
