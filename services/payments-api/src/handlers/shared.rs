//! Shared handler utilities
//!
//! Common validation, metrics, and the mobile redirect snippet used across
//! handlers. Centralizing these keeps policies consistent.

use std::time::Instant;

use axum::response::Html;

use crate::error::ApiError;

// ============================================================================
// Input Validation
// ============================================================================

/// Maximum length for provider order references
const MAX_ORDER_REF_LEN: usize = 64;

/// Validate an order reference before it travels to the provider.
///
/// Allows: alphanumeric, underscore, hyphen. The provider rejects anything
/// longer than its order-id column.
pub fn validate_order_ref(value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::BadRequest("Order reference cannot be empty".into()));
    }

    if value.len() > MAX_ORDER_REF_LEN {
        return Err(ApiError::BadRequest(format!(
            "Order reference too long (max {MAX_ORDER_REF_LEN} chars)"
        )));
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::BadRequest(
            "Order reference contains invalid characters (use alphanumeric, _, -)".into(),
        ));
    }

    Ok(())
}

/// Validate an amount in KRW.
pub fn validate_amount(amount: i64) -> Result<(), ApiError> {
    if amount <= 0 {
        return Err(ApiError::BadRequest("Amount must be positive".into()));
    }
    Ok(())
}

// ============================================================================
// Mobile redirect snippet
// ============================================================================

/// Build the HTML snippet that bounces the mobile client back into the app
/// via its custom URI scheme, carrying the result fields as query parameters.
pub fn redirect_html(scheme: &str, params: &[(String, String)]) -> Html<String> {
    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();
    let target = format!("{}://callback?{}", scheme, query.join("&"));

    Html(format!(
        "<script>location.href = \"{}\";</script>",
        target.replace('"', "%22")
    ))
}

/// Flatten a callback payload into redirect query parameters.
///
/// Only string-valued fields are carried; the mobile client parses them back
/// out of the query string.
pub fn payload_params(payload: &serde_json::Value) -> Vec<(String, String)> {
    match payload.as_object() {
        Some(map) => map
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
        None => Vec::new(),
    }
}

// ============================================================================
// Metrics Helpers
// ============================================================================

/// Record HTTP operation duration with result label.
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "payments_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_order_ref_valid() {
        assert!(validate_order_ref("order-2024_0131").is_ok());
        assert!(validate_order_ref("a").is_ok());
        assert!(validate_order_ref(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_validate_order_ref_invalid() {
        assert!(validate_order_ref("").is_err());
        assert!(validate_order_ref(&"a".repeat(65)).is_err());
        assert!(validate_order_ref("order 1").is_err());
        assert!(validate_order_ref("order;drop").is_err());
        assert!(validate_order_ref("order<script>").is_err());
        assert!(validate_order_ref("주문").is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(9_900).is_ok());
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(-100).is_err());
    }

    #[test]
    fn test_redirect_html_encodes_params() {
        let html = redirect_html(
            "paymentresult",
            &[
                ("PCD_PAY_RST".to_string(), "success".to_string()),
                ("PCD_PAY_MSG".to_string(), "승인 완료".to_string()),
            ],
        );

        assert!(html.0.contains("paymentresult://callback?"));
        assert!(html.0.contains("PCD_PAY_RST=success"));
        // Non-ASCII values are percent-encoded
        assert!(!html.0.contains("승인"));
    }

    #[test]
    fn test_payload_params_keeps_string_fields_only() {
        let payload = serde_json::json!({
            "PCD_PAY_RST": "success",
            "PCD_PAY_TOTAL": "1000",
            "nested": { "x": 1 },
            "count": 3,
        });

        let params = payload_params(&payload);
        assert_eq!(params.len(), 2);
        assert!(params.contains(&("PCD_PAY_RST".to_string(), "success".to_string())));
    }
}
