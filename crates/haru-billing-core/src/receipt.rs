//! Cash receipt issuance
//!
//! Pure delegation to the receipt provider: normalized payment fields are
//! mapped into the provider's schema and forwarded. Callers treat the result
//! as advisory, not transactional with the payment.

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::error::BillingError;

/// Fixed VAT rate the provider expects amounts to be split at
const VAT_RATE: f64 = 0.1;

/// Management keys are capped by the provider
const MAX_MGT_KEY_LEN: usize = 24;

/// Receipt provider configuration
#[derive(Debug, Clone)]
pub struct ReceiptConfig {
    /// Receipt provider API base URL
    pub api_base: String,
    /// API key
    pub api_key: String,
    /// Registered business number the receipts are issued under
    pub corp_num: String,
}

impl ReceiptConfig {
    /// Create a new receipt config
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        corp_num: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            corp_num: corp_num.into(),
        }
    }
}

/// Normalized receipt request
#[derive(Debug, Clone)]
pub struct ReceiptRequest {
    /// Idempotency key, sanitized and capped before hitting the wire
    pub mgt_key: String,
    /// Total amount in KRW, VAT included
    pub total_amount: i64,
    /// Item display name
    pub item_name: String,
    /// Buyer identity fragment (phone number)
    pub buyer_phone: String,
}

/// Receipt provider wire schema
#[derive(Debug, Serialize)]
struct ReceiptPayload<'a> {
    #[serde(rename = "corpNum")]
    corp_num: &'a str,
    #[serde(rename = "mgtKey")]
    mgt_key: String,
    #[serde(rename = "tradeType")]
    trade_type: &'static str,
    #[serde(rename = "supplyCost")]
    supply_cost: i64,
    tax: i64,
    #[serde(rename = "totalAmount")]
    total_amount: i64,
    #[serde(rename = "itemName")]
    item_name: &'a str,
    #[serde(rename = "identityNum")]
    identity_num: &'a str,
}

/// Receipt provider client
#[derive(Clone)]
pub struct ReceiptClient {
    client: Client,
    config: ReceiptConfig,
}

impl ReceiptClient {
    /// Create a new receipt client
    pub fn new(config: ReceiptConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Issue a cash receipt for a confirmed payment.
    #[instrument(skip(self, request), fields(mgt_key = %request.mgt_key))]
    pub async fn issue(&self, request: &ReceiptRequest) -> Result<(), BillingError> {
        let (supply_cost, tax) = split_vat(request.total_amount);

        let payload = ReceiptPayload {
            corp_num: &self.config.corp_num,
            mgt_key: sanitize_mgt_key(&request.mgt_key),
            trade_type: "income_deduction",
            supply_cost,
            tax,
            total_amount: request.total_amount,
            item_name: &request.item_name,
            identity_num: &request.buyer_phone,
        };

        debug!(total = request.total_amount, "Issuing cash receipt");

        let url = format!("{}/cashbill/issue", self.config.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Receipt API request failed");
                BillingError::Provider(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Receipt API error");
            return Err(BillingError::Provider(format!("receipt API error: {status}")));
        }

        Ok(())
    }
}

/// Split a VAT-inclusive amount into supply cost and tax at the fixed rate.
fn split_vat(total: i64) -> (i64, i64) {
    let supply = ((total as f64) / (1.0 + VAT_RATE)).round() as i64;
    (supply, total - supply)
}

/// The provider accepts only alphanumerics and dashes in management keys,
/// capped at the provider's length limit.
fn sanitize_mgt_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .take(MAX_MGT_KEY_LEN)
        .collect()
}
