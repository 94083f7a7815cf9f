//! Payment gateway abstraction
//!
//! Every provider call returns a normalized [`ProviderResult`]; the field the
//! result code lives in and what counts as success differ across the
//! provider's sub-APIs, so each endpoint declares its own [`ResultSpec`]
//! instead of relying on a global convention.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::BillingError;

/// Operation type requested during partner authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayWork {
    /// Charge a stored billing key
    Auth,
    /// Delete a stored billing key
    PuserDel,
    /// Refund a settled payment
    PayCancel,
}

impl PayWork {
    /// Provider wire value for `PCD_PAY_WORK`
    pub const fn as_provider_code(&self) -> &'static str {
        match self {
            Self::Auth => "AUTH",
            Self::PuserDel => "PUSERDEL",
            Self::PayCancel => "PAYCANCEL",
        }
    }
}

impl std::fmt::Display for PayWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_provider_code())
    }
}

/// Short-lived credential bundle returned by partner authentication.
///
/// Required on every subsequent provider call within the flow; never cached
/// across flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerAuth {
    /// Partner id echoed by the provider
    pub cst_id: String,
    /// Partner key echoed by the provider
    pub cust_key: String,
    /// Short-lived authorization key
    pub auth_key: String,
}

/// Billing-key charge request
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// Stored billing key (`PCD_PAYER_ID`)
    pub billing_key: String,
    /// Order reference (`PCD_PAY_OID`)
    pub order_ref: String,
    /// Goods display name
    pub goods_name: String,
    /// Amount in KRW
    pub amount: i64,
}

/// One-time payment confirmation request, built from callback fields
#[derive(Debug, Clone)]
pub struct ConfirmRequest {
    /// Authorization reference from the callback (`PCD_AUTH_KEY`)
    pub auth_key: String,
    /// Confirmation request key from the callback (`PCD_PAY_REQKEY`)
    pub req_key: String,
    /// Payer id from the callback (`PCD_PAYER_ID`)
    pub payer_id: String,
}

/// Refund request
#[derive(Debug, Clone)]
pub struct RefundRequest {
    /// Original payment oid
    pub payment_oid: String,
    /// Original payment date (formatted `YYYYMMDD` on the wire)
    pub pay_date: NaiveDate,
    /// Amount to refund in KRW
    pub amount: i64,
}

/// What counts as success for an endpoint's result code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessRule {
    /// Result equals the given word, compared case-insensitively
    CaseInsensitive(&'static str),
    /// Result equals the given sentinel code exactly
    Code(&'static str),
}

impl SuccessRule {
    /// Evaluate a raw result code against this rule
    pub fn matches(&self, code: &str) -> bool {
        match self {
            Self::CaseInsensitive(word) => code.eq_ignore_ascii_case(word),
            Self::Code(sentinel) => code == *sentinel,
        }
    }
}

/// Where an endpoint's result and message live, and what success looks like
#[derive(Debug, Clone, Copy)]
pub struct ResultSpec {
    /// JSON field carrying the result code
    pub result_field: &'static str,
    /// JSON field carrying the human message
    pub message_field: &'static str,
    /// Success mapping for this endpoint
    pub rule: SuccessRule,
}

/// Normalized provider response
#[derive(Debug, Clone, Serialize)]
pub struct ProviderResult {
    /// Whether the endpoint's success rule matched
    pub ok: bool,
    /// Raw result code
    pub code: String,
    /// Provider message, empty if absent
    pub message: String,
    /// Full raw payload for auditing
    pub raw: serde_json::Value,
}

impl ProviderResult {
    /// Normalize a raw provider payload using the endpoint's result spec
    pub fn from_raw(raw: serde_json::Value, spec: &ResultSpec) -> Self {
        let code = raw
            .get(spec.result_field)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let message = raw
            .get(spec.message_field)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let ok = spec.rule.matches(&code);

        Self {
            ok,
            code,
            message,
            raw,
        }
    }
}

/// Payment gateway trait
///
/// Abstracts the provider so the renewal pass and services can be tested
/// against an in-memory gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Obtain a short-lived partner credential for the given operation type
    async fn partner_auth(&self, work: PayWork) -> Result<PartnerAuth, BillingError>;

    /// Charge a stored billing key
    async fn charge_billing_key(
        &self,
        auth: &PartnerAuth,
        req: &ChargeRequest,
    ) -> Result<ProviderResult, BillingError>;

    /// Confirm a one-time payment using the callback's authorization reference
    async fn confirm_payment(&self, req: &ConfirmRequest) -> Result<ProviderResult, BillingError>;

    /// Delete a stored billing key
    async fn delete_billing_key(
        &self,
        auth: &PartnerAuth,
        billing_key: &str,
    ) -> Result<ProviderResult, BillingError>;

    /// Refund a settled payment
    async fn refund(
        &self,
        auth: &PartnerAuth,
        req: &RefundRequest,
    ) -> Result<ProviderResult, BillingError>;
}
