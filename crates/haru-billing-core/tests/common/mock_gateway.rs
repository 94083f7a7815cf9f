//! Mock payment gateway for testing

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::json;

use haru_billing_core::{
    BillingError, ChargeRequest, ConfirmRequest, PartnerAuth, PayWork, PaymentGateway,
    ProviderResult, RefundRequest,
};

/// How the gateway reacts to a charge for a given billing key
#[derive(Debug, Clone)]
pub enum ChargeBehavior {
    /// Provider accepts
    Succeed,
    /// Provider declines with the given code/message
    Decline(String, String),
    /// Transport-level failure
    Fail,
}

fn success_result() -> ProviderResult {
    ProviderResult {
        ok: true,
        code: "success".to_string(),
        message: "approved".to_string(),
        raw: json!({ "PCD_PAY_RST": "success" }),
    }
}

fn decline_result(code: &str, message: &str) -> ProviderResult {
    ProviderResult {
        ok: false,
        code: code.to_string(),
        message: message.to_string(),
        raw: json!({ "PCD_PAY_RST": "error", "PCD_PAY_CODE": code, "PCD_PAY_MSG": message }),
    }
}

/// In-memory gateway with per-billing-key behavior
#[derive(Default)]
pub struct MockGateway {
    /// Behavior per billing key; unlisted keys succeed
    pub charge_behavior: DashMap<String, ChargeBehavior>,
    /// Billing keys charged, in order
    pub charged: Mutex<Vec<String>>,
    /// Billing keys deleted
    pub deleted: Mutex<Vec<String>>,
    /// Payment oids refunded
    pub refunded: Mutex<Vec<String>>,
    /// Partner auth invocations
    pub auth_calls: AtomicUsize,
    /// Whether partner auth itself fails
    pub auth_fails: AtomicBool,
    /// Whether billing-key deletion is declined
    pub delete_declines: AtomicBool,
    /// Whether refunds are declined
    pub refund_declines: AtomicBool,
    /// Whether one-time confirmation is declined
    pub confirm_declines: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decline_charges_for(&self, billing_key: &str, code: &str, message: &str) {
        self.charge_behavior.insert(
            billing_key.to_string(),
            ChargeBehavior::Decline(code.to_string(), message.to_string()),
        );
    }

    pub fn fail_charges_for(&self, billing_key: &str) {
        self.charge_behavior
            .insert(billing_key.to_string(), ChargeBehavior::Fail);
    }

    pub fn charged_keys(&self) -> Vec<String> {
        self.charged.lock().unwrap().clone()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn refunded_oids(&self) -> Vec<String> {
        self.refunded.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn partner_auth(&self, _work: PayWork) -> Result<PartnerAuth, BillingError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);

        if self.auth_fails.load(Ordering::SeqCst) {
            return Err(BillingError::AuthFailed {
                code: "T9999".to_string(),
                message: "auth rejected".to_string(),
                raw: json!({ "result": "T9999" }),
            });
        }

        Ok(PartnerAuth {
            cst_id: "cst_test".to_string(),
            cust_key: "key_test".to_string(),
            auth_key: "auth_test".to_string(),
        })
    }

    async fn charge_billing_key(
        &self,
        _auth: &PartnerAuth,
        req: &ChargeRequest,
    ) -> Result<ProviderResult, BillingError> {
        let behavior = self
            .charge_behavior
            .get(&req.billing_key)
            .map(|b| b.value().clone())
            .unwrap_or(ChargeBehavior::Succeed);

        match behavior {
            ChargeBehavior::Fail => Err(BillingError::Provider("connection reset".to_string())),
            ChargeBehavior::Decline(code, message) => {
                self.charged.lock().unwrap().push(req.billing_key.clone());
                Ok(decline_result(&code, &message))
            }
            ChargeBehavior::Succeed => {
                self.charged.lock().unwrap().push(req.billing_key.clone());
                Ok(success_result())
            }
        }
    }

    async fn confirm_payment(&self, _req: &ConfirmRequest) -> Result<ProviderResult, BillingError> {
        if self.confirm_declines.load(Ordering::SeqCst) {
            Ok(decline_result("PAY-01", "confirmation declined"))
        } else {
            Ok(success_result())
        }
    }

    async fn delete_billing_key(
        &self,
        _auth: &PartnerAuth,
        billing_key: &str,
    ) -> Result<ProviderResult, BillingError> {
        if self.delete_declines.load(Ordering::SeqCst) {
            return Ok(decline_result("USERDEL-01", "deletion declined"));
        }
        self.deleted.lock().unwrap().push(billing_key.to_string());
        Ok(success_result())
    }

    async fn refund(
        &self,
        _auth: &PartnerAuth,
        req: &RefundRequest,
    ) -> Result<ProviderResult, BillingError> {
        if self.refund_declines.load(Ordering::SeqCst) {
            return Ok(decline_result("REFUND-01", "refund declined"));
        }
        self.refunded.lock().unwrap().push(req.payment_oid.clone());
        Ok(success_result())
    }
}
