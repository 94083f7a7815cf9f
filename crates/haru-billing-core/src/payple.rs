//! Payple payment gateway implementation

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, instrument};

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::{
    ChargeRequest, ConfirmRequest, PartnerAuth, PayWork, PaymentGateway, ProviderResult,
    RefundRequest, ResultSpec, SuccessRule,
};

/// Partner auth endpoint result: fixed sentinel code, plain field names
const AUTH_SPEC: ResultSpec = ResultSpec {
    result_field: "result",
    message_field: "result_msg",
    rule: SuccessRule::Code("T0000"),
};

/// Payment sub-API result: "success" word, case-insensitive, prefixed fields
const PAY_SPEC: ResultSpec = ResultSpec {
    result_field: "PCD_PAY_RST",
    message_field: "PCD_PAY_MSG",
    rule: SuccessRule::CaseInsensitive("success"),
};

/// Payple gateway client
#[derive(Clone)]
pub struct PaypleClient {
    client: Client,
    config: BillingConfig,
}

impl PaypleClient {
    /// Create a new Payple client
    pub fn new(config: BillingConfig) -> Self {
        let client = Client::new();
        Self { client, config }
    }

    /// Make a request to a Payple endpoint.
    ///
    /// The provider requires the registered referer on every call and
    /// rejects cached responses.
    async fn payple_request(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, BillingError> {
        let url = format!("{}{}", self.config.api_base, path);

        let response = self
            .client
            .post(&url)
            .header("Referer", &self.config.referer)
            .header("Cache-Control", "no-cache")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, path = %path, "Payple API request failed");
                BillingError::Provider(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, path = %path, "Payple API error");
            return Err(BillingError::Provider(format!("Payple API error: {status}")));
        }

        response.json::<serde_json::Value>().await.map_err(|e| {
            error!(error = %e, path = %path, "Failed to parse Payple response");
            BillingError::Provider(e.to_string())
        })
    }
}

#[async_trait]
impl PaymentGateway for PaypleClient {
    #[instrument(skip(self))]
    async fn partner_auth(&self, work: PayWork) -> Result<PartnerAuth, BillingError> {
        debug!(work = %work, "Requesting partner auth");

        let body = json!({
            "cst_id": self.config.partner_id,
            "custKey": self.config.partner_key,
            "PCD_PAY_WORK": work.as_provider_code(),
        });

        let raw = self.payple_request("/php/auth.php", &body).await?;
        let result = ProviderResult::from_raw(raw, &AUTH_SPEC);

        if !result.ok {
            error!(code = %result.code, message = %result.message, "Partner auth rejected");
            return Err(BillingError::AuthFailed {
                code: result.code,
                message: result.message,
                raw: result.raw,
            });
        }

        let field = |name: &str| {
            result
                .raw
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    BillingError::Provider(format!("auth response missing field: {name}"))
                })
        };

        Ok(PartnerAuth {
            cst_id: field("cst_id")?,
            cust_key: field("custKey")?,
            auth_key: field("AuthKey")?,
        })
    }

    #[instrument(skip(self, auth), fields(order_ref = %req.order_ref))]
    async fn charge_billing_key(
        &self,
        auth: &PartnerAuth,
        req: &ChargeRequest,
    ) -> Result<ProviderResult, BillingError> {
        debug!(amount = req.amount, "Charging billing key");

        let body = json!({
            "PCD_CST_ID": auth.cst_id,
            "PCD_CUST_KEY": auth.cust_key,
            "PCD_AUTH_KEY": auth.auth_key,
            "PCD_PAY_TYPE": "card",
            "PCD_SIMPLE_FLAG": "Y",
            "PCD_PAYER_ID": req.billing_key,
            "PCD_PAY_OID": req.order_ref,
            "PCD_PAY_GOODS": req.goods_name,
            "PCD_PAY_TOTAL": req.amount.to_string(),
        });

        let raw = self
            .payple_request("/php/SimplePayCardAct.php?ACT_=PAYM", &body)
            .await?;

        Ok(ProviderResult::from_raw(raw, &PAY_SPEC))
    }

    #[instrument(skip(self, req))]
    async fn confirm_payment(&self, req: &ConfirmRequest) -> Result<ProviderResult, BillingError> {
        debug!("Confirming one-time payment");

        let body = json!({
            "PCD_CST_ID": self.config.partner_id,
            "PCD_CUST_KEY": self.config.partner_key,
            "PCD_AUTH_KEY": req.auth_key,
            "PCD_PAY_REQKEY": req.req_key,
            "PCD_PAYER_ID": req.payer_id,
        });

        let raw = self.payple_request("/php/PayConfirmAct.php", &body).await?;

        Ok(ProviderResult::from_raw(raw, &PAY_SPEC))
    }

    #[instrument(skip(self, auth, billing_key))]
    async fn delete_billing_key(
        &self,
        auth: &PartnerAuth,
        billing_key: &str,
    ) -> Result<ProviderResult, BillingError> {
        debug!("Deleting billing key");

        let body = json!({
            "PCD_CST_ID": auth.cst_id,
            "PCD_CUST_KEY": auth.cust_key,
            "PCD_AUTH_KEY": auth.auth_key,
            "PCD_PAYER_ID": billing_key,
        });

        let raw = self
            .payple_request("/php/cPayUser/api/cPayUserAct.php?ACT_=PUSERDEL", &body)
            .await?;

        Ok(ProviderResult::from_raw(raw, &PAY_SPEC))
    }

    #[instrument(skip(self, auth), fields(payment_oid = %req.payment_oid))]
    async fn refund(
        &self,
        auth: &PartnerAuth,
        req: &RefundRequest,
    ) -> Result<ProviderResult, BillingError> {
        debug!(amount = req.amount, "Requesting refund");

        let body = json!({
            "PCD_CST_ID": auth.cst_id,
            "PCD_CUST_KEY": auth.cust_key,
            "PCD_AUTH_KEY": auth.auth_key,
            "PCD_REFUND_KEY": self.config.refund_key,
            "PCD_PAYCANCEL_FLAG": "Y",
            "PCD_PAY_OID": req.payment_oid,
            "PCD_PAY_DATE": req.pay_date.format("%Y%m%d").to_string(),
            "PCD_REFUND_TOTAL": req.amount.to_string(),
        });

        let raw = self
            .payple_request("/php/account/api/refundAct.php", &body)
            .await?;

        Ok(ProviderResult::from_raw(raw, &PAY_SPEC))
    }
}
