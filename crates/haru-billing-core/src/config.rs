//! Billing configuration
//!
//! Partner credentials are injected here once per process start and passed
//! explicitly into every component; nothing reads them from module globals.

/// Billing service configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Partner id issued by the payment provider (`cst_id`)
    pub partner_id: String,
    /// Partner key issued by the payment provider (`custKey`)
    pub partner_key: String,
    /// Extra key required by the refund sub-API
    pub refund_key: String,
    /// Provider API base URL
    pub api_base: String,
    /// Referer the provider requires on every call
    pub referer: String,
    /// Fixed monthly subscription price in KRW
    pub monthly_price: i64,
    /// Goods name sent with subscription charges
    pub goods_name: String,
}

impl BillingConfig {
    /// Create a new billing config
    pub fn new(partner_id: impl Into<String>, partner_key: impl Into<String>) -> Self {
        Self {
            partner_id: partner_id.into(),
            partner_key: partner_key.into(),
            refund_key: String::new(),
            api_base: "https://demo-api.payple.kr".to_string(),
            referer: "https://app.haru.example".to_string(),
            monthly_price: 9_900,
            goods_name: "Haru Pass".to_string(),
        }
    }

    /// Set the provider API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the referer sent on provider calls
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    /// Set the refund sub-API key
    pub fn with_refund_key(mut self, refund_key: impl Into<String>) -> Self {
        self.refund_key = refund_key.into();
        self
    }

    /// Set the fixed monthly price in KRW
    pub fn with_monthly_price(mut self, price: i64) -> Self {
        self.monthly_price = price;
        self
    }

    /// Set the goods name for subscription charges
    pub fn with_goods_name(mut self, goods_name: impl Into<String>) -> Self {
        self.goods_name = goods_name.into();
        self
    }
}
