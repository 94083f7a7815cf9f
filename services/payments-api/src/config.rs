//! Configuration for the Payments API service.

use std::time::Duration;

use haru_billing_core::{BillingConfig, ReceiptConfig};
use haru_events_core::MailerConfig;

/// Payments API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Billing core configuration
    pub billing: BillingConfig,
    /// Receipt provider configuration, when issuance is enabled
    pub receipt: Option<ReceiptConfig>,
    /// Mail provider configuration, when transactional mail is enabled
    pub mailer: Option<MailerConfig>,
    /// Custom URI scheme the mobile client registered for payment redirects
    pub app_scheme: String,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Database
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        // Server port
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8081".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Payment provider configuration
        let partner_id =
            std::env::var("PAYPLE_CST_ID").map_err(|_| ConfigError::Missing("PAYPLE_CST_ID"))?;
        let partner_key =
            std::env::var("PAYPLE_CUST_KEY").map_err(|_| ConfigError::Missing("PAYPLE_CUST_KEY"))?;

        let mut billing = BillingConfig::new(&partner_id, &partner_key);
        if let Ok(base) = std::env::var("PAYPLE_API_BASE") {
            billing = billing.with_api_base(base);
        }
        if let Ok(referer) = std::env::var("PAYPLE_REFERER") {
            billing = billing.with_referer(referer);
        }
        if let Ok(refund_key) = std::env::var("PAYPLE_REFUND_KEY") {
            billing = billing.with_refund_key(refund_key);
        }
        if let Ok(price) = std::env::var("SUBSCRIPTION_PRICE_KRW") {
            let price = price
                .parse()
                .map_err(|_| ConfigError::Invalid("SUBSCRIPTION_PRICE_KRW"))?;
            billing = billing.with_monthly_price(price);
        }

        // Receipt provider is optional; issuance is skipped without it
        let receipt = match (
            std::env::var("RECEIPT_API_BASE"),
            std::env::var("RECEIPT_API_KEY"),
            std::env::var("RECEIPT_CORP_NUM"),
        ) {
            (Ok(base), Ok(key), Ok(corp)) => Some(ReceiptConfig::new(base, key, corp)),
            _ => None,
        };

        // Mail provider is optional; sends are skipped without it
        let mailer = match (
            std::env::var("MAIL_API_BASE"),
            std::env::var("MAIL_API_KEY"),
            std::env::var("MAIL_FROM"),
        ) {
            (Ok(base), Ok(key), Ok(from)) => Some(MailerConfig::new(base, key, from)),
            _ => None,
        };

        // Redirect scheme for the mobile client
        let app_scheme =
            std::env::var("APP_SCHEME").unwrap_or_else(|_| "paymentresult".to_string());

        // Request timeout
        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        // Metrics
        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            http_port,
            database_url,
            billing,
            receipt,
            mailer,
            app_scheme,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
