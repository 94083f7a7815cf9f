//! Haru Billing Core - Payment and subscription business logic
//!
//! Core billing functionality: the Payple-style payment gateway client,
//! the subscription lifecycle state machine, the monthly renewal pass,
//! one-time payment confirmation, refunds, and cash-receipt issuance.
//!
//! # Example
//!
//! ```rust,ignore
//! use haru_billing_core::{BillingConfig, PaypleClient, RenewalRunner};
//!
//! let config = BillingConfig::new("cst_demo", "key_demo")
//!     .with_monthly_price(9_900);
//!
//! let gateway = Arc::new(PaypleClient::new(config.clone()));
//! let runner = RenewalRunner::new(gateway, subscriptions, users, payments, config);
//!
//! let summary = runner.run(today, Utc::now()).await?;
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod payple;
pub mod provider;
pub mod receipt;
pub mod renewal;
pub mod service;

pub use config::BillingConfig;
pub use error::BillingError;
pub use lifecycle::{
    one_month_after, transition, BillingEvent, LifecycleError, ScheduleChange, Transition,
};
pub use payple::PaypleClient;
pub use provider::{
    ChargeRequest, ConfirmRequest, PartnerAuth, PayWork, PaymentGateway, ProviderResult,
    RefundRequest, ResultSpec, SuccessRule,
};
pub use receipt::{ReceiptClient, ReceiptConfig, ReceiptRequest};
pub use renewal::{RenewalOutcome, RenewalRecord, RenewalRunner, RenewalSummary};
pub use service::{
    PassCallback, PassOutcome, PassService, RefundService, RegisterBillingKey, SubscriptionService,
};
