//! Billing errors

use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// Provider authentication failed; carries the provider's raw payload
    /// for diagnosis
    #[error("provider auth failed: {code} {message}")]
    AuthFailed {
        /// Provider result code
        code: String,
        /// Provider message
        message: String,
        /// Raw provider payload
        raw: serde_json::Value,
    },

    /// Provider transport or parsing error
    #[error("provider error: {0}")]
    Provider(String),

    /// Subscription not found
    #[error("subscription not found")]
    SubscriptionNotFound,

    /// Pending order not found
    #[error("pending order not found")]
    PendingOrderNotFound,

    /// Order not found
    #[error("order not found")]
    OrderNotFound,

    /// Product not found
    #[error("product not found")]
    ProductNotFound,

    /// User not found
    #[error("user not found")]
    UserNotFound,

    /// Caller does not own the record they are operating on
    #[error("forbidden")]
    Forbidden,

    /// Operation requires a different subscription status
    #[error("invalid subscription status: expected {expected}, found {actual}")]
    InvalidStatus {
        /// Status the operation requires
        expected: &'static str,
        /// Status the subscription is in
        actual: String,
    },

    /// Order is missing the payment fields a refund needs
    #[error("order has no payment reference")]
    MissingPaymentRef,

    /// Provider declined a business operation (charge, deletion, refund)
    #[error("provider declined: {code} {message}")]
    Declined {
        /// Provider result code
        code: String,
        /// Provider message
        message: String,
    },

    /// Callback payload was malformed
    #[error("invalid callback: {0}")]
    InvalidCallback(String),

    /// Stored status string did not parse into a lifecycle state
    #[error("corrupt subscription status: {0}")]
    CorruptStatus(String),

    /// Illegal lifecycle transition
    #[error(transparent)]
    Lifecycle(#[from] crate::lifecycle::LifecycleError),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] haru_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SubscriptionNotFound
                | Self::PendingOrderNotFound
                | Self::OrderNotFound
                | Self::ProductNotFound
                | Self::UserNotFound
        )
    }

    /// Check if this is a provider-side error
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::Provider(_) | Self::AuthFailed { .. })
    }
}
