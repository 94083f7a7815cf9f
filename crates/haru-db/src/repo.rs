//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Create a new user
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;

    /// Set the subscriber flag mirrored from the subscription status
    async fn set_subscriber(&self, id: Uuid, subscriber: bool) -> DbResult<()>;

    /// Upsert the non-sensitive payment-method display fields
    async fn update_pay_method(
        &self,
        id: Uuid,
        kind: &str,
        issuer: &str,
        masked: &str,
    ) -> DbResult<()>;
}

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
}

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find the subscription owned by a user
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find subscriptions due for the renewal pass: active ones whose
    /// billing date has arrived, plus canceled ones whose period end
    /// (billing date minus one day) has arrived
    async fn find_due(&self, today: NaiveDate) -> DbResult<Vec<SubscriptionRow>>;

    /// Create a new subscription
    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow>;

    /// Replace the stored billing key (re-registration)
    async fn update_billing_key(&self, id: Uuid, billing_key: &str) -> DbResult<()>;

    /// Record a successful renewal: stay active, advance the billing date
    async fn mark_renewed(
        &self,
        id: Uuid,
        next_billing_date: NaiveDate,
        paid_at: DateTime<Utc>,
    ) -> DbResult<()>;

    /// Record a declined/errored renewal: payment_failed, schedule cleared
    async fn mark_payment_failed(&self, id: Uuid) -> DbResult<()>;

    /// End a canceled subscription at period end: expired, schedule cleared
    async fn mark_expired(&self, id: Uuid) -> DbResult<()>;

    /// Cancel an active subscription, retaining the billing date so the
    /// renewal pass can expire it at period end
    async fn mark_canceled(&self, id: Uuid) -> DbResult<()>;
}

/// Create subscription input
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub billing_key: Option<String>,
    pub next_billing_date: Option<NaiveDate>,
}

/// Payment audit repository trait (append-only)
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Append a billing attempt to the audit trail
    async fn append(&self, payment: CreatePayment) -> DbResult<PaymentRow>;

    /// List recent payments for a user, newest first
    async fn find_by_user_id(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<PaymentRow>>;
}

/// Create payment input
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub order_ref: String,
    pub amount: i64,
    pub provider_code: String,
    pub message: String,
    pub succeeded: bool,
}

/// Pending order repository trait
#[async_trait]
pub trait PendingOrderRepository: Send + Sync {
    /// Find the unique pending order by its callback join key
    async fn find_by_user_and_oid(
        &self,
        user_id: Uuid,
        payment_oid: &str,
    ) -> DbResult<Option<PendingOrderRow>>;

    /// Create a new pending order
    async fn create(&self, order: CreatePendingOrder) -> DbResult<PendingOrderRow>;

    /// Transition the pending order to success/failed
    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()>;
}

/// Create pending order input
#[derive(Debug, Clone)]
pub struct CreatePendingOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_oid: String,
    pub goods_name: String,
    pub amount: i64,
}

/// Order repository trait
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Find an order by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<OrderRow>>;

    /// Create a new order
    async fn create(&self, order: CreateOrder) -> DbResult<OrderRow>;

    /// Find all orders carrying a tracking number for a carrier
    async fn find_by_tracking(
        &self,
        carrier_id: &str,
        tracking_number: &str,
    ) -> DbResult<Vec<OrderRow>>;

    /// Update delivery status/events, returning the number of rows touched
    async fn update_delivery(
        &self,
        id: Uuid,
        status: &str,
        events: serde_json::Value,
    ) -> DbResult<u64>;

    /// Copy a refunded order into canceled_orders and delete it
    async fn archive_and_delete(&self, order: &OrderRow) -> DbResult<()>;
}

/// Create order input
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub amount: i64,
    pub payment_oid: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Product repository trait
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Find a product by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ProductRow>>;

    /// Atomically adjust the stock counter by a delta (may be negative)
    async fn adjust_stock(&self, id: Uuid, delta: i64) -> DbResult<()>;
}

/// Notification repository trait
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Append a notification to the owner's feed
    async fn append(&self, notification: CreateNotification) -> DbResult<NotificationRow>;

    /// Count notifications for an owner created at or after `since`
    async fn count_since(&self, owner_id: Uuid, since: DateTime<Utc>) -> DbResult<i64>;
}

/// Create notification input
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub actor_id: Uuid,
    pub kind: String,
    pub post_id: String,
    pub message: String,
}

/// Transfer webhook audit repository trait
#[async_trait]
pub trait TransferResultRepository: Send + Sync {
    /// Record a settlement transfer webhook payload
    async fn append(&self, result: CreateTransferResult) -> DbResult<TransferResultRow>;
}

/// Create transfer result input
#[derive(Debug, Clone)]
pub struct CreateTransferResult {
    pub id: Uuid,
    pub provider_code: Option<String>,
    pub payload: serde_json::Value,
}
