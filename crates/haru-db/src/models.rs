//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    /// Mirrors the subscription status: true while the subscription is active
    pub subscriber: bool,
    pub pay_method_kind: Option<String>,
    pub pay_method_issuer: Option<String>,
    pub pay_method_masked: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subscription row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub billing_key: Option<String>,
    pub status: String,
    pub next_billing_date: Option<NaiveDate>,
    pub last_paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment audit row (append-only)
#[derive(Debug, Clone, FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Option<Uuid>,
    /// Provider order id / renewal reference this attempt belongs to
    pub order_ref: String,
    /// Amount in KRW
    pub amount: i64,
    pub provider_code: String,
    pub message: String,
    pub succeeded: bool,
    pub created_at: DateTime<Utc>,
}

/// Pending order row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PendingOrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Provider payment oid, the callback join key together with user_id
    pub payment_oid: String,
    pub goods_name: String,
    pub amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order row from the database
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub amount: i64,
    pub payment_oid: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub carrier_id: Option<String>,
    pub tracking_number: Option<String>,
    pub delivery_status: Option<String>,
    pub delivery_events: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Product row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

/// Notification row from the database
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    /// User whose post was liked/commented on
    pub owner_id: Uuid,
    pub actor_id: Uuid,
    pub kind: String,
    pub post_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Settlement transfer webhook audit row
#[derive(Debug, Clone, FromRow)]
pub struct TransferResultRow {
    pub id: Uuid,
    pub provider_code: Option<String>,
    pub payload: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

// Conversion helpers from row types to haru-types domain ids
impl UserRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> haru_types::UserId {
        haru_types::UserId(self.id)
    }
}

impl SubscriptionRow {
    /// Convert to domain SubscriptionId
    pub fn subscription_id(&self) -> haru_types::SubscriptionId {
        haru_types::SubscriptionId(self.id)
    }

    /// Convert to domain UserId
    pub fn user_id(&self) -> haru_types::UserId {
        haru_types::UserId(self.user_id)
    }
}

impl OrderRow {
    /// Convert to domain OrderId
    pub fn order_id(&self) -> haru_types::OrderId {
        haru_types::OrderId(self.id)
    }
}
