//! Mock repositories for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use haru_db::{
    CreateNotification, CreateOrder, CreateUser, DbResult, NotificationRepository,
    NotificationRow, OrderRepository, OrderRow, UserRepository, UserRow,
};

/// In-memory order repository for testing
#[derive(Default, Clone)]
pub struct MockOrderRepository {
    orders: Arc<DashMap<Uuid, OrderRow>>,
}

impl MockOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order: OrderRow) {
        self.orders.insert(order.id, order);
    }

    /// Build an order already carrying a tracking number
    pub fn make_tracked_order(carrier_id: &str, tracking_number: &str) -> OrderRow {
        OrderRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity: 1,
            amount: 10_000,
            payment_oid: Some("oid-1".to_string()),
            paid_at: Some(Utc::now()),
            carrier_id: Some(carrier_id.to_string()),
            tracking_number: Some(tracking_number.to_string()),
            delivery_status: None,
            delivery_events: None,
            created_at: Utc::now(),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<OrderRow> {
        self.orders.get(&id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl OrderRepository for MockOrderRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<OrderRow>> {
        Ok(self.orders.get(&id).map(|r| r.value().clone()))
    }

    async fn create(&self, order: CreateOrder) -> DbResult<OrderRow> {
        let row = OrderRow {
            id: order.id,
            user_id: order.user_id,
            product_id: order.product_id,
            quantity: order.quantity,
            amount: order.amount,
            payment_oid: order.payment_oid,
            paid_at: order.paid_at,
            carrier_id: None,
            tracking_number: None,
            delivery_status: None,
            delivery_events: None,
            created_at: Utc::now(),
        };
        self.insert(row.clone());
        Ok(row)
    }

    async fn find_by_tracking(
        &self,
        carrier_id: &str,
        tracking_number: &str,
    ) -> DbResult<Vec<OrderRow>> {
        Ok(self
            .orders
            .iter()
            .filter(|r| {
                r.value().carrier_id.as_deref() == Some(carrier_id)
                    && r.value().tracking_number.as_deref() == Some(tracking_number)
            })
            .map(|r| r.value().clone())
            .collect())
    }

    async fn update_delivery(
        &self,
        id: Uuid,
        status: &str,
        events: serde_json::Value,
    ) -> DbResult<u64> {
        if let Some(mut order) = self.orders.get_mut(&id) {
            order.delivery_status = Some(status.to_string());
            order.delivery_events = Some(events);
            return Ok(1);
        }
        Ok(0)
    }

    async fn archive_and_delete(&self, order: &OrderRow) -> DbResult<()> {
        self.orders.remove(&order.id);
        Ok(())
    }
}

/// In-memory notification repository for testing
#[derive(Default, Clone)]
pub struct MockNotificationRepository {
    notifications: Arc<DashMap<Uuid, NotificationRow>>,
}

impl MockNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a notification at a specific time
    pub fn seed(&self, owner_id: Uuid, created_at: DateTime<Utc>) {
        let row = NotificationRow {
            id: Uuid::new_v4(),
            owner_id,
            actor_id: Uuid::new_v4(),
            kind: "like".to_string(),
            post_id: "seed".to_string(),
            message: "seed".to_string(),
            created_at,
        };
        self.notifications.insert(row.id, row);
    }

    pub fn for_owner(&self, owner_id: Uuid) -> Vec<NotificationRow> {
        self.notifications
            .iter()
            .filter(|r| r.value().owner_id == owner_id)
            .map(|r| r.value().clone())
            .collect()
    }
}

#[async_trait]
impl NotificationRepository for MockNotificationRepository {
    async fn append(&self, notification: CreateNotification) -> DbResult<NotificationRow> {
        let row = NotificationRow {
            id: notification.id,
            owner_id: notification.owner_id,
            actor_id: notification.actor_id,
            kind: notification.kind,
            post_id: notification.post_id,
            message: notification.message,
            created_at: Utc::now(),
        };
        self.notifications.insert(row.id, row.clone());
        Ok(row)
    }

    async fn count_since(&self, owner_id: Uuid, since: DateTime<Utc>) -> DbResult<i64> {
        Ok(self
            .notifications
            .iter()
            .filter(|r| r.value().owner_id == owner_id && r.value().created_at >= since)
            .count() as i64)
    }
}

/// In-memory user repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_named(&self, id: Uuid, nickname: &str) {
        let row = UserRow {
            id,
            email: format!("{nickname}@example.com"),
            nickname: nickname.to_string(),
            subscriber: false,
            pay_method_kind: None,
            pay_method_issuer: None,
            pay_method_masked: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.users.insert(id, row);
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        let row = UserRow {
            id: user.id,
            email: user.email,
            nickname: user.nickname,
            subscriber: false,
            pay_method_kind: None,
            pay_method_issuer: None,
            pay_method_masked: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn set_subscriber(&self, id: Uuid, subscriber: bool) -> DbResult<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.subscriber = subscriber;
        }
        Ok(())
    }

    async fn update_pay_method(
        &self,
        _id: Uuid,
        _kind: &str,
        _issuer: &str,
        _masked: &str,
    ) -> DbResult<()> {
        Ok(())
    }
}
