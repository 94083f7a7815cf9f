//! Mock repositories for testing

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use haru_db::{
    CreateOrder, CreatePayment, CreatePendingOrder, CreateSubscription, CreateUser, DbResult,
    OrderRepository, OrderRow, PaymentRepository, PaymentRow, PendingOrderRepository,
    PendingOrderRow, ProductRepository, ProductRow, SubscriptionRepository, SubscriptionRow,
    UserRepository, UserRow,
};

/// In-memory subscription repository for testing
#[derive(Default, Clone)]
pub struct MockSubscriptionRepository {
    subs: Arc<DashMap<Uuid, SubscriptionRow>>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test subscription directly
    pub fn insert(&self, sub: SubscriptionRow) {
        self.subs.insert(sub.id, sub);
    }

    /// Build a test subscription row
    pub fn make_subscription(
        user_id: Uuid,
        status: &str,
        billing_key: Option<&str>,
        next_billing_date: Option<NaiveDate>,
    ) -> SubscriptionRow {
        SubscriptionRow {
            id: Uuid::new_v4(),
            user_id,
            billing_key: billing_key.map(str::to_string),
            status: status.to_string(),
            next_billing_date,
            last_paid_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Read a subscription back out
    pub fn get(&self, id: Uuid) -> Option<SubscriptionRow> {
        self.subs.get(&id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self.subs.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self
            .subs
            .iter()
            .find(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone()))
    }

    async fn find_due(&self, today: NaiveDate) -> DbResult<Vec<SubscriptionRow>> {
        let tomorrow = today.succ_opt().unwrap_or(today);
        let mut due: Vec<SubscriptionRow> = self
            .subs
            .iter()
            .filter(|r| {
                let row = r.value();
                match (row.status.as_str(), row.next_billing_date) {
                    ("active", Some(next)) => next <= today,
                    ("canceled", Some(next)) => next <= tomorrow,
                    _ => false,
                }
            })
            .map(|r| r.value().clone())
            .collect();
        due.sort_by_key(|r| r.next_billing_date);
        Ok(due)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let row = SubscriptionRow {
            id: sub.id,
            user_id: sub.user_id,
            billing_key: sub.billing_key,
            status: "active".to_string(),
            next_billing_date: sub.next_billing_date,
            last_paid_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.insert(row.clone());
        Ok(row)
    }

    async fn update_billing_key(&self, id: Uuid, billing_key: &str) -> DbResult<()> {
        if let Some(mut sub) = self.subs.get_mut(&id) {
            sub.billing_key = Some(billing_key.to_string());
            sub.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_renewed(
        &self,
        id: Uuid,
        next_billing_date: NaiveDate,
        paid_at: DateTime<Utc>,
    ) -> DbResult<()> {
        if let Some(mut sub) = self.subs.get_mut(&id) {
            sub.status = "active".to_string();
            sub.next_billing_date = Some(next_billing_date);
            sub.last_paid_at = Some(paid_at);
            sub.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_payment_failed(&self, id: Uuid) -> DbResult<()> {
        if let Some(mut sub) = self.subs.get_mut(&id) {
            sub.status = "payment_failed".to_string();
            sub.next_billing_date = None;
            sub.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_expired(&self, id: Uuid) -> DbResult<()> {
        if let Some(mut sub) = self.subs.get_mut(&id) {
            sub.status = "expired".to_string();
            sub.next_billing_date = None;
            sub.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_canceled(&self, id: Uuid) -> DbResult<()> {
        if let Some(mut sub) = self.subs.get_mut(&id) {
            sub.status = "canceled".to_string();
            sub.updated_at = Utc::now();
        }
        Ok(())
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

    /// Insert a test user directly
    pub fn insert_user(&self, user: UserRow) {
        self.users.insert(user.id, user);
    }

    /// Build a test user row
    pub fn make_user(subscriber: bool) -> UserRow {
        let id = Uuid::new_v4();
        UserRow {
            id,
            email: format!("test-{id}@example.com"),
            nickname: "tester".to_string(),
            subscriber,
            pay_method_kind: None,
            pay_method_issuer: None,
            pay_method_masked: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Read a user back out
    pub fn get(&self, id: Uuid) -> Option<UserRow> {
        self.users.get(&id).map(|r| r.value().clone())
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
        self.insert_user(row.clone());
        Ok(row)
    }

    async fn set_subscriber(&self, id: Uuid, subscriber: bool) -> DbResult<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.subscriber = subscriber;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_pay_method(
        &self,
        id: Uuid,
        kind: &str,
        issuer: &str,
        masked: &str,
    ) -> DbResult<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.pay_method_kind = Some(kind.to_string());
            user.pay_method_issuer = Some(issuer.to_string());
            user.pay_method_masked = Some(masked.to_string());
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// In-memory payment audit repository for testing
#[derive(Default, Clone)]
pub struct MockPaymentRepository {
    payments: Arc<DashMap<Uuid, PaymentRow>>,
}

impl MockPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded payments for a subscription
    pub fn for_subscription(&self, subscription_id: Uuid) -> Vec<PaymentRow> {
        self.payments
            .iter()
            .filter(|r| r.value().subscription_id == Some(subscription_id))
            .map(|r| r.value().clone())
            .collect()
    }

    /// All recorded payments
    pub fn all(&self) -> Vec<PaymentRow> {
        self.payments.iter().map(|r| r.value().clone()).collect()
    }
}

#[async_trait]
impl PaymentRepository for MockPaymentRepository {
    async fn append(&self, payment: CreatePayment) -> DbResult<PaymentRow> {
        let row = PaymentRow {
            id: payment.id,
            user_id: payment.user_id,
            subscription_id: payment.subscription_id,
            order_ref: payment.order_ref,
            amount: payment.amount,
            provider_code: payment.provider_code,
            message: payment.message,
            succeeded: payment.succeeded,
            created_at: Utc::now(),
        };
        self.payments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_user_id(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<PaymentRow>> {
        let mut rows: Vec<PaymentRow> = self
            .payments
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

/// In-memory pending order repository for testing
#[derive(Default, Clone)]
pub struct MockPendingOrderRepository {
    orders: Arc<DashMap<Uuid, PendingOrderRow>>,
}

impl MockPendingOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order: PendingOrderRow) {
        self.orders.insert(order.id, order);
    }

    pub fn make_pending(user_id: Uuid, payment_oid: &str, amount: i64) -> PendingOrderRow {
        PendingOrderRow {
            id: Uuid::new_v4(),
            user_id,
            payment_oid: payment_oid.to_string(),
            goods_name: "goods".to_string(),
            amount,
            status: "pending".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<PendingOrderRow> {
        self.orders.get(&id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl PendingOrderRepository for MockPendingOrderRepository {
    async fn find_by_user_and_oid(
        &self,
        user_id: Uuid,
        payment_oid: &str,
    ) -> DbResult<Option<PendingOrderRow>> {
        Ok(self
            .orders
            .iter()
            .find(|r| r.value().user_id == user_id && r.value().payment_oid == payment_oid)
            .map(|r| r.value().clone()))
    }

    async fn create(&self, order: CreatePendingOrder) -> DbResult<PendingOrderRow> {
        let row = PendingOrderRow {
            id: order.id,
            user_id: order.user_id,
            payment_oid: order.payment_oid,
            goods_name: order.goods_name,
            amount: order.amount,
            status: "pending".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.insert(row.clone());
        Ok(row)
    }

    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()> {
        if let Some(mut order) = self.orders.get_mut(&id) {
            order.status = status.to_string();
            order.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// In-memory order repository for testing
#[derive(Default, Clone)]
pub struct MockOrderRepository {
    orders: Arc<DashMap<Uuid, OrderRow>>,
    archived: Arc<DashMap<Uuid, OrderRow>>,
}

impl MockOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order: OrderRow) {
        self.orders.insert(order.id, order);
    }

    pub fn make_order(user_id: Uuid, product_id: Uuid, quantity: i32, amount: i64) -> OrderRow {
        OrderRow {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            quantity,
            amount,
            payment_oid: Some(format!("oid-{}", Uuid::new_v4().simple())),
            paid_at: Some(Utc::now()),
            carrier_id: None,
            tracking_number: None,
            delivery_status: None,
            delivery_events: None,
            created_at: Utc::now(),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<OrderRow> {
        self.orders.get(&id).map(|r| r.value().clone())
    }

    pub fn archived(&self, id: Uuid) -> Option<OrderRow> {
        self.archived.get(&id).map(|r| r.value().clone())
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
        if let Some((_, row)) = self.orders.remove(&order.id) {
            self.archived.insert(row.id, row);
        }
        Ok(())
    }
}

/// In-memory product repository for testing
#[derive(Default, Clone)]
pub struct MockProductRepository {
    products: Arc<DashMap<Uuid, ProductRow>>,
}

impl MockProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: ProductRow) {
        self.products.insert(product.id, product);
    }

    pub fn make_product(stock: i64) -> ProductRow {
        ProductRow {
            id: Uuid::new_v4(),
            name: "product".to_string(),
            price: 10_000,
            stock,
            created_at: Utc::now(),
        }
    }

    pub fn stock(&self, id: Uuid) -> Option<i64> {
        self.products.get(&id).map(|r| r.value().stock)
    }
}

#[async_trait]
impl ProductRepository for MockProductRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ProductRow>> {
        Ok(self.products.get(&id).map(|r| r.value().clone()))
    }

    async fn adjust_stock(&self, id: Uuid, delta: i64) -> DbResult<()> {
        if let Some(mut product) = self.products.get_mut(&id) {
            product.stock += delta;
        }
        Ok(())
    }
}
