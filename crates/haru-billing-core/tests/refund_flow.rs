//! Refund flow behavior

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::mock_gateway::MockGateway;
use common::mock_repos::{
    MockOrderRepository, MockPaymentRepository, MockProductRepository, MockUserRepository,
};
use haru_billing_core::{BillingError, RefundService};

type TestService =
    RefundService<MockGateway, MockOrderRepository, MockProductRepository, MockPaymentRepository>;

struct Fixture {
    service: TestService,
    gateway: Arc<MockGateway>,
    orders: Arc<MockOrderRepository>,
    products: Arc<MockProductRepository>,
    payments: Arc<MockPaymentRepository>,
}

fn fixture() -> Fixture {
    let gateway = Arc::new(MockGateway::new());
    let orders = Arc::new(MockOrderRepository::new());
    let products = Arc::new(MockProductRepository::new());
    let payments = Arc::new(MockPaymentRepository::new());

    let service = RefundService::new(
        gateway.clone(),
        orders.clone(),
        products.clone(),
        payments.clone(),
    );

    Fixture {
        service,
        gateway,
        orders,
        products,
        payments,
    }
}

#[tokio::test]
async fn refund_restores_stock_and_removes_the_order() {
    let f = fixture();
    let user = MockUserRepository::make_user(false);
    let product = MockProductRepository::make_product(7);
    let order = MockOrderRepository::make_order(user.id, product.id, 3, 30_000);
    let oid = order.payment_oid.clone().unwrap();
    f.products.insert(product.clone());
    f.orders.insert(order.clone());

    f.service.refund(user.id, order.id).await.unwrap();

    // Stock increases by exactly the ordered quantity
    assert_eq!(f.products.stock(product.id), Some(10));

    // The order document no longer exists; an archived copy does
    assert!(f.orders.get(order.id).is_none());
    assert!(f.orders.archived(order.id).is_some());

    assert_eq!(f.gateway.refunded_oids(), vec![oid]);

    let trail = f.payments.all();
    assert_eq!(trail.len(), 1);
    assert!(trail[0].succeeded);
    assert_eq!(trail[0].amount, 30_000);
}

#[tokio::test]
async fn refund_is_rejected_for_another_users_order() {
    let f = fixture();
    let owner = MockUserRepository::make_user(false);
    let caller = MockUserRepository::make_user(false);
    let product = MockProductRepository::make_product(7);
    let order = MockOrderRepository::make_order(owner.id, product.id, 3, 30_000);
    f.products.insert(product.clone());
    f.orders.insert(order.clone());

    let err = f.service.refund(caller.id, order.id).await.unwrap_err();
    assert!(matches!(err, BillingError::Forbidden));

    // Nothing moved
    assert_eq!(f.products.stock(product.id), Some(7));
    assert!(f.orders.get(order.id).is_some());
    assert!(f.gateway.refunded_oids().is_empty());
}

#[tokio::test]
async fn declined_refund_aborts_before_any_mutation() {
    let f = fixture();
    let user = MockUserRepository::make_user(false);
    let product = MockProductRepository::make_product(7);
    let order = MockOrderRepository::make_order(user.id, product.id, 3, 30_000);
    f.products.insert(product.clone());
    f.orders.insert(order.clone());
    f.gateway.refund_declines.store(true, Ordering::SeqCst);

    let err = f.service.refund(user.id, order.id).await.unwrap_err();
    assert!(matches!(err, BillingError::Declined { .. }));

    assert_eq!(f.products.stock(product.id), Some(7));
    assert!(f.orders.get(order.id).is_some());
    assert!(f.payments.all().is_empty());
}

#[tokio::test]
async fn order_without_payment_fields_cannot_be_refunded() {
    let f = fixture();
    let user = MockUserRepository::make_user(false);
    let product = MockProductRepository::make_product(7);
    let mut order = MockOrderRepository::make_order(user.id, product.id, 3, 30_000);
    order.payment_oid = None;
    f.products.insert(product);
    f.orders.insert(order.clone());

    let err = f.service.refund(user.id, order.id).await.unwrap_err();
    assert!(matches!(err, BillingError::MissingPaymentRef));
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let f = fixture();
    let user = MockUserRepository::make_user(false);

    let err = f
        .service
        .refund(user.id, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::OrderNotFound));
}
