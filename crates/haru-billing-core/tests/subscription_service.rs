//! Subscription service behavior: registration and cancel

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use common::mock_gateway::MockGateway;
use common::mock_repos::{MockPaymentRepository, MockSubscriptionRepository, MockUserRepository};
use haru_billing_core::{BillingError, RegisterBillingKey, SubscriptionService};
use haru_types::{PayMethod, PayMethodKind};

type TestService = SubscriptionService<
    MockGateway,
    MockSubscriptionRepository,
    MockUserRepository,
    MockPaymentRepository,
>;

struct Fixture {
    service: TestService,
    gateway: Arc<MockGateway>,
    subs: Arc<MockSubscriptionRepository>,
    users: Arc<MockUserRepository>,
    payments: Arc<MockPaymentRepository>,
}

fn fixture() -> Fixture {
    let gateway = Arc::new(MockGateway::new());
    let subs = Arc::new(MockSubscriptionRepository::new());
    let users = Arc::new(MockUserRepository::new());
    let payments = Arc::new(MockPaymentRepository::new());

    let service = SubscriptionService::new(
        gateway.clone(),
        subs.clone(),
        users.clone(),
        payments.clone(),
    );

    Fixture {
        service,
        gateway,
        subs,
        users,
        payments,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn register_request(user_id: uuid::Uuid) -> RegisterBillingKey {
    RegisterBillingKey {
        user_id,
        billing_key: "bk-new".to_string(),
        order_ref: "reg-0001".to_string(),
        amount: 9_900,
        provider_code: "success".to_string(),
        message: "approved".to_string(),
        pay_method: Some(PayMethod {
            kind: PayMethodKind::Card,
            issuer: "Shinhan".to_string(),
            masked_number: "1234-****-****-5678".to_string(),
        }),
    }
}

#[tokio::test]
async fn registration_creates_an_active_subscription() {
    let f = fixture();
    let user = MockUserRepository::make_user(false);
    f.users.insert_user(user.clone());

    let today = date(2024, 3, 15);
    let sub = f
        .service
        .register_billing_key(register_request(user.id), today, Utc::now())
        .await
        .unwrap();

    let stored = f.subs.get(sub.id).unwrap();
    assert_eq!(stored.status, "active");
    assert_eq!(stored.billing_key.as_deref(), Some("bk-new"));
    assert_eq!(stored.next_billing_date, Some(date(2024, 4, 15)));

    let updated_user = f.users.get(user.id).unwrap();
    assert!(updated_user.subscriber);
    assert_eq!(updated_user.pay_method_issuer.as_deref(), Some("Shinhan"));

    let trail = f.payments.for_subscription(sub.id);
    assert_eq!(trail.len(), 1);
    assert!(trail[0].succeeded);
}

#[tokio::test]
async fn reregistration_replaces_the_key_and_restarts_billing() {
    let f = fixture();
    let user = MockUserRepository::make_user(false);
    f.users.insert_user(user.clone());

    // Lapsed subscriber: payment_failed, no schedule
    let old = MockSubscriptionRepository::make_subscription(user.id, "payment_failed", None, None);
    f.subs.insert(old.clone());

    let today = date(2024, 3, 15);
    f.service
        .register_billing_key(register_request(user.id), today, Utc::now())
        .await
        .unwrap();

    let stored = f.subs.get(old.id).unwrap();
    assert_eq!(stored.status, "active");
    assert_eq!(stored.billing_key.as_deref(), Some("bk-new"));
    assert_eq!(stored.next_billing_date, Some(date(2024, 4, 15)));
    assert!(f.users.get(user.id).unwrap().subscriber);
}

#[tokio::test]
async fn cancel_deletes_the_key_and_keeps_the_schedule() {
    let f = fixture();
    let user = MockUserRepository::make_user(true);
    let next = date(2024, 4, 1);
    let sub = MockSubscriptionRepository::make_subscription(
        user.id,
        "active",
        Some("bk1"),
        Some(next),
    );
    f.users.insert_user(user.clone());
    f.subs.insert(sub.clone());

    f.service.cancel(user.id).await.unwrap();

    let stored = f.subs.get(sub.id).unwrap();
    assert_eq!(stored.status, "canceled");
    // Retained so the renewal pass can expire it at period end
    assert_eq!(stored.next_billing_date, Some(next));
    assert_eq!(f.gateway.deleted_keys(), vec!["bk1".to_string()]);

    // The paid period keeps running; the flag only flips on expiry
    assert!(f.users.get(user.id).unwrap().subscriber);
}

#[tokio::test]
async fn cancel_is_rejected_unless_active() {
    let f = fixture();

    for status in ["canceled", "payment_failed", "expired"] {
        let user = MockUserRepository::make_user(false);
        let sub = MockSubscriptionRepository::make_subscription(
            user.id,
            status,
            Some("bk1"),
            None,
        );
        f.users.insert_user(user.clone());
        f.subs.insert(sub.clone());

        let err = f.service.cancel(user.id).await.unwrap_err();
        assert!(
            matches!(err, BillingError::InvalidStatus { .. }),
            "{status} should be rejected, got {err:?}"
        );

        // No state change
        assert_eq!(f.subs.get(sub.id).unwrap().status, status);
    }

    assert!(f.gateway.deleted_keys().is_empty());
}

#[tokio::test]
async fn cancel_without_a_subscription_is_not_found() {
    let f = fixture();
    let user = MockUserRepository::make_user(false);
    f.users.insert_user(user.clone());

    let err = f.service.cancel(user.id).await.unwrap_err();
    assert!(matches!(err, BillingError::SubscriptionNotFound));
}

#[tokio::test]
async fn declined_key_deletion_aborts_with_no_state_change() {
    let f = fixture();
    let user = MockUserRepository::make_user(true);
    let sub = MockSubscriptionRepository::make_subscription(
        user.id,
        "active",
        Some("bk1"),
        Some(date(2024, 4, 1)),
    );
    f.users.insert_user(user.clone());
    f.subs.insert(sub.clone());
    f.gateway.delete_declines.store(true, Ordering::SeqCst);

    let err = f.service.cancel(user.id).await.unwrap_err();
    assert!(matches!(err, BillingError::Declined { .. }));

    let stored = f.subs.get(sub.id).unwrap();
    assert_eq!(stored.status, "active");
    assert_eq!(stored.next_billing_date, Some(date(2024, 4, 1)));
}
