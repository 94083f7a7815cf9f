//! PostgreSQL repository implementations

mod notification;
mod order;
mod payment;
mod pending_order;
mod product;
mod subscription;
mod transfer;
mod user;

pub use notification::PgNotificationRepository;
pub use order::PgOrderRepository;
pub use payment::PgPaymentRepository;
pub use pending_order::PgPendingOrderRepository;
pub use product::PgProductRepository;
pub use subscription::PgSubscriptionRepository;
pub use transfer::PgTransferResultRepository;
pub use user::PgUserRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub subscriptions: PgSubscriptionRepository,
    pub payments: PgPaymentRepository,
    pub pending_orders: PgPendingOrderRepository,
    pub orders: PgOrderRepository,
    pub products: PgProductRepository,
    pub notifications: PgNotificationRepository,
    pub transfer_results: PgTransferResultRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            payments: PgPaymentRepository::new(pool.clone()),
            pending_orders: PgPendingOrderRepository::new(pool.clone()),
            orders: PgOrderRepository::new(pool.clone()),
            products: PgProductRepository::new(pool.clone()),
            notifications: PgNotificationRepository::new(pool.clone()),
            transfer_results: PgTransferResultRepository::new(pool),
        }
    }
}
