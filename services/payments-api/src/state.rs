//! Application state for the Payments API service.

use std::sync::Arc;

use haru_billing_core::{
    PassService, PaypleClient, ReceiptClient, RefundService, RenewalRunner, SubscriptionService,
};
use haru_db::pg::{
    PgOrderRepository, PgPaymentRepository, PgPendingOrderRepository, PgProductRepository,
    PgSubscriptionRepository, PgUserRepository, Repositories,
};
use haru_db::DbPool;
use haru_events_core::Mailer;

use crate::config::Config;

/// Concrete service types wired to the Payple gateway and Postgres
pub type Subscriptions =
    SubscriptionService<PaypleClient, PgSubscriptionRepository, PgUserRepository, PgPaymentRepository>;
pub type Pass =
    PassService<PaypleClient, PgPendingOrderRepository, PgPaymentRepository, PgUserRepository>;
pub type Refunds =
    RefundService<PaypleClient, PgOrderRepository, PgProductRepository, PgPaymentRepository>;
pub type Renewals =
    RenewalRunner<PaypleClient, PgSubscriptionRepository, PgUserRepository, PgPaymentRepository>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Payple gateway (auth passthrough endpoint)
    pub gateway: Arc<PaypleClient>,
    /// Subscription lifecycle (billing-key registration, cancel)
    pub subscriptions: Arc<Subscriptions>,
    /// One-time payment confirmation
    pub pass: Arc<Pass>,
    /// Refunds
    pub refunds: Arc<Refunds>,
    /// Batch renewal pass
    pub renewals: Arc<Renewals>,
    /// Database repositories (for direct access if needed)
    pub repos: Repositories,
    /// Transactional mail, when configured
    pub mailer: Option<Mailer>,
    /// Database pool (readiness probe)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire all services from the pool and configuration
    pub fn new(pool: DbPool, config: Config) -> Self {
        let repos = Repositories::new(pool.clone());
        let gateway = Arc::new(PaypleClient::new(config.billing.clone()));

        let subscriptions_repo = Arc::new(repos.subscriptions.clone());
        let users_repo = Arc::new(repos.users.clone());
        let payments_repo = Arc::new(repos.payments.clone());

        let subscriptions = Arc::new(SubscriptionService::new(
            gateway.clone(),
            subscriptions_repo.clone(),
            users_repo.clone(),
            payments_repo.clone(),
        ));

        let receipts = config.receipt.clone().map(ReceiptClient::new);
        let pass = Arc::new(PassService::new(
            gateway.clone(),
            Arc::new(repos.pending_orders.clone()),
            payments_repo.clone(),
            users_repo.clone(),
            receipts,
        ));

        let refunds = Arc::new(RefundService::new(
            gateway.clone(),
            Arc::new(repos.orders.clone()),
            Arc::new(repos.products.clone()),
            payments_repo.clone(),
        ));

        let renewals = Arc::new(RenewalRunner::new(
            gateway.clone(),
            subscriptions_repo,
            users_repo,
            payments_repo,
            config.billing.clone(),
        ));

        let mailer = config.mailer.clone().map(Mailer::new);

        Self {
            gateway,
            subscriptions,
            pass,
            refunds,
            renewals,
            repos,
            mailer,
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
