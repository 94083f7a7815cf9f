//! Application state for the Events API service.

use std::sync::Arc;

use haru_db::pg::{PgNotificationRepository, PgOrderRepository, PgUserRepository, Repositories};
use haru_db::DbPool;
use haru_events_core::{NotificationEngine, OrderTracker, SignatureVerifier, TrackingClient};

use crate::config::Config;

/// Concrete engine types wired to Postgres
pub type Tracker = OrderTracker<PgOrderRepository>;
pub type Notifications = NotificationEngine<PgNotificationRepository, PgUserRepository>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Delivery tracking applied to orders
    pub tracker: Arc<Tracker>,
    /// Social notification engine
    pub notifications: Arc<Notifications>,
    /// Settlement webhook verifier, when a secret is configured
    pub transfer_verifier: Option<SignatureVerifier>,
    /// Database repositories
    pub repos: Repositories,
    /// Database pool (readiness probe)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire all engines from the pool and configuration
    pub fn new(pool: DbPool, config: Config) -> Self {
        let repos = Repositories::new(pool.clone());

        let tracking = TrackingClient::new(config.tracking_endpoint.clone());
        let tracker = Arc::new(OrderTracker::new(
            tracking,
            Arc::new(repos.orders.clone()),
        ));

        let notifications = Arc::new(NotificationEngine::new(
            Arc::new(repos.notifications.clone()),
            Arc::new(repos.users.clone()),
        ));

        let transfer_verifier = config
            .transfer_webhook_secret
            .clone()
            .map(SignatureVerifier::new);

        Self {
            tracker,
            notifications,
            transfer_verifier,
            repos,
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
