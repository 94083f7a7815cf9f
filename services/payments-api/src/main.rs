//! Haru Payments API
//!
//! Payments microservice bridging the mobile app to the payment provider.
//!
//! ## REST Endpoints
//!
//! - `POST /api/v1/pay/auth` - Obtain a provider credential for the payment window
//! - `POST /api/v1/orders/pending` - Stage a pending order before payment
//! - `POST /api/v1/subscription/cancel` - Cancel the caller's subscription
//! - `POST /api/v1/refund` - Refund an order
//! - `POST /callbacks/pass` - One-time payment result callback
//! - `POST /callbacks/billing-key` - Billing-key registration callback
//! - `POST /internal/renewal/run` - Run one renewal pass (scheduler-invoked)
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod extractors;
mod handlers;
mod state;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("payments_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Haru Payments API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        receipt_enabled = config.receipt.is_some(),
        mail_enabled = config.mailer.is_some(),
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool
    let pool = haru_db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Create application state (repositories, gateway, services)
    let state = AppState::new(pool, config);

    // Build HTTP router
    let app = build_router(state.clone(), metrics_handle);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.http_port));
    run_http_server(app, addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    // API v1 routes
    let api_v1 = Router::new()
        .route("/pay/auth", post(handlers::pay_auth))
        .route("/orders/pending", post(handlers::create_pending))
        .route("/subscription/cancel", post(handlers::cancel_subscription))
        .route("/refund", post(handlers::refund));

    // Provider callback routes (form bodies, HTML redirect responses)
    let callback_routes = Router::new()
        .route("/callbacks/pass", post(handlers::pass_callback))
        .route("/callbacks/billing-key", post(handlers::billing_key_callback));

    // Internal routes (invoked by the platform scheduler)
    let internal_routes = Router::new().route("/internal/renewal/run", post(handlers::run_renewal));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    // Combine all routes
    Router::new()
        .nest("/api/v1", api_v1)
        .merge(callback_routes)
        .merge(internal_routes)
        .layer(middleware)
        .merge(health_routes) // Health routes without timeout
        .merge(metrics_route) // Metrics route without timeout
        .with_state(state)
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Latency buckets sized for handler flows that hold one or two provider
    // round-trips
    let payment_latency_buckets = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

    let builder = PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("payments_operation_duration_seconds".to_string()),
        payment_latency_buckets,
    )?;

    let handle = builder.install_recorder()?;

    // Register metrics with descriptions
    metrics::describe_counter!(
        "payments_billing_keys_registered_total",
        "Total billing keys registered"
    );
    metrics::describe_counter!(
        "payments_subscriptions_canceled_total",
        "Total subscriptions canceled"
    );
    metrics::describe_counter!(
        "payments_pass_confirmations_total",
        "Total Pass confirmations by final status"
    );
    metrics::describe_counter!("payments_refunds_total", "Total refunds completed");
    metrics::describe_counter!(
        "payments_renewals_total",
        "Total renewal pass records by outcome"
    );
    metrics::describe_histogram!(
        "payments_operation_duration_seconds",
        "Payment operation latency in seconds by operation"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
