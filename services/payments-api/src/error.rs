//! Error types for the Payments API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use haru_billing_core::BillingError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Missing or invalid caller identity")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Billing error")]
    Billing(#[from] BillingError),

    #[error("Database error")]
    Database(#[from] haru_db::DbError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Billing(e) => match e {
                _ if e.is_not_found() => StatusCode::NOT_FOUND,
                BillingError::Forbidden => StatusCode::FORBIDDEN,
                BillingError::InvalidStatus { .. }
                | BillingError::InvalidCallback(_)
                | BillingError::MissingPaymentRef => StatusCode::BAD_REQUEST,
                BillingError::Declined { .. } => StatusCode::PAYMENT_REQUIRED,
                // Provider auth failures surface as a gateway problem with the
                // raw payload attached for diagnosis
                BillingError::AuthFailed { .. } | BillingError::Provider(_) => {
                    StatusCode::BAD_GATEWAY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Internal(_) | Self::Database(_) => "INTERNAL_ERROR",
            Self::Billing(e) => match e {
                BillingError::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
                BillingError::PendingOrderNotFound => "PENDING_ORDER_NOT_FOUND",
                BillingError::OrderNotFound => "ORDER_NOT_FOUND",
                BillingError::ProductNotFound => "PRODUCT_NOT_FOUND",
                BillingError::UserNotFound => "USER_NOT_FOUND",
                BillingError::Forbidden => "FORBIDDEN",
                BillingError::InvalidStatus { .. } => "INVALID_STATUS",
                BillingError::InvalidCallback(_) => "INVALID_CALLBACK",
                BillingError::MissingPaymentRef => "MISSING_PAYMENT_REF",
                BillingError::Declined { .. } => "PAYMENT_DECLINED",
                BillingError::AuthFailed { .. } => "PROVIDER_AUTH_FAILED",
                BillingError::Provider(_) => "PROVIDER_ERROR",
                _ => "INTERNAL_ERROR",
            },
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            // The provider's raw error payload travels with auth failures
            Self::Billing(BillingError::AuthFailed { raw, .. }) => Some(raw.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
