//! Events errors

use thiserror::Error;

/// Events errors
#[derive(Error, Debug)]
pub enum EventsError {
    /// Provider transport or parsing error
    #[error("provider error: {0}")]
    Provider(String),

    /// Tracking provider returned GraphQL errors
    #[error("tracking query failed: {0}")]
    Tracking(String),

    /// Webhook verification or parsing error
    #[error("webhook error: {0}")]
    Webhook(String),

    /// Mail provider error
    #[error("mail error: {0}")]
    Mail(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] haru_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}
