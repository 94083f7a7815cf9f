//! Haru DB - Database abstractions
//!
//! SQLx-based database layer for Haru services. The mobile app's document
//! collections (subscriptions, users, payments, pending orders, orders,
//! products, notifications, transfer results) are persisted as Postgres
//! tables behind async repository traits.
//!
//! # Example
//!
//! ```rust,ignore
//! use haru_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/haru").await?;
//! let repos = Repositories::new(pool);
//!
//! let due = repos.subscriptions.find_due(today).await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, DbPool};
pub use repo::*;
