//! REST API handlers

pub mod auth;
pub mod health;
pub mod pass;
pub mod refund;
pub mod renewal;
pub mod shared;
pub mod subscription;

pub use auth::*;
pub use health::*;
pub use pass::*;
pub use refund::*;
pub use renewal::*;
pub use subscription::*;
