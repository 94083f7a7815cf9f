//! Haru Types - Shared domain types
//!
//! This crate contains domain types used across Haru services:
//! - User identity and payment-method display data
//! - Subscription status and lifecycle documents
//! - Orders, products, and pending payment staging records
//! - Social notification types

pub mod notification;
pub mod order;
pub mod subscription;
pub mod user;

pub use notification::*;
pub use order::*;
pub use subscription::*;
pub use user::*;
