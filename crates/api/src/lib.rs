//! HTTP API layer for Matrix.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: auth, persons, follows, friends, articles, reports,
//!   notifications, messages and the admin dashboard
//! - **Extractors**: authenticated caller, admin guard, culture cookie
//! - **Middleware**: token authentication, admin activity logging
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::{create_post_router, router};
pub use middleware::AppState;
