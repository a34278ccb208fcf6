//! API endpoints.

mod articles;
mod auth;
mod dashboard;
mod friends;
mod hashtags;
mod messages;
mod nfts;
mod notifications;
mod persons;
mod reports;

use axum::Router;
use matrix_common::PageRequest;
use serde::Deserialize;

use crate::middleware::AppState;

pub use articles::create_post_router;

/// `?page=&pageSize=` shared by the listing endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl PageQuery {
    #[must_use]
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.page, self.page_size)
    }
}

/// Create the API router, to be nested under `/api`.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/persons", persons::router())
        .nest("/nfts", nfts::router())
        .nest("/friends", friends::router())
        .nest("/articles", articles::router())
        .nest("/hashtags", hashtags::router())
        .nest("/reports", reports::router())
        .nest("/notifications", notifications::router())
        .nest("/messages", messages::router())
        .nest("/dashboard", dashboard::router(state))
}
