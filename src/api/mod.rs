use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::fetcher::PageFetcher;
use crate::ranking::Ranker;
use crate::search::SearchOrchestrator;
use crate::serp::SerpProvider;

pub mod handlers;
pub mod models;

pub fn create_router<S, R, F>(engine: Arc<SearchOrchestrator<S, R, F>>) -> Router
where
    S: SerpProvider,
    R: Ranker,
    F: PageFetcher,
{
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", post(handlers::search_handler::<S, R, F>))
        .route("/api/summary/:query", get(handlers::summary_handler::<S, R, F>))
        .route("/api/status", get(handlers::status_handler::<S, R, F>))
        .with_state(engine)
        .layer(cors)
}
