use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::data_models::{SearchResult, SearchSummary, ServiceStatus};
use crate::fetcher::PageFetcher;
use crate::ranking::Ranker;
use crate::search::{SearchOrchestrator, summarize};
use crate::serp::SerpProvider;

use super::models::{SearchParams, SearchRequest, StatusResponse};

type Engine<S, R, F> = Arc<SearchOrchestrator<S, R, F>>;

pub async fn search_handler<S, R, F>(
    State(engine): State<Engine<S, R, F>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResult>, (StatusCode, String)>
where
    S: SerpProvider,
    R: Ranker,
    F: PageFetcher,
{
    let query = request.query.trim().to_string();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query cannot be empty".to_string()));
    }
    let params = SearchParams {
        location: request.location,
        language: request.language,
    };

    let result = run_search(engine, query, params).await?;
    Ok(Json(result))
}

pub async fn summary_handler<S, R, F>(
    State(engine): State<Engine<S, R, F>>,
    Path(query): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchSummary>, (StatusCode, String)>
where
    S: SerpProvider,
    R: Ranker,
    F: PageFetcher,
{
    let query = query.trim().to_string();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query cannot be empty".to_string()));
    }

    let result = run_search(engine, query, params).await?;
    Ok(Json(summarize(&result)))
}

pub async fn status_handler<S, R, F>(State(engine): State<Engine<S, R, F>>) -> Json<StatusResponse>
where
    S: SerpProvider,
    R: Ranker,
    F: PageFetcher,
{
    let probe = tokio::spawn(async move { engine.test_all_services().await }).await;

    let response = match probe {
        Ok(services) => StatusResponse {
            status: "ok".to_string(),
            error: None,
            all_services_ok: services.all_ok(),
            services,
        },
        Err(e) => {
            tracing::error!("service status check failed: {e}");
            StatusResponse {
                status: "error".to_string(),
                error: Some(e.to_string()),
                services: ServiceStatus {
                    dataforseo: false,
                    google_ranking: false,
                    web_crawler: false,
                },
                all_services_ok: false,
            }
        }
    };
    Json(response)
}

/// Run the search on its own task so an unexpected panic inside the pipeline
/// becomes a 500 for this request only.
async fn run_search<S, R, F>(
    engine: Engine<S, R, F>,
    query: String,
    params: SearchParams,
) -> Result<SearchResult, (StatusCode, String)>
where
    S: SerpProvider,
    R: Ranker,
    F: PageFetcher,
{
    tokio::spawn(async move {
        engine
            .search(&query, params.location(), params.language())
            .await
    })
    .await
    .map_err(|e| {
        tracing::error!("search task failed: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Search error: {}", e),
        )
    })
}
