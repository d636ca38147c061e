//! End-to-end search: SERP lookup, crawl, rank, merge.

use std::collections::HashSet;
use std::time::Instant;

use crate::config::Config;
use crate::crawler::Crawler;
use crate::data_models::{SearchMetadata, SearchResult, SearchSummary, ServiceStatus};
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::merger;
use crate::ranking::{GoogleRankingClient, Ranker, rank_documents};
use crate::serp::{DataForSeoClient, SerpProvider};

pub const DEFAULT_LOCATION: &str = "United States";
pub const DEFAULT_LANGUAGE: &str = "en";

/// The orchestrator wired to the real DataForSEO, Discovery Engine and HTTP crawler.
pub type LiveOrchestrator = SearchOrchestrator<DataForSeoClient, GoogleRankingClient, HttpFetcher>;

pub struct SearchOrchestrator<S, R, F>
where
    S: SerpProvider,
    R: Ranker,
    F: PageFetcher,
{
    serp: S,
    ranker: R,
    crawler: Crawler<F>,
}

impl LiveOrchestrator {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let crawler_config = config.crawler();
        crawler_config.validate()?;
        Ok(SearchOrchestrator::new(
            DataForSeoClient::new(config.serp())?,
            GoogleRankingClient::new(config.ranking())?,
            Crawler::from_config(&crawler_config)?,
        ))
    }
}

impl<S, R, F> SearchOrchestrator<S, R, F>
where
    S: SerpProvider,
    R: Ranker,
    F: PageFetcher,
{
    pub fn new(serp: S, ranker: R, crawler: Crawler<F>) -> Self {
        Self {
            serp,
            ranker,
            crawler,
        }
    }

    pub fn crawler(&self) -> &Crawler<F> {
        &self.crawler
    }

    /// Run the whole pipeline for one query.
    ///
    /// Collaborator failures never surface here: a SERP failure becomes an
    /// empty result carrying `error`, and a ranking failure falls back to the
    /// local heuristic.
    pub async fn search(&self, query: &str, location: &str, language: &str) -> SearchResult {
        let start = Instant::now();

        tracing::info!(query, location, language, "fetching SERP results");
        let serp_results = match self.serp.live_results(query, location, language).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(query, error = %e, "SERP lookup failed");
                Vec::new()
            }
        };

        if serp_results.is_empty() {
            return empty_result(query, location, language, "No SERP results found", 0, start);
        }
        let serp_count = serp_results.len();
        tracing::info!(count = serp_count, "found SERP results");

        // Rows without a URL are dropped before crawling so the positional
        // join below still lines each row up with its own crawl.
        let serp_results = serp_results
            .into_iter()
            .filter(|r| !r.url.is_empty())
            .collect::<Vec<_>>();
        let urls = serp_results
            .iter()
            .map(|r| r.url.clone())
            .collect::<Vec<String>>();
        if urls.is_empty() {
            return empty_result(
                query,
                location,
                language,
                "No valid URLs found in SERP results",
                serp_count,
                start,
            );
        }

        let crawl_start = Instant::now();
        let crawled = self.crawler.crawl_urls(&urls).await;
        let crawl_time = crawl_start.elapsed().as_secs_f64();
        tracing::info!(crawl_time, "crawling completed");

        let combined = merger::combine(serp_results, crawled);
        let crawled_count = combined.len();
        let (successful, failed) = merger::partition(combined);
        let successful_crawls = successful.len();
        tracing::info!(
            successful = successful_crawls,
            total = crawled_count,
            "crawl outcomes"
        );

        if successful.is_empty() {
            tracing::warn!("no successful crawls to rank");
        }
        // Returns immediately without a service call when there is nothing to rank.
        let ranking_start = Instant::now();
        let outcome = rank_documents(&self.ranker, query, successful).await;
        let ranking_time = ranking_start.elapsed().as_secs_f64();
        let ranked_count = outcome.records.len();

        let results = merger::merge(outcome.records, failed);

        SearchResult {
            query: query.to_string(),
            location: location.to_string(),
            language: language.to_string(),
            error: None,
            metadata: SearchMetadata {
                total_time_seconds: round2(start.elapsed().as_secs_f64()),
                crawl_time_seconds: round2(crawl_time),
                ranking_time_seconds: round2(ranking_time),
                serp_count,
                crawled_count,
                successful_crawls,
                ranked_count,
                total_results: results.len(),
                google_ranking_api_used: outcome.used_service,
            },
            results,
        }
    }

    /// Probe each collaborator. The crawler is stateless and always healthy.
    pub async fn test_all_services(&self) -> ServiceStatus {
        ServiceStatus {
            dataforseo: self.serp.is_configured(),
            google_ranking: self.ranker.test_connection().await,
            web_crawler: true,
        }
    }
}

/// Summarise a finished search. Only records with a positive score count as
/// successfully ranked.
pub fn summarize(result: &SearchResult) -> SearchSummary {
    let ranked = result
        .results
        .iter()
        .filter(|r| r.ranking_score > 0.0)
        .collect::<Vec<_>>();

    let average_ranking_score = if ranked.is_empty() {
        0.0
    } else {
        let total: f64 = ranked.iter().map(|r| r.ranking_score).sum();
        round3(total / ranked.len() as f64)
    };

    let domains_found = result
        .results
        .iter()
        .map(|r| r.record.domain.as_str())
        .filter(|d| !d.is_empty())
        .collect::<HashSet<&str>>()
        .len();

    SearchSummary {
        query: result.query.clone(),
        total_results: result.results.len(),
        successfully_ranked: ranked.len(),
        top_ranked_url: ranked.first().map(|r| r.record.url.clone()),
        top_ranking_score: ranked.first().map_or(0.0, |r| r.ranking_score),
        average_ranking_score,
        domains_found,
        total_word_count: result.results.iter().map(|r| r.record.word_count).sum(),
        processing_time: result.metadata.total_time_seconds,
    }
}

fn empty_result(
    query: &str,
    location: &str,
    language: &str,
    error: &str,
    serp_count: usize,
    start: Instant,
) -> SearchResult {
    tracing::warn!(query, error, "search short-circuited");
    SearchResult {
        query: query.to_string(),
        location: location.to_string(),
        language: language.to_string(),
        error: Some(error.to_string()),
        results: Vec::new(),
        metadata: SearchMetadata {
            total_time_seconds: round2(start.elapsed().as_secs_f64()),
            serp_count,
            ..SearchMetadata::default()
        },
    }
}

fn round2(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
