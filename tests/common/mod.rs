#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rankcrawl::crawler::Crawler;
use rankcrawl::data_models::{CrawlStatus, CrawledDocument, SerpResult};
use rankcrawl::error::{RankingError, SerpError};
use rankcrawl::extractor::ContentExtractor;
use rankcrawl::fetcher::PageFetcher;
use rankcrawl::ranking::{Ranker, RankingRecord, RankingScore};
use rankcrawl::search::SearchOrchestrator;
use rankcrawl::serp::SerpProvider;

#[derive(Clone, Debug)]
pub enum Page {
    Html(String),
    Status(u16),
    Timeout,
    Panic,
}

/// In-memory fetcher that records how many fetches overlap.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, (Page, Duration)>,
    in_flight: AtomicUsize,
    max_in_flight: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
    extractor: ContentExtractor,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: Page, delay_ms: u64) -> Self {
        self.pages
            .insert(url.to_string(), (page, Duration::from_millis(delay_ms)));
        self
    }

    pub fn max_in_flight(&self) -> Arc<AtomicUsize> {
        self.max_in_flight.clone()
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> CrawledDocument {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (page, delay) = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or((Page::Status(404), Duration::ZERO));
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match page {
            Page::Html(html) => {
                CrawledDocument::success(url.to_string(), self.extractor.extract(&html, url), 200)
            }
            Page::Status(code) => {
                CrawledDocument::failed(url.to_string(), CrawlStatus::HttpError, code)
            }
            Page::Timeout => CrawledDocument::failed(url.to_string(), CrawlStatus::Timeout, 0),
            Page::Panic => panic!("fetcher blew up on {url}"),
        }
    }
}

pub struct MockSerp {
    pub results: Result<Vec<SerpResult>, String>,
    pub configured: bool,
}

impl MockSerp {
    pub fn with(results: Vec<SerpResult>) -> Self {
        Self {
            results: Ok(results),
            configured: true,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            results: Err(message.to_string()),
            configured: true,
        }
    }
}

impl SerpProvider for MockSerp {
    async fn live_results(
        &self,
        _query: &str,
        _location: &str,
        _language: &str,
    ) -> Result<Vec<SerpResult>, SerpError> {
        match &self.results {
            Ok(results) => Ok(results.clone()),
            Err(message) => Err(SerpError::Api {
                code: 50000,
                message: message.clone(),
            }),
        }
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

/// Scores documents by title; fails every call when `scores` is `None`.
pub struct MockRanker {
    pub scores: Option<HashMap<String, f64>>,
    pub submitted: Arc<Mutex<Vec<Vec<RankingRecord>>>>,
}

impl MockRanker {
    pub fn with(scores: &[(&str, f64)]) -> Self {
        Self {
            scores: Some(scores.iter().map(|(t, s)| (t.to_string(), *s)).collect()),
            submitted: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            scores: None,
            submitted: Arc::default(),
        }
    }
}

impl Ranker for MockRanker {
    async fn rank(
        &self,
        _query: &str,
        records: &[RankingRecord],
    ) -> Result<Vec<RankingScore>, RankingError> {
        self.submitted.lock().unwrap().push(records.to_vec());
        let Some(scores) = &self.scores else {
            return Err(RankingError::Api {
                status: 503,
                body: "unavailable".into(),
            });
        };
        let mut out = records
            .iter()
            .map(|r| RankingScore {
                id: r.id.clone(),
                score: scores.get(&r.title).copied().unwrap_or(0.5),
            })
            .collect::<Vec<_>>();
        out.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(out)
    }

    async fn test_connection(&self) -> bool {
        self.scores.is_some()
    }
}

pub fn serp_row(position: u32, url: &str) -> SerpResult {
    SerpResult {
        position,
        title: format!("SERP title {position}"),
        url: url.to_string(),
        description: format!("SERP description {position}"),
        domain: url
            .trim_start_matches("https://")
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string(),
        breadcrumb: String::new(),
        website_name: String::new(),
    }
}

/// A page titled `title`; [`MockRanker`] keys its scores on that title.
pub fn page_for(title: &str, body: &str) -> Page {
    Page::Html(format!(
        "<html><head><title>{title}</title><meta name=\"description\" content=\"About {title}\"></head>\
         <body><main><p>{body}</p></main></body></html>"
    ))
}

pub fn orchestrator(
    serp: MockSerp,
    ranker: MockRanker,
    fetcher: MockFetcher,
) -> SearchOrchestrator<MockSerp, MockRanker, MockFetcher> {
    SearchOrchestrator::new(serp, ranker, Crawler::new(fetcher, 5))
}
