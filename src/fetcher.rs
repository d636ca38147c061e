use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};

use crate::config::CrawlerConfig;
use crate::data_models::{CrawlStatus, CrawledDocument};
use crate::error::CrawlError;
use crate::extractor::ContentExtractor;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Turns one URL into one [`CrawledDocument`].
///
/// Implementations must encode every failure in the returned document's
/// status instead of failing, so the crawler can always fill the URL's slot.
pub trait PageFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = CrawledDocument> + Send;
}

/// Fetches pages over HTTP and runs them through the [`ContentExtractor`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    extractor: ContentExtractor,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<HttpFetcher, CrawlError> {
        Ok(HttpFetcher {
            client: build_client(config)?,
            timeout: config.request_timeout,
            extractor: ContentExtractor::new(config.extractor.clone())?,
        })
    }

    async fn get_page(&self, url: &str) -> Result<(StatusCode, Option<String>), reqwest::Error> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        if status != StatusCode::OK {
            return Ok((status, None));
        }
        let body = res.text().await?;
        Ok((status, Some(body)))
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> CrawledDocument {
        let outcome = tokio::time::timeout(self.timeout, self.get_page(url)).await;
        match outcome {
            Ok(Ok((status, Some(html)))) => {
                let extracted = self.extractor.extract(&html, url);
                tracing::debug!(url, words = extracted.word_count, "page crawled");
                CrawledDocument::success(url.to_string(), extracted, status.as_u16())
            }
            Ok(Ok((status, None))) => {
                tracing::debug!(url, status = status.as_u16(), "page returned non-200");
                CrawledDocument::failed(url.to_string(), CrawlStatus::HttpError, status.as_u16())
            }
            Ok(Err(e)) if e.is_timeout() => {
                tracing::debug!(url, "page fetch timed out");
                CrawledDocument::failed(url.to_string(), CrawlStatus::Timeout, 0)
            }
            Ok(Err(e)) => {
                tracing::warn!(url, error = %e, "error fetching page");
                CrawledDocument::failed(url.to_string(), CrawlStatus::Exception, 0)
            }
            Err(_) => {
                tracing::debug!(url, timeout = ?self.timeout, "page fetch timed out");
                CrawledDocument::failed(url.to_string(), CrawlStatus::Timeout, 0)
            }
        }
    }
}

/// Build the crawl client: browser-like headers, per-request timeout and an
/// idle pool no larger than the concurrency limit.
pub fn build_client(config: &CrawlerConfig) -> Result<Client, CrawlError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .timeout(config.request_timeout)
        .pool_max_idle_per_host(config.max_concurrent_requests)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(CrawlError::Client)
}
