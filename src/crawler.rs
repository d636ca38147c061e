use std::sync::Arc;

use tokio::runtime::{Builder, Handle};
use tokio::sync::Semaphore;

use crate::config::CrawlerConfig;
use crate::data_models::{CrawlStatus, CrawledDocument};
use crate::error::CrawlError;
use crate::fetcher::{HttpFetcher, PageFetcher};

/// Fans a URL list out over a [`PageFetcher`] with at most `concurrency`
/// requests in flight, and fans the results back in input order.
pub struct Crawler<F: PageFetcher = HttpFetcher> {
    fetcher: Arc<F>,
    concurrency: usize,
}

impl Crawler<HttpFetcher> {
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let fetcher = HttpFetcher::new(config)?;
        Ok(Crawler::new(fetcher, config.max_concurrent_requests))
    }
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(fetcher: F, concurrency: usize) -> Crawler<F> {
        Crawler {
            fetcher: Arc::new(fetcher),
            // a zero-permit gate would never admit anything
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Crawl every URL and return one document per URL, in the order given.
    ///
    /// A fetch that panics is reported as an `exception` document for its URL;
    /// siblings are unaffected.
    pub async fn crawl_urls(&self, urls: &[String]) -> Vec<CrawledDocument> {
        if urls.is_empty() {
            return Vec::new();
        }
        tracing::info!(count = urls.len(), concurrency = self.concurrency, "crawling urls");

        let gate = Arc::new(Semaphore::new(self.concurrency));
        let handles = urls
            .iter()
            .map(|url| {
                let fetcher = self.fetcher.clone();
                let gate = gate.clone();
                let url = url.clone();
                tokio::spawn(async move {
                    // The gate is never closed, so acquire only fails if that changes.
                    let _permit = gate.acquire_owned().await.ok();
                    fetcher.fetch(&url).await
                })
            })
            .collect::<Vec<_>>();

        let joined = futures::future::join_all(handles).await;

        joined
            .into_iter()
            .zip(urls)
            .map(|(res, url)| {
                res.unwrap_or_else(|e| {
                    tracing::error!("crawl task for {url} failed: {e}");
                    CrawledDocument::failed(url.clone(), CrawlStatus::Exception, 0)
                })
            })
            .collect()
    }

    /// Blocking form of [`Crawler::crawl_urls`] for callers outside any runtime.
    ///
    /// Runs the crawl on a fresh current-thread runtime. Refuses with
    /// [`CrawlError::NestedRuntime`] when called from inside a runtime, since
    /// blocking there would stall the caller's own scheduler.
    pub fn crawl_urls_blocking(&self, urls: &[String]) -> Result<Vec<CrawledDocument>, CrawlError> {
        if Handle::try_current().is_ok() {
            return Err(CrawlError::NestedRuntime);
        }
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(runtime.block_on(self.crawl_urls(urls)))
    }
}
