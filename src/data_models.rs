use serde::{Deserialize, Serialize};

/// Sort key used for failed crawls whose SERP row carried no position.
pub const MISSING_POSITION: u32 = 999;

/// One organic hit from the SERP provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SerpResult {
    /// 1-based rank as reported by the provider; 0 when the provider omitted it.
    pub position: u32,
    pub title: String,
    pub url: String,
    pub description: String,
    pub domain: String,
    pub breadcrumb: String,
    pub website_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    Success,
    HttpError,
    Timeout,
    Exception,
}

/// Normalised page fields produced by the extractor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedContent {
    pub title: String,
    pub description: String,
    pub content: String,
    pub headings: String,
    pub word_count: usize,
    /// Set when extraction failed and the other fields were left empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of fetching one URL. Exactly one exists per crawled URL.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CrawledDocument {
    pub url: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub headings: String,
    pub word_count: usize,
    pub status: CrawlStatus,
    pub status_code: u16,
}

impl CrawledDocument {
    pub fn success(url: String, extracted: ExtractedContent, status_code: u16) -> CrawledDocument {
        CrawledDocument {
            url,
            title: extracted.title,
            description: extracted.description,
            content: extracted.content,
            headings: extracted.headings,
            word_count: extracted.word_count,
            status: CrawlStatus::Success,
            status_code,
        }
    }

    /// An all-empty document carrying only the failure outcome.
    pub fn failed(url: String, status: CrawlStatus, status_code: u16) -> CrawledDocument {
        CrawledDocument {
            url,
            title: String::new(),
            description: String::new(),
            content: String::new(),
            headings: String::new(),
            word_count: 0,
            status,
            status_code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CrawlStatus::Success
    }
}

/// A SERP row joined with the crawl of its URL.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CombinedRecord {
    pub serp_position: u32,
    pub serp_title: String,
    pub serp_description: String,
    pub url: String,
    pub domain: String,
    pub breadcrumb: String,
    pub website_name: String,

    pub title: String,
    pub description: String,
    pub content: String,
    pub headings: String,
    pub word_count: usize,
    pub crawl_status: CrawlStatus,
    pub crawl_status_code: u16,
}

impl CombinedRecord {
    pub fn new(serp: SerpResult, crawled: CrawledDocument) -> CombinedRecord {
        CombinedRecord {
            serp_position: serp.position,
            serp_title: serp.title,
            serp_description: serp.description,
            url: serp.url,
            domain: serp.domain,
            breadcrumb: serp.breadcrumb,
            website_name: serp.website_name,
            title: crawled.title,
            description: crawled.description,
            content: crawled.content,
            headings: crawled.headings,
            word_count: crawled.word_count,
            crawl_status: crawled.status,
            crawl_status_code: crawled.status_code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.crawl_status == CrawlStatus::Success
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RankedRecord {
    #[serde(flatten)]
    pub record: CombinedRecord,
    /// Relevance in `[0, 1]`; 0.0 for failed crawls.
    pub ranking_score: f64,
    /// 1-based index into the list submitted for ranking, or the SERP
    /// position for failed crawls.
    pub original_position: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SearchMetadata {
    pub total_time_seconds: f64,
    pub crawl_time_seconds: f64,
    pub ranking_time_seconds: f64,
    pub serp_count: usize,
    pub crawled_count: usize,
    pub successful_crawls: usize,
    pub ranked_count: usize,
    pub total_results: usize,
    pub google_ranking_api_used: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub query: String,
    pub location: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub results: Vec<RankedRecord>,
    pub metadata: SearchMetadata,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchSummary {
    pub query: String,
    pub total_results: usize,
    pub successfully_ranked: usize,
    pub top_ranked_url: Option<String>,
    pub top_ranking_score: f64,
    pub average_ranking_score: f64,
    pub domains_found: usize,
    pub total_word_count: usize,
    pub processing_time: f64,
}

/// Health of each collaborator, keyed the way the status endpoint reports it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatus {
    pub dataforseo: bool,
    pub google_ranking: bool,
    pub web_crawler: bool,
}

impl ServiceStatus {
    pub fn all_ok(&self) -> bool {
        self.dataforseo && self.google_ranking && self.web_crawler
    }
}

#[test]
fn test_crawl_status_serializes_snake_case() {
    let json = serde_json::to_string(&CrawlStatus::HttpError).unwrap();
    assert_eq!(json, "\"http_error\"");
}

#[test]
fn test_ranked_record_flattens_combined_fields() {
    let serp = SerpResult {
        position: 3,
        url: "https://example.com".into(),
        title: "Example".into(),
        ..SerpResult::default()
    };
    let crawled = CrawledDocument::failed("https://example.com".into(), CrawlStatus::Timeout, 0);
    let ranked = RankedRecord {
        record: CombinedRecord::new(serp, crawled),
        ranking_score: 0.0,
        original_position: 3,
    };
    let value = serde_json::to_value(&ranked).unwrap();
    assert_eq!(value["serp_position"], 3);
    assert_eq!(value["serp_title"], "Example");
    assert_eq!(value["crawl_status"], "timeout");
    assert_eq!(value["original_position"], 3);
}
