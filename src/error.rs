//! Error types, one enum per collaborator.
//!
//! Every collaborator separates "not configured" from "transport failed" from
//! "service answered with an error", so callers can log them differently even
//! though the search pipeline degrades all of them the same way.

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failures talking to the SERP provider.
#[derive(Debug, thiserror::Error)]
pub enum SerpError {
    #[error("SERP provider credentials are not configured")]
    NotConfigured,

    #[error("SERP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered, but reported a failure in its status envelope.
    #[error("SERP provider error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("malformed SERP response: {0}")]
    Malformed(String),
}

/// Failures talking to the semantic ranking service.
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("ranking service is not configured")]
    NotConfigured,

    #[error("ranking request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("ranking service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed ranking response: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("blocking crawl called from inside an async runtime; await crawl_urls instead")]
    NestedRuntime,

    #[error("failed to build crawl runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error(transparent)]
    Extractor(#[from] ExtractError),
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },
}

#[test]
fn test_error_display() {
    let err = SerpError::Api {
        code: 40501,
        message: "Invalid Field".into(),
    };
    assert_eq!(err.to_string(), "SERP provider error 40501: Invalid Field");

    let err = RankingError::Api {
        status: 403,
        body: "denied".into(),
    };
    assert_eq!(err.to_string(), "ranking service returned HTTP 403: denied");

    let err = ConfigError::Invalid("request_timeout_secs must be greater than 0".into());
    assert!(err.to_string().contains("request_timeout_secs"));
}

#[test]
fn test_errors_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SerpError>();
    assert_send_sync::<RankingError>();
    assert_send_sync::<CrawlError>();
}
