use dotenvy::dotenv;
use once_cell::sync::Lazy;
use scraper::Selector;
use std::env;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 5000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 5;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config::from_env()
});

/// Process-wide settings read from the environment.
///
/// Only the binary touches this; the library works from the smaller
/// per-collaborator structs returned by [`Config::serp`], [`Config::ranking`]
/// and [`Config::crawler`].
#[derive(Debug, Clone)]
pub struct Config {
    pub dataforseo_login: Option<String>,
    pub dataforseo_password: Option<String>,
    pub dataforseo_base_url: String,
    pub dataforseo_depth: u32,
    pub google_project_id: Option<String>,
    pub google_access_token: Option<String>,
    pub google_ranking_endpoint: String,
    pub google_ranking_location: String,
    pub google_ranking_config: String,
    pub google_ranking_model: String,
    pub max_content_length: usize,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            dataforseo_login: get_env_opt("DATAFORSEO_LOGIN"),
            dataforseo_password: get_env_opt("DATAFORSEO_PASSWORD"),
            dataforseo_base_url: get_env_or_default(
                "DATAFORSEO_BASE_URL",
                "https://api.dataforseo.com/v3",
            ),
            dataforseo_depth: get_env_parsed("DATAFORSEO_DEPTH", 20),
            google_project_id: get_env_opt("GOOGLE_CLOUD_PROJECT_ID"),
            google_access_token: get_env_opt("GOOGLE_ACCESS_TOKEN"),
            google_ranking_endpoint: get_env_or_default(
                "GOOGLE_RANKING_ENDPOINT",
                "https://discoveryengine.googleapis.com/v1",
            ),
            google_ranking_location: get_env_or_default("GOOGLE_RANKING_LOCATION", "global"),
            google_ranking_config: get_env_or_default(
                "GOOGLE_RANKING_CONFIG",
                "default_ranking_config",
            ),
            google_ranking_model: get_env_or_default(
                "GOOGLE_RANKING_MODEL",
                "semantic-ranker-default@latest",
            ),
            max_content_length: get_env_parsed("MAX_CONTENT_LENGTH", DEFAULT_MAX_CONTENT_LENGTH),
            request_timeout_secs: get_env_parsed("REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS),
            max_concurrent_requests: get_env_parsed(
                "MAX_CONCURRENT_REQUESTS",
                DEFAULT_MAX_CONCURRENT_REQUESTS,
            ),
            bind_addr: get_env_or_default("BIND_ADDR", "0.0.0.0:8000"),
        }
    }

    pub fn serp(&self) -> SerpConfig {
        SerpConfig {
            login: self.dataforseo_login.clone(),
            password: self.dataforseo_password.clone(),
            base_url: self.dataforseo_base_url.clone(),
            depth: self.dataforseo_depth,
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn ranking(&self) -> RankingConfig {
        RankingConfig {
            project_id: self.google_project_id.clone(),
            access_token: self.google_access_token.clone(),
            endpoint: self.google_ranking_endpoint.clone(),
            location: self.google_ranking_location.clone(),
            ranking_config: self.google_ranking_config.clone(),
            model: self.google_ranking_model.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn crawler(&self) -> CrawlerConfig {
        CrawlerConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_concurrent_requests: self.max_concurrent_requests,
            extractor: ExtractorConfig {
                max_content_length: self.max_content_length,
                ..ExtractorConfig::default()
            },
        }
    }
}

/// DataForSEO credentials and endpoint.
#[derive(Debug, Clone)]
pub struct SerpConfig {
    pub login: Option<String>,
    pub password: Option<String>,
    pub base_url: String,
    /// How many SERP rows to request.
    pub depth: u32,
    pub timeout: Duration,
}

impl SerpConfig {
    pub fn has_credentials(&self) -> bool {
        matches!(
            (&self.login, &self.password),
            (Some(l), Some(p)) if !l.is_empty() && !p.is_empty()
        )
    }
}

/// Discovery Engine ranking settings.
#[derive(Debug, Clone)]
pub struct RankingConfig {
    pub project_id: Option<String>,
    pub access_token: Option<String>,
    pub endpoint: String,
    pub location: String,
    pub ranking_config: String,
    pub model: String,
    pub timeout: Duration,
}

impl RankingConfig {
    /// `projects/{p}/locations/{l}/rankingConfigs/{c}`, or `None` without a project id.
    pub fn ranking_config_path(&self) -> Option<String> {
        let project = self.project_id.as_deref().filter(|p| !p.is_empty())?;
        Some(format!(
            "projects/{project}/locations/{}/rankingConfigs/{}",
            self.location, self.ranking_config
        ))
    }
}

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub request_timeout: Duration,
    pub max_concurrent_requests: usize,
    pub extractor: ExtractorConfig,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            extractor: ExtractorConfig::default(),
        }
    }
}

impl CrawlerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request_timeout must be greater than 0".into(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_requests must be greater than 0".into(),
            ));
        }
        self.extractor.validate()
    }
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Character cap applied to every cleaned string.
    pub max_content_length: usize,
    /// Main-content selectors, tried in order.
    pub content_selectors: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            content_selectors: [
                "main",
                "article",
                "[role=\"main\"]",
                ".content",
                ".main-content",
                ".post-content",
                ".entry-content",
                ".article-content",
                ".page-content",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_content_length == 0 {
            return Err(ConfigError::Invalid(
                "max_content_length must be greater than 0".into(),
            ));
        }
        for selector in &self.content_selectors {
            Selector::parse(selector).map_err(|e| {
                ConfigError::Invalid(format!("invalid content selector {selector:?}: {e}"))
            })?;
        }
        Ok(())
    }
}

fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "unparseable config value, using default");
            default
        }),
        Err(_) => default,
    }
}

#[test]
fn test_crawler_config_defaults() {
    let config = CrawlerConfig::default();
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.max_concurrent_requests, 5);
    assert_eq!(config.extractor.max_content_length, 5000);
    assert_eq!(config.extractor.content_selectors[0], "main");
    assert!(config.validate().is_ok());
}

#[test]
fn test_crawler_config_rejects_zero_values() {
    let config = CrawlerConfig {
        max_concurrent_requests: 0,
        ..CrawlerConfig::default()
    };
    assert!(config.validate().is_err());

    let config = CrawlerConfig {
        request_timeout: Duration::ZERO,
        ..CrawlerConfig::default()
    };
    assert!(config.validate().is_err());

    let mut config = CrawlerConfig::default();
    config.extractor.max_content_length = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_extractor_config_rejects_bad_selector() {
    let mut config = CrawlerConfig::default();
    config.extractor.content_selectors.push("[[nope".into());
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("[[nope"));
}

#[test]
fn test_ranking_config_path() {
    let mut config = RankingConfig {
        project_id: Some("my-project".into()),
        access_token: None,
        endpoint: "https://discoveryengine.googleapis.com/v1".into(),
        location: "global".into(),
        ranking_config: "default_ranking_config".into(),
        model: "semantic-ranker-default@latest".into(),
        timeout: Duration::from_secs(30),
    };
    assert_eq!(
        config.ranking_config_path().as_deref(),
        Some("projects/my-project/locations/global/rankingConfigs/default_ranking_config")
    );
    config.project_id = None;
    assert!(config.ranking_config_path().is_none());
}

#[test]
fn test_serp_credentials() {
    let mut config = SerpConfig {
        login: Some("user".into()),
        password: None,
        base_url: "https://api.dataforseo.com/v3".into(),
        depth: 20,
        timeout: Duration::from_secs(30),
    };
    assert!(!config.has_credentials());
    config.password = Some("secret".into());
    assert!(config.has_credentials());
}
