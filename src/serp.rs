//! DataForSEO live Google SERP client.

use std::future::Future;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::SerpConfig;
use crate::data_models::SerpResult;
use crate::error::SerpError;

/// DataForSEO's "Ok." status code, used at both envelope and task level.
const STATUS_OK: i64 = 20000;

pub trait SerpProvider: Send + Sync + 'static {
    /// Organic results for `query`, in provider rank order.
    fn live_results(
        &self,
        query: &str,
        location: &str,
        language: &str,
    ) -> impl Future<Output = Result<Vec<SerpResult>, SerpError>> + Send;

    /// Whether credentials are present. Does not contact the provider.
    fn is_configured(&self) -> bool;
}

#[derive(Serialize)]
struct LiveTask<'a> {
    keyword: &'a str,
    location_name: &'a str,
    language_code: &'a str,
    device: &'a str,
    os: &'a str,
    depth: u32,
}

#[derive(Deserialize)]
struct Envelope<T> {
    status_code: i64,
    #[serde(default)]
    status_message: Option<String>,
    tasks: Option<Vec<Task<T>>>,
}

#[derive(Deserialize)]
struct Task<T> {
    status_code: i64,
    #[serde(default)]
    status_message: Option<String>,
    result: Option<Vec<T>>,
}

#[derive(Deserialize)]
struct LiveResult {
    #[serde(default)]
    items: Option<Vec<SerpItem>>,
}

#[derive(Deserialize)]
struct SerpItem {
    #[serde(rename = "type")]
    kind: Option<String>,
    rank_group: Option<u32>,
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    domain: Option<String>,
    breadcrumb: Option<String>,
    website_name: Option<String>,
}

impl From<SerpItem> for SerpResult {
    fn from(item: SerpItem) -> Self {
        SerpResult {
            position: item.rank_group.unwrap_or(0),
            title: item.title.unwrap_or_default(),
            url: item.url.unwrap_or_default(),
            description: item.description.unwrap_or_default(),
            domain: item.domain.unwrap_or_default(),
            breadcrumb: item.breadcrumb.unwrap_or_default(),
            website_name: item.website_name.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct Location {
    location_code: i64,
    #[serde(default)]
    location_name: String,
}

#[derive(Debug, Clone)]
pub struct DataForSeoClient {
    config: SerpConfig,
    client: Client,
}

impl DataForSeoClient {
    pub fn new(config: SerpConfig) -> Result<Self, SerpError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn credentials(&self) -> Result<(&str, &str), SerpError> {
        match (&self.config.login, &self.config.password) {
            (Some(login), Some(password)) if self.config.has_credentials() => {
                Ok((login.as_str(), password.as_str()))
            }
            _ => Err(SerpError::NotConfigured),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Look up DataForSEO's numeric code for a location name (case-insensitive).
    pub async fn location_code(&self, location_name: &str) -> Result<Option<i64>, SerpError> {
        let (login, password) = self.credentials()?;
        let res = self
            .client
            .get(self.endpoint("serp/google/locations"))
            .basic_auth(login, Some(password))
            .send()
            .await?
            .error_for_status()?;

        let locations: Vec<Location> = first_task_result(parse_envelope(&res.text().await?)?)?;
        Ok(locations
            .into_iter()
            .find(|l| l.location_name.eq_ignore_ascii_case(location_name))
            .map(|l| l.location_code))
    }
}

impl SerpProvider for DataForSeoClient {
    async fn live_results(
        &self,
        query: &str,
        location: &str,
        language: &str,
    ) -> Result<Vec<SerpResult>, SerpError> {
        let (login, password) = self.credentials()?;
        let payload = [LiveTask {
            keyword: query,
            location_name: location,
            language_code: language,
            device: "desktop",
            os: "windows",
            depth: self.config.depth,
        }];

        let res = self
            .client
            .post(self.endpoint("serp/google/organic/live/advanced"))
            .basic_auth(login, Some(password))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let results: Vec<LiveResult> = first_task_result(parse_envelope(&res.text().await?)?)?;
        let organic = results
            .into_iter()
            .next()
            .and_then(|r| r.items)
            .unwrap_or_default()
            .into_iter()
            .filter(|item| item.kind.as_deref() == Some("organic"))
            .map(SerpResult::from)
            .collect::<Vec<SerpResult>>();

        tracing::debug!(query, count = organic.len(), "received organic SERP results");
        Ok(organic)
    }

    fn is_configured(&self) -> bool {
        self.config.has_credentials()
    }
}

fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<Envelope<T>, SerpError> {
    serde_json::from_str(body).map_err(|e| SerpError::Malformed(e.to_string()))
}

/// Unwrap the first task's result rows, turning non-OK status codes into errors.
/// A successful task with no result rows yields an empty list.
fn first_task_result<T>(envelope: Envelope<T>) -> Result<Vec<T>, SerpError> {
    if envelope.status_code != STATUS_OK {
        return Err(SerpError::Api {
            code: envelope.status_code,
            message: envelope
                .status_message
                .unwrap_or_else(|| "Unknown error".to_string()),
        });
    }

    let Some(task) = envelope.tasks.and_then(|tasks| tasks.into_iter().next()) else {
        return Ok(Vec::new());
    };
    if task.status_code != STATUS_OK {
        return Err(SerpError::Api {
            code: task.status_code,
            message: task
                .status_message
                .unwrap_or_else(|| "Unknown task error".to_string()),
        });
    }
    Ok(task.result.unwrap_or_default())
}

#[test]
fn test_first_task_result_reports_task_error() {
    let body = r#"{"status_code":20000,"tasks":[{"status_code":40501,"status_message":"Invalid Field","result":null}]}"#;
    let envelope: Envelope<LiveResult> = parse_envelope(body).unwrap();
    match first_task_result(envelope) {
        Err(SerpError::Api { code, message }) => {
            assert_eq!(code, 40501);
            assert_eq!(message, "Invalid Field");
        }
        other => panic!("expected task error, got {:?}", other.map(|r| r.len())),
    }
}

#[test]
fn test_first_task_result_empty_tasks() {
    let body = r#"{"status_code":20000,"tasks":[]}"#;
    let envelope: Envelope<LiveResult> = parse_envelope(body).unwrap();
    assert!(first_task_result(envelope).unwrap().is_empty());
}

#[test]
fn test_parse_envelope_rejects_garbage() {
    let res: Result<Envelope<LiveResult>, _> = parse_envelope("<html>");
    assert!(matches!(res, Err(SerpError::Malformed(_))));
}

#[test]
fn test_envelope_without_tasks_or_result() {
    let body = r#"{"status_code":20000,"tasks":[{"status_code":20000}]}"#;
    let envelope: Envelope<Location> = parse_envelope(body).unwrap();
    assert!(first_task_result(envelope).unwrap().is_empty());

    let envelope: Envelope<Location> = parse_envelope(r#"{"status_code":20000}"#).unwrap();
    assert!(first_task_result(envelope).unwrap().is_empty());
}
