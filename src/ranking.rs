//! Semantic re-ranking of crawled documents.
//!
//! [`GoogleRankingClient`] talks to the Discovery Engine `:rank` endpoint.
//! [`rank_documents`] wraps any [`Ranker`] and falls back to a local
//! content/title/description heuristic when the service cannot be used.

use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::RankingConfig;
use crate::data_models::{CombinedRecord, RankedRecord};
use crate::error::RankingError;

const MAX_TITLE_CHARS: usize = 200;
const MAX_CONTENT_CHARS: usize = 8000;

/// A document as submitted to the ranking service. `id` is the document's
/// index in the submitted list.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RankingRecord {
    pub id: String,
    pub title: String,
    pub content: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RankingScore {
    pub id: String,
    #[serde(default)]
    pub score: f64,
}

pub trait Ranker: Send + Sync + 'static {
    /// Score `records` against `query`. The answer may be a reordered subset.
    fn rank(
        &self,
        query: &str,
        records: &[RankingRecord],
    ) -> impl Future<Output = Result<Vec<RankingScore>, RankingError>> + Send;

    /// Cheap round-trip used by the health check.
    fn test_connection(&self) -> impl Future<Output = bool> + Send;
}

/// Ranked documents plus whether the remote service produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct RankOutcome {
    pub records: Vec<RankedRecord>,
    pub used_service: bool,
}

/// Rank `documents` with `ranker`, falling back to [`fallback_ranking`] on any
/// ranking error. Never fails.
pub async fn rank_documents<R: Ranker>(
    ranker: &R,
    query: &str,
    documents: Vec<CombinedRecord>,
) -> RankOutcome {
    if documents.is_empty() {
        return RankOutcome {
            records: Vec::new(),
            used_service: false,
        };
    }

    let records = build_ranking_records(&documents);
    let ranked = match ranker.rank(query, &records).await {
        Ok(scores) => apply_scores(&documents, scores),
        Err(e) => Err(e),
    };

    match ranked {
        Ok(records) => RankOutcome {
            records,
            used_service: true,
        },
        Err(RankingError::NotConfigured) => {
            tracing::info!("ranking service not configured, using fallback ranking");
            RankOutcome {
                records: fallback_ranking(documents),
                used_service: false,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "ranking service failed, using fallback ranking");
            RankOutcome {
                records: fallback_ranking(documents),
                used_service: false,
            }
        }
    }
}

/// Local heuristic: 0.1 base, up to 0.5 for content length (per 1000 chars),
/// 0.2 for a title, 0.1 for a description, capped at 1.0. Sorted by score,
/// highest first; equal scores keep their input order.
pub fn fallback_ranking(documents: Vec<CombinedRecord>) -> Vec<RankedRecord> {
    let mut ranked = documents
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let mut score = 0.1;
            if !record.content.is_empty() {
                score += (record.content.chars().count() as f64 / 1000.0).min(0.5);
            }
            if !record.title.is_empty() {
                score += 0.2;
            }
            if !record.description.is_empty() {
                score += 0.1;
            }
            RankedRecord {
                record,
                ranking_score: round4(score.min(1.0)),
                original_position: (i + 1) as u32,
            }
        })
        .collect::<Vec<RankedRecord>>();

    ranked.sort_by(|a, b| b.ranking_score.total_cmp(&a.ranking_score));
    ranked
}

pub fn build_ranking_records(documents: &[CombinedRecord]) -> Vec<RankingRecord> {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let mut content = String::new();
            if !doc.title.is_empty() {
                content.push_str(&format!("Title: {}\n", doc.title));
            }
            if !doc.description.is_empty() {
                content.push_str(&format!("Description: {}\n", doc.description));
            }
            if !doc.content.is_empty() {
                content.push_str(&format!("Content: {}", doc.content));
            }
            if let Some(cut) = char_boundary(&content, MAX_CONTENT_CHARS) {
                content.truncate(cut);
                content.push_str("...");
            }

            let mut title = doc.title.clone();
            if let Some(cut) = char_boundary(&title, MAX_TITLE_CHARS) {
                title.truncate(cut);
            }

            RankingRecord {
                id: i.to_string(),
                title,
                content,
            }
        })
        .collect()
}

/// Map service scores back onto the submitted documents, in the service's order.
fn apply_scores(
    documents: &[CombinedRecord],
    scores: Vec<RankingScore>,
) -> Result<Vec<RankedRecord>, RankingError> {
    let mut seen = vec![false; documents.len()];
    let mut ranked = Vec::with_capacity(scores.len());

    for s in scores {
        let idx = s
            .id
            .parse::<usize>()
            .ok()
            .filter(|&i| i < documents.len())
            .ok_or_else(|| RankingError::Malformed(format!("unknown record id {:?}", s.id)))?;
        if std::mem::replace(&mut seen[idx], true) {
            return Err(RankingError::Malformed(format!("duplicate record id {:?}", s.id)));
        }
        ranked.push(RankedRecord {
            record: documents[idx].clone(),
            ranking_score: round4(s.score.clamp(0.0, 1.0)),
            original_position: (idx + 1) as u32,
        });
    }

    Ok(ranked)
}

/// Byte index of the `max_chars`-th char, if `text` is longer than that.
fn char_boundary(text: &str, max_chars: usize) -> Option<usize> {
    text.char_indices().nth(max_chars).map(|(i, _)| i)
}

fn round4(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RankRequest<'a> {
    model: &'a str,
    top_n: usize,
    query: &'a str,
    records: &'a [RankingRecord],
}

#[derive(Deserialize)]
struct RankResponse {
    #[serde(default)]
    records: Vec<RankingScore>,
}

/// Client for the Discovery Engine ranking API.
#[derive(Debug, Clone)]
pub struct GoogleRankingClient {
    config: RankingConfig,
    client: Client,
}

impl GoogleRankingClient {
    pub fn new(config: RankingConfig) -> Result<Self, RankingError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn is_configured(&self) -> bool {
        self.config.ranking_config_path().is_some()
    }

    fn rank_url(&self) -> Result<String, RankingError> {
        let path = self
            .config
            .ranking_config_path()
            .ok_or(RankingError::NotConfigured)?;
        Ok(format!(
            "{}/{path}:rank",
            self.config.endpoint.trim_end_matches('/')
        ))
    }
}

impl Ranker for GoogleRankingClient {
    async fn rank(
        &self,
        query: &str,
        records: &[RankingRecord],
    ) -> Result<Vec<RankingScore>, RankingError> {
        let url = self.rank_url()?;
        let body = RankRequest {
            model: &self.config.model,
            top_n: records.len(),
            query,
            records,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let res = request.send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(RankingError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: RankResponse =
            serde_json::from_str(&text).map_err(|e| RankingError::Malformed(e.to_string()))?;
        Ok(parsed.records)
    }

    async fn test_connection(&self) -> bool {
        if !self.is_configured() {
            return false;
        }
        let records = [RankingRecord {
            id: "test".to_string(),
            title: "Test Document".to_string(),
            content: "This is a test document for API connectivity.".to_string(),
        }];
        match self.rank("test", &records).await {
            Ok(scores) => !scores.is_empty(),
            Err(e) => {
                tracing::warn!(error = %e, "ranking service connection test failed");
                false
            }
        }
    }
}

#[test]
fn test_round4() {
    assert_eq!(round4(0.123456), 0.1235);
    assert_eq!(round4(1.0), 1.0);
}

#[test]
fn test_char_boundary() {
    assert_eq!(char_boundary("abc", 5), None);
    assert_eq!(char_boundary("abc", 3), None);
    assert_eq!(char_boundary("abcdef", 3), Some(3));
    assert_eq!(char_boundary("ééé", 1), Some(2));
}
