//! Joins SERP rows with crawl output and orders the final result list.

use std::cmp::Ordering;

use crate::data_models::{
    CombinedRecord, CrawledDocument, MISSING_POSITION, RankedRecord, SerpResult,
};

/// Pair `serp[i]` with `crawled[i]`. When the lengths differ the longer tail is
/// dropped and a warning is logged.
pub fn combine(serp: Vec<SerpResult>, crawled: Vec<CrawledDocument>) -> Vec<CombinedRecord> {
    if serp.len() != crawled.len() {
        tracing::warn!(
            serp_count = serp.len(),
            crawled_count = crawled.len(),
            "SERP and crawl lengths differ, joining the shorter prefix"
        );
    }
    serp.into_iter()
        .zip(crawled)
        .map(|(s, c)| CombinedRecord::new(s, c))
        .collect()
}

/// Split into (successful, failed) crawls, each keeping input order.
pub fn partition(records: Vec<CombinedRecord>) -> (Vec<CombinedRecord>, Vec<CombinedRecord>) {
    records.into_iter().partition(CombinedRecord::is_success)
}

/// Give a failed crawl its synthetic score (0.0) and SERP-derived position.
pub fn score_failed(record: CombinedRecord) -> RankedRecord {
    let original_position = match record.serp_position {
        0 => MISSING_POSITION,
        p => p,
    };
    RankedRecord {
        record,
        ranking_score: 0.0,
        original_position,
    }
}

/// Concatenate ranked successes and failures, then order by descending score,
/// ties broken by ascending original position. The sort is stable, so records
/// equal on both keys keep their concatenation order.
pub fn merge(ranked: Vec<RankedRecord>, failed: Vec<CombinedRecord>) -> Vec<RankedRecord> {
    let mut all = ranked;
    all.extend(failed.into_iter().map(score_failed));
    all.sort_by(compare_ranked);
    all
}

pub fn compare_ranked(a: &RankedRecord, b: &RankedRecord) -> Ordering {
    b.ranking_score
        .total_cmp(&a.ranking_score)
        .then_with(|| a.original_position.cmp(&b.original_position))
}
