//! JSON renderer

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use super::ContextMetrics;
use crate::benchmarks::MatrixResult;

/// One rendered parameter combination
#[derive(Debug, Serialize)]
pub struct JsonRecord {
    pub params: BTreeMap<String, String>,

    pub short_context_prompt_tokens_per_sec: f64,
    pub short_context_cached_prompt_tokens_per_sec: f64,
    pub short_context_completion_tokens_per_sec: f64,
    pub short_context_r_squared: f64,

    pub long_context_prompt_tokens_per_sec: f64,
    pub long_context_cached_prompt_tokens_per_sec: f64,
    pub long_context_completion_tokens_per_sec: f64,
    pub long_context_r_squared: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub localscore_estimate: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JsonRecord {
    /// Build a record; metrics stay zero for failed combinations
    pub fn from_result(result: &MatrixResult, include_score: bool) -> Self {
        let params = result
            .visible_params()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let (short, long, score) = if result.error.is_some() {
            ([0.0; 4], [0.0; 4], None)
        } else {
            (
                ContextMetrics::of(result.short_fit.as_ref()).or_zero(),
                ContextMetrics::of(result.long_fit.as_ref()).or_zero(),
                result.score.filter(|_| include_score),
            )
        };

        Self {
            params,
            short_context_prompt_tokens_per_sec: short[0],
            short_context_cached_prompt_tokens_per_sec: short[1],
            short_context_completion_tokens_per_sec: short[2],
            short_context_r_squared: short[3],
            long_context_prompt_tokens_per_sec: long[0],
            long_context_cached_prompt_tokens_per_sec: long[1],
            long_context_completion_tokens_per_sec: long[2],
            long_context_r_squared: long[3],
            localscore_estimate: score,
            error: result.error.clone(),
        }
    }
}

/// Pretty-printed JSON array of all combinations
pub fn render(results: &[MatrixResult], include_score: bool) -> Result<String> {
    let records: Vec<JsonRecord> = results
        .iter()
        .map(|r| JsonRecord::from_result(r, include_score))
        .collect();

    serde_json::to_string_pretty(&records).context("Failed to serialize results as JSON")
}
