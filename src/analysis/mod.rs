//! Latency model fitting and scoring
//!
//! - [`regression`]: per-token-type OLS fit with singular-data fallback
//! - [`score`]: composite score over the short- and long-context fits

pub mod regression;
pub mod score;

pub use regression::{fit, tokens_per_sec, ModelFit};
pub use score::{ScoreCalculator, ScoreConfig, REFERENCE_AVG_PROMPT_TOKENS};
