//! Observation data model
//!
//! An [`Observation`] is one probe outcome reduced to its token counts and
//! wall-clock response time. Its [`TokenSignature`] is the deduplication key
//! used by the sampling controller.

use crate::probe::Completion;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Token counts and response time of one completed probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub prompt_tokens: u32,
    pub cached_prompt_tokens: u32,
    pub completion_tokens: u32,
    #[serde(rename = "response_time_ms", serialize_with = "serialize_millis")]
    pub response_time: Duration,
}

/// Deduplication key: (prompt, cached prompt, completion) token counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenSignature {
    pub prompt_tokens: u32,
    pub cached_prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Observation {
    /// Create an observation from raw counts
    pub fn new(
        prompt_tokens: u32,
        cached_prompt_tokens: u32,
        completion_tokens: u32,
        response_time: Duration,
    ) -> Self {
        Self {
            prompt_tokens,
            cached_prompt_tokens,
            completion_tokens,
            response_time,
        }
    }

    /// Observation of a cold probe: every prompt token was processed
    pub fn cold(completion: &Completion) -> Self {
        Self::new(
            completion.prompt_tokens,
            0,
            completion.completion_tokens,
            completion.response_time,
        )
    }

    /// Observation of a repeated probe: the whole prompt is served from cache
    pub fn cache_reuse(completion: &Completion) -> Self {
        Self::new(
            0,
            completion.prompt_tokens,
            completion.completion_tokens,
            completion.response_time,
        )
    }

    /// Deduplication key
    pub fn signature(&self) -> TokenSignature {
        TokenSignature {
            prompt_tokens: self.prompt_tokens,
            cached_prompt_tokens: self.cached_prompt_tokens,
            completion_tokens: self.completion_tokens,
        }
    }

    /// Response time in fractional milliseconds
    pub fn response_time_ms(&self) -> f64 {
        self.response_time.as_nanos() as f64 / 1_000_000.0
    }
}

fn serialize_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_nanos() as f64 / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion() -> Completion {
        Completion {
            prompt_tokens: 120,
            completion_tokens: 7,
            response_time: Duration::from_micros(1_500),
        }
    }

    #[test]
    fn test_cold_keeps_prompt_tokens() {
        let obs = Observation::cold(&completion());
        assert_eq!(obs.prompt_tokens, 120);
        assert_eq!(obs.cached_prompt_tokens, 0);
        assert_eq!(obs.completion_tokens, 7);
    }

    #[test]
    fn test_cache_reuse_reclassifies_prompt_tokens() {
        let obs = Observation::cache_reuse(&completion());
        assert_eq!(obs.prompt_tokens, 0);
        assert_eq!(obs.cached_prompt_tokens, 120);
        assert_ne!(obs.signature(), Observation::cold(&completion()).signature());
    }

    #[test]
    fn test_response_time_ms() {
        assert_eq!(Observation::cold(&completion()).response_time_ms(), 1.5);
    }

    #[test]
    fn test_serialization_uses_milliseconds() {
        let json = serde_json::to_value(Observation::cold(&completion())).unwrap();
        assert_eq!(json["response_time_ms"], 1.5);
        assert_eq!(json["prompt_tokens"], 120);
    }
}
