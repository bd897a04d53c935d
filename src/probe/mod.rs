//! Probe construction and execution
//!
//! - [`content`]: prompt text of a known length with a cache-defeating prefix
//! - [`client`]: the completion client seam and its HTTP implementation

pub mod client;
pub mod content;

pub use client::{
    ChatMessage, ClientConfig, Completion, CompletionClient, CompletionParams,
    HttpCompletionClient, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS,
};
pub use content::{filler, generate_probe_content, random_token, DEFAULT_PREFIX_LENGTH};
