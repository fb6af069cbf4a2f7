//! Fetch module: cache-first retrieval with retries
//!
//! This module contains:
//! - Request and result types
//! - Content sources (plain HTTP; the browser source lives in `browser`)
//! - Retry delay policies
//! - The orchestrator tying cache, sources and retries together

mod backoff;
mod orchestrator;
mod request;
mod source;

pub use backoff::{geometric, random_up_to, RetryDelays};
pub use orchestrator::Fetcher;
pub use request::{Document, FetchRequest, FetchResult, Strategy};
pub use source::{build_http_client, ContentSource, HttpSource, DEFAULT_USER_AGENT};
