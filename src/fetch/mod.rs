//! Retrieval primitives.
//!
//! A [`FragmentFetcher`] turns a source string taken verbatim from markup
//! (`data-include` values, script `src` values) into body text. Any
//! non-success outcome is a [`RetrievalError`].

pub mod fs;
pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::error::RetrievalError;

pub use fs::FsFetcher;
pub use http::{HttpFetchConfig, HttpFetcher};
pub use memory::{MemoryFetcher, MemoryRoute};

#[async_trait]
pub trait FragmentFetcher: Send + Sync {
    /// Retrieve `source` and decode its body as text.
    async fn fetch(&self, source: &str) -> Result<String, RetrievalError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Fetch with an optional deadline. Without one the call may wait forever.
pub async fn fetch_with_timeout(
    fetcher: &dyn FragmentFetcher,
    source: &str,
    timeout: Option<std::time::Duration>,
) -> Result<String, RetrievalError> {
    let Some(after) = timeout else {
        return fetcher.fetch(source).await;
    };
    match tokio::time::timeout(after, fetcher.fetch(source)).await {
        Ok(result) => result,
        Err(_) => Err(RetrievalError::Timeout {
            source_url: source.to_string(),
            after,
        }),
    }
}
