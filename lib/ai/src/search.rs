//! Search tool provider abstraction.

use crate::error::SearchError;
use async_trait::async_trait;

/// Trait for web-search tool providers.
///
/// Implementations return results already formatted as text suitable for
/// inclusion in a model prompt or a node output.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Runs a search query.
    ///
    /// # Errors
    ///
    /// Returns an error if the search service call fails.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        region: &str,
    ) -> Result<String, SearchError>;
}
