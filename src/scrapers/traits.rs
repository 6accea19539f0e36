use crate::scrapers::crawler::CrawlReport;
use crate::scrapers::error::ScrapeError;
use crate::scrapers::types::SearchTarget;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Operations a vehicle marketplace scraper offers to its callers.
///
/// Each call runs in its own browser session. Only malformed input is an
/// error; unreachable pages degrade to empty or partial results.
#[async_trait]
pub trait MarketplaceScraper: Send + Sync {
    /// Model names available for a make.
    async fn list_models(&self, make: &str) -> Vec<String>;

    /// Generation labels available for a make and model.
    async fn list_generations(&self, make: &str, model: &str) -> Vec<String>;

    /// Crawls every result page for `target`.
    async fn scrape(
        &self,
        target: &SearchTarget,
        cancel: CancellationToken,
    ) -> Result<CrawlReport, ScrapeError>;

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str;
}
