use crate::config::ScoutConfig;
use crate::scrapers::browser::ChromeSessionFactory;
use crate::scrapers::crawler::{CrawlOptions, CrawlReport, Crawler};
use crate::scrapers::discovery::{DiscoveryAgent, DiscoveryOptions};
use crate::scrapers::error::{FetchError, ScrapeError, UrlError};
use crate::scrapers::extract::ListingExtractor;
use crate::scrapers::session::{PageSession, SessionFactory};
use crate::scrapers::traits::MarketplaceScraper;
use crate::scrapers::types::{SearchTarget, SearchUrl};
use crate::scrapers::urls::UrlBuilder;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::error;

/// Otomoto scraper. Browser work runs on the blocking pool, one fresh
/// session per call, closed when the call returns.
pub struct OtomotoScraper {
    factory: Arc<dyn SessionFactory>,
    urls: UrlBuilder,
    crawler: Arc<Crawler>,
    discovery: Arc<DiscoveryAgent>,
}

impl OtomotoScraper {
    /// Create a scraper backed by headless Chrome
    pub fn new(config: &ScoutConfig) -> Result<Self> {
        let factory = Arc::new(ChromeSessionFactory::new(config.browser.clone()));
        Self::with_factory(config, factory)
    }

    /// Create a scraper over any session backend
    pub fn with_factory(config: &ScoutConfig, factory: Arc<dyn SessionFactory>) -> Result<Self> {
        let urls = UrlBuilder::new(&config.base_url).context("Invalid base URL")?;
        let extractor = ListingExtractor::new(&config.selectors.listing)
            .context("Invalid listing selectors")?;

        Ok(Self {
            factory,
            crawler: Arc::new(Crawler::new(extractor, CrawlOptions::from_config(config))),
            discovery: Arc::new(DiscoveryAgent::new(
                urls.clone(),
                DiscoveryOptions::from_config(config),
            )),
            urls,
        })
    }

    pub fn search_url(&self, target: &SearchTarget) -> Result<SearchUrl, UrlError> {
        self.urls.build(target)
    }

    /// Runs `op` with a freshly opened session on the blocking pool.
    async fn in_session<T, F>(&self, op: F) -> Result<Result<T, FetchError>, JoinError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn PageSession) -> T + Send + 'static,
    {
        let factory = Arc::clone(&self.factory);
        tokio::task::spawn_blocking(move || -> Result<T, FetchError> {
            let mut session = factory.open()?;
            Ok(op(&mut *session))
        })
        .await
    }

    async fn discover<F>(&self, what: &str, op: F) -> Vec<String>
    where
        F: FnOnce(&mut dyn PageSession) -> Vec<String> + Send + 'static,
    {
        match self.in_session(op).await {
            Ok(Ok(found)) => found,
            Ok(Err(e)) => {
                error!("Could not open browser session to fetch {}: {}", what, e);
                Vec::new()
            }
            Err(e) => {
                error!("Discovery of {} failed: {}", what, e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl MarketplaceScraper for OtomotoScraper {
    async fn list_models(&self, make: &str) -> Vec<String> {
        let discovery = Arc::clone(&self.discovery);
        let owned = make.to_string();
        self.discover(&format!("models of {make}"), move |session| {
            discovery.list_models(session, &owned)
        })
        .await
    }

    async fn list_generations(&self, make: &str, model: &str) -> Vec<String> {
        let discovery = Arc::clone(&self.discovery);
        let (make_owned, model_owned) = (make.to_string(), model.to_string());
        self.discover(&format!("generations of {make} {model}"), move |session| {
            discovery.list_generations(session, &make_owned, &model_owned)
        })
        .await
    }

    async fn scrape(
        &self,
        target: &SearchTarget,
        cancel: CancellationToken,
    ) -> Result<CrawlReport, ScrapeError> {
        let url = self.urls.build(target)?;

        let crawler = Arc::clone(&self.crawler);
        let crawl_url = url.clone();
        match self
            .in_session(move |session| crawler.crawl(session, &crawl_url, &cancel))
            .await
        {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(e)) => {
                error!("Could not open browser session for {}: {}", url, e);
                Ok(CrawlReport::failed_to_start(&url, e.to_string()))
            }
            Err(e) => Err(ScrapeError::Worker(e.to_string())),
        }
    }

    fn source_name(&self) -> &'static str {
        "Otomoto"
    }
}
