use crate::scrapers::urls::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Top-level scraper configuration. Every field has a default, so a config
/// file only needs the values it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// Listing root; make and model segments are appended to it.
    pub base_url: String,
    pub browser: BrowserConfig,
    pub crawl: CrawlConfig,
    pub selectors: SiteSelectors,
    /// When set, page HTML and screenshots are saved here.
    pub debug_dir: Option<PathBuf>,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            browser: BrowserConfig::default(),
            crawl: CrawlConfig::default(),
            selectors: SiteSelectors::default(),
            debug_dir: None,
        }
    }
}

impl ScoutConfig {
    /// Loads a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub navigation_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1280,
            window_height: 1024,
            navigation_timeout_secs: 30,
            idle_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Upper bound on result pages visited by one crawl.
    pub max_pages: usize,
    /// How long to wait for a page to become ready before giving up on it.
    pub page_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 500,
            page_timeout_ms: 20_000,
            poll_interval_ms: 250,
        }
    }
}

impl CrawlConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// CSS selectors and literals describing the marketplace markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    /// Results container; rendered together with the listing cards, and
    /// present (empty) when a search has no results.
    pub ready: String,
    pub consent_button: String,
    pub next_page: String,
    pub model_picker: String,
    pub generation_picker: String,
    pub picker_option: String,
    pub all_models_label: String,
    pub all_generations_label: String,
    pub listing: ListingSelectors,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            ready: r#"div[data-testid="search-results"]"#.to_string(),
            consent_button: "#onetrust-accept-btn-handler".to_string(),
            next_page: r#"li[data-testid="pagination-step-forwards"]"#.to_string(),
            model_picker: r#"input[placeholder="Model pojazdu"]"#.to_string(),
            generation_picker: r#"input[placeholder="Generacja"]"#.to_string(),
            picker_option: "p.ooa-6y8xco.er34gjf0".to_string(),
            all_models_label: "Wszystkie modele".to_string(),
            all_generations_label: "Wszystkie generacje".to_string(),
            listing: ListingSelectors::default(),
        }
    }
}

/// Markers for the fields of one listing card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// One element per offer.
    pub candidate: String,
    /// Compound text whose first two segments are engine size and power.
    pub summary: String,
    pub summary_delimiter: String,
    /// Attribute naming single-value parameters, e.g. `data-parameter`.
    pub parameter_attribute: String,
    pub mileage_key: String,
    pub gearbox_key: String,
    pub year_key: String,
    pub fuel_type_key: String,
    pub price: String,
    pub currency: String,
    /// Offers priced in any other currency are skipped.
    pub local_currency: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            candidate: "article[data-id]".to_string(),
            summary: r#"p[data-testid="ad-summary"]"#.to_string(),
            summary_delimiter: "•".to_string(),
            parameter_attribute: "data-parameter".to_string(),
            mileage_key: "mileage".to_string(),
            gearbox_key: "gearbox".to_string(),
            year_key: "year".to_string(),
            fuel_type_key: "fuel_type".to_string(),
            price: r#"[data-testid="ad-price"] h3"#.to_string(),
            currency: r#"[data-testid="ad-price"] p"#.to_string(),
            local_currency: "PLN".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"crawl": {{"max_pages": 3}}, "selectors": {{"listing": {{"local_currency": "EUR"}}}}}}"#
        )
        .unwrap();

        let config = ScoutConfig::from_file(file.path()).unwrap();
        assert_eq!(config.crawl.max_pages, 3);
        assert_eq!(config.crawl.page_timeout_ms, 20_000);
        assert_eq!(config.selectors.listing.local_currency, "EUR");
        assert_eq!(config.selectors.listing.mileage_key, "mileage");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.browser.headless);
        assert_eq!(config.selectors.ready, r#"div[data-testid="search-results"]"#);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScoutConfig::from_file("/nonexistent/car-scout.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = ScoutConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
