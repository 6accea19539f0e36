pub mod browser;
pub mod crawler;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod otomoto;
pub mod session;
pub mod traits;
pub mod types;
pub mod urls;

pub use browser::ChromeSessionFactory;
pub use crawler::{CrawlOutcome, CrawlReport, CrawlState, Crawler};
pub use discovery::DiscoveryAgent;
pub use error::{FetchError, ScrapeError, UrlError};
pub use extract::ListingExtractor;
pub use normalize::NameNormalizer;
pub use otomoto::OtomotoScraper;
pub use session::{ControlState, PageSession, SessionFactory};
pub use traits::MarketplaceScraper;
pub use types::{GenerationSpec, SearchTarget, SearchUrl};
pub use urls::UrlBuilder;
