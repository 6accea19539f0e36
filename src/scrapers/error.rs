use std::time::Duration;
use thiserror::Error;

/// Why a search URL could not be built. Always a caller input problem.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("malformed generation label \"{label}\": expected \"<code> (<start>[-<end>])\"")]
    MalformedGeneration { label: String },

    #[error("{field} is empty after normalization")]
    EmptySegment { field: &'static str },

    #[error("invalid base URL \"{base}\": {reason}")]
    InvalidBase { base: String, reason: String },
}

/// Rendering or interaction failure reported by a page session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("failed to start browser session: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    #[error("control not found: {selector}")]
    ControlNotFound { selector: String },

    #[error("control not interactable: {selector}")]
    NotInteractable { selector: String },

    #[error("browser session error: {0}")]
    Session(String),
}

/// Errors a scrape surfaces to its caller.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("cannot build search URL: {0}")]
    Url(#[from] UrlError),

    #[error("scrape worker failed: {0}")]
    Worker(String),
}
