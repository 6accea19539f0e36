//! Paginated crawl of one search URL.
//!
//! The crawl is a small state machine: `Fetching` renders the current page,
//! `Extracting` pulls complete listings out of it and `Paginating` follows
//! the next-page control. It stops in `Done` when no enabled next-page
//! control remains (or the page budget is spent) and in `Aborted` when a
//! page cannot be rendered or the crawl is cancelled. Both terminal states
//! hand back everything harvested so far.

use crate::config::ScoutConfig;
use crate::models::ListingRecord;
use crate::scrapers::error::FetchError;
use crate::scrapers::extract::ListingExtractor;
use crate::scrapers::session::{
    capture_debug, dismiss_consent, wait_for_element, wait_for_url_change, PageSession, Wait,
};
use crate::scrapers::types::SearchUrl;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    Fetching,
    Extracting,
    Paginating,
    Done,
    Aborted,
}

/// Why a crawl stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrawlOutcome {
    /// The last page had no usable next-page control.
    Exhausted,
    /// More pages existed but the page budget was used up.
    PageLimit { max_pages: usize },
    Cancelled,
    /// Page `page` (1-based) could not be rendered.
    FetchFailed { page: usize, reason: String },
}

impl CrawlOutcome {
    pub fn terminal_state(&self) -> CrawlState {
        match self {
            CrawlOutcome::Exhausted | CrawlOutcome::PageLimit { .. } => CrawlState::Done,
            CrawlOutcome::Cancelled | CrawlOutcome::FetchFailed { .. } => CrawlState::Aborted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageStats {
    pub number: usize,
    pub url: String,
    pub candidates: usize,
    pub extracted: usize,
    pub skipped: usize,
}

/// Result of one crawl, successful or not.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub state: CrawlState,
    pub outcome: CrawlOutcome,
    pub transitions: Vec<CrawlState>,
    pub pages: Vec<PageStats>,
    pub records: Vec<ListingRecord>,
}

impl CrawlReport {
    /// Report for a crawl that failed before its first page, e.g. because no
    /// browser session could be opened.
    pub fn failed_to_start(url: &SearchUrl, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            url: url.to_string(),
            started_at: now,
            finished_at: now,
            state: CrawlState::Aborted,
            outcome: CrawlOutcome::FetchFailed {
                page: 1,
                reason: reason.into(),
            },
            transitions: vec![CrawlState::Fetching, CrawlState::Aborted],
            pages: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.state == CrawlState::Aborted
    }

    /// Finished normally but found nothing.
    pub fn is_empty_result(&self) -> bool {
        self.state == CrawlState::Done && self.records.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.pages.iter().map(|p| p.skipped).sum()
    }
}

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub max_pages: usize,
    pub wait: Wait,
    pub ready_selector: String,
    pub next_page_selector: String,
    pub consent_selector: String,
    pub debug_dir: Option<PathBuf>,
}

impl CrawlOptions {
    pub fn from_config(config: &ScoutConfig) -> Self {
        Self {
            max_pages: config.crawl.max_pages.max(1),
            wait: Wait {
                timeout: config.crawl.page_timeout(),
                poll: config.crawl.poll_interval(),
            },
            ready_selector: config.selectors.ready.clone(),
            next_page_selector: config.selectors.next_page.clone(),
            consent_selector: config.selectors.consent_button.clone(),
            debug_dir: config.debug_dir.clone(),
        }
    }
}

pub struct Crawler {
    extractor: ListingExtractor,
    options: CrawlOptions,
}

impl Crawler {
    pub fn new(extractor: ListingExtractor, options: CrawlOptions) -> Self {
        Self { extractor, options }
    }

    /// Harvests every complete listing reachable from `url` by following the
    /// next-page control. Never fails: render problems end the crawl early
    /// with whatever was collected.
    pub fn crawl(
        &self,
        session: &mut dyn PageSession,
        url: &SearchUrl,
        cancel: &CancellationToken,
    ) -> CrawlReport {
        let started_at = Utc::now();
        info!("Crawling {}", url);

        let mut current = url.to_string();
        let mut html = String::new();
        let mut transitions = Vec::new();
        let mut pages: Vec<PageStats> = Vec::new();
        let mut records = Vec::new();
        let mut state = CrawlState::Fetching;
        let mut outcome = CrawlOutcome::Exhausted;

        loop {
            transitions.push(state);
            state = match state {
                CrawlState::Fetching => match self.render(session, &current, pages.len() + 1) {
                    Ok(content) => {
                        html = content;
                        CrawlState::Extracting
                    }
                    Err(e) => {
                        outcome = CrawlOutcome::FetchFailed {
                            page: pages.len() + 1,
                            reason: e.to_string(),
                        };
                        CrawlState::Aborted
                    }
                },
                CrawlState::Extracting => {
                    let page = self.extractor.extract_page(&html);
                    let stats = PageStats {
                        number: pages.len() + 1,
                        url: current.clone(),
                        candidates: page.candidates,
                        extracted: page.records.len(),
                        skipped: page.skipped,
                    };
                    debug!(
                        "Page {}: {} candidates, {} extracted, {} skipped",
                        stats.number, stats.candidates, stats.extracted, stats.skipped
                    );
                    records.extend(page.records);
                    pages.push(stats);
                    CrawlState::Paginating
                }
                CrawlState::Paginating => {
                    match session.control_state(&self.options.next_page_selector) {
                        Ok(state) if !state.is_interactable() => {
                            debug!("No further page (next control {:?})", state);
                            outcome = CrawlOutcome::Exhausted;
                            CrawlState::Done
                        }
                        Ok(_) if pages.len() >= self.options.max_pages => {
                            warn!(
                                "Stopping at page limit of {} for {}",
                                self.options.max_pages, url
                            );
                            outcome = CrawlOutcome::PageLimit {
                                max_pages: self.options.max_pages,
                            };
                            CrawlState::Done
                        }
                        Ok(_) if cancel.is_cancelled() => {
                            outcome = CrawlOutcome::Cancelled;
                            CrawlState::Aborted
                        }
                        Ok(_) => match self.advance(session) {
                            Ok(next) => {
                                current = next;
                                CrawlState::Fetching
                            }
                            Err(e) => {
                                outcome = CrawlOutcome::FetchFailed {
                                    page: pages.len() + 1,
                                    reason: e.to_string(),
                                };
                                CrawlState::Aborted
                            }
                        },
                        Err(e) => {
                            outcome = CrawlOutcome::FetchFailed {
                                page: pages.len() + 1,
                                reason: e.to_string(),
                            };
                            CrawlState::Aborted
                        }
                    }
                }
                CrawlState::Done | CrawlState::Aborted => break,
            };
        }

        let report = CrawlReport {
            url: url.to_string(),
            started_at,
            finished_at: Utc::now(),
            state: outcome.terminal_state(),
            outcome,
            transitions,
            pages,
            records,
        };

        if report.is_aborted() {
            error!(
                "Crawl of {} aborted after {} pages ({:?}); keeping {} listings",
                report.url,
                report.pages.len(),
                report.outcome,
                report.records.len()
            );
        } else if report.records.is_empty() {
            warn!("No listings found at {}", report.url);
        } else {
            info!(
                "Scraped {} listings from {} pages ({} candidates skipped)",
                report.records.len(),
                report.pages.len(),
                report.skipped()
            );
        }

        report
    }

    fn render(
        &self,
        session: &mut dyn PageSession,
        url: &str,
        number: usize,
    ) -> Result<String, FetchError> {
        debug!("Fetching page {}: {}", number, url);
        session.navigate(url)?;
        wait_for_element(session, &self.options.ready_selector, self.options.wait)?;
        if number == 1 {
            dismiss_consent(session, &self.options.consent_selector);
        }
        let html = session.content()?;

        if let Some(dir) = &self.options.debug_dir {
            capture_debug(session, dir, &format!("page-{number:03}"), Some(html.as_str()));
        }
        Ok(html)
    }

    /// Clicks the next-page control and returns the URL the browser lands on.
    fn advance(&self, session: &mut dyn PageSession) -> Result<String, FetchError> {
        let previous = session.current_url()?;
        session.click(&self.options.next_page_selector)?;
        wait_for_url_change(session, &previous, self.options.wait)
    }
}
