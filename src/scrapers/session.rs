use crate::scrapers::error::FetchError;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// State of an on-page control such as the next-page button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Absent,
    Hidden,
    Disabled,
    Enabled,
}

impl ControlState {
    pub fn is_interactable(self) -> bool {
        self == ControlState::Enabled
    }
}

/// One rendered browser page that can be navigated and interacted with.
///
/// A session is used by one operation at a time and closed when dropped.
pub trait PageSession {
    /// Navigates to `url` and waits for the initial load.
    fn navigate(&mut self, url: &str) -> Result<(), FetchError>;

    /// URL currently shown, after any client-side routing.
    fn current_url(&mut self) -> Result<String, FetchError>;

    /// Serialized DOM of the current page.
    fn content(&mut self) -> Result<String, FetchError>;

    /// Whether at least one element matches `selector` right now.
    fn has_element(&mut self, selector: &str) -> Result<bool, FetchError>;

    fn control_state(&mut self, selector: &str) -> Result<ControlState, FetchError>;

    fn click(&mut self, selector: &str) -> Result<(), FetchError>;

    /// Trimmed inner text of every visible element matching `selector`, in DOM order.
    fn visible_texts(&mut self, selector: &str) -> Result<Vec<String>, FetchError>;

    /// PNG capture of the viewport, when the backend can produce one.
    fn screenshot(&mut self) -> Result<Option<Vec<u8>>, FetchError> {
        Ok(None)
    }
}

/// Opens fresh, unshared page sessions.
pub trait SessionFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn PageSession>, FetchError>;
}

/// Timing for readiness polling.
#[derive(Debug, Clone, Copy)]
pub struct Wait {
    pub timeout: Duration,
    pub poll: Duration,
}

impl Default for Wait {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            poll: Duration::from_millis(250),
        }
    }
}

impl Wait {
    /// Polls `check` until it yields `Some`, or fails with a timeout.
    fn until<T>(
        &self,
        what: impl Into<String>,
        mut check: impl FnMut() -> Result<Option<T>, FetchError>,
    ) -> Result<T, FetchError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(value) = check()? {
                return Ok(value);
            }
            if Instant::now() >= deadline {
                return Err(FetchError::Timeout {
                    what: what.into(),
                    after: self.timeout,
                });
            }
            thread::sleep(self.poll);
        }
    }
}

/// Waits until `selector` matches an element on the current page.
pub fn wait_for_element(
    session: &mut dyn PageSession,
    selector: &str,
    wait: Wait,
) -> Result<(), FetchError> {
    wait.until(format!("element {selector}"), || {
        Ok(session.has_element(selector)?.then_some(()))
    })
}

/// Polls until at least one element matching `selector` is visible and
/// returns their texts.
pub fn wait_for_texts(
    session: &mut dyn PageSession,
    selector: &str,
    wait: Wait,
) -> Result<Vec<String>, FetchError> {
    wait.until(format!("visible {selector}"), || {
        let texts = session.visible_texts(selector)?;
        Ok((!texts.is_empty()).then_some(texts))
    })
}

/// Waits until the shown URL differs from `previous` and returns it.
pub fn wait_for_url_change(
    session: &mut dyn PageSession,
    previous: &str,
    wait: Wait,
) -> Result<String, FetchError> {
    wait.until(format!("navigation away from {previous}"), || {
        let url = session.current_url()?;
        Ok((url != previous).then_some(url))
    })
}

/// Clicks the cookie-consent button if one is showing. Never fails.
pub fn dismiss_consent(session: &mut dyn PageSession, selector: &str) {
    match session.control_state(selector) {
        Ok(state) if state.is_interactable() => match session.click(selector) {
            Ok(()) => debug!("Accepted cookie consent"),
            Err(e) => debug!("Cookie consent click failed: {}", e),
        },
        Ok(state) => debug!("No cookie consent to accept ({:?})", state),
        Err(e) => debug!("Cookie consent lookup failed: {}", e),
    }
}

/// Saves the page HTML and, when available, a screenshot under `dir`.
/// Capture problems are logged and otherwise ignored.
pub fn capture_debug(session: &mut dyn PageSession, dir: &Path, name: &str, html: Option<&str>) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!("Cannot create debug directory {}: {}", dir.display(), e);
        return;
    }

    let html = match html {
        Some(html) => Ok(html.to_string()),
        None => session.content(),
    };
    match html {
        Ok(html) => {
            let path = dir.join(format!("{name}.html"));
            if let Err(e) = std::fs::write(&path, html) {
                warn!("Failed to write {}: {}", path.display(), e);
            }
        }
        Err(e) => debug!("No HTML capture for {}: {}", name, e),
    }

    match session.screenshot() {
        Ok(Some(png)) => {
            let path = dir.join(format!("{name}.png"));
            if let Err(e) = std::fs::write(&path, png) {
                warn!("Failed to write {}: {}", path.display(), e);
            }
        }
        Ok(None) => {}
        Err(e) => debug!("No screenshot for {}: {}", name, e),
    }
}

/// Scripted in-memory session for tests.
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone, Default)]
    pub struct FakePage {
        pub html: String,
        /// Controls on the page and their state.
        pub controls: HashMap<String, ControlState>,
        /// Where clicking a control leads.
        pub links: HashMap<String, String>,
        /// Texts that become visible after clicking a control, keyed by
        /// (clicked control, text selector).
        pub reveals: HashMap<(String, String), Vec<String>>,
    }

    impl FakePage {
        pub fn new(html: impl Into<String>) -> Self {
            Self {
                html: html.into(),
                ..Self::default()
            }
        }

        pub fn control(mut self, selector: &str, state: ControlState) -> Self {
            self.controls.insert(selector.to_string(), state);
            self
        }

        pub fn link(mut self, selector: &str, target: &str) -> Self {
            self.controls.insert(selector.to_string(), ControlState::Enabled);
            self.links.insert(selector.to_string(), target.to_string());
            self
        }

        pub fn reveal(mut self, control: &str, selector: &str, texts: &[&str]) -> Self {
            self.controls.insert(control.to_string(), ControlState::Enabled);
            self.reveals.insert(
                (control.to_string(), selector.to_string()),
                texts.iter().map(|t| t.to_string()).collect(),
            );
            self
        }
    }

    #[derive(Debug, Default)]
    pub struct FakeSession {
        pub pages: HashMap<String, FakePage>,
        pub current: Option<String>,
        pub clicked: Vec<String>,
        pub visits: Vec<String>,
        pub failing: Vec<String>,
        /// Reads of `visible_texts` that come back empty before the
        /// revealed texts show up.
        pub lagging_reads: usize,
        pub text_reads: usize,
    }

    impl FakeSession {
        pub fn page(mut self, url: &str, page: FakePage) -> Self {
            self.pages.insert(url.to_string(), page);
            self
        }

        pub fn failing(mut self, url: &str) -> Self {
            self.failing.push(url.to_string());
            self
        }

        pub fn lagging(mut self, reads: usize) -> Self {
            self.lagging_reads = reads;
            self
        }

        fn current_page(&self) -> Result<&FakePage, FetchError> {
            self.current
                .as_ref()
                .and_then(|url| self.pages.get(url))
                .ok_or_else(|| FetchError::Session("no page loaded".into()))
        }
    }

    impl PageSession for FakeSession {
        fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
            self.visits.push(url.to_string());
            if self.failing.iter().any(|f| f == url) || !self.pages.contains_key(url) {
                return Err(FetchError::Navigation {
                    url: url.to_string(),
                    reason: "net::ERR_CONNECTION_RESET".into(),
                });
            }
            self.current = Some(url.to_string());
            Ok(())
        }

        fn current_url(&mut self) -> Result<String, FetchError> {
            self.current
                .clone()
                .ok_or_else(|| FetchError::Session("no page loaded".into()))
        }

        fn content(&mut self) -> Result<String, FetchError> {
            Ok(self.current_page()?.html.clone())
        }

        fn has_element(&mut self, selector: &str) -> Result<bool, FetchError> {
            let page = self.current_page()?;
            let in_controls = page.controls.contains_key(selector);
            let in_html = match scraper::Selector::parse(selector) {
                Ok(parsed) => {
                    let document = scraper::Html::parse_document(&page.html);
                    let found = document.select(&parsed).next().is_some();
                    found
                }
                Err(_) => false,
            };
            Ok(in_controls || in_html)
        }

        fn control_state(&mut self, selector: &str) -> Result<ControlState, FetchError> {
            Ok(self
                .current_page()?
                .controls
                .get(selector)
                .copied()
                .unwrap_or(ControlState::Absent))
        }

        fn click(&mut self, selector: &str) -> Result<(), FetchError> {
            let page = self.current_page()?;
            match page.controls.get(selector) {
                Some(ControlState::Enabled) => {}
                Some(_) => {
                    return Err(FetchError::NotInteractable {
                        selector: selector.to_string(),
                    })
                }
                None => {
                    return Err(FetchError::ControlNotFound {
                        selector: selector.to_string(),
                    })
                }
            }
            let target = page.links.get(selector).cloned();
            self.clicked.push(selector.to_string());
            if let Some(target) = target {
                if self.pages.contains_key(&target) {
                    self.current = Some(target);
                }
            }
            Ok(())
        }

        fn visible_texts(&mut self, selector: &str) -> Result<Vec<String>, FetchError> {
            self.text_reads += 1;
            if self.lagging_reads > 0 {
                self.lagging_reads -= 1;
                return Ok(Vec::new());
            }
            let page = self.current_page()?;
            let revealed = self
                .clicked
                .iter()
                .rev()
                .find_map(|c| page.reveals.get(&(c.clone(), selector.to_string())));
            Ok(revealed.cloned().unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{FakePage, FakeSession};
    use super::*;

    fn quick() -> Wait {
        Wait {
            timeout: Duration::from_millis(30),
            poll: Duration::from_millis(5),
        }
    }

    #[test]
    fn wait_for_element_finds_markup() {
        let mut session = FakeSession::default()
            .page("https://x.test/", FakePage::new("<main><article>1</article></main>"));
        session.navigate("https://x.test/").unwrap();
        assert!(wait_for_element(&mut session, "main", quick()).is_ok());
    }

    #[test]
    fn wait_for_element_times_out() {
        let mut session =
            FakeSession::default().page("https://x.test/", FakePage::new("<div></div>"));
        session.navigate("https://x.test/").unwrap();
        let err = wait_for_element(&mut session, "main", quick()).unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
    }

    #[test]
    fn url_change_is_detected_after_click() {
        let mut session = FakeSession::default()
            .page("https://x.test/1", FakePage::new("").link("a.next", "https://x.test/2"))
            .page("https://x.test/2", FakePage::new(""));
        session.navigate("https://x.test/1").unwrap();
        session.click("a.next").unwrap();
        let url = wait_for_url_change(&mut session, "https://x.test/1", quick()).unwrap();
        assert_eq!(url, "https://x.test/2");
    }

    #[test]
    fn text_wait_polls_until_options_render() {
        let mut session = FakeSession::default()
            .page("https://x.test/", FakePage::new("").reveal("#picker", "li", &["a", "b"]))
            .lagging(2);
        session.navigate("https://x.test/").unwrap();
        session.click("#picker").unwrap();
        let texts = wait_for_texts(&mut session, "li", quick()).unwrap();
        assert_eq!(texts, vec!["a", "b"]);
        assert_eq!(session.text_reads, 3);
    }

    #[test]
    fn text_wait_times_out_when_nothing_shows() {
        let mut session = FakeSession::default().page("https://x.test/", FakePage::new(""));
        session.navigate("https://x.test/").unwrap();
        let err = wait_for_texts(&mut session, "li", quick()).unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
    }

    #[test]
    fn consent_is_clicked_only_when_enabled() {
        let mut session = FakeSession::default()
            .page("https://x.test/a", FakePage::new("").control("#consent", ControlState::Enabled))
            .page("https://x.test/b", FakePage::new("").control("#consent", ControlState::Hidden));

        session.navigate("https://x.test/a").unwrap();
        dismiss_consent(&mut session, "#consent");
        session.navigate("https://x.test/b").unwrap();
        dismiss_consent(&mut session, "#consent");

        assert_eq!(session.clicked, vec!["#consent".to_string()]);
    }

    #[test]
    fn debug_capture_writes_html() {
        let dir = tempfile::tempdir().unwrap();
        let mut session =
            FakeSession::default().page("https://x.test/", FakePage::new("<p>hi</p>"));
        session.navigate("https://x.test/").unwrap();
        capture_debug(&mut session, dir.path(), "page-001", None);
        let saved = std::fs::read_to_string(dir.path().join("page-001.html")).unwrap();
        assert_eq!(saved, "<p>hi</p>");
        assert!(!dir.path().join("page-001.png").exists());
    }
}
