use crate::config::BrowserConfig;
use crate::scrapers::error::FetchError;
use crate::scrapers::session::{ControlState, PageSession, SessionFactory};
use anyhow::{Context, Result};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Launches one headless Chrome per session.
#[derive(Debug, Clone)]
pub struct ChromeSessionFactory {
    config: BrowserConfig,
}

impl ChromeSessionFactory {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

impl SessionFactory for ChromeSessionFactory {
    fn open(&self) -> Result<Box<dyn PageSession>, FetchError> {
        let session = ChromeSession::launch(&self.config)
            .map_err(|e| FetchError::Launch(format!("{e:#}")))?;
        Ok(Box::new(session))
    }
}

/// A browser with a single tab. Dropping it closes the tab and the browser.
pub struct ChromeSession {
    // Owns the Chrome process; the tab is only valid while it lives.
    #[allow(dead_code)]
    browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeSession {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((config.window_width, config.window_height)))
            .idle_browser_timeout(Duration::from_secs(config.idle_timeout_secs))
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;
        tab.set_default_timeout(Duration::from_secs(config.navigation_timeout_secs));

        Ok(Self { browser, tab })
    }

    fn evaluate(&self, expression: &str) -> Result<Value, FetchError> {
        let result = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| FetchError::Session(format!("{e:#}")))?;
        Ok(result.value.unwrap_or(Value::Null))
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(true) {
            debug!("Closing tab failed: {:#}", e);
        }
    }
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

impl PageSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
        debug!("Navigating to {}", url);
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| FetchError::Navigation {
                url: url.to_string(),
                reason: format!("{e:#}"),
            })?;
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, FetchError> {
        Ok(self.tab.get_url())
    }

    fn content(&mut self) -> Result<String, FetchError> {
        self.tab
            .get_content()
            .map_err(|e| FetchError::Session(format!("{e:#}")))
    }

    fn has_element(&mut self, selector: &str) -> Result<bool, FetchError> {
        let found = self.evaluate(&format!(
            "document.querySelector({}) !== null",
            js_string(selector)
        ))?;
        Ok(found.as_bool().unwrap_or(false))
    }

    fn control_state(&mut self, selector: &str) -> Result<ControlState, FetchError> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return "absent";
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                const collapsed = rect.width === 0 || rect.height === 0;
                if (collapsed || style.visibility === "hidden" || style.display === "none") {{
                    return "hidden";
                }}
                if (el.disabled || el.getAttribute("aria-disabled") === "true") return "disabled";
                return "enabled";
            }})()"#,
            sel = js_string(selector)
        );
        let state = match self.evaluate(&script)?.as_str() {
            Some("enabled") => ControlState::Enabled,
            Some("disabled") => ControlState::Disabled,
            Some("hidden") => ControlState::Hidden,
            _ => ControlState::Absent,
        };
        Ok(state)
    }

    fn click(&mut self, selector: &str) -> Result<(), FetchError> {
        let element = self
            .tab
            .find_element(selector)
            .map_err(|_| FetchError::ControlNotFound {
                selector: selector.to_string(),
            })?;
        element.click().map_err(|e| {
            debug!("Click on {} failed: {:#}", selector, e);
            FetchError::NotInteractable {
                selector: selector.to_string(),
            }
        })?;
        Ok(())
    }

    fn visible_texts(&mut self, selector: &str) -> Result<Vec<String>, FetchError> {
        let script = format!(
            r#"JSON.stringify(Array.from(document.querySelectorAll({sel}))
                .filter(el => el.getClientRects().length > 0)
                .map(el => el.innerText.trim()))"#,
            sel = js_string(selector)
        );
        let raw = self.evaluate(&script)?;
        let json = raw.as_str().unwrap_or("[]");
        serde_json::from_str(json).map_err(|e| FetchError::Session(e.to_string()))
    }

    fn screenshot(&mut self) -> Result<Option<Vec<u8>>, FetchError> {
        let png = self
            .tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| FetchError::Session(format!("{e:#}")))?;
        Ok(Some(png))
    }
}
