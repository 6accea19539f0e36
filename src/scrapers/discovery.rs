use crate::config::ScoutConfig;
use crate::scrapers::error::FetchError;
use crate::scrapers::normalize::strip_annotation;
use crate::scrapers::session::{
    capture_debug, dismiss_consent, wait_for_element, wait_for_texts, ControlState, PageSession,
    Wait,
};
use crate::scrapers::urls::UrlBuilder;
use std::path::PathBuf;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub wait: Wait,
    pub ready_selector: String,
    pub consent_selector: String,
    pub model_picker: String,
    pub generation_picker: String,
    pub option_selector: String,
    pub all_models_label: String,
    pub all_generations_label: String,
    pub debug_dir: Option<PathBuf>,
}

impl DiscoveryOptions {
    pub fn from_config(config: &ScoutConfig) -> Self {
        let s = &config.selectors;
        Self {
            wait: Wait {
                timeout: config.crawl.page_timeout(),
                poll: config.crawl.poll_interval(),
            },
            ready_selector: s.ready.clone(),
            consent_selector: s.consent_button.clone(),
            model_picker: s.model_picker.clone(),
            generation_picker: s.generation_picker.clone(),
            option_selector: s.picker_option.clone(),
            all_models_label: s.all_models_label.clone(),
            all_generations_label: s.all_generations_label.clone(),
            debug_dir: config.debug_dir.clone(),
        }
    }
}

/// Reads the search pickers to enumerate models and generations.
///
/// Discovery is best-effort: any failure is logged and yields an empty list.
pub struct DiscoveryAgent {
    urls: UrlBuilder,
    options: DiscoveryOptions,
}

impl DiscoveryAgent {
    pub fn new(urls: UrlBuilder, options: DiscoveryOptions) -> Self {
        Self { urls, options }
    }

    /// Model names offered for `make`, without listing counts.
    pub fn list_models(&self, session: &mut dyn PageSession, make: &str) -> Vec<String> {
        info!("Fetching models for {}", make);
        let result = self
            .urls
            .make_url(make)
            .map_err(|e| FetchError::Session(e.to_string()))
            .and_then(|url| {
                self.read_picker(session, url.as_str(), &self.options.model_picker, "models")
            });

        match result {
            Ok(labels) => {
                let models = without_sentinel(
                    labels.iter().map(|l| strip_annotation(l).to_string()),
                    &self.options.all_models_label,
                );
                info!("Found {} models for {}", models.len(), make);
                models
            }
            Err(e) => {
                error!("Fetching models for {} failed: {}", make, e);
                Vec::new()
            }
        }
    }

    /// Generation labels for `make` / `model`, verbatim (`"code (years)"`).
    pub fn list_generations(
        &self,
        session: &mut dyn PageSession,
        make: &str,
        model: &str,
    ) -> Vec<String> {
        info!("Fetching generations for {} {}", make, model);
        let result = self
            .urls
            .model_url(make, model)
            .map_err(|e| FetchError::Session(e.to_string()))
            .and_then(|url| {
                self.read_picker(
                    session,
                    url.as_str(),
                    &self.options.generation_picker,
                    "generations",
                )
            });

        match result {
            Ok(labels) => {
                let generations =
                    without_sentinel(labels.into_iter(), &self.options.all_generations_label);
                info!(
                    "Found {} generations for {} {}",
                    generations.len(),
                    make,
                    model
                );
                generations
            }
            Err(e) => {
                error!("Fetching generations for {} {} failed: {}", make, model, e);
                Vec::new()
            }
        }
    }

    /// Opens the picker on `url` and returns the visible option labels.
    fn read_picker(
        &self,
        session: &mut dyn PageSession,
        url: &str,
        picker: &str,
        step: &str,
    ) -> Result<Vec<String>, FetchError> {
        session.navigate(url)?;
        wait_for_element(session, &self.options.ready_selector, self.options.wait)?;
        dismiss_consent(session, &self.options.consent_selector);
        self.capture(session, &format!("{step}-01-loaded"));

        match session.control_state(picker)? {
            state if state.is_interactable() => {}
            ControlState::Absent => {
                return Err(FetchError::ControlNotFound {
                    selector: picker.to_string(),
                })
            }
            _ => {
                return Err(FetchError::NotInteractable {
                    selector: picker.to_string(),
                })
            }
        }
        session.click(picker)?;
        debug!("Opened picker {}", picker);

        // The option list renders after the click; an empty read is not an answer yet.
        let labels = wait_for_texts(session, &self.options.option_selector, self.options.wait)?;
        self.capture(session, &format!("{step}-02-picker-open"));
        debug!("Picker options: {:?}", labels);
        Ok(labels)
    }

    fn capture(&self, session: &mut dyn PageSession, name: &str) {
        if let Some(dir) = &self.options.debug_dir {
            capture_debug(session, dir, name, None);
        }
    }
}

/// Drops blank labels and the "no filter" entry wherever it appears.
fn without_sentinel(labels: impl Iterator<Item = String>, sentinel: &str) -> Vec<String> {
    labels
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty() && l != sentinel)
        .collect()
}
