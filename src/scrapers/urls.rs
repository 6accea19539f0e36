use crate::scrapers::error::UrlError;
use crate::scrapers::normalize::NameNormalizer;
use crate::scrapers::types::{GenerationSpec, SearchTarget, SearchUrl};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.otomoto.pl/osobowe";

pub const GENERATION_PARAM: &str = "filter_enum_generation";

/// Generations the site files as open-ended from their start year, keyed by
/// normalized (make, model, code). The one known case is the Polo V; this is
/// not a general rule.
const OPEN_ENDED_GENERATIONS: &[(&str, &str, &str)] = &[("volkswagen", "polo", "v")];

/// Builds marketplace URLs from user-facing names.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: Url,
    names: NameNormalizer,
}

impl UrlBuilder {
    pub fn new(base_url: &str) -> Result<Self, UrlError> {
        let base = Url::parse(base_url).map_err(|e| UrlError::InvalidBase {
            base: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(UrlError::InvalidBase {
                base: base_url.to_string(),
                reason: "URL cannot carry path segments".into(),
            });
        }
        Ok(Self {
            base,
            names: NameNormalizer::default(),
        })
    }

    /// Landing page for a make, where the model picker lives.
    pub fn make_url(&self, make: &str) -> Result<SearchUrl, UrlError> {
        let make = segment(self.names.normalize_make(make), "make")?;
        Ok(SearchUrl::new(self.join(&[&make])))
    }

    /// Landing page for a make and model, where the generation picker lives.
    pub fn model_url(&self, make: &str, model: &str) -> Result<SearchUrl, UrlError> {
        let (make, model) = self.segments(make, model)?;
        Ok(SearchUrl::new(self.join(&[&make, &model])))
    }

    /// Search URL for a target, with the generation filter when one is given.
    ///
    /// A generation label that does not parse is an error; the filter is
    /// never silently dropped.
    pub fn build(&self, target: &SearchTarget) -> Result<SearchUrl, UrlError> {
        let (make, model) = self.segments(&target.make, &target.model)?;
        let mut url = self.join(&[&make, &model]);

        if let Some(label) = &target.generation {
            let mut generation =
                GenerationSpec::parse(label).ok_or_else(|| UrlError::MalformedGeneration {
                    label: label.clone(),
                })?;

            let open_ended = OPEN_ENDED_GENERATIONS
                .iter()
                .any(|&(m, md, code)| m == make && md == model && code == generation.code);
            if open_ended {
                generation = generation.open_ended();
            }

            url.query_pairs_mut()
                .append_pair(GENERATION_PARAM, &generation.filter_value());
        }

        Ok(SearchUrl::new(url))
    }

    fn segments(&self, make: &str, model: &str) -> Result<(String, String), UrlError> {
        let model = segment(self.names.normalize_model(make, model), "model")?;
        let make = segment(self.names.normalize_make(make), "make")?;
        Ok((make, model))
    }

    fn join(&self, parts: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(parts);
        }
        url
    }
}

impl Default for UrlBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL).expect("default base URL is valid")
    }
}

fn segment(value: String, field: &'static str) -> Result<String, UrlError> {
    if value.is_empty() {
        Err(UrlError::EmptySegment { field })
    } else {
        Ok(value)
    }
}
