use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use url::Url;

/// What the user asked to search for: a make, a model and optionally a
/// generation label as shown by the generation picker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchTarget {
    pub make: String,
    pub model: String,
    pub generation: Option<String>,
}

impl SearchTarget {
    pub fn new(make: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            make: make.into(),
            model: model.into(),
            generation: None,
        }
    }

    pub fn with_generation(mut self, generation: impl Into<String>) -> Self {
        self.generation = Some(generation.into());
        self
    }
}

/// A generation label such as `"VII/VIIa (2012-2020)"` broken into the
/// parts the search filter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSpec {
    /// First slash-separated code, lower-cased, spaces replaced by hyphens.
    pub code: String,
    pub start_year: u16,
    /// `None` for open-ended or single-year generations.
    pub end_year: Option<u16>,
}

fn generation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(?P<codes>[^()]+?)\s*\(\s*(?P<start>\d{4})\s*(?:-\s*(?P<end>\d{4})?\s*)?\)\s*$")
            .expect("generation pattern is valid")
    })
}

impl GenerationSpec {
    /// Parses a picker label. Returns `None` when the label does not have the
    /// `code (years)` shape.
    pub fn parse(label: &str) -> Option<Self> {
        let caps = generation_pattern().captures(label)?;

        let code = caps
            .name("codes")?
            .as_str()
            .split('/')
            .next()?
            .trim()
            .to_lowercase()
            .replace(' ', "-");
        if code.is_empty() {
            return None;
        }

        let start_year = caps.name("start")?.as_str().parse().ok()?;
        let end_year = match caps.name("end") {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };

        Some(Self {
            code,
            start_year,
            end_year,
        })
    }

    /// Year part of the filter value: `2009-2017`, or just `2009`.
    pub fn years(&self) -> String {
        match self.end_year {
            Some(end) => format!("{}-{}", self.start_year, end),
            None => self.start_year.to_string(),
        }
    }

    /// Drops the end year, making the generation open-ended.
    pub fn open_ended(mut self) -> Self {
        self.end_year = None;
        self
    }

    /// Value of the `filter_enum_generation` query parameter.
    pub fn filter_value(&self) -> String {
        format!("gen-{}-{}", self.code, self.years())
    }
}

/// An absolute marketplace URL produced by [`crate::scrapers::UrlBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchUrl(Url);

impl SearchUrl {
    pub(crate) fn new(url: Url) -> Self {
        Self(url)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn query_value(&self, key: &str) -> Option<String> {
        self.0
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn path_segments(&self) -> Vec<String> {
        self.0
            .path_segments()
            .map(|segments| segments.map(str::to_string).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for SearchUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_closed_range() {
        let spec = GenerationSpec::parse("V (2009-2017)").unwrap();
        assert_eq!(spec.code, "v");
        assert_eq!(spec.start_year, 2009);
        assert_eq!(spec.end_year, Some(2017));
        assert_eq!(spec.filter_value(), "gen-v-2009-2017");
    }

    #[test]
    fn keeps_only_first_slash_code() {
        let spec = GenerationSpec::parse("VII/VIIa (2012-2020)").unwrap();
        assert_eq!(spec.code, "vii");
    }

    #[test]
    fn hyphenates_multi_word_codes() {
        let spec = GenerationSpec::parse("B8 FL (2014-2019)").unwrap();
        assert_eq!(spec.code, "b8-fl");
    }

    #[test]
    fn open_range_renders_start_year() {
        let spec = GenerationSpec::parse("VIII (2020-)").unwrap();
        assert_eq!(spec.end_year, None);
        assert_eq!(spec.years(), "2020");

        let single = GenerationSpec::parse("II (2015)").unwrap();
        assert_eq!(single.years(), "2015");
    }

    #[test]
    fn rejects_labels_without_years() {
        assert!(GenerationSpec::parse("V").is_none());
        assert!(GenerationSpec::parse("V ()").is_none());
        assert!(GenerationSpec::parse("(2009-2017)").is_none());
        assert!(GenerationSpec::parse("V (09-17)").is_none());
        assert!(GenerationSpec::parse("").is_none());
    }

    #[test]
    fn open_ended_drops_end_year() {
        let spec = GenerationSpec::parse("V (2009-2017)").unwrap().open_ended();
        assert_eq!(spec.filter_value(), "gen-v-2009");
    }
}
