//! Mapping of display names onto the marketplace's URL path vocabulary.
//!
//! The generic transform covers most makes and models. Makes whose models
//! the site spells differently get an entry in [`EXCEPTIONS`]; adding a
//! site quirk means adding a row there.

/// A rewrite applied to an already normalized model segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRule {
    /// `<prefix>x` becomes `x-<prefix without trailing hyphen>`.
    SwapTokens { prefix: &'static str },
    /// Listed models get `suffix` appended.
    AppendSuffix {
        models: &'static [&'static str],
        suffix: &'static str,
    },
    /// Exact match `from` is replaced by `to`.
    Replace {
        from: &'static str,
        to: &'static str,
    },
}

impl ModelRule {
    /// Returns the rewritten segment, or `None` when the rule does not match.
    pub fn apply(&self, segment: &str) -> Option<String> {
        match *self {
            ModelRule::SwapTokens { prefix } => {
                let rest = segment.strip_prefix(prefix)?;
                if rest.is_empty() {
                    return None;
                }
                Some(format!("{}-{}", rest, prefix.trim_end_matches('-')))
            }
            ModelRule::AppendSuffix { models, suffix } => models
                .contains(&segment)
                .then(|| format!("{segment}{suffix}")),
            ModelRule::Replace { from, to } => (segment == from).then(|| to.to_string()),
        }
    }
}

/// Rules for one make, tried in order; the first match wins.
#[derive(Debug, Clone, Copy)]
pub struct MakeException {
    /// Normalized make segment.
    pub make: &'static str,
    pub rules: &'static [ModelRule],
}

pub const EXCEPTIONS: &[MakeException] = &[MakeException {
    make: "mercedes-benz",
    rules: &[
        ModelRule::SwapTokens { prefix: "klasa-" },
        ModelRule::AppendSuffix {
            models: &[
                "cla", "clk", "cls", "gl", "gla", "glb", "glc", "gle", "glk", "gls", "sl", "slk",
            ],
            suffix: "-klasa",
        },
        ModelRule::Replace {
            from: "ml",
            to: "m-klasa",
        },
    ],
}];

/// Name normalizer backed by a make exception table.
#[derive(Debug, Clone, Copy)]
pub struct NameNormalizer {
    exceptions: &'static [MakeException],
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(EXCEPTIONS)
    }
}

impl NameNormalizer {
    pub fn new(exceptions: &'static [MakeException]) -> Self {
        Self { exceptions }
    }

    pub fn normalize_make(&self, raw: &str) -> String {
        normalize_segment(raw)
    }

    pub fn normalize_model(&self, make: &str, raw: &str) -> String {
        let make = normalize_segment(make);
        let model = normalize_segment(raw);

        let Some(exception) = self.exceptions.iter().find(|e| e.make == make) else {
            return model;
        };

        exception
            .rules
            .iter()
            .find_map(|rule| rule.apply(&model))
            .unwrap_or(model)
    }
}

/// Drops a trailing `" (...)"` annotation, such as a listing count.
pub fn strip_annotation(raw: &str) -> &str {
    raw.split(" (").next().unwrap_or(raw).trim()
}

/// Generic transform: lower-case, spaces to hyphens, `&` to `and`.
pub fn normalize_segment(raw: &str) -> String {
    strip_annotation(raw)
        .to_lowercase()
        .replace(' ', "-")
        .replace('&', "and")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_transform() {
        let n = NameNormalizer::default();
        assert_eq!(n.normalize_make("Alfa Romeo"), "alfa-romeo");
        assert_eq!(n.normalize_make("Lynk & Co"), "lynk-and-co");
        assert_eq!(n.normalize_make("BMW (12 345)"), "bmw");
        assert_eq!(n.normalize_make("Mercedes-Benz"), "mercedes-benz");
    }

    #[test]
    fn models_of_regular_makes_match_make_transform() {
        let n = NameNormalizer::default();
        for (make, model) in [
            ("Volkswagen", "Golf Plus"),
            ("BMW", "Seria 3"),
            ("Audi", "A4 Allroad (1 024)"),
            ("Toyota", "Klasa C"),
            ("Ford", "ML"),
        ] {
            assert_eq!(n.normalize_model(make, model), n.normalize_make(model));
        }
    }

    #[test]
    fn mercedes_klasa_prefix_is_swapped() {
        let n = NameNormalizer::default();
        assert_eq!(n.normalize_model("Mercedes-Benz", "Klasa C"), "c-klasa");
        assert_eq!(n.normalize_model("Mercedes-Benz", "Klasa E (4 210)"), "e-klasa");
    }

    #[test]
    fn mercedes_body_codes_get_suffix() {
        let n = NameNormalizer::default();
        assert_eq!(n.normalize_model("Mercedes-Benz", "GLE"), "gle-klasa");
        assert_eq!(n.normalize_model("Mercedes-Benz", "SLK"), "slk-klasa");
        assert_eq!(n.normalize_model("Mercedes-Benz", "AMG GT"), "amg-gt");
    }

    #[test]
    fn mercedes_ml_is_replaced() {
        let n = NameNormalizer::default();
        assert_eq!(n.normalize_model("Mercedes-Benz", "ML"), "m-klasa");
        assert_eq!(n.normalize_model("mercedes benz", "ML"), "m-klasa");
        assert_eq!(n.normalize_model("Mercedes", "ML"), "ml");
    }

    #[test]
    fn swap_requires_a_second_token() {
        let rule = ModelRule::SwapTokens { prefix: "klasa-" };
        assert_eq!(rule.apply("klasa-"), None);
        assert_eq!(rule.apply("klasa-v"), Some("v-klasa".to_string()));
    }

    #[test]
    fn custom_table_is_honoured() {
        static TABLE: &[MakeException] = &[MakeException {
            make: "bmw",
            rules: &[ModelRule::Replace {
                from: "seria-3",
                to: "3-series",
            }],
        }];
        let n = NameNormalizer::new(TABLE);
        assert_eq!(n.normalize_model("BMW", "Seria 3"), "3-series");
        assert_eq!(n.normalize_model("Mercedes-Benz", "ML"), "ml");
    }
}
