use serde::{Deserialize, Serialize};

/// Host-supplied localization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizationConfig {
    /// Canonical BCP-47 tags, in preference order
    pub locales: Vec<String>,
    /// Locale active at startup. Defaults to the first entry of `locales`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_locale: Option<String>,
    /// Wrap interpolated values in Unicode bidi isolation marks
    pub use_isolating: bool,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        LocalizationConfig {
            locales: vec!["en-US".to_owned()],
            default_locale: None,
            use_isolating: false,
        }
    }
}

impl LocalizationConfig {
    pub fn new<S: Into<String>>(locales: impl IntoIterator<Item = S>) -> Self {
        LocalizationConfig {
            locales: locales.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    pub fn with_isolating(mut self, use_isolating: bool) -> Self {
        self.use_isolating = use_isolating;
        self
    }

    /// The configured startup locale
    pub fn initial_locale(&self) -> Option<&str> {
        self.default_locale
            .as_deref()
            .or_else(|| self.locales.first().map(String::as_str))
    }
}
