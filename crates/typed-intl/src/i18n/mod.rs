//! Internationalization (i18n) engine
//!
//! This module validates locale configuration, parses ICU MessageFormat
//! templates, caches the parsed ASTs and locale-aware formatters, and renders
//! messages from a catalogue into strings or rich fragment sequences.

pub mod affixes;
pub mod ast;
pub mod cache;
pub mod config;
pub mod context;
pub mod formatters;
pub mod locale;
pub mod manager;
pub mod options;
pub mod parser;
pub mod render;
pub mod value;

pub use ast::{ArgumentKind, ArgumentUse, Message, Node, PluralCategory, PluralKind, PluralSelector};
pub use cache::AstCache;
pub use config::LocalizationConfig;
pub use context::LocaleContext;
pub use formatters::{DateTimeFormatter, FormatterCache, NumberFormatter, PluralRules};
pub use locale::{validate_locales, LocaleError, LocaleTag};
pub use manager::{CacheStats, Catalogue, Localization, MessageMap};
pub use options::{DateTimeOptions, NumberOptions};
pub use parser::{parse, ParseError, ParseErrorKind};
pub use value::{Fragment, TagFn, Value, ValueBag};

use std::borrow::Borrow;
use std::fmt;

/// Errors surfaced by the localization engine
#[derive(Debug, thiserror::Error)]
pub enum IntlError {
    /// One or more configured locale tags were rejected
    #[error("{}", join_locale_errors(.0))]
    InvalidLocales(Vec<LocaleError>),

    #[error("failed to parse message '{id}' ({locale}): {source}")]
    Parse {
        locale: String,
        id: IntlKeyBuf,
        #[source]
        source: ParseError,
    },

    #[error("message '{id}' not found for locale {locale}")]
    NotFound { id: IntlKeyBuf, locale: String },

    #[error("locale {0} is not available")]
    LocaleNotAvailable(String),

    #[error("missing argument '{0}'")]
    MissingArgument(String),

    #[error("argument '{name}' expected {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("no plural rules for {locale}: {reason}")]
    PluralRules {
        locale: String,
        reason: &'static str,
    },

    #[error("cannot load formatting data for {locale}: {reason}")]
    Formatter { locale: String, reason: String },
}

fn join_locale_errors(errors: &[LocaleError]) -> String {
    errors
        .iter()
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A borrowed message id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntlKey<'a>(&'a str);

impl<'a> IntlKey<'a> {
    pub fn new(key: &'a str) -> Self {
        IntlKey(key)
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }

    pub fn to_owned(&self) -> IntlKeyBuf {
        IntlKeyBuf(self.0.to_owned())
    }
}

impl fmt::Display for IntlKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl<'a> From<&'a str> for IntlKey<'a> {
    fn from(key: &'a str) -> Self {
        IntlKey(key)
    }
}

impl<'a> From<&'a String> for IntlKey<'a> {
    fn from(key: &'a String) -> Self {
        IntlKey(key.as_str())
    }
}

impl<'a> From<&'a IntlKeyBuf> for IntlKey<'a> {
    fn from(key: &'a IntlKeyBuf) -> Self {
        IntlKey(key.as_str())
    }
}

/// An owned message id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntlKeyBuf(String);

impl IntlKeyBuf {
    pub fn new(key: impl Into<String>) -> Self {
        IntlKeyBuf(key.into())
    }

    pub fn borrow(&self) -> IntlKey<'_> {
        IntlKey(self.0.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntlKeyBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for IntlKeyBuf {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Builds a [`ValueBag`] from `name => value` pairs
///
/// ```
/// use typed_intl::values;
///
/// let bag = values! { "name" => "Jane", "count" => 3 };
/// assert_eq!(bag.len(), 2);
/// ```
#[macro_export]
macro_rules! values {
    () => {
        $crate::i18n::ValueBag::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut bag = $crate::i18n::ValueBag::new();
        $(
            bag.insert($name, $value);
        )+
        bag
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_locales_joins_every_error() {
        let err = IntlError::InvalidLocales(vec![
            LocaleError::NonCanonical {
                input: "en-nz".to_owned(),
                canonical: "en-NZ".to_owned(),
            },
            LocaleError::Malformed {
                input: "en_NZ".to_owned(),
            },
        ]);

        assert_eq!(
            err.to_string(),
            "Invalid locale: \"en-nz\", did you mean \"en-NZ\"\nInvalid locale: \"en_NZ\""
        );
    }

    #[test]
    fn key_borrow_roundtrip() {
        let key = IntlKeyBuf::new("hello");
        assert_eq!(key.borrow().as_str(), "hello");
        assert_eq!(key.borrow().to_owned(), key);
        assert_eq!(IntlKey::from("hello"), key.borrow());
    }
}
