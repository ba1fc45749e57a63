//! Locale tag validation
//!
//! Every configured locale must already be in canonical BCP-47 form, with
//! case normalized and deprecated subtags replaced (`iw` is `he`). The
//! validator never repairs a tag: it reports what the canonical form would be
//! and rejects the whole configuration.

use super::IntlError;
use icu::locale::{Locale, LocaleCanonicalizer};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use unic_langid::LanguageIdentifier;

/// Why a single locale tag was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocaleError {
    #[error("Invalid locale: \"{input}\", did you mean \"{canonical}\"")]
    NonCanonical { input: String, canonical: String },

    #[error("Invalid locale: \"{input}\"")]
    Malformed { input: String },

    #[error("Duplicate locale: \"{input}\"")]
    Duplicate { input: String },

    #[error("No locales configured")]
    Empty,
}

/// A validated, canonical BCP-47 locale tag
#[derive(Clone)]
pub struct LocaleTag {
    tag: String,
    locale: Locale,
    langid: LanguageIdentifier,
}

impl LocaleTag {
    /// Parses a tag, requiring it to be in canonical form already
    pub fn parse(input: &str) -> Result<Self, LocaleError> {
        let locale = canonicalize(input)?;
        let canonical = locale.to_string();

        if canonical != input {
            return Err(LocaleError::NonCanonical {
                input: input.to_owned(),
                canonical,
            });
        }

        // extensions and private use are dropped; plural data keys on the language
        let langid = locale
            .id
            .to_string()
            .parse::<LanguageIdentifier>()
            .map_err(|_| LocaleError::Malformed {
                input: input.to_owned(),
            })?;

        Ok(LocaleTag {
            tag: canonical,
            locale,
            langid,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.tag
    }

    /// The full locale, including any `-u-` preferences
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn langid(&self) -> &LanguageIdentifier {
        &self.langid
    }

    pub fn language(&self) -> &str {
        self.langid.language.as_str()
    }

    pub fn region(&self) -> Option<&str> {
        self.langid.region.as_ref().map(|region| region.as_str())
    }
}

/// Computes the canonical locale for `input`.
///
/// `_` separators are not BCP-47, so they are rejected here rather than
/// silently rewritten.
fn canonicalize(input: &str) -> Result<Locale, LocaleError> {
    if input.is_empty() || input.contains('_') || input.trim() != input {
        return Err(LocaleError::Malformed {
            input: input.to_owned(),
        });
    }

    let mut locale = input
        .parse::<Locale>()
        .map_err(|_| LocaleError::Malformed {
            input: input.to_owned(),
        })?;
    LocaleCanonicalizer::new_extended().canonicalize(&mut locale);
    Ok(locale)
}

/// Validates a configured locale list.
///
/// Errors from every tag are collected so callers see all problems at once.
pub fn validate_locales<S: AsRef<str>>(locales: &[S]) -> Result<Vec<LocaleTag>, IntlError> {
    if locales.is_empty() {
        return Err(IntlError::InvalidLocales(vec![LocaleError::Empty]));
    }

    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    let mut tags = Vec::with_capacity(locales.len());

    for locale in locales {
        let locale = locale.as_ref();
        match LocaleTag::parse(locale) {
            Ok(tag) => {
                if !seen.insert(tag.as_str().to_owned()) {
                    errors.push(LocaleError::Duplicate {
                        input: locale.to_owned(),
                    });
                    continue;
                }
                tags.push(tag);
            }
            Err(err) => {
                tracing::debug!("rejected locale '{}': {}", locale, err);
                errors.push(err);
            }
        }
    }

    if errors.is_empty() {
        Ok(tags)
    } else {
        Err(IntlError::InvalidLocales(errors))
    }
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

impl fmt::Debug for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocaleTag").field(&self.tag).finish()
    }
}

impl PartialEq for LocaleTag {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for LocaleTag {}

impl Hash for LocaleTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
    }
}

impl PartialOrd for LocaleTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LocaleTag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tag.cmp(&other.tag)
    }
}

impl AsRef<str> for LocaleTag {
    fn as_ref(&self) -> &str {
        &self.tag
    }
}
