use super::ast::Message;
use super::cache::AstCache;
use super::config::LocalizationConfig;
use super::context::LocaleContext;
use super::formatters::FormatterCache;
use super::locale::{validate_locales, LocaleError, LocaleTag};
use super::parser::{parse, ParseError};
use super::render::Renderer;
use super::value::{Fragment, ValueBag};
use super::{IntlError, IntlKey};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Message id to ICU MessageFormat template, for one locale
pub type MessageMap = BTreeMap<String, String>;

/// Locale tag to that locale's messages
pub type Catalogue = BTreeMap<String, MessageMap>;

/// Validates locales, registers message catalogues and renders messages
/// in the active (or an explicitly given) locale.
///
/// All methods take `&self`; a `Localization` can be shared across threads
/// behind an `Arc`.
#[derive(Debug)]
pub struct Localization {
    /// Registered locales and the active one
    context: LocaleContext,
    /// Parsed templates, keyed by template text
    ast_cache: AstCache,
    /// Number, date/time and plural formatters
    formatters: FormatterCache,

    use_isolating: bool,
}

impl Localization {
    /// Creates an engine for `locales` with `initial` active.
    ///
    /// Every tag must already be canonical; all offending tags are reported
    /// together.
    pub fn new<S: AsRef<str>>(locales: &[S], initial: &str) -> Result<Self, IntlError> {
        let locales = validate_locales(locales)?;
        Self::with_locales(locales, initial, false)
    }

    pub fn from_config(config: &LocalizationConfig) -> Result<Self, IntlError> {
        let locales = validate_locales(&config.locales)?;
        let initial = config
            .initial_locale()
            .ok_or_else(|| IntlError::InvalidLocales(vec![LocaleError::Empty]))?;
        Self::with_locales(locales, initial, config.use_isolating)
    }

    fn with_locales(
        locales: Vec<LocaleTag>,
        initial: &str,
        use_isolating: bool,
    ) -> Result<Self, IntlError> {
        let context = LocaleContext::new(locales, initial)?;

        tracing::info!(
            "Localization initialized - Selected locale: {}, Available: {:?}",
            context.current(),
            context
                .available()
                .iter()
                .map(LocaleTag::as_str)
                .collect::<Vec<_>>()
        );

        Ok(Localization {
            context,
            ast_cache: AstCache::new(),
            formatters: FormatterCache::new(),
            use_isolating,
        })
    }

    /// Wrap interpolated values in Unicode bidi isolation marks
    pub fn with_isolating(mut self, use_isolating: bool) -> Self {
        self.use_isolating = use_isolating;
        self
    }

    pub fn use_isolating(&self) -> bool {
        self.use_isolating
    }

    /// Registers a catalogue, parsing every template up front.
    ///
    /// Returns the catalogue unchanged. Fails on the first unregistered
    /// locale or malformed template (locales then ids in sorted order), in
    /// which case none of the catalogue's templates are cached.
    pub fn define_messages(&self, catalogue: Catalogue) -> Result<Catalogue, IntlError> {
        let mut staged: HashMap<&str, Arc<Message>> = HashMap::new();

        for (locale, messages) in &catalogue {
            if self.context.find(locale).is_none() {
                tracing::error!(
                    "Catalogue defines messages for unregistered locale {}",
                    locale
                );
                return Err(IntlError::LocaleNotAvailable(locale.clone()));
            }

            for (id, template) in messages {
                if staged.contains_key(template.as_str()) || self.ast_cache.get(template).is_some() {
                    continue;
                }

                let message = parse(template).map_err(|source| {
                    tracing::error!("Failed to parse message '{}' ({}): {}", id, locale, source);
                    IntlError::Parse {
                        locale: locale.clone(),
                        id: IntlKey::new(id).to_owned(),
                        source,
                    }
                })?;
                staged.insert(template, Arc::new(message));
            }
        }

        tracing::debug!(
            "Defined messages for {} locales, {} new templates",
            catalogue.len(),
            staged.len()
        );
        self.ast_cache.commit(
            staged
                .into_iter()
                .map(|(template, message)| (template.to_owned(), message)),
        );

        Ok(catalogue)
    }

    /// Renders `id` in the active locale
    pub fn format_message<'k>(
        &self,
        catalogue: &Catalogue,
        id: impl Into<IntlKey<'k>>,
        values: Option<&ValueBag>,
    ) -> Result<String, IntlError> {
        let locale = self.context.current();
        self.format_message_in(&locale, catalogue, id, values)
    }

    /// Renders `id` in the active locale as fragments, keeping tag output
    pub fn format_message_parts<'k>(
        &self,
        catalogue: &Catalogue,
        id: impl Into<IntlKey<'k>>,
        values: Option<&ValueBag>,
    ) -> Result<Vec<Fragment>, IntlError> {
        let locale = self.context.current();
        self.format_message_parts_in(&locale, catalogue, id, values)
    }

    /// Renders `id` in `locale`, which must be registered
    pub fn format_message_in<'k>(
        &self,
        locale: &LocaleTag,
        catalogue: &Catalogue,
        id: impl Into<IntlKey<'k>>,
        values: Option<&ValueBag>,
    ) -> Result<String, IntlError> {
        let id = id.into();
        let message = self.prepare(locale, catalogue, id, values)?;

        if let Some(text) = message.literal_text() {
            tracing::trace!("Literal message '{}' in locale: {}", id, locale);
            return Ok(text.to_owned());
        }

        let empty = ValueBag::new();
        self.renderer(locale, values.unwrap_or(&empty))
            .render_to_string(&message)
    }

    pub fn format_message_parts_in<'k>(
        &self,
        locale: &LocaleTag,
        catalogue: &Catalogue,
        id: impl Into<IntlKey<'k>>,
        values: Option<&ValueBag>,
    ) -> Result<Vec<Fragment>, IntlError> {
        let id = id.into();
        let message = self.prepare(locale, catalogue, id, values)?;

        if let Some(text) = message.literal_text() {
            tracing::trace!("Literal message '{}' in locale: {}", id, locale);
            if text.is_empty() {
                return Ok(Vec::new());
            }
            return Ok(vec![Fragment::text(text)]);
        }

        let empty = ValueBag::new();
        self.renderer(locale, values.unwrap_or(&empty))
            .render(&message)
    }

    fn renderer<'a>(&'a self, locale: &'a LocaleTag, values: &'a ValueBag) -> Renderer<'a> {
        Renderer::new(locale, &self.formatters, values).isolating(self.use_isolating)
    }

    /// Resolves the template and checks supplied values against it
    fn prepare(
        &self,
        locale: &LocaleTag,
        catalogue: &Catalogue,
        id: IntlKey<'_>,
        values: Option<&ValueBag>,
    ) -> Result<Arc<Message>, IntlError> {
        if self.context.find(locale.as_str()).is_none() {
            return Err(IntlError::LocaleNotAvailable(locale.to_string()));
        }

        let template = catalogue
            .get(locale.as_str())
            .and_then(|messages| messages.get(id.as_str()))
            .ok_or_else(|| IntlError::NotFound {
                id: id.to_owned(),
                locale: locale.to_string(),
            })?;

        let message = self.message(locale.as_str(), id, template)?;

        if let Some(values) = values {
            self.check_values(catalogue, id, values)?;
        }

        Ok(message)
    }

    fn message(&self, locale: &str, id: IntlKey<'_>, template: &str) -> Result<Arc<Message>, IntlError> {
        self.ast_cache
            .get_or_parse(template)
            .map_err(|source| IntlError::Parse {
                locale: locale.to_owned(),
                id: id.to_owned(),
                source,
            })
    }

    /// Every supplied value must be read by `id` in at least one locale
    fn check_values(
        &self,
        catalogue: &Catalogue,
        id: IntlKey<'_>,
        values: &ValueBag,
    ) -> Result<(), IntlError> {
        if values.is_empty() {
            return Ok(());
        }

        let mut known = BTreeSet::new();
        for (locale, messages) in catalogue {
            if let Some(template) = messages.get(id.as_str()) {
                let message = self.message(locale, id, template)?;
                known.extend(message.arguments().into_keys().map(str::to_owned));
            }
        }

        let unexpected = values
            .keys()
            .filter(|name| !known.contains(*name))
            .min();

        match unexpected {
            Some(name) => {
                tracing::warn!("Unexpected argument '{}' for message '{}'", name, id);
                Err(IntlError::UnexpectedArgument(name.to_owned()))
            }
            None => Ok(()),
        }
    }

    /// Parses `template` through the shared AST cache
    pub fn parse_template(&self, template: &str) -> Result<Arc<Message>, ParseError> {
        self.ast_cache.get_or_parse(template)
    }

    /// Sets the active locale; `tag` must be registered
    pub fn set_locale(&self, tag: &str) -> Result<(), IntlError> {
        tracing::info!("Attempting to set locale to: {}", tag);
        self.context.set(tag).map(|_| ())
    }

    /// Snapshot of the active locale
    pub fn current_locale(&self) -> Arc<LocaleTag> {
        self.context.current()
    }

    pub fn available_locales(&self) -> &[LocaleTag] {
        self.context.available()
    }

    /// Looks up a registered locale by tag
    pub fn locale(&self, tag: &str) -> Result<&LocaleTag, IntlError> {
        self.context
            .find(tag)
            .ok_or_else(|| IntlError::LocaleNotAvailable(tag.to_owned()))
    }

    /// Gets cache statistics for monitoring
    pub fn get_cache_stats(&self) -> CacheStats {
        let counts = self.formatters.counts();
        CacheStats {
            ast_cache_size: self.ast_cache.len(),
            number_formatters: counts.number,
            date_time_formatters: counts.date_time,
            plural_rules: counts.plural,
            locales: self
                .available_locales()
                .iter()
                .map(|locale| locale.as_str().to_owned())
                .collect(),
        }
    }
}

/// Statistics about cache usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub ast_cache_size: usize,
    pub number_formatters: usize,
    pub date_time_formatters: usize,
    pub plural_rules: usize,
    pub locales: Vec<String>,
}
