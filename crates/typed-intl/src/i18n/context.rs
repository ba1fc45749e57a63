use super::locale::LocaleTag;
use super::IntlError;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// The active locale, readable without locks from any thread.
///
/// Only registered locales can become active. A switch is a single atomic
/// replace; readers see either the old or the new tag, never a mix.
#[derive(Debug)]
pub struct LocaleContext {
    current: ArcSwap<LocaleTag>,
    available: Arc<[LocaleTag]>,
}

impl LocaleContext {
    pub fn new(available: Vec<LocaleTag>, initial: &str) -> Result<Self, IntlError> {
        let initial = available
            .iter()
            .find(|locale| locale.as_str() == initial)
            .cloned()
            .ok_or_else(|| IntlError::LocaleNotAvailable(initial.to_owned()))?;

        Ok(LocaleContext {
            current: ArcSwap::from_pointee(initial),
            available: available.into(),
        })
    }

    /// Snapshot of the active locale
    pub fn current(&self) -> Arc<LocaleTag> {
        self.current.load_full()
    }

    pub fn available(&self) -> &[LocaleTag] {
        &self.available
    }

    pub fn find(&self, tag: &str) -> Option<&LocaleTag> {
        self.available.iter().find(|locale| locale.as_str() == tag)
    }

    /// Makes `tag` the active locale. Returns the previously active one.
    pub fn set(&self, tag: &str) -> Result<Arc<LocaleTag>, IntlError> {
        let Some(locale) = self.find(tag) else {
            tracing::error!(
                "Locale {} is not available. Available locales: {:?}",
                tag,
                self.available
            );
            return Err(IntlError::LocaleNotAvailable(tag.to_owned()));
        };

        let previous = self.current.swap(Arc::new(locale.clone()));
        tracing::info!("Switching locale from {} to {}", previous, locale);
        Ok(previous)
    }
}
