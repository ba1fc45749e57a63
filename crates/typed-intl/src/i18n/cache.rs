use super::ast::Message;
use super::parser::{parse, ParseError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Parsed messages keyed by their exact template text.
///
/// Entries are never evicted: the key space is bounded by the catalogues the
/// application defines.
#[derive(Debug, Default)]
pub struct AstCache {
    entries: Mutex<HashMap<String, Arc<Message>>>,
}

impl AstCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, template: &str) -> Option<Arc<Message>> {
        self.lock().get(template).cloned()
    }

    /// Returns the cached AST for `template`, parsing it on a miss.
    ///
    /// Parsing happens under the lock so one template is parsed at most once.
    /// Failed parses are not cached.
    pub fn get_or_parse(&self, template: &str) -> Result<Arc<Message>, ParseError> {
        let mut entries = self.lock();
        if let Some(message) = entries.get(template) {
            return Ok(message.clone());
        }

        let message = Arc::new(parse(template)?);
        tracing::trace!("Cached AST for template: {:?}", template);
        entries.insert(template.to_owned(), message.clone());
        Ok(message)
    }

    /// Inserts already parsed messages, keeping any existing entry for the
    /// same text so previously handed out `Arc`s stay canonical.
    pub fn commit(&self, parsed: impl IntoIterator<Item = (String, Arc<Message>)>) {
        let mut entries = self.lock();
        for (template, message) in parsed {
            entries.entry(template).or_insert(message);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Message>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
