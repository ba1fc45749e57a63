//! Locale-scoped ICU MessageFormat messages.
//!
//! ```
//! use std::collections::BTreeMap;
//! use typed_intl::{values, Catalogue, Localization};
//!
//! let i18n = Localization::new(&["en-NZ", "fr"], "en-NZ")?;
//!
//! let mut catalogue = Catalogue::new();
//! catalogue.insert(
//!     "en-NZ".to_owned(),
//!     BTreeMap::from([(
//!         "inbox".to_owned(),
//!         "{count, plural, =0 {No messages} one {# message} other {# messages}}".to_owned(),
//!     )]),
//! );
//! let messages = i18n.define_messages(catalogue)?;
//!
//! let text = i18n.format_message(&messages, "inbox", Some(&values! { "count" => 3 }))?;
//! assert_eq!(text, "3 messages");
//! # Ok::<(), typed_intl::IntlError>(())
//! ```

pub mod i18n;

pub use i18n::{
    parse, CacheStats, Catalogue, Fragment, IntlError, IntlKey, IntlKeyBuf, LocaleTag,
    Localization, LocalizationConfig, MessageMap, ParseError, Value, ValueBag,
};
