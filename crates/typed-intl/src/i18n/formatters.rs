//! Locale-aware number, date/time and plural formatters plus their cache.
//!
//! Number and calendar data come from ICU. Formatters are immutable once
//! built and handed out as `Arc`s, so renders on different threads share
//! them without further locking.

use super::affixes::{self, CurrencyPlacement};
use super::ast::{PluralCategory, PluralKind};
use super::locale::LocaleTag;
use super::options::{
    CurrencyDisplay, DateTimeOptions, FieldWidth, NumberOptions, NumberStyle, SignDisplay,
};
use super::IntlError;
use chrono::{Datelike, NaiveDateTime, Timelike};
use fixed_decimal::{Decimal, FloatPrecision, SignDisplay as DecimalSign};
use fluent_langneg::{negotiate_languages, NegotiationStrategy};
use icu::calendar::{Date, Iso};
use icu::datetime::fieldsets::{
    self,
    enums::{CalendarPeriodFieldSet, DateAndTimeFieldSet, DateFieldSet, TimeFieldSet},
};
use icu::datetime::input::{DateTime as IsoDateTime, Time};
use icu::datetime::options::{Length, YearStyle};
use icu::datetime::DateTimeFormatter as CalendarFormatter;
use icu::decimal::options::{DecimalFormatterOptions, GroupingStrategy};
use icu::decimal::DecimalFormatter;
use icu::locale::extensions::unicode::{key, value};
use icu::locale::Locale;
use icu_provider::DataError;
use intl_pluralrules::{PluralRuleType, PluralRules as CldrPluralRules};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use unic_langid::{langid, LanguageIdentifier};

const DEFAULT_MAX_FRACTION_DIGITS: u8 = 3;

fn formatter_error(locale: &LocaleTag, reason: impl std::fmt::Debug) -> IntlError {
    IntlError::Formatter {
        locale: locale.as_str().to_owned(),
        reason: format!("{reason:?}"),
    }
}

/// Formats numbers for one locale and one set of options
pub struct NumberFormatter {
    locale: LocaleTag,
    options: NumberOptions,
    decimal: DecimalFormatter,
    currency: Option<(String, bool)>,
}

impl std::fmt::Debug for NumberFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumberFormatter")
            .field("locale", &self.locale)
            .field("options", &self.options)
            .finish()
    }
}

impl NumberFormatter {
    pub fn new(locale: &LocaleTag, options: &NumberOptions) -> Result<Self, IntlError> {
        let mut decimal_options = DecimalFormatterOptions::default();
        if !options.use_grouping {
            decimal_options.grouping_strategy = Some(GroupingStrategy::Never);
        }

        let decimal = DecimalFormatter::try_new(locale.locale().clone().into(), decimal_options)
            .map_err(|err: DataError| formatter_error(locale, err))?;

        let currency = match &options.style {
            NumberStyle::Currency(code) => Some(match options.currency_display {
                CurrencyDisplay::Symbol => affixes::currency_symbol(code, locale),
                CurrencyDisplay::Code => (code.clone(), true),
            }),
            _ => None,
        };

        Ok(NumberFormatter {
            locale: locale.clone(),
            options: options.clone(),
            decimal,
            currency,
        })
    }

    pub fn locale(&self) -> &LocaleTag {
        &self.locale
    }

    pub fn options(&self) -> &NumberOptions {
        &self.options
    }

    fn fraction_digits(&self) -> (i16, i16) {
        let (default_min, default_max) = match &self.options.style {
            NumberStyle::Decimal => (0, DEFAULT_MAX_FRACTION_DIGITS),
            NumberStyle::Percent => (0, 0),
            NumberStyle::Currency(code) => {
                let digits = affixes::currency_digits(code);
                (digits, digits)
            }
        };

        let min = self.options.min_fraction_digits.unwrap_or(default_min);
        let max = self
            .options
            .max_fraction_digits
            .unwrap_or(default_max)
            .max(min);

        (i16::from(min), i16::from(max))
    }

    fn sign_display(&self) -> DecimalSign {
        match self.options.sign {
            // a value that rounds to zero loses its sign
            SignDisplay::Auto => DecimalSign::Negative,
            SignDisplay::Always => DecimalSign::Always,
            SignDisplay::Never => DecimalSign::Never,
        }
    }

    pub fn format(&self, value: f64) -> String {
        let mut value = value * f64::from(self.options.scale);
        if self.options.style == NumberStyle::Percent {
            value *= 100.0;
        }

        let (sign, digits) = if value.is_finite() {
            self.format_finite(value)
        } else if value.is_nan() {
            (String::new(), "NaN".to_owned())
        } else {
            let sign = match self.options.sign {
                SignDisplay::Never => "",
                _ if value.is_sign_negative() => "-",
                SignDisplay::Always => "+",
                SignDisplay::Auto => "",
            };
            (sign.to_owned(), "∞".to_owned())
        };

        match (&self.options.style, &self.currency) {
            (NumberStyle::Percent, _) => {
                format!("{sign}{digits}{}", affixes::percent_suffix(&self.locale))
            }
            (NumberStyle::Currency(_), Some((symbol, spaced))) => {
                match affixes::currency_placement(&self.locale) {
                    CurrencyPlacement::Suffix => format!("{sign}{digits}\u{a0}{symbol}"),
                    CurrencyPlacement::PrefixSpaced => format!("{sign}{symbol}\u{a0}{digits}"),
                    CurrencyPlacement::Prefix if *spaced => format!("{sign}{symbol}\u{a0}{digits}"),
                    CurrencyPlacement::Prefix => format!("{sign}{symbol}{digits}"),
                }
            }
            _ => format!("{sign}{digits}"),
        }
    }

    /// Rounds a finite value and splits the localized sign from the digits
    fn format_finite(&self, value: f64) -> (String, String) {
        let mut decimal = match Decimal::try_from_f64(value, FloatPrecision::RoundTrip) {
            Ok(decimal) => decimal,
            Err(err) => {
                tracing::trace!("Cannot convert {} to a decimal: {:?}", value, err);
                return (String::new(), value.to_string());
            }
        };

        let (min, max) = self.fraction_digits();
        // `round` pads when the value is already shorter than the position
        if *decimal.magnitude_range().start() < -max {
            decimal.round(-max);
        }
        decimal.trim_end();
        decimal.pad_end(-min);
        decimal.apply_sign_display(self.sign_display());

        let signed = self.decimal.format(&decimal).to_string();
        decimal.apply_sign_display(DecimalSign::Never);
        let digits = self.decimal.format(&decimal).to_string();

        match signed.strip_suffix(digits.as_str()) {
            Some(sign) => (sign.to_owned(), digits),
            None => (String::new(), signed),
        }
    }
}

/// Which date fields a pattern shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateShape {
    D,
    MD,
    YMD,
    DE,
    MDE,
    YMDE,
    E,
    YM,
    Y,
    M,
}

impl DateShape {
    fn of(options: &DateTimeOptions) -> Option<Self> {
        let year = options.year.is_some();
        let month = options.month.is_some();
        let day = options.day.is_some();
        let weekday = options.weekday.is_some();

        let shape = match (year, month, day, weekday) {
            (false, false, false, false) => return None,
            (true, _, true, false) => DateShape::YMD,
            (true, _, true, true) => DateShape::YMDE,
            (false, true, true, false) => DateShape::MD,
            (false, true, true, true) => DateShape::MDE,
            (false, false, true, false) => DateShape::D,
            (false, false, true, true) => DateShape::DE,
            (_, _, false, true) => DateShape::E,
            (true, true, false, false) => DateShape::YM,
            (true, false, false, false) => DateShape::Y,
            (false, true, false, false) => DateShape::M,
        };
        Some(shape)
    }
}

fn length(options: &DateTimeOptions) -> Length {
    let width = match options.month {
        Some(FieldWidth::Numeric | FieldWidth::TwoDigit) => None,
        Some(width) => Some(width),
        None => options.weekday,
    };

    match width {
        Some(FieldWidth::Long) => Length::Long,
        Some(FieldWidth::Short | FieldWidth::Narrow) => Length::Medium,
        _ => Length::Short,
    }
}

fn year_style(options: &DateTimeOptions) -> YearStyle {
    match options.year {
        Some(FieldWidth::TwoDigit) => YearStyle::Auto,
        _ => YearStyle::Full,
    }
}

enum Pattern {
    Date(CalendarFormatter<DateFieldSet>),
    Period(CalendarFormatter<CalendarPeriodFieldSet>),
    Time(CalendarFormatter<TimeFieldSet>),
    DateTime(CalendarFormatter<DateAndTimeFieldSet>),
}

/// Formats dates and times for one locale and one set of fields
pub struct DateTimeFormatter {
    locale: LocaleTag,
    options: DateTimeOptions,
    pattern: Pattern,
}

impl std::fmt::Debug for DateTimeFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DateTimeFormatter")
            .field("locale", &self.locale)
            .field("options", &self.options)
            .finish()
    }
}

impl DateTimeFormatter {
    pub fn new(locale: &LocaleTag, options: &DateTimeOptions) -> Result<Self, IntlError> {
        let mut prefs = locale.locale().clone();
        if let Some(hour12) = options.hour12 {
            let cycle = if hour12 { value!("h12") } else { value!("h23") };
            prefs.extensions.unicode.keywords.set(key!("hc"), cycle);
        }

        let pattern = Self::pattern(locale, prefs, options)?;

        Ok(DateTimeFormatter {
            locale: locale.clone(),
            options: *options,
            pattern,
        })
    }

    fn pattern(
        locale: &LocaleTag,
        prefs: Locale,
        options: &DateTimeOptions,
    ) -> Result<Pattern, IntlError> {
        macro_rules! load {
            ($variant:ident, $fields:expr) => {
                CalendarFormatter::try_new(prefs.into(), $fields)
                    .map(Pattern::$variant)
                    .map_err(|err| formatter_error(locale, err))
            };
        }

        let length = length(options);
        let year_style = year_style(options);
        let seconds = options.second.is_some();

        let shape = DateShape::of(options);
        if !options.has_time() {
            let date = match shape.unwrap_or(DateShape::YMD) {
                DateShape::D => DateFieldSet::D(fieldsets::D::for_length(length)),
                DateShape::MD => DateFieldSet::MD(fieldsets::MD::for_length(length)),
                DateShape::YMD => DateFieldSet::YMD(
                    fieldsets::YMD::for_length(length).with_year_style(year_style),
                ),
                DateShape::DE => DateFieldSet::DE(fieldsets::DE::for_length(length)),
                DateShape::MDE => DateFieldSet::MDE(fieldsets::MDE::for_length(length)),
                DateShape::YMDE => DateFieldSet::YMDE(
                    fieldsets::YMDE::for_length(length).with_year_style(year_style),
                ),
                DateShape::E => DateFieldSet::E(fieldsets::E::for_length(length)),
                DateShape::YM => {
                    let period = CalendarPeriodFieldSet::YM(
                        fieldsets::YM::for_length(length).with_year_style(year_style),
                    );
                    return load!(Period, period);
                }
                DateShape::Y => {
                    let period = CalendarPeriodFieldSet::Y(
                        fieldsets::Y::for_length(length).with_year_style(year_style),
                    );
                    return load!(Period, period);
                }
                DateShape::M => {
                    let period = CalendarPeriodFieldSet::M(fieldsets::M::for_length(length));
                    return load!(Period, period);
                }
            };
            return load!(Date, date);
        }

        macro_rules! with_time {
            ($fields:expr) => {
                if seconds {
                    $fields.with_time_hms()
                } else {
                    $fields.with_time_hm()
                }
            };
        }

        let fields = match shape {
            None => {
                let time = if seconds {
                    fieldsets::T::hms()
                } else {
                    fieldsets::T::hm()
                };
                let time = TimeFieldSet::T(time.with_length(length));
                return load!(Time, time);
            }
            Some(DateShape::D) => DateAndTimeFieldSet::DT(with_time!(fieldsets::D::for_length(length))),
            Some(DateShape::MD) => {
                DateAndTimeFieldSet::MDT(with_time!(fieldsets::MD::for_length(length)))
            }
            Some(DateShape::DE) => {
                DateAndTimeFieldSet::DET(with_time!(fieldsets::DE::for_length(length)))
            }
            Some(DateShape::MDE) => {
                DateAndTimeFieldSet::MDET(with_time!(fieldsets::MDE::for_length(length)))
            }
            Some(DateShape::YMDE) => DateAndTimeFieldSet::YMDET(with_time!(
                fieldsets::YMDE::for_length(length).with_year_style(year_style)
            )),
            Some(DateShape::E) => DateAndTimeFieldSet::ET(with_time!(fieldsets::E::for_length(length))),
            // calendar periods have no time form; show the full date instead
            Some(DateShape::YMD | DateShape::YM | DateShape::Y | DateShape::M) => {
                DateAndTimeFieldSet::YMDT(with_time!(
                    fieldsets::YMD::for_length(length).with_year_style(year_style)
                ))
            }
        };
        load!(DateTime, fields)
    }

    pub fn locale(&self) -> &LocaleTag {
        &self.locale
    }

    pub fn options(&self) -> &DateTimeOptions {
        &self.options
    }

    pub fn format(&self, value: &NaiveDateTime) -> String {
        let Some(input) = iso_date_time(value) else {
            tracing::trace!("{} is outside the ISO calendar range", value);
            return value.to_string();
        };

        match &self.pattern {
            Pattern::Date(formatter) => formatter.format(&input).to_string(),
            Pattern::Period(formatter) => formatter.format(&input).to_string(),
            Pattern::Time(formatter) => formatter.format(&input).to_string(),
            Pattern::DateTime(formatter) => formatter.format(&input).to_string(),
        }
    }
}

fn iso_date_time(value: &NaiveDateTime) -> Option<IsoDateTime<Iso>> {
    let date = Date::try_new_iso(value.year(), value.month() as u8, value.day() as u8).ok()?;
    let time = Time::try_new(
        value.hour() as u8,
        value.minute() as u8,
        value.second() as u8,
        value.nanosecond() % 1_000_000_000,
    )
    .ok()?;
    Some(IsoDateTime { date, time })
}

fn rule_type(kind: PluralKind) -> PluralRuleType {
    match kind {
        PluralKind::Cardinal => PluralRuleType::CARDINAL,
        PluralKind::Ordinal => PluralRuleType::ORDINAL,
    }
}

/// CLDR plural rules for one locale
pub struct PluralRules {
    locale: LocaleTag,
    kind: PluralKind,
    resolved: LanguageIdentifier,
    rules: CldrPluralRules,
}

impl std::fmt::Debug for PluralRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluralRules")
            .field("locale", &self.locale)
            .field("kind", &self.kind)
            .field("resolved", &self.resolved)
            .finish()
    }
}

impl PluralRules {
    /// Resolves the closest locale with rule data, falling back to `en`
    pub fn new(locale: &LocaleTag, kind: PluralKind) -> Result<Self, IntlError> {
        let fallback = langid!("en");
        let resolved = negotiate_languages(
            &[locale.langid()],
            &CldrPluralRules::get_locales(rule_type(kind)),
            Some(&fallback),
            NegotiationStrategy::Lookup,
        )
        .first()
        .map(|langid| (*langid).clone())
        .unwrap_or_else(|| fallback.clone());

        if &resolved != locale.langid() {
            tracing::debug!(
                "Plural rules for {} resolved to {}",
                locale.as_str(),
                resolved
            );
        }

        let rules = CldrPluralRules::create(resolved.clone(), rule_type(kind)).map_err(|reason| {
            IntlError::PluralRules {
                locale: locale.as_str().to_owned(),
                reason,
            }
        })?;

        Ok(PluralRules {
            locale: locale.clone(),
            kind,
            resolved,
            rules,
        })
    }

    pub fn locale(&self) -> &LocaleTag {
        &self.locale
    }

    pub fn kind(&self) -> PluralKind {
        self.kind
    }

    /// The locale whose rule data is in use
    pub fn resolved(&self) -> &LanguageIdentifier {
        &self.resolved
    }

    pub fn select(&self, value: f64) -> PluralCategory {
        use intl_pluralrules::PluralCategory as Cldr;

        match self.rules.select(value) {
            Ok(Cldr::ZERO) => PluralCategory::Zero,
            Ok(Cldr::ONE) => PluralCategory::One,
            Ok(Cldr::TWO) => PluralCategory::Two,
            Ok(Cldr::FEW) => PluralCategory::Few,
            Ok(Cldr::MANY) => PluralCategory::Many,
            Ok(Cldr::OTHER) => PluralCategory::Other,
            Err(err) => {
                tracing::trace!("Plural selection failed for {}: {}", value, err);
                PluralCategory::Other
            }
        }
    }
}

/// Formatter entries held by a [`FormatterCache`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FormatterCounts {
    pub number: usize,
    pub date_time: usize,
    pub plural: usize,
}

/// Memoizes formatters by locale and normalized options.
///
/// Each map is constructed under its own lock so concurrent requests for the
/// same key build at most one formatter. Failed constructions are not cached.
#[derive(Debug, Default)]
pub struct FormatterCache {
    numbers: Mutex<HashMap<(LocaleTag, NumberOptions), Arc<NumberFormatter>>>,
    date_times: Mutex<HashMap<(LocaleTag, DateTimeOptions), Arc<DateTimeFormatter>>>,
    plurals: Mutex<HashMap<(LocaleTag, PluralKind), Arc<PluralRules>>>,
}

impl FormatterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number_formatter(
        &self,
        locale: &LocaleTag,
        options: &NumberOptions,
    ) -> Result<Arc<NumberFormatter>, IntlError> {
        let mut numbers = self.numbers.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (locale.clone(), options.clone());
        if let Some(formatter) = numbers.get(&key) {
            return Ok(formatter.clone());
        }

        tracing::debug!("Creating number formatter for {}: {:?}", locale, options);
        let formatter = Arc::new(NumberFormatter::new(locale, options)?);
        numbers.insert(key, formatter.clone());
        Ok(formatter)
    }

    pub fn date_time_formatter(
        &self,
        locale: &LocaleTag,
        options: &DateTimeOptions,
    ) -> Result<Arc<DateTimeFormatter>, IntlError> {
        let mut date_times = self
            .date_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let key = (locale.clone(), *options);
        if let Some(formatter) = date_times.get(&key) {
            return Ok(formatter.clone());
        }

        tracing::debug!("Creating date/time formatter for {}: {:?}", locale, options);
        let formatter = Arc::new(DateTimeFormatter::new(locale, options)?);
        date_times.insert(key, formatter.clone());
        Ok(formatter)
    }

    pub fn plural_rules(
        &self,
        locale: &LocaleTag,
        kind: PluralKind,
    ) -> Result<Arc<PluralRules>, IntlError> {
        let mut plurals = self.plurals.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(rules) = plurals.get(&(locale.clone(), kind)) {
            return Ok(rules.clone());
        }

        tracing::debug!("Creating {:?} plural rules for {}", kind, locale);
        let rules = Arc::new(PluralRules::new(locale, kind)?);
        plurals.insert((locale.clone(), kind), rules.clone());
        Ok(rules)
    }

    pub fn counts(&self) -> FormatterCounts {
        FormatterCounts {
            number: self.numbers.lock().unwrap_or_else(PoisonError::into_inner).len(),
            date_time: self
                .date_times
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            plural: self.plurals.lock().unwrap_or_else(PoisonError::into_inner).len(),
        }
    }
}
