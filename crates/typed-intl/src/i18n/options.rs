//! Formatting options and the style/skeleton syntax that produces them.
//!
//! Options are normalized at parse time; two spellings of the same style
//! (`integer` and `::precision-integer`) yield equal options and therefore
//! share one cached formatter.

/// Rejected `style` text in a `number`, `date` or `time` argument
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleError {
    #[error("unknown style '{0}'")]
    UnknownPreset(String),

    #[error("unknown skeleton token '{0}'")]
    UnknownToken(String),

    #[error("invalid currency code '{0}'")]
    InvalidCurrency(String),

    #[error("unsupported skeleton field '{0}'")]
    UnsupportedField(char),

    #[error("empty skeleton")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberStyle {
    #[default]
    Decimal,
    Percent,
    /// ISO 4217 code
    Currency(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignDisplay {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CurrencyDisplay {
    #[default]
    Symbol,
    Code,
}

/// Upper bound used for open-ended fraction precision (`.00+`)
const MAX_FRACTION_DIGITS: u8 = 20;

/// Currency used by the bare `currency` preset
const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumberOptions {
    pub style: NumberStyle,
    pub min_fraction_digits: Option<u8>,
    pub max_fraction_digits: Option<u8>,
    pub use_grouping: bool,
    pub sign: SignDisplay,
    pub currency_display: CurrencyDisplay,
    pub scale: u32,
}

impl Default for NumberOptions {
    fn default() -> Self {
        NumberOptions {
            style: NumberStyle::Decimal,
            min_fraction_digits: None,
            max_fraction_digits: None,
            use_grouping: true,
            sign: SignDisplay::Auto,
            currency_display: CurrencyDisplay::Symbol,
            scale: 1,
        }
    }
}

impl NumberOptions {
    pub fn percent() -> Self {
        NumberOptions {
            style: NumberStyle::Percent,
            ..Default::default()
        }
    }

    pub fn currency(code: &str) -> Self {
        NumberOptions {
            style: NumberStyle::Currency(code.to_owned()),
            ..Default::default()
        }
    }

    pub fn integer() -> Self {
        NumberOptions {
            min_fraction_digits: Some(0),
            max_fraction_digits: Some(0),
            ..Default::default()
        }
    }

    /// Parses the text after `{name, number,`
    pub fn from_style(style: &str) -> Result<Self, StyleError> {
        match style.strip_prefix("::") {
            Some(skeleton) => Self::from_skeleton(skeleton),
            None => match style {
                "integer" => Ok(Self::integer()),
                "percent" => Ok(Self::percent()),
                "currency" => Ok(Self::currency(DEFAULT_CURRENCY)),
                other => Err(StyleError::UnknownPreset(other.to_owned())),
            },
        }
    }

    /// Parses an ICU number skeleton such as `currency/EUR .00 group-off`
    pub fn from_skeleton(skeleton: &str) -> Result<Self, StyleError> {
        let mut options = NumberOptions::default();
        let mut tokens = skeleton.split_whitespace().peekable();
        if tokens.peek().is_none() {
            return Err(StyleError::Empty);
        }

        for token in tokens {
            match token {
                "percent" | "%" => options.style = NumberStyle::Percent,
                "group-off" | ",_" => options.use_grouping = false,
                "group-auto" => options.use_grouping = true,
                "precision-integer" => {
                    options.min_fraction_digits = Some(0);
                    options.max_fraction_digits = Some(0);
                }
                "sign-always" | "+!" => options.sign = SignDisplay::Always,
                "sign-never" | "+_" => options.sign = SignDisplay::Never,
                "sign-auto" => options.sign = SignDisplay::Auto,
                "unit-width-iso-code" => options.currency_display = CurrencyDisplay::Code,
                "unit-width-short" | "unit-width-narrow" => {
                    options.currency_display = CurrencyDisplay::Symbol
                }
                _ => {
                    if let Some(code) = token.strip_prefix("currency/") {
                        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
                            return Err(StyleError::InvalidCurrency(code.to_owned()));
                        }
                        options.style = NumberStyle::Currency(code.to_owned());
                    } else if let Some(factor) = token.strip_prefix("scale/") {
                        options.scale = factor
                            .parse::<u32>()
                            .ok()
                            .filter(|factor| *factor > 0)
                            .ok_or_else(|| StyleError::UnknownToken(token.to_owned()))?;
                    } else if let Some(precision) = token.strip_prefix('.') {
                        let (min, max) = parse_fraction_precision(precision)
                            .ok_or_else(|| StyleError::UnknownToken(token.to_owned()))?;
                        options.min_fraction_digits = Some(min);
                        options.max_fraction_digits = Some(max);
                    } else {
                        return Err(StyleError::UnknownToken(token.to_owned()));
                    }
                }
            }
        }

        Ok(options)
    }
}

/// `00` → (2, 2), `0#` → (1, 2), `##` → (0, 2), `0+` → (1, max)
fn parse_fraction_precision(precision: &str) -> Option<(u8, u8)> {
    let (digits, open_ended) = match precision.strip_suffix('+') {
        Some(digits) => (digits, true),
        None => (precision, false),
    };

    let zeros = digits.bytes().take_while(|b| *b == b'0').count();
    let hashes = digits[zeros..].bytes().take_while(|b| *b == b'#').count();
    if zeros + hashes != digits.len() || (open_ended && hashes > 0) {
        return None;
    }
    if digits.is_empty() && !open_ended {
        return None;
    }

    let min = u8::try_from(zeros).ok()?.min(MAX_FRACTION_DIGITS);
    let max = if open_ended {
        MAX_FRACTION_DIGITS
    } else {
        u8::try_from(zeros + hashes).ok()?.min(MAX_FRACTION_DIGITS)
    };

    Some((min, max))
}

/// Width of a date or time field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldWidth {
    Numeric,
    TwoDigit,
    Short,
    Long,
    Narrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DateTimeOptions {
    pub weekday: Option<FieldWidth>,
    pub year: Option<FieldWidth>,
    pub month: Option<FieldWidth>,
    pub day: Option<FieldWidth>,
    pub hour: Option<FieldWidth>,
    pub minute: Option<FieldWidth>,
    pub second: Option<FieldWidth>,
    /// `None` uses the locale's clock convention
    pub hour12: Option<bool>,
}

impl DateTimeOptions {
    /// Used for `{d, date}` with no style
    pub fn default_date() -> Self {
        DateTimeOptions {
            year: Some(FieldWidth::Numeric),
            month: Some(FieldWidth::Numeric),
            day: Some(FieldWidth::Numeric),
            ..Default::default()
        }
    }

    /// Used for `{t, time}` with no style
    pub fn default_time() -> Self {
        Self::time_preset("medium").unwrap_or_default()
    }

    fn date_preset(name: &str) -> Option<Self> {
        let (weekday, year, month) = match name {
            "short" => (None, FieldWidth::TwoDigit, FieldWidth::Numeric),
            "medium" => (None, FieldWidth::Numeric, FieldWidth::Short),
            "long" => (None, FieldWidth::Numeric, FieldWidth::Long),
            "full" => (Some(FieldWidth::Long), FieldWidth::Numeric, FieldWidth::Long),
            _ => return None,
        };

        Some(DateTimeOptions {
            weekday,
            year: Some(year),
            month: Some(month),
            day: Some(FieldWidth::Numeric),
            ..Default::default()
        })
    }

    // long and full would add a time zone name; times here are zone-less
    fn time_preset(name: &str) -> Option<Self> {
        let second = match name {
            "short" => None,
            "medium" | "long" | "full" => Some(FieldWidth::TwoDigit),
            _ => return None,
        };

        Some(DateTimeOptions {
            hour: Some(FieldWidth::Numeric),
            minute: Some(FieldWidth::TwoDigit),
            second,
            ..Default::default()
        })
    }

    /// Parses the text after `{name, date,`
    pub fn from_date_style(style: &str) -> Result<Self, StyleError> {
        match style.strip_prefix("::") {
            Some(skeleton) => Self::from_skeleton(skeleton),
            None => Self::date_preset(style).ok_or_else(|| StyleError::UnknownPreset(style.to_owned())),
        }
    }

    /// Parses the text after `{name, time,`
    pub fn from_time_style(style: &str) -> Result<Self, StyleError> {
        match style.strip_prefix("::") {
            Some(skeleton) => Self::from_skeleton(skeleton),
            None => Self::time_preset(style).ok_or_else(|| StyleError::UnknownPreset(style.to_owned())),
        }
    }

    /// Parses an ICU date skeleton such as `yyyyMMdd` or `EEEEdMMMMy`
    pub fn from_skeleton(skeleton: &str) -> Result<Self, StyleError> {
        let skeleton = skeleton.trim();
        if skeleton.is_empty() {
            return Err(StyleError::Empty);
        }

        let mut options = DateTimeOptions::default();
        let mut chars = skeleton.chars().peekable();

        while let Some(field) = chars.next() {
            let mut len = 1;
            while chars.peek() == Some(&field) {
                chars.next();
                len += 1;
            }

            let numeric = if len == 2 {
                FieldWidth::TwoDigit
            } else {
                FieldWidth::Numeric
            };
            let text = match len {
                1..=3 => FieldWidth::Short,
                4 => FieldWidth::Long,
                _ => FieldWidth::Narrow,
            };

            match field {
                'y' | 'Y' | 'u' => options.year = Some(numeric),
                'M' | 'L' => {
                    options.month = Some(match len {
                        1 => FieldWidth::Numeric,
                        2 => FieldWidth::TwoDigit,
                        3 => FieldWidth::Short,
                        4 => FieldWidth::Long,
                        _ => FieldWidth::Narrow,
                    })
                }
                'd' => options.day = Some(numeric),
                'E' => options.weekday = Some(text),
                'c' | 'e' if len >= 3 => options.weekday = Some(text),
                'h' | 'K' => {
                    options.hour = Some(numeric);
                    options.hour12 = Some(true);
                }
                'H' | 'k' => {
                    options.hour = Some(numeric);
                    options.hour12 = Some(false);
                }
                'j' => options.hour = Some(numeric),
                'm' => options.minute = Some(numeric),
                's' => options.second = Some(numeric),
                // the day period follows from the hour field
                'a' => {}
                other => return Err(StyleError::UnsupportedField(other)),
            }
        }

        Ok(options)
    }

    pub fn has_date(&self) -> bool {
        self.weekday.is_some() || self.year.is_some() || self.month.is_some() || self.day.is_some()
    }

    pub fn has_time(&self) -> bool {
        self.hour.is_some() || self.minute.is_some() || self.second.is_some()
    }
}
