//! Currency metadata and the percent/currency affixes wrapped around
//! formatted digits.
//!
//! Digits, separators, grouping and the minus sign come from ICU; this
//! module only places the `%` or currency symbol around them.

use super::locale::LocaleTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyPlacement {
    /// `€100.00`
    Prefix,
    /// `€ 100,00`
    PrefixSpaced,
    /// `100,00 €`
    Suffix,
}

pub fn currency_placement(locale: &LocaleTag) -> CurrencyPlacement {
    match (locale.language(), locale.region()) {
        ("pt", Some("PT")) => CurrencyPlacement::Suffix,
        ("nl" | "pt", _) => CurrencyPlacement::PrefixSpaced,
        (
            "fr" | "de" | "es" | "it" | "ru" | "uk" | "pl" | "cs" | "sk" | "sv" | "nb" | "no"
            | "da" | "fi",
            _,
        ) => CurrencyPlacement::Suffix,
        _ => CurrencyPlacement::Prefix,
    }
}

pub fn percent_suffix(locale: &LocaleTag) -> &'static str {
    match locale.language() {
        "fr" => "\u{202f}%",
        "de" | "es" | "ru" | "uk" | "cs" | "sk" | "sv" | "nb" | "no" | "da" | "fi" => "\u{a0}%",
        _ => "%",
    }
}

/// Minor-unit digits for an ISO 4217 currency
pub fn currency_digits(code: &str) -> u8 {
    match code {
        "JPY" | "KRW" | "CLP" | "VND" | "ISK" | "UGX" | "PYG" => 0,
        "BHD" | "KWD" | "OMR" | "JOD" | "TND" | "IQD" | "LYD" => 3,
        _ => 2,
    }
}

/// Display symbol for `code` in `locale`. The flag is set when the symbol is
/// a bare code that must be separated from the digits.
pub fn currency_symbol(code: &str, locale: &LocaleTag) -> (String, bool) {
    let region = locale.region();
    let language = locale.language();

    // dollar-style currencies show a bare `$` only at home
    let dollar = |home: &str, alternate: &'static str| {
        let at_home = region == Some(home) || (home == "US" && region.is_none() && language == "en");
        if at_home {
            "$"
        } else {
            alternate
        }
    };

    let symbol = match code {
        "EUR" => "€",
        "GBP" => "£",
        "INR" => "₹",
        "KRW" => "₩",
        "ILS" => "₪",
        "BRL" => "R$",
        "JPY" if language == "ja" => "￥",
        "JPY" => "¥",
        "CNY" if language == "zh" => "¥",
        "CNY" => "CN¥",
        "USD" => dollar("US", "US$"),
        "NZD" => dollar("NZ", "NZ$"),
        "AUD" => dollar("AU", "A$"),
        "CAD" => dollar("CA", "CA$"),
        "HKD" => dollar("HK", "HK$"),
        "MXN" => dollar("MX", "MX$"),
        "RUB" if language == "ru" => "₽",
        "PLN" if language == "pl" => "zł",
        "SEK" if language == "sv" => "kr",
        "NOK" if language == "nb" || language == "no" => "kr",
        other => return (other.to_owned(), true),
    };

    (symbol.to_owned(), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> LocaleTag {
        LocaleTag::parse(s).unwrap()
    }

    #[test]
    fn dollars_are_bare_only_at_home() {
        assert_eq!(currency_symbol("USD", &tag("en-US")), ("$".to_owned(), false));
        assert_eq!(currency_symbol("USD", &tag("en")), ("$".to_owned(), false));
        assert_eq!(currency_symbol("USD", &tag("en-NZ")), ("US$".to_owned(), false));
        assert_eq!(currency_symbol("NZD", &tag("en-NZ")), ("$".to_owned(), false));
    }

    #[test]
    fn unknown_codes_are_spaced() {
        assert_eq!(currency_symbol("CHF", &tag("en-US")), ("CHF".to_owned(), true));
    }

    #[test]
    fn placement_by_language() {
        assert_eq!(currency_placement(&tag("en-NZ")), CurrencyPlacement::Prefix);
        assert_eq!(currency_placement(&tag("fr")), CurrencyPlacement::Suffix);
        assert_eq!(currency_placement(&tag("pt-BR")), CurrencyPlacement::PrefixSpaced);
        assert_eq!(currency_placement(&tag("pt-PT")), CurrencyPlacement::Suffix);
        assert_eq!(percent_suffix(&tag("en")), "%");
        assert_eq!(percent_suffix(&tag("de")), "\u{a0}%");
    }

    #[test]
    fn minor_units() {
        assert_eq!(currency_digits("JPY"), 0);
        assert_eq!(currency_digits("KWD"), 3);
        assert_eq!(currency_digits("EUR"), 2);
    }
}
