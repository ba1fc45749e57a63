//! Walks a parsed [`Message`] and produces fragments for one locale.

use super::ast::{ArgumentKind, Message, Node, PluralCategory, PluralKind, PluralSelector};
use super::formatters::FormatterCache;
use super::locale::LocaleTag;
use super::options::{DateTimeOptions, NumberOptions};
use super::value::{Fragment, Value, ValueBag};
use super::IntlError;
use chrono::{DateTime, NaiveDateTime};

const FIRST_STRONG_ISOLATE: char = '\u{2068}';
const POP_DIRECTIONAL_ISOLATE: char = '\u{2069}';

/// Renders messages against one locale, one value bag and shared formatters
pub struct Renderer<'a> {
    locale: &'a LocaleTag,
    formatters: &'a FormatterCache,
    values: &'a ValueBag,
    use_isolating: bool,
}

impl<'a> Renderer<'a> {
    pub fn new(locale: &'a LocaleTag, formatters: &'a FormatterCache, values: &'a ValueBag) -> Self {
        Renderer {
            locale,
            formatters,
            values,
            use_isolating: false,
        }
    }

    /// Wraps each interpolated value in FSI/PDI marks
    pub fn isolating(mut self, use_isolating: bool) -> Self {
        self.use_isolating = use_isolating;
        self
    }

    pub fn render(&self, message: &Message) -> Result<Vec<Fragment>, IntlError> {
        let mut out = Vec::new();
        self.render_nodes(message.nodes(), None, &mut out)?;
        Ok(out)
    }

    pub fn render_to_string(&self, message: &Message) -> Result<String, IntlError> {
        Ok(self
            .render(message)?
            .iter()
            .map(|fragment| fragment.to_string())
            .collect())
    }

    fn render_nodes(
        &self,
        nodes: &[Node],
        pound: Option<f64>,
        out: &mut Vec<Fragment>,
    ) -> Result<(), IntlError> {
        for node in nodes {
            match node {
                Node::Literal(text) => push_text(out, text),
                Node::Argument { name, kind } => {
                    let text = self.format_argument(name, kind)?;
                    self.push_interpolated(out, &text);
                }
                Node::Pound => match pound {
                    Some(value) => {
                        let text = self
                            .formatters
                            .number_formatter(self.locale, &NumberOptions::default())?
                            .format(value);
                        self.push_interpolated(out, &text);
                    }
                    None => push_text(out, "#"),
                },
                Node::Plural {
                    name,
                    kind,
                    offset,
                    branches,
                } => {
                    let value = self.number(name, "number")?;
                    let adjusted = value - *offset as f64;
                    let body = self.select_plural(*kind, adjusted, branches)?;
                    self.render_nodes(body, Some(adjusted), out)?;
                }
                Node::Select { name, branches } => {
                    let key = match self.value(name)? {
                        Value::Str(key) => key.as_str(),
                        other => return Err(mismatch(name, "string", other)),
                    };
                    let body = branches
                        .iter()
                        .find(|(selector, _)| selector == key)
                        .or_else(|| branches.iter().find(|(selector, _)| selector == "other"))
                        .map(|(_, body)| body.as_slice())
                        .unwrap_or_default();
                    // `#` does not reach through a select
                    self.render_nodes(body, None, out)?;
                }
                Node::Tag { name, children } => {
                    let wrap = match self.value(name)? {
                        Value::Tag(wrap) => wrap,
                        other => return Err(mismatch(name, "tag function", other)),
                    };
                    let mut inner = Vec::new();
                    self.render_nodes(children, pound, &mut inner)?;
                    push_fragment(out, wrap(inner));
                }
            }
        }

        Ok(())
    }

    fn select_plural<'n>(
        &self,
        kind: PluralKind,
        adjusted: f64,
        branches: &'n [(PluralSelector, Vec<Node>)],
    ) -> Result<&'n [Node], IntlError> {
        let exact = branches.iter().find(|(selector, _)| {
            matches!(selector, PluralSelector::Exact(k) if *k == adjusted)
        });
        if let Some((_, body)) = exact {
            return Ok(body);
        }

        let category = self
            .formatters
            .plural_rules(self.locale, kind)?
            .select(adjusted);

        let body = branches
            .iter()
            .find(|(selector, _)| *selector == PluralSelector::Category(category))
            .or_else(|| {
                branches.iter().find(|(selector, _)| {
                    *selector == PluralSelector::Category(PluralCategory::Other)
                })
            })
            .map(|(_, body)| body.as_slice())
            .unwrap_or_default();

        Ok(body)
    }

    fn format_argument(&self, name: &str, kind: &ArgumentKind) -> Result<String, IntlError> {
        match kind {
            ArgumentKind::Plain => match self.value(name)? {
                Value::Str(text) => Ok(text.clone()),
                Value::Number(n) => Ok(plain_number(*n)),
                Value::Date(date) => Ok(date.to_string()),
                other => Err(mismatch(name, "string, number or date", other)),
            },
            ArgumentKind::Number(options) => {
                let value = self.number(name, "number")?;
                Ok(self
                    .formatters
                    .number_formatter(self.locale, options)?
                    .format(value))
            }
            ArgumentKind::Date(options) | ArgumentKind::Time(options) => {
                let date = self.date(name)?;
                self.format_date(options, &date)
            }
        }
    }

    fn format_date(
        &self,
        options: &DateTimeOptions,
        date: &NaiveDateTime,
    ) -> Result<String, IntlError> {
        Ok(self
            .formatters
            .date_time_formatter(self.locale, options)?
            .format(date))
    }

    fn value(&self, name: &str) -> Result<&'a Value, IntlError> {
        self.values
            .get(name)
            .ok_or_else(|| IntlError::MissingArgument(name.to_owned()))
    }

    fn number(&self, name: &str, expected: &'static str) -> Result<f64, IntlError> {
        match self.value(name)? {
            Value::Number(n) => Ok(*n),
            other => Err(mismatch(name, expected, other)),
        }
    }

    /// Dates, or numbers read as epoch milliseconds in UTC
    fn date(&self, name: &str) -> Result<NaiveDateTime, IntlError> {
        match self.value(name)? {
            Value::Date(date) => Ok(*date),
            Value::Number(millis) if millis.is_finite() => {
                DateTime::from_timestamp_millis(*millis as i64)
                    .map(|dt| dt.naive_utc())
                    .ok_or_else(|| IntlError::TypeMismatch {
                        name: name.to_owned(),
                        expected: "date",
                        found: "out of range number",
                    })
            }
            other => Err(mismatch(name, "date", other)),
        }
    }

    fn push_interpolated(&self, out: &mut Vec<Fragment>, text: &str) {
        if self.use_isolating {
            push_text(out, &format!("{FIRST_STRONG_ISOLATE}{text}{POP_DIRECTIONAL_ISOLATE}"));
        } else {
            push_text(out, text);
        }
    }
}

fn mismatch(name: &str, expected: &'static str, found: &Value) -> IntlError {
    IntlError::TypeMismatch {
        name: name.to_owned(),
        expected,
        found: found.type_name(),
    }
}

fn push_text(out: &mut Vec<Fragment>, text: &str) {
    if text.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(Fragment::Text(last)) => last.push_str(text),
        _ => out.push(Fragment::Text(text.to_owned())),
    }
}

fn push_fragment(out: &mut Vec<Fragment>, fragment: Fragment) {
    match fragment {
        Fragment::Text(text) => push_text(out, &text),
        element => out.push(element),
    }
}

/// Locale-independent number text for plain `{name}` arguments
fn plain_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_owned()
    } else if n == 0.0 {
        "0".to_owned()
    } else {
        n.to_string()
    }
}
