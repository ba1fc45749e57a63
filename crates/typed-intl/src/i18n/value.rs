//! Runtime argument values and rich render output.

use chrono::{DateTime, NaiveDateTime, TimeZone};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Wraps the rendered children of a tag into a single fragment
pub type TagFn = Arc<dyn Fn(Vec<Fragment>) -> Fragment + Send + Sync>;

/// A value bound to a message argument
#[derive(Clone)]
pub enum Value {
    Str(String),
    Number(f64),
    /// A wall-clock date and time with no zone attached
    Date(NaiveDateTime),
    Tag(TagFn),
}

impl Value {
    /// Kind name used in type mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Number(_) => "number",
            Value::Date(_) => "date",
            Value::Tag(_) => "tag function",
        }
    }

    /// Milliseconds since the Unix epoch, read as UTC
    pub fn from_epoch_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(|dt| Value::Date(dt.naive_utc()))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Value::Tag(_) => f.write_str("Tag(..)"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Str(value.clone())
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(value as f64)
                }
            }
        )*
    };
}

number_from!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Date(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(value: DateTime<Tz>) -> Self {
        Value::Date(value.naive_utc())
    }
}

/// Named argument values for one render
#[derive(Debug, Clone, Default)]
pub struct ValueBag {
    values: HashMap<String, Value>,
}

impl ValueBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Binds a tag function for `<name>...</name>`
    pub fn tag<F>(mut self, name: impl Into<String>, wrap: F) -> Self
    where
        F: Fn(Vec<Fragment>) -> Fragment + Send + Sync + 'static,
    {
        self.values.insert(name.into(), Value::Tag(Arc::new(wrap)));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = ValueBag::new();
        for (name, value) in iter {
            bag.insert(name, value);
        }
        bag
    }
}

/// A piece of rich render output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Element {
        name: String,
        children: Vec<Fragment>,
    },
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Fragment::Text(text.into())
    }

    pub fn element(name: impl Into<String>, children: Vec<Fragment>) -> Self {
        Fragment::Element {
            name: name.into(),
            children,
        }
    }

    /// Concatenated text with all markup dropped
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Fragment::Text(text) => out.push_str(text),
            Fragment::Element { children, .. } => {
                for child in children {
                    child.push_text(out);
                }
            }
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Text(text) => f.write_str(text),
            Fragment::Element { name, children } => {
                write!(f, "<{name}>")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                write!(f, "</{name}>")
            }
        }
    }
}
