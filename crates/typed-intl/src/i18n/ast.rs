use super::options::{DateTimeOptions, NumberOptions};
use std::collections::BTreeMap;
use std::fmt;

/// A parsed message template
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(String),
    Argument {
        name: String,
        kind: ArgumentKind,
    },
    /// `#` inside a plural branch
    Pound,
    Plural {
        name: String,
        kind: PluralKind,
        offset: i64,
        branches: Vec<(PluralSelector, Vec<Node>)>,
    },
    Select {
        name: String,
        branches: Vec<(String, Vec<Node>)>,
    },
    Tag {
        name: String,
        children: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    Plain,
    Number(NumberOptions),
    Date(DateTimeOptions),
    Time(DateTimeOptions),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralKind {
    Cardinal,
    Ordinal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PluralSelector {
    Exact(f64),
    Category(PluralCategory),
}

/// CLDR plural categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "zero" => Some(PluralCategory::Zero),
            "one" => Some(PluralCategory::One),
            "two" => Some(PluralCategory::Two),
            "few" => Some(PluralCategory::Few),
            "many" => Some(PluralCategory::Many),
            "other" => Some(PluralCategory::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a message uses one of its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArgumentUse {
    Plain,
    Number,
    DateTime,
    Plural,
    Select,
    Tag,
}

impl Message {
    pub(crate) fn new(nodes: Vec<Node>) -> Self {
        Message { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The text of a message made only of literals. `None` if anything needs a value.
    pub fn literal_text(&self) -> Option<&str> {
        match self.nodes.as_slice() {
            [] => Some(""),
            [Node::Literal(text)] => Some(text),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        self.literal_text().is_some()
    }

    /// Every argument name the message reads, with how it is used
    pub fn arguments(&self) -> BTreeMap<&str, Vec<ArgumentUse>> {
        let mut out = BTreeMap::new();
        collect_arguments(&self.nodes, &mut out);
        out
    }
}

fn record<'a>(name: &'a str, usage: ArgumentUse, out: &mut BTreeMap<&'a str, Vec<ArgumentUse>>) {
    let uses = out.entry(name).or_default();
    if !uses.contains(&usage) {
        uses.push(usage);
    }
}

fn collect_arguments<'a>(nodes: &'a [Node], out: &mut BTreeMap<&'a str, Vec<ArgumentUse>>) {
    for node in nodes {
        match node {
            Node::Literal(_) | Node::Pound => {}
            Node::Argument { name, kind } => {
                let usage = match kind {
                    ArgumentKind::Plain => ArgumentUse::Plain,
                    ArgumentKind::Number(_) => ArgumentUse::Number,
                    ArgumentKind::Date(_) | ArgumentKind::Time(_) => ArgumentUse::DateTime,
                };
                record(name, usage, out);
            }
            Node::Plural { name, branches, .. } => {
                record(name, ArgumentUse::Plural, out);
                for (_, body) in branches {
                    collect_arguments(body, out);
                }
            }
            Node::Select { name, branches } => {
                record(name, ArgumentUse::Select, out);
                for (_, body) in branches {
                    collect_arguments(body, out);
                }
            }
            Node::Tag { name, children } => {
                record(name, ArgumentUse::Tag, out);
                collect_arguments(children, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_text_only_for_plain_messages() {
        assert_eq!(Message::new(vec![]).literal_text(), Some(""));
        assert_eq!(
            Message::new(vec![Node::Literal("hi".to_owned())]).literal_text(),
            Some("hi")
        );
        assert!(!Message::new(vec![Node::Argument {
            name: "n".to_owned(),
            kind: ArgumentKind::Plain
        }])
        .is_literal());
    }

    #[test]
    fn arguments_walk_nested_bodies() {
        let message = Message::new(vec![
            Node::Plural {
                name: "count".to_owned(),
                kind: PluralKind::Cardinal,
                offset: 0,
                branches: vec![(
                    PluralSelector::Category(PluralCategory::Other),
                    vec![Node::Tag {
                        name: "b".to_owned(),
                        children: vec![Node::Argument {
                            name: "who".to_owned(),
                            kind: ArgumentKind::Plain,
                        }],
                    }],
                )],
            },
            Node::Argument {
                name: "who".to_owned(),
                kind: ArgumentKind::Plain,
            },
        ]);

        let args = message.arguments();
        assert_eq!(args.keys().copied().collect::<Vec<_>>(), ["b", "count", "who"]);
        assert_eq!(args["who"], [ArgumentUse::Plain]);
        assert_eq!(args["b"], [ArgumentUse::Tag]);
    }

    #[test]
    fn category_keywords() {
        for keyword in ["zero", "one", "two", "few", "many", "other"] {
            let category = PluralCategory::from_keyword(keyword).unwrap();
            assert_eq!(category.as_str(), keyword);
        }
        assert_eq!(PluralCategory::from_keyword("several"), None);
    }
}
