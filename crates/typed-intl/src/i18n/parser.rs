//! Recursive-descent parser for the ICU MessageFormat subset.
//!
//! ```text
//! message   := (text | '#' | argument | tag)*
//! argument  := '{' name (',' type (',' style)?)? '}'
//!            | '{' name ',' ('plural' | 'selectordinal') ',' ('offset:' int)? branch+ '}'
//!            | '{' name ',' 'select' ',' branch+ '}'
//! branch    := selector '{' message '}'
//! tag       := '<' tag-name '>' message '</' tag-name '>'
//! ```
//!
//! `#` is only special directly inside plural branches (tags pass it
//! through, nested selects do not). Apostrophes quote syntax characters the
//! way ICU does: `''` is a literal apostrophe and `'{…'` is literal text.

use super::ast::{ArgumentKind, Message, Node, PluralCategory, PluralKind, PluralSelector};
use super::options::{DateTimeOptions, NumberOptions, StyleError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at offset {offset}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Byte offset into the template
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unmatched '}}'")]
    UnmatchedBrace,

    #[error("unclosed '{{'")]
    UnclosedBrace,

    #[error("empty argument name")]
    EmptyArgument,

    #[error("malformed argument")]
    InvalidArgument,

    #[error("unknown argument type '{0}'")]
    UnknownArgumentType(String),

    #[error("invalid style: {0}")]
    Style(StyleError),

    #[error("expected '{{' to open a branch")]
    ExpectedBranch,

    #[error("missing 'other' branch")]
    MissingOther,

    #[error("duplicate selector '{0}'")]
    DuplicateSelector(String),

    #[error("invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("unknown plural category '{0}'")]
    UnknownPluralCategory(String),

    #[error("invalid plural offset")]
    InvalidOffset,

    #[error("malformed tag")]
    InvalidTag,

    #[error("unclosed tag <{0}>")]
    UnclosedTag(String),

    #[error("closing tag </{found}> does not match <{expected}>")]
    MismatchedTag { expected: String, found: String },

    #[error("unexpected closing tag </{0}>")]
    UnexpectedClosingTag(String),
}

/// Parses a message template
pub fn parse(template: &str) -> Result<Message, ParseError> {
    let mut parser = Parser {
        src: template,
        pos: 0,
    };
    let nodes = parser.parse_nodes(0, false, None)?;
    Ok(Message::new(nodes))
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

enum Parsed {
    Node(Node),
    Text(String),
}

struct Branch {
    selector: String,
    offset: usize,
    body: Vec<Node>,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '$')
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(kind, self.pos)
    }

    fn error_at(&self, kind: ParseErrorKind, offset: usize) -> ParseError {
        ParseError { kind, offset }
    }

    /// An end-of-input error inside braces, anything else as `kind`
    fn unexpected(&self, kind: ParseErrorKind) -> ParseError {
        if self.peek().is_none() {
            self.error(ParseErrorKind::UnclosedBrace)
        } else {
            self.error(kind)
        }
    }

    fn parse_nodes(
        &mut self,
        depth: usize,
        in_plural: bool,
        open_tag: Option<&str>,
    ) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        fn flush(text: &mut String, nodes: &mut Vec<Node>) {
            if !text.is_empty() {
                nodes.push(Node::Literal(std::mem::take(text)));
            }
        }

        loop {
            let Some(c) = self.peek() else {
                if let Some(tag) = open_tag {
                    return Err(self.error(ParseErrorKind::UnclosedTag(tag.to_owned())));
                }
                if depth > 0 {
                    return Err(self.error(ParseErrorKind::UnclosedBrace));
                }
                break;
            };

            match c {
                '{' => {
                    flush(&mut text, &mut nodes);
                    let node = self.parse_argument(depth)?;
                    nodes.push(node);
                }
                '}' => {
                    if depth == 0 {
                        return Err(self.error(ParseErrorKind::UnmatchedBrace));
                    }
                    if let Some(tag) = open_tag {
                        return Err(self.error(ParseErrorKind::UnclosedTag(tag.to_owned())));
                    }
                    // the enclosing branch consumes the brace
                    break;
                }
                '#' if in_plural => {
                    flush(&mut text, &mut nodes);
                    self.bump();
                    nodes.push(Node::Pound);
                }
                '<' => match self.peek_second() {
                    Some('/') => {
                        if open_tag.is_some() {
                            break;
                        }
                        let name: String = self.src[self.pos + 2..]
                            .chars()
                            .take_while(|c| is_tag_char(*c))
                            .collect();
                        if !name.is_empty() {
                            return Err(self.error(ParseErrorKind::UnexpectedClosingTag(name)));
                        }
                        self.bump();
                        text.push('<');
                    }
                    Some(next) if next.is_ascii_alphabetic() => match self.parse_tag(depth, in_plural)? {
                        Parsed::Node(node) => {
                            flush(&mut text, &mut nodes);
                            nodes.push(node);
                        }
                        Parsed::Text(literal) => text.push_str(&literal),
                    },
                    _ => {
                        self.bump();
                        text.push('<');
                    }
                },
                '\'' => self.parse_apostrophe(&mut text, in_plural),
                _ => {
                    self.bump();
                    text.push(c);
                }
            }
        }

        flush(&mut text, &mut nodes);
        Ok(nodes)
    }

    fn parse_apostrophe(&mut self, text: &mut String, in_plural: bool) {
        let next = self.peek_second();
        let starts_quote =
            matches!(next, Some('{' | '}' | '<' | '>')) || (in_plural && next == Some('#'));

        // opening apostrophe
        self.bump();

        if next == Some('\'') {
            self.bump();
            text.push('\'');
            return;
        }

        if !starts_quote {
            text.push('\'');
            return;
        }

        // an unterminated quote runs to the end of the message
        while let Some(c) = self.bump() {
            if c == '\'' {
                if self.eat('\'') {
                    text.push('\'');
                } else {
                    break;
                }
            } else {
                text.push(c);
            }
        }
    }

    fn parse_argument(&mut self, depth: usize) -> Result<Node, ParseError> {
        // '{'
        self.bump();
        self.skip_ws();

        let name_start = self.pos;
        let name = self.take_while(is_name_char).to_owned();
        if name.is_empty() {
            return Err(self.unexpected(ParseErrorKind::EmptyArgument));
        }
        self.skip_ws();

        if self.eat('}') {
            return Ok(Node::Argument {
                name,
                kind: ArgumentKind::Plain,
            });
        }
        if !self.eat(',') {
            return Err(self.unexpected(ParseErrorKind::InvalidArgument));
        }
        self.skip_ws();

        let keyword_start = self.pos;
        let keyword = self.take_while(|c| c.is_ascii_alphabetic());
        self.skip_ws();

        match keyword {
            "number" | "date" | "time" => {
                let style = if self.eat('}') {
                    None
                } else if self.eat(',') {
                    Some(self.parse_style()?)
                } else {
                    return Err(self.unexpected(ParseErrorKind::InvalidArgument));
                };

                let kind = match style {
                    None => match keyword {
                        "number" => ArgumentKind::Number(NumberOptions::default()),
                        "date" => ArgumentKind::Date(DateTimeOptions::default_date()),
                        _ => ArgumentKind::Time(DateTimeOptions::default_time()),
                    },
                    Some((style, offset)) => {
                        let parsed = match keyword {
                            "number" => NumberOptions::from_style(style).map(ArgumentKind::Number),
                            "date" => DateTimeOptions::from_date_style(style).map(ArgumentKind::Date),
                            _ => DateTimeOptions::from_time_style(style).map(ArgumentKind::Time),
                        };
                        parsed.map_err(|err| self.error_at(ParseErrorKind::Style(err), offset))?
                    }
                };

                Ok(Node::Argument { name, kind })
            }
            "plural" | "selectordinal" => {
                if !self.eat(',') {
                    return Err(self.unexpected(ParseErrorKind::InvalidArgument));
                }
                let kind = if keyword == "plural" {
                    PluralKind::Cardinal
                } else {
                    PluralKind::Ordinal
                };
                self.parse_plural(name, kind, depth, name_start)
            }
            "select" => {
                if !self.eat(',') {
                    return Err(self.unexpected(ParseErrorKind::InvalidArgument));
                }
                self.parse_select(name, depth, name_start)
            }
            "" => Err(self.unexpected(ParseErrorKind::InvalidArgument)),
            other => Err(self.error_at(
                ParseErrorKind::UnknownArgumentType(other.to_owned()),
                keyword_start,
            )),
        }
    }

    /// Style text up to and including the closing brace
    fn parse_style(&mut self) -> Result<(&'a str, usize), ParseError> {
        self.skip_ws();
        let start = self.pos;
        let style = self.take_while(|c| c != '}' && c != '{');
        if !self.eat('}') {
            return Err(self.unexpected(ParseErrorKind::InvalidArgument));
        }
        Ok((style.trim_end(), start))
    }

    fn parse_plural(
        &mut self,
        name: String,
        kind: PluralKind,
        depth: usize,
        start: usize,
    ) -> Result<Node, ParseError> {
        self.skip_ws();

        let mut offset = 0;
        if self.rest().starts_with("offset:") {
            self.pos += "offset:".len();
            self.skip_ws();
            let digits_start = self.pos;
            let negative = self.eat('-');
            let digits = self.take_while(|c| c.is_ascii_digit());
            offset = digits
                .parse::<i64>()
                .map(|value| if negative { -value } else { value })
                .map_err(|_| self.error_at(ParseErrorKind::InvalidOffset, digits_start))?;
        }

        let mut branches = Vec::new();
        for branch in self.parse_branches(depth, true, start)? {
            let selector = match branch.selector.strip_prefix('=') {
                Some(number) => number
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .map(PluralSelector::Exact)
                    .ok_or_else(|| {
                        self.error_at(
                            ParseErrorKind::InvalidSelector(branch.selector.clone()),
                            branch.offset,
                        )
                    })?,
                None => PluralCategory::from_keyword(&branch.selector)
                    .map(PluralSelector::Category)
                    .ok_or_else(|| {
                        self.error_at(
                            ParseErrorKind::UnknownPluralCategory(branch.selector.clone()),
                            branch.offset,
                        )
                    })?,
            };
            branches.push((selector, branch.body));
        }

        Ok(Node::Plural {
            name,
            kind,
            offset,
            branches,
        })
    }

    fn parse_select(&mut self, name: String, depth: usize, start: usize) -> Result<Node, ParseError> {
        let branches = self
            .parse_branches(depth, false, start)?
            .into_iter()
            .map(|branch| (branch.selector, branch.body))
            .collect();

        Ok(Node::Select { name, branches })
    }

    /// Parses `selector {body}` pairs through the argument's closing brace
    fn parse_branches(
        &mut self,
        depth: usize,
        in_plural: bool,
        start: usize,
    ) -> Result<Vec<Branch>, ParseError> {
        let mut branches: Vec<Branch> = Vec::new();

        loop {
            self.skip_ws();
            if self.eat('}') {
                break;
            }
            if self.peek().is_none() {
                return Err(self.error(ParseErrorKind::UnclosedBrace));
            }

            let offset = self.pos;
            let selector = self
                .take_while(|c| !c.is_whitespace() && c != '{' && c != '}')
                .to_owned();
            if selector.is_empty() {
                return Err(self.error(ParseErrorKind::InvalidSelector(selector)));
            }

            self.skip_ws();
            if !self.eat('{') {
                return Err(self.unexpected(ParseErrorKind::ExpectedBranch));
            }

            let body = self.parse_nodes(depth + 1, in_plural, None)?;
            if !self.eat('}') {
                return Err(self.error(ParseErrorKind::UnclosedBrace));
            }

            if branches.iter().any(|branch| branch.selector == selector) {
                return Err(self.error_at(ParseErrorKind::DuplicateSelector(selector), offset));
            }

            branches.push(Branch {
                selector,
                offset,
                body,
            });
        }

        if !branches.iter().any(|branch| branch.selector == "other") {
            return Err(self.error_at(ParseErrorKind::MissingOther, start));
        }

        Ok(branches)
    }

    fn parse_tag(&mut self, depth: usize, in_plural: bool) -> Result<Parsed, ParseError> {
        let start = self.pos;
        // '<'
        self.bump();
        let name = self.take_while(is_tag_char).to_owned();

        if self.rest().starts_with("/>") {
            self.pos += 2;
            return Ok(Parsed::Text(self.src[start..self.pos].to_owned()));
        }
        if !self.eat('>') {
            return Err(self.error_at(ParseErrorKind::InvalidTag, start));
        }

        let children = self.parse_nodes(depth, in_plural, Some(name.as_str()))?;

        // parse_nodes stops on the "</" of our closing tag
        let close_start = self.pos;
        self.pos += 2;
        let found = self.take_while(is_tag_char).to_owned();
        if !self.eat('>') {
            return Err(self.error_at(ParseErrorKind::InvalidTag, close_start));
        }
        if found != name {
            return Err(self.error_at(
                ParseErrorKind::MismatchedTag {
                    expected: name,
                    found,
                },
                close_start,
            ));
        }

        Ok(Parsed::Node(Node::Tag { name, children }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::options::{FieldWidth, NumberStyle};

    fn lit(text: &str) -> Node {
        Node::Literal(text.to_owned())
    }

    fn arg(name: &str) -> Node {
        Node::Argument {
            name: name.to_owned(),
            kind: ArgumentKind::Plain,
        }
    }

    fn kind_of(template: &str) -> ParseErrorKind {
        parse(template).unwrap_err().kind
    }

    #[test]
    fn plain_text_is_one_literal() {
        let message = parse("Hello, world!").unwrap();
        assert_eq!(message.nodes(), [lit("Hello, world!")]);
        assert!(parse("").unwrap().nodes().is_empty());
    }

    #[test]
    fn simple_argument() {
        let message = parse("Hello {name}!").unwrap();
        assert_eq!(message.nodes(), [lit("Hello "), arg("name"), lit("!")]);
        assert_eq!(parse("{ name }").unwrap().nodes(), [arg("name")]);
    }

    #[test]
    fn typed_arguments() {
        let message = parse("{price, number, ::currency/EUR} on {when, date, ::yyyyMMdd}").unwrap();
        match &message.nodes()[0] {
            Node::Argument {
                kind: ArgumentKind::Number(options),
                ..
            } => assert_eq!(options.style, NumberStyle::Currency("EUR".to_owned())),
            other => panic!("unexpected node {other:?}"),
        }
        match &message.nodes()[2] {
            Node::Argument {
                kind: ArgumentKind::Date(options),
                ..
            } => assert_eq!(options.month, Some(FieldWidth::TwoDigit)),
            other => panic!("unexpected node {other:?}"),
        }

        let message = parse("{count, number}").unwrap();
        assert_eq!(
            message.nodes(),
            [Node::Argument {
                name: "count".to_owned(),
                kind: ArgumentKind::Number(NumberOptions::default())
            }]
        );
    }

    #[test]
    fn plural_with_nested_arguments() {
        let message =
            parse("{n, plural, offset:1 =0 {none} one {{who} and # other} other {{who} and # others}}")
                .unwrap();

        let Node::Plural {
            name,
            kind,
            offset,
            branches,
        } = &message.nodes()[0]
        else {
            panic!("expected plural");
        };
        assert_eq!(name, "n");
        assert_eq!(*kind, PluralKind::Cardinal);
        assert_eq!(*offset, 1);
        assert_eq!(branches.len(), 3);
        assert_eq!(branches[0].0, PluralSelector::Exact(0.0));
        assert_eq!(branches[1].0, PluralSelector::Category(PluralCategory::One));
        assert_eq!(
            branches[2].1,
            [arg("who"), lit(" and "), Node::Pound, lit(" others")]
        );
    }

    #[test]
    fn multiline_plural() {
        let message = parse(
            "You have {numMessages, plural,
      =0 {no messages}
      =1 {one message}
      other {# messages}} as of <b>{now, date, ::yyyyMMdd}</b>.",
        )
        .unwrap();
        assert_eq!(message.nodes().len(), 5);
        assert!(matches!(message.nodes()[3], Node::Tag { .. }));
    }

    #[test]
    fn selectordinal() {
        let message = parse("{n, selectordinal, one {#st} two {#nd} few {#rd} other {#th}}").unwrap();
        assert!(matches!(
            message.nodes()[0],
            Node::Plural {
                kind: PluralKind::Ordinal,
                ..
            }
        ));
    }

    #[test]
    fn select_branches() {
        let message = parse("{g, select, male {He} female {She} other {They}} liked it.").unwrap();
        let Node::Select { name, branches } = &message.nodes()[0] else {
            panic!("expected select");
        };
        assert_eq!(name, "g");
        let keys: Vec<_> = branches.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["male", "female", "other"]);
        assert_eq!(message.nodes()[1], lit(" liked it."));
    }

    #[test]
    fn pound_only_inside_plural() {
        assert_eq!(parse("#1 {n}").unwrap().nodes(), [lit("#1 "), arg("n")]);

        let message = parse("{n, plural, other {{g, select, other {#}}}}").unwrap();
        let Node::Plural { branches, .. } = &message.nodes()[0] else {
            panic!("expected plural");
        };
        let Node::Select { branches, .. } = &branches[0].1[0] else {
            panic!("expected select");
        };
        assert_eq!(branches[0].1, [lit("#")]);
    }

    #[test]
    fn tags_nest() {
        let message = parse("<b>{n} messages</b> and <i>x<u>y</u></i>").unwrap();
        assert_eq!(
            message.nodes()[0],
            Node::Tag {
                name: "b".to_owned(),
                children: vec![arg("n"), lit(" messages")],
            }
        );
        assert_eq!(
            message.nodes()[2],
            Node::Tag {
                name: "i".to_owned(),
                children: vec![
                    lit("x"),
                    Node::Tag {
                        name: "u".to_owned(),
                        children: vec![lit("y")]
                    }
                ],
            }
        );
    }

    #[test]
    fn non_tag_angle_brackets_are_text() {
        assert_eq!(parse("a < b <br/> c").unwrap().nodes(), [lit("a < b <br/> c")]);
        assert_eq!(parse("1 </ 2").unwrap().nodes(), [lit("1 </ 2")]);
    }

    #[test]
    fn apostrophe_quoting() {
        assert_eq!(parse("It''s").unwrap().nodes(), [lit("It's")]);
        assert_eq!(parse("don't").unwrap().nodes(), [lit("don't")]);
        assert_eq!(parse("'{name}' is literal").unwrap().nodes(), [lit("{name} is literal")]);
        assert_eq!(parse("'<b>' tag").unwrap().nodes(), [lit("<b> tag")]);
        assert_eq!(
            parse("{n, plural, other {'#' is #}}").unwrap().nodes(),
            [Node::Plural {
                name: "n".to_owned(),
                kind: PluralKind::Cardinal,
                offset: 0,
                branches: vec![(
                    PluralSelector::Category(PluralCategory::Other),
                    vec![lit("# is "), Node::Pound]
                )],
            }]
        );
    }

    #[test]
    fn brace_errors() {
        assert_eq!(kind_of("Hello {name"), ParseErrorKind::UnclosedBrace);
        assert_eq!(kind_of("Hello name}"), ParseErrorKind::UnmatchedBrace);
        assert_eq!(kind_of("{n, plural, other {x}"), ParseErrorKind::UnclosedBrace);
        assert_eq!(kind_of("{n, plural, other {x"), ParseErrorKind::UnclosedBrace);
        assert_eq!(kind_of("{}"), ParseErrorKind::EmptyArgument);
        assert_eq!(kind_of("{a b}"), ParseErrorKind::InvalidArgument);
    }

    #[test]
    fn missing_other_is_rejected() {
        assert_eq!(
            kind_of("{n, plural, =0 {none} one {one}}"),
            ParseErrorKind::MissingOther
        );
        assert_eq!(kind_of("{g, select, male {He}}"), ParseErrorKind::MissingOther);
    }

    #[test]
    fn unknown_argument_type() {
        let err = parse("Hi {n, money}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownArgumentType("money".to_owned()));
        assert_eq!(err.offset, 7);
    }

    #[test]
    fn selector_errors() {
        assert_eq!(
            kind_of("{n, plural, several {x} other {y}}"),
            ParseErrorKind::UnknownPluralCategory("several".to_owned())
        );
        assert_eq!(
            kind_of("{n, plural, =x {x} other {y}}"),
            ParseErrorKind::InvalidSelector("=x".to_owned())
        );
        assert_eq!(
            kind_of("{g, select, a {x} a {y} other {z}}"),
            ParseErrorKind::DuplicateSelector("a".to_owned())
        );
        assert_eq!(kind_of("{g, select, a x}"), ParseErrorKind::ExpectedBranch);
        assert_eq!(kind_of("{n, plural, offset:x other {y}}"), ParseErrorKind::InvalidOffset);
    }

    #[test]
    fn style_errors() {
        assert!(matches!(
            kind_of("{n, number, ::currency/euro}"),
            ParseErrorKind::Style(StyleError::InvalidCurrency(_))
        ));
        assert!(matches!(
            kind_of("{d, date, sometime}"),
            ParseErrorKind::Style(StyleError::UnknownPreset(_))
        ));
    }

    #[test]
    fn tag_errors() {
        assert_eq!(kind_of("<b>bold"), ParseErrorKind::UnclosedTag("b".to_owned()));
        assert_eq!(
            kind_of("<b>bold</i>"),
            ParseErrorKind::MismatchedTag {
                expected: "b".to_owned(),
                found: "i".to_owned()
            }
        );
        assert_eq!(kind_of("bold</b>"), ParseErrorKind::UnexpectedClosingTag("b".to_owned()));
        assert_eq!(kind_of("a<b c"), ParseErrorKind::InvalidTag);
        assert_eq!(
            kind_of("{n, plural, other {<b>x}}</b>"),
            ParseErrorKind::UnclosedTag("b".to_owned())
        );
    }

    #[test]
    fn parsing_is_deterministic() {
        let template = "{n, plural, =0 {no items} =1 {one item} other {# items}}";
        assert_eq!(parse(template).unwrap(), parse(template).unwrap());
    }
}
