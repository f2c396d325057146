//! Message templates.
//!
//! A template is text with named holes: `"User {Name} logged in from {@Origin}"`.
//! Positional arguments bind to holes in order of first appearance, or by
//! number when every hole is numeric (`"{0} of {1}"`). `{{` and `}}` are
//! literal braces. Text that does not form a valid hole is kept verbatim.
//!
//! Hole syntax: `{` [`@` | `$`] name [`,` alignment] [`:` format] `}`. The `@`
//! prefix requests destructuring of nested objects.

use crate::{enricher::EventProperty, masking::names_match, value::PropertyValue};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Text(String),
    Hole(Hole),
}

/// One hole of a parsed template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hole {
    /// Property name.
    pub name: String,
    /// `@` prefix.
    pub destructure: bool,
    /// Format after `:`, if any.
    pub format: Option<String>,
    raw: String,
}

impl Hole {
    fn parse(raw: &str) -> Option<Self> {
        let inner = raw.strip_prefix('{')?.strip_suffix('}')?;
        let (destructure, rest) = match inner.as_bytes().first() {
            Some(b'@') => (true, &inner[1..]),
            Some(b'$') => (false, &inner[1..]),
            _ => (false, inner),
        };
        let (rest, format) = match rest.split_once(':') {
            Some((head, format)) => (head, Some(format.to_string())),
            None => (rest, None),
        };
        let name = match rest.split_once(',') {
            Some((name, alignment)) => {
                let alignment = alignment.strip_prefix('-').unwrap_or(alignment);
                if alignment.is_empty() || !alignment.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                name
            }
            None => rest,
        };
        if name.is_empty() || !name.chars().all(|ch| ch.is_alphanumeric() || ch == '_') {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            destructure,
            format,
            raw: raw.to_string(),
        })
    }

    fn position(&self) -> Option<usize> {
        self.name.parse().ok()
    }
}

/// A parsed message template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageTemplate {
    text: String,
    tokens: Vec<Token>,
}

impl MessageTemplate {
    /// Parses `text`. Parsing never fails.
    pub fn parse(text: &str) -> Self {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(ch) = rest.chars().next() {
            match ch {
                '{' if rest.starts_with("{{") => {
                    literal.push('{');
                    rest = &rest[2..];
                }
                '}' if rest.starts_with("}}") => {
                    literal.push('}');
                    rest = &rest[2..];
                }
                '{' => {
                    let hole = rest
                        .find('}')
                        .filter(|end| !rest[1..*end].contains('{'))
                        .and_then(|end| Hole::parse(&rest[..=end]).map(|hole| (hole, end)));
                    match hole {
                        Some((hole, end)) => {
                            if !literal.is_empty() {
                                tokens.push(Token::Text(std::mem::take(&mut literal)));
                            }
                            tokens.push(Token::Hole(hole));
                            rest = &rest[end + 1..];
                        }
                        None => {
                            literal.push('{');
                            rest = &rest[1..];
                        }
                    }
                }
                _ => {
                    literal.push(ch);
                    rest = &rest[ch.len_utf8()..];
                }
            }
        }
        if !literal.is_empty() {
            tokens.push(Token::Text(literal));
        }

        Self {
            text: text.to_string(),
            tokens,
        }
    }

    /// Source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Holes in order of appearance.
    pub fn holes(&self) -> impl Iterator<Item = &Hole> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Hole(hole) => Some(hole),
            Token::Text(_) => None,
        })
    }

    fn is_positional(&self) -> bool {
        let mut holes = self.holes().peekable();
        holes.peek().is_some() && holes.all(|hole| hole.position().is_some())
    }

    /// Pairs `args` with hole names.
    ///
    /// Each distinct name is bound once. Arguments without a hole are dropped;
    /// holes without an argument stay unbound.
    pub fn bind(&self, args: &[PropertyValue]) -> Vec<(Hole, PropertyValue)> {
        let mut bound: Vec<(Hole, PropertyValue)> = Vec::new();
        let positional = self.is_positional();
        let mut next = 0;

        for hole in self.holes() {
            if bound.iter().any(|(seen, _)| seen.name == hole.name) {
                continue;
            }
            let index = if positional {
                hole.position()
            } else {
                next += 1;
                Some(next - 1)
            };
            if let Some(value) = index.and_then(|index| args.get(index)) {
                bound.push((hole.clone(), value.clone()));
            }
        }
        bound
    }

    /// Renders the template against final event properties.
    ///
    /// Text values are quoted unless the hole's format contains `l`. Holes
    /// match property names case-insensitively; holes with no matching
    /// property render as written.
    pub fn render(&self, properties: &[EventProperty]) -> String {
        let mut out = String::with_capacity(self.text.len());
        for token in &self.tokens {
            match token {
                Token::Text(text) => out.push_str(text),
                Token::Hole(hole) => {
                    match properties
                        .iter()
                        .find(|property| names_match(&property.name, &hole.name))
                    {
                        Some(property) => render_value(&mut out, hole, &property.value),
                        None => out.push_str(&hole.raw),
                    }
                }
            }
        }
        out
    }
}

fn render_value(out: &mut String, hole: &Hole, value: &PropertyValue) {
    let literal = hole.format.as_deref().is_some_and(|format| format.contains('l'));
    match value {
        PropertyValue::Str(text) if !literal => {
            out.push('"');
            out.push_str(text);
            out.push('"');
        }
        other => out.push_str(&other.render()),
    }
}
