//! Tokenization of Compose interpolation expressions using `nom`.
//!
//! Splits a raw field value into literal text and `${VAR}` references so
//! later stages can hoist variables without re-scanning strings. Supported
//! forms: `${VAR}`, `${VAR:-default}`, `${VAR-default}`, `${VAR:?error}`,
//! `${VAR?error}`, `${VAR:+alternate}`, `${VAR+alternate}`, `$VAR`, and the
//! `$$` escape. Operator arguments are templates themselves, so
//! `${DATA:-${HOME}/data}` nests.

use std::fmt;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_till1, take_while, take_while1},
    character::complete::char,
    combinator::{cut, map, recognize, success, value},
    multi::many0,
    sequence::{pair, preceded},
};
use thiserror::Error;

/// A field value split into literal text and variable references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    fragments: Vec<Fragment>,
}

/// One piece of a [`Template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Literal text, with `$$` already unescaped.
    Literal(String),
    /// A variable reference.
    Variable(VariableRef),
}

/// A `${NAME...}` or `$NAME` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRef {
    /// Variable name.
    pub name: String,
    /// What happens when the variable is unset.
    pub modifier: Modifier,
}

/// The operator part of a braced reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    /// `${VAR}` or `$VAR`.
    Plain,
    /// `${VAR:-value}` or `${VAR-value}`.
    Default(Template),
    /// `${VAR:?message}` or `${VAR?message}`.
    Required(Template),
    /// `${VAR:+value}` or `${VAR+value}`.
    Alternate(Template),
}

/// A field value with a malformed `${...}` expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed interpolation in \"{input}\"")]
pub struct InterpolationError {
    /// The offending field value.
    pub input: String,
}

impl VariableRef {
    /// Returns the default value, if the reference declares one.
    #[must_use]
    pub const fn default_value(&self) -> Option<&Template> {
        match &self.modifier {
            Modifier::Default(value) => Some(value),
            _ => None,
        }
    }
}

impl Template {
    /// Creates a template holding literal text only.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::from_fragments(vec![Fragment::Literal(text.into())])
    }

    /// Parses a raw Compose field value.
    ///
    /// # Errors
    ///
    /// Returns an error if a `${` expression is not terminated or does not
    /// start with a valid variable name.
    pub fn parse(input: &str) -> Result<Self, InterpolationError> {
        let malformed = || InterpolationError {
            input: input.to_owned(),
        };
        let (rest, fragments) = many0(fragment).parse(input).map_err(|_| malformed())?;
        if !rest.is_empty() {
            return Err(malformed());
        }
        Ok(Self::from_fragments(fragments))
    }

    /// Builds a template, merging adjacent literals and dropping empty ones.
    #[must_use]
    pub fn from_fragments(fragments: Vec<Fragment>) -> Self {
        let mut merged: Vec<Fragment> = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            match (merged.last_mut(), fragment) {
                (_, Fragment::Literal(text)) if text.is_empty() => {}
                (Some(Fragment::Literal(prev)), Fragment::Literal(text)) => prev.push_str(&text),
                (_, other) => merged.push(other),
            }
        }
        Self { fragments: merged }
    }

    /// Returns the fragments in order.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Returns true if the template renders to an empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Returns the text if the template holds no variable references.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self.fragments.as_slice() {
            [] => Some(""),
            [Fragment::Literal(text)] => Some(text),
            _ => None,
        }
    }

    /// Iterates over the variable references in order of appearance.
    pub fn variables(&self) -> impl Iterator<Item = &VariableRef> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::Variable(var) => Some(var),
            Fragment::Literal(_) => None,
        })
    }

    /// Renders the template with every variable replaced by its default.
    ///
    /// Returns `None` if a variable, at any depth, has no default.
    #[must_use]
    pub fn resolve_defaults(&self) -> Option<String> {
        let mut out = String::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Literal(text) => out.push_str(text),
                Fragment::Variable(var) => out.push_str(&var.default_value()?.resolve_defaults()?),
            }
        }
        Some(out)
    }

    /// Splits on `sep` where it appears in literal text outside `[...]`.
    ///
    /// Separators inside variable defaults never split, so
    /// `${PORT:-80}:80` yields two parts.
    #[must_use]
    pub fn split_top_level(&self, sep: char) -> Vec<Self> {
        let mut parts = Vec::new();
        let mut current: Vec<Fragment> = Vec::new();
        let mut depth = 0_usize;

        for fragment in &self.fragments {
            match fragment {
                Fragment::Variable(_) => current.push(fragment.clone()),
                Fragment::Literal(text) => {
                    let mut buffer = String::new();
                    for c in text.chars() {
                        match c {
                            '[' => depth += 1,
                            ']' => depth = depth.saturating_sub(1),
                            _ => {}
                        }
                        if c == sep && depth == 0 {
                            current.push(Fragment::Literal(std::mem::take(&mut buffer)));
                            parts.push(Self::from_fragments(std::mem::take(&mut current)));
                        } else {
                            buffer.push(c);
                        }
                    }
                    current.push(Fragment::Literal(buffer));
                }
            }
        }
        parts.push(Self::from_fragments(current));
        parts
    }

    /// Splits off the text after the last `sep` in a trailing literal.
    #[must_use]
    pub fn split_suffix(&self, sep: char) -> Option<(Self, String)> {
        let Some(Fragment::Literal(last)) = self.fragments.last() else {
            return None;
        };
        let (head, suffix) = last.rsplit_once(sep)?;
        let mut fragments = self.fragments[..self.fragments.len() - 1].to_vec();
        fragments.push(Fragment::Literal(head.to_owned()));
        Some((Self::from_fragments(fragments), suffix.to_owned()))
    }
}

impl fmt::Display for Template {
    /// Writes the template back in Compose syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.fragments {
            match fragment {
                Fragment::Literal(text) => write!(f, "{}", text.replace('$', "$$"))?,
                Fragment::Variable(var) => write!(f, "{var}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.modifier {
            Modifier::Plain => write!(f, "${{{}}}", self.name),
            Modifier::Default(v) => write!(f, "${{{}:-{v}}}", self.name),
            Modifier::Required(v) => write!(f, "${{{}:?{v}}}", self.name),
            Modifier::Alternate(v) => write!(f, "${{{}:+{v}}}", self.name),
        }
    }
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(take_while1(is_ident_start), take_while(is_ident_continue))).parse(input)
}

/// Operator argument: a template running up to the unmatched closing brace.
fn modifier_argument(input: &str) -> IResult<&str, Template> {
    map(many0(argument_fragment), Template::from_fragments).parse(input)
}

fn argument_literal(input: &str) -> IResult<&str, Fragment> {
    map(take_till1(|c| c == '$' || c == '}'), |s: &str| {
        Fragment::Literal(s.to_owned())
    })
    .parse(input)
}

fn argument_fragment(input: &str) -> IResult<&str, Fragment> {
    alt((escaped_dollar, braced, bare, lone_dollar, argument_literal)).parse(input)
}

fn modifier(input: &str) -> IResult<&str, Modifier> {
    alt((
        map(preceded(tag(":-"), modifier_argument), Modifier::Default),
        map(preceded(tag(":?"), modifier_argument), Modifier::Required),
        map(preceded(tag(":+"), modifier_argument), Modifier::Alternate),
        map(preceded(char('-'), modifier_argument), Modifier::Default),
        map(preceded(char('?'), modifier_argument), Modifier::Required),
        map(preceded(char('+'), modifier_argument), Modifier::Alternate),
        success(Modifier::Plain),
    ))
    .parse(input)
}

/// `${NAME...}`. Once `${` is seen the expression must be well formed.
fn braced(input: &str) -> IResult<&str, Fragment> {
    let (input, _) = tag("${").parse(input)?;
    let (input, name) = cut(identifier).parse(input)?;
    let (input, modifier) = modifier(input)?;
    let (input, _) = cut(char('}')).parse(input)?;
    let var = VariableRef {
        name: name.to_owned(),
        modifier,
    };
    Ok((input, Fragment::Variable(var)))
}

fn bare(input: &str) -> IResult<&str, Fragment> {
    map(preceded(char('$'), identifier), |name: &str| {
        Fragment::Variable(VariableRef {
            name: name.to_owned(),
            modifier: Modifier::Plain,
        })
    })
    .parse(input)
}

fn escaped_dollar(input: &str) -> IResult<&str, Fragment> {
    value(Fragment::Literal("$".into()), tag("$$")).parse(input)
}

fn lone_dollar(input: &str) -> IResult<&str, Fragment> {
    value(Fragment::Literal("$".into()), char('$')).parse(input)
}

fn literal(input: &str) -> IResult<&str, Fragment> {
    map(take_till1(|c| c == '$'), |s: &str| {
        Fragment::Literal(s.to_owned())
    })
    .parse(input)
}

fn fragment(input: &str) -> IResult<&str, Fragment> {
    alt((escaped_dollar, braced, bare, lone_dollar, literal)).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, modifier: Modifier) -> Fragment {
        Fragment::Variable(VariableRef {
            name: name.into(),
            modifier,
        })
    }

    #[test]
    fn parse_plain_literal() {
        let template = Template::parse("postgres:16").expect("should parse");
        assert_eq!(template.as_literal(), Some("postgres:16"));
    }

    #[test]
    fn parse_empty_input() {
        let template = Template::parse("").expect("should parse");
        assert!(template.is_empty());
        assert_eq!(template.as_literal(), Some(""));
    }

    #[test]
    fn parse_default_expression() {
        let template = Template::parse("repo/img:${VERSION:-1.2.3}").expect("should parse");
        assert_eq!(
            template.fragments(),
            &[
                Fragment::Literal("repo/img:".into()),
                var("VERSION", Modifier::Default(Template::literal("1.2.3"))),
            ]
        );
        assert_eq!(template.resolve_defaults().as_deref(), Some("repo/img:1.2.3"));
    }

    #[test]
    fn parse_all_modifiers() {
        let template =
            Template::parse("${A}${B-b}${C:?missing}${D?x}${E:+alt}${F+y}$G").expect("should parse");
        let mods: Vec<_> = template.variables().map(|v| v.modifier.clone()).collect();
        assert_eq!(
            mods,
            vec![
                Modifier::Plain,
                Modifier::Default(Template::literal("b")),
                Modifier::Required(Template::literal("missing")),
                Modifier::Required(Template::literal("x")),
                Modifier::Alternate(Template::literal("alt")),
                Modifier::Alternate(Template::literal("y")),
                Modifier::Plain,
            ]
        );
    }

    #[test]
    fn parse_escaped_dollar_is_literal() {
        let template = Template::parse("price: $$5 and $${HOME}").expect("should parse");
        assert_eq!(template.as_literal(), Some("price: $5 and ${HOME}"));
        assert_eq!(template.to_string(), "price: $$5 and $${HOME}");
    }

    #[test]
    fn parse_lone_dollar_is_literal() {
        let template = Template::parse("cost $ 5").expect("should parse");
        assert_eq!(template.as_literal(), Some("cost $ 5"));
    }

    #[test]
    fn parse_nested_default() {
        let template = Template::parse("${DATA:-${HOME}/data}:/data").expect("should parse");
        let nested = Template::from_fragments(vec![
            var("HOME", Modifier::Plain),
            Fragment::Literal("/data".into()),
        ]);
        assert_eq!(
            template.fragments(),
            &[
                var("DATA", Modifier::Default(nested)),
                Fragment::Literal(":/data".into()),
            ]
        );
        assert_eq!(template.to_string(), "${DATA:-${HOME}/data}:/data");
        assert_eq!(template.resolve_defaults(), None);
    }

    #[test]
    fn nested_defaults_resolve_through() {
        let template = Template::parse("${A:-${B:-/srv}/a}").expect("should parse");
        assert_eq!(template.resolve_defaults().as_deref(), Some("/srv/a"));
    }

    #[test]
    fn parse_unterminated_nested_expression_fails() {
        assert!(Template::parse("${DATA:-${HOME/data}").is_err());
        assert!(Template::parse("${DATA:-${HOME}").is_err());
    }

    #[test]
    fn parse_unterminated_expression_fails() {
        let err = Template::parse("img:${TAG").unwrap_err();
        assert_eq!(err.input, "img:${TAG");
    }

    #[test]
    fn parse_invalid_name_fails() {
        assert!(Template::parse("${1BAD}").is_err());
        assert!(Template::parse("${}").is_err());
    }

    #[test]
    fn split_ignores_separator_in_default() {
        let template = Template::parse("${PORT:-8080}:80").expect("should parse");
        let parts = template.split_top_level(':');
        assert_eq!(parts.len(), 2);
        assert!(matches!(parts[0].fragments(), [Fragment::Variable(_)]));
        assert_eq!(parts[1].as_literal(), Some("80"));
    }

    #[test]
    fn split_ignores_separator_in_brackets() {
        let template = Template::literal("[::1]:8080:80");
        let parts: Vec<String> = template
            .split_top_level(':')
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(parts, vec!["[::1]", "8080", "80"]);
    }

    #[test]
    fn split_suffix_takes_protocol() {
        let template = Template::literal("53:53/udp");
        let (head, proto) = template.split_suffix('/').expect("has suffix");
        assert_eq!(head.as_literal(), Some("53:53"));
        assert_eq!(proto, "udp");
        assert!(Template::literal("53:53").split_suffix('/').is_none());
    }

    #[test]
    fn display_round_trips_references() {
        let input = "${DB:-postgres}://${HOST}/x";
        let template = Template::parse(input).expect("should parse");
        assert_eq!(template.to_string(), input);
    }
}
