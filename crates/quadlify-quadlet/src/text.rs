//! Target strings that may reference `let` bindings.

use std::fmt;

use serde::{Serialize, Serializer};

/// One piece of a [`Text`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Literal text, unescaped.
    Literal(String),
    /// A reference to a binding in the variable table.
    Variable(String),
}

/// A target string built from literal text and binding references.
///
/// Displays and serializes as `${NAME}` for references and raw text for
/// literals. The renderer applies the target language's escaping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Text {
    segments: Vec<Segment>,
}

impl Text {
    /// Creates an empty text.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Creates a literal text.
    pub fn literal(text: impl Into<String>) -> Self {
        let mut out = Self::new();
        out.push_str(&text.into());
        out
    }

    /// Creates a text referencing one binding.
    pub fn variable(name: impl Into<String>) -> Self {
        let mut out = Self::new();
        out.push_variable(name);
        out
    }

    /// Appends literal text, merging with a trailing literal.
    pub fn push_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(Segment::Literal(last)) => last.push_str(text),
            _ => self.segments.push(Segment::Literal(text.to_owned())),
        }
    }

    /// Appends a binding reference.
    pub fn push_variable(&mut self, name: impl Into<String>) {
        self.segments.push(Segment::Variable(name.into()));
    }

    /// Appends another text.
    pub fn append(&mut self, other: &Self) {
        for segment in &other.segments {
            match segment {
                Segment::Literal(text) => self.push_str(text),
                Segment::Variable(name) => self.push_variable(name.clone()),
            }
        }
    }

    /// Returns the segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns true if the text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the text if it references no binding.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [] => Some(""),
            [Segment::Literal(text)] => Some(text),
            _ => None,
        }
    }

    /// Iterates over referenced binding names.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Variable(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Variable(name) => write!(f, "${{{name}}}")?,
            }
        }
        Ok(())
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
