//! Source locations for AST nodes.
//!
//! Lines and columns are 1-based everywhere in this crate. They are only
//! converted to 0-based values when written into source-map mappings.
//!
//! Columns count Unicode scalar values (`char`s). Source maps count UTF-16
//! code units instead; see [`Location::advance_utf16`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A line/column pair. Both values start at 1; columns count `char`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Moves the location past `text`.
    ///
    /// Every newline in `text` bumps the line. If `text` contains a newline the
    /// column becomes the number of characters after the last one plus one,
    /// otherwise the column grows by the character count of `text`.
    pub fn advance(&mut self, text: &str) {
        self.advance_by(text, |s| s.chars().count());
    }

    /// Like [`advance`](Self::advance), counting UTF-16 code units the way v3
    /// source-map consumers do.
    pub fn advance_utf16(&mut self, text: &str) {
        self.advance_by(text, |s| s.encode_utf16().count());
    }

    fn advance_by(&mut self, text: &str, width: impl Fn(&str) -> usize) {
        self.line += text.matches('\n').count();
        match text.rfind('\n') {
            Some(idx) => self.column = width(&text[idx + 1..]) + 1,
            None => self.column += width(text),
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Byte range into the parsed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where a node came from. Created once when a rule finishes its node and
/// never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub start: Location,
    pub end: Location,
    #[serde(skip)]
    pub span: Span,
    /// Source id, e.g. a file path or the `source` option label.
    pub source: Arc<str>,
    /// Full text of the input the node was parsed from, used to embed
    /// `sourcesContent` in generated maps.
    #[serde(skip)]
    pub content: Option<Arc<str>>,
}

impl Position {
    pub fn new(start: Location, end: Location, source: impl Into<Arc<str>>) -> Self {
        Self {
            start,
            end,
            span: Span::default(),
            source: source.into(),
            content: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_content(mut self, content: Arc<str>) -> Self {
        self.content = Some(content);
        self
    }
}
