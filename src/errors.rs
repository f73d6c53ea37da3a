//! Ruleweave Error Handling
//!
//! A single [`Error`] enum covers every failure mode of parsing, compiling and
//! source-map generation. Located variants carry an [`ErrorLocation`] (source
//! id, 1-based line and column) plus a `miette` source snippet so the CLI can
//! render full diagnostics.

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::ast::{Location, Node, Span};

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// Source id plus 1-based line and column of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
    pub source: String,
    pub line: usize,
    pub column: usize,
}

impl ErrorLocation {
    pub fn new(source: impl Into<String>, at: Location) -> Self {
        Self {
            source: source.into(),
            line: at.line,
            column: at.column,
        }
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <line: {} column: {}>", self.source, self.line, self.column)
    }
}

/// Input text and the span an error points at, ready for `miette`.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: Arc<str>,
}

impl SourceContext {
    pub fn new(name: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.to_string()))
    }
}

pub fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::from(span.start..span.end)
}

// ============================================================================
// ERROR TYPE
// ============================================================================

/// Type-safe classification of [`Error`] variants, handy in tests and for
/// callers that branch on the failure mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnmatchedInput,
    ImbalancedSet,
    MissingHandler,
    InvalidMapSource,
    InvalidRuleRegistration,
    InvalidHandlerRegistration,
    InvalidPattern,
    Custom,
    InvalidOptions,
    SourceMap,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnmatchedInput => "UnmatchedInput",
            ErrorKind::ImbalancedSet => "ImbalancedSet",
            ErrorKind::MissingHandler => "MissingHandler",
            ErrorKind::InvalidMapSource => "InvalidMapSource",
            ErrorKind::InvalidRuleRegistration => "InvalidRuleRegistration",
            ErrorKind::InvalidHandlerRegistration => "InvalidHandlerRegistration",
            ErrorKind::InvalidPattern => "InvalidPattern",
            ErrorKind::Custom => "Custom",
            ErrorKind::InvalidOptions => "InvalidOptions",
            ErrorKind::SourceMap => "SourceMap",
            ErrorKind::Io => "Io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// No rule matched at the cursor while input remained.
    #[error("{location}: {reason}")]
    #[diagnostic(
        code(ruleweave::parse::unmatched_input),
        help("register a rule that matches this input, or enable silent mode")
    )]
    UnmatchedInput {
        found: char,
        reason: String,
        location: ErrorLocation,
        #[source_code]
        src: Arc<NamedSource<String>>,
        #[label("no rule matches here")]
        span: SourceSpan,
    },

    /// A close without an open, or an open still unclosed at end of input.
    #[error("{location}: {reason}")]
    #[diagnostic(code(ruleweave::parse::imbalanced_set))]
    ImbalancedSet {
        set: String,
        reason: String,
        location: ErrorLocation,
        #[source_code]
        src: Arc<NamedSource<String>>,
        #[label("unbalanced here")]
        span: SourceSpan,
    },

    /// The compiler met a node type with no handler and no `unknown` fallback.
    #[error("{location}: {reason}")]
    #[diagnostic(
        code(ruleweave::compile::missing_handler),
        help("register a handler for this type or an \"unknown\" fallback")
    )]
    MissingHandler {
        kind: String,
        reason: String,
        location: ErrorLocation,
        #[source_code]
        src: Arc<NamedSource<String>>,
        #[label("node without handler")]
        span: SourceSpan,
    },

    /// Raised by a rule or handler through `Cursor::error` or
    /// `Visitor::error`.
    #[error("{location}: {reason}")]
    #[diagnostic(code(ruleweave::custom))]
    Custom {
        reason: String,
        location: ErrorLocation,
        #[source_code]
        src: Arc<NamedSource<String>>,
        #[label("{reason}")]
        span: SourceSpan,
    },

    /// An embedded source-map reference could not be resolved or decoded.
    /// Never fatal: reported alongside the compile output.
    #[error("{source_id}: {reason}")]
    #[diagnostic(code(ruleweave::sourcemap::invalid_map_source), severity(Warning))]
    InvalidMapSource { source_id: String, reason: String },

    #[error("invalid rule registration {kind:?}: {reason}")]
    #[diagnostic(code(ruleweave::registry::invalid_rule))]
    InvalidRuleRegistration { kind: String, reason: String },

    #[error("invalid handler registration {kind:?}: {reason}")]
    #[diagnostic(code(ruleweave::registry::invalid_handler))]
    InvalidHandlerRegistration { kind: String, reason: String },

    #[error("invalid pattern {pattern:?}: {cause}")]
    #[diagnostic(code(ruleweave::registry::invalid_pattern))]
    InvalidPattern {
        pattern: String,
        #[source]
        cause: Box<regex_automata::meta::BuildError>,
    },

    #[error("invalid options: {0}")]
    #[diagnostic(code(ruleweave::options::invalid))]
    InvalidOptions(#[from] serde_json::Error),

    #[error("source map encoding failed: {0}")]
    #[diagnostic(code(ruleweave::sourcemap::encode))]
    SourceMap(#[from] sourcemap::Error),

    #[error("cannot read {path}: {source}")]
    #[diagnostic(code(ruleweave::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnmatchedInput { .. } => ErrorKind::UnmatchedInput,
            Error::ImbalancedSet { .. } => ErrorKind::ImbalancedSet,
            Error::MissingHandler { .. } => ErrorKind::MissingHandler,
            Error::InvalidMapSource { .. } => ErrorKind::InvalidMapSource,
            Error::InvalidRuleRegistration { .. } => ErrorKind::InvalidRuleRegistration,
            Error::InvalidHandlerRegistration { .. } => ErrorKind::InvalidHandlerRegistration,
            Error::InvalidPattern { .. } => ErrorKind::InvalidPattern,
            Error::Custom { .. } => ErrorKind::Custom,
            Error::InvalidOptions(_) => ErrorKind::InvalidOptions,
            Error::SourceMap(_) => ErrorKind::SourceMap,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    /// Where the error happened, for variants tied to an input position.
    pub fn location(&self) -> Option<&ErrorLocation> {
        match self {
            Error::UnmatchedInput { location, .. }
            | Error::ImbalancedSet { location, .. }
            | Error::MissingHandler { location, .. }
            | Error::Custom { location, .. } => Some(location),
            _ => None,
        }
    }

    /// The bare reason, without the location prefix of `Display`.
    pub fn reason(&self) -> String {
        match self {
            Error::UnmatchedInput { reason, .. }
            | Error::ImbalancedSet { reason, .. }
            | Error::MissingHandler { reason, .. }
            | Error::Custom { reason, .. }
            | Error::InvalidMapSource { reason, .. }
            | Error::InvalidRuleRegistration { reason, .. }
            | Error::InvalidHandlerRegistration { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }

    pub fn unmatched_input(found: char, location: ErrorLocation, ctx: &SourceContext, span: Span) -> Self {
        Error::UnmatchedInput {
            found,
            reason: format!("no rule matches {found:?}"),
            location,
            src: ctx.to_named_source(),
            span: to_source_span(span),
        }
    }

    pub fn imbalanced_set(
        set: &str,
        reason: impl Into<String>,
        location: ErrorLocation,
        ctx: &SourceContext,
        span: Span,
    ) -> Self {
        Error::ImbalancedSet {
            set: set.to_string(),
            reason: reason.into(),
            location,
            src: ctx.to_named_source(),
            span: to_source_span(span),
        }
    }

    /// Builds a `MissingHandler` error pointing at the end of `node`.
    pub fn missing_handler(node: &Node, fallback_source: &str) -> Self {
        let (location, src, span) = node_context(node, fallback_source);
        Error::MissingHandler {
            kind: node.kind.clone(),
            reason: format!("handler {:?} is not registered", node.kind),
            location,
            src,
            span,
        }
    }

    /// Builds a `Custom` error pointing at the end of `node`.
    pub fn custom(reason: impl Into<String>, node: &Node, fallback_source: &str) -> Self {
        let (location, src, span) = node_context(node, fallback_source);
        Error::Custom {
            reason: reason.into(),
            location,
            src,
            span,
        }
    }

    /// Builds a `Custom` error at an explicit location.
    pub fn custom_at(reason: impl Into<String>, location: ErrorLocation, ctx: &SourceContext, span: Span) -> Self {
        Error::Custom {
            reason: reason.into(),
            location,
            src: ctx.to_named_source(),
            span: to_source_span(span),
        }
    }

    pub fn invalid_map_source(source_id: &str, reason: impl Into<String>) -> Self {
        Error::InvalidMapSource {
            source_id: source_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Location, snippet and span for an error reported at the end of `node`.
fn node_context(node: &Node, fallback_source: &str) -> (ErrorLocation, Arc<NamedSource<String>>, SourceSpan) {
    let (location, ctx, span) = match &node.position {
        Some(pos) => (
            ErrorLocation::new(&*pos.source, pos.end),
            SourceContext::new(&*pos.source, pos.content.clone().unwrap_or_else(|| Arc::from(""))),
            if pos.content.is_some() { pos.span } else { Span::default() },
        ),
        None => (
            ErrorLocation::new(fallback_source, Location::default()),
            SourceContext::new(fallback_source, ""),
            Span::default(),
        ),
    };
    (location, ctx.to_named_source(), to_source_span(span))
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Renders an error with full miette diagnostics to stderr.
pub fn print_error(error: Error) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_display_spaces_line_and_column() {
        let loc = ErrorLocation::new("string", Location::new(1, 2));
        assert_eq!(loc.to_string(), "string <line: 1 column: 2>");
    }

    #[test]
    fn missing_handler_message_uses_node_end() {
        let pos = crate::ast::Position::new(Location::new(1, 1), Location::new(1, 2), "string");
        let node = Node::new("text", "a").with_position(pos);
        let err = Error::missing_handler(&node, "string");
        assert_eq!(err.kind(), ErrorKind::MissingHandler);
        assert_eq!(
            err.to_string(),
            "string <line: 1 column: 2>: handler \"text\" is not registered"
        );
        let loc = err.location().unwrap();
        assert_eq!((loc.line, loc.column), (1, 2));
    }

    #[test]
    fn custom_error_uses_node_end() {
        let pos = crate::ast::Position::new(Location::new(1, 1), Location::new(2, 4), "glob.txt");
        let node = Node::new("text", "abc").with_position(pos);
        let err = Error::custom("bad glob", &node, "string");
        assert_eq!(err.kind(), ErrorKind::Custom);
        assert_eq!(err.reason(), "bad glob");
        assert_eq!(err.to_string(), "glob.txt <line: 2 column: 4>: bad glob");

        let bare = Error::custom("no position", &Node::new("text", ""), "string");
        assert_eq!(bare.to_string(), "string <line: 1 column: 1>: no position");
    }

    #[test]
    fn reason_omits_location() {
        let err = Error::invalid_map_source("a.js", "missing file");
        assert_eq!(err.reason(), "missing file");
        assert_eq!(err.to_string(), "a.js: missing file");
    }
}
