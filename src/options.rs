//! Engine configuration.
//!
//! Options deserialize from camelCase JSON, mirroring the keys callers of the
//! library already use:
//!
//! ```json
//! { "source": "input.txt", "strict": true, "sourcemap": "generator" }
//! ```
//!
//! `sourcemap` accepts `true`, `false`, `"json"`, `"off"` or `"generator"`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::Result;

pub const DEFAULT_SOURCE: &str = "string";

/// What `compile` returns in [`CompileOutput::map`](crate::compiler::CompileOutput).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SourceMapMode {
    /// No mappings are recorded.
    #[default]
    Off,
    /// A finalized v3 JSON map.
    Json,
    /// The decoded map object, for callers that keep working with it.
    Generator,
}

impl SourceMapMode {
    pub fn is_enabled(self) -> bool {
        self != SourceMapMode::Off
    }
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum SourceMapRepr {
    Flag(bool),
    Named(String),
}

impl Serialize for SourceMapMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let repr = match self {
            SourceMapMode::Off => SourceMapRepr::Flag(false),
            SourceMapMode::Json => SourceMapRepr::Flag(true),
            SourceMapMode::Generator => SourceMapRepr::Named("generator".into()),
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SourceMapMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match SourceMapRepr::deserialize(deserializer)? {
            SourceMapRepr::Flag(true) => Ok(SourceMapMode::Json),
            SourceMapRepr::Flag(false) => Ok(SourceMapMode::Off),
            SourceMapRepr::Named(name) => match name.as_str() {
                "generator" => Ok(SourceMapMode::Generator),
                "json" => Ok(SourceMapMode::Json),
                "off" => Ok(SourceMapMode::Off),
                other => Err(serde::de::Error::custom(format!(
                    "unknown sourcemap mode {other:?}"
                ))),
            },
        }
    }
}

/// Options shared by the parser, the compiler and the [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Label for the current input: used in error messages and as the
    /// source id of every position.
    pub source: String,
    /// Queue recoverable parse errors on the AST instead of aborting.
    pub silent: bool,
    /// Turn unbalanced sets and unmatched input into hard errors.
    pub strict: bool,
    pub sourcemap: SourceMapMode,
    /// Resolve `sourceMappingURL` directives found in source content and
    /// compose them into the generated map. Off unless asked for.
    pub input_sourcemaps: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            silent: false,
            strict: false,
            sourcemap: SourceMapMode::Off,
            input_sourcemaps: false,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn sourcemap(mut self, mode: SourceMapMode) -> Self {
        self.sourcemap = mode;
        self
    }

    pub fn input_sourcemaps(mut self, enabled: bool) -> Self {
        self.input_sourcemaps = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = Options::default();
        assert_eq!(opts.source, "string");
        assert!(!opts.silent && !opts.strict && !opts.input_sourcemaps);
        assert_eq!(opts.sourcemap, SourceMapMode::Off);
    }

    #[test]
    fn from_json_accepts_bool_and_generator() {
        let opts = Options::from_json(r#"{"sourcemap": true, "inputSourcemaps": true}"#).unwrap();
        assert_eq!(opts.sourcemap, SourceMapMode::Json);
        assert!(opts.input_sourcemaps);
        assert_eq!(opts.source, "string");

        let opts = Options::from_json(r#"{"sourcemap": "generator", "source": "a.txt"}"#).unwrap();
        assert_eq!(opts.sourcemap, SourceMapMode::Generator);
        assert_eq!(opts.source, "a.txt");
    }

    #[test]
    fn from_json_rejects_unknown_mode() {
        let err = Options::from_json(r#"{"sourcemap": "inline"}"#).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::InvalidOptions);
    }

    #[test]
    fn serializes_back_to_camel_case() {
        let opts = Options::new().sourcemap(SourceMapMode::Generator).strict(true);
        let json = serde_json::to_value(&opts).unwrap();
        assert_eq!(json["sourcemap"], "generator");
        assert_eq!(json["strict"], true);
        assert_eq!(json["inputSourcemaps"], false);
    }
}
