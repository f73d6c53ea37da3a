//! Maps embedded in source content via `sourceMappingURL` directives.
//!
//! A source that was itself generated may end with
//! `//# sourceMappingURL=<url>` (or the `/*# ... */` form). The url is either
//! an inline `data:` url or a path relative to the source's directory.
//!
//! Relative `sources` of a map file resolve against the map file's directory;
//! those of an inline map resolve against the source's directory.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use sourcemap::{DecodedMap, SourceMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ast::Location;
use crate::errors::{Error, Result};

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)(?://|/\*)[ \t]*[#@][ \t]+sourceMappingURL=([^\s'"*]+)[ \t]*(?:\*/)?[ \t]*$"#)
        .expect("sourceMappingURL directive regex should compile")
});

static COMMENT_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[#@][ \t]+sourceMappingURL=").expect("sourceMappingURL comment regex should compile")
});

/// Url of the last `sourceMappingURL` directive in `content`.
pub fn find_source_mapping_url(content: &str) -> Option<&str> {
    DIRECTIVE
        .captures_iter(content)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// True when a comment's text is a `sourceMappingURL` directive.
pub fn is_source_mapping_comment(value: &str) -> bool {
    COMMENT_DIRECTIVE.is_match(value)
}

/// Rewrites `data:application/json;charset=utf-8;base64,...` and similar
/// variants to the plain `data:application/json;base64,` form.
fn normalize_data_url(url: &str) -> Option<String> {
    let (_, payload) = url.strip_prefix("data:")?.split_once(";base64,")?;
    Some(format!("data:application/json;base64,{payload}"))
}

/// A decoded input map, ready to trace positions through.
#[derive(Debug)]
pub struct InputMap {
    map: SourceMap,
    /// Directory relative `sources` entries are resolved against.
    base: PathBuf,
}

/// Where a position ends up after going through an [`InputMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traced {
    pub source: Arc<str>,
    pub original: Location,
    pub name: Option<Arc<str>>,
    pub content: Option<Arc<str>>,
}

impl InputMap {
    /// A map whose `sources` are used as written.
    pub fn new(map: SourceMap) -> Self {
        Self::with_base(map, PathBuf::new())
    }

    /// A map whose relative `sources` resolve against `base`.
    pub fn with_base(map: SourceMap, base: impl Into<PathBuf>) -> Self {
        Self { map, base: base.into() }
    }

    /// Looks for a directive in `content` and loads the map it points at.
    ///
    /// `Ok(None)` means there is no directive. A directive that cannot be
    /// read or decoded yields [`Error::InvalidMapSource`].
    pub fn resolve(source: &str, content: &str) -> Result<Option<Self>> {
        let Some(url) = find_source_mapping_url(content) else {
            return Ok(None);
        };

        let source_dir = Path::new(source).parent().unwrap_or_else(|| Path::new(""));
        let (decoded, base) = if url.starts_with("data:") {
            let url = normalize_data_url(url).ok_or_else(|| {
                Error::invalid_map_source(source, "inline source maps must be base64 encoded")
            })?;
            let decoded = sourcemap::decode_data_url(&url)
                .map_err(|e| Error::invalid_map_source(source, format!("cannot decode inline source map: {e}")))?;
            (decoded, source_dir.to_path_buf())
        } else {
            let path = source_dir.join(url);
            let bytes = fs::read(&path).map_err(|e| {
                Error::invalid_map_source(source, format!("cannot read source map {}: {e}", path.display()))
            })?;
            let decoded = sourcemap::decode_slice(&bytes).map_err(|e| {
                Error::invalid_map_source(source, format!("cannot decode source map {}: {e}", path.display()))
            })?;
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (decoded, base)
        };

        match decoded {
            DecodedMap::Regular(map) => {
                debug!("{source}: loaded input map with {} sources", map.get_source_count());
                Ok(Some(Self::with_base(map, base)))
            }
            _ => Err(Error::invalid_map_source(
                source,
                "only regular (non-indexed) input source maps are supported",
            )),
        }
    }

    /// Traces a 1-based original location through the map. Returns `None`
    /// when the map has no segment on that line at or before the column.
    pub fn trace(&self, at: Location) -> Option<Traced> {
        let line = u32::try_from(at.line.checked_sub(1)?).ok()?;
        let column = u32::try_from(at.column.checked_sub(1)?).ok()?;
        let token = self.map.lookup_token(line, column)?;
        if token.get_dst_line() != line {
            return None;
        }
        let source = token.get_source()?;

        Some(Traced {
            source: Arc::from(self.resolve_source(source)),
            original: Location::new(token.get_src_line() as usize + 1, token.get_src_col() as usize + 1),
            name: token.get_name().map(Arc::from),
            content: self.map.get_source_contents(token.get_src_id()).map(Arc::from),
        })
    }

    /// Resolves a `sources` entry (already prefixed with `sourceRoot` by the
    /// decoder) against the base directory. Absolute paths and urls are kept.
    fn resolve_source(&self, source: &str) -> String {
        let source = source.replace('\\', "/");
        if is_absolute(&source) || self.base.as_os_str().is_empty() {
            return source;
        }
        self.base
            .join(source.trim_start_matches("./"))
            .to_string_lossy()
            .replace('\\', "/")
    }
}

fn is_absolute(source: &str) -> bool {
    Path::new(source).is_absolute() || source.starts_with('/') || source.contains("://") || source.starts_with("data:")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"{"version":3,"sources":["original.txt"],"names":[],"mappings":"AAAA,EAAI","sourcesContent":["a / b"]}"#;

    #[test]
    fn finds_last_directive() {
        let content = "x\n//# sourceMappingURL=one.map\ny\n/*# sourceMappingURL=two.map */\n";
        assert_eq!(find_source_mapping_url(content), Some("two.map"));
        assert_eq!(find_source_mapping_url("no directive"), None);
    }

    #[test]
    fn recognizes_comment_values() {
        assert!(is_source_mapping_comment("# sourceMappingURL=a.map"));
        assert!(is_source_mapping_comment("//@ sourceMappingURL=a.map"));
        assert!(!is_source_mapping_comment("// plain comment"));
    }

    #[test]
    fn traces_through_map() {
        let input = InputMap::new(SourceMap::from_slice(MAP.as_bytes()).unwrap());
        let traced = input.trace(Location::new(1, 3)).unwrap();
        assert_eq!(&*traced.source, "original.txt");
        assert_eq!(traced.original, Location::new(1, 5));
        assert_eq!(traced.content.as_deref(), Some("a / b"));

        assert!(input.trace(Location::new(2, 1)).is_none());
    }

    #[test]
    fn resolves_sources_against_base() {
        let map = SourceMap::from_slice(MAP.as_bytes()).unwrap();
        let input = InputMap::with_base(map, "maps");
        assert_eq!(&*input.trace(Location::new(1, 1)).unwrap().source, "maps/original.txt");
    }

    #[test]
    fn applies_source_root_and_keeps_absolute_sources() {
        let json = r#"{"version":3,"sourceRoot":"src/","sources":["a.txt","/abs/b.txt"],"names":[],"mappings":"AAAA,ECAA"}"#;
        let input = InputMap::with_base(SourceMap::from_slice(json.as_bytes()).unwrap(), "maps");
        assert_eq!(&*input.trace(Location::new(1, 1)).unwrap().source, "maps/src/a.txt");
        assert_eq!(&*input.trace(Location::new(1, 3)).unwrap().source, "/abs/b.txt");
        assert_eq!(input.resolve_source("http://x/y.txt"), "http://x/y.txt");
    }

    #[test]
    fn normalizes_charset_in_data_urls() {
        assert_eq!(
            normalize_data_url("data:application/json;charset=utf-8;base64,e30=").as_deref(),
            Some("data:application/json;base64,e30=")
        );
        assert_eq!(normalize_data_url("data:application/json,{}"), None);
    }

    #[test]
    fn missing_file_is_invalid_map_source() {
        let err = InputMap::resolve("dir/in.txt", "x\n//# sourceMappingURL=nope.map")
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::InvalidMapSource);
        assert!(err.reason().contains("nope.map"));
    }
}
