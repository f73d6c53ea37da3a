//! Source-map generation for compiled output.
//!
//! While the compiler walks the tree, a [`SourceMapState`] tracks where the
//! next emitted character lands in the output and records one [`Mapping`] per
//! emission that carries a node position. Encoding to the v3 format is left to
//! the `sourcemap` crate.
//!
//! Lines and columns are kept 1-based until [`SourceMapState::finalize`]
//! converts them into 0-based map coordinates. Map columns count UTF-16 code
//! units: the generated cursor counts them directly and original columns are
//! converted from `char`s against the source content when encoding.

pub mod input;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sourcemap::{SourceMap, SourceMapBuilder};
use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{Location, Position};
use crate::errors::{Error, Result};
use crate::options::{Options, SourceMapMode};

pub use input::{find_source_mapping_url, is_source_mapping_comment, InputMap};

/// One output position linked back to its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    /// Output location, columns in UTF-16 code units.
    pub generated: Location,
    /// Start of the node, columns in `char`s as the parser reports them.
    pub original: Location,
    pub source: Arc<str>,
    pub name: Option<Arc<str>>,
}

/// A source id registered while compiling, with its text when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub source: Arc<str>,
    pub content: Option<Arc<str>>,
}

/// Per-compile source-map bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct SourceMapState {
    cursor: Location,
    files: Vec<SourceFile>,
    mappings: Vec<Mapping>,
}

impl SourceMapState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the next emitted character will land, columns in UTF-16 code
    /// units.
    pub fn cursor(&self) -> Location {
        self.cursor
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Records a mapping from the current output cursor to `position.start`
    /// and registers the position's source.
    pub fn record(&mut self, position: &Position) {
        self.add_file(position.source.clone(), position.content.clone());
        self.mappings.push(Mapping {
            generated: self.cursor,
            original: position.start,
            source: position.source.clone(),
            name: None,
        });
    }

    /// Moves the output cursor past `text`.
    pub fn advance(&mut self, text: &str) {
        self.cursor.advance_utf16(text);
    }

    /// Registers `source`. Returns `false` when it was already known; the
    /// first registration wins, except that missing content is filled in.
    pub fn add_file(&mut self, source: Arc<str>, content: Option<Arc<str>>) -> bool {
        match self.files.iter_mut().find(|f| f.source == source) {
            Some(file) => {
                if file.content.is_none() {
                    file.content = content;
                }
                false
            }
            None => {
                self.files.push(SourceFile { source, content });
                true
            }
        }
    }

    /// Embeds source content, composes input maps (when enabled) and encodes
    /// the result. Problems with input maps are returned as non-fatal
    /// diagnostics next to the map.
    pub fn finalize(self, options: &Options) -> Result<(Option<CompiledMap>, Vec<Error>)> {
        if !options.sourcemap.is_enabled() {
            return Ok((None, Vec::new()));
        }

        let mut diagnostics = Vec::new();
        let mut inputs: HashMap<Arc<str>, InputMap> = HashMap::new();
        if options.input_sourcemaps {
            for file in &self.files {
                let Some(content) = &file.content else { continue };
                match InputMap::resolve(&file.source, content) {
                    Ok(Some(map)) => {
                        inputs.insert(file.source.clone(), map);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!("{err}; keeping mappings into {}", file.source);
                        diagnostics.push(err);
                    }
                }
            }
        }

        let map = self.encode(&inputs);
        debug!(
            "source map: {} mappings, {} sources, {} input maps composed",
            map.get_token_count(),
            map.get_source_count(),
            inputs.len()
        );

        let compiled = match options.sourcemap {
            SourceMapMode::Generator => CompiledMap::Generator(map),
            _ => CompiledMap::Json(RawSourceMap::from_map(&map)?),
        };
        Ok((Some(compiled), diagnostics))
    }

    fn encode(&self, inputs: &HashMap<Arc<str>, InputMap>) -> SourceMap {
        let mut builder = SourceMapBuilder::new(None);
        let mut contents: HashMap<Arc<str>, Arc<str>> = self
            .files
            .iter()
            .filter_map(|f| Some((f.source.clone(), f.content.clone()?)))
            .collect();
        let wide: HashMap<Arc<str>, Utf16Lines<'_>> = self
            .files
            .iter()
            .filter_map(|f| Some((f.source.clone(), Utf16Lines::new(f.content.as_deref()?)?)))
            .collect();

        for mapping in &self.mappings {
            let original = match wide.get(&mapping.source) {
                Some(lines) => Location::new(mapping.original.line, lines.column(mapping.original)),
                None => mapping.original,
            };
            let traced = inputs
                .get(&mapping.source)
                .and_then(|input| input.trace(original))
                .map(|t| {
                    if let Some(content) = t.content.clone() {
                        contents.entry(t.source.clone()).or_insert(content);
                    }
                    (t.source, t.original, t.name)
                });
            let (source, original, name) =
                traced.unwrap_or_else(|| (mapping.source.clone(), original, mapping.name.clone()));

            let src_id = builder.add_source(&*source);
            if let Some(content) = contents.get(&source) {
                builder.set_source_contents(src_id, Some(&**content));
            }
            let name_id = name.as_deref().map(|n| builder.add_name(n));
            builder.add_raw(
                to_map_coord(mapping.generated.line),
                to_map_coord(mapping.generated.column),
                to_map_coord(original.line),
                to_map_coord(original.column),
                Some(src_id),
                name_id,
                false,
            );
        }

        builder.into_sourcemap()
    }
}

/// Line index of a source whose text has characters outside the BMP, used to
/// turn `char` columns into UTF-16 columns.
struct Utf16Lines<'a> {
    content: &'a str,
    starts: Vec<usize>,
}

impl<'a> Utf16Lines<'a> {
    /// `None` when every char of `content` is a single UTF-16 unit, so the
    /// columns already agree.
    fn new(content: &'a str) -> Option<Self> {
        if content.chars().all(|c| c.len_utf16() == 1) {
            return None;
        }
        let starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Some(Self { content, starts })
    }

    fn column(&self, at: Location) -> usize {
        let Some(&start) = self.starts.get(at.line.saturating_sub(1)) else {
            return at.column;
        };
        let end = self.starts.get(at.line).map_or(self.content.len(), |&next| next - 1);
        let units: usize = self.content[start..end]
            .chars()
            .take(at.column.saturating_sub(1))
            .map(char::len_utf16)
            .sum();
        units + 1
    }
}

/// Converts a 1-based line or column to a 0-based map coordinate.
fn to_map_coord(value: usize) -> u32 {
    u32::try_from(value.saturating_sub(1)).unwrap_or(u32::MAX)
}

/// A finished map.
#[derive(Debug)]
pub enum CompiledMap {
    /// Plain v3 JSON object.
    Json(RawSourceMap),
    /// The decoded map, for further lookups or re-encoding.
    Generator(SourceMap),
}

impl CompiledMap {
    /// Raw v3 form of either variant.
    pub fn to_raw(&self) -> Result<RawSourceMap> {
        match self {
            CompiledMap::Json(raw) => Ok(raw.clone()),
            CompiledMap::Generator(map) => RawSourceMap::from_map(map),
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        let raw = self.to_raw()?;
        serde_json::to_string(&raw).map_err(|e| Error::SourceMap(sourcemap::Error::BadJson(e)))
    }
}

/// The v3 source-map JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceMap {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<Option<String>>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
}

impl RawSourceMap {
    pub fn from_map(map: &SourceMap) -> Result<Self> {
        let mut buf = Vec::new();
        map.to_writer(&mut buf)?;
        serde_json::from_slice(&buf).map_err(|e| Error::SourceMap(sourcemap::Error::BadJson(e)))
    }

    /// Decodes the map back for lookups.
    pub fn to_map(&self) -> Result<SourceMap> {
        let json = serde_json::to_vec(self).map_err(|e| Error::SourceMap(sourcemap::Error::BadJson(e)))?;
        Ok(SourceMap::from_slice(&json)?)
    }
}
