//! Source Map V3 data model.

use serde::{Deserialize, Serialize};

use crate::error::MapResult;
use crate::vlq;

/// Decoded mappings: one list of segments per generated line.
pub type Mappings = Vec<Vec<Segment>>;

/// A Source Map V3 document with encoded mappings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    /// Always 3.
    pub version: u32,

    /// Generated file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    /// Original source file names
    #[serde(default)]
    pub sources: Vec<String>,

    /// Original source text, parallel to `sources`
    #[serde(default)]
    pub sources_content: Vec<Option<String>>,

    /// Identifier names referenced by segments
    #[serde(default)]
    pub names: Vec<String>,

    /// Base64-VLQ encoded mappings
    pub mappings: String,
}

impl SourceMap {
    /// Build a map by encoding decoded mappings.
    pub fn from_mappings(
        sources: Vec<String>,
        sources_content: Vec<Option<String>>,
        names: Vec<String>,
        mappings: &[Vec<Segment>],
    ) -> Self {
        Self {
            version: 3,
            file: None,
            source_root: None,
            sources,
            sources_content,
            names,
            mappings: vlq::encode(mappings),
        }
    }

    /// Parse a map from its JSON text.
    pub fn from_json(json: &str) -> MapResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the map to JSON text.
    pub fn to_json(&self) -> MapResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode the `mappings` field.
    pub fn decode(&self) -> MapResult<Mappings> {
        vlq::decode(&self.mappings)
    }
}

/// Where a generated position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginalLocation {
    /// Index into `sources`.
    pub source: u32,
    /// 0-based line in the original source.
    pub line: u32,
    /// 0-based column in the original source.
    pub column: u32,
    /// Index into `names`.
    pub name: Option<u32>,
}

/// One mapping segment of a generated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// 0-based column in the generated line.
    pub generated_column: u32,
    /// `None` for segments that only mark a generated column.
    pub original: Option<OriginalLocation>,
}

impl Segment {
    /// A segment with no original position.
    pub fn unmapped(generated_column: u32) -> Self {
        Self {
            generated_column,
            original: None,
        }
    }

    /// A segment pointing to an original position.
    pub fn mapped(generated_column: u32, source: u32, line: u32, column: u32) -> Self {
        Self {
            generated_column,
            original: Some(OriginalLocation {
                source,
                line,
                column,
                name: None,
            }),
        }
    }

    /// Attach a name index. No-op for unmapped segments.
    pub fn with_name(mut self, name: u32) -> Self {
        if let Some(original) = self.original.as_mut() {
            original.name = Some(name);
        }
        self
    }
}
