//! Block and result types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use vernis_carton::FxHashMap;
use vernis_trame::SourceMap;

use crate::error::{PreprocessError, PreprocessResult};

/// Value of a tag attribute: `lang="ts"` or a bare `global`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Text(String),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Flag(value)
    }
}

/// Tag attributes of a block.
pub type Attributes = FxHashMap<String, AttributeValue>;

/// Read a string attribute. A bare flag under `name` is an error.
pub fn text_attribute<'a>(
    attributes: &'a Attributes,
    name: &str,
) -> PreprocessResult<Option<&'a str>> {
    match attributes.get(name) {
        None => Ok(None),
        Some(AttributeValue::Text(value)) => Ok(Some(value.as_str())),
        Some(AttributeValue::Flag(_)) => Err(PreprocessError::InvalidAttribute {
            name: name.to_string(),
        }),
    }
}

/// Kind of block inside a component file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Markup,
    Script,
    Style,
}

impl BlockKind {
    /// The language the host compiler consumes for this block kind.
    pub const fn target_language(self) -> &'static str {
        match self {
            BlockKind::Markup => "html",
            BlockKind::Script => "javascript",
            BlockKind::Style => "css",
        }
    }
}

/// 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    #[default]
    Error,
    Warning,
    Info,
}

/// A diagnostic reported by a stage (typically a type checker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    #[serde(default)]
    pub severity: DiagnosticSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Position>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: DiagnosticSeverity::Error,
            code: None,
            start: None,
            end: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            ..Self::error(message)
        }
    }
}

/// Output of one stage, and of a whole block pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Processed {
    /// Transformed code
    pub code: String,

    /// Map from `code` back to the stage input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<SourceMap>,

    /// Files the output depends on (for watch mode)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,

    /// Updated tag attributes, e.g. announcing `lang="ts"` output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

impl Processed {
    /// A result carrying only code.
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn with_map(mut self, map: SourceMap) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<PathBuf>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// The `lang` announced by the result attributes, if any.
    pub fn announced_language(&self) -> Option<&str> {
        match self.attributes.as_ref()?.get("lang")? {
            AttributeValue::Text(lang) => Some(lang.as_str()),
            AttributeValue::Flag(_) => None,
        }
    }
}

/// A block handed to the preprocessor by the host.
///
/// Tag extraction happens outside this crate: `content` is the text between
/// the tags, `markup` the whole file, and `dependencies` any files already
/// pulled in (for instance through a `src` attribute).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreprocessInput {
    pub content: String,
    pub markup: String,
    pub filename: Option<PathBuf>,
    pub attributes: Attributes,
    pub dependencies: Vec<PathBuf>,
    /// Byte offset of `content` inside `markup`, when the host knows it.
    /// Otherwise the block is searched for in the markup.
    pub content_offset: Option<usize>,
}

impl PreprocessInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = markup.into();
        self
    }

    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<PathBuf>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_content_offset(mut self, offset: usize) -> Self {
        self.content_offset = Some(offset);
        self
    }
}

/// A block whose language has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Canonical language, e.g. `typescript`.
    pub lang: String,
    /// Name as written by the author, e.g. `ts`.
    pub alias: String,
    /// Canonical language the author declared, `None` when defaulted.
    pub declared: Option<String>,
}
