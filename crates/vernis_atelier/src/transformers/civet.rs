//! Civet adapter.
//!
//! Civet compiles to TypeScript by default, so the result announces
//! `lang="ts"` and the script pipeline promotes it through the typescript
//! stage. The compiler itself is supplied by the host through
//! [`CivetCompiler`]; this module only shapes its options, normalizes its
//! output and remaps its parse errors.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use vernis_carton::{assign, flag};
use vernis_trame::SourceMap;

use crate::error::{PreprocessError, PreprocessResult};
use crate::error_location::{CompilerParseError, ErrorLocationMapper};
use crate::transformer::{Transformer, TransformerArgs};
use crate::types::{AttributeValue, Processed};

const NAME: &str = "civet";

/// Config files looked up next to (and above) the compiled file.
const CONFIG_FILE_NAMES: &[&str] = &["civetconfig.json", "civet.config.json"];

/// What a Civet compiler returned.
#[derive(Debug, Clone, PartialEq)]
pub enum CivetOutput {
    /// Plain code (possibly with an inline map comment).
    Code(String),
    /// Code with a separate V3 map.
    CodeWithMap { code: String, map: Option<SourceMap> },
    /// Anything else the compiler produced.
    Unexpected(Value),
}

/// Failure reported by a Civet compiler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CivetError {
    /// Parse error in block coordinates (1-based line and column).
    #[error("{message}")]
    Parse { message: String, line: u32, column: u32 },
    #[error("{0}")]
    Other(String),
}

/// A synchronous Civet compiler.
pub trait CivetCompiler: Send + Sync {
    fn compile(
        &self,
        source: &str,
        options: &Map<String, Value>,
    ) -> Result<CivetOutput, CivetError>;
}

/// Transformer running Civet through a [`CivetCompiler`].
#[derive(Debug, Clone)]
pub struct CivetTransformer<C> {
    compiler: C,
}

impl<C: CivetCompiler> CivetTransformer<C> {
    pub fn new(compiler: C) -> Self {
        Self { compiler }
    }

    fn compile_options(&self, args: &TransformerArgs<'_>) -> Map<String, Value> {
        let mut options = Map::new();
        options.insert(
            "filename".into(),
            args.filename
                .map(|f| Value::String(f.display().to_string()))
                .unwrap_or(Value::Null),
        );
        options.insert("js".into(), Value::Bool(false));

        if let Some(parse_options) = args.filename.and_then(discover_parse_options) {
            options.insert("parseOptions".into(), parse_options);
        }

        if let Some(user) = args.options {
            assign(&mut options, user);
        }
        for key in ["reportErrors", "summarizeErrors", "stripIndent", "prependData"] {
            options.remove(key);
        }
        options.insert("sync".into(), Value::Bool(true));
        options
    }
}

#[async_trait]
impl<C: CivetCompiler> Transformer for CivetTransformer<C> {
    async fn transform(&self, args: TransformerArgs<'_>) -> PreprocessResult<Processed> {
        let options = self.compile_options(&args);
        let enabled = |key: &str| options.get(key).and_then(Value::as_bool).unwrap_or(false);
        let js = enabled("js");
        let source_map = enabled("sourceMap");
        let inline_map = enabled("inlineMap");

        let mut attributes = args.attributes.clone();
        attributes.insert(
            "lang".into(),
            AttributeValue::from(if js { "js" } else { "ts" }),
        );

        let output = match self.compiler.compile(args.content, &options) {
            Ok(output) => output,
            Err(CivetError::Parse {
                message,
                line,
                column,
            }) => {
                let report =
                    args.options.and_then(|o| o.get("reportErrors")) != Some(&Value::Bool(false));
                let mapper = ErrorLocationMapper::new(args.offset)
                    .report_errors(report)
                    .summarize(flag(args.options, "summarizeErrors"));
                return mapper.map(CompilerParseError { message, line, column }, args.filename);
            }
            Err(CivetError::Other(message)) => {
                return Err(PreprocessError::transform(NAME, message));
            }
        };

        let processed = if source_map && !inline_map {
            match output {
                CivetOutput::CodeWithMap {
                    code,
                    map: Some(map),
                } if !code.is_empty() => Processed::code(code).with_map(map),
                other => {
                    tracing::warn!(
                        output = ?other,
                        "civet did not return code with a source map although one was requested"
                    );
                    Processed::code(fallback_code(other, args.content))
                }
            }
        } else if inline_map {
            match output {
                CivetOutput::Code(code) => {
                    tracing::warn!("civet inlineMap keeps the source map inside the code");
                    Processed::code(code)
                }
                other => {
                    tracing::warn!(
                        output = ?other,
                        "civet did not return plain code for inlineMap"
                    );
                    Processed::code(fallback_code(other, args.content))
                }
            }
        } else {
            match output {
                CivetOutput::Code(code) => Processed::code(code),
                other => {
                    tracing::warn!(output = ?other, "civet did not return plain code");
                    Processed::code(fallback_code(other, args.content))
                }
            }
        };

        Ok(processed.with_attributes(attributes))
    }
}

/// Best-effort code extraction from an unexpected output shape.
fn fallback_code(output: CivetOutput, input: &str) -> String {
    match output {
        CivetOutput::Code(code) => code,
        CivetOutput::CodeWithMap { code, .. } if !code.is_empty() => code,
        CivetOutput::CodeWithMap { .. } => input.to_string(),
        CivetOutput::Unexpected(value) => value
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| input.to_string()),
    }
}

/// `parseOptions` of the nearest Civet config file.
///
/// Failures are logged and treated as "no options".
fn discover_parse_options(filename: &Path) -> Option<Value> {
    let path = find_config_file(filename)?;

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read civet config");
            return None;
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(config) => config.get("parseOptions").cloned(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse civet config");
            None
        }
    }
}

fn find_config_file(filename: &Path) -> Option<PathBuf> {
    filename.parent()?.ancestors().find_map(|dir| {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}
