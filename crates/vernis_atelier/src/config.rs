//! Configuration for the preprocessor.
//!
//! Reads `vernis.config.json`:
//!
//! ```json
//! {
//!   "aliases": [["tsx", "typescript"]],
//!   "sourceMap": true,
//!   "transformers": {
//!     "typescript": { "compilerOptions": { "target": "es2022" } },
//!     "babel": false,
//!     "replace": [["process.env.NODE_ENV", "'production'"]]
//!   }
//! }
//! ```
//!
//! Function overrides cannot be expressed in JSON and are attached with
//! [`PreprocessConfig::with_override`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use vernis_carton::FxHashMap;

use crate::error::{PreprocessError, PreprocessResult};
use crate::options::LanguageSetting;
use crate::transformer::Transformer;

/// File name looked up by [`discover_config`].
pub const CONFIG_FILE_NAME: &str = "vernis.config.json";

/// Top-level preprocessor configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", default)]
    pub schema: Option<String>,

    /// Extra `[alias, language]` pairs.
    #[serde(default)]
    pub aliases: Vec<(String, String)>,

    /// Ask every map-aware stage to emit a source map.
    #[serde(default)]
    pub source_map: bool,

    /// Per-language settings, keyed by language or alias name.
    #[serde(default)]
    pub transformers: FxHashMap<String, LanguageSetting>,
}

impl PreprocessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_map(mut self, source_map: bool) -> Self {
        self.source_map = source_map;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>, lang: impl Into<String>) -> Self {
        self.aliases.push((alias.into(), lang.into()));
        self
    }

    pub fn with_setting(
        mut self,
        name: impl Into<String>,
        setting: impl Into<LanguageSetting>,
    ) -> Self {
        self.transformers.insert(name.into(), setting.into());
        self
    }

    /// Replace the transformer for `name` with a custom one.
    pub fn with_override(
        mut self,
        name: impl Into<String>,
        transformer: Arc<dyn Transformer>,
    ) -> Self {
        self.transformers
            .insert(name.into(), LanguageSetting::Override(transformer));
        self
    }
}

/// Load a config file. Failures are errors.
pub fn load_config(path: &Path) -> PreprocessResult<PreprocessConfig> {
    let config_error = |message: String| PreprocessError::Config {
        path: path.to_path_buf(),
        message,
    };

    let content = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| config_error(e.to_string()))
}

/// Find the nearest `vernis.config.json` at or above `start`.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Load the nearest config at or above `start`.
///
/// Returns the default config when none is found or it cannot be loaded.
pub fn discover_config(start: &Path) -> PreprocessConfig {
    let Some(path) = find_config_file(start) else {
        return PreprocessConfig::default();
    };

    match load_config(&path) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        Err(e) => {
            tracing::warn!(error = %e, "ignoring config");
            PreprocessConfig::default()
        }
    }
}
