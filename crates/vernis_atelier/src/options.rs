//! Per-language option settings and their resolution.
//!
//! Precedence for a `(lang, alias)` pair, lowest first:
//!
//! 1. options configured for `lang`
//! 2. built-in defaults of `lang`, then of `alias`
//! 3. options configured for `alias` (only when it differs from `lang`)
//! 4. the source map property, when source maps are enabled
//!
//! A function override for the alias (then for the language) replaces all
//! of the above, and `false` on either side disables the stage.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use vernis_carton::{assign, set_prop, FxHashMap};

use crate::language::{source_map_prop, LanguageRegistry};
use crate::transformer::Transformer;

/// What the host configured for one language name.
#[derive(Clone)]
pub enum LanguageSetting {
    /// `true` enables the stage with defaults, `false` disables it.
    Enabled(bool),
    /// Structured options (an object, or a list for `replace`).
    Options(Value),
    /// Function replacing the built-in transformer.
    Override(Arc<dyn Transformer>),
}

impl LanguageSetting {
    /// Whether the setting asks for the stage to run.
    pub fn is_enabled(&self) -> bool {
        match self {
            LanguageSetting::Enabled(enabled) => *enabled,
            LanguageSetting::Options(value) => !value.is_null(),
            LanguageSetting::Override(_) => true,
        }
    }

    /// The setting as stage options, without any merging.
    pub fn to_options(&self) -> TransformerOptions {
        match self {
            LanguageSetting::Enabled(false) => TransformerOptions::Disabled,
            LanguageSetting::Enabled(true) => TransformerOptions::Options(Value::Null),
            LanguageSetting::Options(value) => TransformerOptions::Options(value.clone()),
            LanguageSetting::Override(transformer) => {
                TransformerOptions::Override(Arc::clone(transformer))
            }
        }
    }
}

impl fmt::Debug for LanguageSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageSetting::Enabled(enabled) => f.debug_tuple("Enabled").field(enabled).finish(),
            LanguageSetting::Options(value) => f.debug_tuple("Options").field(value).finish(),
            LanguageSetting::Override(_) => f.write_str("Override(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for LanguageSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(enabled) => LanguageSetting::Enabled(enabled),
            other => LanguageSetting::Options(other),
        })
    }
}

impl From<bool> for LanguageSetting {
    fn from(enabled: bool) -> Self {
        LanguageSetting::Enabled(enabled)
    }
}

impl From<Value> for LanguageSetting {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(enabled) => LanguageSetting::Enabled(enabled),
            other => LanguageSetting::Options(other),
        }
    }
}

/// Resolved options for one stage.
#[derive(Clone)]
pub enum TransformerOptions {
    /// Skip the stage; its input passes through.
    Disabled,
    /// Call this instead of the registered transformer.
    Override(Arc<dyn Transformer>),
    /// Options for the registered transformer.
    Options(Value),
}

impl TransformerOptions {
    /// Structured options, if any.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            TransformerOptions::Options(value) if !value.is_null() => Some(value),
            _ => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, TransformerOptions::Disabled)
    }

    pub fn is_override(&self) -> bool {
        matches!(self, TransformerOptions::Override(_))
    }
}

impl fmt::Debug for TransformerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformerOptions::Disabled => f.write_str("Disabled"),
            TransformerOptions::Override(_) => f.write_str("Override(..)"),
            TransformerOptions::Options(value) => f.debug_tuple("Options").field(value).finish(),
        }
    }
}

/// Flags for [`OptionResolver::resolve`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveFlags {
    /// Ignore a function override configured for the alias.
    pub ignore_alias_override: bool,
}

/// Merges configured settings, defaults and source map rules.
#[derive(Debug, Clone)]
pub struct OptionResolver {
    registry: LanguageRegistry,
    settings: FxHashMap<String, LanguageSetting>,
    source_map: bool,
}

impl OptionResolver {
    pub fn new(
        registry: LanguageRegistry,
        settings: FxHashMap<String, LanguageSetting>,
        source_map: bool,
    ) -> Self {
        Self {
            registry,
            settings,
            source_map,
        }
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// The raw setting for a name.
    pub fn setting(&self, name: &str) -> Option<&LanguageSetting> {
        self.settings.get(name)
    }

    /// Whether a setting for `name` exists and enables its stage.
    pub fn is_configured(&self, name: &str) -> bool {
        self.setting(name).is_some_and(LanguageSetting::is_enabled)
    }

    /// Resolve the options for a stage.
    ///
    /// Returns `None` when there is no language to transform.
    pub fn resolve(
        &self,
        lang: Option<&str>,
        alias: Option<&str>,
        flags: ResolveFlags,
    ) -> Option<TransformerOptions> {
        let lang = lang?;
        let lang_setting = self.setting(lang);
        let alias_setting = alias.and_then(|a| self.setting(a));

        if !flags.ignore_alias_override {
            if let Some(LanguageSetting::Override(transformer)) = alias_setting {
                return Some(TransformerOptions::Override(Arc::clone(transformer)));
            }
        }

        if let Some(LanguageSetting::Override(transformer)) = lang_setting {
            return Some(TransformerOptions::Override(Arc::clone(transformer)));
        }

        let disabled = |setting: Option<&LanguageSetting>| {
            matches!(setting, Some(LanguageSetting::Enabled(false)))
        };
        if disabled(lang_setting) || disabled(alias_setting) {
            return Some(TransformerOptions::Disabled);
        }

        Some(TransformerOptions::Options(Value::Object(
            self.merge(lang, alias, lang_setting, alias_setting),
        )))
    }

    fn merge(
        &self,
        lang: &str,
        alias: Option<&str>,
        lang_setting: Option<&LanguageSetting>,
        alias_setting: Option<&LanguageSetting>,
    ) -> Map<String, Value> {
        let mut options = Map::new();

        if let Some(LanguageSetting::Options(value)) = lang_setting {
            assign(&mut options, value);
        }

        options.extend(self.registry.defaults_for(lang));
        if let Some(alias) = alias {
            options.extend(self.registry.defaults_for(alias));
        }

        if alias.is_some_and(|a| a != lang) {
            if let Some(LanguageSetting::Options(value)) = alias_setting {
                assign(&mut options, value);
            }
        }

        if self.source_map {
            if let Some((path, value)) = source_map_prop(lang) {
                set_prop(&mut options, path, value);
            }
        }

        options
    }
}
