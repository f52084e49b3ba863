//! Language registry: alias resolution and per-language defaults.
//!
//! The alias table starts from the built-in entries below and may be
//! extended while the preprocessor is configured. After that it is only
//! read, so resolution is a pure function of the table.

use std::path::Path;

use phf::phf_map;
use serde_json::{json, Map, Value};
use vernis_carton::FxHashMap;

use crate::error::PreprocessResult;
use crate::types::{text_attribute, AttributeValue, Attributes};

/// Built-in alias table.
static DEFAULT_ALIASES: phf::Map<&'static str, &'static str> = phf_map! {
    "pcss" => "css",
    "postcss" => "css",
    "sugarss" => "css",
    "sss" => "css",
    "sass" => "scss",
    "styl" => "stylus",
    "js" => "javascript",
    "coffee" => "coffeescript",
    "ts" => "typescript",
    "civet" => "civet",
};

/// Built-in option defaults, keyed by canonical language or alias.
fn builtin_defaults(name: &str) -> Option<Value> {
    match name {
        "sass" => Some(json!({ "indentedSyntax": true, "stripIndent": true })),
        "pug" | "coffeescript" | "stylus" | "sugarss" | "civet" => {
            Some(json!({ "stripIndent": true }))
        }
        _ => None,
    }
}

/// Property each map-emitting language must set when source maps are on.
///
/// Returns the property path and the value to assign.
pub fn source_map_prop(lang: &str) -> Option<(&'static [&'static str], Value)> {
    match lang {
        "babel" => Some((&["sourceMaps"][..], Value::Bool(true))),
        "typescript" | "scss" | "coffeescript" | "globalStyle" | "civet" => {
            Some((&["sourceMap"][..], Value::Bool(true)))
        }
        "less" => Some((&["sourceMap"][..], Value::Object(Map::new()))),
        "stylus" => Some((&["sourcemap"][..], Value::Bool(true))),
        "postcss" => Some((&["map"][..], Value::Bool(true))),
        _ => None,
    }
}

/// Language declared by a block's attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageInfo {
    /// Canonical language.
    pub lang: Option<String>,
    /// Name as written.
    pub alias: Option<String>,
}

/// Alias-to-language table plus per-language default options.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    aliases: FxHashMap<String, String>,
    defaults: FxHashMap<String, Map<String, Value>>,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageRegistry {
    /// Registry seeded with the built-in aliases.
    pub fn new() -> Self {
        Self {
            aliases: DEFAULT_ALIASES
                .entries()
                .map(|(alias, lang)| ((*alias).to_string(), (*lang).to_string()))
                .collect(),
            defaults: FxHashMap::default(),
        }
    }

    /// Extend the alias table with `(alias, canonical language)` pairs.
    pub fn add_alias<I, A, L>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (A, L)>,
        A: Into<String>,
        L: Into<String>,
    {
        for (alias, lang) in entries {
            self.aliases.insert(alias.into(), lang.into());
        }
    }

    /// Replace the default options of a language or alias.
    pub fn set_defaults(&mut self, name: impl Into<String>, defaults: Map<String, Value>) {
        self.defaults.insert(name.into(), defaults);
    }

    /// Canonical language of `alias`, or `alias` itself when unregistered.
    pub fn canonical_for<'a>(&'a self, alias: &'a str) -> &'a str {
        self.aliases.get(alias).map(String::as_str).unwrap_or(alias)
    }

    /// Default options for a language or alias (empty when none registered).
    pub fn defaults_for(&self, name: &str) -> Map<String, Value> {
        if let Some(defaults) = self.defaults.get(name) {
            return defaults.clone();
        }
        match builtin_defaults(name) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Whether `alias` resolves to `lang`.
    pub fn is_alias_of(&self, alias: &str, lang: &str) -> bool {
        self.canonical_for(alias) == lang
    }

    /// Language declared by tag attributes.
    ///
    /// `lang` wins, then `type` (with a `text/` or `application/` prefix
    /// removed), then the extension of a local `src` path.
    pub fn language_of(&self, attributes: &Attributes) -> PreprocessResult<LanguageInfo> {
        let alias = if let Some(lang) = text_attribute(attributes, "lang")? {
            Some(lang.to_string())
        } else if let Some(ty) = text_attribute(attributes, "type")? {
            let stripped = ty
                .strip_prefix("text/")
                .or_else(|| ty.strip_prefix("application/"))
                .unwrap_or(ty);
            Some(stripped.to_string())
        } else {
            match attributes.get("src") {
                Some(AttributeValue::Text(src)) => src_extension(src),
                _ => None,
            }
        };

        Ok(LanguageInfo {
            lang: alias.as_deref().map(|a| self.canonical_for(a).to_string()),
            alias,
        })
    }
}

/// Extension of a local `src` path; remote URLs have no language.
fn src_extension(src: &str) -> Option<String> {
    if src.starts_with("//") || has_url_scheme(src) {
        return None;
    }
    let file_name = Path::new(src).file_name()?.to_str()?;
    let (_, extension) = file_name.rsplit_once('.')?;
    Some(extension.to_string())
}

fn has_url_scheme(src: &str) -> bool {
    match src.split_once(':') {
        Some((scheme, _)) => !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphabetic()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), AttributeValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_canonical_for_builtin_aliases() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.canonical_for("ts"), "typescript");
        assert_eq!(registry.canonical_for("sass"), "scss");
        assert_eq!(registry.canonical_for("pcss"), "css");
        assert_eq!(registry.canonical_for("civet"), "civet");
    }

    #[test]
    fn test_canonical_for_unknown_is_identity() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.canonical_for("elm"), "elm");
        assert_eq!(registry.canonical_for(""), "");
    }

    #[test]
    fn test_add_alias() {
        let mut registry = LanguageRegistry::new();
        registry.add_alias([("tsx", "typescript"), ("ts", "ts-custom")]);
        assert_eq!(registry.canonical_for("tsx"), "typescript");
        assert_eq!(registry.canonical_for("ts"), "ts-custom");
    }

    #[test]
    fn test_defaults_for() {
        let mut registry = LanguageRegistry::new();
        assert_eq!(
            Value::Object(registry.defaults_for("sass")),
            json!({ "indentedSyntax": true, "stripIndent": true })
        );
        assert!(registry.defaults_for("typescript").is_empty());

        let mut custom = Map::new();
        custom.insert("a".into(), json!(1));
        registry.set_defaults("typescript", custom);
        assert_eq!(Value::Object(registry.defaults_for("typescript")), json!({ "a": 1 }));
    }

    #[test]
    fn test_is_alias_of() {
        let registry = LanguageRegistry::new();
        assert!(registry.is_alias_of("sugarss", "css"));
        assert!(registry.is_alias_of("ts", "typescript"));
        assert!(!registry.is_alias_of("scss", "css"));
    }

    #[test]
    fn test_language_of_lang_attribute() {
        let registry = LanguageRegistry::new();
        let info = registry
            .language_of(&attrs(&[("lang", "ts"), ("type", "text/coffee")]))
            .unwrap();
        assert_eq!(info.alias.as_deref(), Some("ts"));
        assert_eq!(info.lang.as_deref(), Some("typescript"));
    }

    #[test]
    fn test_language_of_type_attribute() {
        let registry = LanguageRegistry::new();
        let info = registry.language_of(&attrs(&[("type", "text/coffee")])).unwrap();
        assert_eq!(info.alias.as_deref(), Some("coffee"));
        assert_eq!(info.lang.as_deref(), Some("coffeescript"));

        let info = registry.language_of(&attrs(&[("type", "application/typescript")])).unwrap();
        assert_eq!(info.lang.as_deref(), Some("typescript"));
    }

    #[test]
    fn test_language_of_src_attribute() {
        let registry = LanguageRegistry::new();
        let info = registry.language_of(&attrs(&[("src", "./styles/main.styl")])).unwrap();
        assert_eq!(info.lang.as_deref(), Some("stylus"));

        let remote = registry.language_of(&attrs(&[("src", "https://cdn/x.ts")])).unwrap();
        assert_eq!(remote, LanguageInfo::default());

        let protocol_relative = registry.language_of(&attrs(&[("src", "//cdn/x.ts")])).unwrap();
        assert_eq!(protocol_relative, LanguageInfo::default());

        let no_extension = registry.language_of(&attrs(&[("src", "./Makefile")])).unwrap();
        assert_eq!(no_extension, LanguageInfo::default());
    }

    #[test]
    fn test_language_of_flag_lang_is_error() {
        let registry = LanguageRegistry::new();
        let mut attributes = Attributes::default();
        attributes.insert("lang".into(), AttributeValue::Flag(true));
        assert!(registry.language_of(&attributes).is_err());
    }

    #[test]
    fn test_source_map_prop() {
        assert_eq!(source_map_prop("typescript"), Some((&["sourceMap"][..], json!(true))));
        assert_eq!(source_map_prop("less"), Some((&["sourceMap"][..], json!({}))));
        assert_eq!(source_map_prop("postcss"), Some((&["map"][..], json!(true))));
        assert_eq!(source_map_prop("pug"), None);
    }
}
