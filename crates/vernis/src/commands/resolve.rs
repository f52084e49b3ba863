//! Resolve command - show how a block language is configured

use clap::Args;
use serde_json::{json, Value};
use std::path::PathBuf;
use vernis_atelier::{
    discover_config, load_config, OptionResolver, PreprocessConfig, Preprocessor, ResolveFlags,
    TransformerOptions, TransformerRegistry,
};

#[derive(Args)]
pub struct ResolveArgs {
    /// Language name as written in a `lang` attribute (e.g. `ts`, `sass`)
    pub alias: String,

    /// Config file path (defaults to the nearest vernis.config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: ResolveArgs) {
    let config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => std::env::current_dir()
            .map(|dir| discover_config(&dir))
            .unwrap_or_default(),
    };

    let report = resolve(config, &args.alias);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn resolve(config: PreprocessConfig, alias: &str) -> Value {
    let preprocessor = Preprocessor::new(config, TransformerRegistry::new());
    let resolver: &OptionResolver = preprocessor.resolver();
    let lang = resolver.registry().canonical_for(alias);

    let options = match resolver.resolve(Some(lang), Some(alias), ResolveFlags::default()) {
        Some(TransformerOptions::Options(value)) => value,
        Some(TransformerOptions::Disabled) => Value::Bool(false),
        Some(TransformerOptions::Override(_)) => Value::String("<function>".into()),
        None => Value::Null,
    };

    json!({
        "alias": alias,
        "lang": lang,
        "options": options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_builtin_alias() {
        let report = resolve(PreprocessConfig::new(), "sass");
        assert_eq!(
            report,
            json!({
                "alias": "sass",
                "lang": "scss",
                "options": { "indentedSyntax": true, "stripIndent": true },
            })
        );
    }

    #[test]
    fn test_resolve_with_config() {
        let config = PreprocessConfig::new()
            .with_alias("tsx", "typescript")
            .with_source_map(true)
            .with_setting("typescript", false);
        let report = resolve(config, "tsx");
        assert_eq!(report["lang"], json!("typescript"));
        assert_eq!(report["options"], json!(false));

        let report = resolve(PreprocessConfig::new().with_source_map(true), "ts");
        assert_eq!(report["options"], json!({ "sourceMap": true }));
    }
}
