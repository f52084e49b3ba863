//! Block pipelines.
//!
//! Each block kind runs a short, strictly sequential chain of stages:
//!
//! - **markup**: optional `replace` pre-pass, then the markup language
//! - **script**: the declared language, then `typescript` when the first
//!   stage announced TypeScript output, then `babel` when configured
//! - **style**: the declared language, then `postcss` and `globalStyle`
//!   when postcss is available
//!
//! Stage results are folded into a [`StageAccumulator`]: code is replaced,
//! maps are chained, dependencies and diagnostics are concatenated.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use vernis_carton::{BlockOffset, FxHashSet};
use vernis_trame::{chain_source_maps, ChainOptions, MapInput, SourceMap};

use crate::config::PreprocessConfig;
use crate::error::PreprocessResult;
use crate::language::LanguageRegistry;
use crate::options::{LanguageSetting, OptionResolver, ResolveFlags, TransformerOptions};
use crate::prepare::prepare_content;
use crate::transformer::{TransformerArgs, TransformerRegistry};
use crate::types::{
    AttributeValue, Attributes, Block, BlockKind, Diagnostic, PreprocessInput, Processed,
};

/// Intermediate language that triggers the second script stage.
const PROMOTED_LANGUAGE: &str = "ts";

/// Answers whether an optional library is available to the host.
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    async fn has_dependency(&self, name: &str) -> bool;
}

/// A probe over a fixed set of installed names.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    installed: FxHashSet<String>,
}

impl StaticProbe {
    /// Probe reporting nothing as installed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.installed.insert(name.into());
        self
    }
}

#[async_trait]
impl CapabilityProbe for StaticProbe {
    async fn has_dependency(&self, name: &str) -> bool {
        self.installed.contains(name)
    }
}

/// Warning emitted when a style block asks for `global` but postcss is
/// missing.
pub fn global_attribute_warning(attributes: &Attributes) -> Option<&'static str> {
    attributes.contains_key("global").then_some(
        "'global' attribute found, but 'postcss' is not installed. \
         'postcss' is used to walk through the CSS and transform any necessary selector.",
    )
}

/// Result of the first stage of a block.
#[derive(Debug)]
struct PrimaryStage {
    processed: Processed,
    block: Block,
    /// Indentation removed before the stage ran.
    indentation: u32,
}

/// Fold of sequential stage results.
#[derive(Debug, Default)]
struct StageAccumulator {
    code: String,
    map: Option<SourceMap>,
    dependencies: Vec<PathBuf>,
    diagnostics: Vec<Diagnostic>,
    attributes: Option<Attributes>,
    /// Indentation not yet accounted for in `map`. Only non-zero while the
    /// original side of `map` is the stripped block.
    pending_indentation: u32,
}

impl StageAccumulator {
    fn new(first: PrimaryStage) -> Self {
        let Processed {
            code,
            map,
            dependencies,
            diagnostics,
            attributes,
        } = first.processed;

        Self {
            code,
            dependencies,
            diagnostics,
            pending_indentation: if map.is_some() { first.indentation } else { 0 },
            map,
            attributes,
        }
    }

    fn announced_language(&self) -> Option<&str> {
        match self.attributes.as_ref()?.get("lang")? {
            AttributeValue::Text(lang) => Some(lang.as_str()),
            AttributeValue::Flag(_) => None,
        }
    }

    /// Fold one more stage in.
    fn absorb(mut self, stage: Processed) -> PreprocessResult<Self> {
        let options = ChainOptions::with_indentation(self.pending_indentation);
        if stage.map.is_some() {
            self.pending_indentation = 0;
        }
        self.map = chain_source_maps(self.map.as_ref(), stage.map.map(MapInput::from), options)?;

        self.code = stage.code;
        self.dependencies.extend(stage.dependencies);
        self.diagnostics.extend(stage.diagnostics);
        if stage.attributes.is_some() {
            self.attributes = stage.attributes;
        }

        Ok(self)
    }

    fn finish(self) -> Processed {
        Processed {
            code: self.code,
            map: self.map,
            dependencies: self.dependencies,
            diagnostics: self.diagnostics,
            attributes: None,
        }
    }
}

/// Runs block pipelines against a fixed configuration.
///
/// All state is read-only after construction, so one preprocessor can serve
/// many blocks concurrently.
pub struct Preprocessor {
    resolver: OptionResolver,
    transformers: TransformerRegistry,
    probe: Arc<dyn CapabilityProbe>,
}

impl fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preprocessor")
            .field("resolver", &self.resolver)
            .field("transformers", &self.transformers)
            .finish_non_exhaustive()
    }
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig, transformers: TransformerRegistry) -> Self {
        let mut registry = LanguageRegistry::new();
        registry.add_alias(config.aliases);

        Self {
            resolver: OptionResolver::new(registry, config.transformers, config.source_map),
            transformers,
            probe: Arc::new(StaticProbe::new()),
        }
    }

    /// Use `probe` to decide whether the postcss stages can run.
    pub fn with_probe(mut self, probe: Arc<dyn CapabilityProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn resolver(&self) -> &OptionResolver {
        &self.resolver
    }

    /// Preprocess the markup of a component.
    pub async fn markup(&self, input: &PreprocessInput) -> PreprocessResult<Processed> {
        let replaced;
        let input = if self.resolver.is_configured("replace") {
            let options = self.resolver.setting("replace").map(LanguageSetting::to_options);
            let no_attributes = Attributes::default();
            let args = TransformerArgs {
                content: &input.content,
                markup: Some(&input.content),
                filename: input.filename.as_deref(),
                map: None,
                attributes: &no_attributes,
                options: None,
                offset: BlockOffset::default(),
            };
            let stage = self.run_stage("replace", options.as_ref(), args).await?;
            replaced = PreprocessInput {
                content: stage.code,
                ..input.clone()
            };
            &replaced
        } else {
            input
        };

        let primary = self.transform_block(BlockKind::Markup, input).await?;
        Ok(primary.processed)
    }

    /// Preprocess a script block.
    pub async fn script(&self, input: &PreprocessInput) -> PreprocessResult<Processed> {
        let primary = self.transform_block(BlockKind::Script, input).await?;
        let declared = primary.block.declared.clone();
        let mut acc = StageAccumulator::new(primary);

        if acc.announced_language() == Some(PROMOTED_LANGUAGE)
            && declared.as_deref() != Some("typescript")
            && self.resolver.is_configured("typescript")
        {
            tracing::debug!(declared = ?declared, "promoting script output through typescript");
            let options = self
                .resolver
                .resolve(Some("typescript"), None, ResolveFlags::default());
            let attributes = acc.attributes.clone().unwrap_or_default();
            let stage = self
                .run_stage(
                    "typescript",
                    options.as_ref(),
                    Self::stage_args(input, &acc, &attributes),
                )
                .await?;
            acc = acc.absorb(stage)?;
        }

        if self.resolver.is_configured("babel") {
            let options = self.resolver.resolve(Some("babel"), None, ResolveFlags::default());
            let attributes = acc
                .attributes
                .clone()
                .unwrap_or_else(|| input.attributes.clone());
            let stage = self
                .run_stage("babel", options.as_ref(), Self::stage_args(input, &acc, &attributes))
                .await?;
            acc = acc.absorb(stage)?;
        }

        Ok(acc.finish())
    }

    /// Preprocess a style block.
    pub async fn style(&self, input: &PreprocessInput) -> PreprocessResult<Processed> {
        let primary = self.transform_block(BlockKind::Style, input).await?;
        let mut acc = StageAccumulator::new(primary);

        if self.probe.has_dependency("postcss").await {
            if self.resolver.is_configured("postcss") {
                let registry = self.resolver.registry();
                let info = registry.language_of(&input.attributes)?;
                // Only a true alias (e.g. `sugarss` for `css`) contributes its
                // options to postcss.
                let alias = match (info.alias.as_deref(), info.lang.as_deref()) {
                    (Some(alias), Some(lang))
                        if alias != lang && registry.is_alias_of(alias, lang) =>
                    {
                        Some(alias)
                    }
                    _ => None,
                };
                let flags = ResolveFlags {
                    ignore_alias_override: true,
                };
                let options = self.resolver.resolve(Some("postcss"), alias, flags);
                let stage = self
                    .run_stage(
                        "postcss",
                        options.as_ref(),
                        Self::stage_args(input, &acc, &input.attributes),
                    )
                    .await?;
                acc = acc.absorb(stage)?;
            }

            let options = self
                .resolver
                .resolve(Some("globalStyle"), None, ResolveFlags::default());
            let stage = self
                .run_stage(
                    "globalStyle",
                    options.as_ref(),
                    Self::stage_args(input, &acc, &input.attributes),
                )
                .await?;
            acc = acc.absorb(stage)?;
        } else if let Some(warning) = global_attribute_warning(&input.attributes) {
            tracing::warn!("{warning}");
        }

        Ok(acc.finish())
    }

    /// Arguments for a stage after the first one.
    fn stage_args<'a>(
        input: &'a PreprocessInput,
        acc: &'a StageAccumulator,
        attributes: &'a Attributes,
    ) -> TransformerArgs<'a> {
        TransformerArgs {
            content: &acc.code,
            markup: Some(&input.markup),
            filename: input.filename.as_deref(),
            map: acc.map.as_ref(),
            attributes,
            options: None,
            offset: BlockOffset::default(),
        }
    }

    /// First stage of a block: resolve its language and run the matching
    /// transformer, unless it is already in the target language.
    async fn transform_block(
        &self,
        kind: BlockKind,
        input: &PreprocessInput,
    ) -> PreprocessResult<PrimaryStage> {
        let registry = self.resolver.registry();
        let info = registry.language_of(&input.attributes)?;
        let block = match (info.lang, info.alias) {
            (Some(lang), Some(alias)) => Block {
                kind,
                declared: Some(lang.clone()),
                lang,
                alias,
            },
            _ => {
                let alias = kind.target_language();
                Block {
                    kind,
                    lang: registry.canonical_for(alias).to_string(),
                    alias: alias.to_string(),
                    declared: None,
                }
            }
        };

        let options = self
            .resolver
            .resolve(Some(&block.lang), Some(&block.alias), ResolveFlags::default());
        let prepared = prepare_content(options.as_ref(), &input.content);
        // Searching the markup only finds the first block with this text.
        let located = match input.content_offset {
            Some(start) => BlockOffset::at(&input.markup, start, &input.content),
            None => BlockOffset::locate(&input.markup, &input.content),
        };
        let offset = BlockOffset::new(
            located.map(|block| block.script_tag_line).unwrap_or_default(),
            prepared.indentation,
        );

        let args = TransformerArgs {
            content: &prepared.content,
            markup: Some(&input.markup),
            filename: input.filename.as_deref(),
            map: None,
            attributes: &input.attributes,
            options: None,
            offset,
        };

        if block.lang == kind.target_language() {
            // An alias may still override the target path (e.g. `sugarss`).
            if let Some(TransformerOptions::Override(transformer)) = &options {
                if block.alias != block.lang {
                    tracing::debug!(alias = %block.alias, "running override for target language");
                    let processed = transformer
                        .transform(TransformerArgs {
                            markup: None,
                            ..args
                        })
                        .await?;
                    return Ok(PrimaryStage {
                        processed,
                        block,
                        indentation: prepared.indentation,
                    });
                }
            }

            tracing::debug!(lang = %block.lang, "block already in target language");
            return Ok(PrimaryStage {
                processed: Processed::code(prepared.content.as_str())
                    .with_dependencies(input.dependencies.clone()),
                block,
                indentation: prepared.indentation,
            });
        }

        tracing::debug!(
            lang = %block.lang,
            alias = %block.alias,
            kind = ?kind,
            "running primary stage"
        );
        let mut processed = self.run_stage(&block.lang, options.as_ref(), args).await?;
        let mut dependencies = input.dependencies.clone();
        dependencies.append(&mut processed.dependencies);
        processed.dependencies = dependencies;

        Ok(PrimaryStage {
            processed,
            block,
            indentation: prepared.indentation,
        })
    }

    /// Dispatch one stage.
    ///
    /// Without options, or with the stage disabled, the content passes
    /// through unchanged.
    async fn run_stage(
        &self,
        name: &str,
        options: Option<&TransformerOptions>,
        args: TransformerArgs<'_>,
    ) -> PreprocessResult<Processed> {
        match options {
            None | Some(TransformerOptions::Disabled) => {
                tracing::debug!(stage = name, "stage skipped");
                Ok(Processed::code(args.content))
            }
            Some(TransformerOptions::Override(transformer)) => {
                transformer
                    .transform(TransformerArgs {
                        markup: None,
                        options: None,
                        ..args
                    })
                    .await
            }
            Some(resolved @ TransformerOptions::Options(_)) => {
                let transformer = self.transformers.get(name)?;
                transformer
                    .transform(TransformerArgs {
                        options: resolved.as_value(),
                        ..args
                    })
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vernis_trame::Segment;

    fn map_to(line: u32) -> SourceMap {
        SourceMap::from_mappings(
            vec!["App.svelte".into()],
            vec![],
            vec![],
            &[vec![Segment::mapped(0, 0, line, 0)]],
        )
    }

    fn primary(processed: Processed, indentation: u32) -> PrimaryStage {
        PrimaryStage {
            processed,
            block: Block {
                kind: BlockKind::Script,
                lang: "civet".into(),
                alias: "civet".into(),
                declared: Some("civet".into()),
            },
            indentation,
        }
    }

    #[test]
    fn test_accumulator_concatenates() {
        let first = Processed::code("a")
            .with_dependencies(vec!["a.ts".into()])
            .with_diagnostics(vec![Diagnostic::warning("first")]);
        let second = Processed::code("b")
            .with_dependencies(vec!["b.ts".into()])
            .with_diagnostics(vec![Diagnostic::warning("second")]);

        let out = StageAccumulator::new(primary(first, 0))
            .absorb(second)
            .unwrap()
            .finish();

        assert_eq!(out.code, "b");
        assert_eq!(out.dependencies, vec![PathBuf::from("a.ts"), PathBuf::from("b.ts")]);
        assert_eq!(out.diagnostics.len(), 2);
        assert_eq!(out.diagnostics[1].message, "second");
    }

    #[test]
    fn test_accumulator_keeps_earlier_attributes() {
        let mut attributes = Attributes::default();
        attributes.insert("lang".into(), "ts".into());

        let first = Processed::code("a").with_attributes(attributes);
        let acc = StageAccumulator::new(primary(first, 0))
            .absorb(Processed::code("b"))
            .unwrap();
        assert_eq!(acc.announced_language(), Some("ts"));
        assert_eq!(acc.finish().attributes, None);
    }

    #[test]
    fn test_indentation_used_once() {
        let acc = StageAccumulator::new(primary(Processed::code("a").with_map(map_to(1)), 2))
            .absorb(Processed::code("b").with_map(map_to(0)))
            .unwrap();
        assert_eq!(acc.pending_indentation, 0);

        let traced = acc.map.as_ref().unwrap().decode().unwrap();
        let original = traced[0][0].original.unwrap();
        assert_eq!((original.line, original.column), (1, 2));
    }

    #[test]
    fn test_missing_stage_map_keeps_previous() {
        let acc = StageAccumulator::new(primary(Processed::code("a").with_map(map_to(3)), 4))
            .absorb(Processed::code("b"))
            .unwrap();
        assert_eq!(acc.map, Some(map_to(3)));
        assert_eq!(acc.pending_indentation, 4);
    }

    #[test]
    fn test_indentation_dropped_without_primary_map() {
        let acc = StageAccumulator::new(primary(Processed::code("a"), 4));
        assert_eq!(acc.pending_indentation, 0);

        // The first map relates generated code to the primary output, which
        // is already unindented.
        let acc = acc
            .absorb(Processed::code("b").with_map(map_to(0)))
            .unwrap()
            .absorb(Processed::code("c").with_map(map_to(0)))
            .unwrap();
        let traced = acc.map.as_ref().unwrap().decode().unwrap();
        let original = traced[0][0].original.unwrap();
        assert_eq!((original.line, original.column), (0, 0));
    }

    #[test]
    fn test_global_attribute_warning() {
        let mut attributes = Attributes::default();
        assert_eq!(global_attribute_warning(&attributes), None);

        attributes.insert("global".into(), true.into());
        assert!(global_attribute_warning(&attributes)
            .unwrap()
            .contains("'postcss' is not installed"));
    }

    #[tokio::test]
    async fn test_static_probe() {
        let probe = StaticProbe::new().with("postcss");
        assert!(probe.has_dependency("postcss").await);
        assert!(!probe.has_dependency("sass").await);
    }
}
