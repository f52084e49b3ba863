//! Transformer contract and the static transformer registry.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use vernis_carton::{BlockOffset, FxHashMap};
use vernis_trame::SourceMap;

use crate::error::{PreprocessError, PreprocessResult};
use crate::types::{Attributes, Processed};

/// Arguments handed to a transformer for one stage.
#[derive(Debug, Clone, Copy)]
pub struct TransformerArgs<'a> {
    /// Stage input.
    pub content: &'a str,
    /// The whole component file.
    pub markup: Option<&'a str>,
    pub filename: Option<&'a Path>,
    /// Map of the previous stage, if any.
    pub map: Option<&'a SourceMap>,
    pub attributes: &'a Attributes,
    /// Resolved options; `None` for function overrides.
    pub options: Option<&'a Value>,
    /// Where `content` sits in the file. Zero for generated input.
    pub offset: BlockOffset,
}

/// One compiler stage.
///
/// Implementations wrap a concrete compiler. A returned map is relative to
/// `args.content`; the pipeline chains it onto earlier stages.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, args: TransformerArgs<'_>) -> PreprocessResult<Processed>;
}

/// Languages with a transformer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformerKind {
    Babel,
    Civet,
    CoffeeScript,
    GlobalStyle,
    Less,
    Postcss,
    Pug,
    Replace,
    Scss,
    Stylus,
    Typescript,
}

impl TransformerKind {
    pub const ALL: [TransformerKind; 11] = [
        TransformerKind::Babel,
        TransformerKind::Civet,
        TransformerKind::CoffeeScript,
        TransformerKind::GlobalStyle,
        TransformerKind::Less,
        TransformerKind::Postcss,
        TransformerKind::Pug,
        TransformerKind::Replace,
        TransformerKind::Scss,
        TransformerKind::Stylus,
        TransformerKind::Typescript,
    ];

    /// Transformer for a canonical language name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            TransformerKind::Babel => "babel",
            TransformerKind::Civet => "civet",
            TransformerKind::CoffeeScript => "coffeescript",
            TransformerKind::GlobalStyle => "globalStyle",
            TransformerKind::Less => "less",
            TransformerKind::Postcss => "postcss",
            TransformerKind::Pug => "pug",
            TransformerKind::Replace => "replace",
            TransformerKind::Scss => "scss",
            TransformerKind::Stylus => "stylus",
            TransformerKind::Typescript => "typescript",
        }
    }
}

impl fmt::Display for TransformerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transformer implementations, fixed when the preprocessor is built.
#[derive(Clone, Default)]
pub struct TransformerRegistry {
    transformers: FxHashMap<TransformerKind, Arc<dyn Transformer>>,
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.transformers.keys().map(|k| k.name()).collect();
        kinds.sort_unstable();
        f.debug_struct("TransformerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

impl TransformerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the transformers implemented in this crate.
    pub fn with_builtins() -> Self {
        Self::new().with(
            TransformerKind::Replace,
            Arc::new(crate::transformers::ReplaceTransformer),
        )
    }

    /// Register (or replace) the transformer for `kind`.
    pub fn with(mut self, kind: TransformerKind, transformer: Arc<dyn Transformer>) -> Self {
        self.register(kind, transformer);
        self
    }

    pub fn register(&mut self, kind: TransformerKind, transformer: Arc<dyn Transformer>) {
        self.transformers.insert(kind, transformer);
    }

    pub fn contains(&self, kind: TransformerKind) -> bool {
        self.transformers.contains_key(&kind)
    }

    /// Transformer for a canonical language name.
    pub fn get(&self, name: &str) -> PreprocessResult<&Arc<dyn Transformer>> {
        TransformerKind::from_name(name)
            .and_then(|kind| self.transformers.get(&kind))
            .ok_or_else(|| PreprocessError::MissingTransformer {
                name: name.to_string(),
            })
    }
}
