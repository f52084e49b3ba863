//! # vernis_atelier
//!
//! Atelier - The block preprocessing workshop for Vernis.
//!
//! ## Name Origin
//!
//! An **atelier** is the workshop where a painting is prepared before it is
//! shown: canvases are primed, layers are laid down one after another, and
//! the finishing varnish goes on last. `vernis_atelier` does the same for the
//! markup, script and style blocks of a component file, running each block
//! through the compilers it needs until it is written in the host language.
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                       Preprocessor                          |
//! |   markup / script / style pipelines, StageAccumulator fold  |
//! +-------------------------------------------------------------+
//!        |                    |                      |
//!        v                    v                      v
//! +----------------+  +----------------+  +---------------------+
//! | LanguageRegistry| | OptionResolver |  | TransformerRegistry |
//! | aliases,        | | precedence,    |  | Transformer trait,  |
//! | defaults        | | overrides      |  | replace, civet      |
//! +----------------+  +----------------+  +---------------------+
//!                                                    |
//!                                                    v
//!                                         +---------------------+
//!                                         | ErrorLocationMapper |
//!                                         +---------------------+
//! ```
//!
//! Source maps of consecutive stages are chained with
//! [`vernis_trame::chain_source_maps`].
//!
//! ## Example
//!
//! ```
//! use vernis_atelier::{PreprocessConfig, PreprocessInput, Preprocessor, TransformerRegistry};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = PreprocessConfig::new().with_setting("replace", serde_json::json!([["@@", "42"]]));
//! let preprocessor = Preprocessor::new(config, TransformerRegistry::with_builtins());
//!
//! let out = preprocessor.markup(&PreprocessInput::new("<p>@@</p>")).await.unwrap();
//! assert_eq!(out.code, "<p>42</p>");
//! # }
//! ```

pub mod config;
mod error;
pub mod error_location;
pub mod language;
pub mod options;
pub mod pipeline;
mod prepare;
pub mod transformer;
pub mod transformers;
mod types;

pub use config::{discover_config, load_config, PreprocessConfig, CONFIG_FILE_NAME};
pub use error::{PositionedError, PreprocessError, PreprocessResult};
pub use error_location::{summarize_parse_message, CompilerParseError, ErrorLocationMapper};
pub use language::{LanguageInfo, LanguageRegistry};
pub use options::{LanguageSetting, OptionResolver, ResolveFlags, TransformerOptions};
pub use pipeline::{global_attribute_warning, CapabilityProbe, Preprocessor, StaticProbe};
pub use prepare::{prepare_content, PreparedContent};
pub use transformer::{Transformer, TransformerArgs, TransformerKind, TransformerRegistry};
pub use types::*;

pub use vernis_carton::BlockOffset;
pub use vernis_trame::SourceMap;
