//! Carton - The shared toolbox for Vernis.
//!
//! Vernis (French for *varnish*) is the coat applied to a component file
//! before the host compiler sees it: every embedded block written in a
//! foreign language is turned into the language the host expects. This
//! crate holds the small utilities every other Vernis crate leans on.
//!
//! # Modules
//!
//! - **general**: option-object helpers (nested property assignment)
//! - **position**: line/column arithmetic, indentation stripping and block offsets
//!
//! # Example
//!
//! ```
//! use vernis_carton::position::strip_indent;
//!
//! let stripped = strip_indent("    let a = 1;\n      let b = 2;");
//! assert_eq!(stripped.content, "let a = 1;\n  let b = 2;");
//! assert_eq!(stripped.width, 4);
//! ```

pub mod general;
pub mod position;

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

pub use general::*;
pub use position::{BlockOffset, StrippedContent};
