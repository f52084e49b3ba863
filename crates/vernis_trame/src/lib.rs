//! # vernis_trame
//!
//! Trame - Source Map V3 weaving for Vernis.
//!
//! ## Name Origin
//!
//! **Trame** is the weft of a woven canvas: the threads that run across the
//! warp and hold the picture together. Every preprocessing stage produces a
//! source map, and `vernis_trame` weaves them into a single map that leads
//! from the final output back to the author's text.
//!
//! ## Architecture
//!
//! ```text
//!   SourceMap (JSON)  --decode-->  Mappings  --TraceMap-->  original position
//!        ^                                                        |
//!        +-------------------encode<-----chain_source_maps--------+
//! ```

mod chain;
mod error;
mod trace;
mod types;
pub mod vlq;

pub use chain::{chain_source_maps, ChainOptions, MapInput};
pub use error::{MapError, MapResult};
pub use trace::{TraceMap, TracedPosition};
pub use types::{Mappings, OriginalLocation, Segment, SourceMap};
