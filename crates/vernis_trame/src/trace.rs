//! Position lookup over a decoded source map.

use crate::error::MapResult;
use crate::types::{Mappings, SourceMap};

/// An original position resolved from a generated one (all 0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracedPosition {
    pub source: u32,
    pub line: u32,
    pub column: u32,
    pub name: Option<u32>,
}

/// Lookup structure answering "which original position produced this
/// generated position".
///
/// Segments of each line are kept sorted by generated column, and a lookup
/// picks the closest segment at or before the requested column.
#[derive(Debug, Clone)]
pub struct TraceMap {
    lines: Mappings,
}

impl TraceMap {
    /// Build the lookup for a map.
    pub fn new(map: &SourceMap) -> MapResult<Self> {
        Ok(Self::from_mappings(map.decode()?))
    }

    /// Build the lookup from already decoded mappings.
    pub fn from_mappings(mut lines: Mappings) -> Self {
        for line in &mut lines {
            // Stable, so segments sharing a column keep their order.
            line.sort_by_key(|segment| segment.generated_column);
        }
        Self { lines }
    }

    /// Resolve a generated position (0-based line and column).
    ///
    /// When several segments start at the matched column, an exact hit
    /// resolves to the first of them and a hit inside the segment to the
    /// last. Returns `None` when the line does not exist, when no segment
    /// starts at or before `column`, or when the matching segment has no
    /// original position.
    pub fn original_position_for(&self, line: u32, column: u32) -> Option<TracedPosition> {
        let segments = self.lines.get(line as usize)?;
        let upper = segments.partition_point(|s| s.generated_column <= column);
        if upper == 0 {
            return None;
        }

        let matched_column = segments[upper - 1].generated_column;
        let index = if matched_column == column {
            segments[..upper].partition_point(|s| s.generated_column < matched_column)
        } else {
            upper - 1
        };
        let original = segments[index].original?;

        Some(TracedPosition {
            source: original.source,
            line: original.line,
            column: original.column,
            name: original.name,
        })
    }
}
