//! Composition of two sequential source maps.

use crate::error::MapResult;
use crate::trace::TraceMap;
use crate::types::{Segment, SourceMap};

/// Options for [`chain_source_maps`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainOptions {
    /// Indentation stripped from the original content before the first
    /// stage ran. Added back to every original column.
    pub indentation: u32,
}

impl ChainOptions {
    pub fn with_indentation(indentation: u32) -> Self {
        Self { indentation }
    }
}

/// The second map of a chain, either parsed or still serialized.
#[derive(Debug, Clone)]
pub enum MapInput {
    Map(SourceMap),
    Json(String),
}

impl MapInput {
    fn into_map(self) -> MapResult<SourceMap> {
        match self {
            MapInput::Map(map) => Ok(map),
            MapInput::Json(json) => SourceMap::from_json(&json),
        }
    }
}

impl From<SourceMap> for MapInput {
    fn from(map: SourceMap) -> Self {
        MapInput::Map(map)
    }
}

impl From<String> for MapInput {
    fn from(json: String) -> Self {
        MapInput::Json(json)
    }
}

impl From<&str> for MapInput {
    fn from(json: &str) -> Self {
        MapInput::Json(json.to_string())
    }
}

/// Chain `map1` (original -> intermediate) with `map2` (intermediate ->
/// final) into one map (original -> final).
///
/// When either map is absent the other one is returned unchanged. The result
/// attributes everything to `map1`'s sources, takes its names from `map2`,
/// and drops every `map2` segment whose intermediate position has no
/// original position in `map1`.
pub fn chain_source_maps(
    map1: Option<&SourceMap>,
    map2: Option<MapInput>,
    options: ChainOptions,
) -> MapResult<Option<SourceMap>> {
    let map2 = map2.map(MapInput::into_map).transpose()?;

    let (map1, map2) = match (map1, map2) {
        (Some(map1), Some(map2)) => (map1, map2),
        (None, map2) => return Ok(map2),
        (map1, None) => return Ok(map1.cloned()),
    };

    tracing::trace!(
        indentation = options.indentation,
        first = %map1.mappings,
        second = %map2.mappings,
        "chaining source maps"
    );

    let tracer = TraceMap::new(map1)?;
    let decoded = map2.decode()?;

    let mappings: Vec<Vec<Segment>> = decoded
        .iter()
        .map(|line| {
            line.iter()
                .filter_map(|segment| {
                    let intermediate = segment.original?;
                    let original =
                        tracer.original_position_for(intermediate.line, intermediate.column)?;
                    let chained = Segment::mapped(
                        segment.generated_column,
                        0,
                        original.line,
                        original.column + options.indentation,
                    );
                    Some(match intermediate.name {
                        Some(name) => chained.with_name(name),
                        None => chained,
                    })
                })
                .collect()
        })
        .collect();

    let chained = SourceMap::from_mappings(
        map1.sources.clone(),
        map1.sources_content.clone(),
        map2.names,
        &mappings,
    );

    tracing::trace!(mappings = %chained.mappings, "chained source map");

    Ok(Some(chained))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(source: &str, names: &[&str], lines: Vec<Vec<Segment>>) -> SourceMap {
        SourceMap::from_mappings(
            vec![source.to_string()],
            vec![Some(format!("// {source}"))],
            names.iter().map(|n| n.to_string()).collect(),
            &lines,
        )
    }

    #[test]
    fn test_identity_maps() {
        let a = map("a.civet", &[], vec![vec![Segment::mapped(0, 0, 0, 0)]]);
        let b = map("a.ts", &[], vec![vec![Segment::mapped(0, 0, 0, 0)]]);

        let chained = chain_source_maps(Some(&a), Some(b.into()), ChainOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(chained.version, 3);
        assert_eq!(chained.mappings, "AAAA");
        assert_eq!(chained.decode().unwrap(), vec![vec![Segment::mapped(0, 0, 0, 0)]]);
        insta::assert_snapshot!(
            chained.to_json().unwrap(),
            @r#"{"version":3,"sources":["a.civet"],"sourcesContent":["// a.civet"],"names":[],"mappings":"AAAA"}"#
        );
    }

    #[test]
    fn test_composes_through_intermediate() {
        // A: intermediate (0, 5) came from original (2, 3).
        let a = map("a.civet", &[], vec![vec![Segment::mapped(5, 0, 2, 3)]]);
        // B: final (0, 5) came from intermediate (0, 5).
        let b = map("a.ts", &[], vec![vec![Segment::mapped(5, 0, 0, 5)]]);

        let chained = chain_source_maps(Some(&a), Some(b.clone().into()), ChainOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(chained.decode().unwrap(), vec![vec![Segment::mapped(5, 0, 2, 3)]]);
        assert_eq!(chained.mappings, "KAEG");

        let indented =
            chain_source_maps(Some(&a), Some(b.into()), ChainOptions::with_indentation(2))
                .unwrap()
                .unwrap();
        assert_eq!(indented.decode().unwrap(), vec![vec![Segment::mapped(5, 0, 2, 5)]]);
    }

    #[test]
    fn test_sources_from_first_names_from_second() {
        let a = map("App.civet", &["first"], vec![vec![Segment::mapped(0, 0, 0, 0)]]);
        let b = map(
            "App.ts",
            &["second"],
            vec![vec![Segment::mapped(0, 0, 0, 0).with_name(0)]],
        );

        let chained = chain_source_maps(Some(&a), Some(b.into()), ChainOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(chained.sources, vec!["App.civet".to_string()]);
        assert_eq!(chained.sources_content, vec![Some("// App.civet".to_string())]);
        assert_eq!(chained.names, vec!["second".to_string()]);
        assert_eq!(
            chained.decode().unwrap(),
            vec![vec![Segment::mapped(0, 0, 0, 0).with_name(0)]]
        );
    }

    #[test]
    fn test_drops_unresolvable_segments() {
        let a = map("a.civet", &[], vec![vec![Segment::mapped(4, 0, 0, 0)]]);
        let b = map(
            "a.ts",
            &[],
            vec![
                vec![
                    Segment::unmapped(0),
                    Segment::mapped(1, 0, 0, 2),
                    Segment::mapped(3, 0, 0, 6),
                ],
                vec![Segment::mapped(0, 0, 7, 0)],
            ],
        );

        let chained = chain_source_maps(Some(&a), Some(b.into()), ChainOptions::default())
            .unwrap()
            .unwrap();

        // Lines are kept, unresolvable segments dropped.
        assert_eq!(
            chained.decode().unwrap(),
            vec![vec![Segment::mapped(3, 0, 0, 0)], vec![]]
        );
    }

    #[test]
    fn test_serialized_second_map() {
        let a = map("a.civet", &[], vec![vec![Segment::mapped(0, 0, 1, 4)]]);
        let json = r#"{"version":3,"sources":["a.ts"],"names":[],"mappings":"AAAA"}"#;

        let chained = chain_source_maps(Some(&a), Some(json.into()), ChainOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(chained.decode().unwrap(), vec![vec![Segment::mapped(0, 0, 1, 4)]]);
    }

    #[test]
    fn test_passthrough() {
        let a = map("a.civet", &[], vec![vec![Segment::mapped(0, 0, 0, 0)]]);

        let only_first = chain_source_maps(Some(&a), None, ChainOptions::default()).unwrap();
        assert_eq!(only_first, Some(a.clone()));

        let only_second =
            chain_source_maps(None, Some(a.clone().into()), ChainOptions::default()).unwrap();
        assert_eq!(only_second, Some(a));

        assert_eq!(chain_source_maps(None, None, ChainOptions::default()).unwrap(), None);
    }

    #[test]
    fn test_invalid_json() {
        let a = map("a.civet", &[], vec![]);
        let result = chain_source_maps(Some(&a), Some("{".into()), ChainOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_left_fold_of_three_maps() {
        let a = map("a.civet", &[], vec![vec![Segment::mapped(2, 0, 4, 1)]]);
        let b = map("a.ts", &[], vec![vec![Segment::mapped(0, 0, 0, 2)]]);
        let c = map("a.js", &[], vec![vec![], vec![Segment::mapped(6, 0, 0, 0)]]);

        let ab = chain_source_maps(Some(&a), Some(b.into()), ChainOptions::default())
            .unwrap()
            .unwrap();
        let abc = chain_source_maps(Some(&ab), Some(c.into()), ChainOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(abc.sources, vec!["a.civet".to_string()]);
        assert_eq!(abc.decode().unwrap(), vec![vec![], vec![Segment::mapped(6, 0, 4, 1)]]);
    }
}
