//! Content preparation before the primary stage.

use serde_json::Value;
use vernis_carton::{flag, position::strip_indent};

use crate::options::TransformerOptions;

/// Block content as handed to the primary stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedContent {
    pub content: String,
    /// Indentation width removed by `stripIndent`.
    pub indentation: u32,
}

/// Apply `stripIndent` and `prependData` from the resolved options.
pub fn prepare_content(options: Option<&TransformerOptions>, content: &str) -> PreparedContent {
    let Some(options) = options.and_then(TransformerOptions::as_value) else {
        return PreparedContent {
            content: content.to_string(),
            indentation: 0,
        };
    };

    let (mut content, indentation) = if flag(Some(options), "stripIndent") {
        let stripped = strip_indent(content);
        (stripped.content, stripped.width as u32)
    } else {
        (content.to_string(), 0)
    };

    if let Some(Value::String(data)) = options.get("prependData") {
        content = format!("{data}\n{content}");
    }

    PreparedContent {
        content,
        indentation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_passthrough_without_options() {
        let prepared = prepare_content(None, "  a");
        assert_eq!(prepared.content, "  a");
        assert_eq!(prepared.indentation, 0);

        let prepared = prepare_content(Some(&TransformerOptions::Disabled), "  a");
        assert_eq!(prepared.content, "  a");
    }

    #[test]
    fn test_strip_indent() {
        let options = TransformerOptions::Options(json!({ "stripIndent": true }));
        let prepared = prepare_content(Some(&options), "\n    x := 1\n    y := 2\n");
        assert_eq!(prepared.content, "\nx := 1\ny := 2\n");
        assert_eq!(prepared.indentation, 4);
    }

    #[test]
    fn test_prepend_data() {
        let options = TransformerOptions::Options(json!({ "prependData": "@import 'vars';" }));
        let prepared = prepare_content(Some(&options), "a { color: red }");
        assert_eq!(prepared.content, "@import 'vars';\na { color: red }");
        assert_eq!(prepared.indentation, 0);
    }
}
