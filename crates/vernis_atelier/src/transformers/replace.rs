//! `replace` - plain text substitution over the whole markup.
//!
//! Options are an ordered list of `[pattern, replacement]` pairs. A pattern
//! written as `/body/flags` is a regular expression; `g` replaces every
//! match, `i`, `m` and `s` map to the usual regex modes. Any other pattern
//! is a literal whose first occurrence is replaced.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::error::{PreprocessError, PreprocessResult};
use crate::transformer::{Transformer, TransformerArgs};
use crate::types::Processed;

const NAME: &str = "replace";

/// The built-in `replace` transformer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceTransformer;

#[async_trait]
impl Transformer for ReplaceTransformer {
    async fn transform(&self, args: TransformerArgs<'_>) -> PreprocessResult<Processed> {
        let Some(options) = args.options else {
            return Ok(Processed::code(args.content));
        };

        let mut code = args.content.to_string();
        for rule in parse_rules(options)? {
            code = rule.apply(&code);
        }

        Ok(Processed::code(code))
    }
}

#[derive(Debug)]
enum Pattern {
    Literal(String),
    Regex { regex: Regex, global: bool },
}

#[derive(Debug)]
struct Rule {
    pattern: Pattern,
    replacement: String,
}

impl Rule {
    fn apply(&self, input: &str) -> String {
        match &self.pattern {
            Pattern::Literal(literal) => input.replacen(literal.as_str(), &self.replacement, 1),
            Pattern::Regex { regex, global: true } => {
                regex.replace_all(input, self.replacement.as_str()).into_owned()
            }
            Pattern::Regex { regex, global: false } => {
                regex.replace(input, self.replacement.as_str()).into_owned()
            }
        }
    }
}

fn parse_rules(options: &Value) -> PreprocessResult<Vec<Rule>> {
    let Value::Array(entries) = options else {
        return Err(PreprocessError::transform(
            NAME,
            "options must be a list of [pattern, replacement] pairs",
        ));
    };

    entries
        .iter()
        .map(|entry| match entry.as_array().map(Vec::as_slice) {
            Some([Value::String(pattern), Value::String(replacement)]) => {
                parse_rule(pattern, replacement)
            }
            _ => Err(PreprocessError::transform(
                NAME,
                format!("invalid rule {entry}, expected [pattern, replacement]"),
            )),
        })
        .collect()
}

fn parse_rule(pattern: &str, replacement: &str) -> PreprocessResult<Rule> {
    let Some((body, flags)) = split_regex_literal(pattern) else {
        return Ok(Rule {
            pattern: Pattern::Literal(pattern.to_string()),
            replacement: replacement.to_string(),
        });
    };

    let regex = RegexBuilder::new(body)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map_err(|e| PreprocessError::transform(NAME, format!("invalid pattern {pattern}: {e}")))?;

    Ok(Rule {
        pattern: Pattern::Regex {
            regex,
            global: flags.contains('g'),
        },
        replacement: expand_replacement(replacement),
    })
}

/// Split `/body/flags` into body and flags.
fn split_regex_literal(pattern: &str) -> Option<(&str, &str)> {
    let rest = pattern.strip_prefix('/')?;
    let close = rest.rfind('/')?;
    let (body, flags) = (&rest[..close], &rest[close + 1..]);
    if body.is_empty() || !flags.chars().all(|c| "gimsuy".contains(c)) {
        return None;
    }
    Some((body, flags))
}

/// Rewrite `$&`, `$1` and `$<name>` references into the `${..}` form.
fn expand_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                out.push_str("$$");
            }
            Some('&') => {
                chars.next();
                out.push_str("${0}");
            }
            Some(d) if d.is_ascii_digit() => {
                out.push_str("${");
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    out.push(d);
                    chars.next();
                }
                out.push('}');
            }
            Some('<') => {
                chars.next();
                out.push_str("${");
                for n in chars.by_ref() {
                    if n == '>' {
                        break;
                    }
                    out.push(n);
                }
                out.push('}');
            }
            // A lone `$` is literal in the source syntax.
            _ => out.push_str("$$"),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attributes;
    use serde_json::json;
    use vernis_carton::BlockOffset;

    async fn run(content: &str, options: Value) -> PreprocessResult<Processed> {
        let attributes = Attributes::default();
        ReplaceTransformer
            .transform(TransformerArgs {
                content,
                markup: Some(content),
                filename: None,
                map: None,
                attributes: &attributes,
                options: Some(&options),
                offset: BlockOffset::default(),
            })
            .await
    }

    #[tokio::test]
    async fn test_literal_replaces_first_occurrence() {
        let out = run("a-a-a", json!([["a", "b"]])).await.unwrap();
        assert_eq!(out.code, "b-a-a");
    }

    #[tokio::test]
    async fn test_regex_global_and_flags() {
        let out = run("Foo foo FOO", json!([["/foo/gi", "bar"]])).await.unwrap();
        assert_eq!(out.code, "bar bar bar");

        let out = run("Foo foo", json!([["/foo/", "bar"]])).await.unwrap();
        assert_eq!(out.code, "Foo bar");
    }

    #[tokio::test]
    async fn test_rules_apply_in_order() {
        let out = run(
            "process.env.NODE_ENV",
            json!([["process.env.NODE_ENV", "'production'"], ["/'(\\w+)'/", "\"$1\""]]),
        )
        .await
        .unwrap();
        assert_eq!(out.code, "\"production\"");
    }

    #[tokio::test]
    async fn test_invalid_rule() {
        assert!(run("x", json!([["only-one"]])).await.is_err());
        assert!(run("x", json!({ "a": "b" })).await.is_err());
        assert!(run("x", json!([["/(/g", "y"]])).await.is_err());
    }

    #[test]
    fn test_split_regex_literal() {
        assert_eq!(split_regex_literal("/a+/g"), Some(("a+", "g")));
        assert_eq!(split_regex_literal("/a/b/"), Some(("a/b", "")));
        assert_eq!(split_regex_literal("/usr/local"), None);
        assert_eq!(split_regex_literal("plain"), None);
        assert_eq!(split_regex_literal("//"), None);
    }

    #[test]
    fn test_expand_replacement() {
        assert_eq!(expand_replacement("[$&]"), "[${0}]");
        assert_eq!(expand_replacement("$1a"), "${1}a");
        assert_eq!(expand_replacement("$<word>!"), "${word}!");
        assert_eq!(expand_replacement("$$ and $"), "$$ and $$");
    }
}
