/// Argument binding: raw argument text + signature → positional and keyword strings.
///
/// Conversion to typed values happens later, in the converter chain.
use std::collections::HashMap;

use parley_core::ArgumentError;

use crate::signature::{ArityKind, Signature};
use crate::tokenizer::{tokenize, Token};

/// Unconverted bindings for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBinding {
    pub positional: Vec<String>,
    /// Keyword-rest capture; `None` when nothing was left for it.
    pub keyword: HashMap<String, Option<String>>,
}

impl RawBinding {
    fn positional(values: impl IntoIterator<Item = String>) -> Self {
        Self { positional: values.into_iter().collect(), keyword: HashMap::new() }
    }

    fn keyword(name: &str, value: Option<String>) -> Self {
        let mut keyword = HashMap::new();
        keyword.insert(name.to_string(), value);
        Self { positional: Vec::new(), keyword }
    }
}

/// Bind `input` against `signature`.
///
/// `passthrough` is set for commands that own subcommands: with an empty
/// signature the tokens are handed back instead of being dropped.
pub fn bind(input: &str, signature: &Signature, passthrough: bool) -> Result<RawBinding, ArgumentError> {
    let raw = input.trim();
    let tokens: Vec<Token<'_>> = tokenize(input).collect();
    let texts = || tokens.iter().map(|t| t.text.to_string());
    let params = signature.params();

    match params {
        [] => {
            if passthrough && !raw.is_empty() {
                return Ok(RawBinding::positional(texts()));
            }
            return Ok(RawBinding::default());
        }
        [only] => {
            return match only.kind {
                ArityKind::VariadicRest if raw.is_empty() => Ok(RawBinding::default()),
                ArityKind::VariadicRest => Ok(RawBinding::positional([raw.to_string()])),
                ArityKind::KeywordRest if raw.is_empty() => Ok(RawBinding::default()),
                ArityKind::KeywordRest => Ok(RawBinding::keyword(&only.name, Some(raw.to_string()))),
                ArityKind::Normal => match tokens.first() {
                    Some(token) => Ok(RawBinding::positional([token.text.to_string()])),
                    None if only.required => Err(ArgumentError::ArgumentCount { expected: 1, got: 0 }),
                    None => Ok(RawBinding::default()),
                },
            };
        }
        _ => {}
    }

    let required = signature.required_count();

    if signature.has_variadic() {
        if tokens.len() < required {
            return Err(ArgumentError::ArgumentCount { expected: required, got: tokens.len() });
        }
        return Ok(RawBinding::positional(texts()));
    }

    if signature.keyword_rest().is_none() {
        if tokens.len() == params.len() {
            return Ok(RawBinding::positional(texts()));
        }
        return Err(ArgumentError::ArgumentCount { expected: params.len(), got: tokens.len() });
    }

    // General case: walk the raw input so the keyword capture keeps its spacing and quotes.
    if raw.is_empty() {
        return Err(ArgumentError::EmptyInput);
    }

    let mut binding = RawBinding::default();
    let mut remaining = input;
    for (i, param) in params.iter().enumerate() {
        if param.kind == ArityKind::KeywordRest {
            let rest = remaining.trim();
            if rest.is_empty() && param.required {
                return Err(ArgumentError::ArgumentCount { expected: required, got: tokens.len() });
            }
            let value = (!rest.is_empty()).then(|| rest.to_string());
            binding.keyword.insert(param.name.clone(), value);
            break;
        }
        match tokens.get(i) {
            Some(token) => {
                binding.positional.push(token.text.to_string());
                remaining = &input[token.end..];
            }
            None if param.required => {
                return Err(ArgumentError::ArgumentCount { expected: required, got: tokens.len() });
            }
            None => {}
        }
    }
    Ok(binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Param;

    fn sig(params: Vec<Param>) -> Signature {
        Signature::new(params).unwrap()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_signature_drops_tokens() {
        let binding = bind("a b", &Signature::empty(), false).unwrap();
        assert_eq!(binding, RawBinding::default());
    }

    #[test]
    fn empty_signature_passes_tokens_through() {
        let binding = bind("sub x", &Signature::empty(), true).unwrap();
        assert_eq!(binding.positional, strings(&["sub", "x"]));
    }

    #[test]
    fn single_normal_takes_first_token() {
        let s = sig(vec![Param::new("a")]);
        assert_eq!(bind("one two", &s, false).unwrap().positional, strings(&["one"]));
        assert_eq!(
            bind("", &s, false).unwrap_err(),
            ArgumentError::ArgumentCount { expected: 1, got: 0 }
        );
    }

    #[test]
    fn single_optional_may_be_absent() {
        let s = sig(vec![Param::new("a").optional()]);
        assert_eq!(bind("  ", &s, false).unwrap(), RawBinding::default());
    }

    #[test]
    fn single_variadic_captures_raw_text() {
        let s = sig(vec![Param::new("text").variadic()]);
        let binding = bind(r#"say  "hi there""#, &s, false).unwrap();
        assert_eq!(binding.positional, strings(&[r#"say  "hi there""#]));
        assert_eq!(bind("", &s, false).unwrap(), RawBinding::default());
    }

    #[test]
    fn single_keyword_rest_captures_raw_text() {
        let s = sig(vec![Param::new("text").keyword_rest()]);
        let binding = bind("hello   world", &s, false).unwrap();
        assert_eq!(binding.keyword.get("text"), Some(&Some("hello   world".to_string())));
        assert!(binding.positional.is_empty());
    }

    #[test]
    fn exact_count_binds_positionally() {
        let s = sig(vec![Param::new("a"), Param::new("b")]);
        let binding = bind("1 2", &s, false).unwrap();
        assert_eq!(binding.positional, strings(&["1", "2"]));
        assert!(binding.keyword.is_empty());
    }

    #[test]
    fn quoted_tokens_bind_as_one() {
        let s = sig(vec![Param::new("a"), Param::new("b")]);
        let binding = bind(r#""hello world" 2"#, &s, false).unwrap();
        assert_eq!(binding.positional, strings(&["hello world", "2"]));
    }

    #[test]
    fn count_mismatch_fails() {
        let s = sig(vec![Param::new("a"), Param::new("b")]);
        assert_eq!(
            bind("1 2 3", &s, false).unwrap_err(),
            ArgumentError::ArgumentCount { expected: 2, got: 3 }
        );
        assert_eq!(
            bind("1", &s, false).unwrap_err(),
            ArgumentError::ArgumentCount { expected: 2, got: 1 }
        );
    }

    #[test]
    fn optional_params_still_need_a_token_without_a_rest() {
        let s = sig(vec![Param::new("a"), Param::new("b").default("x")]);
        assert_eq!(
            bind("1", &s, false).unwrap_err(),
            ArgumentError::ArgumentCount { expected: 2, got: 1 }
        );
        assert_eq!(bind("1 2", &s, false).unwrap().positional, strings(&["1", "2"]));
    }

    #[test]
    fn variadic_absorbs_remaining_tokens() {
        let s = sig(vec![Param::new("op"), Param::new("n").variadic()]);
        assert_eq!(bind("sum 1 2 3", &s, false).unwrap().positional, strings(&["sum", "1", "2", "3"]));
        assert_eq!(bind("sum", &s, false).unwrap().positional, strings(&["sum"]));
        assert_eq!(
            bind("", &s, false).unwrap_err(),
            ArgumentError::ArgumentCount { expected: 1, got: 0 }
        );
    }

    #[test]
    fn keyword_rest_keeps_original_text() {
        let s = sig(vec![Param::new("target"), Param::new("reason").keyword_rest().optional()]);
        let binding = bind("@user5 being rude", &s, false).unwrap();
        assert_eq!(binding.positional, strings(&["@user5"]));
        assert_eq!(binding.keyword.get("reason"), Some(&Some("being rude".to_string())));
    }

    #[test]
    fn keyword_rest_skips_past_quoted_tokens() {
        let s = sig(vec![Param::new("target"), Param::new("reason").keyword_rest()]);
        let binding = bind(r#""bad user"   "really" bad"#, &s, false).unwrap();
        assert_eq!(binding.positional, strings(&["bad user"]));
        assert_eq!(binding.keyword.get("reason"), Some(&Some(r#""really" bad"#.to_string())));
    }

    #[test]
    fn keyword_rest_may_be_empty() {
        let s = sig(vec![Param::new("target"), Param::new("reason").keyword_rest().optional()]);
        let binding = bind("@user5", &s, false).unwrap();
        assert_eq!(binding.keyword.get("reason"), Some(&None));
    }

    #[test]
    fn keyword_rest_rejects_blank_input() {
        let s = sig(vec![Param::new("target"), Param::new("reason").keyword_rest().optional()]);
        assert_eq!(bind("   ", &s, false).unwrap_err(), ArgumentError::EmptyInput);
    }

    #[test]
    fn keyword_rest_requires_leading_params() {
        let s = sig(vec![
            Param::new("a"),
            Param::new("b"),
            Param::new("rest").keyword_rest().optional(),
        ]);
        assert_eq!(
            bind("only", &s, false).unwrap_err(),
            ArgumentError::ArgumentCount { expected: 2, got: 1 }
        );
    }
}
