//==================================================
// File: parser/arguments.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Argument and parameter list splitting
// Objective: Break `( ... )` contents into per-entry ranges and read
//            parameter names, accepting Swift-style `_` labels
//==================================================

use std::ops::Range;

use super::{BlockError, describe, split_top_level};
use crate::tokenizer::Token;

/// Per-argument ranges of a call's bracket contents. Empty contents mean no arguments.
pub fn split_arguments(tokens: &[Token], inner: Range<usize>) -> Vec<Range<usize>> {
    if inner.is_empty() {
        return Vec::new();
    }
    split_top_level(tokens, inner, &Token::Comma)
}

/// Parameter names of a function head. Each entry is `name` or `label name`;
/// the bound name is always the last identifier.
pub fn parse_parameters(
    function: &str,
    tokens: &[Token],
    inner: Range<usize>,
) -> Result<Vec<String>, BlockError> {
    let mut parameters = Vec::new();
    for entry in split_arguments(tokens, inner) {
        let invalid = |found: Option<&Token>| BlockError::InvalidParameter {
            function: function.to_string(),
            found: describe(found),
        };
        let entry = &tokens[entry];
        if entry.is_empty() || entry.len() > 2 {
            return Err(invalid(entry.first()));
        }
        if let Some(other) = entry.iter().find(|token| !token.is_variable()) {
            return Err(invalid(Some(other)));
        }
        match entry.last() {
            Some(Token::Variable(name)) if name != "_" => parameters.push(name.clone()),
            other => return Err(invalid(other)),
        }
    }
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn lex(source: &str) -> Vec<Token> {
        Tokenizer::new(source).tokenize().expect("tokenize")
    }

    #[test]
    fn test_labelled_and_plain_parameters() {
        let tokens = lex("(_ licence, speed)");
        let names = parse_parameters("init", &tokens, 1..tokens.len() - 1).unwrap();
        assert_eq!(names, vec!["licence".to_string(), "speed".to_string()]);
    }

    #[test]
    fn test_bare_underscore_is_rejected() {
        let tokens = lex("(_)");
        let err = parse_parameters("init", &tokens, 1..2).unwrap_err();
        assert!(matches!(err, BlockError::InvalidParameter { .. }), "{err:?}");
    }

    #[test]
    fn test_literal_parameter_is_rejected() {
        let tokens = lex("(a, 3)");
        assert!(parse_parameters("f", &tokens, 1..tokens.len() - 1).is_err());
    }

    #[test]
    fn test_split_arguments_keeps_nested_calls_whole() {
        let tokens = lex("(1, add(2, 3), \"x\")");
        let parts = split_arguments(&tokens, 1..tokens.len() - 1);
        assert_eq!(parts.len(), 3);
        assert_eq!(&tokens[parts[2].clone()], &[Token::StringLiteral("x".into())]);
        assert!(split_arguments(&tokens, 1..1).is_empty());
    }
}

//==================================================
// End of file
//==================================================
