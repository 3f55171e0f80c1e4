//==================================================
// File: parser/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Structural helpers over the flat QuillScript token stream
// Objective: Provide the shared cursor, delimiter matching and the block and
//            declaration parsers that report each construct's extent
//==================================================

pub mod arguments;
pub mod block;
pub mod declarations;

use std::ops::Range;

use thiserror::Error;

use crate::tokenizer::Token;

pub use arguments::{parse_parameters, split_arguments};
pub use block::{BlockParser, ForBlock, ForInit, IfBlock, LoopBlock, SwitchBlock, SwitchCase};
pub use declarations::{ClassHead, FunctionHead, FunctionParser, ObjectTypeParser, VariableParser};

//==================================================
// Section 1.0 - Block Structure Errors
//==================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlockError {
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },
    #[error("unterminated '{0}'")]
    Unterminated(&'static str),
    #[error("'{0}' loops cannot have an else clause")]
    ElseAfterLoop(&'static str),
    #[error("for loops take exactly three clauses, found {0}")]
    ForClauses(usize),
    #[error("for loop initializer must be `var name = <integer>`")]
    ForInitializer,
    #[error("case key must be a literal, found {0}")]
    SwitchCaseKey(String),
    #[error("switch has more than one default branch")]
    DuplicateDefault,
    #[error("invalid parameter '{found}' in '{function}'")]
    InvalidParameter { function: String, found: String },
}

impl BlockError {
    pub(crate) fn expected(expected: impl Into<String>, found: Option<&Token>) -> Self {
        BlockError::Expected {
            expected: expected.into(),
            found: describe(found),
        }
    }
}

/// Human-readable token description for error messages.
pub(crate) fn describe(token: Option<&Token>) -> String {
    match token {
        Some(token) => format!("'{}'", token),
        None => "end of input".to_string(),
    }
}

//==================================================
// Section 2.0 - Cursor
//==================================================

/// A bounded position over a token stream. Indices are absolute, so ranges
/// handed out by the block parsers can be passed to nested interpreters
/// unchanged.
#[derive(Debug, Clone)]
pub struct Cursor<'t> {
    tokens: &'t [Token],
    position: usize,
    end: usize,
}

impl<'t> Cursor<'t> {
    pub fn new(tokens: &'t [Token], range: Range<usize>) -> Self {
        let end = range.end.min(tokens.len());
        Self {
            tokens,
            position: range.start.min(end),
            end,
        }
    }

    pub fn tokens(&self) -> &'t [Token] {
        self.tokens
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.end
    }

    pub fn peek(&self) -> Option<&'t Token> {
        self.get(self.position)
    }

    pub fn peek_at(&self, offset: usize) -> Option<&'t Token> {
        self.get(self.position + offset)
    }

    /// Token at an absolute index, `None` past the end of this cursor.
    pub fn get(&self, index: usize) -> Option<&'t Token> {
        if index < self.end {
            self.tokens.get(index)
        } else {
            None
        }
    }

    pub fn advance(&mut self, count: usize) {
        self.position = (self.position + count).min(self.end);
    }

    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.end);
    }

    pub fn check(&self, index: usize, expected: &Token) -> bool {
        self.get(index) == Some(expected)
    }

    pub fn expect(&self, index: usize, expected: &Token) -> Result<(), BlockError> {
        if self.check(index, expected) {
            Ok(())
        } else {
            Err(BlockError::expected(format!("'{}'", expected), self.get(index)))
        }
    }

    /// Index of the delimiter closing the one at `open`.
    pub fn closing(&self, open: usize) -> Result<usize, BlockError> {
        let (opening, closing, label) = match self.get(open) {
            Some(Token::BracketOpen) => (Token::BracketOpen, Token::BracketClose, "("),
            Some(Token::BraceOpen) => (Token::BraceOpen, Token::BraceClose, "{"),
            other => return Err(BlockError::expected("'(' or '{'", other)),
        };
        let mut depth = 0usize;
        for index in open..self.end {
            let token = &self.tokens[index];
            if *token == opening {
                depth += 1;
            } else if *token == closing {
                depth -= 1;
                if depth == 0 {
                    return Ok(index);
                }
            }
        }
        Err(BlockError::Unterminated(label))
    }
}

//==================================================
// Section 3.0 - Depth-aware Splitting
//==================================================

/// Nesting depth change contributed by a single token.
pub(crate) fn depth_delta(token: &Token) -> isize {
    match token {
        Token::BracketOpen | Token::BraceOpen => 1,
        Token::BracketClose | Token::BraceClose => -1,
        _ => 0,
    }
}

/// Split `range` on every `separator` found outside brackets and braces.
pub fn split_top_level(tokens: &[Token], range: Range<usize>, separator: &Token) -> Vec<Range<usize>> {
    let mut parts = Vec::new();
    let mut depth = 0isize;
    let mut start = range.start;
    for index in range.clone() {
        let token = &tokens[index];
        if depth == 0 && token == separator {
            parts.push(start..index);
            start = index + 1;
            continue;
        }
        depth += depth_delta(token);
    }
    parts.push(start..range.end);
    parts
}

/// Absolute indices of every token outside brackets and braces matching `predicate`.
pub fn top_level_positions<F>(tokens: &[Token], range: Range<usize>, predicate: F) -> Vec<usize>
where
    F: Fn(&Token) -> bool,
{
    let mut found = Vec::new();
    let mut depth = 0isize;
    for index in range {
        let token = &tokens[index];
        if depth == 0 && predicate(token) {
            found.push(index);
        }
        depth += depth_delta(token);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn lex(source: &str) -> Vec<Token> {
        Tokenizer::new(source).tokenize().expect("tokenize")
    }

    #[test]
    fn test_closing_handles_nesting() {
        let tokens = lex("{ if(a) { b() } } c");
        let cursor = Cursor::new(&tokens, 0..tokens.len());
        assert_eq!(cursor.closing(0).unwrap(), 8);
        assert_eq!(cursor.closing(2).unwrap(), 4);
    }

    #[test]
    fn test_closing_reports_unterminated() {
        let tokens = lex("{ a = 1");
        let cursor = Cursor::new(&tokens, 0..tokens.len());
        assert_eq!(cursor.closing(0).unwrap_err(), BlockError::Unterminated("{"));
    }

    #[test]
    fn test_cursor_respects_bounds() {
        let tokens = lex("a b c d");
        let mut cursor = Cursor::new(&tokens, 1..3);
        assert_eq!(cursor.peek(), Some(&Token::Variable("b".into())));
        assert_eq!(cursor.peek_at(2), None);
        cursor.advance(5);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_split_ignores_nested_separators() {
        let tokens = lex("a, f(b, c), d");
        let parts = split_top_level(&tokens, 0..tokens.len(), &Token::Comma);
        assert_eq!(parts, vec![0..1, 2..8, 9..10]);
    }
}

//==================================================
// End of file
//==================================================
