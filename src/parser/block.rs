//==================================================
// File: parser/block.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Control construct decomposition
// Objective: Locate condition, body, else and clause ranges for if, while,
//            for, switch and bare blocks, and report how many tokens each
//            construct spans
//==================================================

use std::ops::Range;

use super::{BlockError, Cursor, describe, split_top_level, top_level_positions};
use crate::tokenizer::Token;

//==================================================
// Section 1.0 - Construct Shapes
//==================================================

#[derive(Debug, Clone, PartialEq)]
pub struct IfBlock {
    pub condition: Range<usize>,
    pub body: Range<usize>,
    /// Contents of `else { .. }`, or the whole nested `if` of an `else if`.
    pub else_body: Option<Range<usize>>,
    pub consumed: usize,
}

/// `while (condition) { body }`, or any `(..) { .. }` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopBlock {
    pub condition: Range<usize>,
    pub body: Range<usize>,
    pub consumed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForInit {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForBlock {
    pub init: ForInit,
    pub test: Range<usize>,
    pub step: Range<usize>,
    pub body: Range<usize>,
    pub consumed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub key: Token,
    pub body: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchBlock {
    pub control: Range<usize>,
    pub cases: Vec<SwitchCase>,
    pub default: Option<Range<usize>>,
    pub consumed: usize,
}

//==================================================
// Section 2.0 - Block Parser
//==================================================

pub struct BlockParser<'t> {
    cursor: Cursor<'t>,
}

impl<'t> BlockParser<'t> {
    pub fn new(tokens: &'t [Token], end: usize) -> Self {
        Self {
            cursor: Cursor::new(tokens, 0..end),
        }
    }

    /// `(` .. `)` followed by `{` .. `}`, starting at the opening bracket.
    /// Returns both inner ranges and the index just past the closing brace.
    fn condition_and_body(&self, open: usize) -> Result<(Range<usize>, Range<usize>, usize), BlockError> {
        self.cursor.expect(open, &Token::BracketOpen)?;
        let close = self.cursor.closing(open)?;
        let (body, next) = self.braced(close + 1)?;
        Ok((open + 1..close, body, next))
    }

    fn braced(&self, open: usize) -> Result<(Range<usize>, usize), BlockError> {
        self.cursor.expect(open, &Token::BraceOpen)?;
        let close = self.cursor.closing(open)?;
        Ok((open + 1..close, close + 1))
    }

    pub fn get_if_block(&self, start: usize) -> Result<IfBlock, BlockError> {
        self.cursor.expect(start, &Token::If)?;
        let (condition, body, mut next) = self.condition_and_body(start + 1)?;

        let mut else_body = None;
        if self.cursor.check(next, &Token::Else) {
            match self.cursor.get(next + 1) {
                Some(Token::BraceOpen) => {
                    let (range, after) = self.braced(next + 1)?;
                    else_body = Some(range);
                    next = after;
                }
                Some(Token::If) => {
                    let nested = self.get_if_block(next + 1)?;
                    let range = next + 1..next + 1 + nested.consumed;
                    next = range.end;
                    else_body = Some(range);
                }
                other => return Err(BlockError::expected("'{' or 'if' after else", other)),
            }
        }

        Ok(IfBlock {
            condition,
            body,
            else_body,
            consumed: next - start,
        })
    }

    pub fn get_while_block(&self, start: usize) -> Result<LoopBlock, BlockError> {
        self.cursor.expect(start, &Token::While)?;
        let (condition, body, next) = self.condition_and_body(start + 1)?;
        if self.cursor.check(next, &Token::Else) {
            return Err(BlockError::ElseAfterLoop("while"));
        }
        Ok(LoopBlock {
            condition,
            body,
            consumed: next - start,
        })
    }

    pub fn get_for_block(&self, start: usize) -> Result<ForBlock, BlockError> {
        self.cursor.expect(start, &Token::For)?;
        let (clauses, body, next) = self.condition_and_body(start + 1)?;
        if self.cursor.check(next, &Token::Else) {
            return Err(BlockError::ElseAfterLoop("for"));
        }

        let clauses = split_top_level(self.cursor.tokens(), clauses, &Token::Semicolon);
        let [init, test, step] = <[Range<usize>; 3]>::try_from(clauses)
            .map_err(|clauses| BlockError::ForClauses(clauses.len()))?;

        let init = match &self.cursor.tokens()[init] {
            [
                Token::VariableDefinition,
                Token::Variable(name),
                Token::Assign,
                Token::IntegerLiteral(value),
            ] => ForInit {
                name: name.clone(),
                value: *value,
            },
            _ => return Err(BlockError::ForInitializer),
        };

        Ok(ForBlock {
            init,
            test,
            step,
            body,
            consumed: next - start,
        })
    }

    /// `switch control { case <literal>: .. default: .. }` where the control is
    /// a single token or a parenthesised expression.
    pub fn get_switch_block(&self, start: usize) -> Result<SwitchBlock, BlockError> {
        self.cursor.expect(start, &Token::Switch)?;
        let (control, body_open) = match self.cursor.get(start + 1) {
            Some(Token::BracketOpen) => {
                let close = self.cursor.closing(start + 1)?;
                (start + 2..close, close + 1)
            }
            Some(_) => (start + 1..start + 2, start + 2),
            None => return Err(BlockError::expected("switch control value", None)),
        };
        let (body, next) = self.braced(body_open)?;

        let tokens = self.cursor.tokens();
        let markers = top_level_positions(tokens, body.clone(), |token| {
            matches!(token, Token::Case | Token::Default)
        });
        match markers.first() {
            Some(first) if *first == body.start => {}
            Some(_) => return Err(BlockError::expected("'case'", self.cursor.get(body.start))),
            None if body.is_empty() => {}
            None => return Err(BlockError::expected("'case'", self.cursor.get(body.start))),
        }

        let mut cases = Vec::new();
        let mut default = None;
        for (position, marker) in markers.iter().enumerate() {
            let segment_end = markers.get(position + 1).copied().unwrap_or(body.end);
            match &tokens[*marker] {
                Token::Case => {
                    let key = match self.cursor.get(*marker + 1) {
                        Some(token) if token.is_literal() => token.clone(),
                        other => return Err(BlockError::SwitchCaseKey(describe(other))),
                    };
                    self.cursor.expect(*marker + 2, &Token::Colon)?;
                    cases.push(SwitchCase {
                        key,
                        body: *marker + 3..segment_end,
                    });
                }
                _ => {
                    if default.is_some() {
                        return Err(BlockError::DuplicateDefault);
                    }
                    self.cursor.expect(*marker + 1, &Token::Colon)?;
                    default = Some(*marker + 2..segment_end);
                }
            }
        }

        Ok(SwitchBlock {
            control,
            cases,
            default,
            consumed: next - start,
        })
    }

    /// A bare `{ .. }` block. Returns its contents and tokens consumed.
    pub fn get_bare_block(&self, start: usize) -> Result<(Range<usize>, usize), BlockError> {
        let (body, next) = self.braced(start)?;
        Ok((body, next - start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn lex(source: &str) -> Vec<Token> {
        Tokenizer::new(source).tokenize().expect("tokenize")
    }

    #[test]
    fn test_if_else_extents() {
        let tokens = lex("var size = 8; if(true) { size = 4; } else { size = 2 }");
        let parser = BlockParser::new(&tokens, tokens.len());
        let block = parser.get_if_block(5).unwrap();
        assert_eq!(block.consumed, 16);
        assert_eq!(block.condition.len(), 1);
        assert_eq!(block.body.len(), 4);
        assert_eq!(block.else_body.map(|range| range.len()), Some(3));
    }

    #[test]
    fn test_else_if_chain_spans_nested_if() {
        let tokens = lex("if(a) { x() } else if(b) { y() } else { z() } w()");
        let parser = BlockParser::new(&tokens, tokens.len());
        let block = parser.get_if_block(0).unwrap();
        let else_body = block.else_body.unwrap();
        assert_eq!(tokens[else_body.start], Token::If);
        assert_eq!(block.consumed, tokens.len() - 1);
        assert_eq!(else_body.end, block.consumed);
    }

    #[test]
    fn test_if_requires_brackets() {
        let tokens = lex("if true { a = 1 }");
        let parser = BlockParser::new(&tokens, tokens.len());
        assert!(matches!(
            parser.get_if_block(0).unwrap_err(),
            BlockError::Expected { .. }
        ));
    }

    #[test]
    fn test_while_rejects_else() {
        let tokens = lex("while(true) { break } else { a = 1 }");
        let parser = BlockParser::new(&tokens, tokens.len());
        assert_eq!(
            parser.get_while_block(0).unwrap_err(),
            BlockError::ElseAfterLoop("while")
        );
    }

    #[test]
    fn test_for_clauses() {
        let tokens = lex("for(var i = 0; i <= 10; i++) { print(i) }");
        let parser = BlockParser::new(&tokens, tokens.len());
        let block = parser.get_for_block(0).unwrap();
        assert_eq!(
            block.init,
            ForInit {
                name: "i".into(),
                value: 0
            }
        );
        assert_eq!(block.test.len(), 3);
        assert_eq!(block.step.len(), 2);
        assert_eq!(block.consumed, tokens.len());
    }

    #[test]
    fn test_for_clause_count_and_initializer() {
        let tokens = lex("for(var i = 0; i < 3) { }");
        let parser = BlockParser::new(&tokens, tokens.len());
        assert_eq!(parser.get_for_block(0).unwrap_err(), BlockError::ForClauses(2));

        let tokens = lex("for(var i = 0.5; i < 3; i++) { }");
        let parser = BlockParser::new(&tokens, tokens.len());
        assert_eq!(parser.get_for_block(0).unwrap_err(), BlockError::ForInitializer);
    }

    #[test]
    fn test_switch_cases_and_default() {
        let tokens = lex("switch(x) { case 1: a() case 'two': b() break default: c() }");
        let parser = BlockParser::new(&tokens, tokens.len());
        let block = parser.get_switch_block(0).unwrap();
        assert_eq!(block.control.len(), 1);
        assert_eq!(block.cases.len(), 2);
        assert_eq!(block.cases[0].key, Token::IntegerLiteral(1));
        assert_eq!(block.cases[1].key, Token::StringLiteral("two".into()));
        assert_eq!(block.cases[1].body.len(), 2);
        assert_eq!(block.default.map(|range| range.len()), Some(1));
        assert_eq!(block.consumed, tokens.len());
    }

    #[test]
    fn test_switch_default_first_and_bare_control() {
        let tokens = lex("switch x { default: c() case true: b() }");
        let parser = BlockParser::new(&tokens, tokens.len());
        let block = parser.get_switch_block(0).unwrap();
        assert_eq!(block.control, 1..2);
        assert_eq!(block.default.map(|range| range.len()), Some(1));
        assert_eq!(block.cases[0].key, Token::BoolLiteral(true));
    }

    #[test]
    fn test_switch_rejects_variable_key() {
        let tokens = lex("switch(x) { case y: a() }");
        let parser = BlockParser::new(&tokens, tokens.len());
        assert!(matches!(
            parser.get_switch_block(0).unwrap_err(),
            BlockError::SwitchCaseKey(_)
        ));
    }

    #[test]
    fn test_bare_block() {
        let tokens = lex("{ var a = 1 } b()");
        let parser = BlockParser::new(&tokens, tokens.len());
        assert_eq!(parser.get_bare_block(0).unwrap(), (1..5, 6));
    }
}

//==================================================
// End of file
//==================================================
