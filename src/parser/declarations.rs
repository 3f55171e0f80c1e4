//==================================================
// File: parser/declarations.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: One-shot declaration consumers
// Objective: Register `var`/`let`/`const` bindings, read function and method
//            heads, and locate class bodies, each reporting tokens consumed
//==================================================

use std::ops::Range;

use super::{BlockError, Cursor, parse_parameters};
use crate::registry::{Scope, VariableError};
use crate::tokenizer::Token;
use crate::value::Instance;

//==================================================
// Section 1.0 - Variable Declarations
//==================================================

/// Parses `var a, b = expr, c = nil` style statements.
///
/// Entries are registered one at a time, so later initialisers can read
/// earlier names. Initialisers are evaluated by the caller through
/// `resolve`, which receives the index of the first expression token and
/// returns the value plus tokens consumed. The trailing `;` is left in place.
pub struct VariableParser<'t> {
    cursor: Cursor<'t>,
}

impl<'t> VariableParser<'t> {
    pub fn new(tokens: &'t [Token], end: usize) -> Self {
        Self {
            cursor: Cursor::new(tokens, 0..end),
        }
    }

    pub fn parse<E, F>(&self, start: usize, scope: &Scope, mut resolve: F) -> Result<usize, E>
    where
        E: From<BlockError> + From<VariableError>,
        F: FnMut(usize) -> Result<(Option<Instance>, usize), E>,
    {
        let constant = match self.cursor.get(start) {
            Some(Token::VariableDefinition) => false,
            Some(Token::ConstantDefinition) => true,
            other => return Err(BlockError::expected("'var', 'let' or 'const'", other).into()),
        };

        let mut position = start + 1;
        loop {
            let name = match self.cursor.get(position) {
                Some(Token::Variable(name)) => name.clone(),
                other => return Err(BlockError::expected("variable name", other).into()),
            };
            position += 1;

            let mut value = None;
            if self.cursor.check(position, &Token::Assign) {
                position += 1;
                if self.cursor.check(position, &Token::Nil) {
                    position += 1;
                } else {
                    let (resolved, consumed) = resolve(position)?;
                    value = resolved;
                    position += consumed;
                }
            }

            if constant {
                scope.borrow_mut().register_constant(&name, value)?;
            } else {
                scope.borrow_mut().register_variable(&name, value)?;
            }

            if self.cursor.check(position, &Token::Comma) {
                position += 1;
            } else {
                break;
            }
        }

        Ok(position - start)
    }
}

//==================================================
// Section 2.0 - Function Heads
//==================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionHead {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Range<usize>,
    pub consumed: usize,
}

pub struct FunctionParser<'t> {
    cursor: Cursor<'t>,
}

impl<'t> FunctionParser<'t> {
    pub fn new(tokens: &'t [Token], end: usize) -> Self {
        Self {
            cursor: Cursor::new(tokens, 0..end),
        }
    }

    /// `func name() { .. }` or `func name(params) { .. }`.
    pub fn parse(&self, start: usize) -> Result<FunctionHead, BlockError> {
        self.cursor.expect(start, &Token::FunctionDefinition)?;
        let mut head = self.parse_head(start + 1)?;
        head.consumed += 1;
        Ok(head)
    }

    /// A head without the keyword, as used for `init(..) { .. }` in class bodies.
    pub fn parse_head(&self, start: usize) -> Result<FunctionHead, BlockError> {
        let (name, parameters, brace) = match self.cursor.get(start) {
            Some(Token::Function(name)) => (name.clone(), Vec::new(), start + 1),
            Some(Token::FunctionWithArguments(name)) => {
                let open = start + 1;
                self.cursor.expect(open, &Token::BracketOpen)?;
                let close = self.cursor.closing(open)?;
                let parameters = parse_parameters(name, self.cursor.tokens(), open + 1..close)?;
                (name.clone(), parameters, close + 1)
            }
            other => return Err(BlockError::expected("function name", other)),
        };
        self.cursor.expect(brace, &Token::BraceOpen)?;
        let close = self.cursor.closing(brace)?;
        Ok(FunctionHead {
            name,
            parameters,
            body: brace + 1..close,
            consumed: close + 1 - start,
        })
    }
}

//==================================================
// Section 3.0 - Class Heads
//==================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ClassHead {
    pub name: String,
    pub body: Range<usize>,
    pub consumed: usize,
}

pub struct ObjectTypeParser<'t> {
    cursor: Cursor<'t>,
}

impl<'t> ObjectTypeParser<'t> {
    pub fn new(tokens: &'t [Token], end: usize) -> Self {
        Self {
            cursor: Cursor::new(tokens, 0..end),
        }
    }

    pub fn parse(&self, start: usize) -> Result<ClassHead, BlockError> {
        self.cursor.expect(start, &Token::ClassDefinition)?;
        let name = match self.cursor.get(start + 1) {
            Some(Token::Variable(name)) => name.clone(),
            other => return Err(BlockError::expected("class name", other)),
        };
        let open = start + 2;
        self.cursor.expect(open, &Token::BraceOpen)?;
        let close = self.cursor.closing(open)?;
        Ok(ClassHead {
            name,
            body: open + 1..close,
            consumed: close + 1 - start,
        })
    }
}


//==================================================
// End of file
//==================================================
