//==================================================
// File: interpreter/errors.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Runtime error taxonomy and the host-visible error channel
// Objective: Wrap every component error in RuntimeError and expose a single
//            coded ScriptError to embedders
//==================================================

use thiserror::Error;

use crate::parser::BlockError;
use crate::registry::{FunctionError, VariableError};
use crate::tokenizer::LexError;
use crate::value::ValueType;

//==================================================
// Section 1.0 - Evaluator Errors
//==================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArithmeticError {
    #[error("expected a value, found {0}")]
    NoValue(String),
    #[error("operator '{0}' is missing its right operand")]
    DanglingOperator(String),
    #[error("unexpected {0} in expression")]
    UnexpectedToken(String),
    #[error("cannot combine {expected} with {found}")]
    TypeMismatch { expected: ValueType, found: String },
    #[error("operator '{operator}' is not supported for {operand}")]
    UnsupportedOperator {
        operator: &'static str,
        operand: ValueType,
    },
    #[error("class instance '{0}' cannot be used as an operand")]
    ObjectOperand(String),
    #[error("expression produced no value")]
    VoidOperand,
    #[error("integer overflow")]
    Overflow,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConditionError {
    #[error("empty condition")]
    Empty,
    #[error("'=' assigns a value, did you mean '=='?")]
    Assignment,
    #[error("mixing '&&' and '||' in one condition is not implemented")]
    MixedLogical,
    #[error("unsupported condition shape: {0}")]
    UnsupportedShape(String),
    #[error("condition must be a bool, found {0}")]
    NotBoolean(String),
    #[error("cannot compare {left} with {right}")]
    TagMismatch { left: String, right: String },
    #[error("ordering requires two integers or two floats, found {left} and {right}")]
    NotComparable { left: String, right: String },
    #[error("condition operand produced no value")]
    VoidOperand,
}

//==================================================
// Section 2.0 - Runtime Error
//==================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error(transparent)]
    Variable(#[from] VariableError),
    #[error(transparent)]
    Function(#[from] FunctionError),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
    #[error(transparent)]
    Condition(#[from] ConditionError),
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("execution aborted: {0}")]
    Abort(String),
}

impl RuntimeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RuntimeError::Lex(_) => ErrorCode::Lex,
            RuntimeError::Block(_) => ErrorCode::BlockStructure,
            RuntimeError::Variable(_) => ErrorCode::Variable,
            RuntimeError::Function(_) => ErrorCode::Function,
            RuntimeError::Arithmetic(_) => ErrorCode::Arithmetic,
            RuntimeError::Condition(_) => ErrorCode::Condition,
            RuntimeError::Syntax(_) => ErrorCode::Syntax,
            RuntimeError::Abort(_) => ErrorCode::Abort,
        }
    }
}

//==================================================
// Section 3.0 - Script Error
//==================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Lex,
    BlockStructure,
    Variable,
    Function,
    Arithmetic,
    Condition,
    Syntax,
    Abort,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Lex => "E001",
            ErrorCode::BlockStructure => "E002",
            ErrorCode::Variable => "E003",
            ErrorCode::Function => "E004",
            ErrorCode::Arithmetic => "E005",
            ErrorCode::Condition => "E006",
            ErrorCode::Syntax => "E007",
            ErrorCode::Abort => "E008",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error[{}]: {message}", .code.as_str())]
pub struct ScriptError {
    pub code: ErrorCode,
    pub message: String,
}

impl ScriptError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl From<RuntimeError> for ScriptError {
    fn from(value: RuntimeError) -> Self {
        ScriptError::new(value.code(), value.to_string())
    }
}

impl From<LexError> for ScriptError {
    fn from(value: LexError) -> Self {
        RuntimeError::from(value).into()
    }
}


//==================================================
// End of file
//==================================================
