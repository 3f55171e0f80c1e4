//==================================================
// File: tokenizer.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: QuillScript token model and ordered-rule tokenizer
// Objective: Turn comment-free source text into the flat token stream the
//            interpreter walks directly
//==================================================

use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

use crate::value::Value;

//==================================================
// Section 1.0 - Token Model
//==================================================

/// All lexical units understood by QuillScript.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    StringLiteral(String),
    IntegerLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    Nil,

    // Identifiers and call heads
    Variable(String),
    /// `name()` with an empty argument list.
    Function(String),
    /// `name(`; always followed by an explicit [`Token::BracketOpen`].
    FunctionWithArguments(String),

    // Keywords
    If,
    Else,
    While,
    For,
    Switch,
    Case,
    Default,
    Break,
    Return,
    FunctionDefinition,
    ClassDefinition,
    VariableDefinition,
    ConstantDefinition,

    // Punctuation
    BracketOpen,
    BracketClose,
    BraceOpen,
    BraceClose,
    Comma,
    Semicolon,
    Colon,
    Dot,

    // Operators
    Assign,
    Plus,
    Minus,
    Increment,
    Decrement,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl Token {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::StringLiteral(_)
                | Token::IntegerLiteral(_)
                | Token::FloatLiteral(_)
                | Token::BoolLiteral(_)
        )
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Token::Function(_) | Token::FunctionWithArguments(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Token::Variable(_))
    }

    /// Comparison operators handled by the condition evaluator.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Token::Equal
                | Token::NotEqual
                | Token::Less
                | Token::Greater
                | Token::LessEqual
                | Token::GreaterEqual
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Token::And | Token::Or)
    }

    /// The runtime value carried by a literal token.
    pub fn literal_value(&self) -> Option<Value> {
        match self {
            Token::StringLiteral(text) => Some(Value::String(text.clone())),
            Token::IntegerLiteral(n) => Some(Value::Integer(*n)),
            Token::FloatLiteral(n) => Some(Value::Float(*n)),
            Token::BoolLiteral(b) => Some(Value::Bool(*b)),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::StringLiteral(text) => write!(f, "\"{}\"", text),
            Token::IntegerLiteral(n) => write!(f, "{}", n),
            Token::FloatLiteral(n) => write!(f, "{:?}", n),
            Token::BoolLiteral(b) => write!(f, "{}", b),
            Token::Nil => f.write_str("nil"),
            Token::Variable(name) => f.write_str(name),
            Token::Function(name) => write!(f, "{}()", name),
            Token::FunctionWithArguments(name) => write!(f, "{}(...)", name),
            Token::If => f.write_str("if"),
            Token::Else => f.write_str("else"),
            Token::While => f.write_str("while"),
            Token::For => f.write_str("for"),
            Token::Switch => f.write_str("switch"),
            Token::Case => f.write_str("case"),
            Token::Default => f.write_str("default"),
            Token::Break => f.write_str("break"),
            Token::Return => f.write_str("return"),
            Token::FunctionDefinition => f.write_str("func"),
            Token::ClassDefinition => f.write_str("class"),
            Token::VariableDefinition => f.write_str("var"),
            Token::ConstantDefinition => f.write_str("let"),
            Token::BracketOpen => f.write_str("("),
            Token::BracketClose => f.write_str(")"),
            Token::BraceOpen => f.write_str("{"),
            Token::BraceClose => f.write_str("}"),
            Token::Comma => f.write_str(","),
            Token::Semicolon => f.write_str(";"),
            Token::Colon => f.write_str(":"),
            Token::Dot => f.write_str("."),
            Token::Assign => f.write_str("="),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Increment => f.write_str("++"),
            Token::Decrement => f.write_str("--"),
            Token::Equal => f.write_str("=="),
            Token::NotEqual => f.write_str("!="),
            Token::Less => f.write_str("<"),
            Token::Greater => f.write_str(">"),
            Token::LessEqual => f.write_str("<="),
            Token::GreaterEqual => f.write_str(">="),
            Token::And => f.write_str("&&"),
            Token::Or => f.write_str("||"),
        }
    }
}

//==================================================
// Section 2.0 - Token Spans
//==================================================

/// A window onto a shared token stream.
///
/// Function bodies, loop bodies and class bodies all execute over a span of
/// the program they were lexed from, so a function defined in one `exec`
/// call stays callable in the next.
#[derive(Clone)]
pub struct TokenSpan {
    tokens: Rc<[Token]>,
    range: Range<usize>,
}

impl TokenSpan {
    pub fn new(tokens: Rc<[Token]>) -> Self {
        let range = 0..tokens.len();
        Self { tokens, range }
    }

    /// A sub-span addressed with absolute indices into the shared stream.
    pub fn sub(&self, range: Range<usize>) -> Self {
        Self {
            tokens: Rc::clone(&self.tokens),
            range,
        }
    }

    /// The full underlying stream; indices in [`TokenSpan::range`] address it.
    pub fn tokens(&self) -> &Rc<[Token]> {
        &self.tokens
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

impl fmt::Debug for TokenSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSpan")
            .field("range", &self.range)
            .field("tokens", &self.as_slice())
            .finish()
    }
}

//==================================================
// Section 3.0 - Lex Errors
//==================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unknown syntax at offset {offset}: `{snippet}`")]
    UnknownSyntax { offset: usize, snippet: String },
    #[error("invalid numeric literal `{0}`")]
    InvalidNumber(String),
}

//==================================================
// Section 4.0 - Token Rules
//==================================================
// Order is significant: multi-character operators precede their prefixes and
// keywords precede the identifier catch-all. Keywords end on a word boundary,
// so `iffy` or `format` stay identifiers.

type Producer = fn(&Captures<'_>) -> Result<Vec<Token>, LexError>;

struct TokenRule {
    pattern: Regex,
    produce: Producer,
}

impl TokenRule {
    fn new(pattern: &str, produce: Producer) -> Self {
        let anchored = format!("^(?:{})", pattern);
        Self {
            pattern: Regex::new(&anchored).expect("token rule pattern must compile"),
            produce,
        }
    }
}

static RULES: Lazy<Vec<TokenRule>> = Lazy::new(|| {
    vec![
        TokenRule::new(r#""([^"]*)""#, |caps| {
            Ok(vec![Token::StringLiteral(caps[1].to_string())])
        }),
        TokenRule::new(r"'([^']*)'", |caps| {
            Ok(vec![Token::StringLiteral(caps[1].to_string())])
        }),
        TokenRule::new(r"\d+\.\d+", |caps| {
            let text = &caps[0];
            text.parse::<f64>()
                .map(|n| vec![Token::FloatLiteral(n)])
                .map_err(|_| LexError::InvalidNumber(text.to_string()))
        }),
        TokenRule::new(r"\d+", |caps| {
            let text = &caps[0];
            text.parse::<i64>()
                .map(|n| vec![Token::IntegerLiteral(n)])
                .map_err(|_| LexError::InvalidNumber(text.to_string()))
        }),
        TokenRule::new(r"(?:true|false)\b", |caps| {
            Ok(vec![Token::BoolLiteral(&caps[0] == "true")])
        }),
        TokenRule::new(
            r"(?:if|else|while|for|switch|case|default|break|return|function|func|class|var|let|const|nil|null|and|or)\b",
            |caps| Ok(vec![keyword(&caps[0])]),
        ),
        TokenRule::new(r"([A-Za-z_][A-Za-z0-9_]*)\(\s*\)", |caps| {
            Ok(vec![Token::Function(caps[1].to_string())])
        }),
        TokenRule::new(r"([A-Za-z_][A-Za-z0-9_]*)\(", |caps| {
            Ok(vec![
                Token::FunctionWithArguments(caps[1].to_string()),
                Token::BracketOpen,
            ])
        }),
        TokenRule::new(r"<=|>=|==|!=|&&|\|\||\+\+|--", |caps| {
            let token = match &caps[0] {
                "<=" => Token::LessEqual,
                ">=" => Token::GreaterEqual,
                "==" => Token::Equal,
                "!=" => Token::NotEqual,
                "&&" => Token::And,
                "||" => Token::Or,
                "++" => Token::Increment,
                _ => Token::Decrement,
            };
            Ok(vec![token])
        }),
        TokenRule::new(r"[=+\-<>(){},;:.]", |caps| {
            let token = match &caps[0] {
                "=" => Token::Assign,
                "+" => Token::Plus,
                "-" => Token::Minus,
                "<" => Token::Less,
                ">" => Token::Greater,
                "(" => Token::BracketOpen,
                ")" => Token::BracketClose,
                "{" => Token::BraceOpen,
                "}" => Token::BraceClose,
                "," => Token::Comma,
                ";" => Token::Semicolon,
                ":" => Token::Colon,
                _ => Token::Dot,
            };
            Ok(vec![token])
        }),
        TokenRule::new(r"[A-Za-z_][A-Za-z0-9_]*", |caps| {
            Ok(vec![Token::Variable(caps[0].to_string())])
        }),
    ]
});

fn keyword(word: &str) -> Token {
    match word {
        "if" => Token::If,
        "else" => Token::Else,
        "while" => Token::While,
        "for" => Token::For,
        "switch" => Token::Switch,
        "case" => Token::Case,
        "default" => Token::Default,
        "break" => Token::Break,
        "return" => Token::Return,
        "func" | "function" => Token::FunctionDefinition,
        "class" => Token::ClassDefinition,
        "var" => Token::VariableDefinition,
        "let" | "const" => Token::ConstantDefinition,
        "nil" | "null" => Token::Nil,
        "and" => Token::And,
        _ => Token::Or,
    }
}

//==================================================
// Section 5.0 - Tokenizer
//==================================================

/// Tokenizer for QuillScript source that has already had comments removed.
pub struct Tokenizer<'src> {
    source: &'src str,
    offset: usize,
}

impl<'src> Tokenizer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { source, offset: 0 }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        'input: loop {
            let remaining = &self.source[self.offset..];
            let trimmed = remaining.trim_start();
            self.offset += remaining.len() - trimmed.len();
            if trimmed.is_empty() {
                break;
            }

            for rule in RULES.iter() {
                if let Some(caps) = rule.pattern.captures(trimmed) {
                    let matched = caps.get(0).map_or(0, |m| m.end());
                    tokens.extend((rule.produce)(&caps)?);
                    self.offset += matched;
                    continue 'input;
                }
            }

            return Err(LexError::UnknownSyntax {
                offset: self.offset,
                snippet: trimmed.chars().take(16).collect(),
            });
        }

        Ok(tokens)
    }
}

//==================================================
// Section 6.0 - Tests
//==================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Tokenizer::new(source).tokenize().expect("tokenize")
    }

    fn var(name: &str) -> Token {
        Token::Variable(name.to_string())
    }

    #[test]
    fn test_declaration_and_if_else() {
        let tokens = lex("var size = 8; if(true) { size = 4; } else { size = 2 }");
        let expected = vec![
            Token::VariableDefinition,
            var("size"),
            Token::Assign,
            Token::IntegerLiteral(8),
            Token::Semicolon,
            Token::If,
            Token::BracketOpen,
            Token::BoolLiteral(true),
            Token::BracketClose,
            Token::BraceOpen,
            var("size"),
            Token::Assign,
            Token::IntegerLiteral(4),
            Token::Semicolon,
            Token::BraceClose,
            Token::Else,
            Token::BraceOpen,
            var("size"),
            Token::Assign,
            Token::IntegerLiteral(2),
            Token::BraceClose,
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_call_heads() {
        let tokens = lex("tick() print(a, 'b')");
        assert_eq!(
            tokens,
            vec![
                Token::Function("tick".to_string()),
                Token::FunctionWithArguments("print".to_string()),
                Token::BracketOpen,
                var("a"),
                Token::Comma,
                Token::StringLiteral("b".to_string()),
                Token::BracketClose,
            ]
        );
    }

    #[test]
    fn test_multi_character_operators_win() {
        let tokens = lex("<= >= == != && || ++ -- < > = + -");
        assert_eq!(
            tokens,
            vec![
                Token::LessEqual,
                Token::GreaterEqual,
                Token::Equal,
                Token::NotEqual,
                Token::And,
                Token::Or,
                Token::Increment,
                Token::Decrement,
                Token::Less,
                Token::Greater,
                Token::Assign,
                Token::Plus,
                Token::Minus,
            ]
        );
    }

    #[test]
    fn test_keyword_prefixed_identifiers_stay_identifiers() {
        let tokens = lex("iffy format variable classy returned orbit android");
        assert!(tokens.iter().all(Token::is_variable), "{tokens:?}");
    }

    #[test]
    fn test_keyword_aliases() {
        let tokens = lex("func function let const and or nil null");
        assert_eq!(
            tokens,
            vec![
                Token::FunctionDefinition,
                Token::FunctionDefinition,
                Token::ConstantDefinition,
                Token::ConstantDefinition,
                Token::And,
                Token::Or,
                Token::Nil,
                Token::Nil,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("42 2.75 0 92.9");
        assert_eq!(
            tokens,
            vec![
                Token::IntegerLiteral(42),
                Token::FloatLiteral(2.75),
                Token::IntegerLiteral(0),
                Token::FloatLiteral(92.9),
            ]
        );
    }

    #[test]
    fn test_interpolation_markers_are_kept_raw() {
        let tokens = lex(r#""value: \(count)" 'single'"#);
        assert_eq!(
            tokens,
            vec![
                Token::StringLiteral(r"value: \(count)".to_string()),
                Token::StringLiteral("single".to_string()),
            ]
        );
    }

    #[test]
    fn test_member_access_and_increment() {
        let tokens = lex("car.licence i++ car.drive()");
        assert_eq!(
            tokens,
            vec![
                var("car"),
                Token::Dot,
                var("licence"),
                var("i"),
                Token::Increment,
                var("car"),
                Token::Dot,
                Token::Function("drive".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_syntax() {
        let err = Tokenizer::new("var x = 1 # 2").tokenize().unwrap_err();
        match err {
            LexError::UnknownSyntax { offset, snippet } => {
                assert_eq!(offset, 10);
                assert!(snippet.starts_with('#'));
            }
            other => panic!("expected unknown syntax, found {other:?}"),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(lex("   \n\t ").is_empty());
    }
}

//==================================================
// End of file
//==================================================
