//==================================================
// File: interpreter/arithmetic.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Greedy expression evaluation over the token stream
// Objective: Measure the longest expression prefix at a position, resolve
//            its operands (calls, members, groups) and fold them by the tag
//            of the first operand
//==================================================

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use super::condition::ConditionEvaluator;
use super::invoke::{self, Arguments};
use super::{ArithmeticError, ExecContext, RuntimeError, STACK_GROW_SIZE, STACK_RED_ZONE};
use crate::parser::{BlockError, Cursor, describe, split_arguments};
use crate::registry::{RegisterSet, VariableError};
use crate::tokenizer::{Token, TokenSpan};
use crate::value::{Instance, Value, ValueType};

static INTERPOLATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)").expect("interpolation pattern must compile")
});

/// Result of evaluating one expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// `None` for expressions that yield nothing (`nil`, void calls).
    pub value: Option<Instance>,
    pub consumed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Add,
    Subtract,
}

impl Operator {
    fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
        }
    }
}

/// Whether `token` can open an operand.
pub(crate) fn starts_operand(token: &Token) -> bool {
    token.is_literal()
        || matches!(
            token,
            Token::Nil
                | Token::Variable(_)
                | Token::Function(_)
                | Token::FunctionWithArguments(_)
                | Token::BracketOpen
                | Token::Minus
        )
}

//==================================================
// Section 1.0 - Calculator
//==================================================

#[derive(Clone, Copy)]
pub struct ArithmeticCalculator<'s, 'a> {
    span: &'s TokenSpan,
    end: usize,
    registers: &'s RegisterSet,
    cx: ExecContext<'a>,
}

impl<'s, 'a> ArithmeticCalculator<'s, 'a> {
    /// A calculator bounded by the end of `span`.
    pub fn new(span: &'s TokenSpan, registers: &'s RegisterSet, cx: ExecContext<'a>) -> Self {
        Self {
            span,
            end: span.range().end,
            registers,
            cx,
        }
    }

    fn cursor(&self) -> Cursor<'s> {
        Cursor::new(self.span.tokens(), 0..self.end)
    }

    /// Evaluate the longest expression starting at `start`.
    pub fn calculate(&self, start: usize) -> Result<Evaluation, RuntimeError> {
        // Parenthesised groups recurse here without passing through `execute`.
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.calculate_inner(start))
    }

    fn calculate_inner(&self, start: usize) -> Result<Evaluation, RuntimeError> {
        let (stop, boolean) = self.scan(start)?;
        let consumed = stop - start;

        if boolean {
            let holds =
                ConditionEvaluator::new(self.span, self.registers, self.cx).check(start..stop)?;
            return Ok(Evaluation {
                value: Some(Value::Bool(holds).into()),
                consumed,
            });
        }

        let tokens = self.cursor().tokens();
        let mut terms = Vec::new();
        let mut operator = None;
        let mut position = start;
        while position < stop {
            let (value, next) = self.operand(position)?;
            terms.push((operator, value));
            position = next;
            if position < stop {
                operator = match tokens[position] {
                    Token::Minus => Some(Operator::Subtract),
                    _ => Some(Operator::Add),
                };
                position += 1;
            }
        }

        Ok(Evaluation {
            value: fold(terms)?,
            consumed,
        })
    }

    /// Evaluate an expression that must span exactly `range`.
    pub fn evaluate_range(&self, range: Range<usize>) -> Result<Option<Instance>, RuntimeError> {
        let bounded = Self {
            end: range.end,
            ..*self
        };
        let evaluation = bounded.calculate(range.start)?;
        let stop = range.start + evaluation.consumed;
        if stop < range.end {
            let found = describe(self.cursor().get(stop));
            return Err(ArithmeticError::UnexpectedToken(found).into());
        }
        Ok(evaluation.value)
    }

    //==================================================
    // Section 1.1 - Structural Scan
    //==================================================

    /// End of the expression at `start` and whether it contains a comparison
    /// or logical operator. Two operands in a row end the expression.
    fn scan(&self, start: usize) -> Result<(usize, bool), RuntimeError> {
        let cursor = self.cursor();
        let mut position = start;
        let mut boolean = false;
        loop {
            position = self.scan_operand(&cursor, position)?;
            match cursor.get(position) {
                Some(Token::Plus | Token::Minus) => {}
                Some(token) if token.is_comparison() || token.is_logical() => boolean = true,
                _ => return Ok((position, boolean)),
            }
            let operator = &cursor.tokens()[position];
            position += 1;
            if !cursor.get(position).is_some_and(starts_operand) {
                return Err(ArithmeticError::DanglingOperator(operator.to_string()).into());
            }
        }
    }

    fn scan_operand(&self, cursor: &Cursor<'s>, start: usize) -> Result<usize, RuntimeError> {
        let mut position = match cursor.get(start) {
            Some(Token::Minus) => {
                return match cursor.get(start + 1) {
                    Some(Token::IntegerLiteral(_) | Token::FloatLiteral(_)) => Ok(start + 2),
                    other => Err(ArithmeticError::NoValue(describe(other)).into()),
                };
            }
            Some(token) if token.is_literal() || *token == Token::Nil => return Ok(start + 1),
            Some(Token::Variable(_) | Token::Function(_)) => start + 1,
            Some(Token::FunctionWithArguments(_)) => cursor.closing(start + 1)? + 1,
            Some(Token::BracketOpen) => cursor.closing(start)? + 1,
            other => return Err(ArithmeticError::NoValue(describe(other)).into()),
        };

        while cursor.check(position, &Token::Dot) {
            position = match cursor.get(position + 1) {
                Some(Token::Variable(_) | Token::Function(_)) => position + 2,
                Some(Token::FunctionWithArguments(_)) => cursor.closing(position + 2)? + 1,
                other => return Err(BlockError::expected("member name after '.'", other).into()),
            };
        }
        Ok(position)
    }

    //==================================================
    // Section 1.2 - Operands
    //==================================================

    /// Resolve the operand at `start`; returns its value and the next position.
    fn operand(&self, start: usize) -> Result<(Option<Instance>, usize), RuntimeError> {
        let cursor = self.cursor();
        let (mut value, mut position) = match cursor.get(start) {
            Some(Token::Minus) => {
                let negated = match cursor.get(start + 1) {
                    Some(Token::IntegerLiteral(n)) => Value::Integer(-n),
                    Some(Token::FloatLiteral(n)) => Value::Float(-n),
                    other => return Err(ArithmeticError::NoValue(describe(other)).into()),
                };
                return Ok((Some(negated.into()), start + 2));
            }
            Some(Token::StringLiteral(text)) => {
                let text = self.interpolate(text)?;
                return Ok((Some(Value::String(text).into()), start + 1));
            }
            Some(Token::Nil) => return Ok((None, start + 1)),
            Some(token) if token.is_literal() => {
                return Ok((token.literal_value().map(Instance::from), start + 1));
            }
            Some(Token::Variable(name)) => (invoke::read_variable(self.registers, name)?, start + 1),
            Some(Token::Function(name)) => (
                invoke::call_named(name, Vec::new(), self.registers, self.cx)?,
                start + 1,
            ),
            Some(Token::FunctionWithArguments(name)) => {
                let close = cursor.closing(start + 1)?;
                let arguments = self.arguments(start + 1, close)?;
                (
                    invoke::call_named(name, arguments, self.registers, self.cx)?,
                    close + 1,
                )
            }
            Some(Token::BracketOpen) => {
                let close = cursor.closing(start)?;
                (self.evaluate_range(start + 1..close)?, close + 1)
            }
            other => return Err(ArithmeticError::NoValue(describe(other)).into()),
        };

        while cursor.check(position, &Token::Dot) {
            let object = invoke::expect_object(value)?;
            match cursor.get(position + 1) {
                Some(Token::Variable(attribute)) => {
                    value = invoke::read_attribute(&object, attribute)?;
                    position += 2;
                }
                Some(Token::Function(method)) => {
                    value = invoke::call_method(&object, method, Vec::new(), self.registers, self.cx)?;
                    position += 2;
                }
                Some(Token::FunctionWithArguments(method)) => {
                    let close = cursor.closing(position + 2)?;
                    let arguments = self.arguments(position + 2, close)?;
                    value = invoke::call_method(&object, method, arguments, self.registers, self.cx)?;
                    position = close + 1;
                }
                other => return Err(BlockError::expected("member name after '.'", other).into()),
            }
        }
        Ok((value, position))
    }

    /// Evaluate the comma-separated arguments between `open` and `close`.
    fn arguments(&self, open: usize, close: usize) -> Result<Arguments, RuntimeError> {
        split_arguments(self.cursor().tokens(), open + 1..close)
            .into_iter()
            .map(|range| self.evaluate_range(range))
            .collect()
    }

    /// Substitute `\(name)` markers with the current value of `name`.
    fn interpolate(&self, text: &str) -> Result<String, RuntimeError> {
        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for caps in INTERPOLATION.captures_iter(text) {
            let Some(marker) = caps.get(0) else {
                continue;
            };
            let name = &caps[1];
            output.push_str(&text[last..marker.start()]);
            match invoke::read_variable(self.registers, name)? {
                Some(value) => output.push_str(&value.to_string()),
                None => return Err(VariableError::Uninitialized(name.to_string()).into()),
            }
            last = marker.end();
        }
        output.push_str(&text[last..]);
        Ok(output)
    }
}

//==================================================
// Section 2.0 - Folding
//==================================================

/// Combine operands left to right. A lone operand is returned untouched, so
/// instances and void results only survive as whole expressions.
fn fold(terms: Vec<(Option<Operator>, Option<Instance>)>) -> Result<Option<Instance>, RuntimeError> {
    let mut terms = terms.into_iter();
    let Some((_, first)) = terms.next() else {
        return Ok(None);
    };
    if terms.len() == 0 {
        return Ok(first);
    }

    let mut accumulator = primitive(first)?;
    for (operator, operand) in terms {
        let operator = operator.unwrap_or(Operator::Add);
        accumulator = combine(accumulator, operator, primitive(operand)?)?;
    }
    if let Value::Float(n) = accumulator {
        accumulator = Value::Float((n * 100.0).round() / 100.0);
    }
    Ok(Some(accumulator.into()))
}

fn primitive(operand: Option<Instance>) -> Result<Value, ArithmeticError> {
    match operand {
        Some(Instance::Primitive(value)) => Ok(value),
        Some(Instance::Object(object)) => {
            Err(ArithmeticError::ObjectOperand(object.type_name().to_string()))
        }
        None => Err(ArithmeticError::VoidOperand),
    }
}

fn combine(left: Value, operator: Operator, right: Value) -> Result<Value, ArithmeticError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => match operator {
            Operator::Add => a.checked_add(b),
            Operator::Subtract => a.checked_sub(b),
        }
        .map(Value::Integer)
        .ok_or(ArithmeticError::Overflow),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(match operator {
            Operator::Add => a + b,
            Operator::Subtract => a - b,
        })),
        (Value::String(mut a), Value::String(b)) => match operator {
            Operator::Add => {
                a.push_str(&b);
                Ok(Value::String(a))
            }
            Operator::Subtract => Err(ArithmeticError::UnsupportedOperator {
                operator: operator.symbol(),
                operand: ValueType::String,
            }),
        },
        (Value::Bool(_), _) => Err(ArithmeticError::UnsupportedOperator {
            operator: operator.symbol(),
            operand: ValueType::Bool,
        }),
        (left, right) => Err(ArithmeticError::TypeMismatch {
            expected: left.value_type(),
            found: right.value_type().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::registry::{
        ExternalFunctionRegistry, LocalFunctionRegistry, ObjectTypeRegistry, VariableRegistry,
    };
    use crate::runtime::AbortSignal;
    use crate::tokenizer::Tokenizer;

    fn registers() -> RegisterSet {
        RegisterSet::new(
            VariableRegistry::root(),
            LocalFunctionRegistry::root(),
            Rc::new(ExternalFunctionRegistry::default()),
            ObjectTypeRegistry::root(),
        )
    }

    fn evaluate(source: &str, registers: &RegisterSet) -> Result<Evaluation, RuntimeError> {
        let tokens = Tokenizer::new(source).tokenize().expect("tokenize");
        let span = TokenSpan::new(Rc::from(tokens));
        let abort = AbortSignal::new();
        let cx = ExecContext::new(&abort, 16);
        ArithmeticCalculator::new(&span, registers, cx).calculate(0)
    }

    fn value(evaluation: Evaluation) -> Value {
        evaluation
            .value
            .and_then(Instance::into_value)
            .expect("primitive result")
    }

    #[test]
    fn test_integer_sum() {
        let evaluation = evaluate("5 + 2", &registers()).unwrap();
        assert_eq!(evaluation.consumed, 3);
        assert_eq!(value(evaluation), Value::Integer(7));
    }

    #[test]
    fn test_float_difference_rounds_to_two_places() {
        let evaluation = evaluate("92.9 - 12.5 - 50.3", &registers()).unwrap();
        assert_eq!(evaluation.consumed, 5);
        assert_eq!(value(evaluation), Value::Float(30.1));
    }

    #[test]
    fn test_string_concatenation() {
        let evaluation = evaluate("\"hello\" + \" \" + \"world\"", &registers()).unwrap();
        assert_eq!(value(evaluation), Value::String("hello world".into()));
    }

    #[test]
    fn test_expression_stops_at_second_operand() {
        let evaluation = evaluate("1 + 2 print(3)", &registers()).unwrap();
        assert_eq!(evaluation.consumed, 3);
    }

    #[test]
    fn test_variables_and_groups() {
        let registers = registers();
        registers
            .variables
            .borrow_mut()
            .register_value("a", Value::Integer(10).into())
            .unwrap();
        let evaluation = evaluate("a - (1 + 2) + -3", &registers).unwrap();
        assert_eq!(evaluation.consumed, 10);
        assert_eq!(value(evaluation), Value::Integer(4));
    }

    #[test]
    fn test_interpolation_reads_current_values() {
        let registers = registers();
        registers
            .variables
            .borrow_mut()
            .register_value("name", Value::from("quill").into())
            .unwrap();
        let evaluation = evaluate(r#""hi \(name)!""#, &registers).unwrap();
        assert_eq!(value(evaluation), Value::String("hi quill!".into()));
    }

    #[test]
    fn test_comparison_is_delegated() {
        let evaluation = evaluate("3 + 1 == 4", &registers()).unwrap();
        assert_eq!(evaluation.consumed, 5);
        assert_eq!(value(evaluation), Value::Bool(true));
    }

    #[test]
    fn test_mixed_tags_fail() {
        let err = evaluate("1 + 2.5", &registers()).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Arithmetic(ArithmeticError::TypeMismatch { .. })
        ));
        let err = evaluate("'a' - 'b'", &registers()).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Arithmetic(ArithmeticError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn test_dangling_operator_and_missing_value() {
        assert!(matches!(
            evaluate("1 +", &registers()).unwrap_err(),
            RuntimeError::Arithmetic(ArithmeticError::DanglingOperator(_))
        ));
        assert!(matches!(
            evaluate("}", &registers()).unwrap_err(),
            RuntimeError::Arithmetic(ArithmeticError::NoValue(_))
        ));
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = evaluate("9223372036854775807 + 1", &registers()).unwrap_err();
        assert_eq!(err, RuntimeError::Arithmetic(ArithmeticError::Overflow));
    }

    #[test]
    fn test_host_call_inside_expression() {
        let mut externals = ExternalFunctionRegistry::default();
        externals
            .register("double", crate::registry::NativeArity::Exact(1), |args| {
                match &args[0] {
                    Value::Integer(n) => Ok(Some(Value::Integer(n * 2))),
                    other => Err(format!("cannot double {}", other)),
                }
            })
            .unwrap();
        let registers = RegisterSet {
            externals: Rc::new(externals),
            ..registers()
        };
        let evaluation = evaluate("double(2 + 3) + 1", &registers).unwrap();
        assert_eq!(value(evaluation), Value::Integer(11));
    }
}

//==================================================
// End of file
//==================================================
