//==================================================
// File: interpreter/condition.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Boolean condition evaluation and value ordering
// Objective: Recognise the supported condition shapes (single value, flat
//            `&&` or `||` chains, one comparison) and apply the literal
//            coercion rules for equality
//==================================================

use std::cmp::Ordering;
use std::ops::Range;

use super::arithmetic::ArithmeticCalculator;
use super::{ConditionError, ExecContext, RuntimeError};
use crate::parser::{split_top_level, top_level_positions};
use crate::registry::RegisterSet;
use crate::tokenizer::{Token, TokenSpan};
use crate::value::{Instance, Value};

//==================================================
// Section 1.0 - Operands
//==================================================

/// One side of a comparison. A bare literal token keeps the `Literal` role
/// and is coerced toward the tag of a typed opponent.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Typed(Option<Instance>),
}

fn tag_name(instance: &Option<Instance>) -> String {
    match instance {
        Some(instance) => instance.tag().to_string(),
        None => "nil".to_string(),
    }
}

/// Equality with the literal coercion rules shared by `==`, `!=` and `switch`.
pub fn values_equal(left: &Operand, right: &Operand) -> Result<bool, ConditionError> {
    match (left, right) {
        (Operand::Literal(a), Operand::Literal(b)) => {
            if a.value_type() != b.value_type() {
                return Err(ConditionError::TagMismatch {
                    left: a.value_type().to_string(),
                    right: b.value_type().to_string(),
                });
            }
            Ok(a == b)
        }
        (Operand::Literal(literal), Operand::Typed(typed))
        | (Operand::Typed(typed), Operand::Literal(literal)) => match typed {
            Some(Instance::Primitive(value)) => Ok(literal
                .coerce_to(value.value_type())
                .is_some_and(|coerced| coerced == *value)),
            Some(Instance::Object(_)) => Err(ConditionError::TagMismatch {
                left: literal.value_type().to_string(),
                right: tag_name(typed),
            }),
            None => Err(ConditionError::VoidOperand),
        },
        (Operand::Typed(Some(a)), Operand::Typed(Some(b))) => {
            if a.tag() != b.tag() {
                return Err(ConditionError::TagMismatch {
                    left: a.tag().to_string(),
                    right: b.tag().to_string(),
                });
            }
            Ok(a == b)
        }
        (Operand::Typed(_), Operand::Typed(_)) => Err(ConditionError::VoidOperand),
    }
}

/// Resolve both sides to primitives for ordering, coercing a literal toward
/// the typed side.
fn ordered_values(left: Operand, right: Operand) -> Result<(Value, Value), ConditionError> {
    fn typed(instance: Option<Instance>) -> Result<Value, ConditionError> {
        match instance {
            Some(Instance::Primitive(value)) => Ok(value),
            Some(other) => Err(ConditionError::NotComparable {
                left: other.tag().to_string(),
                right: "a number".to_string(),
            }),
            None => Err(ConditionError::VoidOperand),
        }
    }

    match (left, right) {
        (Operand::Literal(a), Operand::Literal(b)) => Ok((a, b)),
        (Operand::Literal(a), Operand::Typed(b)) => {
            let b = typed(b)?;
            let a = a.coerce_to(b.value_type()).unwrap_or(a);
            Ok((a, b))
        }
        (Operand::Typed(a), Operand::Literal(b)) => {
            let a = typed(a)?;
            let b = b.coerce_to(a.value_type()).unwrap_or(b);
            Ok((a, b))
        }
        (Operand::Typed(a), Operand::Typed(b)) => Ok((typed(a)?, typed(b)?)),
    }
}

//==================================================
// Section 2.0 - Value Comparator
//==================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    LeftGreater,
    RightGreater,
}

pub struct ValueComparator;

impl ValueComparator {
    /// Three-way ordering of two integers or two floats.
    pub fn compare(left: &Value, right: &Value) -> Result<Comparison, ConditionError> {
        let not_comparable = || ConditionError::NotComparable {
            left: left.value_type().to_string(),
            right: right.value_type().to_string(),
        };
        let ordering = match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).ok_or_else(not_comparable)?,
            _ => return Err(not_comparable()),
        };
        Ok(match ordering {
            Ordering::Less => Comparison::RightGreater,
            Ordering::Equal => Comparison::Equal,
            Ordering::Greater => Comparison::LeftGreater,
        })
    }
}

//==================================================
// Section 3.0 - Condition Evaluator
//==================================================

pub struct ConditionEvaluator<'s, 'a> {
    span: &'s TokenSpan,
    registers: &'s RegisterSet,
    cx: ExecContext<'a>,
}

impl<'s, 'a> ConditionEvaluator<'s, 'a> {
    pub fn new(span: &'s TokenSpan, registers: &'s RegisterSet, cx: ExecContext<'a>) -> Self {
        Self {
            span,
            registers,
            cx,
        }
    }

    fn tokens(&self) -> &'s [Token] {
        self.span.tokens()
    }

    fn calculator(&self) -> ArithmeticCalculator<'s, 'a> {
        ArithmeticCalculator::new(self.span, self.registers, self.cx)
    }

    /// Whether the condition spanning `range` holds.
    pub fn check(&self, range: Range<usize>) -> Result<bool, RuntimeError> {
        if range.is_empty() {
            return Err(ConditionError::Empty.into());
        }
        let tokens = self.tokens();
        let has_and = !top_level_positions(tokens, range.clone(), |t| *t == Token::And).is_empty();
        let has_or = !top_level_positions(tokens, range.clone(), |t| *t == Token::Or).is_empty();

        match (has_and, has_or) {
            (true, true) => Err(ConditionError::MixedLogical.into()),
            (true, false) => {
                for segment in split_top_level(tokens, range, &Token::And) {
                    if !self.check(segment)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (false, true) => {
                for segment in split_top_level(tokens, range, &Token::Or) {
                    if self.check(segment)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            (false, false) => self.check_simple(range),
        }
    }

    fn check_simple(&self, range: Range<usize>) -> Result<bool, RuntimeError> {
        let tokens = self.tokens();
        if range.len() == 1 {
            return match &tokens[range.start] {
                Token::BoolLiteral(value) => Ok(*value),
                Token::Variable(_) | Token::Function(_) => {
                    expect_bool(self.calculator().evaluate_range(range)?)
                }
                other => Err(ConditionError::NotBoolean(format!("'{}'", other)).into()),
            };
        }

        if !top_level_positions(tokens, range.clone(), |t| *t == Token::Assign).is_empty() {
            return Err(ConditionError::Assignment.into());
        }

        let comparisons = top_level_positions(tokens, range.clone(), Token::is_comparison);
        match comparisons.as_slice() {
            [] => expect_bool(self.calculator().evaluate_range(range)?),
            [operator] => {
                let (left, right) = (range.start..*operator, *operator + 1..range.end);
                if left.is_empty() || right.is_empty() {
                    return Err(ConditionError::UnsupportedShape(format!(
                        "'{}' is missing an operand",
                        tokens[*operator]
                    ))
                    .into());
                }
                let left = self.operand(left)?;
                let right = self.operand(right)?;
                Ok(compare(&tokens[*operator], left, right)?)
            }
            _ => Err(ConditionError::UnsupportedShape(
                "more than one comparison in a single condition".to_string(),
            )
            .into()),
        }
    }

    /// Resolve one comparison side.
    pub fn operand(&self, range: Range<usize>) -> Result<Operand, RuntimeError> {
        let literal = range.len() == 1 && self.tokens()[range.start].is_literal();
        let value = self.calculator().evaluate_range(range)?;
        Ok(match value {
            Some(Instance::Primitive(value)) if literal => Operand::Literal(value),
            other => Operand::Typed(other),
        })
    }
}

fn expect_bool(value: Option<Instance>) -> Result<bool, RuntimeError> {
    match value {
        Some(Instance::Primitive(Value::Bool(value))) => Ok(value),
        Some(other) => Err(ConditionError::NotBoolean(other.tag().to_string()).into()),
        None => Err(ConditionError::VoidOperand.into()),
    }
}

fn compare(operator: &Token, left: Operand, right: Operand) -> Result<bool, ConditionError> {
    match operator {
        Token::Equal => values_equal(&left, &right),
        Token::NotEqual => values_equal(&left, &right).map(|equal| !equal),
        _ => {
            let (left, right) = ordered_values(left, right)?;
            let comparison = ValueComparator::compare(&left, &right)?;
            Ok(match operator {
                Token::Less => comparison == Comparison::RightGreater,
                Token::Greater => comparison == Comparison::LeftGreater,
                Token::LessEqual => comparison != Comparison::LeftGreater,
                _ => comparison != Comparison::RightGreater,
            })
        }
    }
}


//==================================================
// End of file
//==================================================
