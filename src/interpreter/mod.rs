//==================================================
// File: interpreter/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: QuillScript execution engine
// Objective: Walk a token span statement by statement, dispatching on the
//            token at the cursor and re-entering itself for every nested
//            block, loop, function and method body
//==================================================

pub mod arithmetic;
pub mod condition;
pub mod control;
pub mod errors;
mod invoke;

use std::ops::Range;

use tracing::{debug, trace, warn};

pub use arithmetic::{ArithmeticCalculator, Evaluation};
pub use condition::{Comparison, ConditionEvaluator, Operand, ValueComparator, values_equal};
pub use control::Flow;
pub use errors::{ArithmeticError, ConditionError, ErrorCode, RuntimeError, ScriptError};

use crate::parser::{BlockParser, Cursor, FunctionHead, FunctionParser, ObjectTypeParser, VariableParser};
use crate::registry::{FunctionError, LocalFunction, ObjectType, RegisterSet, VariableError};
use crate::runtime::AbortSignal;
use crate::tokenizer::{Token, TokenSpan};
use crate::value::{Instance, Value};

//==================================================
// Section 1.0 - Execution Context
//==================================================

/// Remaining native stack below which nested execution switches to a new segment.
pub(crate) const STACK_RED_ZONE: usize = 128 * 1024;
pub(crate) const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Per-call-tree settings threaded through every nested execution.
#[derive(Debug, Clone, Copy)]
pub struct ExecContext<'a> {
    abort: &'a AbortSignal,
    depth: usize,
    max_depth: usize,
}

impl<'a> ExecContext<'a> {
    pub fn new(abort: &'a AbortSignal, max_depth: usize) -> Self {
        Self {
            abort,
            depth: 0,
            max_depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Fail with the pending abort reason, if any.
    pub fn checkpoint(&self) -> Result<(), RuntimeError> {
        match self.abort.take() {
            Some(reason) => {
                warn!(%reason, depth = self.depth, "execution aborted");
                Err(RuntimeError::Abort(reason))
            }
            None => Ok(()),
        }
    }

    /// Context for a callee body, one level deeper.
    pub fn enter_call(&self) -> Result<Self, FunctionError> {
        if self.depth >= self.max_depth {
            return Err(FunctionError::CallDepthExceeded(self.max_depth));
        }
        Ok(Self {
            depth: self.depth + 1,
            ..*self
        })
    }
}

//==================================================
// Section 2.0 - Interpreter
//==================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Statements,
    /// Only declarations and method heads are accepted.
    ClassBody,
}

pub struct Interpreter<'a> {
    span: TokenSpan,
    registers: RegisterSet,
    cx: ExecContext<'a>,
    mode: Mode,
}

impl<'a> Interpreter<'a> {
    pub fn new(span: TokenSpan, registers: RegisterSet, cx: ExecContext<'a>) -> Self {
        Self {
            span,
            registers,
            cx,
            mode: Mode::Statements,
        }
    }

    /// Run every statement of the span, stopping early on `return` or `break`.
    ///
    /// Every nested block and callee body re-enters here, so this is where
    /// the native stack is grown for deep scripts.
    pub fn execute(&self) -> Result<Flow, RuntimeError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.execute_inner())
    }

    fn execute_inner(&self) -> Result<Flow, RuntimeError> {
        let mut cursor = Cursor::new(self.span.tokens(), self.span.range());
        while !cursor.is_at_end() {
            self.cx.checkpoint()?;
            let flow = match self.mode {
                Mode::Statements => self.statement(&mut cursor)?,
                Mode::ClassBody => self.class_member(&mut cursor)?,
            };
            if !flow.is_finished() {
                return Ok(flow);
            }
        }
        Ok(Flow::Finished)
    }

    fn nested(&self, range: Range<usize>, registers: RegisterSet) -> Interpreter<'a> {
        Interpreter::new(self.span.sub(range), registers, self.cx)
    }

    fn blocks(&self) -> BlockParser<'_> {
        BlockParser::new(self.span.tokens(), self.span.range().end)
    }

    fn calculator(&self) -> ArithmeticCalculator<'_, 'a> {
        ArithmeticCalculator::new(&self.span, &self.registers, self.cx)
    }

    fn condition<'s>(&'s self, registers: &'s RegisterSet) -> ConditionEvaluator<'s, 'a> {
        ConditionEvaluator::new(&self.span, registers, self.cx)
    }

    //==================================================
    // Section 2.1 - Statement Dispatch
    //==================================================

    fn statement(&self, cursor: &mut Cursor<'_>) -> Result<Flow, RuntimeError> {
        let start = cursor.position();
        let Some(token) = cursor.peek() else {
            return Ok(Flow::Finished);
        };

        match token {
            Token::Semicolon => cursor.advance(1),
            Token::Function(_) | Token::FunctionWithArguments(_) => {
                let evaluation = self.calculator().calculate(start)?;
                cursor.advance(evaluation.consumed);
            }
            Token::VariableDefinition | Token::ConstantDefinition => {
                let consumed = self.declare(start)?;
                cursor.advance(consumed);
            }
            Token::FunctionDefinition => {
                let head = FunctionParser::new(self.span.tokens(), cursor.end()).parse(start)?;
                cursor.advance(head.consumed);
                self.define_function(head)?;
            }
            Token::ClassDefinition => self.define_class(cursor)?,
            Token::If => return self.run_if(cursor),
            Token::While => return self.run_while(cursor),
            Token::For => return self.run_for(cursor),
            Token::Switch => return self.run_switch(cursor),
            Token::BraceOpen => return self.run_block(cursor),
            Token::Variable(name) => self.variable_statement(name, cursor)?,
            Token::Break => {
                trace!(position = start, "break");
                cursor.advance(1);
                return Ok(Flow::Break);
            }
            Token::Return => return self.run_return(cursor),
            other => {
                return Err(RuntimeError::Syntax(format!("unexpected token '{}'", other)));
            }
        }
        Ok(Flow::Finished)
    }

    fn class_member(&self, cursor: &mut Cursor<'_>) -> Result<Flow, RuntimeError> {
        let start = cursor.position();
        let functions = FunctionParser::new(self.span.tokens(), cursor.end());
        match cursor.peek() {
            Some(Token::Semicolon) => cursor.advance(1),
            Some(Token::VariableDefinition | Token::ConstantDefinition) => {
                let consumed = self.declare(start)?;
                cursor.advance(consumed);
            }
            Some(Token::FunctionDefinition) => {
                let head = functions.parse(start)?;
                cursor.advance(head.consumed);
                self.define_function(head)?;
            }
            Some(Token::Function(_) | Token::FunctionWithArguments(_)) => {
                let head = functions.parse_head(start)?;
                cursor.advance(head.consumed);
                self.define_function(head)?;
            }
            Some(other) => {
                return Err(RuntimeError::Syntax(format!(
                    "unexpected token '{}' in class body",
                    other
                )));
            }
            None => {}
        }
        Ok(Flow::Finished)
    }

    //==================================================
    // Section 2.2 - Declarations
    //==================================================

    fn declare(&self, start: usize) -> Result<usize, RuntimeError> {
        VariableParser::new(self.span.tokens(), self.span.range().end).parse(
            start,
            &self.registers.variables,
            |position| {
                let evaluation = self.calculator().calculate(position)?;
                Ok((evaluation.value, evaluation.consumed))
            },
        )
    }

    fn define_function(&self, head: FunctionHead) -> Result<(), RuntimeError> {
        debug!(function = %head.name, parameters = head.parameters.len(), "defining function");
        let function = LocalFunction {
            name: head.name,
            parameters: head.parameters,
            body: self.span.sub(head.body),
        };
        self.registers.functions.borrow_mut().register(function)?;
        Ok(())
    }

    fn define_class(&self, cursor: &mut Cursor<'_>) -> Result<(), RuntimeError> {
        let head = ObjectTypeParser::new(self.span.tokens(), cursor.end()).parse(cursor.position())?;
        debug!(class = %head.name, "defining class");

        let object_type = ObjectType::new(
            head.name.clone(),
            &self.registers.variables,
            &self.registers.functions,
        );
        let body = Interpreter {
            span: self.span.sub(head.body),
            registers: self.registers.with_class_body(&object_type),
            cx: self.cx,
            mode: Mode::ClassBody,
        };
        body.execute()?;

        self.registers.objects.borrow_mut().register(object_type)?;
        cursor.advance(head.consumed);
        Ok(())
    }

    //==================================================
    // Section 2.3 - Control Constructs
    //==================================================

    fn run_if(&self, cursor: &mut Cursor<'_>) -> Result<Flow, RuntimeError> {
        let block = self.blocks().get_if_block(cursor.position())?;
        trace!(position = cursor.position(), consumed = block.consumed, "if");

        let branch = if self.condition(&self.registers).check(block.condition)? {
            Some(block.body)
        } else {
            block.else_body
        };
        if let Some(branch) = branch {
            let flow = self.nested(branch, self.registers.with_block_scope()).execute()?;
            if !flow.is_finished() {
                return Ok(flow);
            }
        }
        cursor.advance(block.consumed);
        Ok(Flow::Finished)
    }

    fn run_while(&self, cursor: &mut Cursor<'_>) -> Result<Flow, RuntimeError> {
        let block = self.blocks().get_while_block(cursor.position())?;
        trace!(position = cursor.position(), consumed = block.consumed, "while");

        loop {
            self.cx.checkpoint()?;
            if !self.condition(&self.registers).check(block.condition.clone())? {
                break;
            }
            match self
                .nested(block.body.clone(), self.registers.with_block_scope())
                .execute()?
            {
                Flow::Finished => {}
                Flow::Break => break,
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        cursor.advance(block.consumed);
        Ok(Flow::Finished)
    }

    /// The loop variable lives in one frame for the whole loop; each body
    /// pass gets a fresh child of it and the step runs in the loop frame.
    fn run_for(&self, cursor: &mut Cursor<'_>) -> Result<Flow, RuntimeError> {
        let block = self.blocks().get_for_block(cursor.position())?;
        trace!(position = cursor.position(), variable = %block.init.name, "for");

        let loop_registers = self.registers.with_block_scope();
        loop_registers
            .variables
            .borrow_mut()
            .register_value(&block.init.name, Value::Integer(block.init.value).into())?;
        let step = self.nested(block.step.clone(), loop_registers.clone());

        loop {
            self.cx.checkpoint()?;
            if !self.condition(&loop_registers).check(block.test.clone())? {
                break;
            }
            match self
                .nested(block.body.clone(), loop_registers.with_block_scope())
                .execute()?
            {
                Flow::Finished => {}
                Flow::Break => break,
                flow @ Flow::Return(_) => return Ok(flow),
            }
            match step.execute()? {
                Flow::Finished => {}
                Flow::Break => break,
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        cursor.advance(block.consumed);
        Ok(Flow::Finished)
    }

    /// First matching case runs; `break` ends the switch.
    fn run_switch(&self, cursor: &mut Cursor<'_>) -> Result<Flow, RuntimeError> {
        let block = self.blocks().get_switch_block(cursor.position())?;
        trace!(position = cursor.position(), cases = block.cases.len(), "switch");

        let control = self.condition(&self.registers).operand(block.control)?;
        let mut chosen = None;
        for case in block.cases {
            let Some(key) = case.key.literal_value() else {
                continue;
            };
            if values_equal(&control, &Operand::Literal(key))? {
                chosen = Some(case.body);
                break;
            }
        }

        if let Some(body) = chosen.or(block.default) {
            match self.nested(body, self.registers.with_block_scope()).execute()? {
                Flow::Finished | Flow::Break => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        cursor.advance(block.consumed);
        Ok(Flow::Finished)
    }

    fn run_block(&self, cursor: &mut Cursor<'_>) -> Result<Flow, RuntimeError> {
        let (body, consumed) = self.blocks().get_bare_block(cursor.position())?;
        let flow = self.nested(body, self.registers.with_block_scope()).execute()?;
        if !flow.is_finished() {
            return Ok(flow);
        }
        cursor.advance(consumed);
        Ok(Flow::Finished)
    }

    fn run_return(&self, cursor: &mut Cursor<'_>) -> Result<Flow, RuntimeError> {
        let start = cursor.position();
        if !cursor.peek_at(1).is_some_and(arithmetic::starts_operand) {
            cursor.advance(1);
            return Ok(Flow::Return(None));
        }
        let evaluation = self.calculator().calculate(start + 1)?;
        cursor.advance(1 + evaluation.consumed);
        Ok(Flow::Return(evaluation.value))
    }

    //==================================================
    // Section 2.4 - Assignment
    //==================================================

    fn variable_statement(&self, name: &str, cursor: &mut Cursor<'_>) -> Result<(), RuntimeError> {
        let start = cursor.position();
        match cursor.peek_at(1) {
            Some(Token::Assign) => {
                let evaluation = self.calculator().calculate(start + 2)?;
                let value = evaluation.value.ok_or(ArithmeticError::VoidOperand)?;
                self.registers
                    .variables
                    .borrow_mut()
                    .update_value(name, value)?;
                cursor.advance(2 + evaluation.consumed);
            }
            Some(Token::Increment) => {
                self.step_variable(name, 1, "++")?;
                cursor.advance(2);
            }
            Some(Token::Decrement) => {
                self.step_variable(name, -1, "--")?;
                cursor.advance(2);
            }
            Some(Token::Dot) => self.member_statement(name, cursor)?,
            other => {
                return Err(RuntimeError::Syntax(format!(
                    "unexpected {} after '{}'",
                    crate::parser::describe(other),
                    name
                )));
            }
        }
        Ok(())
    }

    fn step_variable(&self, name: &str, delta: i64, operator: &'static str) -> Result<(), RuntimeError> {
        let current = invoke::read_variable(&self.registers, name)?;
        let next = step_integer(name, current, delta, operator)?;
        self.registers
            .variables
            .borrow_mut()
            .update_value(name, Value::Integer(next).into())?;
        Ok(())
    }

    /// `a.b.c = expr`, `a.b++`, or an expression statement such as `a.run()`.
    fn member_statement(&self, name: &str, cursor: &mut Cursor<'_>) -> Result<(), RuntimeError> {
        let start = cursor.position();
        let mut position = start + 1;
        let mut path = Vec::new();
        while cursor.check(position, &Token::Dot) {
            match cursor.get(position + 1) {
                Some(Token::Variable(attribute)) => {
                    path.push(attribute.as_str());
                    position += 2;
                }
                _ => break,
            }
        }

        let operator = cursor.get(position);
        let assigns = matches!(
            operator,
            Some(Token::Assign | Token::Increment | Token::Decrement)
        );
        let Some((attribute, parents)) = path.split_last().filter(|_| assigns) else {
            let evaluation = self.calculator().calculate(start)?;
            cursor.advance(evaluation.consumed);
            return Ok(());
        };

        let mut object = invoke::expect_object(invoke::read_variable(&self.registers, name)?)?;
        for parent in parents {
            object = invoke::expect_object(invoke::read_attribute(&object, parent)?)?;
        }

        let (value, next) = match operator {
            Some(Token::Assign) => {
                let evaluation = self.calculator().calculate(position + 1)?;
                let value = evaluation.value.ok_or(ArithmeticError::VoidOperand)?;
                (value, position + 1 + evaluation.consumed)
            }
            _ => {
                let (delta, symbol) = match operator {
                    Some(Token::Decrement) => (-1, "--"),
                    _ => (1, "++"),
                };
                let current = invoke::read_attribute(&object, attribute)?;
                let next = step_integer(attribute, current, delta, symbol)?;
                (Value::Integer(next).into(), position + 1)
            }
        };
        object.attributes().borrow_mut().assign_local(attribute, value)?;
        cursor.seek(next);
        Ok(())
    }
}

fn step_integer(
    name: &str,
    current: Option<Instance>,
    delta: i64,
    operator: &'static str,
) -> Result<i64, RuntimeError> {
    match current {
        Some(Instance::Primitive(Value::Integer(n))) => {
            Ok(n.checked_add(delta).ok_or(ArithmeticError::Overflow)?)
        }
        Some(other) => Err(VariableError::NotAnInteger {
            name: name.to_string(),
            operator,
            found: other.tag().to_string(),
        }
        .into()),
        None => Err(VariableError::Uninitialized(name.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::registry::{
        ExternalFunctionRegistry, LocalFunctionRegistry, ObjectTypeRegistry, VariableRegistry,
    };
    use crate::tokenizer::Tokenizer;

    fn registers() -> RegisterSet {
        RegisterSet::new(
            VariableRegistry::root(),
            LocalFunctionRegistry::root(),
            Rc::new(ExternalFunctionRegistry::default()),
            ObjectTypeRegistry::root(),
        )
    }

    fn run(source: &str, registers: &RegisterSet, abort: &AbortSignal) -> Result<Flow, RuntimeError> {
        let tokens = Tokenizer::new(source).tokenize().expect("tokenize");
        let span = TokenSpan::new(Rc::from(tokens));
        Interpreter::new(span, registers.clone(), ExecContext::new(abort, 16)).execute()
    }

    #[test]
    fn test_enter_call_stops_at_limit() {
        let abort = AbortSignal::new();
        let mut cx = ExecContext::new(&abort, 2);
        cx = cx.enter_call().unwrap();
        cx = cx.enter_call().unwrap();
        assert_eq!(cx.depth(), 2);
        assert_eq!(cx.enter_call().unwrap_err(), FunctionError::CallDepthExceeded(2));
    }

    #[test]
    fn test_checkpoint_consumes_abort() {
        let abort = AbortSignal::new();
        abort.request("halt");
        let cx = ExecContext::new(&abort, 4);
        assert_eq!(cx.checkpoint(), Err(RuntimeError::Abort("halt".to_string())));
        assert_eq!(cx.checkpoint(), Ok(()));
    }

    #[test]
    fn test_break_outside_loop_ends_sequence() {
        let abort = AbortSignal::new();
        let registers = registers();
        let flow = run("var a = 1; break; a = 2", &registers, &abort).unwrap();
        assert_eq!(flow, Flow::Break);
        assert_eq!(
            registers.variables.borrow().get_value("a").unwrap(),
            Some(Value::Integer(1).into())
        );
    }

    #[test]
    fn test_return_inside_nested_blocks() {
        let abort = AbortSignal::new();
        let registers = registers();
        let source = "var i = 0; while(true) { i++; { if(i == 3) { return i } } } return 0";
        let flow = run(source, &registers, &abort).unwrap();
        assert_eq!(flow, Flow::Return(Some(Value::Integer(3).into())));
    }

    #[test]
    fn test_class_body_rejects_statements() {
        let abort = AbortSignal::new();
        let err = run("class Bad { print(1) }", &registers(), &abort).unwrap_err();
        assert!(matches!(err, RuntimeError::Block(_)), "{err:?}");
    }

    #[test]
    fn test_unexpected_token_is_syntax_error() {
        let abort = AbortSignal::new();
        let err = run("var a = 1; else", &registers(), &abort).unwrap_err();
        assert_eq!(err, RuntimeError::Syntax("unexpected token 'else'".to_string()));
    }
}

//==================================================
// End of file
//==================================================
