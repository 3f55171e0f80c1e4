//==================================================
// File: runtime/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Host embedding surface for QuillScript
// Objective: Own the root registries across exec calls, expose registration,
//            execution, memory inspection and cooperative abort to the host
//==================================================

mod abort;
mod preprocess;

use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

pub use abort::{AbortHandle, AbortSignal};
pub use preprocess::strip_comments;

use crate::interpreter::{ExecContext, Interpreter, ScriptError};
use crate::registry::{
    ExternalFunctionRegistry, FunctionError, FunctionScope, LocalFunctionRegistry, NativeArity,
    ObjectScope, ObjectTypeRegistry, RegisterSet, Scope, VariableError, VariableRegistry,
};
use crate::tokenizer::{TokenSpan, Tokenizer};
use crate::value::{Instance, Value};

//==================================================
// Section 1.0 - Options
//==================================================

pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Nested function, method and constructor calls allowed before failing.
    pub max_call_depth: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

//==================================================
// Section 2.0 - Runtime
//==================================================

/// A QuillScript instance. Top-level variables, functions and classes
/// persist from one `exec` call to the next.
pub struct Runtime {
    variables: Scope,
    functions: FunctionScope,
    objects: ObjectScope,
    externals: Rc<ExternalFunctionRegistry>,
    abort: Arc<AbortSignal>,
    options: RuntimeOptions,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_options(RuntimeOptions::default())
    }

    pub fn with_options(options: RuntimeOptions) -> Self {
        Self {
            variables: VariableRegistry::root(),
            functions: LocalFunctionRegistry::root(),
            objects: ObjectTypeRegistry::root(),
            externals: Rc::new(ExternalFunctionRegistry::default()),
            abort: Arc::new(AbortSignal::new()),
            options,
        }
    }

    pub fn options(&self) -> RuntimeOptions {
        self.options
    }

    /// Register a host function callable from scripts by `name`.
    pub fn register_function<F>(
        &mut self,
        name: &str,
        arity: NativeArity,
        callback: F,
    ) -> Result<(), FunctionError>
    where
        F: Fn(&[Value]) -> Result<Option<Value>, String> + 'static,
    {
        Rc::make_mut(&mut self.externals).register(name, arity, callback)
    }

    pub fn register_variable(&mut self, name: &str, value: Value) -> Result<(), VariableError> {
        self.variables
            .borrow_mut()
            .register_value(name, Instance::from(value))
    }

    pub fn register_constant(&mut self, name: &str, value: Value) -> Result<(), VariableError> {
        self.variables
            .borrow_mut()
            .register_constant(name, Some(Instance::from(value)))
    }

    /// Strip comments, tokenize and run `source` against the root registries.
    ///
    /// Returns the value of a top-level `return`, if one ran.
    pub fn exec(&mut self, source: &str) -> Result<Option<Instance>, ScriptError> {
        let source = strip_comments(source);
        let tokens = Tokenizer::new(&source).tokenize()?;
        debug!(tokens = tokens.len(), "exec start");

        let span = TokenSpan::new(Rc::from(tokens));
        let registers = RegisterSet::new(
            Rc::clone(&self.variables),
            Rc::clone(&self.functions),
            Rc::clone(&self.externals),
            Rc::clone(&self.objects),
        );
        let cx = ExecContext::new(&self.abort, self.options.max_call_depth);

        let outcome = Interpreter::new(span, registers, cx).execute();
        // An abort that lands after the last checkpoint targeted this call only.
        if let Some(reason) = self.abort.take() {
            debug!(%reason, "discarding abort requested after the final checkpoint");
        }

        match outcome {
            Ok(flow) => {
                let value = flow.into_return_value();
                debug!(returned = value.is_some(), "exec finished");
                Ok(value)
            }
            Err(error) => {
                debug!(code = error.code().as_str(), %error, "exec failed");
                Err(error.into())
            }
        }
    }

    /// Every visible top-level binding that currently holds a value.
    pub fn memory_dump(&self) -> BTreeMap<String, Instance> {
        self.variables.borrow().snapshot()
    }

    /// Drop all top-level variable bindings. Functions and classes remain.
    pub fn clear_memory(&mut self) {
        self.variables.borrow_mut().clear();
    }

    /// A `Send + Sync` handle that can request an abort from any thread.
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle::new(Arc::clone(&self.abort))
    }

    pub fn abort(&self, reason: impl Into<String>) {
        self.abort.request(reason);
    }
}


//==================================================
// End of file
//==================================================
