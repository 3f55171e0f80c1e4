//==================================================
// File: registry/functions.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Script-defined and host-registered function registries
// Objective: Store local functions in parent-linked frames and host callbacks
//            behind arity-checked wrappers
//==================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::tokenizer::TokenSpan;
use crate::value::Value;

pub type FunctionScope = Rc<RefCell<LocalFunctionRegistry>>;

//==================================================
// Section 1.0 - Function Errors
//==================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctionError {
    #[error("function '{0}' is already defined")]
    AlreadyDefined(String),
    #[error("class '{0}' is already defined")]
    ClassAlreadyDefined(String),
    #[error("function '{0}' is not defined")]
    Undefined(String),
    #[error("function '{name}' expects {expected} arguments, found {found}")]
    ArgumentCount {
        name: String,
        expected: String,
        found: usize,
    },
    #[error("function '{name}' failed: {message}")]
    External { name: String, message: String },
    #[error("host function '{name}' cannot receive {found}")]
    InvalidArgument { name: String, found: String },
    #[error("argument {position} of '{name}' produced no value")]
    VoidArgument { name: String, position: usize },
    #[error("call depth exceeded the limit of {0}")]
    CallDepthExceeded(usize),
    #[error("'{0}' is not a class instance")]
    NotAnObject(String),
    #[error("{type_name} has no method '{method}'")]
    UnknownMethod { type_name: String, method: String },
}

//==================================================
// Section 2.0 - Local Functions
//==================================================

/// A function defined in script code.
#[derive(Debug, Clone)]
pub struct LocalFunction {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: TokenSpan,
}

/// One frame of script-defined functions; lookups fall through to ancestors.
#[derive(Debug, Default)]
pub struct LocalFunctionRegistry {
    functions: HashMap<String, Rc<LocalFunction>>,
    parent: Option<Weak<RefCell<LocalFunctionRegistry>>>,
}

impl LocalFunctionRegistry {
    pub fn root() -> FunctionScope {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn child_of(parent: &FunctionScope) -> FunctionScope {
        Rc::new(RefCell::new(Self {
            functions: HashMap::new(),
            parent: Some(Rc::downgrade(parent)),
        }))
    }

    pub fn register(&mut self, function: LocalFunction) -> Result<(), FunctionError> {
        if self.functions.contains_key(&function.name) {
            return Err(FunctionError::AlreadyDefined(function.name));
        }
        self.functions
            .insert(function.name.clone(), Rc::new(function));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Rc<LocalFunction>> {
        if let Some(function) = self.functions.get(name) {
            return Some(Rc::clone(function));
        }
        self.parent
            .as_ref()
            .and_then(Weak::upgrade)
            .and_then(|parent| parent.borrow().get(name))
    }

    pub fn get_local(&self, name: &str) -> Option<Rc<LocalFunction>> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

//==================================================
// Section 3.0 - Native Function Arity
//==================================================

/// Supported arity constraints for host (external) functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeArity {
    /// The function expects exactly this many arguments.
    Exact(usize),
    /// Inclusive minimum and optional maximum; `None` means unbounded.
    Range { min: usize, max: Option<usize> },
}

impl NativeArity {
    pub fn any() -> Self {
        NativeArity::Range { min: 0, max: None }
    }

    pub fn accepts(&self, count: usize) -> bool {
        match self {
            NativeArity::Exact(n) => *n == count,
            NativeArity::Range { min, max } => {
                count >= *min && max.is_none_or(|max| count <= max)
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            NativeArity::Exact(n) => n.to_string(),
            NativeArity::Range { min, max } => match max {
                Some(max) if min == max => min.to_string(),
                Some(max) => format!("{}..={}", min, max),
                None if *min == 0 => "any number of".to_string(),
                None => format!("at least {}", min),
            },
        }
    }
}

//==================================================
// Section 4.0 - External Functions
//==================================================

/// Host callback: receives evaluated arguments, optionally returns a value.
pub type NativeCallback = Rc<dyn Fn(&[Value]) -> Result<Option<Value>, String>>;

#[derive(Clone)]
pub struct ExternalFunction {
    pub name: String,
    pub arity: NativeArity,
    callback: NativeCallback,
}

impl ExternalFunction {
    pub fn call(&self, args: &[Value]) -> Result<Option<Value>, FunctionError> {
        if !self.arity.accepts(args.len()) {
            return Err(FunctionError::ArgumentCount {
                name: self.name.clone(),
                expected: self.arity.describe(),
                found: args.len(),
            });
        }
        (self.callback)(args).map_err(|message| FunctionError::External {
            name: self.name.clone(),
            message,
        })
    }
}

impl fmt::Debug for ExternalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Host callbacks by name. A single flat table shared by every scope.
#[derive(Debug, Clone, Default)]
pub struct ExternalFunctionRegistry {
    functions: HashMap<String, ExternalFunction>,
}

impl ExternalFunctionRegistry {
    pub fn register<F>(&mut self, name: &str, arity: NativeArity, callback: F) -> Result<(), FunctionError>
    where
        F: Fn(&[Value]) -> Result<Option<Value>, String> + 'static,
    {
        if self.functions.contains_key(name) {
            return Err(FunctionError::AlreadyDefined(name.to_string()));
        }
        self.functions.insert(
            name.to_string(),
            ExternalFunction {
                name: name.to_string(),
                arity,
                callback: Rc::new(callback),
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ExternalFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}


//==================================================
// End of file
//==================================================
