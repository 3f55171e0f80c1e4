//==================================================
// File: registry/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Scope registries threaded through every execution
// Objective: Bundle variable, function, host-function and class registries
//            into the RegisterSet handed to nested interpreters
//==================================================

pub mod functions;
pub mod objects;
pub mod variables;

use std::rc::Rc;

pub use functions::{
    ExternalFunction, ExternalFunctionRegistry, FunctionError, FunctionScope, LocalFunction,
    LocalFunctionRegistry, NativeArity, NativeCallback,
};
pub use objects::{ObjectScope, ObjectType, ObjectTypeRegistry};
pub use variables::{Scope, VariableError, VariableRegistry};

use crate::value::ObjectInstance;

/// Everything a statement can resolve names against.
///
/// Cloning shares every registry; the `with_*` constructors swap in fresh
/// child frames for nested constructs.
#[derive(Clone)]
pub struct RegisterSet {
    pub variables: Scope,
    pub functions: FunctionScope,
    pub externals: Rc<ExternalFunctionRegistry>,
    pub objects: ObjectScope,
    /// The instance a method body runs against.
    pub receiver: Option<ObjectInstance>,
}

impl RegisterSet {
    pub fn new(
        variables: Scope,
        functions: FunctionScope,
        externals: Rc<ExternalFunctionRegistry>,
        objects: ObjectScope,
    ) -> Self {
        Self {
            variables,
            functions,
            externals,
            objects,
            receiver: None,
        }
    }

    /// New variable frame for an if/while/for/switch/bare block body.
    pub fn with_block_scope(&self) -> Self {
        Self {
            variables: VariableRegistry::child_of(&self.variables),
            ..self.clone()
        }
    }

    /// New variable, function and class frames for a function body.
    pub fn with_function_scope(&self) -> Self {
        Self {
            variables: VariableRegistry::child_of(&self.variables),
            functions: LocalFunctionRegistry::child_of(&self.functions),
            externals: Rc::clone(&self.externals),
            objects: ObjectTypeRegistry::child_of(&self.objects),
            receiver: None,
        }
    }

    /// Frames for a method body: variables chain to the receiver's attributes.
    pub fn with_method_scope(&self, receiver: &ObjectInstance, object_type: &ObjectType) -> Self {
        Self {
            variables: VariableRegistry::child_of(receiver.attributes()),
            functions: LocalFunctionRegistry::child_of(&object_type.methods),
            externals: Rc::clone(&self.externals),
            objects: Rc::clone(&self.objects),
            receiver: Some(receiver.clone()),
        }
    }

    /// Registers used while a class body is being declared.
    pub fn with_class_body(&self, object_type: &ObjectType) -> Self {
        Self {
            variables: Rc::clone(&object_type.attributes),
            functions: Rc::clone(&object_type.methods),
            receiver: None,
            ..self.clone()
        }
    }
}

//==================================================
// End of file
//==================================================
