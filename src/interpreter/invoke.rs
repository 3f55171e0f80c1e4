//==================================================
// File: interpreter/invoke.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Function, method and constructor invocation
// Objective: Resolve call targets through the register set, bind parameters
//            in fresh frames and re-enter the interpreter on callee bodies
//==================================================

use std::rc::Rc;

use tracing::debug;

use super::{ExecContext, Interpreter, RuntimeError};
use crate::registry::{
    ExternalFunction, FunctionError, LocalFunction, ObjectType, RegisterSet, VariableError,
};
use crate::value::{Instance, ObjectInstance, Value};

/// Evaluated call arguments; `None` is an argument that produced no value.
pub type Arguments = Vec<Option<Instance>>;

//==================================================
// Section 1.0 - Name Resolution
//==================================================

/// Call `name` as a local function, a class constructor or a host function,
/// in that order.
pub(crate) fn call_named(
    name: &str,
    arguments: Arguments,
    registers: &RegisterSet,
    cx: ExecContext<'_>,
) -> Result<Option<Instance>, RuntimeError> {
    let local = registers.functions.borrow().get(name);
    if let Some(function) = local {
        // A sibling method called by bare name keeps the current receiver.
        if let Some(receiver) = &registers.receiver {
            if is_method_of(receiver, &function, registers) {
                return call_method(receiver, name, arguments, registers, cx);
            }
        }
        debug!(function = %name, depth = cx.depth(), "calling local function");
        return run_body(&function, arguments, registers.with_function_scope(), cx);
    }

    let object_type = registers.objects.borrow().get(name);
    if let Some(object_type) = object_type {
        return construct(&object_type, arguments, registers, cx).map(|object| Some(object.into()));
    }

    if let Some(external) = registers.externals.get(name) {
        debug!(function = %name, "calling host function");
        return call_external(external, arguments);
    }

    Err(FunctionError::Undefined(name.to_string()).into())
}

/// Read a variable, with `self` naming the receiver inside method bodies.
pub(crate) fn read_variable(
    registers: &RegisterSet,
    name: &str,
) -> Result<Option<Instance>, RuntimeError> {
    if name == "self" {
        if let Some(receiver) = &registers.receiver {
            return Ok(Some(receiver.clone().into()));
        }
    }
    Ok(registers.variables.borrow().get_value(name)?)
}

fn is_method_of(
    receiver: &ObjectInstance,
    function: &Rc<LocalFunction>,
    registers: &RegisterSet,
) -> bool {
    let object_type = registers.objects.borrow().get(receiver.type_name());
    object_type
        .and_then(|object_type| object_type.method(&function.name))
        .is_some_and(|method| Rc::ptr_eq(&method, function))
}

pub(crate) fn expect_object(value: Option<Instance>) -> Result<ObjectInstance, FunctionError> {
    match value {
        Some(Instance::Object(object)) => Ok(object),
        Some(Instance::Primitive(value)) => Err(FunctionError::NotAnObject(value.to_string())),
        None => Err(FunctionError::NotAnObject("nil".to_string())),
    }
}

pub(crate) fn read_attribute(
    object: &ObjectInstance,
    attribute: &str,
) -> Result<Option<Instance>, VariableError> {
    object
        .attribute(attribute)
        .ok_or_else(|| VariableError::UnknownAttribute {
            type_name: object.type_name().to_string(),
            attribute: attribute.to_string(),
        })
}

//==================================================
// Section 2.0 - Bodies
//==================================================

/// Bind parameters into the first frame of `registers` and run the body.
fn run_body(
    function: &LocalFunction,
    arguments: Arguments,
    registers: RegisterSet,
    cx: ExecContext<'_>,
) -> Result<Option<Instance>, RuntimeError> {
    if arguments.len() != function.parameters.len() {
        return Err(FunctionError::ArgumentCount {
            name: function.name.clone(),
            expected: function.parameters.len().to_string(),
            found: arguments.len(),
        }
        .into());
    }
    let cx = cx.enter_call()?;

    {
        let mut frame = registers.variables.borrow_mut();
        for (parameter, value) in function.parameters.iter().zip(arguments) {
            frame.register_variable(parameter, value)?;
        }
    }

    let flow = Interpreter::new(function.body.clone(), registers, cx).execute()?;
    Ok(flow.into_return_value())
}

/// Run `method` on `object`, with attributes visible through the scope chain.
pub(crate) fn call_method(
    object: &ObjectInstance,
    method: &str,
    arguments: Arguments,
    registers: &RegisterSet,
    cx: ExecContext<'_>,
) -> Result<Option<Instance>, RuntimeError> {
    let unknown = || FunctionError::UnknownMethod {
        type_name: object.type_name().to_string(),
        method: method.to_string(),
    };
    let object_type = registers
        .objects
        .borrow()
        .get(object.type_name())
        .ok_or_else(unknown)?;
    let function = object_type.method(method).ok_or_else(unknown)?;

    debug!(class = %object.type_name(), method = %method, depth = cx.depth(), "calling method");
    run_body(
        &function,
        arguments,
        registers.with_method_scope(object, &object_type),
        cx,
    )
}

/// Create an instance and run `init` on it when the class declares one.
fn construct(
    object_type: &ObjectType,
    arguments: Arguments,
    registers: &RegisterSet,
    cx: ExecContext<'_>,
) -> Result<ObjectInstance, RuntimeError> {
    debug!(class = %object_type.name, arguments = arguments.len(), "constructing instance");
    let instance = object_type.instantiate()?;
    match object_type.method("init") {
        Some(init) => {
            run_body(
                &init,
                arguments,
                registers.with_method_scope(&instance, object_type),
                cx,
            )?;
        }
        None if !arguments.is_empty() => {
            return Err(FunctionError::ArgumentCount {
                name: object_type.name.clone(),
                expected: "0".to_string(),
                found: arguments.len(),
            }
            .into());
        }
        None => {}
    }
    Ok(instance)
}

/// Host functions only see primitives.
fn call_external(
    external: &ExternalFunction,
    arguments: Arguments,
) -> Result<Option<Instance>, RuntimeError> {
    let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
    for (position, argument) in arguments.into_iter().enumerate() {
        match argument {
            Some(Instance::Primitive(value)) => values.push(value),
            Some(Instance::Object(object)) => {
                return Err(FunctionError::InvalidArgument {
                    name: external.name.clone(),
                    found: format!("an instance of {}", object.type_name()),
                }
                .into());
            }
            None => {
                return Err(FunctionError::VoidArgument {
                    name: external.name.clone(),
                    position: position + 1,
                }
                .into());
            }
        }
    }
    Ok(external.call(&values)?.map(Instance::from))
}

//==================================================
// End of file
//==================================================
