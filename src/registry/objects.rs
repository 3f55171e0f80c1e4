//==================================================
// File: registry/objects.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Class (object type) registry
// Objective: Map class names to their attribute template and method frame
//==================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::functions::{FunctionError, FunctionScope, LocalFunction, LocalFunctionRegistry};
use super::variables::{Scope, VariableError, VariableRegistry};
use crate::value::ObjectInstance;

pub type ObjectScope = Rc<RefCell<ObjectTypeRegistry>>;

/// A class: attribute template plus its own method frame.
#[derive(Debug)]
pub struct ObjectType {
    pub name: String,
    pub attributes: Scope,
    pub methods: FunctionScope,
}

impl ObjectType {
    /// Create an empty class whose template and methods chain to the defining scope.
    pub fn new(name: impl Into<String>, variables: &Scope, functions: &FunctionScope) -> Self {
        Self {
            name: name.into(),
            attributes: VariableRegistry::child_of(variables),
            methods: LocalFunctionRegistry::child_of(functions),
        }
    }

    /// Methods are looked up on the class itself, never on enclosing scopes.
    pub fn method(&self, name: &str) -> Option<Rc<LocalFunction>> {
        self.methods.borrow().get_local(name)
    }

    /// Build a fresh instance whose attribute frame starts as a copy of the
    /// template and chains to the scope the class was defined in.
    pub fn instantiate(&self) -> Result<ObjectInstance, VariableError> {
        let attributes = match self.attributes.borrow().parent() {
            Some(defining) => VariableRegistry::child_of(&defining),
            None => VariableRegistry::root(),
        };
        self.attributes
            .borrow()
            .copy_into(&mut attributes.borrow_mut())?;
        Ok(ObjectInstance::new(self.name.clone(), attributes))
    }
}

#[derive(Debug, Default)]
pub struct ObjectTypeRegistry {
    types: HashMap<String, Rc<ObjectType>>,
    parent: Option<Weak<RefCell<ObjectTypeRegistry>>>,
}

impl ObjectTypeRegistry {
    pub fn root() -> ObjectScope {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn child_of(parent: &ObjectScope) -> ObjectScope {
        Rc::new(RefCell::new(Self {
            types: HashMap::new(),
            parent: Some(Rc::downgrade(parent)),
        }))
    }

    pub fn register(&mut self, object_type: ObjectType) -> Result<Rc<ObjectType>, FunctionError> {
        if self.types.contains_key(&object_type.name) {
            return Err(FunctionError::ClassAlreadyDefined(object_type.name));
        }
        let object_type = Rc::new(object_type);
        self.types
            .insert(object_type.name.clone(), Rc::clone(&object_type));
        Ok(object_type)
    }

    pub fn get(&self, name: &str) -> Option<Rc<ObjectType>> {
        if let Some(object_type) = self.types.get(name) {
            return Some(Rc::clone(object_type));
        }
        self.parent
            .as_ref()
            .and_then(Weak::upgrade)
            .and_then(|parent| parent.borrow().get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Instance, Value};

    #[test]
    fn test_instances_copy_template_independently() {
        let variables = VariableRegistry::root();
        let functions = LocalFunctionRegistry::root();
        let car = ObjectType::new("Car", &variables, &functions);
        car.attributes
            .borrow_mut()
            .register_value("speed", Value::Integer(0).into())
            .unwrap();
        car.attributes
            .borrow_mut()
            .register_constant("wheels", Some(Value::Integer(4).into()))
            .unwrap();

        let first = car.instantiate().unwrap();
        let second = car.instantiate().unwrap();
        first
            .attributes()
            .borrow_mut()
            .update_value("speed", Value::Integer(30).into())
            .unwrap();

        assert_eq!(
            first.attribute("speed"),
            Some(Some(Instance::from(Value::Integer(30))))
        );
        assert_eq!(
            second.attribute("speed"),
            Some(Some(Instance::from(Value::Integer(0))))
        );
        assert!(first.attributes().borrow().is_constant("wheels"));
    }

    #[test]
    fn test_registry_lookup_and_duplicates() {
        let variables = VariableRegistry::root();
        let functions = LocalFunctionRegistry::root();
        let outer = ObjectTypeRegistry::root();
        outer
            .borrow_mut()
            .register(ObjectType::new("Car", &variables, &functions))
            .unwrap();
        let inner = ObjectTypeRegistry::child_of(&outer);
        assert!(inner.borrow().contains("Car"));
        let err = outer
            .borrow_mut()
            .register(ObjectType::new("Car", &variables, &functions))
            .unwrap_err();
        assert_eq!(err, FunctionError::ClassAlreadyDefined("Car".into()));
    }
}

//==================================================
// End of file
//==================================================
