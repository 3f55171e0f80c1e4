//==================================================
// File: registry/variables.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Parent-linked variable scope frames
// Objective: Enforce per-frame declaration, read/write-through lookup,
//            type stability and constant immutability
//==================================================

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::value::{Instance, InstanceTag};

/// Shared handle to one scope frame.
pub type Scope = Rc<RefCell<VariableRegistry>>;

//==================================================
// Section 1.0 - Variable Errors
//==================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariableError {
    #[error("variable '{0}' is already declared in this scope")]
    AlreadyDeclared(String),
    #[error("variable '{0}' is not declared")]
    Undeclared(String),
    #[error("variable '{name}' holds {expected} and cannot be assigned {found}")]
    TypeMismatch {
        name: String,
        expected: InstanceTag,
        found: InstanceTag,
    },
    #[error("constant '{0}' cannot be reassigned")]
    ConstantUpdate(String),
    #[error("variable '{0}' has no value")]
    Uninitialized(String),
    #[error("'{operator}' on '{name}' requires an integer, found {found}")]
    NotAnInteger {
        name: String,
        operator: &'static str,
        found: String,
    },
    #[error("{type_name} has no attribute '{attribute}'")]
    UnknownAttribute { type_name: String, attribute: String },
}

//==================================================
// Section 2.0 - Variable Registry
//==================================================

/// One scope frame. `None` marks a name declared without a value.
///
/// Reads and updates fall through to ancestors; declarations always land in
/// this frame. The parent link is weak: the frame that created a child always
/// outlives the child's execution, and an instance's attribute frame must not
/// keep the scope it was constructed in alive.
#[derive(Debug, Default)]
pub struct VariableRegistry {
    values: HashMap<String, Option<Instance>>,
    constants: HashSet<String>,
    parent: Option<Weak<RefCell<VariableRegistry>>>,
}

impl VariableRegistry {
    pub fn root() -> Scope {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn child_of(parent: &Scope) -> Scope {
        Rc::new(RefCell::new(Self {
            parent: Some(Rc::downgrade(parent)),
            ..Self::default()
        }))
    }

    /// The enclosing frame, if it is still alive.
    pub fn parent(&self) -> Option<Scope> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Drop every binding of this frame, keeping its place in the chain.
    pub fn clear(&mut self) {
        self.values.clear();
        self.constants.clear();
    }

    pub fn register_variable(
        &mut self,
        name: &str,
        value: Option<Instance>,
    ) -> Result<(), VariableError> {
        if self.values.contains_key(name) {
            return Err(VariableError::AlreadyDeclared(name.to_string()));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn register_value(&mut self, name: &str, value: Instance) -> Result<(), VariableError> {
        self.register_variable(name, Some(value))
    }

    pub fn register_constant(
        &mut self,
        name: &str,
        value: Option<Instance>,
    ) -> Result<(), VariableError> {
        self.register_variable(name, value)?;
        self.constants.insert(name.to_string());
        Ok(())
    }

    /// Replace the value of an existing binding in whichever frame owns it.
    pub fn update_value(&mut self, name: &str, value: Instance) -> Result<(), VariableError> {
        if self.values.contains_key(name) {
            return self.replace_local(name, value);
        }
        match self.parent() {
            Some(parent) => parent.borrow_mut().update_value(name, value),
            None => Err(VariableError::Undeclared(name.to_string())),
        }
    }

    /// Write a binding in this frame, declaring it when absent.
    pub fn assign_local(&mut self, name: &str, value: Instance) -> Result<(), VariableError> {
        if self.values.contains_key(name) {
            self.replace_local(name, value)
        } else {
            self.register_value(name, value)
        }
    }

    fn replace_local(&mut self, name: &str, value: Instance) -> Result<(), VariableError> {
        if self.constants.contains(name) {
            return Err(VariableError::ConstantUpdate(name.to_string()));
        }
        let slot = self
            .values
            .get_mut(name)
            .ok_or_else(|| VariableError::Undeclared(name.to_string()))?;
        if let Some(current) = slot {
            let (expected, found) = (current.tag(), value.tag());
            if expected != found {
                return Err(VariableError::TypeMismatch {
                    name: name.to_string(),
                    expected,
                    found,
                });
            }
        }
        *slot = Some(value);
        Ok(())
    }

    pub fn get_value(&self, name: &str) -> Result<Option<Instance>, VariableError> {
        if let Some(value) = self.values.get(name) {
            return Ok(value.clone());
        }
        match self.parent() {
            Some(parent) => parent.borrow().get_value(name),
            None => Err(VariableError::Undeclared(name.to_string())),
        }
    }

    pub fn value_exists(&self, name: &str) -> bool {
        self.values.contains_key(name)
            || self
                .parent()
                .is_some_and(|parent| parent.borrow().value_exists(name))
    }

    pub fn is_constant(&self, name: &str) -> bool {
        if self.values.contains_key(name) {
            return self.constants.contains(name);
        }
        self.parent()
            .is_some_and(|parent| parent.borrow().is_constant(name))
    }

    /// Look a name up in this frame only.
    pub fn get_local(&self, name: &str) -> Option<Option<Instance>> {
        self.values.get(name).cloned()
    }

    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.keys().cloned().collect();
        names.sort();
        names
    }

    /// Initialised bindings of this frame only.
    pub fn local_bindings(&self) -> BTreeMap<String, Instance> {
        self.values
            .iter()
            .filter_map(|(name, value)| value.clone().map(|value| (name.clone(), value)))
            .collect()
    }

    /// Every visible initialised binding, descendants overriding ancestors.
    pub fn snapshot(&self) -> BTreeMap<String, Instance> {
        let mut merged = self
            .parent()
            .map(|parent| parent.borrow().snapshot())
            .unwrap_or_default();
        for (name, value) in &self.values {
            match value {
                Some(value) => {
                    merged.insert(name.clone(), value.clone());
                }
                None => {
                    merged.remove(name);
                }
            }
        }
        merged
    }

    /// Copy this frame's bindings and constant marks into `target`.
    pub fn copy_into(&self, target: &mut VariableRegistry) -> Result<(), VariableError> {
        for (name, value) in &self.values {
            if self.constants.contains(name) {
                target.register_constant(name, value.clone())?;
            } else {
                target.register_variable(name, value.clone())?;
            }
        }
        Ok(())
    }
}

//==================================================
// Section 3.0 - Tests
//==================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn int(n: i64) -> Instance {
        Value::Integer(n).into()
    }

    #[test]
    fn test_duplicate_in_same_frame_fails() {
        let scope = VariableRegistry::root();
        scope.borrow_mut().register_value("a", int(1)).unwrap();
        let err = scope.borrow_mut().register_value("a", int(2)).unwrap_err();
        assert_eq!(err, VariableError::AlreadyDeclared("a".into()));
    }

    #[test]
    fn test_child_shadows_without_touching_parent() {
        let parent = VariableRegistry::root();
        parent.borrow_mut().register_value("a", int(1)).unwrap();
        let child = VariableRegistry::child_of(&parent);
        child.borrow_mut().register_value("a", int(2)).unwrap();
        assert_eq!(child.borrow().get_value("a").unwrap(), Some(int(2)));
        assert_eq!(parent.borrow().get_value("a").unwrap(), Some(int(1)));
    }

    #[test]
    fn test_update_writes_through_to_owner() {
        let parent = VariableRegistry::root();
        parent.borrow_mut().register_value("a", int(1)).unwrap();
        let child = VariableRegistry::child_of(&parent);
        child.borrow_mut().update_value("a", int(5)).unwrap();
        assert_eq!(parent.borrow().get_value("a").unwrap(), Some(int(5)));
        assert!(child.borrow().get_local("a").is_none());
    }

    #[test]
    fn test_type_stability() {
        let scope = VariableRegistry::root();
        scope.borrow_mut().register_value("a", int(1)).unwrap();
        let err = scope
            .borrow_mut()
            .update_value("a", Value::from("text").into())
            .unwrap_err();
        assert!(matches!(err, VariableError::TypeMismatch { .. }), "{err:?}");
    }

    #[test]
    fn test_uninitialised_accepts_any_tag_once() {
        let scope = VariableRegistry::root();
        scope.borrow_mut().register_variable("a", None).unwrap();
        scope
            .borrow_mut()
            .update_value("a", Value::from("text").into())
            .unwrap();
        assert!(scope.borrow_mut().update_value("a", int(3)).is_err());
    }

    #[test]
    fn test_constants_never_update() {
        let parent = VariableRegistry::root();
        parent
            .borrow_mut()
            .register_constant("limit", Some(int(10)))
            .unwrap();
        let child = VariableRegistry::child_of(&parent);
        assert!(child.borrow().is_constant("limit"));
        let err = child.borrow_mut().update_value("limit", int(11)).unwrap_err();
        assert_eq!(err, VariableError::ConstantUpdate("limit".into()));
    }

    #[test]
    fn test_undeclared_read() {
        let scope = VariableRegistry::root();
        assert_eq!(
            scope.borrow().get_value("ghost").unwrap_err(),
            VariableError::Undeclared("ghost".into())
        );
        assert!(!scope.borrow().value_exists("ghost"));
    }

    #[test]
    fn test_snapshot_merges_ancestors() {
        let parent = VariableRegistry::root();
        parent.borrow_mut().register_value("a", int(1)).unwrap();
        parent.borrow_mut().register_value("b", int(2)).unwrap();
        let child = VariableRegistry::child_of(&parent);
        child.borrow_mut().register_value("b", int(20)).unwrap();
        child.borrow_mut().register_variable("c", None).unwrap();
        let snapshot = child.borrow().snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["a"], int(1));
        assert_eq!(snapshot["b"], int(20));
    }

    #[test]
    fn test_clear_keeps_children_linked() {
        let parent = VariableRegistry::root();
        parent.borrow_mut().register_constant("a", Some(int(1))).unwrap();
        let child = VariableRegistry::child_of(&parent);
        parent.borrow_mut().clear();
        assert!(!child.borrow().value_exists("a"));
        parent.borrow_mut().register_value("a", int(2)).unwrap();
        assert_eq!(child.borrow().get_value("a").unwrap(), Some(int(2)));
    }

    #[test]
    fn test_dropped_parent_ends_lookup() {
        let child = {
            let parent = VariableRegistry::root();
            parent.borrow_mut().register_value("a", int(1)).unwrap();
            VariableRegistry::child_of(&parent)
        };
        assert!(child.borrow().get_value("a").is_err());
    }
}

//==================================================
// End of file
//==================================================
