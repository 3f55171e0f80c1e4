//==================================================
// File: value.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: QuillScript runtime values and class instances
// Objective: Provide the primitive value union, the instance wrapper used by
//            scope frames, and the type tags that back type stability
//==================================================

use std::fmt;
use std::rc::Rc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::registry::Scope;

//==================================================
// Section 1.0 - Primitive Values
//==================================================

/// QuillScript primitive runtime values.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Bool,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Bool(_) => ValueType::Bool,
        }
    }

    /// Re-read this value under another tag, as a literal compared against a
    /// typed binding is. Returns `None` when no faithful conversion exists.
    pub fn coerce_to(&self, target: ValueType) -> Option<Value> {
        if self.value_type() == target {
            return Some(self.clone());
        }
        match (self, target) {
            (Value::Integer(n), ValueType::Float) => Some(Value::Float(*n as f64)),
            (Value::Float(n), ValueType::Integer) if n.fract() == 0.0 => {
                Some(Value::Integer(*n as i64))
            }
            (_, ValueType::String) => Some(Value::String(self.to_string())),
            (Value::String(text), ValueType::Integer) => text.trim().parse().ok().map(Value::Integer),
            (Value::String(text), ValueType::Float) => text.trim().parse().ok().map(Value::Float),
            (Value::String(text), ValueType::Bool) => text.trim().parse().ok().map(Value::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(text) => f.write_str(text),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

//==================================================
// Section 2.0 - Instances
//==================================================

/// What a scope frame binds a name to: a primitive, or a class instance.
#[derive(Clone)]
pub enum Instance {
    Primitive(Value),
    Object(ObjectInstance),
}

/// A class instance: its type name plus the attribute frame it owns.
#[derive(Clone)]
pub struct ObjectInstance {
    type_name: String,
    attributes: Scope,
}

impl ObjectInstance {
    pub fn new(type_name: impl Into<String>, attributes: Scope) -> Self {
        Self {
            type_name: type_name.into(),
            attributes,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn attributes(&self) -> &Scope {
        &self.attributes
    }

    /// Read an attribute from this instance's own frame only.
    pub fn attribute(&self, name: &str) -> Option<Option<Instance>> {
        self.attributes.borrow().get_local(name)
    }

    pub fn same_instance(&self, other: &ObjectInstance) -> bool {
        Rc::ptr_eq(&self.attributes, &other.attributes)
    }
}

impl fmt::Debug for ObjectInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.attributes.borrow().local_names();
        f.debug_struct("ObjectInstance")
            .field("type_name", &self.type_name)
            .field("attributes", &names)
            .finish()
    }
}

/// Tag compared when a binding is updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceTag {
    Value(ValueType),
    Object(String),
}

impl fmt::Display for InstanceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceTag::Value(kind) => write!(f, "{}", kind),
            InstanceTag::Object(name) => write!(f, "instance of {}", name),
        }
    }
}

impl Instance {
    pub fn tag(&self) -> InstanceTag {
        match self {
            Instance::Primitive(value) => InstanceTag::Value(value.value_type()),
            Instance::Object(object) => InstanceTag::Object(object.type_name.clone()),
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Instance::Primitive(value) => Some(value),
            Instance::Object(_) => None,
        }
    }
}

impl From<Value> for Instance {
    fn from(value: Value) -> Self {
        Instance::Primitive(value)
    }
}

impl From<ObjectInstance> for Instance {
    fn from(object: ObjectInstance) -> Self {
        Instance::Object(object)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Instance::Primitive(a), Instance::Primitive(b)) => a == b,
            (Instance::Object(a), Instance::Object(b)) => a.same_instance(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instance::Primitive(value) => write!(f, "{:?}", value),
            Instance::Object(object) => write!(f, "{:?}", object),
        }
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instance::Primitive(value) => write!(f, "{}", value),
            Instance::Object(object) => write!(f, "<{} instance>", object.type_name),
        }
    }
}

// Nested instances serialize as their Display form so self-referencing
// attributes cannot recurse forever.
impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Instance::Primitive(value) => value.serialize(serializer),
            Instance::Object(object) => {
                let attributes = object.attributes.borrow().local_bindings();
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", &object.type_name)?;
                let flattened: std::collections::BTreeMap<String, serde_json::Value> = attributes
                    .into_iter()
                    .map(|(name, instance)| {
                        let json = match instance {
                            Instance::Primitive(value) => {
                                serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
                            }
                            nested @ Instance::Object(_) => {
                                serde_json::Value::String(nested.to_string())
                            }
                        };
                        (name, json)
                    })
                    .collect();
                map.serialize_entry("attributes", &flattened)?;
                map.end()
            }
        }
    }
}


//==================================================
// End of file
//==================================================
