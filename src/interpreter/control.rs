//==================================================
// File: interpreter/control.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Control-flow outcome of a statement sequence
//==================================================

use crate::value::Instance;

/// How a statement sequence ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Ran off the end of its tokens.
    Finished,
    /// `return`, with the value if one was given.
    Return(Option<Instance>),
    /// `break`; the nearest loop or switch consumes it.
    Break,
}

impl Flow {
    pub fn is_finished(&self) -> bool {
        matches!(self, Flow::Finished)
    }

    /// The value a function call yields for this outcome.
    pub fn into_return_value(self) -> Option<Instance> {
        match self {
            Flow::Return(value) => value,
            Flow::Finished | Flow::Break => None,
        }
    }
}

//==================================================
// End of file
//==================================================
