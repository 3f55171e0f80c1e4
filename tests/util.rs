#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use quillscript::{Instance, OutputSink, Runtime, ScriptError, StdlibRegistry, Value};

/// A runtime with the default host functions printing into a buffer.
pub struct Harness {
    pub runtime: Runtime,
    output: Arc<Mutex<String>>,
}

impl Harness {
    pub fn new() -> Self {
        let (sink, output) = OutputSink::buffer();
        let mut runtime = Runtime::new();
        StdlibRegistry::with_defaults(sink)
            .install(&mut runtime)
            .expect("install default host functions");
        Self { runtime, output }
    }

    pub fn with_variable(mut self, name: &str, value: Value) -> Self {
        self.runtime
            .register_variable(name, value)
            .expect("register variable");
        self
    }

    pub fn exec(&mut self, source: &str) -> Result<Option<Instance>, ScriptError> {
        self.runtime.exec(source)
    }

    /// Printed lines so far.
    pub fn lines(&self) -> Vec<String> {
        self.output.lock().lines().map(str::to_string).collect()
    }
}

/// Run `source` and return what it returned, panicking on failure.
pub fn run_quill_source(source: &str) -> Option<Instance> {
    let mut harness = Harness::new();
    harness
        .exec(source)
        .unwrap_or_else(|err| panic!("script failed: {err}\n{source}"))
}

pub fn integer(n: i64) -> Option<Instance> {
    Some(Value::Integer(n).into())
}

pub fn float(n: f64) -> Option<Instance> {
    Some(Value::Float(n).into())
}

pub fn string(text: &str) -> Option<Instance> {
    Some(Value::String(text.to_string()).into())
}

pub fn boolean(b: bool) -> Option<Instance> {
    Some(Value::Bool(b).into())
}
