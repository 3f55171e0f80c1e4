//==================================================
// File: stdlib_registry.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Default host functions for QuillScript
// Objective: Install print/str into a Runtime, writing output to a sink the
//            host chooses
//==================================================

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::registry::{FunctionError, NativeArity};
use crate::runtime::Runtime;
use crate::value::Value;

//==================================================
// Section 1.0 - Output Sink
//==================================================

/// Where `print` writes.
#[derive(Debug, Clone, Default)]
pub enum OutputSink {
    #[default]
    Stdout,
    /// Shared in-memory buffer, one line per `print` call.
    Buffer(Arc<Mutex<String>>),
}

impl OutputSink {
    pub fn buffer() -> (Self, Arc<Mutex<String>>) {
        let buffer = Arc::new(Mutex::new(String::new()));
        (OutputSink::Buffer(Arc::clone(&buffer)), buffer)
    }

    pub fn write_line(&self, line: &str) -> Result<(), String> {
        match self {
            OutputSink::Stdout => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", line).map_err(|err| err.to_string())
            }
            OutputSink::Buffer(buffer) => {
                let mut buffer = buffer.lock();
                buffer.push_str(line);
                buffer.push('\n');
                Ok(())
            }
        }
    }
}

//==================================================
// Section 2.0 - Registry
//==================================================

type Builtin = fn(&OutputSink, &[Value]) -> Result<Option<Value>, String>;

#[derive(Debug, Clone)]
pub struct StdlibRegistry {
    sink: OutputSink,
    functions: Vec<(&'static str, NativeArity, Builtin)>,
}

impl StdlibRegistry {
    pub fn with_defaults(sink: OutputSink) -> Self {
        let mut registry = Self {
            sink,
            functions: Vec::new(),
        };
        registry.register("print", NativeArity::any(), builtin_print);
        registry.register("str", NativeArity::Exact(1), builtin_str);
        registry
    }

    pub fn register(&mut self, name: &'static str, arity: NativeArity, builtin: Builtin) {
        self.functions.push((name, arity, builtin));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.functions.iter().map(|(name, _, _)| *name).collect()
    }

    /// Register every builtin as a host function on `runtime`.
    pub fn install(&self, runtime: &mut Runtime) -> Result<(), FunctionError> {
        for (name, arity, builtin) in &self.functions {
            let sink = self.sink.clone();
            let builtin = *builtin;
            runtime.register_function(name, *arity, move |args| builtin(&sink, args))?;
        }
        Ok(())
    }
}

fn builtin_print(sink: &OutputSink, args: &[Value]) -> Result<Option<Value>, String> {
    let line = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    sink.write_line(&line)?;
    Ok(None)
}

fn builtin_str(_: &OutputSink, args: &[Value]) -> Result<Option<Value>, String> {
    Ok(args.first().map(|value| Value::String(value.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_joins_arguments() {
        let (sink, buffer) = OutputSink::buffer();
        let mut runtime = Runtime::new();
        StdlibRegistry::with_defaults(sink).install(&mut runtime).unwrap();
        runtime.exec("print('total', 3, 1.5, true)").unwrap();
        assert_eq!(buffer.lock().as_str(), "total 3 1.5 true\n");
    }

    #[test]
    fn test_str_converts_to_string() {
        let (sink, _) = OutputSink::buffer();
        let mut runtime = Runtime::new();
        StdlibRegistry::with_defaults(sink).install(&mut runtime).unwrap();
        let value = runtime.exec("var label = str(42); return label + '!'").unwrap();
        assert_eq!(value, Some(Value::String("42!".to_string()).into()));
    }

    #[test]
    fn test_install_twice_fails() {
        let registry = StdlibRegistry::with_defaults(OutputSink::Stdout);
        let mut runtime = Runtime::new();
        registry.install(&mut runtime).unwrap();
        assert_eq!(
            registry.install(&mut runtime),
            Err(FunctionError::AlreadyDefined("print".to_string()))
        );
        assert_eq!(registry.names(), vec!["print", "str"]);
    }
}

//==================================================
// End of file
//==================================================
