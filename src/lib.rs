pub mod config;
pub mod interpreter;
pub mod parser;
pub mod registry;
pub mod runtime;
pub mod stdlib_registry;
pub mod tokenizer;
pub mod value;

pub use interpreter::{ErrorCode, ScriptError};
pub use registry::NativeArity;
pub use runtime::{AbortHandle, Runtime, RuntimeOptions};
pub use stdlib_registry::{OutputSink, StdlibRegistry};
pub use value::{Instance, Value};
