//==================================================
// File: config.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Run configuration for the quill CLI
// Objective: Load call-depth limits and initial bindings from TOML and apply
//            them, together with command-line overrides, to a Runtime
//==================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::runtime::{Runtime, RuntimeOptions};
use crate::value::Value;

/// Configuration model loaded from a `quill.toml`-style file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// Overrides the default nested-call limit.
    pub max_call_depth: Option<usize>,
    /// Mutable bindings created before the script runs.
    pub variables: BTreeMap<String, toml::Value>,
    /// Read-only bindings created before the script runs.
    pub constants: BTreeMap<String, toml::Value>,
}

impl RunConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading configuration from {}", path.display()))?;
        let config: Self = toml::from_str(&data)
            .with_context(|| format!("parsing configuration {}", path.display()))?;
        // Surface bad binding kinds at load time rather than at apply time.
        for (name, value) in config.variables.iter().chain(&config.constants) {
            toml_to_value(name, value)?;
        }
        Ok(config)
    }

    pub fn runtime_options(&self) -> RuntimeOptions {
        let mut options = RuntimeOptions::default();
        if let Some(depth) = self.max_call_depth {
            options.max_call_depth = depth;
        }
        options
    }

    /// Register the configured bindings on `runtime`.
    pub fn apply(&self, runtime: &mut Runtime) -> anyhow::Result<()> {
        for (name, value) in &self.variables {
            runtime
                .register_variable(name, toml_to_value(name, value)?)
                .with_context(|| format!("registering variable '{}'", name))?;
        }
        for (name, value) in &self.constants {
            runtime
                .register_constant(name, toml_to_value(name, value)?)
                .with_context(|| format!("registering constant '{}'", name))?;
        }
        Ok(())
    }
}

fn toml_to_value(name: &str, value: &toml::Value) -> anyhow::Result<Value> {
    Ok(match value {
        toml::Value::String(text) => Value::String(text.clone()),
        toml::Value::Integer(n) => Value::Integer(*n),
        toml::Value::Float(n) => Value::Float(*n),
        toml::Value::Boolean(b) => Value::Bool(*b),
        other => bail!(
            "binding '{}' has unsupported type {}",
            name,
            other.type_str()
        ),
    })
}

/// Parse a `name=value` override, inferring integer, float, bool, then string.
pub fn parse_variable_override(raw: &str) -> anyhow::Result<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected name=value, found '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("missing variable name in '{}'", raw);
    }

    let value = value.trim();
    let parsed = if let Ok(n) = value.parse::<i64>() {
        Value::Integer(n)
    } else if let Ok(n) = value.parse::<f64>() {
        Value::Float(n)
    } else if let Ok(b) = value.parse::<bool>() {
        Value::Bool(b)
    } else {
        Value::String(value.to_string())
    };
    Ok((name.to_string(), parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_and_apply() {
        let file = write_config(
            "max_call_depth = 32\n\n[variables]\nhour = 9\nname = \"quill\"\n\n[constants]\nratio = 0.5\n",
        );
        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.runtime_options().max_call_depth, 32);

        let mut runtime = Runtime::with_options(config.runtime_options());
        config.apply(&mut runtime).unwrap();
        let dump = runtime.memory_dump();
        assert_eq!(dump.get("hour"), Some(&Value::Integer(9).into()));
        assert_eq!(dump.get("ratio"), Some(&Value::Float(0.5).into()));
        assert!(runtime.exec("ratio = 1.0").is_err());
    }

    #[test]
    fn test_missing_sections_default() {
        let file = write_config("");
        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.runtime_options(), RuntimeOptions::default());
        assert!(config.variables.is_empty());
    }

    #[test]
    fn test_unsupported_binding_kind() {
        let file = write_config("[variables]\nlist = [1, 2]\n");
        let err = RunConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported type array"));
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = RunConfig::load(Path::new("/nonexistent/quill.toml")).unwrap_err();
        assert!(err.to_string().starts_with("reading configuration"));
    }

    #[test]
    fn test_variable_override_inference() {
        assert_eq!(
            parse_variable_override("hour=9").unwrap(),
            ("hour".to_string(), Value::Integer(9))
        );
        assert_eq!(
            parse_variable_override("ratio = 2.5").unwrap().1,
            Value::Float(2.5)
        );
        assert_eq!(parse_variable_override("on=true").unwrap().1, Value::Bool(true));
        assert_eq!(
            parse_variable_override("name=quill").unwrap().1,
            Value::String("quill".to_string())
        );
        assert!(parse_variable_override("novalue").is_err());
        assert!(parse_variable_override("=3").is_err());
    }
}

//==================================================
// End of file
//==================================================
