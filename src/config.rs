//! Benchmark configuration
//!
//! YAML file naming the environment driver and the parameter matrix. Each
//! matrix entry is either a bare list of values or an object with `values`
//! and an `output` flag:
//!
//! ```yaml
//! driver: dummy
//! matrix:
//!   url:
//!     values: ["http://localhost:8080/v1/chat/completions"]
//!     output: false
//!   model: [llama3, qwen2]
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Driver used when the file does not name one
pub const DEFAULT_DRIVER: &str = "dummy";

/// Template written by `init` and printed when no config file exists
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# LLM Rate Lens configuration

# Environment driver: "dummy" (use url/model as given) or "local_cmd"
# (run setup_cmd before and teardown_cmd after each parameter combination)
driver: "dummy"

# Every combination of the values below is benchmarked.
# A parameter is either a plain list: name: [a, b]
# or an object with an output flag: name: {values: [a, b], output: false}
matrix:
  # Chat completion endpoint
  url:
    values: ["http://localhost:8080/v1/chat/completions"]
    output: true

  # Model name sent with each request
  model:
    values: ["llama3"]
    output: true

# local_cmd example; commands may reference parameters as {{.name}}
#
# driver: "local_cmd"
# matrix:
#   url:
#     values: ["http://localhost:8080/v1/chat/completions"]
#     output: false
#   model:
#     values: ["llama3"]
#   threads:
#     values: [4, 8]
#   setup_cmd:
#     values: ["docker run -d --name llm-server -p 8080:8080 -e THREADS={{.threads}} llm-image:latest"]
#     output: false
#   teardown_cmd:
#     values: ["docker stop llm-server && docker rm llm-server"]
#     output: false
"#;

/// Candidate values of one matrix parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterConfig {
    pub values: Vec<String>,
    /// Include this parameter in rendered results
    #[serde(default = "default_output")]
    pub output: bool,
}

fn default_output() -> bool {
    true
}

/// Parsed benchmark configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub driver: String,
    pub matrix: BTreeMap<String, ParameterConfig>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    driver: Option<String>,
    #[serde(default)]
    matrix: BTreeMap<String, Value>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(content)?;

        let driver = raw
            .driver
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_DRIVER.to_string());

        let mut matrix = BTreeMap::new();
        for (key, value) in raw.matrix {
            let param = parse_parameter(&key, value)?;
            debug!(key = %key, values = ?param.values, output = param.output, "Matrix parameter");
            matrix.insert(key, param);
        }

        debug!(driver = %driver, parameters = matrix.len(), "Processed configuration");
        Ok(Self { driver, matrix })
    }
}

fn parse_parameter(key: &str, value: Value) -> Result<ParameterConfig, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidParameter {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    match value {
        Value::Sequence(items) => Ok(ParameterConfig {
            values: stringify_all(key, items)?,
            output: true,
        }),
        Value::Mapping(map) => {
            let values = match map.get("values") {
                Some(Value::Sequence(items)) => stringify_all(key, items.clone())?,
                Some(_) => return Err(invalid("`values` must be a list")),
                None => return Err(invalid("object form requires `values`")),
            };
            let output = match map.get("output") {
                None => true,
                Some(Value::Bool(flag)) => *flag,
                Some(_) => return Err(invalid("`output` must be a boolean")),
            };
            Ok(ParameterConfig { values, output })
        }
        _ => Err(invalid("expected a list or {values, output}")),
    }
}

fn stringify_all(key: &str, items: Vec<Value>) -> Result<Vec<String>, ConfigError> {
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok(String::new()),
            _ => Err(ConfigError::InvalidParameter {
                key: key.to_string(),
                reason: "values must be scalars".to_string(),
            }),
        })
        .collect()
}

/// Write the default configuration template
pub fn write_default_config(path: &Path) -> std::io::Result<()> {
    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_parses() {
        let config = Config::from_yaml_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.driver, "dummy");
        assert_eq!(
            config.matrix["url"].values,
            vec!["http://localhost:8080/v1/chat/completions".to_string()]
        );
        assert!(config.matrix["model"].output);
    }

    #[test]
    fn test_mixed_parameter_forms() {
        let yaml = r#"
driver: local_cmd
matrix:
  model: [llama3, qwen2]
  threads: [4, 8]
  flash: {values: [true], output: false}
  url: {values: ["http://localhost:9000/v1/chat/completions"]}
"#;
        let config = Config::from_yaml_str(yaml).unwrap();

        assert_eq!(config.driver, "local_cmd");
        assert_eq!(config.matrix["model"].values, vec!["llama3", "qwen2"]);
        assert_eq!(config.matrix["threads"].values, vec!["4", "8"]);
        assert_eq!(config.matrix["flash"].values, vec!["true"]);
        assert!(!config.matrix["flash"].output);
        assert!(config.matrix["url"].output);
    }

    #[test]
    fn test_missing_driver_defaults_to_dummy() {
        let config = Config::from_yaml_str("matrix:\n  model: [m]\n").unwrap();
        assert_eq!(config.driver, DEFAULT_DRIVER);
    }

    #[test]
    fn test_invalid_parameter_shape() {
        let err = Config::from_yaml_str("matrix:\n  model: llama3\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { ref key, .. } if key == "model"));

        let err = Config::from_yaml_str("matrix:\n  model: {output: true}\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        assert!(matches!(Config::load(&path), Err(ConfigError::NotFound(_))));

        write_default_config(&path).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.matrix.len(), 2);
    }
}
