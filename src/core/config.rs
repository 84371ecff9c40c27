//! Generator configuration.
//!
//! A `Config` names the pieces of the target code base that generated code
//! refers to but does not define: the runtime module, the service module and
//! the identifiers shared by validation snippets. It can be built in code or
//! loaded from a YAML, TOML or JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Settings shared by the binding builder, the validation synthesizer and the
/// section templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the runtime module used by emitted code (errors, muxer, codecs)
    pub runtime_module: String,
    /// Module holding the service-level types (payloads, results, user types)
    pub service_module: String,
    /// Name of the validation error accumulator in emitted code
    pub errors_var: String,
    /// Name of the validation routine every user type exposes
    pub validate_method: String,
    /// Relative directory of generated server files
    pub output_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime_module: "rt".to_string(),
            service_module: "service".to_string(),
            errors_var: "errors".to_string(),
            validate_method: "validate".to_string(),
            output_dir: "transport/http".to_string(),
        }
    }
}

impl Config {
    /// Load a configuration file, picking the format from its extension.
    ///
    /// Missing keys take their default value.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yml") | Some("yaml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(Error::config(format!(
                "unsupported configuration file '{}': expected .yaml, .yml, .toml or .json",
                path.display()
            ))),
        }
    }
}
