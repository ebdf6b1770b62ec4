//! Generator settings and plugin parameter parsing.

use serde::{Deserialize, Serialize};

use crate::error::GenerateError;
use crate::registry::{FileNaming, DEFAULT_RUNTIME_PACKAGE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorSettings {
    #[serde(default = "default_plugin_name")]
    pub plugin_name: String,
    #[serde(default = "default_plugin_version")]
    pub plugin_version: String,
    /// Raw parameter string, echoed in the preamble.
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub keep_empty_files: bool,
    #[serde(default = "default_true")]
    pub ts_nocheck: bool,
    #[serde(default = "default_true")]
    pub eslint_disable: bool,
    #[serde(default = "default_import_extension")]
    pub import_extension: String,
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
    #[serde(default = "default_runtime_package")]
    pub runtime_package: String,
}

fn default_true() -> bool { true }
fn default_plugin_name() -> String { "protoc-gen-es".to_string() }
fn default_plugin_version() -> String { format!("v{}", crate::GENERATOR_VERSION) }
fn default_import_extension() -> String { ".js".to_string() }
fn default_file_suffix() -> String { "_pb".to_string() }
fn default_runtime_package() -> String { DEFAULT_RUNTIME_PACKAGE.to_string() }

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            plugin_name: default_plugin_name(),
            plugin_version: default_plugin_version(),
            parameter: None,
            target: None,
            keep_empty_files: false,
            ts_nocheck: true,
            eslint_disable: true,
            import_extension: default_import_extension(),
            file_suffix: default_file_suffix(),
            runtime_package: default_runtime_package(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, GenerateError> {
    match value {
        "" | "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(GenerateError::InvalidParameter(format!(
            "{}={}: expected true or false",
            key, value
        ))),
    }
}

impl GeneratorSettings {
    /// Apply a `key=value,key=value` plugin parameter.
    ///
    /// The raw string is kept for the preamble.
    pub fn apply_parameter(&mut self, parameter: &str) -> Result<(), GenerateError> {
        for pair in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "keep_empty_files" => self.keep_empty_files = parse_bool(key, value)?,
                "ts_nocheck" => self.ts_nocheck = parse_bool(key, value)?,
                "eslint_disable" => self.eslint_disable = parse_bool(key, value)?,
                "import_extension" => {
                    self.import_extension = match value {
                        "none" | "" => String::new(),
                        ext => ext.to_string(),
                    }
                }
                "target" => {
                    if value.is_empty() {
                        return Err(GenerateError::InvalidParameter("target requires a value".into()));
                    }
                    self.target = Some(value.to_string());
                }
                _ => {
                    return Err(GenerateError::InvalidParameter(format!(
                        "unknown option \"{}\"",
                        key
                    )))
                }
            }
        }
        if !parameter.is_empty() {
            self.parameter = Some(parameter.to_string());
        }
        Ok(())
    }

    pub fn file_naming(&self) -> FileNaming {
        FileNaming {
            suffix: self.file_suffix.clone(),
            import_extension: self.import_extension.clone(),
        }
    }
}
