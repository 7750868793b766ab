// Configuration file loaders

use crate::{ConfigError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }
}

/// Reads configuration text into a JSON value tree.
#[derive(Debug, Clone, Copy)]
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Detect the format from the file extension.
    pub fn auto(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                ConfigError::LoadError(format!("No file extension found: {}", path.display()))
            })?;

        let format = FileFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::LoadError(format!("Unsupported format: {}", ext)))?;

        Ok(Self::new(format))
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        self.parse(&content)
    }

    pub fn parse(&self, content: &str) -> Result<Value> {
        match self.format {
            FileFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e))),
            FileFormat::Toml => {
                let value: toml::Value = toml::from_str(content)
                    .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;
                serde_json::to_value(value).map_err(|e| {
                    ConfigError::ParseError(format!("TOML to JSON conversion error: {}", e))
                })
            }
            FileFormat::Env => Ok(parse_env(content)),
        }
    }

    /// Parse and deserialize in one step.
    pub fn parse_as<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        from_value(self.parse(content)?)
    }
}

/// Deserialize a loaded value tree.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// `KEY=value` lines; keys are lowercased, comments and blank lines skipped.
fn parse_env(content: &str) -> Value {
    let mut map = serde_json::Map::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            map.insert(key.trim().to_lowercase(), Value::String(value.to_string()));
        }
    }

    Value::Object(map)
}
