// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;
use std::path::Path;

/// Variable prefix used by [`EnvLoader::default`].
pub const DEFAULT_PREFIX: &str = "VENEER";

/// Reads prefixed process environment variables.
///
/// With prefix `VENEER`, `VENEER_ACCEPT` is read as `accept`.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Load `.env` into the process environment.
    ///
    /// Without a path a missing `.env` file is not an error.
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        Ok(())
    }

    /// All matching variables, keyed by lowercased name without the prefix.
    pub fn load(&self) -> HashMap<String, String> {
        let mut config = HashMap::new();

        for (key, value) in env::vars() {
            match &self.prefix {
                Some(prefix) => {
                    if let Some(rest) = key.strip_prefix(prefix.as_str()) {
                        if let Some(name) = rest.strip_prefix('_') {
                            config.insert(name.to_lowercase(), value);
                        }
                    }
                }
                None => {
                    config.insert(key.to_lowercase(), value);
                }
            }
        }

        config
    }

    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }

    pub fn load_var(&self, key: &str) -> Result<String> {
        env::var(self.full_key(key)).map_err(ConfigError::EnvError)
    }

    /// The variable, or `None` when it is not set.
    pub fn var(&self, key: &str) -> Option<String> {
        env::var(self.full_key(key)).ok()
    }

    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.var(key).unwrap_or_else(|| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(Some(DEFAULT_PREFIX.to_string()))
    }
}
