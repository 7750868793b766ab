// Error types for configuration loading

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration key not found: {0}")]
    KeyNotFound(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Unknown formatter kind \"{0}\". Expected one of: html, plain_text, json, xml.")]
    UnknownFormatter(String),

    #[error("Unknown accept source \"{0}\". Expected \"header\" or \"parameter\".")]
    UnknownAcceptSource(String),

    #[error("Invalid formatter entry \"{0}\". Expected \"<content type>=<kind>\".")]
    InvalidEntry(String),

    #[error(transparent)]
    Veneer(#[from] veneer_core::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvError(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_formatter_names_value() {
        let err = ConfigError::UnknownFormatter("yaml".to_string());
        assert!(err.to_string().contains("\"yaml\""));
    }

    #[test]
    fn test_from_core_error() {
        let err: ConfigError = veneer_core::Error::Usage("blank key".to_string()).into();
        assert!(matches!(err, ConfigError::Veneer(_)));
        assert_eq!(err.to_string(), "Usage error: blank key");
    }
}
