// Configuration for Veneer: logging setup and content negotiation tables
// loaded from JSON, TOML, `.env` files or the process environment.

pub mod env;
pub mod error;
pub mod loader;
pub mod negotiation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use negotiation::{
    AcceptSource, FormatterConfig, FormatterEntry, FormatterKind, NegotiationConfig,
};

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use veneer_core::ContentNegotiator;
use veneer_core::logging::{LogConfig, WorkerGuard};

/// Application settings.
///
/// ```toml
/// [logging]
/// level = "debug"
/// format = "pretty"
///
/// [negotiation]
/// accept = "header"
///
/// [[negotiation.formatters]]
/// content_type = "application/json"
/// formatter = { kind = "json" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VeneerConfig {
    pub logging: LogConfig,
    pub negotiation: NegotiationConfig,
}

impl VeneerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a `.json` or `.toml` file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let value = ConfigLoader::auto(path)?.load_file(path)?;
        debug!(path = %path.display(), "Loaded configuration file");
        loader::from_value(value)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        ConfigLoader::new(FileFormat::Json).parse_as(content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        ConfigLoader::new(FileFormat::Toml).parse_as(content)
    }

    /// Negotiation settings from the environment, after loading `.env`.
    ///
    /// Logging keeps its defaults; `RUST_LOG` still applies when the
    /// subscriber is installed.
    pub fn from_env(env: &EnvLoader) -> Result<Self> {
        env.load_dotenv(None)?;
        Ok(Self {
            logging: LogConfig::default(),
            negotiation: NegotiationConfig::from_env(env)?,
        })
    }

    /// Install the global tracing subscriber.
    pub fn init_logging(&self) -> Option<WorkerGuard> {
        self.logging.clone().init()
    }

    pub fn negotiator(&self) -> Result<ContentNegotiator> {
        self.negotiation.build()
    }
}
