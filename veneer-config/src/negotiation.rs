//! Formatter tables from configuration.
//!
//! ```toml
//! accept = "header"
//!
//! [[formatters]]
//! content_type = "text/html"
//! formatter = { kind = "html" }
//!
//! [[formatters]]
//! content_type = "application/xml"
//! formatter = { kind = "xml", root_tag = "data" }
//!
//! [[formatters]]
//! content_type = "application/json"
//! formatter = { kind = "json", json = { pretty_print = true } }
//! ```

use crate::{ConfigError, ConfigLoader, EnvLoader, Result, loader};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;
use veneer_core::formatter::{
    HtmlFormatter, JsonFormatter, JsonOptions, PlainTextFormatter, ResponseFormatter,
    XmlFormatter,
};
use veneer_core::{ContentNegotiator, HeaderAcceptProvider, RequestParameterAcceptProvider};

/// Built-in formatter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatterKind {
    Html,
    PlainText,
    Json,
    Xml,
}

impl FromStr for FormatterKind {
    type Err = ConfigError;

    fn from_str(kind: &str) -> Result<Self> {
        match kind.trim().to_lowercase().as_str() {
            "html" => Ok(FormatterKind::Html),
            "plain_text" | "plaintext" | "text" => Ok(FormatterKind::PlainText),
            "json" => Ok(FormatterKind::Json),
            "xml" => Ok(FormatterKind::Xml),
            _ => Err(ConfigError::UnknownFormatter(kind.to_string())),
        }
    }
}

/// One formatter and its settings. Unset fields keep the formatter defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    pub kind: String,
    /// `Content-Type` written by the formatter, not the negotiation key
    pub content_type: Option<String>,
    pub encoding: Option<String>,
    /// XML only; empty disables the wrapping element
    pub root_tag: Option<String>,
    /// XML only
    pub version: Option<String>,
    /// JSON only
    pub json: JsonOptions,
}

impl FormatterConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn kind(&self) -> Result<FormatterKind> {
        self.kind.parse()
    }

    pub fn build(&self) -> Result<Arc<dyn ResponseFormatter>> {
        macro_rules! configure {
            ($formatter:expr) => {{
                let mut formatter = $formatter;
                if let Some(content_type) = &self.content_type {
                    formatter = formatter.with_content_type(content_type.clone());
                }
                if let Some(encoding) = &self.encoding {
                    formatter = formatter.with_encoding(encoding.clone());
                }
                formatter
            }};
        }

        let formatter: Arc<dyn ResponseFormatter> = match self.kind()? {
            FormatterKind::Html => Arc::new(configure!(HtmlFormatter::new())),
            FormatterKind::PlainText => Arc::new(configure!(PlainTextFormatter::new())),
            FormatterKind::Json => {
                Arc::new(configure!(JsonFormatter::new().with_options(self.json)))
            }
            FormatterKind::Xml => {
                let mut formatter = configure!(XmlFormatter::new());
                if let Some(root_tag) = &self.root_tag {
                    formatter = formatter.with_root_tag(root_tag.clone());
                }
                if let Some(version) = &self.version {
                    formatter = formatter.with_version(version.clone());
                }
                Arc::new(formatter)
            }
        };

        Ok(formatter)
    }
}

/// A negotiation key and the formatter it selects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatterEntry {
    /// Substring looked for in the accepted types
    pub content_type: String,
    pub formatter: FormatterConfig,
}

/// Where accepted types are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptSource {
    #[default]
    Header,
    Parameter,
}

impl FromStr for AcceptSource {
    type Err = ConfigError;

    fn from_str(source: &str) -> Result<Self> {
        match source.trim().to_lowercase().as_str() {
            "header" => Ok(AcceptSource::Header),
            "parameter" => Ok(AcceptSource::Parameter),
            _ => Err(ConfigError::UnknownAcceptSource(source.to_string())),
        }
    }
}

fn default_parameter_name() -> String {
    "format".to_string()
}

/// Ordered formatter table and accept source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationConfig {
    #[serde(default)]
    pub formatters: Vec<FormatterEntry>,
    #[serde(default)]
    pub accept: AcceptSource,
    /// Request parameter read when `accept` is `parameter`
    #[serde(default = "default_parameter_name")]
    pub parameter_name: String,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            formatters: Vec::new(),
            accept: AcceptSource::Header,
            parameter_name: default_parameter_name(),
        }
    }
}

impl NegotiationConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        ConfigLoader::new(crate::FileFormat::Json).parse_as(content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        ConfigLoader::new(crate::FileFormat::Toml).parse_as(content)
    }

    /// Load a `.json` or `.toml` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let value = ConfigLoader::auto(path)?.load_file(path)?;
        loader::from_value(value)
    }

    /// Read `FORMATTERS`, `ACCEPT` and `PARAMETER_NAME` through `env`.
    ///
    /// `FORMATTERS` is a comma separated list of `<content type>=<kind>`.
    pub fn from_env(env: &EnvLoader) -> Result<Self> {
        let formatters = env
            .var("FORMATTERS")
            .map(|list| parse_formatter_list(&list))
            .transpose()?
            .unwrap_or_default();

        let accept = match env.var("ACCEPT") {
            Some(source) => source.parse()?,
            None => AcceptSource::default(),
        };

        Ok(Self {
            formatters,
            accept,
            parameter_name: env.load_var_or("PARAMETER_NAME", "format"),
        })
    }

    /// Append an entry, builder style.
    pub fn with_formatter(
        mut self,
        content_type: impl Into<String>,
        formatter: FormatterConfig,
    ) -> Self {
        self.formatters.push(FormatterEntry {
            content_type: content_type.into(),
            formatter,
        });
        self
    }

    pub fn build(&self) -> Result<ContentNegotiator> {
        let table = self
            .formatters
            .iter()
            .map(|entry| -> Result<(String, Arc<dyn ResponseFormatter>)> {
                Ok((entry.content_type.clone(), entry.formatter.build()?))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            formatters = table.len(),
            accept = ?self.accept,
            "Building content negotiator from configuration"
        );

        let negotiator = ContentNegotiator::new(table);
        Ok(match self.accept {
            AcceptSource::Header => negotiator.with_accept_provider(HeaderAcceptProvider),
            AcceptSource::Parameter => negotiator.with_accept_provider(
                RequestParameterAcceptProvider::new(self.parameter_name.clone()),
            ),
        })
    }
}

fn parse_formatter_list(list: &str) -> Result<Vec<FormatterEntry>> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (content_type, kind) = item
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidEntry(item.to_string()))?;
            let formatter = FormatterConfig::new(kind.trim());
            formatter.kind()?;
            Ok(FormatterEntry {
                content_type: content_type.trim().to_string(),
                formatter,
            })
        })
        .collect()
}
