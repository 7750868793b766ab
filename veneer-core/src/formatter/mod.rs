//! Response formatters
//!
//! A [`ResponseFormatter`] turns the data held by a [`DataResponse`] into
//! body bytes and a `Content-Type` header. Built-in formatters:
//!
//! | Formatter | Default content type |
//! |-----------|----------------------|
//! | [`HtmlFormatter`] | `text/html` |
//! | [`PlainTextFormatter`] | `text/plain` |
//! | [`JsonFormatter`] | `application/json` |
//! | [`XmlFormatter`] | `application/xml` |
//!
//! Every built-in formatter sets `Content-Type: <type>; charset=<encoding>`.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use veneer_core::data_response::DataResponseFactory;
//! use veneer_core::formatter::JsonFormatter;
//!
//! let factory = DataResponseFactory::default();
//! let mut response = factory
//!     .create_response(vec!["a", "b"], 200, "")
//!     .unwrap()
//!     .with_response_formatter(Arc::new(JsonFormatter::new()));
//!
//! assert_eq!(response.get_body().unwrap().to_string(), r#"["a","b"]"#);
//! ```

pub mod json;
pub mod text;
pub mod xml;

pub use json::{JsonFormatter, JsonOptions};
pub use text::{HtmlFormatter, PlainTextFormatter};
pub use xml::{XmlFormatter, safe_element_name};

use crate::logging::trace;
use crate::{DataResponse, HttpResponse, Result};

/// Renders the data of a [`DataResponse`] into a plain response.
///
/// Implementations read the data through [`DataResponse::get_data`] and
/// start from [`DataResponse::response`], whose body has already been
/// cleared. The returned response replaces the wrapped one.
pub trait ResponseFormatter: Send + Sync {
    fn format(&self, data_response: &mut DataResponse) -> Result<HttpResponse>;
}

impl<F> ResponseFormatter for F
where
    F: Fn(&mut DataResponse) -> Result<HttpResponse> + Send + Sync,
{
    fn format(&self, data_response: &mut DataResponse) -> Result<HttpResponse> {
        self(data_response)
    }
}

/// Content type and charset written by a formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    pub mime_type: String,
    pub encoding: String,
}

impl ContentType {
    pub const DEFAULT_ENCODING: &'static str = "UTF-8";

    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            encoding: Self::DEFAULT_ENCODING.to_string(),
        }
    }

    /// `Content-Type` header value.
    pub fn header_value(&self) -> String {
        format!("{}; charset={}", self.mime_type, self.encoding)
    }

    /// Write `content` (if any) into the response body and set the header.
    pub(crate) fn apply(
        &self,
        mut response: HttpResponse,
        content: Option<&str>,
    ) -> Result<HttpResponse> {
        if let Some(content) = content {
            response.body.write_str(content)?;
        }

        trace!(
            content_type = %self.mime_type,
            bytes = content.map(str::len).unwrap_or(0),
            "Formatted response body"
        );

        Ok(response.with_header("Content-Type", self.header_value()))
    }
}

/// Copy-on-write setters for the [`ContentType`] of a formatter.
macro_rules! content_type_setters {
    ($formatter:ty) => {
        impl $formatter {
            /// Use a different content type, e.g. `text/xml`.
            pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
                self.content.mime_type = content_type.into();
                self
            }

            /// Use a different charset, e.g. `ISO-8859-1`.
            pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
                self.content.encoding = encoding.into();
                self
            }

            pub fn content_type(&self) -> &str {
                &self.content.mime_type
            }

            pub fn encoding(&self) -> &str {
                &self.content.encoding
            }
        }
    };
}

pub(crate) use content_type_setters;
