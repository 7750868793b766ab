//! Deferred data responses
//!
//! A [`DataResponse`] carries raw [`Data`] next to a plain [`HttpResponse`]
//! and renders the data only when the body, a header or the status line is
//! first read. The rendering is done by an optional [`ResponseFormatter`],
//! typically attached by content negotiation after the handler returned.
//!
//! Formatting runs at most once per change: any `with_*` call produces a
//! copy that formats again on its next read.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use veneer_core::data_response::DataResponseFactory;
//! use veneer_core::data::DataArray;
//! use veneer_core::formatter::JsonFormatter;
//!
//! let factory = DataResponseFactory::default();
//! let response = factory
//!     .create_response(DataArray::new().with_entry("key", "value"), 200, "")
//!     .unwrap();
//!
//! let mut json = response.with_response_formatter(Arc::new(JsonFormatter::new()));
//! assert_eq!(json.get_body().unwrap().to_string(), r#"{"key":"value"}"#);
//! assert_eq!(
//!     json.header_line("Content-Type").unwrap(),
//!     "application/json; charset=UTF-8"
//! );
//! ```

use crate::body::{BodyStream, StreamFactory};
use crate::data::{Data, RawData};
use crate::formatter::ResponseFormatter;
use crate::http::{Headers, MemoryFactory, ResponseFactory};
use crate::logging::{debug, trace};
use crate::{Error, HttpResponse, Result};
use http::Version;
use std::fmt;
use std::sync::Arc;

/// Response whose body is rendered from data on first access.
#[derive(Clone)]
pub struct DataResponse {
    data: RawData,
    response: HttpResponse,
    /// Body set through [`DataResponse::with_body`]. Disables data rendering.
    explicit_body: Option<BodyStream>,
    /// Set once the string data (or nothing) was written without a formatter.
    body_cached: bool,
    formatter: Option<Arc<dyn ResponseFormatter>>,
    formatted: bool,
}

impl DataResponse {
    fn from_parts(data: RawData, response: HttpResponse) -> Self {
        Self {
            data,
            response,
            explicit_body: None,
            body_cached: false,
            formatter: None,
            formatted: false,
        }
    }

    // ========================================================================
    // Body and data
    // ========================================================================

    /// The response body.
    ///
    /// - An explicit body is returned as is.
    /// - With a formatter attached, formatting runs first if needed.
    /// - Without one, null data yields an empty body and string data is
    ///   written verbatim. Any other data is an error: use
    ///   [`DataResponse::get_data`] to reach it.
    pub fn get_body(&mut self) -> Result<&mut BodyStream> {
        if self.explicit_body.is_some() {
            return Ok(self.explicit_body.get_or_insert_with(BodyStream::new));
        }

        if self.formatter.is_some() {
            self.format_response()?;
            return Ok(&mut self.response.body);
        }

        if !self.body_cached {
            match self.get_data() {
                Data::Null => self.response.body.clear(),
                Data::String(content) => {
                    self.response.body.clear();
                    self.response.body.write_str(&content)?;
                }
                other => {
                    return Err(Error::DataShape(format!(
                        "The data is \"{}\" not a string. To get non-string data, use the \"DataResponse::get_data()\" method.",
                        other.type_name()
                    )));
                }
            }
            self.body_cached = true;
        }

        Ok(&mut self.response.body)
    }

    /// The data, resolving a producer on first call.
    ///
    /// The producer result replaces the producer, so it runs once. Each call
    /// returns an independent copy.
    pub fn get_data(&mut self) -> Data {
        if let RawData::Producer(producer) = &self.data {
            trace!("Resolving deferred response data");
            let resolved = producer();
            self.data = RawData::Value(resolved);
        }

        match &self.data {
            RawData::Value(data) => data.clone(),
            RawData::Producer(_) => Data::Null,
        }
    }

    /// Whether the data is not null.
    pub fn has_data(&mut self) -> bool {
        !self.get_data().is_null()
    }

    /// Copy with new data.
    ///
    /// Fails once the body was forced with [`DataResponse::with_body`].
    pub fn with_data(&self, data: impl Into<RawData>) -> Result<Self> {
        if self.explicit_body.is_some() {
            return Err(Error::Usage(
                "The data cannot be set because the body was previously forced to be set using the \"DataResponse::with_body()\" method.".to_string(),
            ));
        }

        let mut new = self.clone();
        new.data = data.into();
        new.body_cached = false;
        new.formatted = false;
        Ok(new)
    }

    /// Copy with a fixed body. Data is cleared and can no longer be set.
    pub fn with_body(&self, body: impl Into<BodyStream>) -> Self {
        let body = body.into();
        let mut new = self.clone();
        new.response = new.response.with_body(body.clone());
        new.explicit_body = Some(body);
        new.data = RawData::default();
        new.formatted = false;
        new
    }

    // ========================================================================
    // Formatter
    // ========================================================================

    /// Copy rendered by `formatter`.
    pub fn with_response_formatter(&self, formatter: Arc<dyn ResponseFormatter>) -> Self {
        let mut new = self.clone();
        new.formatter = Some(formatter);
        new.body_cached = false;
        new.formatted = false;
        new
    }

    pub fn has_response_formatter(&self) -> bool {
        self.formatter.is_some()
    }

    /// The wrapped response as it stands, without formatting.
    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    fn format_response(&mut self) -> Result<()> {
        if self.formatted {
            return Ok(());
        }

        let Some(formatter) = self.formatter.clone() else {
            return Ok(());
        };

        if self.explicit_body.is_none() {
            self.response.body.clear();
        }

        // Latched before formatting so a formatter reading the response back
        // does not recurse.
        self.formatted = true;
        debug!(status = self.response.status, "Formatting data response");

        match formatter.format(self) {
            Ok(response) => {
                self.response = response;
                Ok(())
            }
            Err(err) => {
                self.formatted = false;
                Err(err)
            }
        }
    }

    // ========================================================================
    // Message accessors
    // ========================================================================

    pub fn status_code(&mut self) -> Result<u16> {
        self.format_response()?;
        Ok(self.response.status)
    }

    pub fn reason_phrase(&mut self) -> Result<&str> {
        self.format_response()?;
        Ok(&self.response.reason_phrase)
    }

    pub fn protocol_version(&mut self) -> Result<Version> {
        self.format_response()?;
        Ok(self.response.version)
    }

    pub fn headers(&mut self) -> Result<&Headers> {
        self.format_response()?;
        Ok(&self.response.headers)
    }

    pub fn header(&mut self, name: &str) -> Result<&[String]> {
        self.format_response()?;
        Ok(self.response.headers.get(name))
    }

    pub fn header_line(&mut self, name: &str) -> Result<String> {
        self.format_response()?;
        Ok(self.response.headers.get_line(name))
    }

    pub fn has_header(&mut self, name: &str) -> Result<bool> {
        self.format_response()?;
        Ok(self.response.headers.contains(name))
    }

    // ========================================================================
    // Message mutators
    // ========================================================================

    fn with_response(&self, change: impl FnOnce(HttpResponse) -> HttpResponse) -> Self {
        let mut new = self.clone();
        new.response = change(new.response);
        new.formatted = false;
        new.body_cached = false;
        new
    }

    pub fn with_header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_response(|response| response.with_header(name, value))
    }

    pub fn with_added_header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_response(|response| response.with_added_header(name, value))
    }

    /// Copy without the header.
    ///
    /// Formatting runs first so a header set by the formatter is the one
    /// removed. The copy stays formatted.
    pub fn without_header(&self, name: &str) -> Result<Self> {
        let mut new = self.clone();
        new.format_response()?;
        new.response = new.response.without_header(name);
        Ok(new)
    }

    /// An empty reason phrase selects the canonical one.
    pub fn with_status(&self, status: u16, reason_phrase: &str) -> Self {
        self.with_response(|response| response.with_status(status, reason_phrase))
    }

    pub fn with_protocol_version(&self, version: Version) -> Self {
        self.with_response(|response| response.with_protocol_version(version))
    }

    /// Finish the response: format if needed and return the plain response.
    pub fn into_response(mut self) -> Result<HttpResponse> {
        self.format_response()?;
        self.get_body()?;
        let response = match self.explicit_body.take() {
            Some(body) => self.response.with_body(body),
            None => self.response,
        };
        Ok(response)
    }
}

impl fmt::Debug for DataResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataResponse")
            .field("data", &self.data)
            .field("response", &self.response)
            .field("explicit_body", &self.explicit_body.is_some())
            .field("has_formatter", &self.formatter.is_some())
            .field("formatted", &self.formatted)
            .finish()
    }
}

/// Creates [`DataResponse`]s, checking the body stream they wrap.
#[derive(Clone)]
pub struct DataResponseFactory {
    response_factory: Arc<dyn ResponseFactory>,
    stream_factory: Arc<dyn StreamFactory>,
}

impl DataResponseFactory {
    pub fn new(
        response_factory: Arc<dyn ResponseFactory>,
        stream_factory: Arc<dyn StreamFactory>,
    ) -> Self {
        Self {
            response_factory,
            stream_factory,
        }
    }

    /// Create a response carrying `data`.
    ///
    /// The body produced by the response factory must be readable, seekable,
    /// writable and detachable. Its buffer is detached and re-attached
    /// through the stream factory.
    pub fn create_response(
        &self,
        data: impl Into<RawData>,
        status: u16,
        reason_phrase: &str,
    ) -> Result<DataResponse> {
        let mut response = self.response_factory.create_response(status, reason_phrase);
        let stream = &mut response.body;

        if !stream.is_readable() {
            return Err(Error::ResourceValidation("Stream is not readable.".to_string()));
        }

        if !stream.is_seekable() {
            return Err(Error::ResourceValidation("Stream is not seekable.".to_string()));
        }

        if !stream.is_writable() {
            return Err(Error::ResourceValidation("Stream is not writable.".to_string()));
        }

        let buffer = stream.detach().ok_or_else(|| {
            Error::ResourceValidation("Resource was not separated from the stream.".to_string())
        })?;

        let body = self.stream_factory.create_stream_from_buffer(buffer);
        Ok(DataResponse::from_parts(data.into(), response.with_body(body)))
    }
}

impl Default for DataResponseFactory {
    fn default() -> Self {
        Self::new(Arc::new(MemoryFactory), Arc::new(MemoryFactory))
    }
}

impl fmt::Debug for DataResponseFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataResponseFactory").finish_non_exhaustive()
    }
}
