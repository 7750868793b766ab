// Veneer - deferred HTTP data responses with content negotiation
//
// Handlers return data; formatters render it as HTML, plain text, JSON or
// XML once the response is read, and middleware picks the formatter from
// what the client accepts.

// Re-export core functionality
pub use veneer_core::*;

pub use async_trait::async_trait;

// Re-export optional crates
#[cfg(feature = "config")]
pub use veneer_config as config;

// Prelude for common imports
pub mod prelude {
    pub use crate::data::{Data, DataArray, DataObject, Key, RawData, XmlData};
    pub use crate::logging::{LogConfig, LogFormat, LogLevel, LogOutput};
    pub use crate::{
        AcceptProvider, ContentNegotiator, DataResponse, DataResponseFactory, Error,
        FormatDataResponse, HandlerFn, HtmlFormatter, HttpRequest, HttpResponse, JsonFormatter,
        JsonOptions, Middleware, MiddlewareChain, Next, PlainTextFormatter, Response,
        ResponseFormatter, XmlFormatter, async_trait,
    };

    #[cfg(feature = "config")]
    pub use crate::config::{NegotiationConfig, VeneerConfig};
}
