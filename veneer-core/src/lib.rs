// Core library for Veneer
// Deferred data responses, the formatters that render them and the
// middleware that picks a formatter per request.

pub mod body;
pub mod content_negotiation;
pub mod data;
pub mod data_response;
pub mod error;
pub mod formatter;
pub mod http;
pub mod logging;
pub mod middleware;

// Re-export commonly used types
pub use self::body::{BodyStream, StreamCapabilities, StreamFactory};
pub use self::content_negotiation::{
    AcceptProvider, ContentNegotiator, HeaderAcceptProvider, RequestParameterAcceptProvider,
};
pub use self::data::{Data, DataArray, DataObject, Key, RawData, XmlData};
pub use self::data_response::{DataResponse, DataResponseFactory};
pub use self::error::{Error, Result};
pub use self::formatter::{
    HtmlFormatter, JsonFormatter, JsonOptions, PlainTextFormatter, ResponseFormatter,
    XmlFormatter,
};
pub use self::http::{Headers, HttpRequest, HttpResponse, MemoryFactory, ResponseFactory};
pub use self::middleware::{
    FormatDataResponse, HandlerFn, Middleware, MiddlewareChain, Next, Response,
};
