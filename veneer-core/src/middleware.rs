// Middleware system for response processing

use crate::formatter::{
    HtmlFormatter, JsonFormatter, PlainTextFormatter, ResponseFormatter, XmlFormatter,
};
use crate::logging::{debug, trace};
use crate::{DataResponse, Error, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// What a handler or middleware produces.
///
/// Deferred data responses stay distinguishable on their way out so
/// middleware can still choose how they are rendered.
#[derive(Debug, Clone)]
pub enum Response {
    Http(HttpResponse),
    Data(DataResponse),
}

impl Response {
    pub fn is_data(&self) -> bool {
        matches!(self, Response::Data(_))
    }

    pub fn as_data(&self) -> Option<&DataResponse> {
        match self {
            Response::Data(data) => Some(data),
            Response::Http(_) => None,
        }
    }

    pub fn into_data(self) -> Option<DataResponse> {
        match self {
            Response::Data(data) => Some(data),
            Response::Http(_) => None,
        }
    }

    /// Finish the response, formatting deferred data.
    pub fn into_http_response(self) -> Result<HttpResponse, Error> {
        match self {
            Response::Http(response) => Ok(response),
            Response::Data(data) => data.into_response(),
        }
    }
}

impl From<HttpResponse> for Response {
    fn from(response: HttpResponse) -> Self {
        Response::Http(response)
    }
}

impl From<DataResponse> for Response {
    fn from(response: DataResponse) -> Self {
        Response::Data(response)
    }
}

/// Type alias for the next handler in the middleware chain
pub type Next = Box<
    dyn FnOnce(HttpRequest) -> Pin<Box<dyn Future<Output = Result<Response, Error>> + Send>>
        + Send,
>;

/// Type alias for handler functions
pub type HandlerFn = Arc<
    dyn Fn(HttpRequest) -> Pin<Box<dyn Future<Output = Result<Response, Error>> + Send>>
        + Send
        + Sync,
>;

/// Middleware trait for processing requests around a handler
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Process the request and optionally pass to next middleware
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<Response, Error>;
}

/// Middleware chain executor
#[derive(Clone)]
pub struct MiddlewareChain {
    middlewares: Arc<Vec<Arc<dyn Middleware>>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Arc::new(Vec::new()),
        }
    }

    /// Add a middleware to the chain
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        let mut mws = (*self.middlewares).clone();
        mws.push(Arc::new(middleware));
        self.middlewares = Arc::new(mws);
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Execute the middleware chain with a handler
    pub async fn apply(&self, req: HttpRequest, handler: HandlerFn) -> Result<Response, Error> {
        debug!(
            middleware_count = self.middlewares.len(),
            path = %req.path,
            method = %req.method,
            "Executing middleware chain"
        );
        self.execute_from(0, req, handler).await
    }

    fn execute_from(
        &self,
        index: usize,
        req: HttpRequest,
        handler: HandlerFn,
    ) -> Pin<Box<dyn Future<Output = Result<Response, Error>> + Send>> {
        if index >= self.middlewares.len() {
            // No more middleware, call the handler
            trace!("Middleware chain complete, calling handler");
            handler(req)
        } else {
            let middleware = self.middlewares[index].clone();
            let chain = self.clone();
            let handler_clone = handler.clone();

            trace!(middleware_index = index, "Executing middleware");
            Box::pin(async move {
                middleware
                    .handle(
                        req,
                        Box::new(move |req| chain.execute_from(index + 1, req, handler_clone)),
                    )
                    .await
            })
        }
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

// ========== Built-in Middleware ==========

/// Attaches one fixed formatter to data responses that have none.
pub struct FormatDataResponse {
    formatter: Arc<dyn ResponseFormatter>,
}

impl FormatDataResponse {
    pub fn new(formatter: Arc<dyn ResponseFormatter>) -> Self {
        Self { formatter }
    }

    pub fn as_html() -> Self {
        Self::new(Arc::new(HtmlFormatter::new()))
    }

    pub fn as_json() -> Self {
        Self::new(Arc::new(JsonFormatter::new()))
    }

    pub fn as_xml() -> Self {
        Self::new(Arc::new(XmlFormatter::new()))
    }

    pub fn as_plain_text() -> Self {
        Self::new(Arc::new(PlainTextFormatter::new()))
    }
}

#[async_trait]
impl Middleware for FormatDataResponse {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<Response, Error> {
        match next(req).await? {
            Response::Data(data) if !data.has_response_formatter() => {
                trace!("Attaching fixed formatter to data response");
                Ok(Response::Data(
                    data.with_response_formatter(self.formatter.clone()),
                ))
            }
            other => Ok(other),
        }
    }
}
