//! Content negotiation for data responses.
//!
//! [`ContentNegotiator`] is a middleware holding an ordered table of
//! content type to [`ResponseFormatter`]. After the handler returns a
//! [`DataResponse`] without a formatter, the client's accepted types are
//! read through an [`AcceptProvider`] and the first table entry whose
//! content type occurs inside an accepted token is attached.
//!
//! Matching is plain substring search. Quality values are not honored:
//! accepted tokens are tried left to right, table entries in insertion
//! order, and the first hit wins. No hit leaves the response untouched.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use veneer_core::content_negotiation::ContentNegotiator;
//! use veneer_core::formatter::{HtmlFormatter, JsonFormatter, ResponseFormatter, XmlFormatter};
//!
//! let negotiator = ContentNegotiator::new([
//!     ("text/html", Arc::new(HtmlFormatter::new()) as Arc<dyn ResponseFormatter>),
//!     ("application/xml", Arc::new(XmlFormatter::new())),
//!     ("application/json", Arc::new(JsonFormatter::new())),
//! ]);
//!
//! let accepted = vec!["application/json".to_string()];
//! let (content_type, _) = negotiator.select(&accepted).unwrap();
//! assert_eq!(content_type, "application/json");
//! ```
//!
//! [`DataResponse`]: crate::DataResponse

use crate::formatter::ResponseFormatter;
use crate::logging::{debug, trace};
use crate::middleware::{Middleware, Next, Response};
use crate::{Error, HttpRequest};
use async_trait::async_trait;
use http::Method;
use std::sync::Arc;

// ============================================================================
// Accept Providers
// ============================================================================

/// Reads the content types a client accepts from a request.
pub trait AcceptProvider: Send + Sync {
    /// Accepted tokens, most important first.
    fn accepted(&self, request: &HttpRequest) -> Vec<String>;
}

/// Split a comma separated list, trimming tokens and dropping empty ones.
fn split_tokens(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Reads the `Accept` header. Every occurrence is used, in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderAcceptProvider;

impl AcceptProvider for HeaderAcceptProvider {
    fn accepted(&self, request: &HttpRequest) -> Vec<String> {
        request
            .header("Accept")
            .iter()
            .flat_map(|value| split_tokens(value))
            .collect()
    }
}

/// Reads a request parameter, `format` by default.
///
/// GET requests use the query string only. Other methods check the parsed
/// body first, then the query string. Non-string values are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParameterAcceptProvider {
    pub name: String,
}

impl RequestParameterAcceptProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn from_query(&self, request: &HttpRequest) -> Vec<String> {
        request
            .query(&self.name)
            .map(|value| split_tokens(value).collect())
            .unwrap_or_default()
    }

    fn from_body(&self, request: &HttpRequest) -> Vec<String> {
        request
            .body_param(&self.name)
            .and_then(|value| value.as_str())
            .map(|value| split_tokens(value).collect())
            .unwrap_or_default()
    }
}

impl Default for RequestParameterAcceptProvider {
    fn default() -> Self {
        Self::new("format")
    }
}

impl AcceptProvider for RequestParameterAcceptProvider {
    fn accepted(&self, request: &HttpRequest) -> Vec<String> {
        if request.method == Method::GET {
            return self.from_query(request);
        }

        let mut accepted = self.from_body(request);
        accepted.extend(self.from_query(request));
        accepted
    }
}

// ============================================================================
// Negotiator
// ============================================================================

/// Middleware choosing a formatter for data responses from the request.
#[derive(Clone)]
pub struct ContentNegotiator {
    formatters: Vec<(String, Arc<dyn ResponseFormatter>)>,
    accept_provider: Arc<dyn AcceptProvider>,
}

impl ContentNegotiator {
    /// Create a negotiator reading the `Accept` header.
    ///
    /// A repeated content type replaces the earlier formatter in place. An
    /// empty content type occurs in every token and so matches any request
    /// that sends one.
    pub fn new<I, K>(formatters: I) -> Self
    where
        I: IntoIterator<Item = (K, Arc<dyn ResponseFormatter>)>,
        K: Into<String>,
    {
        Self {
            formatters: Self::build_table(formatters),
            accept_provider: Arc::new(HeaderAcceptProvider),
        }
    }

    /// Copy with a different formatter table, built like [`ContentNegotiator::new`].
    pub fn with_content_formatters<I, K>(&self, formatters: I) -> Self
    where
        I: IntoIterator<Item = (K, Arc<dyn ResponseFormatter>)>,
        K: Into<String>,
    {
        Self {
            formatters: Self::build_table(formatters),
            accept_provider: self.accept_provider.clone(),
        }
    }

    /// Read accepted types from somewhere other than the `Accept` header.
    pub fn with_accept_provider(mut self, provider: impl AcceptProvider + 'static) -> Self {
        self.accept_provider = Arc::new(provider);
        self
    }

    fn build_table<I, K>(formatters: I) -> Vec<(String, Arc<dyn ResponseFormatter>)>
    where
        I: IntoIterator<Item = (K, Arc<dyn ResponseFormatter>)>,
        K: Into<String>,
    {
        let mut table: Vec<(String, Arc<dyn ResponseFormatter>)> = Vec::new();

        for (content_type, formatter) in formatters {
            let content_type = content_type.into();

            match table.iter_mut().find(|(existing, _)| *existing == content_type) {
                Some(entry) => {
                    debug!(content_type = %content_type, "Replacing formatter for content type");
                    entry.1 = formatter;
                }
                None => table.push((content_type, formatter)),
            }
        }

        table
    }

    /// Configured content types, in matching order.
    pub fn content_types(&self) -> impl Iterator<Item = &str> {
        self.formatters.iter().map(|(content_type, _)| content_type.as_str())
    }

    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }

    /// First formatter whose content type occurs in an accepted token.
    pub fn select(&self, accepted: &[String]) -> Option<(&str, Arc<dyn ResponseFormatter>)> {
        accepted.iter().find_map(|token| {
            self.formatters
                .iter()
                .find(|(content_type, _)| token.contains(content_type.as_str()))
                .map(|(content_type, formatter)| (content_type.as_str(), formatter.clone()))
        })
    }
}

impl std::fmt::Debug for ContentNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentNegotiator")
            .field("content_types", &self.content_types().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Middleware for ContentNegotiator {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<Response, Error> {
        let accepted = self.accept_provider.accepted(&req);
        let path = req.path.clone();

        match next(req).await? {
            Response::Data(data) if !data.has_response_formatter() => {
                match self.select(&accepted) {
                    Some((content_type, formatter)) => {
                        debug!(path = %path, content_type = %content_type, "Negotiated response formatter");
                        Ok(Response::Data(data.with_response_formatter(formatter)))
                    }
                    None => {
                        trace!(path = %path, accepted = ?accepted, "No formatter matches accepted types");
                        Ok(Response::Data(data))
                    }
                }
            }
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{HtmlFormatter, JsonFormatter, XmlFormatter};

    fn table() -> Vec<(&'static str, Arc<dyn ResponseFormatter>)> {
        vec![
            ("text/html", Arc::new(HtmlFormatter::new())),
            ("application/xml", Arc::new(XmlFormatter::new())),
            ("application/json", Arc::new(JsonFormatter::new())),
        ]
    }

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_header_provider_splits_and_trims() {
        let request = HttpRequest::get("/")
            .with_header("Accept", " text/html , ,application/json")
            .with_header("accept", "application/xml");

        assert_eq!(
            HeaderAcceptProvider.accepted(&request),
            tokens(&["text/html", "application/json", "application/xml"])
        );
    }

    #[test]
    fn test_header_provider_without_header() {
        assert!(HeaderAcceptProvider.accepted(&HttpRequest::get("/")).is_empty());
    }

    #[test]
    fn test_parameter_provider_get_uses_query_only() {
        let request = HttpRequest::get("/")
            .with_query_param("format", "json, xml")
            .with_body_param("format", "html");

        assert_eq!(
            RequestParameterAcceptProvider::default().accepted(&request),
            tokens(&["json", "xml"])
        );
    }

    #[test]
    fn test_parameter_provider_post_body_then_query() {
        let request = HttpRequest::post("/")
            .with_query_param("format", "xml")
            .with_body_param("format", "html,json");

        assert_eq!(
            RequestParameterAcceptProvider::default().accepted(&request),
            tokens(&["html", "json", "xml"])
        );
    }

    #[test]
    fn test_parameter_provider_ignores_non_strings() {
        let request = HttpRequest::post("/").with_body_param("type", 42);

        let provider = RequestParameterAcceptProvider::new("type");
        assert_eq!(provider.name, "type");
        assert!(provider.accepted(&request).is_empty());
    }

    #[test]
    fn test_select_first_match() {
        let negotiator = ContentNegotiator::new(table());

        let (content_type, _) = negotiator
            .select(&tokens(&["application/json", "text/html"]))
            .unwrap();
        assert_eq!(content_type, "application/json");
    }

    #[test]
    fn test_select_substring_match() {
        let negotiator = ContentNegotiator::new(table());

        let (content_type, _) = negotiator
            .select(&tokens(&["application/xml;q=0.9"]))
            .unwrap();
        assert_eq!(content_type, "application/xml");
    }

    #[test]
    fn test_select_table_order_within_token() {
        let negotiator = ContentNegotiator::new(table());

        // One token containing two configured types: table order decides.
        let (content_type, _) = negotiator
            .select(&tokens(&["application/json+text/html"]))
            .unwrap();
        assert_eq!(content_type, "text/html");
    }

    #[test]
    fn test_select_no_match() {
        let negotiator = ContentNegotiator::new(table());
        assert!(negotiator.select(&tokens(&["text/plain"])).is_none());
        assert!(negotiator.select(&[]).is_none());
    }

    #[test]
    fn test_empty_content_type_matches_any_token() {
        let mut formatters = table();
        formatters.push(("", Arc::new(JsonFormatter::new())));
        let negotiator = ContentNegotiator::new(formatters);

        let (content_type, _) = negotiator.select(&tokens(&["image/png"])).unwrap();
        assert_eq!(content_type, "");

        let (content_type, _) = negotiator.select(&tokens(&["text/html"])).unwrap();
        assert_eq!(content_type, "text/html");
        assert!(negotiator.select(&[]).is_none());
    }

    #[test]
    fn test_with_content_formatters_replaces_table() {
        let negotiator = ContentNegotiator::new(table());
        let replaced = negotiator.with_content_formatters(vec![(
            "application/json",
            Arc::new(JsonFormatter::new()) as Arc<dyn ResponseFormatter>,
        )]);

        assert_eq!(replaced.len(), 1);
        assert_eq!(negotiator.len(), 3);
    }

    #[test]
    fn test_duplicate_content_type_replaces_in_place() {
        let mut formatters = table();
        formatters.push(("text/html", Arc::new(XmlFormatter::new())));

        let negotiator = ContentNegotiator::new(formatters);
        assert_eq!(
            negotiator.content_types().collect::<Vec<_>>(),
            vec!["text/html", "application/xml", "application/json"]
        );
    }
}
