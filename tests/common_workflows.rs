//! Integration tests for common Veneer workflows.
//!
//! A handler returns data, middleware decides how it is rendered and the
//! result is handed to a transport as an `http::Response`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use veneer::prelude::*;

type BoxedResponse = Pin<Box<dyn Future<Output = Result<Response, Error>> + Send>>;

fn handler_with(data: serde_json::Value) -> HandlerFn {
    Arc::new(move |_req: HttpRequest| {
        let data = data.clone();
        Box::pin(async move {
            DataResponseFactory::default()
                .create_response(Data::from(data), 200, "")
                .map(Response::from)
        }) as BoxedResponse
    })
}

fn negotiator() -> ContentNegotiator {
    ContentNegotiator::new([
        ("text/html", Arc::new(HtmlFormatter::new()) as Arc<dyn ResponseFormatter>),
        ("application/xml", Arc::new(XmlFormatter::new())),
        ("application/json", Arc::new(JsonFormatter::new())),
    ])
}

/// Marks data responses so tests can see middleware order.
struct Stamp(&'static str);

#[async_trait]
impl Middleware for Stamp {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<Response, Error> {
        match next(req).await? {
            Response::Data(data) => Ok(Response::Data(data.with_added_header("X-Stamp", self.0))),
            other => Ok(other),
        }
    }
}

// =============================================================================
// Negotiation
// =============================================================================

#[tokio::test]
async fn test_json_document_end_to_end() {
    let mut chain = MiddlewareChain::new();
    chain.use_middleware(negotiator());

    let response = chain
        .apply(
            HttpRequest::get("/users/1").with_header("Accept", "application/json"),
            handler_with(serde_json::json!({"id": 1, "name": "Ada", "tags": ["admin"]})),
        )
        .await
        .unwrap()
        .into_http_response()
        .unwrap()
        .into_http()
        .unwrap();

    assert_eq!(response.status(), http::StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/json; charset=UTF-8"
    );
    assert_eq!(
        response.body().as_ref(),
        br#"{"id":1,"name":"Ada","tags":["admin"]}"#
    );
}

#[tokio::test]
async fn test_xml_document_end_to_end() {
    let mut chain = MiddlewareChain::new();
    chain.use_middleware(negotiator());

    let response = chain
        .apply(
            HttpRequest::get("/users/1").with_header("Accept", "application/xml"),
            handler_with(serde_json::json!({"id": 1, "tags": ["admin", "ops"]})),
        )
        .await
        .unwrap()
        .into_http_response()
        .unwrap();

    assert_eq!(
        response.body.to_string(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <response><id>1</id><tags><item key=\"0\">admin</item><item key=\"1\">ops</item></tags></response>\n"
    );
}

#[tokio::test]
async fn test_fallback_formatter_after_negotiation() {
    // Negotiation runs first on the way out, the fallback only fills gaps.
    let mut chain = MiddlewareChain::new();
    chain.use_middleware(FormatDataResponse::as_plain_text());
    chain.use_middleware(negotiator());

    let negotiated = chain
        .apply(
            HttpRequest::get("/").with_header("Accept", "text/html"),
            handler_with(serde_json::json!("<p>hi</p>")),
        )
        .await
        .unwrap()
        .into_http_response()
        .unwrap();
    assert_eq!(negotiated.header_line("Content-Type"), "text/html; charset=UTF-8");

    let fallback = chain
        .apply(
            HttpRequest::get("/").with_header("Accept", "image/png"),
            handler_with(serde_json::json!("<p>hi</p>")),
        )
        .await
        .unwrap()
        .into_http_response()
        .unwrap();
    assert_eq!(fallback.header_line("Content-Type"), "text/plain; charset=UTF-8");
    assert_eq!(fallback.body.to_string(), "<p>hi</p>");
}

#[tokio::test]
async fn test_custom_middleware_sees_data_responses() {
    let mut chain = MiddlewareChain::new();
    chain.use_middleware(Stamp("outer"));
    chain.use_middleware(negotiator());
    chain.use_middleware(Stamp("inner"));

    let response = chain
        .apply(
            HttpRequest::get("/").with_header("Accept", "application/json"),
            handler_with(serde_json::json!([1, 2])),
        )
        .await
        .unwrap()
        .into_http_response()
        .unwrap();

    assert_eq!(response.header_line("X-Stamp"), "inner, outer");
    assert_eq!(response.body.to_string(), "[1,2]");
}

#[tokio::test]
async fn test_formatting_error_surfaces_on_finish() {
    let mut chain = MiddlewareChain::new();
    chain.use_middleware(FormatDataResponse::as_html());

    let response = chain
        .apply(
            HttpRequest::get("/"),
            handler_with(serde_json::json!({"not": "text"})),
        )
        .await
        .unwrap();

    let err = tokio_test::assert_err!(response.into_http_response());
    assert!(matches!(err, Error::DataShape(_)));
    assert_eq!(err.status_code(), 500);
}

// =============================================================================
// Deferred responses without middleware
// =============================================================================

#[test]
fn test_lazy_data_with_json() {
    let mut response = DataResponseFactory::default()
        .create_response(
            RawData::producer(|| DataArray::new().with_entry("status", "ok").into()),
            200,
            "",
        )
        .unwrap()
        .with_response_formatter(Arc::new(JsonFormatter::new().with_options(JsonOptions {
            pretty_print: true,
            ..JsonOptions::default()
        })));

    assert_eq!(
        response.get_body().unwrap().to_string(),
        "{\n  \"status\": \"ok\"\n}"
    );
}

#[test]
fn test_status_survives_formatting() {
    let response = DataResponseFactory::default()
        .create_response("missing", 404, "")
        .unwrap()
        .with_response_formatter(Arc::new(PlainTextFormatter::new()))
        .into_response()
        .unwrap();

    assert_eq!(response.status, 404);
    assert_eq!(response.reason_phrase, "Not Found");
    assert_eq!(response.body.to_string(), "missing");
}
