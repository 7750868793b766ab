//! Integration tests for veneer-config

use std::env;
use std::fs;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use veneer_config::*;
use veneer_core::{
    DataResponseFactory, Error, HandlerFn, HttpRequest, MiddlewareChain, Response,
};

fn hello_handler() -> HandlerFn {
    Arc::new(|_req: HttpRequest| {
        Box::pin(async {
            DataResponseFactory::default()
                .create_response("Hello World!", 200, "")
                .map(Response::from)
        }) as Pin<Box<dyn Future<Output = std::result::Result<Response, Error>> + Send>>
    })
}

#[tokio::test]
async fn test_negotiator_from_toml() {
    let config = NegotiationConfig::from_toml(
        r#"
        [[formatters]]
        content_type = "text/html"
        formatter = { kind = "html" }

        [[formatters]]
        content_type = "application/xml"
        formatter = { kind = "xml", root_tag = "greeting", encoding = "ISO-8859-1" }
        "#,
    )
    .unwrap();

    let mut chain = MiddlewareChain::new();
    chain.use_middleware(config.build().unwrap());

    let response = chain
        .apply(
            HttpRequest::get("/").with_header("Accept", "application/xml"),
            hello_handler(),
        )
        .await
        .unwrap()
        .into_http_response()
        .unwrap();

    assert_eq!(
        response.body.to_string(),
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<greeting>Hello World!</greeting>\n"
    );
    assert_eq!(
        response.header_line("Content-Type"),
        "application/xml; charset=ISO-8859-1"
    );
}

#[tokio::test]
async fn test_parameter_accept_source() {
    let config = NegotiationConfig::from_json(
        r#"{
            "accept": "parameter",
            "parameter_name": "as",
            "formatters": [
                {"content_type": "json", "formatter": {"kind": "json", "json": {"pretty_print": true}}},
                {"content_type": "text", "formatter": {"kind": "plain_text"}}
            ]
        }"#,
    )
    .unwrap();

    let mut chain = MiddlewareChain::new();
    chain.use_middleware(config.build().unwrap());

    let response = chain
        .apply(
            HttpRequest::get("/").with_query_param("as", "text"),
            hello_handler(),
        )
        .await
        .unwrap()
        .into_http_response()
        .unwrap();

    assert_eq!(response.body.to_string(), "Hello World!");
    assert_eq!(response.header_line("Content-Type"), "text/plain; charset=UTF-8");
}

#[test]
fn test_load_file() {
    let dir = env::temp_dir().join(format!("veneer-config-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("veneer.json");
    fs::write(
        &path,
        r#"{"logging": {"level": "warn"}, "negotiation": {"formatters": [
            {"content_type": "application/json", "formatter": {"kind": "json"}}
        ]}}"#,
    )
    .unwrap();

    let config = VeneerConfig::load_file(&path).unwrap();
    assert_eq!(config.logging.level, veneer_core::logging::LogLevel::Warn);
    assert_eq!(
        config.negotiator().unwrap().content_types().collect::<Vec<_>>(),
        vec!["application/json"]
    );

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_load_missing_file() {
    let err = VeneerConfig::load_file("/nonexistent/veneer.toml").unwrap_err();
    assert!(matches!(err, ConfigError::LoadError(_)));
}

#[test]
fn test_negotiation_from_env() {
    let loader = EnvLoader::new(Some("VENEER_ITEST".to_string()));

    unsafe {
        env::set_var(
            "VENEER_ITEST_FORMATTERS",
            "text/html=html,application/json=json",
        );
        env::set_var("VENEER_ITEST_ACCEPT", "parameter");
    }

    let config = NegotiationConfig::from_env(&loader).unwrap();
    assert_eq!(config.accept, AcceptSource::Parameter);
    assert_eq!(config.parameter_name, "format");
    assert_eq!(config.formatters.len(), 2);
    assert_eq!(config.formatters[1].formatter.kind().unwrap(), FormatterKind::Json);

    let vars = loader.load();
    assert_eq!(vars.get("accept").map(String::as_str), Some("parameter"));

    unsafe {
        env::remove_var("VENEER_ITEST_FORMATTERS");
        env::remove_var("VENEER_ITEST_ACCEPT");
    }
}

#[test]
fn test_unknown_accept_source_from_env() {
    let loader = EnvLoader::new(Some("VENEER_BADTEST".to_string()));

    unsafe {
        env::set_var("VENEER_BADTEST_ACCEPT", "cookie");
    }

    let err = NegotiationConfig::from_env(&loader).unwrap_err();
    assert!(err.to_string().contains("\"cookie\""));

    unsafe {
        env::remove_var("VENEER_BADTEST_ACCEPT");
    }
}
