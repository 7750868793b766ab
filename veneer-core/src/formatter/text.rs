// HTML and plain text formatters

use super::{ContentType, ResponseFormatter, content_type_setters};
use crate::{DataResponse, Error, HttpResponse, Result};

/// Render scalar data as text.
///
/// Empty data (null, `false`, `0`, `""`, `"0"`) writes no body.
fn format_text(content: &ContentType, data_response: &mut DataResponse) -> Result<HttpResponse> {
    let data = data_response.get_data();

    let text = data.to_text().ok_or_else(|| {
        Error::DataShape(format!(
            "Data must be either a scalar value, null, or a stringable object. {} given.",
            data.type_name()
        ))
    })?;

    let body = if data.is_empty() { None } else { Some(text.as_str()) };
    content.apply(data_response.response().clone(), body)
}

/// Formats data as an HTML fragment (`text/html`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlFormatter {
    content: ContentType,
}

impl HtmlFormatter {
    pub fn new() -> Self {
        Self {
            content: ContentType::new("text/html"),
        }
    }
}

impl Default for HtmlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

content_type_setters!(HtmlFormatter);

impl ResponseFormatter for HtmlFormatter {
    fn format(&self, data_response: &mut DataResponse) -> Result<HttpResponse> {
        format_text(&self.content, data_response)
    }
}

/// Formats data as plain text (`text/plain`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainTextFormatter {
    content: ContentType,
}

impl PlainTextFormatter {
    pub fn new() -> Self {
        Self {
            content: ContentType::new("text/plain"),
        }
    }
}

impl Default for PlainTextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

content_type_setters!(PlainTextFormatter);

impl ResponseFormatter for PlainTextFormatter {
    fn format(&self, data_response: &mut DataResponse) -> Result<HttpResponse> {
        format_text(&self.content, data_response)
    }
}
