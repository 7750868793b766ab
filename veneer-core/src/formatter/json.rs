// JSON formatter

use super::{ContentType, ResponseFormatter, content_type_setters};
use crate::{DataResponse, HttpResponse, Result};
use serde::{Deserialize, Serialize};

/// Encoding switches for [`JsonFormatter`].
///
/// The defaults produce compact output with `/` and non-ASCII characters
/// left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonOptions {
    /// Write `/` as `\/`.
    pub escape_slashes: bool,
    /// Write non-ASCII characters as `\uXXXX` escapes.
    pub escape_unicode: bool,
    pub pretty_print: bool,
}

/// Formats data as JSON (`application/json`).
///
/// Null data writes no body; the header is still set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFormatter {
    content: ContentType,
    options: JsonOptions,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            content: ContentType::new("application/json"),
            options: JsonOptions::default(),
        }
    }

    pub fn with_options(mut self, options: JsonOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> JsonOptions {
        self.options
    }

    /// Encode any serializable value with this formatter's options.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let encoded = if self.options.pretty_print {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        // `/` and non-ASCII characters only ever occur inside JSON strings,
        // so escaping them over the whole document is safe.
        let encoded = if self.options.escape_slashes {
            encoded.replace('/', "\\/")
        } else {
            encoded
        };

        Ok(if self.options.escape_unicode {
            escape_non_ascii(&encoded)
        } else {
            encoded
        })
    }
}

fn escape_non_ascii(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut units = [0u16; 2];

    for ch in encoded.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }

    out
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

content_type_setters!(JsonFormatter);

impl ResponseFormatter for JsonFormatter {
    fn format(&self, data_response: &mut DataResponse) -> Result<HttpResponse> {
        let data = data_response.get_data();

        let content = if data.is_null() {
            None
        } else {
            Some(self.encode(&data)?)
        };

        self.content
            .apply(data_response.response().clone(), content.as_deref())
    }
}
