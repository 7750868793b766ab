//! XML formatter
//!
//! Data is turned into a small element tree, then written with `quick-xml`.
//!
//! - Arrays and iterable objects produce one child element per entry, named
//!   after the key. Integer keys and names that are not valid XML names
//!   produce `<item>`.
//! - When a collection has more than one entry, children with integer keys
//!   carry a `key="<index>"` attribute.
//! - Objects implementing [`XmlData`] produce an element with their own tag
//!   name and attributes.
//! - Scalars become text: `true`, `false`, floats without exponent, strings
//!   as they are. Empty values produce no text.
//!
//! # Examples
//!
//! ```
//! use veneer_core::data::{Data, DataArray};
//! use veneer_core::formatter::XmlFormatter;
//!
//! let xml = XmlFormatter::new()
//!     .render(&Data::from(vec![true, false]))
//!     .unwrap();
//!
//! assert_eq!(
//!     xml,
//!     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
//!      <response><item key=\"0\">true</item><item key=\"1\">false</item></response>\n"
//! );
//! ```

use super::{ContentType, ResponseFormatter, content_type_setters};
use crate::data::{Data, DataArray, Key, XmlData, format_float};
use crate::{DataResponse, Error, HttpResponse, Result};
use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::borrow::Cow;

/// Element name used when a key or tag name cannot be used.
pub const DEFAULT_ITEM_TAG: &str = "item";

/// Attribute disambiguating positional children.
pub const KEY_ATTRIBUTE: &str = "key";

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

/// Whether `name` is a syntactically valid XML name.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => is_name_start_char(first) && chars.all(is_name_char),
        None => false,
    }
}

/// `name` if it can be used as an element name, [`DEFAULT_ITEM_TAG`] otherwise.
pub fn safe_element_name(name: &str) -> &str {
    if is_valid_name(name) { name } else { DEFAULT_ITEM_TAG }
}

fn element_name_for(key: &Key) -> &str {
    match key {
        Key::Index(_) => DEFAULT_ITEM_TAG,
        Key::Name(name) => safe_element_name(name),
    }
}

/// Text form of a scalar inside an XML node.
pub fn format_scalar(data: &Data) -> Option<String> {
    match data {
        Data::Bool(true) => Some("true".to_string()),
        Data::Bool(false) => Some("false".to_string()),
        Data::Float(value) => Some(format_float(*value)),
        other => other.to_text(),
    }
}

// ============================================================================
// Element tree
// ============================================================================

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|(existing, _)| existing == name)
    }

    fn set_attribute(&mut self, name: &str, value: String) {
        match self.attributes.iter_mut().find(|(existing, _)| existing == name) {
            Some(attribute) => attribute.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }
}

fn build(parent: &mut Vec<Node>, data: &Data) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }

    match data {
        Data::Array(array) => build_entries(parent, array),
        Data::Object(object) => {
            if let Some(xml) = object.as_xml() {
                build_object(parent, xml, None)
            } else if let Some(entries) = object.entries() {
                build_entries(parent, &entries)
            } else {
                push_scalar(parent, data)
            }
        }
        scalar => push_scalar(parent, scalar),
    }
}

fn build_entries(parent: &mut Vec<Node>, array: &DataArray) -> Result<()> {
    let disambiguate = array.len() > 1;

    for (key, value) in array.iter() {
        let index = match key {
            Key::Index(index) if disambiguate => Some(*index),
            _ => None,
        };

        if let Data::Object(object) = value {
            if let Some(xml) = object.as_xml() {
                build_object(parent, xml, index)?;
                continue;
            }
        }

        let mut child = Element::new(element_name_for(key));
        if let Some(index) = index {
            child.set_attribute(KEY_ATTRIBUTE, index.to_string());
        }

        match value {
            Data::Array(_) | Data::Object(_) => build(&mut child.children, value)?,
            scalar => push_scalar(&mut child.children, scalar)?,
        }

        parent.push(Node::Element(child));
    }

    Ok(())
}

fn build_object(parent: &mut Vec<Node>, object: &dyn XmlData, index: Option<i64>) -> Result<()> {
    let mut child = Element::new(safe_element_name(&object.xml_tag_name()));

    for (name, value) in object.xml_tag_attributes() {
        if !is_valid_name(&name) {
            return Err(Error::Serialization(format!(
                "Invalid XML attribute name \"{}\" on <{}>.",
                name, child.name
            )));
        }
        child.set_attribute(&name, value);
    }

    if let Some(index) = index {
        if !child.has_attribute(KEY_ATTRIBUTE) {
            child.set_attribute(KEY_ATTRIBUTE, index.to_string());
        }
    }

    build(&mut child.children, &object.xml_data())?;
    parent.push(Node::Element(child));
    Ok(())
}

fn push_scalar(parent: &mut Vec<Node>, data: &Data) -> Result<()> {
    let text = format_scalar(data).ok_or_else(|| {
        Error::DataShape(format!(
            "The \"{}\" object must implement XmlData, provide entries, or convert to text.",
            data.type_name()
        ))
    })?;

    if !text.is_empty() {
        parent.push(Node::Text(text));
    }

    Ok(())
}

// ============================================================================
// Formatter
// ============================================================================

/// Formats data as an XML document (`application/xml`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlFormatter {
    content: ContentType,
    version: String,
    root_tag: String,
}

impl XmlFormatter {
    pub fn new() -> Self {
        Self {
            content: ContentType::new("application/xml"),
            version: "1.0".to_string(),
            root_tag: "response".to_string(),
        }
    }

    /// XML version written in the declaration.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Name of the element wrapping the document. Empty means no wrapper.
    pub fn with_root_tag(mut self, root_tag: impl Into<String>) -> Self {
        self.root_tag = root_tag.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn root_tag(&self) -> &str {
        &self.root_tag
    }

    /// Render `data` as a complete XML document.
    pub fn render(&self, data: &Data) -> Result<String> {
        let mut nodes = Vec::new();

        if self.root_tag.is_empty() {
            build(&mut nodes, data)?;
            // Text cannot sit next to the declaration.
            for node in nodes.iter_mut() {
                if let Node::Text(text) = node {
                    let mut item = Element::new(DEFAULT_ITEM_TAG);
                    item.children.push(Node::Text(std::mem::take(text)));
                    *node = Node::Element(item);
                }
            }
        } else {
            let mut root = Element::new(safe_element_name(&self.root_tag));
            build(&mut root.children, data)?;
            nodes.push(Node::Element(root));
        }

        self.write_document(&nodes)
    }

    fn write_document(&self, nodes: &[Node]) -> Result<String> {
        let ascii_only = !is_utf8(&self.content.encoding);
        let mut writer = Writer::new(Vec::new());

        writer
            .write_event(Event::Decl(BytesDecl::new(
                &self.version,
                Some(self.content.encoding.as_str()),
                None,
            )))
            .map_err(xml_error)?;
        writer.get_mut().push(b'\n');

        for node in nodes {
            write_node(&mut writer, node, ascii_only)?;
            writer.get_mut().push(b'\n');
        }

        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Serialization(format!("XML output is not valid UTF-8: {}", e)))
    }
}

fn is_utf8(encoding: &str) -> bool {
    encoding.eq_ignore_ascii_case("UTF-8") || encoding.eq_ignore_ascii_case("UTF8")
}

fn xml_error(err: impl std::fmt::Display) -> Error {
    Error::Serialization(format!("XML write error: {}", err))
}

/// Replace non-ASCII characters with character references.
fn ascii_references(escaped: Cow<'_, str>) -> Cow<'_, str> {
    if escaped.is_ascii() {
        return escaped;
    }

    let mut out = String::with_capacity(escaped.len());
    for c in escaped.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(&format!("&#{};", c as u32));
        }
    }
    Cow::Owned(out)
}

/// Text content. `\r` is written as a reference so parsers keep it.
fn escape_text(text: &str) -> Cow<'_, str> {
    let escaped = partial_escape(text);
    if escaped.contains('\r') {
        Cow::Owned(escaped.replace('\r', "&#13;"))
    } else {
        escaped
    }
}

/// Double-quoted attribute value. Whitespace other than spaces is written
/// as references so attribute normalization does not rewrite it.
fn escape_attribute(value: &str) -> Cow<'_, str> {
    let escaped = partial_escape(value);
    if !escaped.contains(['"', '\r', '\n', '\t']) {
        return escaped;
    }

    let mut out = String::with_capacity(escaped.len() + 8);
    for c in escaped.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '\r' => out.push_str("&#13;"),
            '\n' => out.push_str("&#10;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node, ascii_only: bool) -> Result<()> {
    match node {
        Node::Text(text) => {
            let mut escaped = escape_text(text);
            if ascii_only {
                escaped = ascii_references(escaped);
            }
            writer
                .write_event(Event::Text(BytesText::from_escaped(escaped)))
                .map_err(xml_error)
        }
        Node::Element(element) => {
            // Names cannot hold character references.
            let name = if ascii_only && !element.name.is_ascii() {
                DEFAULT_ITEM_TAG
            } else {
                element.name.as_str()
            };

            let mut start = BytesStart::new(name);
            for (attribute, value) in &element.attributes {
                if ascii_only && !attribute.is_ascii() {
                    return Err(Error::Serialization(format!(
                        "XML attribute name \"{}\" on <{}> cannot be written in a non-UTF-8 document.",
                        attribute, name
                    )));
                }
                let mut escaped = escape_attribute(value);
                if ascii_only {
                    escaped = ascii_references(escaped);
                }
                start.push_attribute((attribute.as_bytes(), escaped.as_bytes()));
            }

            if element.children.is_empty() {
                return writer.write_event(Event::Empty(start)).map_err(xml_error);
            }

            writer.write_event(Event::Start(start)).map_err(xml_error)?;
            for child in &element.children {
                write_node(writer, child, ascii_only)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(xml_error)
        }
    }
}

impl Default for XmlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

content_type_setters!(XmlFormatter);

impl ResponseFormatter for XmlFormatter {
    fn format(&self, data_response: &mut DataResponse) -> Result<HttpResponse> {
        let data = data_response.get_data();

        let content = if data.is_null() {
            None
        } else {
            Some(self.render(&data)?)
        };

        self.content
            .apply(data_response.response().clone(), content.as_deref())
    }
}
