//! Response data model
//!
//! Handlers hand a [`Data`] value to a deferred response instead of bytes.
//! Formatters decide how that value is rendered.
//!
//! `Data` mirrors the shapes a dynamic response payload can take: scalars,
//! ordered keyed collections ([`DataArray`]) and application objects. An
//! object opts into each rendering by implementing the matching hook of
//! [`DataObject`]: text conversion, iteration, or an explicit XML
//! description through [`XmlData`].
//!
//! # Examples
//!
//! ```
//! use veneer_core::data::{Data, DataArray};
//!
//! let data = Data::from(
//!     DataArray::new()
//!         .with_entry("name", "Alice")
//!         .with_entry("roles", vec!["admin", "dev"]),
//! );
//! assert!(!data.is_empty());
//! ```

use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Key of a [`DataArray`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Index(i64),
    Name(String),
}

impl Key {
    /// Build a key from a string.
    ///
    /// Strings holding a canonical decimal integer (`"7"`, `"-3"`, but not
    /// `"07"` or `"+7"`) become [`Key::Index`].
    pub fn parse(name: &str) -> Self {
        let digits = name.strip_prefix('-').unwrap_or(name);
        let canonical = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && (digits == "0" || !digits.starts_with('0'))
            && name != "-0";

        if canonical {
            if let Ok(index) = name.parse::<i64>() {
                return Key::Index(index);
            }
        }

        Key::Name(name.to_string())
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Key::Index(_))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(index) => write!(f, "{index}"),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for Key {
    fn from(index: i64) -> Self {
        Key::Index(index)
    }
}

impl From<i32> for Key {
    fn from(index: i32) -> Self {
        Key::Index(index as i64)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index as i64)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::parse(name)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::parse(&name)
    }
}

/// Ordered keyed collection.
///
/// Keys are unique. [`DataArray::push`] assigns the next integer index,
/// one past the largest index used so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataArray {
    entries: Vec<(Key, Data)>,
    next_index: i64,
}

impl DataArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under the next free integer index.
    pub fn push(&mut self, value: impl Into<Data>) {
        let key = Key::Index(self.next_index);
        self.insert(key, value);
    }

    /// Set the value for `key`. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Data>) {
        let key = key.into();
        let value = value.into();

        if let Key::Index(index) = key {
            if index >= self.next_index {
                self.next_index = index.saturating_add(1);
            }
        }

        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with_item(mut self, value: impl Into<Data>) -> Self {
        self.push(value);
        self
    }

    pub fn with_entry(mut self, key: impl Into<Key>, value: impl Into<Data>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &Key) -> Option<&Data> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Data)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// Whether the keys are exactly `0, 1, 2, ...` in order.
    pub fn is_list(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(position, (key, _))| *key == Key::Index(position as i64))
    }
}

impl IntoIterator for DataArray {
    type Item = (Key, Data);
    type IntoIter = std::vec::IntoIter<(Key, Data)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<Data> for DataArray {
    fn from_iter<I: IntoIterator<Item = Data>>(iter: I) -> Self {
        let mut array = DataArray::new();
        for value in iter {
            array.push(value);
        }
        array
    }
}

impl FromIterator<(Key, Data)> for DataArray {
    fn from_iter<I: IntoIterator<Item = (Key, Data)>>(iter: I) -> Self {
        let mut array = DataArray::new();
        for (key, value) in iter {
            array.insert(key, value);
        }
        array
    }
}

/// Object that describes its own XML element.
pub trait XmlData {
    /// Element name. Empty, numeric or invalid names fall back to `item`.
    fn xml_tag_name(&self) -> String;

    /// Attributes set on the element, in order.
    fn xml_tag_attributes(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Content rendered inside the element.
    fn xml_data(&self) -> Data;
}

/// Clones a boxed [`DataObject`]. Implemented for every `Clone` object.
pub trait ObjectClone {
    fn clone_object(&self) -> Box<dyn DataObject>;
}

impl<T> ObjectClone for T
where
    T: DataObject + Clone + 'static,
{
    fn clone_object(&self) -> Box<dyn DataObject> {
        Box::new(self.clone())
    }
}

/// An application object carried as response data.
///
/// Every hook is optional. A formatter that needs a view the object does
/// not provide fails with a data shape error naming [`DataObject::type_name`].
pub trait DataObject: fmt::Debug + Send + Sync + ObjectClone {
    fn type_name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// String conversion, used by text formatters and JSON.
    fn to_text(&self) -> Option<String> {
        None
    }

    /// Keyed view of the object, used by JSON and XML.
    fn entries(&self) -> Option<DataArray> {
        None
    }

    fn as_xml(&self) -> Option<&dyn XmlData> {
        None
    }
}

impl Clone for Box<dyn DataObject> {
    fn clone(&self) -> Self {
        (**self).clone_object()
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    let start = base.rfind("::").map(|i| i + 2).unwrap_or(0);
    &full[start..]
}

/// Response payload.
#[derive(Debug, Clone, Default)]
pub enum Data {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(DataArray),
    Object(Box<dyn DataObject>),
}

impl Data {
    /// Wrap an application object.
    pub fn object(object: impl DataObject + 'static) -> Self {
        Data::Object(Box::new(object))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Data::Null)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Data::Bool(_) | Data::Int(_) | Data::Float(_) | Data::String(_)
        )
    }

    /// Loose emptiness: null, `false`, `0`, `0.0`, `""`, `"0"` and empty
    /// arrays are empty. Objects never are.
    pub fn is_empty(&self) -> bool {
        match self {
            Data::Null => true,
            Data::Bool(value) => !value,
            Data::Int(value) => *value == 0,
            Data::Float(value) => *value == 0.0,
            Data::String(value) => value.is_empty() || value == "0",
            Data::Array(array) => array.is_empty(),
            Data::Object(_) => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&DataArray> {
        match self {
            Data::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Data::Null => "null",
            Data::Bool(_) => "bool",
            Data::Int(_) => "int",
            Data::Float(_) => "float",
            Data::String(_) => "string",
            Data::Array(_) => "array",
            Data::Object(object) => object.type_name(),
        }
    }

    /// String conversion of scalars, null and text-convertible objects.
    ///
    /// `true` is `"1"`, `false` and null are `""`. Arrays and objects
    /// without [`DataObject::to_text`] have no text form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Data::Null => Some(String::new()),
            Data::Bool(true) => Some("1".to_string()),
            Data::Bool(false) => Some(String::new()),
            Data::Int(value) => Some(value.to_string()),
            Data::Float(value) => Some(format_float(*value)),
            Data::String(value) => Some(value.clone()),
            Data::Array(_) => None,
            Data::Object(object) => object.to_text(),
        }
    }
}

/// Locale-independent float rendering without exponent notation.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NAN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        value.to_string()
    }
}

impl PartialEq for Data {
    /// Objects are never equal to anything, including themselves.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Data::Null, Data::Null) => true,
            (Data::Bool(a), Data::Bool(b)) => a == b,
            (Data::Int(a), Data::Int(b)) => a == b,
            (Data::Float(a), Data::Float(b)) => a == b,
            (Data::String(a), Data::String(b)) => a == b,
            (Data::Array(a), Data::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl From<()> for Data {
    fn from(_: ()) -> Self {
        Data::Null
    }
}

impl From<bool> for Data {
    fn from(value: bool) -> Self {
        Data::Bool(value)
    }
}

impl From<i32> for Data {
    fn from(value: i32) -> Self {
        Data::Int(value as i64)
    }
}

impl From<i64> for Data {
    fn from(value: i64) -> Self {
        Data::Int(value)
    }
}

impl From<u32> for Data {
    fn from(value: u32) -> Self {
        Data::Int(value as i64)
    }
}

impl From<f64> for Data {
    fn from(value: f64) -> Self {
        Data::Float(value)
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::String(value.to_string())
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Data::String(value)
    }
}

impl From<DataArray> for Data {
    fn from(array: DataArray) -> Self {
        Data::Array(array)
    }
}

impl<T: Into<Data>> From<Vec<T>> for Data {
    fn from(values: Vec<T>) -> Self {
        Data::Array(values.into_iter().map(Into::<Data>::into).collect())
    }
}

impl<T: Into<Data>> From<Option<T>> for Data {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Data::Null)
    }
}

impl From<serde_json::Value> for Data {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Data::Null,
            Value::Bool(b) => Data::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Data::Int(i),
                None => Data::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Data::String(s),
            Value::Array(items) => Data::Array(items.into_iter().map(Data::from).collect()),
            Value::Object(map) => Data::Array(
                map.into_iter()
                    .map(|(key, value)| (Key::parse(&key), Data::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for DataArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_list() {
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for (_, value) in self.iter() {
                seq.serialize_element(value)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self.iter() {
                map.serialize_entry(&key.to_string(), value)?;
            }
            map.end()
        }
    }
}

impl Serialize for Data {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Data::Null => serializer.serialize_unit(),
            Data::Bool(value) => serializer.serialize_bool(*value),
            Data::Int(value) => serializer.serialize_i64(*value),
            Data::Float(value) if value.is_finite() => serializer.serialize_f64(*value),
            Data::Float(_) => Err(S::Error::custom("Inf and NaN cannot be JSON encoded")),
            Data::String(value) => serializer.serialize_str(value),
            Data::Array(array) => array.serialize(serializer),
            Data::Object(object) => {
                if let Some(entries) = object.entries() {
                    entries.serialize(serializer)
                } else if let Some(text) = object.to_text() {
                    serializer.serialize_str(&text)
                } else {
                    Err(S::Error::custom(format!(
                        "Type is not supported: {}",
                        object.type_name()
                    )))
                }
            }
        }
    }
}

/// Data held by a deferred response: a value, or a producer run on first use.
#[derive(Clone)]
pub enum RawData {
    Value(Data),
    Producer(Arc<dyn Fn() -> Data + Send + Sync>),
}

impl RawData {
    /// Defer computing the data until a consumer asks for it.
    pub fn producer<F>(producer: F) -> Self
    where
        F: Fn() -> Data + Send + Sync + 'static,
    {
        RawData::Producer(Arc::new(producer))
    }
}

impl Default for RawData {
    fn default() -> Self {
        RawData::Value(Data::Null)
    }
}

impl fmt::Debug for RawData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawData::Value(data) => f.debug_tuple("Value").field(data).finish(),
            RawData::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl<T: Into<Data>> From<T> for RawData {
    fn from(value: T) -> Self {
        RawData::Value(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Money(i64);

    impl DataObject for Money {
        fn to_text(&self) -> Option<String> {
            Some(format!("${}", self.0))
        }
    }

    #[test]
    fn test_key_parse() {
        assert_eq!(Key::parse("200"), Key::Index(200));
        assert_eq!(Key::parse("-3"), Key::Index(-3));
        assert_eq!(Key::parse("0"), Key::Index(0));
        assert_eq!(Key::parse("07"), Key::Name("07".into()));
        assert_eq!(Key::parse("-0"), Key::Name("-0".into()));
        assert_eq!(Key::parse("+7"), Key::Name("+7".into()));
        assert_eq!(Key::parse("foo"), Key::Name("foo".into()));
        assert_eq!(Key::parse(""), Key::Name(String::new()));
    }

    #[test]
    fn test_push_continues_after_largest_index() {
        let mut array = DataArray::new();
        array.insert(100, "a");
        array.push("b");
        array.insert("foo", "c");
        array.push("d");

        let keys: Vec<String> = array.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["100", "101", "foo", "102"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let array = DataArray::new()
            .with_entry("a", 1)
            .with_entry("b", 2)
            .with_entry("a", 3);

        assert_eq!(array.len(), 2);
        assert_eq!(array.iter().next().unwrap().1, &Data::Int(3));
    }

    #[test]
    fn test_is_list() {
        let list: DataArray = vec![Data::from(1), Data::from(2)].into_iter().collect();
        assert!(list.is_list());

        let keyed = DataArray::new().with_entry(1, "x");
        assert!(!keyed.is_list());
    }

    #[test]
    fn test_loose_emptiness() {
        assert!(Data::Null.is_empty());
        assert!(Data::from(false).is_empty());
        assert!(Data::from(0).is_empty());
        assert!(Data::from(0.0).is_empty());
        assert!(Data::from("").is_empty());
        assert!(Data::from("0").is_empty());
        assert!(Data::from(DataArray::new()).is_empty());

        assert!(!Data::from("00").is_empty());
        assert!(!Data::from(true).is_empty());
        assert!(!Data::object(Money(0)).is_empty());
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Data::from(true).to_text().as_deref(), Some("1"));
        assert_eq!(Data::from(false).to_text().as_deref(), Some(""));
        assert_eq!(Data::from(100.2).to_text().as_deref(), Some("100.2"));
        assert_eq!(Data::from(1.0).to_text().as_deref(), Some("1"));
        assert_eq!(Data::object(Money(5)).to_text().as_deref(), Some("$5"));
        assert_eq!(Data::from(vec![1, 2]).to_text(), None);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Data::Null.type_name(), "null");
        assert_eq!(Data::from(vec![1]).type_name(), "array");
        assert_eq!(Data::object(Money(1)).type_name(), "Money");
    }

    #[test]
    fn test_from_json_value() {
        let data = Data::from(serde_json::json!({"a": [1, 2.5, null], "10": true}));
        let array = data.as_array().unwrap();

        assert_eq!(array.get(&Key::Index(10)), Some(&Data::Bool(true)));
        let inner = array.get(&Key::Name("a".into())).unwrap().as_array().unwrap();
        assert!(inner.is_list());
    }

    #[test]
    fn test_serialize_list_and_map() {
        let list = Data::from(vec!["a", "b"]);
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["a","b"]"#);

        let map = Data::from(DataArray::new().with_entry("key", "value").with_entry(5, 1));
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"key":"value","5":1}"#);
    }

    #[test]
    fn test_serialize_rejects_non_finite() {
        assert!(serde_json::to_string(&Data::from(f64::NAN)).is_err());
        assert!(serde_json::to_string(&Data::from(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_serialize_object_text() {
        let data = Data::object(Money(3));
        assert_eq!(serde_json::to_string(&data).unwrap(), r#""$3""#);
    }

    #[test]
    fn test_objects_clone_independently() {
        let data = Data::object(Money(7));
        let copy = data.clone();
        assert_eq!(copy.to_text().as_deref(), Some("$7"));
        assert_ne!(data, copy);
    }
}
