//! Dynamic document values.

use crate::object_id::ObjectId;

/// Name of the reserved identifier field.
pub const ID_FIELD: &str = "_id";

/// A dynamically typed field value.
///
/// This is the closed set of values a document may hold. Every variant maps
/// to exactly one element type of the wire format, so decoding and
/// re-encoding a document is lossless.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit IEEE 754 floating point number.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Embedded document.
    Document(Document),
    /// List of values.
    Array(Vec<Value>),
    /// Binary data with its subtype byte.
    Binary {
        /// Binary subtype (0 for generic data).
        subtype: u8,
        /// Raw bytes.
        bytes: Vec<u8>,
    },
    /// Reference to another document.
    ObjectId(ObjectId),
    /// Boolean value.
    Boolean(bool),
    /// UTC datetime in milliseconds since the Unix epoch.
    DateTime(i64),
    /// Null value.
    Null,
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as an integer, widening 32-bit values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(n) => Some(i64::from(*n)),
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a float, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an object id, if it is one.
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Value::ObjectId(id) => Some(*id),
            _ => None,
        }
    }

    /// Get this value as an embedded document, if it is one.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Human-readable name of the value's type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Document(_) => "document",
            Value::Array(_) => "array",
            Value::Binary { .. } => "binary",
            Value::ObjectId(_) => "objectId",
            Value::Boolean(_) => "bool",
            Value::DateTime(_) => "date",
            Value::Null => "null",
            Value::Int32(_) => "int",
            Value::Int64(_) => "long",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Binary { subtype: 0, bytes }
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::ObjectId(id)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

/// An ordered mapping from field name to value.
///
/// Field order is preserved through encoding. Keys are unique: setting an
/// existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any previous value under the same key.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((key, value));
                None
            }
        }
    }

    /// Builder form of [`Document::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Looks up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(pos).1)
    }

    /// Returns true if the document has a field with this key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the identifier stored in `_id`, if it holds an object id.
    pub fn id(&self) -> Option<ObjectId> {
        self.get(ID_FIELD).and_then(Value::as_object_id)
    }

    /// Stores `id` in the `_id` field.
    pub fn set_id(&mut self, id: ObjectId) {
        self.insert(ID_FIELD, id);
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over field values in order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, v)| v)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_preserves_order() {
        let doc = Document::new()
            .with("z", 1)
            .with("a", 2)
            .with("m", 3);

        let keys: Vec<_> = doc.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut doc = Document::new().with("a", 1).with("b", 2);
        let previous = doc.insert("a", "one");

        assert_eq!(previous, Some(Value::Int32(1)));
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.iter().next(), Some(("a", &Value::from("one"))));
    }

    #[test]
    fn id_accessors() {
        let mut doc = Document::new().with("name", "Alice");
        assert_eq!(doc.id(), None);

        let id = ObjectId::new();
        doc.set_id(id);
        assert_eq!(doc.id(), Some(id));
        assert!(doc.contains_key(ID_FIELD));
    }

    #[test]
    fn non_object_id_is_not_an_id() {
        let doc = Document::new().with(ID_FIELD, "4f1a2b3c4d5e6f7a8b9c0d1e");
        assert_eq!(doc.id(), None);
    }

    #[test]
    fn remove_field() {
        let mut doc = Document::new().with("a", 1).with("b", 2);
        assert_eq!(doc.remove("a"), Some(Value::Int32(1)));
        assert_eq!(doc.remove("a"), None);
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn value_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Int32(7).as_i64(), Some(7));
        assert_eq!(Value::Int64(7).as_i64(), Some(7));
        assert_eq!(Value::Double(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::from("hi").as_i64(), None);
        assert_eq!(Value::Int32(1).type_name(), "int");
    }

    #[test]
    fn collect_into_document() {
        let doc: Document = vec![("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(doc.get("b"), Some(&Value::Int32(2)));
    }
}
