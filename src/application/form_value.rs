//! Untrusted submission tree
//!
//! Objects are shared, interior-mutable handles so a tree decoded by an
//! external collaborator may alias or even contain itself; traversals track
//! object identity to stay total on such input.

use parking_lot::RwLock;
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::application::ports::FileSource;

/// Reference to an uploaded file; cloning shares the same handle
#[derive(Clone)]
pub struct FileRef(Arc<dyn FileSource>);

impl FileRef {
    pub fn new(source: Arc<dyn FileSource>) -> Self {
        Self(source)
    }

    pub fn source(&self) -> &Arc<dyn FileSource> {
        &self.0
    }

    pub fn ptr_eq(&self, other: &FileRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRef")
            .field("name", &self.0.name())
            .field("type", &self.0.mime_type())
            .field("size", &self.0.size())
            .finish()
    }
}

impl<S: FileSource + 'static> From<Arc<S>> for FileRef {
    fn from(source: Arc<S>) -> Self {
        Self(source)
    }
}

/// Shared map node of a form tree
#[derive(Clone, Default)]
pub struct FormObject(Arc<RwLock<BTreeMap<String, FormValue>>>);

impl FormObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<FormValue>) -> Option<FormValue> {
        self.0.write().insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<FormValue> {
        self.0.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }

    /// Snapshot of the entries; the lock is released before the caller recurses
    pub fn entries(&self) -> Vec<(String, FormValue)> {
        self.0
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Identity of the underlying node, stable for its lifetime
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &FormObject) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for FormObject {
    // Keys only: printing values would recurse forever on a cyclic tree
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormObject")
            .field("keys", &self.keys())
            .finish()
    }
}

impl<K: Into<String>, V: Into<FormValue>> FromIterator<(K, V)> for FormObject {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let object = FormObject::new();
        for (k, v) in iter {
            object.insert(k, v);
        }
        object
    }
}

/// One node of an untrusted submission
#[derive(Clone, Debug, Default)]
pub enum FormValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    File(FileRef),
    Array(Vec<FormValue>),
    Object(FormObject),
}

impl FormValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FormValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            FormValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileRef> {
        match self {
            FormValue::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FormValue]> {
        match self {
            FormValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&FormObject> {
        match self {
            FormValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Short type name used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            FormValue::Null => "null",
            FormValue::Bool(_) => "boolean",
            FormValue::Number(_) => "number",
            FormValue::String(_) => "string",
            FormValue::File(_) => "file",
            FormValue::Array(_) => "array",
            FormValue::Object(_) => "object",
        }
    }

    /// Render as JSON. Files become `{name, type, size}` descriptors and an
    /// object that contains itself is rendered as `"[Circular]"`.
    pub fn to_json(&self) -> Value {
        let mut ancestors = HashSet::new();
        self.to_json_inner(&mut ancestors)
    }

    fn to_json_inner(&self, ancestors: &mut HashSet<usize>) -> Value {
        match self {
            FormValue::Null => Value::Null,
            FormValue::Bool(b) => Value::Bool(*b),
            FormValue::Number(n) => Value::Number(n.clone()),
            FormValue::String(s) => Value::String(s.clone()),
            FormValue::File(file) => {
                let source = file.source();
                serde_json::json!({
                    "name": source.name(),
                    "type": source.mime_type(),
                    "size": source.size(),
                })
            }
            FormValue::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item.to_json_inner(ancestors))
                    .collect(),
            ),
            FormValue::Object(object) => {
                if !ancestors.insert(object.id()) {
                    return Value::String("[Circular]".to_string());
                }
                let map: Map<String, Value> = object
                    .entries()
                    .into_iter()
                    .map(|(k, v)| {
                        let rendered = v.to_json_inner(ancestors);
                        (k, rendered)
                    })
                    .collect();
                ancestors.remove(&object.id());
                Value::Object(map)
            }
        }
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::String(s.to_string())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::String(s)
    }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        FormValue::Bool(b)
    }
}

impl From<i64> for FormValue {
    fn from(n: i64) -> Self {
        FormValue::Number(n.into())
    }
}

impl From<f64> for FormValue {
    /// Non-finite numbers have no JSON form and become `Null`
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(FormValue::Null, FormValue::Number)
    }
}

impl From<FileRef> for FormValue {
    fn from(f: FileRef) -> Self {
        FormValue::File(f)
    }
}

impl From<FormObject> for FormValue {
    fn from(o: FormObject) -> Self {
        FormValue::Object(o)
    }
}

impl From<Vec<FormValue>> for FormValue {
    fn from(items: Vec<FormValue>) -> Self {
        FormValue::Array(items)
    }
}

impl<T: Into<FormValue>> From<Option<T>> for FormValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FormValue::Null, Into::into)
    }
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FormValue::Null,
            Value::Bool(b) => FormValue::Bool(b),
            Value::Number(n) => FormValue::Number(n),
            Value::String(s) => FormValue::String(s),
            Value::Array(items) => FormValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => FormValue::Object(map.into_iter().collect()),
        }
    }
}
