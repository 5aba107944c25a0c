//! Data for a single render, and how JSON data turns into bindings.

use std::fmt::Display;

use anyhow::{Result, bail};
use kstring::KString;
use serde_json::{Map, Value};

use crate::scope::{Binding, BindingValue, Frame};

/// Values by name, put in front of the presenter's own bindings
/// for one render. Keys are whatever the caller used, turned into
/// strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: Vec<(KString, Value)>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the value of an existing key.
    pub fn insert(&mut self, key: impl Display, value: impl Into<Value>) -> &mut Self {
        let key = KString::from_string(key.to_string());
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
        self
    }

    /// `value` has to be an object.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            Value::Null => Ok(Context::new()),
            other => bail!("context must be a JSON object, got {}", json_type_name(&other)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Display, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut c = Context::new();
        for (k, v) in iter {
            c.insert(k, v);
        }
        c
    }
}

impl Frame for Context {
    fn has_binding(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn resolve(&self, name: &str) -> Result<Binding> {
        match self.get(name) {
            Some(v) => Ok(Binding::Value(binding_value_from_json(v))),
            None => bail!("no context value {name:?}"),
        }
    }
}


fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Text for scalars; `None` for null, arrays and objects.
fn json_scalar_text(v: &Value) -> Option<KString> {
    match v {
        Value::String(s) => Some(KString::from_ref(s)),
        Value::Number(n) => Some(KString::from_string(n.to_string())),
        Value::Bool(b) => Some(KString::from_static(if *b { "true" } else { "false" })),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Strings and numbers become text, `true` too (as "true"); `false`
/// and `null` remove the element. An array repeats the element per
/// item; an object is a list of one, with its keys in scope.
pub fn binding_value_from_json(v: &Value) -> BindingValue {
    match v {
        Value::String(_) | Value::Number(_) | Value::Bool(true) =>
            BindingValue::Text(json_scalar_text(v).unwrap_or_else(|| KString::from_static(""))),
        Value::Bool(false) | Value::Null => BindingValue::Removed,
        Value::Array(items) =>
            BindingValue::list(items.iter().map(JsonItem::from_json)),
        Value::Object(map) =>
            BindingValue::list([JsonItem::Object(map.clone())]),
    }
}

impl From<Value> for BindingValue {
    fn from(v: Value) -> Self {
        binding_value_from_json(&v)
    }
}

impl From<&Value> for BindingValue {
    fn from(v: &Value) -> Self {
        binding_value_from_json(v)
    }
}


/// One item of a list that came from JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonItem {
    /// Sets the text of its copy of the element.
    Scalar(KString),
    /// Its keys are bindings.
    Object(Map<String, Value>),
    /// null or a nested array: the copy stays as it is.
    Opaque,
}

impl JsonItem {
    pub fn from_json(v: &Value) -> JsonItem {
        match v {
            Value::Object(map) => JsonItem::Object(map.clone()),
            _ => match json_scalar_text(v) {
                Some(s) => JsonItem::Scalar(s),
                None => JsonItem::Opaque,
            }
        }
    }
}

impl Frame for JsonItem {
    fn has_binding(&self, name: &str) -> bool {
        match self {
            JsonItem::Object(map) => map.contains_key(name),
            JsonItem::Scalar(_) | JsonItem::Opaque => false,
        }
    }

    fn resolve(&self, name: &str) -> Result<Binding> {
        match self {
            JsonItem::Object(map) => match map.get(name) {
                Some(v) => Ok(Binding::Value(binding_value_from_json(v))),
                None => bail!("no key {name:?} in list item"),
            },
            JsonItem::Scalar(_) | JsonItem::Opaque =>
                bail!("list item is not an object, has no key {name:?}"),
        }
    }

    fn content(&self) -> Option<KString> {
        match self {
            JsonItem::Scalar(s) => Some(s.clone()),
            JsonItem::Object(_) | JsonItem::Opaque => None,
        }
    }
}
