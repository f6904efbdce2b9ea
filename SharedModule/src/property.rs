//! # Shared Property System
//!
//! The closed set of values that can travel over the wire, and the ordered
//! property maps that carry them inside operations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{WireError, WireResult};
use crate::object::ObjectId;

/// Represents the value of a property
///
/// Serialized untagged: numbers, booleans, strings, null, arrays and objects.
/// References encode as their id string, so a decoded reference arrives as
/// [`PropertyValue::String`]; use [`PropertyValue::as_object_id`] to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    List(Vec<PropertyValue>),
    Map(Properties),
    /// Reference to another remote object
    Reference(ObjectId),
}

impl PropertyValue {
    /// Convert any serializable value into the wire type set
    ///
    /// Fails for values that have no wire representation, such as unsigned
    /// integers beyond the signed 64-bit range or non-finite floats.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> WireResult<Self> {
        let json = serde_json::to_value(value)?;
        Self::try_from(json)
    }

    /// Check that this value (recursively) can be encoded
    pub fn validate(&self) -> WireResult<()> {
        match self {
            Self::Double(d) if !d.is_finite() => Err(WireError::UnsupportedValue(format!(
                "non-finite double {}",
                d
            ))),
            Self::Reference(id) if !id.is_valid() => Err(WireError::UnsupportedValue(
                "reference to an empty object id".to_string(),
            )),
            Self::List(items) => items.iter().try_for_each(PropertyValue::validate),
            Self::Map(map) => map.iter().try_for_each(|(_, value)| value.validate()),
            _ => Ok(()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Reference(id) => Some(id.as_str()),
            _ => None,
        }
    }

    /// Read a reference, accepting the decoded string form
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Self::Reference(id) => Some(id.clone()),
            Self::String(s) if !s.is_empty() => Some(ObjectId::new(s.as_str())),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Properties> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl TryFrom<Value> for PropertyValue {
    type Error = WireError;

    fn try_from(value: Value) -> WireResult<Self> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if n.is_u64() {
                    Err(WireError::UnsupportedValue(format!(
                        "integer {} exceeds the signed 64-bit range",
                        n
                    )))
                } else {
                    match n.as_f64() {
                        Some(d) if d.is_finite() => Ok(Self::Double(d)),
                        _ => Err(WireError::UnsupportedValue(format!("number {}", n))),
                    }
                }
            }
            Value::String(s) => Ok(Self::String(s)),
            Value::Array(items) => items
                .into_iter()
                .map(PropertyValue::try_from)
                .collect::<WireResult<Vec<_>>>()
                .map(Self::List),
            Value::Object(map) => {
                let properties = map
                    .into_iter()
                    .map(|(name, value)| Ok((name, PropertyValue::try_from(value)?)))
                    .collect::<WireResult<IndexMap<String, PropertyValue>>>()?;
                Ok(Self::Map(Properties(properties)))
            }
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<ObjectId> for PropertyValue {
    fn from(value: ObjectId) -> Self {
        Self::Reference(value)
    }
}

impl From<&ObjectId> for PropertyValue {
    fn from(value: &ObjectId) -> Self {
        Self::Reference(value.clone())
    }
}

impl From<Properties> for PropertyValue {
    fn from(value: Properties) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Insertion-ordered property map
///
/// Inserting an existing name replaces the value in place, so the first
/// insertion fixes a property's position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(IndexMap<String, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a property, returning the previous value
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Remove a property, keeping the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.0.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Property names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    /// Validate every value in the map
    pub fn validate(&self) -> WireResult<()> {
        for (name, value) in &self.0 {
            if name.is_empty() {
                return Err(WireError::EmptyName("property"));
            }
            value.validate()?;
        }
        Ok(())
    }
}

impl<N: Into<String>, V: Into<PropertyValue>> FromIterator<(N, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Properties {
    type Item = (String, PropertyValue);
    type IntoIter = indexmap::map::IntoIter<String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
