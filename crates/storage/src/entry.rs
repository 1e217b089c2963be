//! The structured intermediate representation between typed models and raw
//! bytes.

use std::collections::BTreeMap;

/// One primitive field value inside an [`Entry`].
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

/// An ordered mapping from field name to primitive value.
///
/// Models convert themselves to and from entries
/// ([`ToEntry`](crate::ToEntry) / [`FromEntry`](crate::FromEntry)); the
/// serializer stage turns entries into bytes. Field order is the name
/// order, so equal entries always serialize identically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    fields: BTreeMap<String, Field>,
}

impl Entry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any previous value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: Field) -> &mut Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Builder-style [`set`](Entry::set).
    pub fn with(mut self, name: impl Into<String>, value: Field) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.fields.get(name) {
            Some(Field::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.fields.get(name) {
            Some(Field::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.fields.get(name) {
            Some(Field::Float(f)) => Some(*f),
            _ => None,
        }
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(Field::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        match self.fields.get(name) {
            Some(Field::Bytes(b)) => Some(b),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }
}
