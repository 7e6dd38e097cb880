use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Read access to a record of named numeric fields.
///
/// Field order is part of a record's identity: implementations must yield
/// fields in a stable declared order so canonical serialization and cache
/// keys are reproducible across runs. A `NaN` value means the quantity is
/// undefined for this record; it is never an error by itself.
pub trait Record {
    /// Returns all fields in declared order.
    fn fields(&self) -> Vec<(&str, f64)>;

    /// Returns the value of a field, or `None` if the key is not declared.
    fn get(&self, key: &str) -> Option<f64>;
}

impl<T: Record + ?Sized> Record for &T {
    fn fields(&self) -> Vec<(&str, f64)> {
        (**self).fields()
    }

    fn get(&self, key: &str) -> Option<f64> {
        (**self).get(key)
    }
}

/// A record whose declared fields can be overridden by name.
///
/// Solvers and explorers derive candidate inputs by cloning a base record
/// and setting iteration-variable or scan-axis fields. Adjusting never adds
/// fields, so the declared key set and its order are preserved.
pub trait AdjustRecord: Record + Clone {
    /// Sets a declared field to a new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not declared on this record.
    fn set(&mut self, key: &str, value: f64) -> Result<(), UnknownField>;
}

/// Error returned when adjusting a field that a record does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record has no field named {key:?}")]
pub struct UnknownField {
    pub key: String,
}

/// Errors that can occur when constructing a [`FieldSet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldSetError {
    #[error("field keys must be non-empty")]
    EmptyKey,

    #[error("duplicate field key {key:?}")]
    DuplicateKey { key: String },
}

/// A validated, ordered set of named numeric fields.
///
/// Keys are unique and non-empty; iteration order is insertion order.
/// `FieldSet` is the general-purpose record for callers that assemble
/// inputs dynamically (e.g. from a configuration file). Code with a fixed
/// schema can instead implement [`Record`] and [`AdjustRecord`] on its own
/// typed struct.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSet {
    fields: Vec<(String, f64)>,
}

impl FieldSet {
    /// Creates an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a field set from `(key, value)` pairs, preserving order.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is empty or appears more than once.
    pub fn from_pairs<K, I>(pairs: I) -> Result<Self, FieldSetError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        let mut set = Self::new();
        for (key, value) in pairs {
            set.insert(key, value)?;
        }
        Ok(set)
    }

    /// Appends a new field, keeping insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or already present.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) -> Result<(), FieldSetError> {
        let key = key.into();
        if key.is_empty() {
            return Err(FieldSetError::EmptyKey);
        }
        if self.fields.iter().any(|(k, _)| *k == key) {
            return Err(FieldSetError::DuplicateKey { key });
        }
        self.fields.push((key, value));
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or already present.
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Result<Self, FieldSetError> {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the set declares no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Record for FieldSet {
    fn fields(&self) -> Vec<(&str, f64)> {
        self.iter().collect()
    }

    fn get(&self, key: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }
}

impl AdjustRecord for FieldSet {
    fn set(&mut self, key: &str, value: f64) -> Result<(), UnknownField> {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => {
                *v = value;
                Ok(())
            }
            None => Err(UnknownField {
                key: key.to_string(),
            }),
        }
    }
}
