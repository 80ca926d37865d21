//! Base implementation of records.
use crate::error::GymError;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{Iter, Keys},
    HashMap,
};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value.
    Scalar(f32),

    /// A timestamp with local timezone.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array of floating-point values, e.g. an observation.
    Array1(Vec<f32>),

    /// A text value.
    String(String),
}

/// A container of key-value pairs.
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records, consuming both.
    ///
    /// Values of `record` win on duplicated keys.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, GymError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(GymError::RecordValueTypeError("Scalar".to_string())),
            None => Err(GymError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array from the record.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, GymError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(GymError::RecordValueTypeError("Array1".to_string())),
            None => Err(GymError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns `true` if the record contains no key-value pairs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of key-value pairs.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_scalar_errors() {
        let mut record = Record::from_scalar("reward", -10.0);
        record.insert("model", RecordValue::String("F16".to_string()));

        assert_eq!(record.get_scalar("reward").unwrap(), -10.0);
        assert!(matches!(
            record.get_scalar("model"),
            Err(GymError::RecordValueTypeError(_))
        ));
        assert!(matches!(
            record.get_scalar("altitude_m"),
            Err(GymError::RecordKeyError(_))
        ));
    }

    #[test]
    fn test_merge_overwrites_duplicated_keys() {
        let a = Record::from_slice(&[
            ("reward", RecordValue::Scalar(0.0)),
            ("step", RecordValue::Scalar(3.0)),
        ]);
        let b = Record::from_scalar("reward", 1.0);

        let merged = a.merge(b);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get_scalar("reward").unwrap(), 1.0);
        assert_eq!(merged.get_scalar("step").unwrap(), 3.0);
    }
}
