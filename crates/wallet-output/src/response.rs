//! Structured values recovered from tool output.

use serde::Serialize;
use serde_json::{Map, Value};

/// A single parsed mapping. Values are numbers, strings, nested records or
/// ordered lists of records.
pub type Record = Map<String, Value>;

/// The single-or-many result shape shared by every grammar and invocation path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// Exactly one record was recovered.
    One(Record),
    /// Zero or several records were recovered, in output order.
    Many(Vec<Record>),
}

impl Response {
    /// Applies the single-or-many convention: one record stays bare, any
    /// other count becomes a list.
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        match <[Record; 1]>::try_from(records) {
            Ok([record]) => Self::One(record),
            Err(records_in_order) => Self::Many(records_in_order),
        }
    }

    /// All records in output order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        match self {
            Self::One(record) => std::slice::from_ref(record),
            Self::Many(records) => records.as_slice(),
        }
    }

    /// Returns the record when exactly one was recovered.
    #[must_use]
    pub const fn as_one(&self) -> Option<&Record> {
        match self {
            Self::One(record) => Some(record),
            Self::Many(_) => None,
        }
    }

    /// Consumes the response, returning the record when exactly one was recovered.
    #[must_use]
    pub fn into_one(self) -> Option<Record> {
        match self {
            Self::One(record) => Some(record),
            Self::Many(_) => None,
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records().len()
    }

    /// Whether no records were recovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Converts the response into a JSON value: an object or an array of objects.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::One(record) => Value::Object(record),
            Self::Many(records) => Value::Array(records.into_iter().map(Value::Object).collect()),
        }
    }
}
