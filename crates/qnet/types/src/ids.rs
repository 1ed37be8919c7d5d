//! Store-assigned record identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential key assigned by the record store on insert.
///
/// Ids are unique and strictly increasing in insertion order; they are never
/// reused, even if rows are later removed administratively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record:{}", self.0)
    }
}
