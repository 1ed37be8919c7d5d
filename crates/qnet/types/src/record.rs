//! Records appended to the record store

use crate::distribution::Distribution;
use crate::ids::RecordId;
use crate::metrics::MetricSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sample together with the distribution derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub sample: MetricSample,
    pub distribution: Distribution,
}

impl Record {
    pub fn new(sample: MetricSample, distribution: Distribution) -> Self {
        Self {
            sample,
            distribution,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.sample.timestamp
    }
}

/// A record as returned by the store, with its assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: Record,
}

impl StoredRecord {
    pub fn new(id: RecordId, record: Record) -> Self {
        Self { id, record }
    }

    pub fn sample(&self) -> &MetricSample {
        &self.record.sample
    }

    pub fn distribution(&self) -> &Distribution {
        &self.record.distribution
    }
}
