//! QNet core types
//!
//! Shared data model for the network-quality encoder:
//! - [`MetricSample`]: one captured throughput/latency/jitter reading
//! - [`NormalizationFactors`]: per-metric divisors turning raw units into angles
//! - [`Distribution`]: the 16-state probability distribution derived from a sample
//! - [`Record`] / [`StoredRecord`]: what the record store appends and returns
//! - [`InsightText`]: best-effort commentary from the completion service

pub mod distribution;
pub mod ids;
pub mod insight;
pub mod metrics;
pub mod record;

pub use distribution::{Distribution, DistributionError, BASIS_STATES, QUBITS};
pub use ids::RecordId;
pub use insight::InsightText;
pub use metrics::{FactorError, Metric, MetricSample, NormalizationFactors, DEFAULT_FACTOR};
pub use record::{Record, StoredRecord};
