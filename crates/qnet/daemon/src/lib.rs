//! QNet daemon
//!
//! Captures network measurements, encodes each into a 4-qubit probability
//! distribution, stores the result in SQLite and asks a text-completion
//! service for commentary.
//!
//! - [`pipeline::Pipeline`]: one capture → encode → persist → enrich cycle at a time
//! - [`storage::RecordStore`]: append-only record persistence
//! - [`insight::InsightClient`]: normalization-factor suggestions and commentary
//! - [`probe::MetricProbe`]: measurement sources
//! - [`scheduler::run_periodic`]: the `watch` loop

pub mod config;
pub mod error;
pub mod insight;
pub mod pipeline;
pub mod probe;
pub mod scheduler;
pub mod storage;

pub use config::AppConfig;
pub use error::{CycleError, CycleResult, DaemonError, DaemonResult};
pub use pipeline::{CycleReport, CycleStage, FactorSource, Pipeline, PipelineSettings};
