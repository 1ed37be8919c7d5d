//! Cycle stages, reports and enrichment handles

use crate::error::StorageError;
use qnet_types::{Distribution, InsightText, NormalizationFactors, Record, RecordId};
use std::fmt;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Where a cycle currently is.
///
/// `Idle → Capturing → Normalizing → Encoding → Persisting → (Enriching) → Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleStage {
    Idle,
    Capturing,
    Normalizing,
    Encoding,
    Persisting,
    Enriching,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleStage::Idle => "idle",
            CycleStage::Capturing => "capturing",
            CycleStage::Normalizing => "normalizing",
            CycleStage::Encoding => "encoding",
            CycleStage::Persisting => "persisting",
            CycleStage::Enriching => "enriching",
        };
        f.write_str(name)
    }
}

/// Last stage a successful cycle got through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletedStage {
    /// Distribution computed but the insert failed
    Encoded,
    /// Record stored
    Persisted,
}

/// Published once per finished enrichment.
#[derive(Debug, Clone)]
pub struct EnrichmentEvent {
    pub cycle_id: Uuid,
    /// `None` when the record could not be stored
    pub record_id: Option<RecordId>,
    pub insight: InsightText,
}

/// Pending commentary for one cycle's record.
#[derive(Debug)]
pub struct EnrichmentHandle {
    cycle_id: Uuid,
    record_id: Option<RecordId>,
    task: JoinHandle<InsightText>,
}

impl EnrichmentHandle {
    pub(crate) fn new(
        cycle_id: Uuid,
        record_id: Option<RecordId>,
        task: JoinHandle<InsightText>,
    ) -> Self {
        Self {
            cycle_id,
            record_id,
            task,
        }
    }

    pub fn cycle_id(&self) -> Uuid {
        self.cycle_id
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the commentary. A panicked or cancelled task yields the
    /// fallback text.
    pub async fn wait(self) -> InsightText {
        match self.task.await {
            Ok(insight) => insight,
            Err(e) => {
                tracing::warn!(cycle_id = %self.cycle_id, error = %e, "Enrichment task did not complete");
                InsightText::fallback()
            }
        }
    }
}

/// Outcome of a cycle that produced a distribution.
#[derive(Debug)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub record: Record,
    /// Assigned id, `None` when persisting failed
    pub record_id: Option<RecordId>,
    /// Factors the sample was normalized with
    pub factors: NormalizationFactors,
    /// Insert failure; the cycle continued unpersisted
    pub storage_error: Option<StorageError>,
    /// Commentary in flight, when enrichment is enabled
    pub enrichment: Option<EnrichmentHandle>,
}

impl CycleReport {
    pub fn completed_stage(&self) -> CompletedStage {
        if self.record_id.is_some() {
            CompletedStage::Persisted
        } else {
            CompletedStage::Encoded
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.completed_stage() == CompletedStage::Persisted
    }

    pub fn distribution(&self) -> &Distribution {
        &self.record.distribution
    }

    pub fn take_enrichment(&mut self) -> Option<EnrichmentHandle> {
        self.enrichment.take()
    }
}
