//! Capture → normalize → encode → persist → enrich
//!
//! One [`Pipeline`] runs at most one cycle at a time. Enrichment runs on
//! spawned tasks outside that guard, limited by a semaphore, and reports
//! through both the returned [`EnrichmentHandle`] and a broadcast channel.

mod report;

pub use report::{CompletedStage, CycleReport, CycleStage, EnrichmentEvent, EnrichmentHandle};

use crate::config::{AppConfig, PipelineConfig};
use crate::error::{CycleError, CycleResult, StorageError};
use crate::insight::InsightClient;
use crate::probe::MetricProbe;
use crate::storage::{RecordStore, StorageResult};
use qnet_encoder::QuantumEncoder;
use qnet_types::{InsightText, NormalizationFactors, Record, RecordId, StoredRecord};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex, Semaphore};
use tokio::time::timeout;
use tracing::Instrument;
use uuid::Uuid;

const ENRICHMENT_CHANNEL_CAPACITY: usize = 64;

/// Where normalization factors come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FactorSource {
    /// Fixed for the whole run
    Static(NormalizationFactors),
    /// Requested from the completion service on every cycle
    Suggested,
}

impl FactorSource {
    pub fn from_config(config: &AppConfig) -> Self {
        match config.normalization_factors {
            Some(factors) => FactorSource::Static(factors),
            None => FactorSource::Suggested,
        }
    }
}

/// Deadlines and enrichment switches for a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub probe_timeout: Duration,
    pub storage_timeout: Duration,
    pub enrichment_enabled: bool,
    pub max_concurrent_enrichments: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            probe_timeout: config.probe_timeout(),
            storage_timeout: config.storage_timeout(),
            enrichment_enabled: config.enrichment_enabled,
            max_concurrent_enrichments: config.max_concurrent_enrichments.max(1),
        }
    }
}

/// Resets the published stage when a cycle ends, including on cancellation.
struct IdleOnDrop<'a>(&'a watch::Sender<CycleStage>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_replace(CycleStage::Idle);
    }
}

/// Pipeline orchestrator
pub struct Pipeline {
    probe: Arc<dyn MetricProbe>,
    store: Arc<dyn RecordStore>,
    insight: InsightClient,
    encoder: QuantumEncoder,
    factors: FactorSource,
    settings: PipelineSettings,
    cycle_slot: Mutex<()>,
    stage_tx: watch::Sender<CycleStage>,
    enrichment_tx: broadcast::Sender<EnrichmentEvent>,
    enrichment_slots: Arc<Semaphore>,
}

impl Pipeline {
    pub fn new(
        probe: Arc<dyn MetricProbe>,
        store: Arc<dyn RecordStore>,
        insight: InsightClient,
        factors: FactorSource,
        settings: PipelineSettings,
    ) -> Self {
        let (stage_tx, _) = watch::channel(CycleStage::Idle);
        let (enrichment_tx, _) = broadcast::channel(ENRICHMENT_CHANNEL_CAPACITY);
        let enrichment_slots = Arc::new(Semaphore::new(settings.max_concurrent_enrichments));

        Self {
            probe,
            store,
            insight,
            encoder: QuantumEncoder::new(),
            factors,
            settings,
            cycle_slot: Mutex::new(()),
            stage_tx,
            enrichment_tx,
            enrichment_slots,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Current stage of the in-flight cycle, `Idle` if none.
    pub fn stage(&self) -> CycleStage {
        *self.stage_tx.borrow()
    }

    pub fn subscribe_stage(&self) -> watch::Receiver<CycleStage> {
        self.stage_tx.subscribe()
    }

    pub fn subscribe_enrichments(&self) -> broadcast::Receiver<EnrichmentEvent> {
        self.enrichment_tx.subscribe()
    }

    /// Run one cycle, waiting for any in-flight cycle to finish first.
    pub async fn run_cycle(&self) -> CycleResult<CycleReport> {
        let _slot = self.cycle_slot.lock().await;
        self.execute().await
    }

    /// Run one cycle, or fail with [`CycleError::Busy`] if one is in flight.
    pub async fn try_run_cycle(&self) -> CycleResult<CycleReport> {
        let _slot = self.cycle_slot.try_lock().map_err(|_| CycleError::Busy)?;
        self.execute().await
    }

    async fn execute(&self) -> CycleResult<CycleReport> {
        let cycle_id = Uuid::new_v4();
        let _idle = IdleOnDrop(&self.stage_tx);
        self.cycle(cycle_id)
            .instrument(tracing::info_span!("cycle", %cycle_id))
            .await
    }

    async fn cycle(&self, cycle_id: Uuid) -> CycleResult<CycleReport> {
        self.enter(CycleStage::Capturing);
        let sample = match timeout(self.settings.probe_timeout, self.probe.capture()).await {
            Ok(Ok(sample)) => sample,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Capture failed");
                return Err(e.into());
            }
            Err(_) => return Err(self.timed_out(CycleStage::Capturing, self.settings.probe_timeout)),
        };

        self.enter(CycleStage::Normalizing);
        let factors = match self.factors {
            FactorSource::Static(factors) => factors,
            FactorSource::Suggested => self.insight.suggest_normalization_factors().await,
        };

        self.enter(CycleStage::Encoding);
        let distribution = self.encoder.encode(&sample, &factors).map_err(|e| {
            tracing::error!(error = %e, "Encoding rejected sample");
            CycleError::from(e)
        })?;
        let record = Record::new(sample, distribution);

        self.enter(CycleStage::Persisting);
        let (record_id, storage_error) =
            match timeout(self.settings.storage_timeout, self.store.insert(&record)).await {
                Ok(Ok(id)) => (Some(id), None),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Persisting failed, continuing unpersisted");
                    (None, Some(e))
                }
                Err(_) => {
                    return Err(
                        self.timed_out(CycleStage::Persisting, self.settings.storage_timeout)
                    )
                }
            };

        let enrichment = if self.settings.enrichment_enabled {
            self.enter(CycleStage::Enriching);
            Some(self.spawn_enrichment(cycle_id, record_id, record.clone()))
        } else {
            None
        };

        let (most_likely, probability) = record.distribution.most_likely();
        tracing::info!(
            record_id = ?record_id.map(|id| id.value()),
            most_likely,
            probability,
            "Cycle complete"
        );

        Ok(CycleReport {
            cycle_id,
            record,
            record_id,
            factors,
            storage_error,
            enrichment,
        })
    }

    fn enter(&self, stage: CycleStage) {
        tracing::debug!(%stage, "Entering stage");
        self.stage_tx.send_replace(stage);
    }

    fn timed_out(&self, stage: CycleStage, after: Duration) -> CycleError {
        tracing::error!(%stage, ?after, "Stage deadline exceeded");
        CycleError::Timeout { stage, after }
    }

    fn spawn_enrichment(
        &self,
        cycle_id: Uuid,
        record_id: Option<RecordId>,
        record: Record,
    ) -> EnrichmentHandle {
        let insight = self.insight.clone();
        let slots = self.enrichment_slots.clone();
        let events = self.enrichment_tx.clone();

        let task = tokio::spawn(
            async move {
                let _permit = slots.acquire_owned().await.ok();
                let text = insight.summarize(&record.sample, &record.distribution).await;
                tracing::info!(fallback = text.is_fallback(), insight = %text, "Enrichment ready");
                // No subscribers is fine.
                let _ = events.send(EnrichmentEvent {
                    cycle_id,
                    record_id,
                    insight: text.clone(),
                });
                text
            }
            .instrument(tracing::info_span!("enrichment", %cycle_id)),
        );

        EnrichmentHandle::new(cycle_id, record_id, task)
    }

    /// Commentary for each of the `limit` newest records, newest first.
    pub async fn review_recent(&self, limit: usize) -> CycleResult<Vec<(StoredRecord, InsightText)>> {
        let records = self.read(self.store.recent(limit)).await?;
        tracing::info!(count = records.len(), "Reviewing recent records");

        let reviews = records.iter().map(|stored| async move {
            let _permit = self.enrichment_slots.acquire().await.ok();
            self.insight
                .summarize(stored.sample(), stored.distribution())
                .await
        });
        let texts = futures::future::join_all(reviews).await;

        Ok(records.into_iter().zip(texts).collect())
    }

    /// Commentary on every stored record.
    pub async fn summarize_history(&self) -> CycleResult<InsightText> {
        let records = self.read(self.store.all()).await?;
        tracing::info!(count = records.len(), "Summarizing history");
        Ok(self.insight.summarize_history(&records).await)
    }

    async fn read<T>(&self, query: impl Future<Output = StorageResult<T>>) -> CycleResult<T> {
        match timeout(self.settings.storage_timeout, query).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StorageError::Connection(format!(
                "read timed out after {:?}",
                self.settings.storage_timeout
            ))
            .into()),
        }
    }
}
