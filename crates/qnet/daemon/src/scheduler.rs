//! Periodic measurement loop

use crate::error::CycleError;
use crate::pipeline::Pipeline;
use std::future::Future;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Counts from one `run_periodic` session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub completed: u64,
    pub failed: u64,
    /// Ticks that found another cycle in flight
    pub skipped: u64,
}

/// Run a cycle every `every` until `shutdown` resolves, including while a
/// cycle is in flight.
///
/// The first cycle starts immediately. A failed cycle is logged and the loop
/// keeps going. A tick that finds a cycle already in flight (started through
/// another handle to the same pipeline) is skipped, never queued.
pub async fn run_periodic(
    pipeline: Arc<Pipeline>,
    every: Duration,
    shutdown: impl Future<Output = ()>,
) -> WatchSummary {
    let mut ticks = interval(every);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut summary = WatchSummary::default();
    tracing::info!(?every, "Watch loop started");

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticks.tick() => {
                // Dropping the cycle cancels it: the probe child is killed and
                // the stage returns to idle.
                let outcome = tokio::select! {
                    _ = &mut shutdown => {
                        tracing::warn!("Shutdown during a cycle, abandoning it");
                        break;
                    }
                    outcome = pipeline.try_run_cycle() => outcome,
                };
                match outcome {
                    Ok(report) => {
                        summary.completed += 1;
                        if let Some(e) = &report.storage_error {
                            tracing::warn!(cycle_id = %report.cycle_id, error = %e, "Cycle finished unpersisted");
                        }
                    }
                    Err(CycleError::Busy) => {
                        summary.skipped += 1;
                        tracing::debug!("Cycle in flight, skipping tick");
                    }
                    Err(e) => {
                        summary.failed += 1;
                        tracing::error!(stage = %e.stage(), error = %e, "Cycle failed");
                    }
                }
            }
        }
    }

    tracing::info!(
        completed = summary.completed,
        failed = summary.failed,
        skipped = summary.skipped,
        "Watch loop stopped"
    );
    summary
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down");
        }
    }
}
