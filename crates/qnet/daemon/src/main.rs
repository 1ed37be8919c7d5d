//! qnetd - network measurements as 4-qubit probability distributions
//!
//! Subcommands:
//! - `init-db`: create the database and table
//! - `run`: one cycle using the configured probe command
//! - `measure`: one cycle from metrics given on the command line
//! - `watch`: periodic cycles until Ctrl+C
//! - `recent`: list (and optionally re-analyze) the newest records
//! - `history`: commentary on every stored record

use clap::{Parser, Subcommand};
use qnet_daemon::config::AppConfig;
use qnet_daemon::error::{ConfigError, CycleError, DaemonResult};
use qnet_daemon::insight::InsightClient;
use qnet_daemon::pipeline::{CycleReport, FactorSource, Pipeline, PipelineSettings};
use qnet_daemon::probe::{CommandProbe, MetricProbe, StaticProbe};
use qnet_daemon::scheduler::{run_periodic, shutdown_signal};
use qnet_daemon::storage::{RecordStore, SqliteRecordStore, TABLE_NAME};
use qnet_encoder::QuantumEncoder;
use qnet_types::{Distribution, MetricSample, StoredRecord};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// QNet daemon CLI
#[derive(Parser)]
#[command(name = "qnetd")]
#[command(about = "Encode network measurements as 4-qubit probability distributions", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "QNET_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, overrides `logging.level`
    #[arg(long, env = "QNET_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "QNET_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database file and records table
    InitDb,

    /// Run one cycle with the configured probe
    Run,

    /// Run one cycle with the given measurement
    Measure {
        /// Download speed in Mbps
        #[arg(long)]
        download: f64,

        /// Upload speed in Mbps
        #[arg(long)]
        upload: f64,

        /// Ping in ms
        #[arg(long)]
        ping: f64,

        /// Jitter in ms
        #[arg(long)]
        jitter: f64,
    },

    /// Run cycles periodically until interrupted
    Watch {
        /// Seconds between cycles, overrides `pipeline.interval_secs`
        #[arg(long)]
        interval_secs: Option<u64>,
    },

    /// List the newest records
    Recent {
        /// Number of records, defaults to `pipeline.review_limit`
        #[arg(short, long)]
        limit: Option<usize>,

        /// Request commentary for each listed record
        #[arg(long)]
        analyze: bool,
    },

    /// Commentary on the whole stored history
    History,
}

// One cycle at a time, so the runtime needs only the current thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    init_tracing(&cli, &config);

    tracing::info!(
        device = %config.quantum_device,
        wires = config.quantum_wires,
        database = %config.database_path.display(),
        "Configuration loaded"
    );

    let store = Arc::new(
        SqliteRecordStore::connect(&config.database_path, config.pipeline.storage_timeout())
            .await?,
    );

    let result = dispatch(cli.command, &config, store.clone()).await;
    store.close().await;
    result
}

fn init_tracing(cli: &Cli, config: &AppConfig) {
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into());

    if cli.json || config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn dispatch(
    command: Command,
    config: &AppConfig,
    store: Arc<SqliteRecordStore>,
) -> DaemonResult<()> {
    match command {
        Command::InitDb => {
            println!(
                "Table {} ready in {} ({} records)",
                TABLE_NAME,
                config.database_path.display(),
                store.count().await?
            );
            Ok(())
        }
        Command::Run => {
            let probe = configured_probe(config)?;
            let pipeline = build_pipeline(config, probe, store)?;
            let report = pipeline.run_cycle().await?;
            print_report(config, report).await;
            Ok(())
        }
        Command::Measure {
            download,
            upload,
            ping,
            jitter,
        } => {
            let probe = Arc::new(StaticProbe::new(MetricSample::now(
                download, upload, ping, jitter,
            )));
            let pipeline = build_pipeline(config, probe, store)?;
            let report = pipeline.run_cycle().await?;
            print_report(config, report).await;
            Ok(())
        }
        Command::Watch { interval_secs } => {
            let probe = configured_probe(config)?;
            let pipeline = Arc::new(build_pipeline(config, probe, store)?);
            let every = interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.pipeline.interval());

            let mut events = pipeline.subscribe_enrichments();
            let printer = tokio::spawn(async move {
                while let Ok(event) = events.recv().await {
                    match event.record_id {
                        Some(id) => println!("{}: {}", id, event.insight),
                        None => println!("cycle {} (unpersisted): {}", event.cycle_id, event.insight),
                    }
                }
            });

            let summary = run_periodic(pipeline, every, shutdown_signal()).await;
            printer.abort();
            println!(
                "{} cycles completed, {} failed",
                summary.completed, summary.failed
            );
            Ok(())
        }
        Command::Recent { limit, analyze } => {
            let limit = limit.unwrap_or(config.pipeline.review_limit);
            if analyze {
                let pipeline = build_pipeline(config, Arc::new(NoProbe), store)?;
                for (stored, insight) in pipeline.review_recent(limit).await? {
                    print_record(&stored);
                    println!("  insight: {}", insight);
                }
            } else {
                for stored in store.recent(limit).await? {
                    print_record(&stored);
                }
            }
            Ok(())
        }
        Command::History => {
            let pipeline = build_pipeline(config, Arc::new(NoProbe), store)?;
            println!("{}", pipeline.summarize_history().await?);
            Ok(())
        }
    }
}

/// Stand-in for commands that never capture.
struct NoProbe;

#[async_trait::async_trait]
impl MetricProbe for NoProbe {
    async fn capture(&self) -> Result<MetricSample, qnet_daemon::error::ProbeError> {
        Err(qnet_daemon::error::ProbeError::NotConfigured)
    }
}

fn configured_probe(config: &AppConfig) -> DaemonResult<Arc<dyn MetricProbe>> {
    let probe = CommandProbe::from_argv(&config.probe.command).map_err(CycleError::from)?;
    Ok(Arc::new(probe))
}

fn build_pipeline(
    config: &AppConfig,
    probe: Arc<dyn MetricProbe>,
    store: Arc<SqliteRecordStore>,
) -> DaemonResult<Pipeline> {
    let insight = InsightClient::new(&config.insight, config.openai_api_key.clone())
        .map_err(|e| ConfigError::Invalid(format!("insight client: {}", e)))?;

    Ok(Pipeline::new(
        probe,
        store,
        insight,
        FactorSource::from_config(config),
        PipelineSettings::from(&config.pipeline),
    ))
}

async fn print_report(config: &AppConfig, mut report: CycleReport) {
    let sample = &report.record.sample;
    match report.record_id {
        Some(id) => println!("Stored {} at {}", id, sample.timestamp.to_rfc3339()),
        None => println!(
            "Not stored ({}); cycle {}",
            report
                .storage_error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            report.cycle_id
        ),
    }
    println!("  factors: {}", report.factors);
    if let Ok(angles) = QuantumEncoder::new().angles(sample, &report.factors) {
        println!(
            "  angles: [{}]",
            angles
                .iter()
                .map(|a| format!("{:.4}", a))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    print_distribution(report.distribution());

    if let Some(enrichment) = report.take_enrichment() {
        // The request carries its own timeout; this bounds a stuck task too.
        let limit = config.insight.timeout() + Duration::from_secs(5);
        match tokio::time::timeout(limit, enrichment.wait()).await {
            Ok(insight) => println!("  insight: {}", insight),
            Err(_) => println!("  insight: unavailable"),
        }
    }
}

fn print_record(stored: &StoredRecord) {
    let sample = stored.sample();
    println!(
        "{} at {}: down {:.2} Mbps, up {:.2} Mbps, ping {} ms, jitter {} ms",
        stored.id,
        sample.timestamp.to_rfc3339(),
        sample.download_speed,
        sample.upload_speed,
        sample.ping,
        sample.jitter
    );
    print_distribution(stored.distribution());
}

fn print_distribution(distribution: &Distribution) {
    let (index, probability) = distribution.most_likely();
    println!(
        "  most likely: |{}> p={:.4}",
        Distribution::bitstring(index),
        probability
    );
    println!("  distribution: {}", distribution);
}
