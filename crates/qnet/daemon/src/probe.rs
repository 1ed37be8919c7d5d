//! Measurement probes

use crate::error::ProbeError;
use async_trait::async_trait;
use chrono::Utc;
use qnet_types::MetricSample;
use serde::Deserialize;
use tokio::process::Command;

/// Source of network measurements. Capture may take several seconds when it
/// runs a real throughput test.
#[async_trait]
pub trait MetricProbe: Send + Sync {
    async fn capture(&self) -> Result<MetricSample, ProbeError>;
}

/// Returns the same caller-supplied sample, re-stamped on each capture.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    sample: MetricSample,
}

impl StaticProbe {
    pub fn new(sample: MetricSample) -> Self {
        Self { sample }
    }
}

#[async_trait]
impl MetricProbe for StaticProbe {
    async fn capture(&self) -> Result<MetricSample, ProbeError> {
        Ok(MetricSample {
            timestamp: Utc::now(),
            ..self.sample.clone()
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    download_speed: f64,
    upload_speed: f64,
    ping: f64,
    jitter: f64,
}

/// Runs an external program that prints one JSON measurement:
/// `{"download_speed": .., "upload_speed": .., "ping": .., "jitter": ..}`.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
}

impl CommandProbe {
    /// `argv[0]` is the program, the rest its arguments.
    pub fn from_argv(argv: &[String]) -> Result<Self, ProbeError> {
        let (program, args) = argv.split_first().ok_or(ProbeError::NotConfigured)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn parse(stdout: &[u8]) -> Result<MetricSample, ProbeError> {
        let output: ProbeOutput =
            serde_json::from_slice(stdout).map_err(|e| ProbeError::Parse(e.to_string()))?;
        Ok(MetricSample::now(
            output.download_speed,
            output.upload_speed,
            output.ping,
            output.jitter,
        ))
    }
}

#[async_trait]
impl MetricProbe for CommandProbe {
    async fn capture(&self) -> Result<MetricSample, ProbeError> {
        tracing::debug!(program = %self.program, "Running probe");

        // The child is killed if the capture future is dropped on timeout.
        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProbeError::Spawn(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Self::parse(&output.stdout)
    }
}
