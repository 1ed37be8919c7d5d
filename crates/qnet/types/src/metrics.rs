//! Raw network measurements and the factors used to scale them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Value used for any normalization factor that is not configured or cannot
/// be parsed from a suggestion.
pub const DEFAULT_FACTOR: f64 = 100.0;

/// The four measured quantities, in encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    DownloadSpeed,
    UploadSpeed,
    Ping,
    Jitter,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::DownloadSpeed,
        Metric::UploadSpeed,
        Metric::Ping,
        Metric::Jitter,
    ];

    /// Field name as used in configuration, storage columns and prompts.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::DownloadSpeed => "download_speed",
            Metric::UploadSpeed => "upload_speed",
            Metric::Ping => "ping",
            Metric::Jitter => "jitter",
        }
    }

    /// Unit of the raw measurement.
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::DownloadSpeed | Metric::UploadSpeed => "Mbps",
            Metric::Ping | Metric::Jitter => "ms",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One network-quality reading. Immutable once captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Download throughput in Mbps
    pub download_speed: f64,
    /// Upload throughput in Mbps
    pub upload_speed: f64,
    /// Round-trip latency in ms
    pub ping: f64,
    /// Latency variation in ms
    pub jitter: f64,
    /// Capture time
    pub timestamp: DateTime<Utc>,
}

impl MetricSample {
    pub fn new(
        download_speed: f64,
        upload_speed: f64,
        ping: f64,
        jitter: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            download_speed,
            upload_speed,
            ping,
            jitter,
            timestamp,
        }
    }

    /// Sample stamped with the current time.
    pub fn now(download_speed: f64, upload_speed: f64, ping: f64, jitter: f64) -> Self {
        Self::new(download_speed, upload_speed, ping, jitter, Utc::now())
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::DownloadSpeed => self.download_speed,
            Metric::UploadSpeed => self.upload_speed,
            Metric::Ping => self.ping,
            Metric::Jitter => self.jitter,
        }
    }
}

/// Rejected normalization factor
#[derive(Debug, Clone, PartialEq, Error)]
#[error("normalization factor {metric} must be finite and > 0, got {value}")]
pub struct FactorError {
    pub metric: Metric,
    pub value: f64,
}

/// Per-metric divisors. Every factor must be strictly positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationFactors {
    pub download_speed: f64,
    pub upload_speed: f64,
    pub ping: f64,
    pub jitter: f64,
}

impl Default for NormalizationFactors {
    fn default() -> Self {
        Self {
            download_speed: DEFAULT_FACTOR,
            upload_speed: DEFAULT_FACTOR,
            ping: DEFAULT_FACTOR,
            jitter: DEFAULT_FACTOR,
        }
    }
}

impl NormalizationFactors {
    /// Build a validated factor set.
    pub fn new(
        download_speed: f64,
        upload_speed: f64,
        ping: f64,
        jitter: f64,
    ) -> Result<Self, FactorError> {
        let factors = Self {
            download_speed,
            upload_speed,
            ping,
            jitter,
        };
        factors.validate()?;
        Ok(factors)
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::DownloadSpeed => self.download_speed,
            Metric::UploadSpeed => self.upload_speed,
            Metric::Ping => self.ping,
            Metric::Jitter => self.jitter,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::DownloadSpeed => self.download_speed = value,
            Metric::UploadSpeed => self.upload_speed = value,
            Metric::Ping => self.ping = value,
            Metric::Jitter => self.jitter = value,
        }
    }

    /// Check every factor is a usable divisor.
    pub fn validate(&self) -> Result<(), FactorError> {
        for metric in Metric::ALL {
            let value = self.get(metric);
            if !value.is_finite() || value <= 0.0 {
                return Err(FactorError { metric, value });
            }
        }
        Ok(())
    }
}

impl fmt::Display for NormalizationFactors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "download_speed={} upload_speed={} ping={} jitter={}",
            self.download_speed, self.upload_speed, self.ping, self.jitter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_factors() {
        let factors = NormalizationFactors::default();
        for metric in Metric::ALL {
            assert_eq!(factors.get(metric), 100.0);
        }
        assert!(factors.validate().is_ok());
    }

    #[test]
    fn test_factor_validation() {
        assert!(NormalizationFactors::new(1000.0, 500.0, 100.0, 50.0).is_ok());

        let err = NormalizationFactors::new(100.0, 0.0, 100.0, 100.0).unwrap_err();
        assert_eq!(err.metric, Metric::UploadSpeed);

        let err = NormalizationFactors::new(100.0, 100.0, f64::NAN, 100.0).unwrap_err();
        assert_eq!(err.metric, Metric::Ping);

        assert!(NormalizationFactors::new(100.0, 100.0, 100.0, -5.0).is_err());
    }

    #[test]
    fn test_factors_deserialize() {
        let factors: NormalizationFactors = serde_json::from_str(
            r#"{"download_speed": 1000, "upload_speed": 500, "ping": 100, "jitter": 50}"#,
        )
        .unwrap();
        assert_eq!(factors.download_speed, 1000.0);
        assert_eq!(factors.jitter, 50.0);
    }

    #[test]
    fn test_sample_value_lookup() {
        let sample = MetricSample::now(120.0, 20.0, 15.0, 3.0);
        assert_eq!(sample.value(Metric::DownloadSpeed), 120.0);
        assert_eq!(sample.value(Metric::UploadSpeed), 20.0);
        assert_eq!(sample.value(Metric::Ping), 15.0);
        assert_eq!(sample.value(Metric::Jitter), 3.0);
    }

    #[test]
    fn test_metric_names() {
        let names: Vec<_> = Metric::ALL.iter().map(Metric::name).collect();
        assert_eq!(names, ["download_speed", "upload_speed", "ping", "jitter"]);
        assert_eq!(Metric::Ping.unit(), "ms");
    }
}
