//! Metric → rotation angle mapping

use crate::error::EncodeError;
use qnet_types::{Metric, MetricSample, NormalizationFactors, QUBITS};
use std::f64::consts::PI;

/// One rotation angle per qubit, qubit 0 first.
pub type Angles = [f64; QUBITS];

/// Scales raw metrics into rotation angles.
///
/// - qubit 0: π · download / factor
/// - qubit 1: π · upload / factor
/// - qubit 2: π · (1 − ping / factor)
/// - qubit 3: π · jitter / factor
///
/// Nothing is clamped. A ping above its factor yields a negative angle and a
/// speed above its factor an angle past π; the rotation accepts both.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricNormalizer;

impl MetricNormalizer {
    pub fn normalize(
        sample: &MetricSample,
        factors: &NormalizationFactors,
    ) -> Result<Angles, EncodeError> {
        factors.validate()?;
        for metric in Metric::ALL {
            let value = sample.value(metric);
            if !value.is_finite() {
                return Err(EncodeError::NonFiniteMetric { metric, value });
            }
            if value < 0.0 {
                return Err(EncodeError::NegativeMetric { metric, value });
            }
        }

        let mut angles = [0.0; QUBITS];
        for (angle, metric) in angles.iter_mut().zip(Metric::ALL) {
            *angle = Self::angle(metric, sample.value(metric), factors.get(metric));
            // Finite inputs can still overflow the quotient.
            if !angle.is_finite() {
                return Err(EncodeError::NonFiniteAngle {
                    metric,
                    value: sample.value(metric),
                });
            }
        }
        Ok(angles)
    }

    fn angle(metric: Metric, value: f64, factor: f64) -> f64 {
        match metric {
            Metric::Ping => PI * (1.0 - value / factor),
            _ => PI * value / factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(download: f64, upload: f64, ping: f64, jitter: f64) -> MetricSample {
        MetricSample::now(download, upload, ping, jitter)
    }

    #[test]
    fn test_reference_angles() {
        let angles = MetricNormalizer::normalize(
            &sample(120.0, 20.0, 15.0, 3.0),
            &NormalizationFactors::default(),
        )
        .unwrap();

        let expected = [PI * 1.2, PI * 0.2, PI * 0.85, PI * 0.03];
        for (got, want) in angles.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{got} != {want}");
        }
    }

    #[test]
    fn test_linear_in_download_speed() {
        let factors = NormalizationFactors::default();
        let base = MetricNormalizer::normalize(&sample(30.0, 0.0, 0.0, 0.0), &factors).unwrap();
        let doubled = MetricNormalizer::normalize(&sample(60.0, 0.0, 0.0, 0.0), &factors).unwrap();
        assert!((doubled[0] - 2.0 * base[0]).abs() < 1e-12);
        assert_eq!(base[1..], doubled[1..]);
    }

    #[test]
    fn test_ping_above_factor_goes_negative() {
        let angles = MetricNormalizer::normalize(
            &sample(0.0, 0.0, 250.0, 0.0),
            &NormalizationFactors::default(),
        )
        .unwrap();
        assert!((angles[2] - PI * -1.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_ping_is_full_rotation() {
        let angles = MetricNormalizer::normalize(
            &sample(0.0, 0.0, 0.0, 0.0),
            &NormalizationFactors::default(),
        )
        .unwrap();
        assert_eq!(angles, [0.0, 0.0, PI, 0.0]);
    }

    #[test]
    fn test_rejects_non_finite_metric() {
        let err = MetricNormalizer::normalize(
            &sample(f64::INFINITY, 1.0, 1.0, 1.0),
            &NormalizationFactors::default(),
        )
        .unwrap_err();
        assert_eq!(err.metric(), Metric::DownloadSpeed);
        assert!(matches!(err, EncodeError::NonFiniteMetric { .. }));

        let err = MetricNormalizer::normalize(
            &sample(1.0, 1.0, 1.0, f64::NAN),
            &NormalizationFactors::default(),
        )
        .unwrap_err();
        assert_eq!(err.metric(), Metric::Jitter);
    }

    #[test]
    fn test_rejects_overflowing_angle() {
        let err = MetricNormalizer::normalize(
            &sample(1e308, 20.0, 15.0, 3.0),
            &NormalizationFactors::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EncodeError::NonFiniteAngle { metric: Metric::DownloadSpeed, .. }
        ));

        let factors = NormalizationFactors {
            jitter: 1e-308,
            ..NormalizationFactors::default()
        };
        let err = MetricNormalizer::normalize(&sample(1.0, 1.0, 1.0, 1e10), &factors).unwrap_err();
        assert_eq!(err.metric(), Metric::Jitter);
    }

    #[test]
    fn test_rejects_negative_metric() {
        let err = MetricNormalizer::normalize(
            &sample(1.0, -2.0, 1.0, 1.0),
            &NormalizationFactors::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EncodeError::NegativeMetric { metric: Metric::UploadSpeed, .. }
        ));
    }

    #[test]
    fn test_rejects_zero_factor() {
        let factors = NormalizationFactors {
            ping: 0.0,
            ..NormalizationFactors::default()
        };
        let err = MetricNormalizer::normalize(&sample(1.0, 1.0, 1.0, 1.0), &factors).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidFactor(_)));
        assert_eq!(err.metric(), Metric::Ping);
    }
}
