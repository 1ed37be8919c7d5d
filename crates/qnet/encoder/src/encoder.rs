//! Sample → distribution in one call

use crate::error::EncodeError;
use crate::normalizer::{Angles, MetricNormalizer};
use crate::simulator::StateSimulator;
use qnet_types::{Distribution, MetricSample, NormalizationFactors};

/// Normalizes a sample and runs it through the simulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantumEncoder;

impl QuantumEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn angles(
        &self,
        sample: &MetricSample,
        factors: &NormalizationFactors,
    ) -> Result<Angles, EncodeError> {
        MetricNormalizer::normalize(sample, factors)
    }

    pub fn encode(
        &self,
        sample: &MetricSample,
        factors: &NormalizationFactors,
    ) -> Result<Distribution, EncodeError> {
        let angles = self.angles(sample, factors)?;
        let distribution = StateSimulator::simulate(&angles);
        debug_assert!(distribution.total().is_finite());
        Ok(distribution)
    }
}
