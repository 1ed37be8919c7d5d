//! QNet encoder
//!
//! Turns one network measurement into a 16-state probability distribution:
//!
//! ```rust
//! use qnet_encoder::QuantumEncoder;
//! use qnet_types::{MetricSample, NormalizationFactors};
//!
//! let sample = MetricSample::now(120.0, 20.0, 15.0, 3.0);
//! let dist = QuantumEncoder::new()
//!     .encode(&sample, &NormalizationFactors::default())
//!     .unwrap();
//! assert!((dist.total() - 1.0).abs() < 1e-9);
//! ```
//!
//! The pieces are usable on their own:
//! - [`MetricNormalizer`] maps metrics to rotation angles
//! - [`StateSimulator`] runs the fixed RY + CNOT-chain circuit over angles
//!
//! Everything here is pure and `Send + Sync`.

pub mod encoder;
pub mod error;
pub mod normalizer;
pub mod simulator;

pub use encoder::QuantumEncoder;
pub use error::EncodeError;
pub use normalizer::{Angles, MetricNormalizer};
pub use simulator::{StateSimulator, StateVector, ENTANGLING_CHAIN};
