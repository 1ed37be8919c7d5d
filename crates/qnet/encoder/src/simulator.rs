//! Fixed 4-qubit state simulation
//!
//! The circuit is always the same: one RY rotation per qubit followed by the
//! CNOT chain 0→1, 1→2, 2→3. RY has a real matrix and CNOT only permutes
//! basis states, so every amplitude stays real and the state is kept as a
//! plain `[f64; 16]`.
//!
//! Qubit `i` is bit `i` of the basis index. Changing the wire order or the
//! chain changes every output value.

use qnet_types::{Distribution, BASIS_STATES, QUBITS};

/// (control, target) pairs applied after the rotations, in order.
pub const ENTANGLING_CHAIN: [(usize, usize); 3] = [(0, 1), (1, 2), (2, 3)];

/// Amplitudes of the simulated register.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    amplitudes: [f64; BASIS_STATES],
}

impl Default for StateVector {
    fn default() -> Self {
        Self::ground()
    }
}

impl StateVector {
    /// |0000⟩
    pub fn ground() -> Self {
        let mut amplitudes = [0.0; BASIS_STATES];
        amplitudes[0] = 1.0;
        Self { amplitudes }
    }

    pub fn amplitudes(&self) -> &[f64; BASIS_STATES] {
        &self.amplitudes
    }

    /// Rotate `qubit` about the Y axis by `angle` radians.
    ///
    /// Acts on every pair of indices that differ only in bit `qubit`.
    pub fn ry(&mut self, qubit: usize, angle: f64) -> &mut Self {
        debug_assert!(qubit < QUBITS);
        let (s, c) = (angle / 2.0).sin_cos();
        let mask = 1 << qubit;

        for index in 0..BASIS_STATES {
            if index & mask != 0 {
                continue;
            }
            let zero = self.amplitudes[index];
            let one = self.amplitudes[index | mask];
            self.amplitudes[index] = c * zero - s * one;
            self.amplitudes[index | mask] = s * zero + c * one;
        }
        self
    }

    /// Flip `target` wherever `control` is set.
    pub fn cnot(&mut self, control: usize, target: usize) -> &mut Self {
        debug_assert!(control < QUBITS && target < QUBITS && control != target);
        let control_mask = 1 << control;
        let target_mask = 1 << target;

        for index in 0..BASIS_STATES {
            if index & control_mask != 0 && index & target_mask == 0 {
                self.amplitudes.swap(index, index | target_mask);
            }
        }
        self
    }

    pub fn norm_squared(&self) -> f64 {
        self.amplitudes.iter().map(|a| a * a).sum()
    }

    /// Squared magnitude per basis state.
    pub fn probabilities(&self) -> Distribution {
        let mut probabilities = [0.0; BASIS_STATES];
        for (p, a) in probabilities.iter_mut().zip(self.amplitudes.iter()) {
            *p = a * a;
        }
        Distribution::from_probabilities(probabilities)
    }
}

/// Runs the encoding circuit.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateSimulator;

impl StateSimulator {
    /// Rotate qubit `i` by `angles[i]`, entangle along the chain, measure.
    ///
    /// Any real angle is accepted; angles outside [0, π] simply wrap around
    /// the rotation.
    pub fn simulate(angles: &[f64; QUBITS]) -> Distribution {
        let mut state = StateVector::ground();
        for (qubit, angle) in angles.iter().enumerate() {
            state.ry(qubit, *angle);
        }
        for (control, target) in ENTANGLING_CHAIN {
            state.cnot(control, target);
        }
        state.probabilities()
    }
}
