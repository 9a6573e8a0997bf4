//! Sampled paths produced by the integrators.

use ndarray::Array1;
use serde::Serialize;

use crate::systems::{CompartmentState, ModelState};

/// Ordered `(time, state)` samples of one simulated path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory<S> {
    /// Sample times, starting at 0
    pub time: Vec<f64>,
    /// States at each sample time
    pub states: Vec<S>,
}

impl<S: ModelState> Trajectory<S> {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            time: Vec::with_capacity(n),
            states: Vec::with_capacity(n),
        }
    }

    pub(crate) fn push(&mut self, t: f64, state: S) {
        self.time.push(t);
        self.states.push(state);
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// First sample (the initial condition)
    pub fn initial(&self) -> Option<S> {
        self.states.first().copied()
    }

    /// Last sample
    pub fn final_state(&self) -> Option<S> {
        self.states.last().copied()
    }

    /// Iterate `(t, state)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (f64, S)> + '_ {
        self.time.iter().copied().zip(self.states.iter().copied())
    }

    /// Observed component B over time
    pub fn primary_series(&self) -> Array1<f64> {
        self.states.iter().map(|s| s.primary()).collect()
    }

    /// Time grid as an array
    pub fn time_grid(&self) -> Array1<f64> {
        Array1::from_vec(self.time.clone())
    }
}

impl Trajectory<CompartmentState> {
    /// Accumulated capital K over time
    pub fn capital_series(&self) -> Array1<f64> {
        self.states.iter().map(|s| s.k).collect()
    }
}
