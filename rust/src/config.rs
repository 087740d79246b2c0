//! Configuration types for the scheduling engine.

use pyo3::prelude::*;

/// Iteration cap shared by the forward and backward relaxation passes.
pub const MAX_PASSES: usize = 100;

/// Configuration for a scheduling run.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of relaxation passes per direction.
    #[pyo3(get, set)]
    pub max_passes: usize,
    /// Verbosity level: 0=silent, 1=warnings, 2=passes, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
    /// Refuse to schedule a task set whose dependency graph contains a cycle.
    ///
    /// When false, cyclic input is scheduled anyway and the passes stop at
    /// `max_passes` with an unconverged result.
    #[pyo3(get, set)]
    pub reject_cycles: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_passes: MAX_PASSES,
            verbosity: 0,
            reject_cycles: false,
        }
    }
}

#[pymethods]
impl EngineConfig {
    #[new]
    #[pyo3(signature = (max_passes=None, verbosity=None, reject_cycles=None))]
    fn new(max_passes: Option<usize>, verbosity: Option<u8>, reject_cycles: Option<bool>) -> Self {
        let defaults = Self::default();
        Self {
            max_passes: max_passes.unwrap_or(defaults.max_passes),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
            reject_cycles: reject_cycles.unwrap_or(defaults.reject_cycles),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "EngineConfig(max_passes={}, verbosity={}, reject_cycles={})",
            self.max_passes, self.verbosity, self.reject_cycles
        )
    }
}
