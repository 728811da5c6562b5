use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Run-time knobs for a simulation. Every field has a default so partial JSON
/// documents are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Hard cap on simulated ticks. `None` relies on stall detection alone.
    pub max_ticks: Option<u64>,
    /// Reject sources with no path to any destination before simulating.
    pub check_reachability: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { max_ticks: None, check_reachability: true }
    }
}

impl SimulationConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }
}
