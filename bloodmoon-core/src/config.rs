//! Search configuration

use crate::eval::Heuristics;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Everything the engine needs besides the position
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Deepest iteration of iterative deepening, in plies
    pub max_depth: u32,
    /// Wall-clock budget per move in milliseconds
    pub time_budget_ms: u64,
    /// Evaluator weights
    pub heuristics: Heuristics,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            time_budget_ms: 1800,
            heuristics: Heuristics::default(),
        }
    }
}

impl SearchConfig {
    /// Config with given depth and budget, default heuristics
    pub fn new(max_depth: u32, time_budget: Duration) -> Self {
        Self {
            max_depth,
            time_budget_ms: time_budget.as_millis() as u64,
            ..Default::default()
        }
    }

    /// Set custom heuristics
    pub fn with_heuristics(mut self, heuristics: Heuristics) -> Self {
        self.heuristics = heuristics;
        self
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    /// Load from JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&content)?;
        if config.max_depth == 0 {
            anyhow::bail!("max_depth must be at least 1 in {}", path.display());
        }
        Ok(config)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
