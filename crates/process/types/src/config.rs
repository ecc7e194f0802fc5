//! Engine configuration

use crate::{ProcessError, ProcessResult};
use serde::{Deserialize, Serialize};

/// Default nesting bound for condition and view evaluation
pub const DEFAULT_MAX_EVAL_DEPTH: u32 = 64;

/// Tunables of the tick runtime
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Container that receives processes and unrouted tasks
    pub default_container: String,
    /// Upper bound for `run_until_done` before reporting a stall
    pub max_ticks: u64,
    /// Maximum nesting of condition/view evaluation
    pub max_eval_depth: u32,
    /// Whether new tasks re-arm from `Done` to `Ready` by default
    pub auto_rearm: bool,
    /// Record transitions and faults in the trace log
    pub trace: bool,
    /// Maximum retained trace records (oldest dropped first)
    pub trace_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_container: "main".to_string(),
            max_ticks: 10_000,
            max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
            auto_rearm: false,
            trace: false,
            trace_capacity: 4096,
        }
    }
}

impl EngineConfig {
    /// Tracing enabled, small tick bound for interactive debugging.
    pub fn debug() -> Self {
        Self {
            max_ticks: 1_000,
            trace: true,
            ..Self::default()
        }
    }

    /// Tight bounds for embedding in latency-sensitive hosts.
    pub fn strict() -> Self {
        Self {
            max_ticks: 1_000,
            max_eval_depth: 16,
            trace: false,
            trace_capacity: 256,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take defaults.
    pub fn from_json(json: &str) -> ProcessResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ProcessResult<()> {
        if self.default_container.trim().is_empty() {
            return Err(ProcessError::Config("default_container is empty".into()));
        }
        if self.max_ticks == 0 {
            return Err(ProcessError::Config("max_ticks must be positive".into()));
        }
        if self.max_eval_depth == 0 {
            return Err(ProcessError::Config("max_eval_depth must be positive".into()));
        }
        Ok(())
    }
}
