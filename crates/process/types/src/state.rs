//! Lifecycle states shared by tasks and processes

use serde::{Deserialize, Serialize};

/// Current state of a runnable.
///
/// Plain tasks cycle `Ready -> Running -> Done`; `Starting` and
/// `RunComplete` belong to the process machine. `Stopping` is part of the
/// vocabulary but no machine in this engine enters it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Ready,
    Starting,
    Running,
    RunComplete,
    Stopping,
    Done,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::Starting => "Starting",
            Self::Running => "Running",
            Self::RunComplete => "RunComplete",
            Self::Stopping => "Stopping",
            Self::Done => "Done",
        }
    }

    /// States in which the scheduler invokes the run action
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::RunComplete)
    }

    /// Started but not yet cycled back to `Ready` or `Done`
    pub fn is_mid_run(&self) -> bool {
        !matches!(self, Self::Ready | Self::Done)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Ready" => Some(Self::Ready),
            "Starting" => Some(Self::Starting),
            "Running" => Some(Self::Running),
            "RunComplete" => Some(Self::RunComplete),
            "Stopping" => Some(Self::Stopping),
            "Done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task category, used to route root tasks to containers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    Task,
    Activity,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task => f.write_str("task"),
            Self::Activity => f.write_str("activity"),
        }
    }
}
