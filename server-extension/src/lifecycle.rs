use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExtensionError, Result};
use crate::hook::LifecyclePhase;

/// Where the host is in its start/reload/shutdown sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostState {
    /// Extensions are being declared; no hooks have run yet.
    #[default]
    Loading,
    Running,
    ShutDown,
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loading => "loading",
            Self::Running => "running",
            Self::ShutDown => "shut down",
        })
    }
}

/// A completed phase run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub phase: LifecyclePhase,
    pub from_state: HostState,
    pub to_state: HostState,
    pub hooks_run: usize,
    /// Hooks that failed without aborting the phase.
    pub failures: usize,
    /// Error that aborted the phase, if any.
    pub error: Option<String>,
}

/// Enforces start once, reload while running, shutdown once.
#[derive(Debug, Clone, Default)]
pub struct LifecycleTracker {
    state: HostState,
    events: Vec<LifecycleEvent>,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    /// State reached after `phase` runs, or an error if it may not run now.
    pub fn check(&self, phase: LifecyclePhase) -> Result<HostState> {
        match (self.state, phase) {
            (HostState::Loading, LifecyclePhase::Start) => Ok(HostState::Running),
            (HostState::Running, LifecyclePhase::Reload) => Ok(HostState::Running),
            (HostState::Running, LifecyclePhase::Shutdown) => Ok(HostState::ShutDown),
            (from, phase) => Err(ExtensionError::InvalidTransition { from, phase }),
        }
    }

    /// Record a phase run. An aborted start stays in `Loading`; an aborted
    /// reload stays `Running`; shutdown always ends in `ShutDown`.
    pub fn record(
        &mut self,
        phase: LifecyclePhase,
        hooks_run: usize,
        failures: usize,
        error: Option<String>,
    ) {
        let from_state = self.state;
        let to_state = match (self.check(phase), phase, &error) {
            (Ok(_), LifecyclePhase::Start, Some(_)) => from_state,
            (Ok(next), _, _) => next,
            (Err(_), _, _) => from_state,
        };
        self.state = to_state;
        self.events.push(LifecycleEvent {
            phase,
            from_state,
            to_state,
            hooks_run,
            failures,
            error,
        });
    }

    pub fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }

    pub fn events_for(&self, phase: LifecyclePhase) -> Vec<&LifecycleEvent> {
        self.events.iter().filter(|e| e.phase == phase).collect()
    }
}
