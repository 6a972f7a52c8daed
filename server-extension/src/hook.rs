use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::HookFailurePolicy;
use crate::error::{ExtensionError, Result};

/// Moments at which the host runs lifecycle hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    Start,
    Reload,
    Shutdown,
}

impl LifecyclePhase {
    pub const ALL: [LifecyclePhase; 3] = [Self::Start, Self::Reload, Self::Shutdown];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Reload => "reload",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A zero-argument lifecycle callback.
pub type LifecycleHook = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// A hook that failed while its phase ran under
/// [`HookFailurePolicy::ContinueOnError`].
#[derive(Debug)]
pub struct HookFailure {
    pub index: usize,
    pub error: anyhow::Error,
}

/// Outcome of running one phase.
#[derive(Debug)]
pub struct PhaseReport {
    pub phase: LifecyclePhase,
    /// Hooks that were called, including the ones that failed.
    pub ran: usize,
    pub failures: Vec<HookFailure>,
}

impl PhaseReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Three append-only hook sequences, one per phase.
#[derive(Clone, Default)]
pub struct LifecycleHookRegistry {
    start: Vec<LifecycleHook>,
    reload: Vec<LifecycleHook>,
    shutdown: Vec<LifecycleHook>,
}

impl fmt::Debug for LifecycleHookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHookRegistry")
            .field("start", &self.start.len())
            .field("reload", &self.reload.len())
            .field("shutdown", &self.shutdown.len())
            .finish()
    }
}

impl LifecycleHookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `hook` to `phase`. The same hook may be added more than once.
    pub fn add(&mut self, phase: LifecyclePhase, hook: LifecycleHook) {
        self.sequence_mut(phase).push(hook);
    }

    pub fn add_start(&mut self, hook: impl Fn() -> anyhow::Result<()> + Send + Sync + 'static) {
        self.add(LifecyclePhase::Start, Arc::new(hook));
    }

    pub fn add_reload(&mut self, hook: impl Fn() -> anyhow::Result<()> + Send + Sync + 'static) {
        self.add(LifecyclePhase::Reload, Arc::new(hook));
    }

    pub fn add_shutdown(&mut self, hook: impl Fn() -> anyhow::Result<()> + Send + Sync + 'static) {
        self.add(LifecyclePhase::Shutdown, Arc::new(hook));
    }

    /// Hooks for `phase`, in the order they were added.
    pub fn hooks(&self, phase: LifecyclePhase) -> &[LifecycleHook] {
        match phase {
            LifecyclePhase::Start => &self.start,
            LifecyclePhase::Reload => &self.reload,
            LifecyclePhase::Shutdown => &self.shutdown,
        }
    }

    pub fn start(&self) -> &[LifecycleHook] {
        &self.start
    }

    pub fn reload(&self) -> &[LifecycleHook] {
        &self.reload
    }

    pub fn shutdown(&self) -> &[LifecycleHook] {
        &self.shutdown
    }

    pub fn len(&self) -> usize {
        self.start.len() + self.reload.len() + self.shutdown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every hook of `phase` once, in append order.
    pub fn run(&self, phase: LifecyclePhase, policy: HookFailurePolicy) -> Result<PhaseReport> {
        let hooks = self.hooks(phase);
        info!(%phase, hooks = hooks.len(), "running lifecycle hooks");

        let mut report = PhaseReport {
            phase,
            ran: 0,
            failures: Vec::new(),
        };
        for (index, hook) in hooks.iter().enumerate() {
            report.ran += 1;
            if let Err(error) = hook() {
                warn!(%phase, index, error = %error, "lifecycle hook failed");
                match policy {
                    HookFailurePolicy::FailFast => {
                        return Err(ExtensionError::HookFailed {
                            phase,
                            index,
                            source: error,
                        });
                    }
                    HookFailurePolicy::ContinueOnError => {
                        report.failures.push(HookFailure { index, error });
                    }
                }
            }
        }
        Ok(report)
    }

    fn sequence_mut(&mut self, phase: LifecyclePhase) -> &mut Vec<LifecycleHook> {
        match phase {
            LifecyclePhase::Start => &mut self.start,
            LifecyclePhase::Reload => &mut self.reload,
            LifecyclePhase::Shutdown => &mut self.shutdown,
        }
    }
}
