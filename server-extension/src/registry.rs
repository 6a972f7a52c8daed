use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::capability::{CapabilityName, CapabilityRegistry};
use crate::client::RuntimeClient;
use crate::config::HostConfig;
use crate::discovery::{DiscoverySink, StderrSink, discovery_message};
use crate::error::{ExtensionError, Result};
use crate::extension::{Declarations, Extension, manifest};
use crate::hook::{LifecycleHookRegistry, LifecyclePhase, PhaseReport};
use crate::lifecycle::{HostState, LifecycleEvent, LifecycleTracker};

/// Metadata about a loaded extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionMetadata {
    pub name: String,
    /// Capabilities this extension registered successfully.
    pub capabilities: Vec<CapabilityName>,
    pub hooks: usize,
    /// Set when `declare` returned an error.
    pub error: Option<String>,
}

/// Host-owned registry of extensions, their capabilities and their hooks.
pub struct ExtensionRegistry {
    config: HostConfig,
    client: RuntimeClient,
    capabilities: CapabilityRegistry,
    hooks: LifecycleHookRegistry,
    sink: Arc<dyn DiscoverySink>,
    loaded: HashSet<TypeId>,
    extensions: Vec<ExtensionMetadata>,
    lifecycle: LifecycleTracker,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("config", &self.config)
            .field("capabilities", &self.capabilities)
            .field("hooks", &self.hooks)
            .field("extensions", &self.extensions)
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}

impl ExtensionRegistry {
    /// Discovery notifications go to stderr.
    pub fn new(config: HostConfig, client: RuntimeClient) -> Self {
        Self::with_sink(config, client, Arc::new(StderrSink))
    }

    pub fn with_sink(
        config: HostConfig,
        client: RuntimeClient,
        sink: Arc<dyn DiscoverySink>,
    ) -> Self {
        let capabilities = CapabilityRegistry::new(&client);
        Self {
            config,
            client,
            capabilities,
            hooks: LifecycleHookRegistry::new(),
            sink,
            loaded: HashSet::new(),
            extensions: Vec::new(),
            lifecycle: LifecycleTracker::new(),
        }
    }

    /// Discover `extension` and run its declarations.
    ///
    /// Each extension type is discovered and declared at most once per
    /// registry; loading the same type again returns `Ok(())` and changes
    /// nothing.
    pub fn load<E: Extension>(&mut self, extension: &E) -> Result<()> {
        let name = extension.fully_qualified_name();
        if !self.loaded.insert(TypeId::of::<E>()) {
            debug!(extension = name, "extension already loaded");
            return Ok(());
        }
        if self.lifecycle.state() != HostState::Loading {
            warn!(
                extension = name,
                state = %self.lifecycle.state(),
                "loading extension after start"
            );
        }

        let message = discovery_message(&self.config.framework_name, name);
        info!(extension = name, "{message}");
        self.sink.notify(&message);

        let mut declarations =
            Declarations::new(name, &mut self.capabilities, &mut self.hooks, &self.client);
        let result = extension.declare(&mut declarations);
        let (capabilities, hooks) = declarations.finish();

        let error = result.as_ref().err().map(ToString::to_string);
        if let Some(error) = &error {
            warn!(extension = name, %error, "extension failed to load");
        }
        self.extensions.push(ExtensionMetadata {
            name: name.to_string(),
            capabilities,
            hooks,
            error,
        });
        result
    }

    /// Load every extension listed with [`register_extension!`](crate::register_extension),
    /// in name order.
    ///
    /// A failing extension does not stop the others from loading; the
    /// failures are returned together.
    pub fn load_manifest(&mut self) -> Vec<(&'static str, ExtensionError)> {
        let mut failures = Vec::new();
        for entry in manifest() {
            if let Err(err) = entry.load(self) {
                failures.push((entry.name(), err));
            }
        }
        failures
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn client(&self) -> &RuntimeClient {
        &self.client
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    pub fn hooks(&self) -> &LifecycleHookRegistry {
        &self.hooks
    }

    /// Loaded extensions, in load order.
    pub fn extensions(&self) -> &[ExtensionMetadata] {
        &self.extensions
    }

    pub fn extension(&self, name: &str) -> Option<&ExtensionMetadata> {
        self.extensions.iter().find(|e| e.name == name)
    }

    pub fn state(&self) -> HostState {
        self.lifecycle.state()
    }

    pub fn events(&self) -> &[LifecycleEvent] {
        self.lifecycle.events()
    }

    pub fn start(&mut self) -> Result<PhaseReport> {
        self.run_phase(LifecyclePhase::Start)
    }

    pub fn reload(&mut self) -> Result<PhaseReport> {
        self.run_phase(LifecyclePhase::Reload)
    }

    pub fn shutdown(&mut self) -> Result<PhaseReport> {
        self.run_phase(LifecyclePhase::Shutdown)
    }

    fn run_phase(&mut self, phase: LifecyclePhase) -> Result<PhaseReport> {
        self.lifecycle.check(phase)?;
        match self.hooks.run(phase, self.config.hook_failure_policy) {
            Ok(report) => {
                self.lifecycle.record(phase, report.ran, report.failures.len(), None);
                Ok(report)
            }
            Err(err) => {
                let ran = match &err {
                    ExtensionError::HookFailed { index, .. } => index + 1,
                    _ => 0,
                };
                self.lifecycle.record(phase, ran, 0, Some(err.to_string()));
                Err(err)
            }
        }
    }
}
