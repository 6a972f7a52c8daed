//! Declaration surface for extension authors.
//!
//! An extension is a type implementing [`Extension`]. When the host loads it
//! into an [`ExtensionRegistry`], [`Extension::declare`] receives a
//! [`Declarations`] handle and uses it to add capabilities and lifecycle
//! hooks. Each write goes straight into the shared registries, so an error
//! half way through `declare` leaves the earlier declarations in place.
//!
//! Extensions can also list themselves in the compile-time manifest with
//! [`register_extension!`](crate::register_extension), which the host picks
//! up through [`ExtensionRegistry::load_manifest`].

use std::fmt;
use std::sync::Arc;

use crate::capability::{CapabilityName, CapabilityRegistry};
use crate::client::{Params, RuntimeClient};
use crate::error::Result;
use crate::hook::{LifecycleHookRegistry, LifecyclePhase};
use crate::registry::ExtensionRegistry;

pub trait Extension: 'static {
    /// Declare this extension's capabilities and hooks.
    fn declare(&self, declarations: &mut Declarations<'_>) -> Result<()>;

    /// Name used in discovery notifications.
    fn fully_qualified_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Write access to the registries while one extension declares itself.
pub struct Declarations<'a> {
    extension: &'static str,
    capabilities: &'a mut CapabilityRegistry,
    hooks: &'a mut LifecycleHookRegistry,
    client: &'a RuntimeClient,
    declared: Vec<CapabilityName>,
    hook_count: usize,
}

impl fmt::Debug for Declarations<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declarations")
            .field("extension", &self.extension)
            .field("declared", &self.declared)
            .field("hook_count", &self.hook_count)
            .finish_non_exhaustive()
    }
}

impl<'a> Declarations<'a> {
    pub(crate) fn new(
        extension: &'static str,
        capabilities: &'a mut CapabilityRegistry,
        hooks: &'a mut LifecycleHookRegistry,
        client: &'a RuntimeClient,
    ) -> Self {
        Self {
            extension,
            capabilities,
            hooks,
            client,
            declared: Vec::new(),
            hook_count: 0,
        }
    }

    /// Name of the extension currently declaring.
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// Register a capability and its `get_<name>` accessor.
    pub fn command<F>(&mut self, name: &str, handler: F) -> Result<CapabilityName>
    where
        F: Fn(&Params) -> anyhow::Result<Params> + Send + Sync + 'static,
    {
        let name = self.capabilities.register_arc(name, Arc::new(handler))?;
        self.declared.push(name.clone());
        Ok(name)
    }

    /// Same as [`Declarations::command`].
    pub fn resource<F>(&mut self, name: &str, handler: F) -> Result<CapabilityName>
    where
        F: Fn(&Params) -> anyhow::Result<Params> + Send + Sync + 'static,
    {
        self.command(name, handler)
    }

    pub fn before_start(&mut self, hook: impl Fn() -> anyhow::Result<()> + Send + Sync + 'static) {
        self.hook(LifecyclePhase::Start, Arc::new(hook));
    }

    pub fn after_reload(&mut self, hook: impl Fn() -> anyhow::Result<()> + Send + Sync + 'static) {
        self.hook(LifecyclePhase::Reload, Arc::new(hook));
    }

    pub fn before_shutdown(
        &mut self,
        hook: impl Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    ) {
        self.hook(LifecyclePhase::Shutdown, Arc::new(hook));
    }

    /// Runtime client shared by every extension in this registry.
    ///
    /// Clone it into hooks that need to call capabilities once the host runs.
    pub fn client(&self) -> &RuntimeClient {
        self.client
    }

    pub(crate) fn finish(self) -> (Vec<CapabilityName>, usize) {
        (self.declared, self.hook_count)
    }

    fn hook(&mut self, phase: LifecyclePhase, hook: crate::hook::LifecycleHook) {
        self.hooks.add(phase, hook);
        self.hook_count += 1;
    }
}

/// Compile-time manifest entry; see [`register_extension!`](crate::register_extension).
pub struct ExtensionEntry {
    name: fn() -> &'static str,
    load: fn(&mut ExtensionRegistry) -> Result<()>,
}

impl ExtensionEntry {
    pub const fn of<E: Extension + Default>() -> Self {
        Self {
            name: std::any::type_name::<E>,
            load: load_default::<E>,
        }
    }

    pub fn name(&self) -> &'static str {
        (self.name)()
    }

    pub(crate) fn load(&self, registry: &mut ExtensionRegistry) -> Result<()> {
        (self.load)(registry)
    }
}

impl fmt::Debug for ExtensionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionEntry")
            .field("name", &self.name())
            .finish()
    }
}

fn load_default<E: Extension + Default>(registry: &mut ExtensionRegistry) -> Result<()> {
    registry.load(&E::default())
}

inventory::collect!(ExtensionEntry);

/// Add an extension type to the compile-time manifest.
///
/// The type must implement [`Extension`] and [`Default`].
#[macro_export]
macro_rules! register_extension {
    ($ty:ty) => {
        $crate::inventory::submit! {
            $crate::ExtensionEntry::of::<$ty>()
        }
    };
}

/// Manifest entries sorted by name.
pub fn manifest() -> Vec<&'static ExtensionEntry> {
    let mut entries: Vec<_> = inventory::iter::<ExtensionEntry>.into_iter().collect();
    entries.sort_by_key(|entry| entry.name());
    entries
}
