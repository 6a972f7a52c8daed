pub mod capability;
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extension;
pub mod hook;
pub mod lifecycle;
pub mod registry;

// Re-export key types for convenience.
pub use capability::{CapabilityHandler, CapabilityName, CapabilityRegistry};
pub use client::{
    ACCESSOR_PREFIX, CapabilityAccessor, CapabilityRequest, Params, RuntimeClient,
    RuntimeTransport, accessor_name,
};
pub use config::{HookFailurePolicy, HostConfig};
pub use discovery::{DiscoverySink, MemorySink, StderrSink, discovery_message};
pub use error::{ClientError, ExtensionError, Result, TransportError};
pub use extension::{Declarations, Extension, ExtensionEntry, manifest};
pub use hook::{HookFailure, LifecycleHook, LifecycleHookRegistry, LifecyclePhase, PhaseReport};
pub use lifecycle::{HostState, LifecycleEvent, LifecycleTracker};
pub use registry::{ExtensionMetadata, ExtensionRegistry};

#[doc(hidden)]
pub use inventory;
