use crate::hook::LifecyclePhase;
use crate::lifecycle::HostState;

/// Errors produced while declaring extensions or driving their lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    #[error("capability {name} is already defined")]
    DuplicateCapability { name: String },

    #[error("invalid capability name {name:?}: {reason}")]
    InvalidCapabilityName { name: String, reason: &'static str },

    #[error("{phase} hook #{index} failed: {source}")]
    HookFailed {
        phase: LifecyclePhase,
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("cannot run {phase} hooks while {from}")]
    InvalidTransition {
        from: HostState,
        phase: LifecyclePhase,
    },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ExtensionError>;

/// Opaque failure reported by the channel to the external runtime.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by [`crate::RuntimeClient`] calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no accessor named {0}")]
    UnknownAccessor(String),

    #[error("runtime request `{capability}` failed: {source}")]
    Transport {
        capability: String,
        #[source]
        source: TransportError,
    },
}
