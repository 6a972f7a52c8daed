//! Fakes shared by the `server-extension` integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use server_extension::{
    CapabilityRequest, ExtensionRegistry, HostConfig, MemorySink, Params, RuntimeClient,
    RuntimeTransport, TransportError,
};

/// Transport that records every request and answers from canned responses.
///
/// Capabilities without a canned response fail with a transport error.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    requests: Arc<Mutex<Vec<CapabilityRequest>>>,
    responses: Arc<Mutex<HashMap<String, Params>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, capability: &str, response: Params) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(capability.to_string(), response);
    }

    pub fn requests(&self) -> Vec<CapabilityRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RuntimeTransport for RecordingTransport {
    fn make_request(&self, request: &CapabilityRequest) -> Result<Params, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&request.capability)
            .cloned()
            .ok_or_else(|| {
                TransportError::new(format!("runtime has no capability {}", request.capability))
            })
    }
}

/// A registry wired to a recording transport and an in-memory discovery sink.
pub struct TestHost {
    pub registry: ExtensionRegistry,
    pub transport: RecordingTransport,
    pub discoveries: MemorySink,
}

impl TestHost {
    pub fn new(config: HostConfig) -> Self {
        let transport = RecordingTransport::new();
        let discoveries = MemorySink::new();
        let registry = ExtensionRegistry::with_sink(
            config,
            RuntimeClient::new(transport.clone()),
            Arc::new(discoveries.clone()),
        );
        Self {
            registry,
            transport,
            discoveries,
        }
    }

    pub fn client(&self) -> &RuntimeClient {
        self.registry.client()
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}

/// Build `Params` from a JSON object literal; anything else yields an empty map.
pub fn params(value: serde_json::Value) -> Params {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Params::new(),
    }
}
