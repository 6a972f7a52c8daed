use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, TransportError};

/// Named parameters of a request, and named values of its response.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Prefix of every synthesised accessor name.
pub const ACCESSOR_PREFIX: &str = "get_";

/// Build the accessor name for a capability, e.g. `widgets` -> `get_widgets`.
pub fn accessor_name(capability: &str) -> String {
    format!("{ACCESSOR_PREFIX}{capability}")
}

/// A single request sent to the external runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRequest {
    pub capability: String,
    #[serde(default)]
    pub params: Params,
}

/// Blocking request/response channel to the out-of-process runtime.
pub trait RuntimeTransport: Send + Sync {
    fn make_request(&self, request: &CapabilityRequest) -> Result<Params, TransportError>;
}

/// Accessor name -> capability name. Only ever grows.
#[derive(Debug, Clone, Default)]
pub(crate) struct AccessorTable {
    entries: Arc<RwLock<IndexMap<String, String>>>,
}

impl AccessorTable {
    /// Add the accessor for `capability`. Returns `false`, leaving the table
    /// unchanged, when the accessor already exists.
    pub(crate) fn insert(&self, capability: &str) -> bool {
        let accessor = accessor_name(capability);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&accessor) {
            return false;
        }
        debug!(%accessor, capability, "synthesised runtime accessor");
        entries.insert(accessor, capability.to_string());
        true
    }

    fn resolve(&self, accessor: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(accessor)
            .cloned()
    }

    fn names(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

/// Handle to the connection with the external runtime.
///
/// Clones share both the transport and the accessor surface, so a clone
/// captured by a hook sees accessors for capabilities registered after it
/// was taken.
#[derive(Clone)]
pub struct RuntimeClient {
    transport: Arc<dyn RuntimeTransport>,
    accessors: AccessorTable,
}

impl fmt::Debug for RuntimeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeClient")
            .field("accessors", &self.accessor_names())
            .finish_non_exhaustive()
    }
}

impl RuntimeClient {
    pub fn new(transport: impl RuntimeTransport + 'static) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<dyn RuntimeTransport>) -> Self {
        Self {
            transport,
            accessors: AccessorTable::default(),
        }
    }

    pub(crate) fn accessor_table(&self) -> &AccessorTable {
        &self.accessors
    }

    /// Send `capability` with `params` and return the runtime's response as-is.
    ///
    /// The capability does not have to be declared in this process; the
    /// runtime decides whether it knows the name.
    pub fn invoke(&self, capability: &str, params: Params) -> Result<Params, ClientError> {
        let request = CapabilityRequest {
            capability: capability.to_string(),
            params,
        };
        self.transport
            .make_request(&request)
            .map_err(|source| ClientError::Transport {
                capability: request.capability,
                source,
            })
    }

    /// Look up a synthesised accessor such as `get_widgets`.
    pub fn accessor(&self, name: &str) -> Option<CapabilityAccessor> {
        self.accessors
            .resolve(name)
            .map(|capability| CapabilityAccessor {
                name: name.to_string(),
                capability,
                client: self.clone(),
            })
    }

    /// Call a synthesised accessor by name.
    pub fn call(&self, accessor: &str, params: Params) -> Result<Params, ClientError> {
        let capability = self
            .accessors
            .resolve(accessor)
            .ok_or_else(|| ClientError::UnknownAccessor(accessor.to_string()))?;
        self.invoke(&capability, params)
    }

    pub fn has_accessor(&self, name: &str) -> bool {
        self.accessors.resolve(name).is_some()
    }

    /// Current accessor surface, in registration order.
    pub fn accessor_names(&self) -> Vec<String> {
        self.accessors.names()
    }
}

/// A forwarding accessor bound to one capability.
#[derive(Debug, Clone)]
pub struct CapabilityAccessor {
    name: String,
    capability: String,
    client: RuntimeClient,
}

impl CapabilityAccessor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub fn call(&self, params: Params) -> Result<Params, ClientError> {
        self.client.invoke(&self.capability, params)
    }
}

/// Generate a trait of typed `get_<name>` wrappers over [`RuntimeClient::invoke`].
///
/// ```ignore
/// capability_accessors! {
///     pub trait RailsAccessors {
///         get_models => "models",
///         get_routes => "routes",
///     }
/// }
/// let models = client.get_models(params)?;
/// ```
#[macro_export]
macro_rules! capability_accessors {
    ($vis:vis trait $name:ident { $($accessor:ident => $capability:literal),* $(,)? }) => {
        $vis trait $name {
            $(
                fn $accessor(
                    &self,
                    params: $crate::Params,
                ) -> ::std::result::Result<$crate::Params, $crate::ClientError>;
            )*
        }

        impl $name for $crate::RuntimeClient {
            $(
                fn $accessor(
                    &self,
                    params: $crate::Params,
                ) -> ::std::result::Result<$crate::Params, $crate::ClientError> {
                    self.invoke($capability, params)
                }
            )*
        }
    };
}
