use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::{AccessorTable, Params, RuntimeClient};
use crate::error::{ExtensionError, Result};

/// Handler the runtime counterpart runs for a capability request.
pub type CapabilityHandler = Arc<dyn Fn(&Params) -> anyhow::Result<Params> + Send + Sync>;

/// A capability name that can be turned into a `get_<name>` accessor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CapabilityName(String);

impl CapabilityName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let reason = match name.chars().next() {
            None => Some("name is empty"),
            Some(first) if first.is_ascii_digit() => Some("name starts with a digit"),
            Some(_) if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                Some("name may only contain ASCII letters, digits and underscores")
            }
            Some(_) => None,
        };
        match reason {
            Some(reason) => Err(ExtensionError::InvalidCapabilityName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn accessor_name(&self) -> String {
        crate::client::accessor_name(&self.0)
    }
}

impl fmt::Display for CapabilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CapabilityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CapabilityName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CapabilityName {
    type Error = ExtensionError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CapabilityName> for String {
    fn from(value: CapabilityName) -> Self {
        value.0
    }
}

/// Insert-only table of capability handlers with a global namespace.
pub struct CapabilityRegistry {
    handlers: IndexMap<CapabilityName, CapabilityHandler>,
    accessors: AccessorTable,
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("names", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CapabilityRegistry {
    /// Create an empty registry that extends `client`'s accessor surface.
    ///
    /// Registries built on clones of one client share a single namespace.
    pub fn new(client: &RuntimeClient) -> Self {
        Self {
            handlers: IndexMap::new(),
            accessors: client.accessor_table().clone(),
        }
    }

    /// Register `handler` under `name` and expose `get_<name>` on the client.
    ///
    /// Nothing is mutated when the name is invalid or already taken.
    pub fn register<F>(&mut self, name: &str, handler: F) -> Result<CapabilityName>
    where
        F: Fn(&Params) -> anyhow::Result<Params> + Send + Sync + 'static,
    {
        self.register_arc(name, Arc::new(handler))
    }

    pub fn register_arc(
        &mut self,
        name: &str,
        handler: CapabilityHandler,
    ) -> Result<CapabilityName> {
        let name = CapabilityName::new(name)?;
        // The accessor table is shared by every clone of the client, so a
        // registry built on another clone may already own the name.
        if self.handlers.contains_key(&name) || !self.accessors.insert(name.as_str()) {
            warn!(capability = %name, "capability is already defined");
            return Err(ExtensionError::DuplicateCapability {
                name: name.to_string(),
            });
        }

        self.handlers.insert(name.clone(), handler);
        debug!(capability = %name, "registered capability");
        Ok(name)
    }

    /// Handler for `name`, consulted by the runtime counterpart when serving
    /// requests. Extension code reaches capabilities through the client.
    pub fn handler(&self, name: &str) -> Option<&CapabilityHandler> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &CapabilityName> {
        self.handlers.keys()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
