use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What happens to the rest of a phase when one of its hooks fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookFailurePolicy {
    /// Stop the phase at the first failure and return its error.
    #[default]
    FailFast,
    /// Run every hook in the phase and report the failures afterwards.
    ContinueOnError,
}

/// Host-side settings for an [`crate::ExtensionRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Framework name printed in discovery notifications.
    pub framework_name: String,
    pub hook_failure_policy: HookFailurePolicy,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            framework_name: "ruby-lsp-rails".to_string(),
            hook_failure_policy: HookFailurePolicy::default(),
        }
    }
}

impl HostConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    pub fn with_framework_name(mut self, name: impl Into<String>) -> Self {
        self.framework_name = name.into();
        self
    }

    pub fn with_hook_failure_policy(mut self, policy: HookFailurePolicy) -> Self {
        self.hook_failure_policy = policy;
        self
    }
}
