//! Router configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Configuration for a [`Router`](crate::Router)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Name of the state module holding the router state
    pub module_name: String,

    /// Maximum number of routes on a chain, root and leaf included
    pub max_depth: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            module_name: "router".to_string(),
            max_depth: 32,
        }
    }
}

impl RouterConfig {
    /// Parse a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
