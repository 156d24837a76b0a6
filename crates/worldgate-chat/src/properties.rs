//! Read-only property lookups for feature flags and settings.
//!
//! The surrounding service owns configuration; this core only asks
//! questions. A missing or empty value always means "feature disabled",
//! never an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Property key: is the external chat relay enabled at all?
pub const RELAY_ENABLED: &str = "chat.relay_enabled";
/// Property key: where the external chat relay delivers to.
pub const RELAY_ENDPOINT: &str = "chat.relay_endpoint";

/// Read-only key lookups for feature flags and settings.
pub trait PropertySource: Send + Sync + 'static {
    /// Looks up a boolean flag. `None` means unset.
    fn bool_value(&self, key: &str) -> Option<bool>;

    /// Looks up a string setting. `None` means unset.
    fn string_value(&self, key: &str) -> Option<String>;
}

/// An in-memory property map, deserializable from a settings file.
///
/// Production wires the live property store in; tests and tools load one
/// of these from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticProperties {
    #[serde(default)]
    bools: HashMap<String, bool>,
    #[serde(default)]
    strings: HashMap<String, String>,
}

impl StaticProperties {
    /// Creates an empty map (every feature disabled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a settings document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets a boolean flag. Builder-style.
    pub fn with_bool(mut self, key: impl Into<String>, value: bool) -> Self {
        self.bools.insert(key.into(), value);
        self
    }

    /// Sets a string setting. Builder-style.
    pub fn with_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.strings.insert(key.into(), value.into());
        self
    }
}

impl PropertySource for StaticProperties {
    fn bool_value(&self, key: &str) -> Option<bool> {
        self.bools.get(key).copied()
    }

    fn string_value(&self, key: &str) -> Option<String> {
        self.strings.get(key).cloned()
    }
}
