use serde::{Deserialize, Serialize};

/// Which filters to switch on or off relative to their defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    /// Filters to activate even though they are off by default.
    pub enable: Vec<String>,
    /// Filters to deactivate even though they are on by default.
    /// Critical filters cannot be listed here.
    pub disable: Vec<String>,
}

impl FilterSelection {
    /// Keep every filter at its default.
    pub fn defaults() -> Self {
        Self::default()
    }

    pub fn enabling(mut self, name: impl Into<String>) -> Self {
        self.enable.push(name.into());
        self
    }

    pub fn disabling(mut self, name: impl Into<String>) -> Self {
        self.disable.push(name.into());
        self
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enable.iter().any(|n| n == name)
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disable.iter().any(|n| n == name)
    }
}
