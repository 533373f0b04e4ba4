//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Browser connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// DevTools HTTP endpoint or a `ws://` browser URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Timeout for a single protocol call.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Page target id or URL substring. Empty selects the first page.
    #[serde(default)]
    pub target: String,
}

impl BrowserConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn target(&self) -> Option<&str> {
        non_empty(&self.target)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            call_timeout_secs: default_call_timeout_secs(),
            target: String::new(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_call_timeout_secs() -> u64 {
    30
}

/// Capture defaults, overridable per invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default)]
    pub experimental: bool,

    #[serde(default)]
    pub include_per_frame: bool,

    /// Empty runs a full capture.
    #[serde(default)]
    pub focus_selector: String,
}

impl CaptureConfig {
    pub fn focus_selector(&self) -> Option<&str> {
        non_empty(&self.focus_selector)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for daily rolling log files. Empty logs to the console only.
    #[serde(default)]
    pub file_dir: String,
}

impl LoggingConfig {
    pub fn file_dir(&self) -> Option<PathBuf> {
        non_empty(&self.file_dir).map(|dir| PathBuf::from(shellexpand::tilde(dir).as_ref()))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_dir: String::new(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
