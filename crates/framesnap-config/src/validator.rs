//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// First error as a [`ConfigError`], if any.
    pub fn into_error(self) -> Option<ConfigError> {
        self.errors.into_iter().next().map(|e| ConfigError::InvalidValue {
            field: e.path,
            message: e.message,
        })
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();
        Self::validate_browser(config, &mut result);
        Self::validate_capture(config, &mut result);
        Self::validate_logging(config, &mut result);
        result
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        let endpoint = config.browser.endpoint.as_str();
        if endpoint.is_empty() {
            result.add_error(ValidationError::new(
                "browser.endpoint",
                "Endpoint cannot be empty",
            ));
        } else if !["http://", "https://", "ws://", "wss://"]
            .iter()
            .any(|scheme| endpoint.starts_with(scheme))
        {
            result.add_error(ValidationError::new(
                "browser.endpoint",
                "endpoint must start with http://, https://, ws:// or wss://",
            ));
        }

        if config.browser.call_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "browser.call_timeout_secs",
                "call_timeout_secs must be greater than 0",
            ));
        } else if config.browser.call_timeout_secs > 600 {
            result.add_warning(ValidationWarning::new(
                "browser.call_timeout_secs",
                "call_timeout_secs is very high (>600), a hung frame will stall the capture",
            ));
        }
    }

    fn validate_capture(config: &Config, result: &mut ValidationResult) {
        if config.capture.focus_selector().is_some() && config.capture.include_per_frame {
            result.add_warning(ValidationWarning::new(
                "capture.include_per_frame",
                "a scoped capture returns at most one per-frame outline",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        // a full filter directive such as "framesnap=debug,info" is accepted as is
        let level = config.logging.level.trim();
        if level.is_empty() {
            result.add_error(ValidationError::new("logging.level", "level cannot be empty"));
        } else if !level.contains('=') && !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            result.add_warning(ValidationWarning::new(
                "logging.level",
                format!("Unknown log level '{}', valid values: {:?}", level, LOG_LEVELS),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
