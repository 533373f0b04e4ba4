use super::*;

#[test]
fn test_validate_default_config() {
    let result = ConfigValidator::validate(&Config::default());
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_empty_endpoint() {
    let mut config = Config::default();
    config.browser.endpoint = String::new();

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "browser.endpoint"));
}

#[test]
fn test_validate_endpoint_scheme() {
    let mut config = Config::default();
    config.browser.endpoint = "localhost:9222".to_string();
    assert!(!ConfigValidator::validate(&config).is_valid());

    config.browser.endpoint = "ws://127.0.0.1:9222/devtools/browser/abc".to_string();
    assert!(ConfigValidator::validate(&config).is_valid());
}

#[test]
fn test_validate_zero_timeout() {
    let mut config = Config::default();
    config.browser.call_timeout_secs = 0;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    let err = result.into_error().unwrap();
    assert!(err.to_string().contains("browser.call_timeout_secs"));
}

#[test]
fn test_validate_high_timeout_warning() {
    let mut config = Config::default();
    config.browser.call_timeout_secs = 3600;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_validate_scoped_per_frame_warning() {
    let mut config = Config::default();
    config.capture.focus_selector = "#login".to_string();
    config.capture.include_per_frame = true;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "capture.include_per_frame"));
}

#[test]
fn test_validate_log_level() {
    let mut config = Config::default();
    config.logging.level = "verbose".to_string();
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "logging.level"));

    config.logging.level = "framesnap_core=debug,info".to_string();
    assert!(ConfigValidator::validate(&config).warnings.is_empty());

    config.logging.level = "WARN".to_string();
    assert!(ConfigValidator::validate(&config).warnings.is_empty());

    config.logging.level = " ".to_string();
    assert!(!ConfigValidator::validate(&config).is_valid());
}

#[test]
fn test_into_error_none_when_valid() {
    assert!(ConfigValidator::validate(&Config::default()).into_error().is_none());
}
