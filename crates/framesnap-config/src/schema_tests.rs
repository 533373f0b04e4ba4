use super::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.browser.endpoint, "http://localhost:9222");
    assert_eq!(config.browser.call_timeout_secs, 30);
    assert!(config.browser.target().is_none());
    assert!(!config.capture.experimental);
    assert!(!config.capture.include_per_frame);
    assert!(config.capture.focus_selector().is_none());
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.file_dir().is_none());
}

#[test]
fn test_call_timeout() {
    let browser = BrowserConfig {
        call_timeout_secs: 5,
        ..Default::default()
    };
    assert_eq!(browser.call_timeout(), Duration::from_secs(5));
}

#[test]
fn test_blank_strings_are_unset() {
    let browser = BrowserConfig {
        target: "   ".to_string(),
        ..Default::default()
    };
    assert!(browser.target().is_none());

    let capture = CaptureConfig {
        focus_selector: " #main ".to_string(),
        ..Default::default()
    };
    assert_eq!(capture.focus_selector(), Some("#main"));
}

#[test]
fn test_log_dir_expands_tilde() {
    let logging = LoggingConfig {
        file_dir: "~/logs".to_string(),
        ..Default::default()
    };
    let dir = logging.file_dir().unwrap();
    assert!(!dir.to_string_lossy().starts_with('~'));
    assert!(dir.ends_with("logs"));
}

#[test]
fn test_config_roundtrip_toml() {
    let mut config = Config::default();
    config.browser.target = "checkout".to_string();
    config.capture.experimental = true;

    let text = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();

    assert_eq!(parsed.browser.target, "checkout");
    assert!(parsed.capture.experimental);
    assert_eq!(parsed.logging.level, "info");
}
