use super::*;
use std::fs;

use crate::error::ExpandError;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.trigger_key, " ");
    assert_eq!(config.lookback_chars, DEFAULT_LOOKBACK_CHARS);
    assert_eq!(config.flat_input_types, vec!["text", "search", "url"]);
    assert_eq!(config.templates_path, DEFAULT_TEMPLATES_PATH);
}

#[test]
fn test_empty_object_takes_all_defaults() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_config_uses_camel_case() {
    let json = r#"{"triggerKey": "Tab", "lookbackChars": 50}"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.trigger_key, "Tab");
    assert_eq!(config.lookback_chars, 50);
    assert_eq!(config.flat_input_types, Config::default().flat_input_types);
}

#[test]
fn test_config_serialization() {
    let config = Config {
        trigger_key: "Enter".to_string(),
        lookback_chars: 80,
        flat_input_types: vec!["text".to_string(), "email".to_string()],
        templates_path: "/tmp/templates.json".to_string(),
    };

    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"flatInputTypes\""));
    assert!(json.contains("\"templatesPath\""));

    let deserialized: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, config);
}

#[test]
fn test_templates_path_expands_tilde() {
    let config = Config::default();
    let path = config.templates_path();
    assert!(!path.to_string_lossy().starts_with('~'));
    assert!(path.ends_with(".hash-expand/templates.json"));
}

#[test]
fn test_absolute_templates_path_is_unchanged() {
    let config = Config {
        templates_path: "/srv/templates.json".to_string(),
        ..Config::default()
    };
    assert_eq!(
        config.templates_path(),
        std::path::PathBuf::from("/srv/templates.json")
    );
}

#[test]
fn test_expansion_settings_lowercases_input_types() {
    let config = Config {
        trigger_key: "Tab".to_string(),
        lookback_chars: 32,
        flat_input_types: vec!["TEXT".to_string(), "Email".to_string()],
        ..Config::default()
    };
    let settings = config.expansion_settings();
    assert_eq!(settings.trigger_key, "Tab");
    assert_eq!(settings.lookback, 32);
    assert_eq!(settings.flat_input_types, vec!["text", "email"]);
}

#[test]
fn test_default_settings_match_engine_defaults() {
    assert_eq!(
        Config::default().expansion_settings(),
        crate::expand::ExpansionSettings::default()
    );
}

#[test]
fn test_validate_rejects_zero_lookback() {
    let config = Config {
        lookback_chars: 0,
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(ExpandError::Config(_))));
}

#[test]
fn test_validate_rejects_empty_trigger_key() {
    let config = Config {
        trigger_key: String::new(),
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(ExpandError::Config(_))));
}

// ============================================
// LOADER
// ============================================

#[test]
fn test_load_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"lookbackChars": 120, "flatInputTypes": ["text"]}"#).unwrap();

    let config = load_config_from(&path).unwrap();
    assert_eq!(config.lookback_chars, 120);
    assert_eq!(config.flat_input_types, vec!["text"]);
    assert_eq!(config.trigger_key, DEFAULT_TRIGGER_KEY);
}

#[test]
fn test_load_config_from_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config_from(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, ExpandError::Io { .. }));
}

#[test]
fn test_load_config_from_malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ lookbackChars: 1").unwrap();
    let err = load_config_from(&path).unwrap_err();
    assert!(matches!(err, ExpandError::Parse { .. }));
}

#[test]
fn test_load_config_from_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"lookbackChars": 0}"#).unwrap();
    let err = load_config_from(&path).unwrap_err();
    assert!(matches!(err, ExpandError::Config(_)));
}

#[test]
fn test_load_config_at_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let missing = load_config_at(&dir.path().join("missing.json"));
    assert_eq!(missing, Config::default());

    let path = dir.path().join("config.json");
    fs::write(&path, "not json").unwrap();
    assert_eq!(load_config_at(&path), Config::default());
}

#[test]
fn test_load_config_at_reads_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"triggerKey": "Tab"}"#).unwrap();
    assert_eq!(load_config_at(&path).trigger_key, "Tab");
}
