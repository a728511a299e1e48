//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Environment overrides are covered in `config_env_test.rs`, which runs as its
//! own process so it cannot leak variables into these tests.

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use hierarchy_closure::{ApplicationError, ClosureEngine, Key, Settings};

#[test]
fn given_no_config_file_when_loading_then_uses_defaults() {
    let settings = Settings::load(None).expect("load defaults");
    assert!(settings.build.parallel);
    assert_eq!(settings.build.parallel_threshold, 512);
}

#[test]
fn given_partial_config_file_when_loading_then_overrides_only_given_keys() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hierarchy.toml");
    fs::write(&path, "[build]\nparallel_threshold = 2\n").unwrap();

    // Act
    let settings = Settings::load(Some(&path)).expect("load settings");

    // Assert
    assert!(settings.build.parallel, "unspecified key keeps its default");
    assert_eq!(settings.build.parallel_threshold, 2);
}

#[test]
fn given_missing_config_file_when_loading_then_config_error() {
    let dir = TempDir::new().unwrap();
    let result = Settings::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_malformed_config_file_when_loading_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[build]\nparallel = \"sometimes\"\n").unwrap();

    let err = Settings::load(Some(&path)).unwrap_err();
    assert!(err.to_string().starts_with("config error: parse"));
}

#[test]
fn given_loaded_settings_when_building_engine_then_results_unchanged() {
    // Arrange: force the parallel path for a tiny table
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hierarchy.toml");
    fs::write(&path, "[build]\nparallel = true\nparallel_threshold = 1\n").unwrap();
    let settings = Settings::load(Some(&path)).unwrap();

    // Act
    let engine = ClosureEngine::builder()
        .branches(["ancestor"])
        .entries([(6, json!({"ancestor": 8})), (8, json!({"ancestor": 1}))])
        .settings(settings.build)
        .build()
        .unwrap();

    // Assert
    let ancestors = engine.related_by("ancestor", [6]).unwrap();
    assert_eq!(
        ancestors.into_iter().collect::<Vec<_>>(),
        vec![Key::from(1), Key::from(8)]
    );
}
