//! Configuration resolution tests
//!
//! Tests touching credential environment variables run with #[serial].

use planit_common::config::{load_toml_config, TomlConfig};
use planit_locate::config::{FusionConfig, ServiceConfig, DEFAULT_MAX_BODY_BYTES};
use serial_test::serial;
use std::env;
use std::io::Write;

const CREDENTIAL_VARS: &[&str] = &[
    "GOOGLE_GEMINI_API_KEY",
    "GOOGLE_PLACES_API_KEY",
    "GOOGLE_SERVER_API_KEY",
    "MAPTILER_API_KEY",
];

fn clear_env() {
    for var in CREDENTIAL_VARS {
        env::remove_var(var);
    }
}

fn toml_with_keys() -> TomlConfig {
    TomlConfig {
        gemini_api_key: Some("toml-gemini".to_string()),
        places_api_key: Some("toml-places".to_string()),
        maptiler_api_key: Some("toml-tiles".to_string()),
        ..Default::default()
    }
}

#[test]
#[serial]
fn test_no_credentials_anywhere() {
    clear_env();

    let config = FusionConfig::from_toml(&TomlConfig::default());

    assert!(config.recognition_api_key.is_none());
    assert!(config.search_api_key.is_none());
}

#[test]
#[serial]
fn test_environment_beats_toml() {
    clear_env();
    env::set_var("GOOGLE_GEMINI_API_KEY", "env-gemini");

    let config = FusionConfig::from_toml(&toml_with_keys());

    assert_eq!(config.recognition_api_key.as_deref(), Some("env-gemini"));
    assert_eq!(config.search_api_key.as_deref(), Some("toml-places"));

    clear_env();
}

#[test]
#[serial]
fn test_server_key_serves_both_oracles() {
    clear_env();
    env::set_var("GOOGLE_SERVER_API_KEY", "shared");

    let config = FusionConfig::from_toml(&TomlConfig::default());

    assert_eq!(config.recognition_api_key.as_deref(), Some("shared"));
    assert_eq!(config.search_api_key.as_deref(), Some("shared"));

    clear_env();
}

#[test]
#[serial]
fn test_places_falls_back_to_gemini_key() {
    clear_env();

    let toml = TomlConfig {
        gemini_api_key: Some("only-gemini".to_string()),
        ..Default::default()
    };
    let config = FusionConfig::from_toml(&toml);

    assert_eq!(config.search_api_key.as_deref(), Some("only-gemini"));
}

#[test]
#[serial]
fn test_blank_environment_value_ignored() {
    clear_env();
    env::set_var("GOOGLE_GEMINI_API_KEY", "   ");

    let config = FusionConfig::from_toml(&toml_with_keys());

    assert_eq!(config.recognition_api_key.as_deref(), Some("toml-gemini"));

    clear_env();
}

#[test]
#[serial]
fn test_service_config_priority() {
    clear_env();

    let toml = TomlConfig {
        port: Some(6000),
        bind_address: Some("127.0.0.1".to_string()),
        ..toml_with_keys()
    };

    let from_cli = ServiceConfig::resolve(Some(7000), Some("::1".to_string()), &toml);
    assert_eq!(from_cli.port, 7000);
    assert_eq!(from_cli.bind_address, "::1");

    let from_toml = ServiceConfig::resolve(None, None, &toml);
    assert_eq!(from_toml.port, 6000);
    assert_eq!(from_toml.bind_address, "127.0.0.1");
    assert_eq!(from_toml.maptiler_api_key.as_deref(), Some("toml-tiles"));

    let defaults = ServiceConfig::resolve(None, None, &TomlConfig::default());
    assert_eq!(defaults.port, 5000);
    assert_eq!(defaults.bind_address, "0.0.0.0");
    assert_eq!(defaults.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    assert_eq!(defaults.fusion.max_image_bytes, DEFAULT_MAX_BODY_BYTES);
    assert!(defaults.maptiler_api_key.is_none());
}

#[test]
#[serial]
fn test_toml_file_drives_fusion_config() {
    clear_env();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
server_api_key = "file-shared"
max_body_bytes = 2097152

[location]
model = "gemini-1.5-pro"
place_types = ["point_of_interest", "establishment"]
search_confidence_ceiling = 0.9
"#
    )
    .unwrap();

    let toml = load_toml_config(file.path()).unwrap();
    let service = ServiceConfig::resolve(None, None, &toml);
    let fusion = &service.fusion;

    assert_eq!(fusion.recognition_api_key.as_deref(), Some("file-shared"));
    assert_eq!(fusion.search_api_key.as_deref(), Some("file-shared"));
    assert_eq!(fusion.recognition_model, "gemini-1.5-pro");
    assert_eq!(fusion.place_types, vec!["point_of_interest", "establishment"]);
    assert_eq!(fusion.scoring.search_confidence_ceiling, 0.9);
    assert_eq!(service.max_body_bytes, 2_097_152);
    assert_eq!(fusion.max_image_bytes, 2_097_152, "remote images share the body ceiling");
}
