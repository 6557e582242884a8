use std::path::PathBuf;

fn sample_config() -> toml::Table {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("mindmark.toml");
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    toml::from_str(&content).expect("sample configuration should parse")
}

/// The shipped sample configuration must exist next to the manifest
#[test]
fn test_sample_config_exists() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("mindmark.toml");
    assert!(path.exists(), "sample config should exist at {:?}", path);
}

#[test]
fn test_sample_config_sections() {
    let config = sample_config();
    for section in ["backend", "storage", "editor", "layout", "preview", "session"] {
        assert!(config.contains_key(section), "missing [{}] section", section);
    }
}

/// The sample leaves the backend unconfigured so a fresh checkout runs locally
#[test]
fn test_sample_config_is_local_only() {
    let config = sample_config();
    let backend = config["backend"].as_table().unwrap();
    assert!(!backend.contains_key("url"));
    assert!(!backend.contains_key("api_key"));
    assert_eq!(backend["table"].as_str(), Some("mindmaps"));
    assert_eq!(
        config["storage"]["local_path"].as_str(),
        Some("mindmark-local.json")
    );
    assert!(config["session"].get("pin").is_none());
}

#[test]
fn test_sample_config_values() {
    let config = sample_config();
    let debounce = config["editor"]["debounce_ms"].as_integer().unwrap();
    assert!((300..=500).contains(&debounce));
    assert_eq!(config["layout"]["horizontal_spacing"].as_float(), Some(250.0));
    assert_eq!(config["layout"]["vertical_spacing"].as_float(), Some(100.0));
    assert_eq!(config["preview"]["table_of_contents"].as_bool(), Some(true));
    assert_eq!(config["session"]["inactivity_minutes"].as_integer(), Some(15));
    assert_eq!(config["session"]["warning_minutes"].as_integer(), Some(2));
}
