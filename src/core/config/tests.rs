use super::data::{path_display, Config, CustomTheme, ProviderConfig};
use super::defaults::{default_providers, DEFAULT_CACHE_TTL_MINUTES};
use super::io::ConfigError;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn missing_file_yields_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = Config::load_from_path(&temp_dir.path().join("absent.toml")).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.theme_id(), "optimizer-purple");
    assert_eq!(
        config.cache_ttl(),
        Duration::from_secs(DEFAULT_CACHE_TTL_MINUTES * 60)
    );
    assert_eq!(config.request_timeout(), Duration::from_secs(10));
}

#[test]
fn default_provider_list_is_ordered() {
    let endpoints = Config::default().provider_endpoints();
    assert_eq!(endpoints.len(), 6);
    assert!(endpoints[0].url_template.contains("sr_info_parsed"));
    assert!(endpoints[0].url_template.ends_with("lang=ru"));
    assert!(endpoints[1].url_template.ends_with("lang=en"));
    assert!(endpoints
        .iter()
        .all(|e| e.url_template.contains("{uid}")));
    assert_eq!(default_providers().len(), 6);
}

#[test]
fn configured_providers_replace_defaults() {
    let config = Config {
        providers: vec![ProviderConfig::new("local", "http://127.0.0.1:9000/{uid}")],
        ..Default::default()
    };
    let endpoints = config.provider_endpoints();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].name, "local");
}

#[test]
fn timeout_is_clamped_into_window() {
    let low = Config {
        request_timeout_secs: Some(1),
        ..Default::default()
    };
    let high = Config {
        request_timeout_secs: Some(120),
        ..Default::default()
    };
    assert_eq!(low.request_timeout(), Duration::from_secs(6));
    assert_eq!(high.request_timeout(), Duration::from_secs(15));
}

#[test]
fn save_and_reload_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");
    let config = Config {
        theme: Some("midnight".to_string()),
        icon_root: Some(PathBuf::from("/srv/relicard/icons")),
        cache_ttl_minutes: Some(5),
        custom_themes: vec![CustomTheme {
            id: "neon".to_string(),
            display_name: "Neon".to_string(),
            base: Some("midnight".to_string()),
            accent: Some("#39FF14".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    };
    config.save_to_path(&config_path).expect("save failed");

    let loaded = Config::load_from_path(&config_path).expect("load failed");
    assert_eq!(loaded, config);
    assert_eq!(loaded.cache_ttl(), Duration::from_secs(300));
    assert!(loaded.get_custom_theme("NEON").is_some());
    assert_eq!(loaded.list_custom_themes().len(), 1);
}

#[test]
fn parses_hand_written_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r##"
theme = "neon"
request_timeout_secs = 8

[[providers]]
name = "mirror"
url = "https://mirror.example/{uid}"

[[custom_themes]]
id = "neon"
display_name = "Neon"
accent = "#39FF14"
"##,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).unwrap();
    assert_eq!(config.theme_id(), "neon");
    assert_eq!(config.request_timeout(), Duration::from_secs(8));
    assert_eq!(config.providers[0].name, "mirror");
    assert_eq!(
        config.custom_themes[0].accent.as_deref(),
        Some("#39FF14")
    );
}

#[test]
fn invalid_toml_reports_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "theme = [").unwrap();
    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("Failed to parse config"));
}

#[test]
fn mutate_at_persists_changes() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    Config::mutate_at(&config_path, |config| {
        config.cache_ttl_minutes = Some(45);
        Ok(())
    })
    .unwrap();
    let loaded = Config::load_from_path(&config_path).unwrap();
    assert_eq!(loaded.cache_ttl_minutes, Some(45));
}

#[test]
fn explicit_path_wins() {
    let explicit = PathBuf::from("/tmp/explicit.toml");
    assert_eq!(Config::resolve_path(Some(&explicit)), explicit);
}

#[cfg(unix)]
#[test]
fn path_display_shortens_home() {
    if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home).join(".config/relicard/config.toml");
        assert_eq!(path_display(&path), "~/.config/relicard/config.toml");
    }
}
