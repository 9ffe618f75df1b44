use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One entry of the ordered provider list. `url` contains `{uid}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub name: String,
    pub url: String,
}

impl ProviderConfig {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// Colour overrides on top of a built-in card theme.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct CustomTheme {
    pub id: String,
    pub display_name: String,
    /// Built-in theme to inherit from.
    pub base: Option<String>,
    pub background_top: Option<String>,
    pub background_bottom: Option<String>,
    pub panel: Option<String>,
    pub panel_border: Option<String>,
    pub text_primary: Option<String>,
    pub text_secondary: Option<String>,
    pub accent: Option<String>,
    pub placeholder: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Card theme id (e.g., "optimizer-purple", "midnight")
    pub theme: Option<String>,
    /// Root of the pre-downloaded icon and portrait files
    pub icon_root: Option<PathBuf>,
    /// Directory holding the static game database JSON files
    pub data_dir: Option<PathBuf>,
    /// Directory for cached provider responses
    pub cache_dir: Option<PathBuf>,
    pub cache_ttl_minutes: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    /// Provider templates in priority order; empty means the built-in list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<ProviderConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_themes: Vec<CustomTheme>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths under the home directory to `~` notation on Unix-like systems
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn get_custom_theme(&self, id: &str) -> Option<&CustomTheme> {
        self.custom_themes
            .iter()
            .find(|t| t.id.eq_ignore_ascii_case(id))
    }

    pub fn list_custom_themes(&self) -> Vec<&CustomTheme> {
        self.custom_themes.iter().collect()
    }
}
