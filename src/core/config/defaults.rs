//! Effective values: configured settings with built-in defaults filled in.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

use crate::core::config::data::{Config, ProviderConfig};
use crate::fetch::{clamp_timeout, ProviderEndpoint, DEFAULT_REQUEST_TIMEOUT};
use crate::render::theme::DEFAULT_THEME_ID;

pub const DEFAULT_CACHE_TTL_MINUTES: u64 = 30;

/// Parsed API first, then two schema generations of the showcase API, each
/// in Russian then English.
pub fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new(
            "mihomo-ru",
            "https://api.mihomo.me/sr_info_parsed/{uid}?lang=ru",
        ),
        ProviderConfig::new(
            "mihomo-en",
            "https://api.mihomo.me/sr_info_parsed/{uid}?lang=en",
        ),
        ProviderConfig::new("enka-ru", "https://enka.network/api/hsr/uid/{uid}?lang=ru"),
        ProviderConfig::new("enka-en", "https://enka.network/api/hsr/uid/{uid}?lang=en"),
        ProviderConfig::new(
            "enka-legacy-ru",
            "https://enka.network/hsr/api/uid/{uid}?lang=ru",
        ),
        ProviderConfig::new(
            "enka-legacy-en",
            "https://enka.network/hsr/api/uid/{uid}?lang=en",
        ),
    ]
}

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "relicard", "relicard")
}

impl Config {
    pub fn theme_id(&self) -> &str {
        self.theme.as_deref().unwrap_or(DEFAULT_THEME_ID)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(
            self.cache_ttl_minutes
                .unwrap_or(DEFAULT_CACHE_TTL_MINUTES)
                .saturating_mul(60),
        )
    }

    /// Per-request timeout, kept within 6-15 seconds.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .map(Duration::from_secs)
            .map(clamp_timeout)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn provider_endpoints(&self) -> Vec<ProviderEndpoint> {
        let providers = if self.providers.is_empty() {
            default_providers()
        } else {
            self.providers.clone()
        };
        providers
            .into_iter()
            .map(|p| ProviderEndpoint::new(p.name, p.url))
            .collect()
    }

    fn data_subdir(&self, name: &str) -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.data_dir().join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }

    pub fn icon_root_or_default(&self) -> PathBuf {
        self.icon_root
            .clone()
            .unwrap_or_else(|| self.data_subdir("assets"))
    }

    pub fn data_dir_or_default(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| self.data_subdir("gamedata"))
    }

    pub fn cache_dir_or_default(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|dirs| dirs.cache_dir().join("profiles"))
                .unwrap_or_else(|| std::env::temp_dir().join("relicard-profiles"))
        })
    }
}
