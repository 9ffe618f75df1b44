//! Handlers for the `set`/`unset` keys.

use std::path::PathBuf;

use crate::cli::settings::error::SettingError;
use crate::cli::settings::SettingHandler;
use crate::core::config::data::{path_display, Config};
use crate::render::theme::{find_builtin_theme, DEFAULT_THEME_ID};

pub struct ThemeHandler;

impl SettingHandler for ThemeHandler {
    fn key(&self) -> &'static str {
        "theme"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let Some(input) = args.first().map(|s| s.trim()).filter(|s| !s.is_empty()) else {
            return Err(SettingError::MissingValue {
                key: "theme",
                example: "relicard set theme midnight",
            });
        };
        let id = if let Some(custom) = config.get_custom_theme(input) {
            custom.id.clone()
        } else if let Some(builtin) = find_builtin_theme(input) {
            builtin.id
        } else {
            return Err(SettingError::UnknownTheme(input.to_string()));
        };
        config.theme = Some(id.clone());
        Ok(format!("✅ Set theme to: {id}"))
    }

    fn unset(&self, config: &mut Config) -> String {
        config.theme = None;
        format!("✅ Unset theme (will use default: {DEFAULT_THEME_ID})")
    }

    fn format(&self, config: &Config) -> String {
        match &config.theme {
            Some(theme) => format!("  theme: {theme}"),
            None => format!("  theme: (unset, default: {DEFAULT_THEME_ID})"),
        }
    }
}

/// Data-driven handler for directory settings.
pub struct PathHandler {
    key: &'static str,
    example: &'static str,
    get: fn(&Config) -> Option<&PathBuf>,
    set_field: fn(&mut Config, Option<PathBuf>),
    default: fn(&Config) -> PathBuf,
}

impl SettingHandler for PathHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingValue {
                key: self.key,
                example: self.example,
            });
        }
        let path = PathBuf::from(args.join(" "));
        let display = path_display(&path);
        (self.set_field)(config, Some(path));
        Ok(format!("✅ Set {} to: {}", self.key, display))
    }

    fn unset(&self, config: &mut Config) -> String {
        (self.set_field)(config, None);
        format!(
            "✅ Unset {} (will use default: {})",
            self.key,
            path_display((self.default)(config))
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(path) => format!("  {}: {}", self.key, path_display(path)),
            None => format!(
                "  {}: (unset, default: {})",
                self.key,
                path_display((self.default)(config))
            ),
        }
    }
}

pub fn icon_root_handler() -> PathHandler {
    PathHandler {
        key: "icon-root",
        example: "relicard set icon-root ~/relicard/assets",
        get: |c| c.icon_root.as_ref(),
        set_field: |c, v| c.icon_root = v,
        default: Config::icon_root_or_default,
    }
}

pub fn data_dir_handler() -> PathHandler {
    PathHandler {
        key: "data-dir",
        example: "relicard set data-dir ~/StarRailRes/index_min/en",
        get: |c| c.data_dir.as_ref(),
        set_field: |c, v| c.data_dir = v,
        default: Config::data_dir_or_default,
    }
}

pub fn cache_dir_handler() -> PathHandler {
    PathHandler {
        key: "cache-dir",
        example: "relicard set cache-dir /var/cache/relicard",
        get: |c| c.cache_dir.as_ref(),
        set_field: |c, v| c.cache_dir = v,
        default: Config::cache_dir_or_default,
    }
}

/// Data-driven handler for bounded integer settings.
pub struct NumberHandler {
    key: &'static str,
    unit: &'static str,
    example: &'static str,
    min: u64,
    max: u64,
    default_display: &'static str,
    get: fn(&Config) -> Option<u64>,
    set_field: fn(&mut Config, Option<u64>),
}

impl SettingHandler for NumberHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let Some(input) = args.first() else {
            return Err(SettingError::MissingValue {
                key: self.key,
                example: self.example,
            });
        };
        let value = input
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|v| (self.min..=self.max).contains(v))
            .ok_or_else(|| SettingError::OutOfRange {
                key: self.key,
                input: input.clone(),
                min: self.min,
                max: self.max,
            })?;
        (self.set_field)(config, Some(value));
        Ok(format!("✅ Set {} to: {} {}", self.key, value, self.unit))
    }

    fn unset(&self, config: &mut Config) -> String {
        (self.set_field)(config, None);
        format!(
            "✅ Unset {} (will use default: {})",
            self.key, self.default_display
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {} {}", self.key, value, self.unit),
            None => format!("  {}: (unset, default: {})", self.key, self.default_display),
        }
    }
}

pub fn cache_ttl_handler() -> NumberHandler {
    NumberHandler {
        key: "cache-ttl",
        unit: "minutes",
        example: "relicard set cache-ttl 30",
        min: 0,
        max: 24 * 60,
        default_display: "30 minutes",
        get: |c| c.cache_ttl_minutes,
        set_field: |c, v| c.cache_ttl_minutes = v,
    }
}

pub fn timeout_handler() -> NumberHandler {
    NumberHandler {
        key: "timeout",
        unit: "seconds",
        example: "relicard set timeout 10",
        min: 6,
        max: 15,
        default_display: "10 seconds",
        get: |c| c.request_timeout_secs,
        set_field: |c, v| c.request_timeout_secs = v,
    }
}
