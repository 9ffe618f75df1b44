//! Settings management for CLI set/unset commands.
//!
//! Each key has a [`SettingHandler`]; the registry keeps them in display
//! order for `relicard set` with no arguments.

pub mod error;
pub mod handlers;

use std::collections::HashMap;

pub use error::SettingError;

use crate::core::config::data::Config;
use handlers::{
    cache_dir_handler, cache_ttl_handler, data_dir_handler, icon_root_handler, timeout_handler,
    ThemeHandler,
};

/// Trait for handling a configuration setting.
pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Apply `args` to `config`, returning a success message.
    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError>;

    /// Clear the value, returning a success message.
    fn unset(&self, config: &mut Config) -> String;

    /// Format the current value for display in `relicard set` output.
    fn format(&self, config: &Config) -> String;
}

/// Registry of all available setting handlers.
pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        registry.register(Box::new(ThemeHandler));
        registry.register(Box::new(icon_root_handler()));
        registry.register(Box::new(data_dir_handler()));
        registry.register(Box::new(cache_dir_handler()));
        registry.register(Box::new(cache_ttl_handler()));
        registry.register(Box::new(timeout_handler()));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    pub fn get(&self, key: &str) -> Result<&dyn SettingHandler, SettingError> {
        self.handlers
            .get(key)
            .map(|h| h.as_ref())
            .ok_or_else(|| SettingError::UnknownKey(key.to_string()))
    }

    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }

    /// One line per key, in display order.
    pub fn describe(&self, config: &Config) -> Vec<String> {
        self.display_order
            .iter()
            .filter_map(|key| self.handlers.get(key))
            .map(|handler| handler.format(config))
            .collect()
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
