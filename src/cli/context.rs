//! Wiring from configuration to a ready [`CardService`].

use std::error::Error;
use std::sync::Arc;

use tracing::debug;

use crate::assets::AssetResolver;
use crate::core::config::data::{path_display, Config};
use crate::fetch::cache::ProfileCache;
use crate::fetch::ProfileFetcher;
use crate::gamedata::StaticGameDatabase;
use crate::normalize::Normalizer;
use crate::render::theme::resolve_theme_or_default;
use crate::service::CardService;

pub fn profile_cache(config: &Config) -> ProfileCache {
    ProfileCache::new(config.cache_dir_or_default(), config.cache_ttl())
}

/// Build the service described by `config`. `theme_override` wins over the
/// configured theme.
pub fn build_service(config: &Config, theme_override: Option<&str>) -> Result<CardService, Box<dyn Error>> {
    let data_dir = config.data_dir_or_default();
    let db = StaticGameDatabase::load_dir_or_empty(&data_dir);
    debug!(data_dir = %path_display(&data_dir), empty = db.is_empty(), "Loaded static game database");

    let icon_root = config.icon_root_or_default();
    debug!(icon_root = %path_display(&icon_root), "Using local asset store");

    let theme_id = theme_override.unwrap_or_else(|| config.theme_id());
    let theme = resolve_theme_or_default(theme_id, &config.custom_themes);

    let fetcher = ProfileFetcher::new(config.provider_endpoints(), config.request_timeout())?
        .with_cache(profile_cache(config));

    Ok(CardService::new(
        Arc::new(fetcher),
        Normalizer::new(Arc::new(db)),
        Arc::new(AssetResolver::new(icon_root)),
        theme,
    ))
}
