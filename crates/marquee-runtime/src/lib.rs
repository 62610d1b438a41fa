mod hot;
mod lookup;
mod resources;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use marquee_api::douban::{DoubanClient, DoubanError};
use marquee_api::tmdb::{TmdbClient, TmdbError};
use marquee_api::vod::{VodClient, VodError};
use marquee_core::config::AppConfig;
use marquee_core::error::CoreError;
use marquee_core::storage::ResultCache;

pub use hot::resolve_listing;
pub use lookup::MetadataLookup;
pub use marquee_api::traits::ListingQuery;
pub use resources::{load_resources, ResourceQuery, StreamResource};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("TMDB error: {0}")]
    Tmdb(#[from] TmdbError),
    #[error("VOD error: {0}")]
    Vod(#[from] VodError),
    #[error("Douban error: {0}")]
    Douban(#[from] DoubanError),
    #[error("cache error: {0}")]
    Cache(String),
}

/// A result cache shared between concurrent lookups.
pub type SharedCache = Arc<Mutex<ResultCache>>;

/// Open the on-disk result cache when caching is enabled.
pub fn open_cache(config: &AppConfig) -> Result<Option<SharedCache>, RuntimeError> {
    if !config.cache.enabled {
        return Ok(None);
    }
    let path = AppConfig::ensure_db_path()?;
    let ttl = Duration::from_secs(config.cache.ttl_hours.saturating_mul(60 * 60));
    let cache = ResultCache::open(&path, ttl)?;
    match cache.purge_expired() {
        Ok(0) => {}
        Ok(removed) => tracing::debug!(removed, "Purged expired cache entries"),
        Err(e) => tracing::warn!(error = %e, "Failed to purge cache"),
    }
    Ok(Some(Arc::new(Mutex::new(cache))))
}

/// Build a TMDB-backed lookup from the app config.
pub fn tmdb_lookup(
    config: &AppConfig,
    cache: Option<SharedCache>,
) -> Result<MetadataLookup<TmdbClient>, RuntimeError> {
    let client = TmdbClient::from_config(config)?;
    let lookup = MetadataLookup::new(client, config)?;
    Ok(match cache {
        Some(cache) => lookup.with_cache(cache),
        None => lookup,
    })
}

/// Build the Douban hot-list client from the app config.
pub fn douban_listing(config: &AppConfig) -> Result<DoubanClient, RuntimeError> {
    Ok(DoubanClient::from_config(config)?)
}

/// One client per configured VOD site. Sites with a malformed URL are
/// skipped with a warning.
pub fn vod_clients(config: &AppConfig) -> Vec<VodClient> {
    config
        .vod
        .sites
        .iter()
        .filter_map(|site| {
            VodClient::from_site(site, &config.retry)
                .map_err(|e| tracing::warn!(site = %site.title, error = %e, "Skipping VOD site"))
                .ok()
        })
        .collect()
}
