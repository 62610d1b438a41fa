use futures::stream::{self, StreamExt};
use marquee_api::traits::TitleSearch;
use marquee_core::clean::TitleCleaner;
use marquee_core::config::AppConfig;
use marquee_core::matcher::{resolve_best_match, MatchStrategy, MatchTier};
use marquee_core::models::{MediaItem, MediaKind};
use marquee_core::storage::ResultCache;

use crate::{RuntimeError, SharedCache};

/// Title → metadata lookup: clean, search, resolve, map, cache.
pub struct MetadataLookup<S> {
    search: S,
    cleaner: TitleCleaner,
    strategy: MatchStrategy,
    concurrency: usize,
    image_base_url: String,
    cache: Option<SharedCache>,
}

impl<S> MetadataLookup<S>
where
    S: TitleSearch,
    RuntimeError: From<S::Error>,
{
    pub fn new(search: S, config: &AppConfig) -> Result<Self, RuntimeError> {
        Ok(Self {
            search,
            cleaner: TitleCleaner::new(&config.matching.noise_tokens)?,
            strategy: config.matching.strategy,
            concurrency: config.matching.concurrency.max(1),
            image_base_url: config.tmdb.image_base_url.clone(),
            cache: None,
        })
    }

    pub fn with_cache(mut self, cache: SharedCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Cap on searches in flight during [`Self::resolve_many`].
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Resolve one title. `strategy` overrides the configured default.
    ///
    /// Returns `Ok(None)` when the search has no results.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_title(
        &self,
        raw_title: &str,
        kind: MediaKind,
        season: Option<u32>,
        strategy: Option<MatchStrategy>,
    ) -> Result<Option<MediaItem>, RuntimeError> {
        let raw_title = raw_title.trim();
        if raw_title.is_empty() {
            return Ok(None);
        }

        let key = ResultCache::key(raw_title, season, kind);
        if let Some(item) = self.cached(&key) {
            tracing::debug!(key, "Cache hit");
            return Ok(Some(item));
        }

        let query = self.cleaner.query_for(raw_title);
        let candidates = self.search.search(&query, kind).await?;
        if candidates.is_empty() {
            tracing::info!(query, "No search results");
            return Ok(None);
        }

        let strategy = strategy.unwrap_or(self.strategy);
        let best = resolve_best_match(&candidates, &query, raw_title, strategy)?;
        match best.tier {
            MatchTier::Exact => tracing::debug!(query, id = best.candidate.id, "Exact match"),
            MatchTier::Similarity(score) => {
                tracing::debug!(query, id = best.candidate.id, score, "Similarity match")
            }
            MatchTier::Recency => tracing::debug!(query, id = best.candidate.id, "Most recent"),
            MatchTier::First => tracing::debug!(query, id = best.candidate.id, "First result"),
        }

        let item = MediaItem::from_tmdb(best.candidate, raw_title, &self.image_base_url);
        self.remember(&key, &item);
        Ok(Some(item))
    }

    /// Resolve a batch of titles with at most `concurrency` searches in
    /// flight. Output order follows input order; a failed title is logged
    /// and yields `None`.
    #[tracing::instrument(skip_all, fields(count = titles.len()))]
    pub async fn resolve_many(
        &self,
        titles: &[String],
        kind: MediaKind,
        season: Option<u32>,
        strategy: Option<MatchStrategy>,
    ) -> Vec<Option<MediaItem>> {
        stream::iter(titles)
            .map(|title| async move {
                match self.resolve_title(title, kind, season, strategy).await {
                    Ok(item) => item,
                    Err(e) => {
                        tracing::warn!(title, error = %e, "Lookup failed");
                        None
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    fn cached(&self, key: &str) -> Option<MediaItem> {
        let cache = self.cache.as_ref()?;
        let loaded = lock(cache).and_then(|c| Ok(c.load::<MediaItem>(key)?));
        loaded
            .map_err(|e| tracing::warn!(key, error = %e, "Cache read failed"))
            .ok()
            .flatten()
    }

    fn remember(&self, key: &str, item: &MediaItem) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        if let Err(e) = lock(cache).and_then(|c| Ok(c.store(key, item)?)) {
            tracing::warn!(key, error = %e, "Cache write failed");
        }
    }
}

fn lock(cache: &SharedCache) -> Result<std::sync::MutexGuard<'_, ResultCache>, RuntimeError> {
    cache
        .lock()
        .map_err(|_| RuntimeError::Cache("cache lock poisoned".into()))
}
