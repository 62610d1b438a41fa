use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;
use crate::models::MediaKind;

const SCHEMA_V1: &str = include_str!("../../../migrations/001_resolve_cache.sql");

/// SQLite-backed key → JSON cache with per-entry expiry.
pub struct ResultCache {
    conn: Connection,
    ttl: TimeDelta,
}

impl ResultCache {
    /// Open (or create) the cache at the given path and run migrations.
    pub fn open(path: &Path, ttl: Duration) -> Result<Self, CoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn, ttl)
    }

    /// Open an in-memory cache (for tests).
    pub fn open_memory(ttl: Duration) -> Result<Self, CoreError> {
        Self::with_connection(Connection::open_in_memory()?, ttl)
    }

    fn with_connection(conn: Connection, ttl: Duration) -> Result<Self, CoreError> {
        run_migrations(&conn)?;
        let ttl = TimeDelta::from_std(ttl)
            .ok()
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or_else(|| CoreError::Config(format!("cache TTL out of range: {ttl:?}")))?;
        Ok(Self { conn, ttl })
    }

    /// Compose the key for a title lookup.
    pub fn key(title: &str, season: Option<u32>, kind: MediaKind) -> String {
        let season = season.map(|s| s.to_string()).unwrap_or_default();
        format!("{}|{season}|{kind}", title.trim())
    }

    /// Load a live entry. Expired entries read as a miss.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CoreError> {
        self.load_at(key, Utc::now())
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn store<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CoreError> {
        self.store_at(key, value, Utc::now())
    }

    /// Delete every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> Result<usize, CoreError> {
        let removed = self.conn.execute(
            "DELETE FROM resolve_cache WHERE expires_at <= ?1",
            params![timestamp(Utc::now())],
        )?;
        Ok(removed)
    }

    /// Number of rows, live or expired.
    pub fn len(&self) -> Result<usize, CoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM resolve_cache", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, CoreError> {
        Ok(self.len()? == 0)
    }

    fn load_at<T: DeserializeOwned>(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<T>, CoreError> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT payload, expires_at FROM resolve_cache WHERE cache_key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((payload, expires_at)) = row else {
            return Ok(None);
        };
        let live = DateTime::parse_from_rfc3339(&expires_at)
            .map(|t| t.with_timezone(&Utc) > now)
            .unwrap_or(false);
        if !live {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&payload)?))
    }

    fn store_at<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let payload = serde_json::to_string(value)?;
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| CoreError::Config("cache expiry out of range".into()))?;
        self.conn.execute(
            "INSERT OR REPLACE INTO resolve_cache (cache_key, payload, stored_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, payload, timestamp(now), timestamp(expires_at)],
        )?;
        Ok(())
    }
}

fn run_migrations(conn: &Connection) -> Result<(), CoreError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    Ok(())
}

/// Fixed-width UTC timestamps so SQLite string comparison orders them.
fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaItem;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn item() -> MediaItem {
        MediaItem {
            id: "93405".into(),
            item_type: "tmdb".into(),
            title: "鱿鱼游戏".into(),
            cover_url: None,
            description: Some("desc".into()),
            release_date: Some("2021-09-17".into()),
        }
    }

    #[test]
    fn test_key_composition() {
        assert_eq!(ResultCache::key(" 庆余年 ", Some(2), MediaKind::Tv), "庆余年|2|tv");
        assert_eq!(ResultCache::key("沙丘", None, MediaKind::Movie), "沙丘||movie");
    }

    #[test]
    fn test_store_and_load() {
        let cache = ResultCache::open_memory(DAY).unwrap();
        assert!(cache.is_empty().unwrap());
        cache.store("k", &item()).unwrap();
        let loaded: Option<MediaItem> = cache.load("k").unwrap();
        assert_eq!(loaded, Some(item()));
        let missing: Option<MediaItem> = cache.load("other").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_store_replaces() {
        let cache = ResultCache::open_memory(DAY).unwrap();
        cache.store("k", &item()).unwrap();
        let mut updated = item();
        updated.title = "新标题".into();
        cache.store("k", &updated).unwrap();
        assert_eq!(cache.len().unwrap(), 1);
        let loaded: MediaItem = cache.load("k").unwrap().unwrap();
        assert_eq!(loaded.title, "新标题");
    }

    #[test]
    fn test_expired_entry_is_miss_and_purged() {
        let cache = ResultCache::open_memory(DAY).unwrap();
        let two_days_ago = Utc::now() - TimeDelta::days(2);
        cache.store_at("old", &item(), two_days_ago).unwrap();
        cache.store("fresh", &item()).unwrap();

        let old: Option<MediaItem> = cache.load("old").unwrap();
        assert!(old.is_none());

        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_entry_live_until_ttl() {
        let cache = ResultCache::open_memory(DAY).unwrap();
        let now = Utc::now();
        cache.store_at("k", &item(), now).unwrap();
        let hit: Option<MediaItem> = cache.load_at("k", now + TimeDelta::hours(23)).unwrap();
        assert!(hit.is_some());
        let miss: Option<MediaItem> = cache.load_at("k", now + TimeDelta::hours(25)).unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn test_ttl_out_of_range_is_config_error() {
        let huge = Duration::from_secs(10_000_000_000 * 3600);
        let err = ResultCache::open_memory(huge).err().unwrap();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_store_near_max_date_is_config_error() {
        let cache = ResultCache::open_memory(DAY).unwrap();
        let err = cache
            .store_at("k", &item(), DateTime::<Utc>::MAX_UTC)
            .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marquee.db");
        {
            let cache = ResultCache::open(&path, DAY).unwrap();
            cache.store("k", &item()).unwrap();
        }
        let cache = ResultCache::open(&path, DAY).unwrap();
        let loaded: Option<MediaItem> = cache.load("k").unwrap();
        assert_eq!(loaded, Some(item()));
    }
}
