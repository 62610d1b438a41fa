//! Trait definitions for upstream data sources.
//!
//! Title search (TMDB), hot-list (Douban) and VOD aggregator clients
//! implement these traits, allowing the runtime to be source-agnostic and
//! tests to use in-memory fakes.

use std::future::Future;

use marquee_core::models::{MediaKind, SearchCandidate};
use serde::{Deserialize, Serialize};

/// A title-search service returning match candidates.
pub trait TitleSearch: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Search for `query`. An empty result is not an error.
    fn search(
        &self,
        query: &str,
        kind: MediaKind,
    ) -> impl Future<Output = Result<Vec<SearchCandidate>, Self::Error>> + Send;
}

/// A ranked listing of currently popular titles.
pub trait TitleListing: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch one page of the listing. An empty page is not an error.
    fn list(
        &self,
        query: &ListingQuery,
    ) -> impl Future<Output = Result<Vec<ListedTitle>, Self::Error>> + Send;
}

/// Which listing page to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub kind: MediaKind,
    /// Listing section, e.g. `最新` or `豆瓣高分` for films, `tv` or `show` for series.
    pub category: String,
    /// Region or genre filter, e.g. `华语` for films, `tv_domestic` for series.
    pub list_type: String,
    /// Minimum rating, 0 to 9.
    pub min_rating: u8,
    /// 1-based page number.
    pub page: u32,
}

impl ListingQuery {
    /// Popular films in every region.
    pub fn movie() -> Self {
        Self {
            kind: MediaKind::Movie,
            category: String::new(),
            list_type: "全部".into(),
            min_rating: 0,
            page: 1,
        }
    }

    /// Popular series of every kind.
    pub fn tv() -> Self {
        Self {
            kind: MediaKind::Tv,
            category: "tv".into(),
            list_type: "tv".into(),
            min_rating: 0,
            page: 1,
        }
    }
}

/// One listed title, ready to feed a title lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedTitle {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// One VOD aggregator site.
pub trait VodCatalog: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Display name of the site, attached to every resource it yields.
    fn site_title(&self) -> &str;

    /// Search the site's catalogue by name.
    fn search(&self, term: &str) -> impl Future<Output = Result<Vec<VodItem>, Self::Error>> + Send;
}

/// A catalogue entry with its encoded playback strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VodItem {
    pub vod_name: String,
    pub vod_play_url: String,
    pub vod_play_from: String,
}
