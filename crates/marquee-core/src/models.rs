use serde::{Deserialize, Serialize};

/// Whether a lookup concerns a film or a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry from a title-search API, read-only to the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub id: u64,
    pub primary_name: String,
    pub original_name: String,
    /// First air date or release date, `YYYY-MM-DD`; empty when unknown.
    pub release_date: String,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
}

/// The normalized item shape handed to the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

/// Shown when a match carries no overview.
pub const NO_DESCRIPTION: &str = "暂无描述";

impl MediaItem {
    /// Map a resolved TMDB candidate into an item titled with the caller's
    /// original (uncleaned) title.
    pub fn from_tmdb(candidate: &SearchCandidate, display_title: &str, image_base_url: &str) -> Self {
        let cover_url = candidate
            .poster_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}{p}", image_base_url.trim_end_matches('/')));
        let description = candidate
            .overview
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .unwrap_or(NO_DESCRIPTION)
            .to_string();
        let release_date = Some(candidate.release_date.clone()).filter(|d| !d.is_empty());

        Self {
            id: candidate.id.to_string(),
            item_type: "tmdb".into(),
            title: display_title.to_string(),
            cover_url,
            description: Some(description),
            release_date,
        }
    }
}
