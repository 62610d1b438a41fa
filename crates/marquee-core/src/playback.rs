//! Parser for the `vod_play_url` / `vod_play_from` encoding used by VOD
//! aggregator APIs.
//!
//! ```text
//! vod_play_from: 源A$$$源B
//! vod_play_url:  第1集$http://a/1.m3u8#第2集$http://a/2.m3u8$$$正片$http://b/m.m3u8
//!                └─ source 0 (TV-shaped) ────────────────┘   └─ source 1 (movie) ┘
//! ```
//!
//! Sources are separated by `$$$`, segments by `#`, and each segment is
//! `label$url`. A source containing `#` is TV-shaped.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::MediaKind;

pub const SOURCE_DELIMITER: &str = "$$$";
pub const SEGMENT_DELIMITER: char = '#';
pub const LABEL_DELIMITER: char = '$';

/// Label used when `vod_play_from` has no entry for a source.
pub const DEFAULT_SOURCE_LABEL: &str = "默认源";

/// "第1集", "第01集", "第001集".
static RE_EPISODE_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"第(\d+)集").unwrap());

/// A URL is playable only if it mentions `m3u8`, in any case.
pub fn is_m3u8(url: &str) -> bool {
    url.to_ascii_lowercase().contains("m3u8")
}

/// One `label$url` segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub label: &'a str,
    pub url: &'a str,
}

impl<'a> Segment<'a> {
    /// Split `label$url`. Segments without a `$` are malformed and yield `None`.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let mut parts = raw.split(LABEL_DELIMITER);
        let label = parts.next()?;
        let url = parts.next()?.trim();
        Some(Self { label, url })
    }

    /// Episode number from a "第N集" label, leading zeros ignored.
    pub fn episode_number(&self) -> Option<u32> {
        let caps = RE_EPISODE_LABEL.captures(self.label)?;
        caps[1].parse().ok()
    }

    pub fn is_stream(&self) -> bool {
        is_m3u8(self.url)
    }
}

/// One play source, classified once by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaySource<'a> {
    /// Contains `#`: a list of episodes. Holds the non-blank segments.
    Tv(Vec<&'a str>),
    /// No `#`: a single version.
    Movie(&'a str),
}

impl<'a> PlaySource<'a> {
    pub fn classify(raw: &'a str) -> Self {
        if raw.contains(SEGMENT_DELIMITER) {
            Self::Tv(
                raw.split(SEGMENT_DELIMITER)
                    .filter(|s| !s.trim().is_empty())
                    .collect(),
            )
        } else {
            Self::Movie(raw)
        }
    }

    /// Non-blank raw segments in order.
    pub fn segments(&self) -> Vec<&'a str> {
        match self {
            Self::Tv(segments) => segments.clone(),
            Self::Movie(raw) if raw.trim().is_empty() => Vec::new(),
            Self::Movie(raw) => vec![raw],
        }
    }

    pub fn is_tv(&self) -> bool {
        matches!(self, Self::Tv(_))
    }
}

/// Which cut a movie version is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cut {
    /// Telecine / cam release.
    Tc,
    Final,
}

impl Cut {
    fn from_label(label: &str) -> Self {
        if label.to_lowercase().contains("tc") {
            Self::Tc
        } else {
            Self::Final
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Tc => "TC",
            Self::Final => "正片",
        }
    }
}

/// What a resource points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceDetail {
    /// A specific requested episode.
    Episode { number: u32 },
    /// A whole series, represented by its first playable episode.
    Series { total_episodes: usize },
    /// A movie version.
    Version { cut: Cut },
}

/// A normalized playable resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResource {
    pub source_label: String,
    pub description: String,
    pub url: String,
    pub is_valid_stream: bool,
    pub detail: ResourceDetail,
}

/// What the caller is looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRequest {
    pub kind: MediaKind,
    /// Only meaningful for [`MediaKind::Tv`].
    pub episode: Option<u32>,
    /// Display name used in descriptions (the aggregator's `vod_name`).
    pub title: String,
}

impl PlayRequest {
    pub fn movie(title: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Movie,
            episode: None,
            title: title.into(),
        }
    }

    pub fn tv(title: impl Into<String>, episode: Option<u32>) -> Self {
        Self {
            kind: MediaKind::Tv,
            episode,
            title: title.into(),
        }
    }
}

/// Extract playable resources from one aggregator item.
///
/// Best effort: malformed sources and segments are skipped, never reported.
pub fn parse_play_sources(
    raw_play_url: &str,
    raw_play_from: &str,
    request: &PlayRequest,
) -> Vec<PlayResource> {
    let play_url = raw_play_url.trim_end_matches(SEGMENT_DELIMITER);
    let labels: Vec<&str> = raw_play_from.split(SOURCE_DELIMITER).collect();

    let mut resources = Vec::new();
    for (i, raw) in play_url.split(SOURCE_DELIMITER).enumerate() {
        let label = labels
            .get(i)
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_SOURCE_LABEL);

        let source = PlaySource::classify(raw);
        let resource = match (request.kind, request.episode) {
            (MediaKind::Tv, _) if !source.is_tv() => None,
            (MediaKind::Tv, Some(target)) => episode_resource(&source, target, label, request),
            (MediaKind::Tv, None) => series_resource(&source, label, request),
            (MediaKind::Movie, _) => version_resource(&source, label, request),
        };
        resources.extend(resource);
    }
    resources
}

fn episode_resource(
    source: &PlaySource<'_>,
    target: u32,
    label: &str,
    request: &PlayRequest,
) -> Option<PlayResource> {
    let segment = source
        .segments()
        .into_iter()
        .filter_map(Segment::parse)
        .find(|s| s.episode_number() == Some(target) && s.is_stream())?;

    Some(PlayResource {
        source_label: label.to_string(),
        description: format!("{} • 第{target}集 • {label}", request.title),
        url: segment.url.to_string(),
        is_valid_stream: true,
        detail: ResourceDetail::Episode { number: target },
    })
}

fn series_resource(
    source: &PlaySource<'_>,
    label: &str,
    request: &PlayRequest,
) -> Option<PlayResource> {
    let segments = source.segments();
    let total_episodes = segments.len();
    let first = segments
        .into_iter()
        .filter_map(Segment::parse)
        .find(Segment::is_stream)?;

    Some(PlayResource {
        source_label: label.to_string(),
        description: format!(
            "{} • 电视剧 • 共{total_episodes}集 • {label}",
            request.title
        ),
        url: first.url.to_string(),
        is_valid_stream: true,
        detail: ResourceDetail::Series { total_episodes },
    })
}

fn version_resource(
    source: &PlaySource<'_>,
    label: &str,
    request: &PlayRequest,
) -> Option<PlayResource> {
    let version = source
        .segments()
        .into_iter()
        .filter_map(Segment::parse)
        .find(Segment::is_stream)?;
    let cut = Cut::from_label(version.label);

    Some(PlayResource {
        source_label: label.to_string(),
        description: format!("{} • {} • {label}", request.title, cut.label()),
        url: version.url.to_string(),
        is_valid_stream: true,
        detail: ResourceDetail::Version { cut },
    })
}

/// Anything carrying a playable URL.
pub trait StreamUrl {
    fn stream_url(&self) -> &str;
}

impl StreamUrl for PlayResource {
    fn stream_url(&self) -> &str {
        &self.url
    }
}

/// Drop repeated URLs, keeping the first occurrence and the input order.
/// Items with an empty URL are dropped too.
pub fn dedup_by_url<T: StreamUrl>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let url = item.stream_url();
            !url.is_empty() && seen.insert(url.to_string())
        })
        .collect()
}
