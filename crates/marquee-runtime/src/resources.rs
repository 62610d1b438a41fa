use futures::future::join_all;
use marquee_api::traits::{VodCatalog, VodItem};
use marquee_core::models::MediaKind;
use marquee_core::playback::{dedup_by_url, parse_play_sources, PlayRequest, PlayResource, StreamUrl};
use marquee_core::season::extract_season;
use serde::Serialize;

/// What to look up across the VOD sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceQuery {
    /// Series or movie name, possibly carrying a season marker.
    pub series_name: String,
    pub kind: MediaKind,
    /// Overrides the season parsed from `series_name`.
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl ResourceQuery {
    pub fn tv(series_name: impl Into<String>) -> Self {
        Self {
            series_name: series_name.into(),
            kind: MediaKind::Tv,
            season: None,
            episode: None,
        }
    }

    pub fn movie(name: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Movie,
            ..Self::tv(name)
        }
    }
}

/// A playable resource tagged with the site that served it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamResource {
    /// VOD site title.
    pub name: String,
    #[serde(flatten)]
    pub resource: PlayResource,
}

impl StreamUrl for StreamResource {
    fn stream_url(&self) -> &str {
        &self.resource.url
    }
}

/// Query every site concurrently and merge the playable resources.
///
/// Only catalogue entries whose base name and season equal the request's
/// are used. Failing sites are logged and skipped. The result is
/// deduplicated by URL, keeping site order.
#[tracing::instrument(skip(catalogs), fields(sites = catalogs.len()))]
pub async fn load_resources<C: VodCatalog>(
    catalogs: &[C],
    query: &ResourceQuery,
) -> Vec<StreamResource> {
    let wanted = extract_season(&query.series_name);
    let target_season = query.season.unwrap_or(wanted.season);
    let term = wanted.base_name.trim();
    if term.is_empty() {
        return Vec::new();
    }

    let searches = catalogs.iter().map(|catalog| async move {
        match catalog.search(term).await {
            Ok(items) => {
                tracing::debug!(site = catalog.site_title(), count = items.len(), "VOD search");
                (catalog.site_title(), items)
            }
            Err(e) => {
                tracing::warn!(site = catalog.site_title(), error = %e, "VOD search failed");
                (catalog.site_title(), Vec::new())
            }
        }
    });
    let results = join_all(searches).await;

    let mut resources = Vec::new();
    for (site, items) in results {
        for item in items {
            if !matches_request(&item, term, target_season) {
                continue;
            }
            let request = PlayRequest {
                kind: query.kind,
                episode: query.episode.filter(|_| query.kind == MediaKind::Tv),
                title: item.vod_name.trim().to_string(),
            };
            resources.extend(
                parse_play_sources(&item.vod_play_url, &item.vod_play_from, &request)
                    .into_iter()
                    .map(|resource| StreamResource {
                        name: site.to_string(),
                        resource,
                    }),
            );
        }
    }

    let unique = dedup_by_url(resources);
    tracing::info!(count = unique.len(), "Resources loaded");
    unique
}

fn matches_request(item: &VodItem, base_name: &str, season: u32) -> bool {
    let name = item.vod_name.trim();
    if name.is_empty() {
        return false;
    }
    let info = extract_season(name);
    if info.base_name != base_name {
        tracing::trace!(name, "Base name mismatch");
        return false;
    }
    if info.season != season {
        tracing::trace!(name, found = info.season, season, "Season mismatch");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use marquee_api::vod::VodError;
    use marquee_core::playback::{Cut, ResourceDetail};

    use super::*;

    struct FakeCatalog {
        title: String,
        items: Vec<VodItem>,
        fail: bool,
    }

    impl FakeCatalog {
        fn new(title: &str, items: Vec<VodItem>) -> Self {
            Self {
                title: title.into(),
                items,
                fail: false,
            }
        }

        fn failing(title: &str) -> Self {
            Self {
                fail: true,
                ..Self::new(title, Vec::new())
            }
        }
    }

    impl VodCatalog for FakeCatalog {
        type Error = VodError;

        fn site_title(&self) -> &str {
            &self.title
        }

        async fn search(&self, _term: &str) -> Result<Vec<VodItem>, VodError> {
            if self.fail {
                return Err(VodError::Parse("bad json".into()));
            }
            Ok(self.items.clone())
        }
    }

    fn item(name: &str, url: &str, from: &str) -> VodItem {
        VodItem {
            vod_name: name.into(),
            vod_play_url: url.into(),
            vod_play_from: from.into(),
        }
    }

    const SERIES: &str = "第01集$http://x/1.m3u8#第02集$http://x/2.m3u8#";

    #[tokio::test]
    async fn test_specific_episode() {
        let sites = vec![FakeCatalog::new("A", vec![item("庆余年", SERIES, "ffm3u8")])];
        let query = ResourceQuery {
            episode: Some(2),
            ..ResourceQuery::tv("庆余年")
        };
        let found = load_resources(&sites, &query).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "A");
        assert_eq!(found[0].resource.url, "http://x/2.m3u8");
        assert_eq!(found[0].resource.detail, ResourceDetail::Episode { number: 2 });
        assert_eq!(found[0].resource.description, "庆余年 • 第2集 • ffm3u8");
    }

    #[tokio::test]
    async fn test_season_filter() {
        let sites = vec![FakeCatalog::new(
            "A",
            vec![
                item("庆余年", "第01集$http://s1/1.m3u8#第02集$http://s1/2.m3u8", "f"),
                item("庆余年第二季", "第01集$http://s2/1.m3u8#第02集$http://s2/2.m3u8", "f"),
                item("庆余年番外", "第01集$http://o/1.m3u8#第02集$http://o/2.m3u8", "f"),
            ],
        )];

        let first = load_resources(&sites, &ResourceQuery::tv("庆余年")).await;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].resource.url, "http://s1/1.m3u8");

        let second = load_resources(&sites, &ResourceQuery::tv("庆余年第二季")).await;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].resource.url, "http://s2/1.m3u8");

        let explicit = ResourceQuery {
            season: Some(2),
            ..ResourceQuery::tv("庆余年")
        };
        let by_param = load_resources(&sites, &explicit).await;
        assert_eq!(by_param, second);
    }

    #[tokio::test]
    async fn test_dedup_across_sites_keeps_first_site() {
        let sites = vec![
            FakeCatalog::new("A", vec![item("庆余年", SERIES, "ffm3u8")]),
            FakeCatalog::new("B", vec![item("庆余年", SERIES, "lzm3u8")]),
        ];
        let found = load_resources(&sites, &ResourceQuery::tv("庆余年")).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "A");
        assert_eq!(found[0].resource.source_label, "ffm3u8");
        assert_eq!(
            found[0].resource.detail,
            ResourceDetail::Series { total_episodes: 2 }
        );
    }

    #[tokio::test]
    async fn test_failing_site_is_skipped() {
        let sites = vec![
            FakeCatalog::failing("down"),
            FakeCatalog::new("up", vec![item("庆余年", SERIES, "ffm3u8")]),
        ];
        let found = load_resources(&sites, &ResourceQuery::tv("庆余年")).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "up");
    }

    #[tokio::test]
    async fn test_movie_versions() {
        let sites = vec![FakeCatalog::new(
            "A",
            vec![item(
                "沙丘",
                "TC版$http://x/a.mp4#正片$http://x/b.m3u8",
                "",
            )],
        )];
        let found = load_resources(&sites, &ResourceQuery::movie("沙丘")).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].resource.url, "http://x/b.m3u8");
        assert_eq!(found[0].resource.source_label, "默认源");
        assert_eq!(found[0].resource.detail, ResourceDetail::Version { cut: Cut::Final });
    }

    #[tokio::test]
    async fn test_no_sites() {
        let sites: Vec<FakeCatalog> = Vec::new();
        assert!(load_resources(&sites, &ResourceQuery::tv("庆余年")).await.is_empty());
    }

    #[test]
    fn test_stream_resource_json_is_flat() {
        let resource = StreamResource {
            name: "A".into(),
            resource: PlayResource {
                source_label: "ffm3u8".into(),
                description: "d".into(),
                url: "http://x/1.m3u8".into(),
                is_valid_stream: true,
                detail: ResourceDetail::Episode { number: 1 },
            },
        };
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["name"], "A");
        assert_eq!(json["sourceLabel"], "ffm3u8");
        assert_eq!(json["isValidStream"], true);
        assert_eq!(json["detail"]["kind"], "episode");
        assert_eq!(json["detail"]["number"], 1);
    }
}
