use marquee_api::traits::{ListingQuery, TitleListing, TitleSearch};
use marquee_core::matcher::MatchStrategy;
use marquee_core::models::MediaItem;

use crate::{MetadataLookup, RuntimeError};

/// Fetch one page of a hot list and resolve every listed title.
///
/// Titles that fail or find nothing are dropped; the rest keep listing order.
#[tracing::instrument(skip(listing, lookup))]
pub async fn resolve_listing<L, S>(
    listing: &L,
    lookup: &MetadataLookup<S>,
    query: &ListingQuery,
    strategy: Option<MatchStrategy>,
) -> Result<Vec<MediaItem>, RuntimeError>
where
    L: TitleListing,
    S: TitleSearch,
    RuntimeError: From<L::Error> + From<S::Error>,
{
    let listed = listing.list(query).await?;
    let titles: Vec<String> = listed.into_iter().map(|t| t.title).collect();
    if titles.is_empty() {
        tracing::info!("Listing page is empty");
        return Ok(Vec::new());
    }

    let resolved = lookup
        .resolve_many(&titles, query.kind, None, strategy)
        .await;
    let items: Vec<MediaItem> = resolved.into_iter().flatten().collect();
    tracing::debug!(listed = titles.len(), resolved = items.len(), "Resolved listing");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use marquee_api::douban::DoubanError;
    use marquee_api::tmdb::TmdbError;
    use marquee_api::traits::ListedTitle;
    use marquee_core::config::AppConfig;
    use marquee_core::models::{MediaKind, SearchCandidate};

    use super::*;

    struct FakeListing {
        titles: Vec<&'static str>,
        seen: Mutex<Option<ListingQuery>>,
        fail: bool,
    }

    impl FakeListing {
        fn new(titles: Vec<&'static str>) -> Self {
            Self {
                titles,
                seen: Mutex::new(None),
                fail: false,
            }
        }
    }

    impl TitleListing for FakeListing {
        type Error = DoubanError;

        async fn list(&self, query: &ListingQuery) -> Result<Vec<ListedTitle>, DoubanError> {
            *self.seen.lock().unwrap() = Some(query.clone());
            if self.fail {
                return Err(DoubanError::Parse("bad page".into()));
            }
            Ok(self
                .titles
                .iter()
                .enumerate()
                .map(|(i, title)| ListedTitle {
                    id: i.to_string(),
                    title: title.to_string(),
                    rating: None,
                })
                .collect())
        }
    }

    /// Finds only titles it knows, each under its own id.
    struct CatalogSearch;

    impl TitleSearch for CatalogSearch {
        type Error = TmdbError;

        async fn search(
            &self,
            query: &str,
            _kind: MediaKind,
        ) -> Result<Vec<SearchCandidate>, TmdbError> {
            let id = match query {
                "沙丘" => 1,
                "奥本海默" => 2,
                "坏片名" => return Err(TmdbError::Parse("boom".into())),
                _ => return Ok(Vec::new()),
            };
            Ok(vec![SearchCandidate {
                id,
                primary_name: query.into(),
                original_name: String::new(),
                release_date: String::new(),
                poster_path: None,
                overview: None,
            }])
        }
    }

    fn lookup() -> MetadataLookup<CatalogSearch> {
        MetadataLookup::new(CatalogSearch, &AppConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_resolves_in_listing_order() {
        let listing = FakeListing::new(vec!["奥本海默", "无人知晓", "坏片名", "沙丘"]);
        let query = ListingQuery::movie();
        let items = resolve_listing(&listing, &lookup(), &query, None).await.unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(items[0].title, "奥本海默");
        assert_eq!(listing.seen.lock().unwrap().as_ref(), Some(&query));
    }

    #[tokio::test]
    async fn test_empty_listing_is_empty() {
        let listing = FakeListing::new(Vec::new());
        let items = resolve_listing(&listing, &lookup(), &ListingQuery::tv(), None)
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_listing_error_propagates() {
        let mut listing = FakeListing::new(vec!["沙丘"]);
        listing.fail = true;
        let err = resolve_listing(&listing, &lookup(), &ListingQuery::movie(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Douban(_)));
    }
}
