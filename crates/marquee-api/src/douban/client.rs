use std::time::Duration;

use marquee_core::config::AppConfig;
use marquee_core::models::MediaKind;
use reqwest::header::{REFERER, USER_AGENT};
use reqwest::Client;

use super::error::DoubanError;
use super::types::{RecentHotItem, RecentHotResponse};
use crate::retry::{send_with_retry, RetryPolicy};
use crate::traits::{ListedTitle, ListingQuery, TitleListing};

const BASE_URL: &str = "https://m.douban.com/rexxar/api/v2";
const DEFAULT_REFERER: &str = "https://movie.douban.com/explore";
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Client for Douban's `recent_hot` listings. The endpoint rejects requests
/// without a douban.com `Referer`.
pub struct DoubanClient {
    referer: String,
    user_agent: Option<String>,
    page_size: u32,
    base_url: String,
    http: Client,
    retry: RetryPolicy,
}

impl DoubanClient {
    pub fn new() -> Self {
        Self {
            referer: DEFAULT_REFERER.to_string(),
            user_agent: None,
            page_size: DEFAULT_PAGE_SIZE,
            base_url: BASE_URL.to_string(),
            http: Client::new(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, DoubanError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.retry.timeout_secs))
            .build()?;
        Ok(Self {
            referer: config.douban.referer.clone(),
            user_agent: Some(config.douban.user_agent.clone()).filter(|ua| !ua.is_empty()),
            page_size: config.douban.page_size.max(1),
            base_url: BASE_URL.to_string(),
            http,
            retry: RetryPolicy::from(&config.retry),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn recent_hot_url(&self, kind: MediaKind) -> String {
        format!("{}/subject/recent_hot/{kind}", self.base_url)
    }

    fn query_params(&self, query: &ListingQuery) -> Result<Vec<(&'static str, String)>, DoubanError> {
        if query.min_rating > 9 {
            return Err(DoubanError::InvalidRating(query.min_rating));
        }
        let start = query.page.max(1).saturating_sub(1).saturating_mul(self.page_size);
        Ok(vec![
            ("start", start.to_string()),
            ("limit", self.page_size.to_string()),
            ("category", query.category.clone()),
            ("type", query.list_type.clone()),
            ("score_range", format!("{},10", query.min_rating)),
        ])
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, DoubanError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "Douban API error");
            Err(DoubanError::Api {
                status,
                message: body,
            })
        }
    }
}

impl Default for DoubanClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleListing for DoubanClient {
    type Error = DoubanError;

    async fn list(&self, query: &ListingQuery) -> Result<Vec<ListedTitle>, DoubanError> {
        let params = self.query_params(query)?;
        let url = self.recent_hot_url(query.kind);
        let resp = send_with_retry(&self.retry, || {
            let request = self
                .http
                .get(&url)
                .header(REFERER, &self.referer)
                .query(&params);
            match &self.user_agent {
                Some(ua) => request.header(USER_AGENT, ua),
                None => request,
            }
        })
        .await?;

        let resp = Self::check_response(resp).await?;
        let hot: RecentHotResponse = resp
            .json()
            .await
            .map_err(|e| DoubanError::Parse(e.to_string()))?;

        let listed: Vec<ListedTitle> = hot
            .items
            .into_iter()
            .filter_map(RecentHotItem::into_listed)
            .collect();
        tracing::debug!(kind = %query.kind, page = query.page, count = listed.len(), "Douban recent_hot");
        Ok(listed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> &'a str {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn test_recent_hot_url_per_kind() {
        let client = DoubanClient::new();
        assert_eq!(
            client.recent_hot_url(MediaKind::Movie),
            "https://m.douban.com/rexxar/api/v2/subject/recent_hot/movie"
        );
        assert_eq!(
            client.recent_hot_url(MediaKind::Tv),
            "https://m.douban.com/rexxar/api/v2/subject/recent_hot/tv"
        );
    }

    #[test]
    fn test_paging_and_filters() {
        let client = DoubanClient::new();
        let query = ListingQuery {
            page: 3,
            min_rating: 6,
            list_type: "tv_domestic".into(),
            ..ListingQuery::tv()
        };
        let params = client.query_params(&query).unwrap();
        assert_eq!(param(&params, "start"), "40");
        assert_eq!(param(&params, "limit"), "20");
        assert_eq!(param(&params, "category"), "tv");
        assert_eq!(param(&params, "type"), "tv_domestic");
        assert_eq!(param(&params, "score_range"), "6,10");
    }

    #[test]
    fn test_page_zero_is_first_page() {
        let client = DoubanClient::new();
        let query = ListingQuery {
            page: 0,
            ..ListingQuery::movie()
        };
        let params = client.query_params(&query).unwrap();
        assert_eq!(param(&params, "start"), "0");
        assert_eq!(param(&params, "type"), "全部");
        assert_eq!(param(&params, "category"), "");
    }

    #[test]
    fn test_rating_above_nine_rejected() {
        let client = DoubanClient::new();
        let query = ListingQuery {
            min_rating: 10,
            ..ListingQuery::movie()
        };
        assert!(matches!(
            client.query_params(&query),
            Err(DoubanError::InvalidRating(10))
        ));
    }

    #[test]
    fn test_from_config() {
        let mut config = AppConfig::default();
        config.douban.page_size = 50;
        let client = DoubanClient::from_config(&config).unwrap();
        assert_eq!(client.page_size, 50);
        assert_eq!(client.referer, "https://movie.douban.com/explore");
        assert!(client.user_agent.is_some());
    }

    #[tokio::test]
    async fn test_invalid_rating_fails_before_request() {
        let client = DoubanClient::new()
            .with_base_url("http://127.0.0.1:9")
            .with_retry(RetryPolicy::none());
        let query = ListingQuery {
            min_rating: 12,
            ..ListingQuery::tv()
        };
        let err = client.list(&query).await.unwrap_err();
        assert!(matches!(err, DoubanError::InvalidRating(12)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        let client = DoubanClient::new()
            .with_base_url("http://127.0.0.1:9")
            .with_retry(RetryPolicy::none());
        let err = client.list(&ListingQuery::movie()).await.unwrap_err();
        assert!(matches!(err, DoubanError::Http(_)));
    }
}
