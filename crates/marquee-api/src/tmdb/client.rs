use std::time::Duration;

use marquee_core::config::AppConfig;
use marquee_core::models::{MediaKind, SearchCandidate};
use reqwest::Client;

use super::error::TmdbError;
use super::types::TmdbSearchResponse;
use crate::retry::{send_with_retry, RetryPolicy};
use crate::traits::TitleSearch;

const BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB v3 search client authenticated with a v4 read access token.
pub struct TmdbClient {
    token: String,
    language: String,
    base_url: String,
    http: Client,
    retry: RetryPolicy,
}

impl TmdbClient {
    pub fn new(token: String, language: String) -> Self {
        Self {
            token,
            language,
            base_url: BASE_URL.to_string(),
            http: Client::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Build a client from the app config, honouring the token env override.
    pub fn from_config(config: &AppConfig) -> Result<Self, TmdbError> {
        let token = config.tmdb_token().ok_or(TmdbError::MissingToken)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.retry.timeout_secs))
            .build()?;
        Ok(Self {
            token,
            language: config.tmdb.language.clone(),
            base_url: BASE_URL.to_string(),
            http,
            retry: RetryPolicy::from(&config.retry),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Point the client at another host (a proxy or a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn search_url(&self, kind: MediaKind) -> String {
        format!("{}/search/{kind}", self.base_url)
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, TmdbError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "TMDB API error");
            Err(TmdbError::Api {
                status,
                message: body,
            })
        }
    }
}

impl TitleSearch for TmdbClient {
    type Error = TmdbError;

    async fn search(
        &self,
        query: &str,
        kind: MediaKind,
    ) -> Result<Vec<SearchCandidate>, TmdbError> {
        let url = self.search_url(kind);
        let resp = send_with_retry(&self.retry, || {
            self.http
                .get(&url)
                .header("Authorization", self.auth_header())
                .header("Accept", "application/json")
                .query(&[("query", query), ("language", self.language.as_str())])
        })
        .await?;

        let resp = Self::check_response(resp).await?;
        let search: TmdbSearchResponse = resp
            .json()
            .await
            .map_err(|e| TmdbError::Parse(e.to_string()))?;

        tracing::debug!(query, %kind, hits = search.results.len(), "TMDB search");
        Ok(search
            .results
            .into_iter()
            .map(|item| item.into_candidate())
            .collect())
    }
}
