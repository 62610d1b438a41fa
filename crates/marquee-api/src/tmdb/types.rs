use marquee_core::models::SearchCandidate;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbSearchItem>,
}

/// A `/search/movie` or `/search/tv` hit. Films use `title`/`release_date`,
/// series use `name`/`first_air_date`.
#[derive(Debug, Deserialize)]
pub struct TmdbSearchItem {
    pub id: u64,
    pub name: Option<String>,
    pub title: Option<String>,
    pub original_name: Option<String>,
    pub original_title: Option<String>,
    pub first_air_date: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
}

impl TmdbSearchItem {
    pub fn into_candidate(self) -> SearchCandidate {
        let primary_name = first_non_empty([&self.name, &self.title]);
        let original_name = first_non_empty([&self.original_name, &self.original_title]);
        let release_date = first_non_empty([&self.first_air_date, &self.release_date]);

        SearchCandidate {
            id: self.id,
            primary_name,
            original_name,
            release_date,
            poster_path: self.poster_path,
            overview: self.overview,
        }
    }
}

fn first_non_empty<const N: usize>(fields: [&Option<String>; N]) -> String {
    fields
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_default()
}
