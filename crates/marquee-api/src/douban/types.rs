use serde::Deserialize;

use crate::traits::ListedTitle;

/// `/subject/recent_hot/{movie,tv}` response.
#[derive(Debug, Deserialize)]
pub struct RecentHotResponse {
    #[serde(default)]
    pub items: Vec<RecentHotItem>,
    pub total: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RecentHotItem {
    /// Usually a numeric string; older payloads send a number.
    #[serde(default)]
    pub id: serde_json::Value,
    pub title: Option<String>,
    pub rating: Option<RecentHotRating>,
    pub card_subtitle: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecentHotRating {
    pub value: Option<f64>,
}

impl RecentHotItem {
    /// Untitled entries cannot be looked up and yield `None`.
    pub fn into_listed(self) -> Option<ListedTitle> {
        let title = self.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
        let id = match self.id {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            _ => String::new(),
        };
        let rating = self.rating.and_then(|r| r.value).filter(|v| *v > 0.0);
        Some(ListedTitle { id, title, rating })
    }
}
