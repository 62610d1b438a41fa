use serde::Deserialize;

use crate::traits::VodItem;

/// Response envelope shared by the `provide/vod` aggregator APIs.
#[derive(Debug, Deserialize)]
pub struct VodListResponse {
    /// `1` on success. Some sites send it as a string.
    #[serde(default)]
    pub code: serde_json::Value,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub list: Option<Vec<VodListItem>>,
}

impl VodListResponse {
    pub fn is_success(&self) -> bool {
        match &self.code {
            serde_json::Value::Number(n) => n.as_i64() == Some(1),
            serde_json::Value::String(s) => s.trim() == "1",
            _ => false,
        }
    }

    /// Entries carrying a name and both playback strings.
    pub fn into_items(self) -> Vec<VodItem> {
        self.list
            .unwrap_or_default()
            .into_iter()
            .filter_map(VodListItem::into_item)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct VodListItem {
    pub vod_id: Option<serde_json::Value>,
    pub vod_name: Option<String>,
    pub vod_play_url: Option<String>,
    pub vod_play_from: Option<String>,
}

impl VodListItem {
    pub fn into_item(self) -> Option<VodItem> {
        let vod_name = self.vod_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())?;
        let vod_play_url = self.vod_play_url.filter(|u| !u.is_empty())?;
        let vod_play_from = self.vod_play_from.filter(|f| !f.is_empty())?;
        Some(VodItem {
            vod_name,
            vod_play_url,
            vod_play_from,
        })
    }
}
