use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// A title split into its series name and season number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonInfo {
    pub base_name: String,
    pub season: u32,
}

// ── Regex patterns ──────────────────────────────────────────────

/// "第2季", "第二部".
static RE_CJK_SEASON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"第([一二三四五六七八九十\d]+)[季部]").unwrap());

/// "神探狄仁杰2": season glued to the end of the name.
static RE_TRAILING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)(\d+)$").unwrap());

/// Split `name` into base name and season number.
///
/// Titles without any season signal are season 1.
pub fn extract_season(name: &str) -> SeasonInfo {
    let name = name.trim();

    if let Some(caps) = RE_CJK_SEASON.captures(name) {
        let season = season_number(&caps[1]);
        let base_name = RE_CJK_SEASON.replace(name, "").trim().to_string();
        return SeasonInfo { base_name, season };
    }

    if let Some(caps) = RE_TRAILING_DIGITS.captures(name) {
        let season = caps[2].parse::<u32>().ok().filter(|&n| n > 0).unwrap_or(1);
        return SeasonInfo {
            base_name: caps[1].trim().to_string(),
            season,
        };
    }

    SeasonInfo {
        base_name: name.to_string(),
        season: 1,
    }
}

/// Map a single CJK numeral or an ASCII number to a season. Anything else
/// (compound numerals like "十一", or zero) falls back to 1.
fn season_number(raw: &str) -> u32 {
    let cjk: Option<u32> = match raw {
        "一" => Some(1),
        "二" => Some(2),
        "三" => Some(3),
        "四" => Some(4),
        "五" => Some(5),
        "六" => Some(6),
        "七" => Some(7),
        "八" => Some(8),
        "九" => Some(9),
        "十" => Some(10),
        _ => None,
    };
    cjk.or_else(|| raw.parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}
