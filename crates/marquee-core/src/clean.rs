//! Title cleaning: strip season, edition and subtitle noise from display
//! titles so they make better search queries.
//!
//! Rules (all applied globally in one pass, repeated until stable):
//! 1. "之…" suffix: `鬼吹灯之精绝古城` → `鬼吹灯`
//! 2. subtitle after `·`, `:`, `：` or `-`
//! 3. parenthetical notes, ASCII or fullwidth brackets
//! 4. configured noise tokens (edition/cut/dub markers)
//! 5. whitespace-separated arc markers ending in `篇`
//! 6. season markers `第N季`

use regex::Regex;

use crate::error::CoreError;

const SUFFIX_RULE: &str = r"之[^·:：\-()\s]*";
const SUBTITLE_RULE: &str = r"[·:：\-].*$";
const PARENTHETICAL_RULE: &str = r"[（(][^）)]*[)）]";
const ARC_RULE: &str = r"\s+[^\s]+篇";
const SEASON_RULE: &str = r"第[0-9一二三四五六七八九十]+季";

/// Compiled noise-stripping rules for one noise-token list.
#[derive(Debug, Clone)]
pub struct TitleCleaner {
    pattern: Regex,
}

impl TitleCleaner {
    /// Build a cleaner that additionally strips each of `noise_tokens`.
    ///
    /// Tokens are matched literally. Blank tokens are ignored.
    pub fn new<S: AsRef<str>>(noise_tokens: &[S]) -> Result<Self, CoreError> {
        let mut alternatives = vec![SUFFIX_RULE.to_string(), SUBTITLE_RULE.to_string()];
        alternatives.push(PARENTHETICAL_RULE.to_string());
        alternatives.extend(
            noise_tokens
                .iter()
                .map(|t| t.as_ref().trim())
                .filter(|t| !t.is_empty())
                .map(regex::escape),
        );
        alternatives.push(ARC_RULE.to_string());
        alternatives.push(SEASON_RULE.to_string());

        let pattern = Regex::new(&format!("(?:{})", alternatives.join("|")))?;
        Ok(Self { pattern })
    }

    /// Strip all noise from `raw` and trim the result.
    ///
    /// Returns an empty string when the whole title was noise.
    pub fn clean(&self, raw: &str) -> String {
        let mut current = raw.trim().to_string();
        loop {
            let next = self.pattern.replace_all(&current, "").trim().to_string();
            if next == current {
                return current;
            }
            current = next;
        }
    }

    /// The string to send to a search API: the cleaned title, or the trimmed
    /// raw title when cleaning left nothing usable.
    pub fn query_for(&self, raw: &str) -> String {
        let cleaned = self.clean(raw);
        if cleaned.is_empty() {
            raw.trim().to_string()
        } else {
            cleaned
        }
    }
}
