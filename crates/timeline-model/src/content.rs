//! Narration content items.

use serde::{Deserialize, Serialize};

/// A piece of text content to narrate and overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default)]
    pub title: String,

    #[serde(default, alias = "content", alias = "text")]
    pub body: String,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    /// Popularity used to rank items (e.g. upvotes).
    #[serde(default)]
    pub score: Option<i64>,
}

impl ContentItem {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            id: None,
            author: None,
            score: None,
        }
    }

    /// `title + ". " + body`, trimmed. Missing parts are skipped.
    pub fn narration_text(&self) -> String {
        let title = self.title.trim();
        let body = self.body.trim();
        match (title.is_empty(), body.is_empty()) {
            (false, false) => format!("{title}. {body}"),
            (false, true) => title.to_string(),
            (true, false) => body.to_string(),
            (true, true) => String::new(),
        }
    }

    /// Narration text limited to `max_words` words. Truncated text ends
    /// with `...`.
    pub fn narration_text_limited(&self, max_words: usize) -> String {
        let text = self.narration_text();
        let words: Vec<&str> = text.split_whitespace().collect();
        if max_words == 0 || words.len() <= max_words {
            return words.join(" ");
        }
        format!("{}...", words[..max_words].join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narration_text_joins_title_and_body() {
        let item = ContentItem::new("Keep going", "Every day counts.");
        assert_eq!(item.narration_text(), "Keep going. Every day counts.");
        assert_eq!(ContentItem::new("", "  ").narration_text(), "");
        assert_eq!(ContentItem::new("", "Only body").narration_text(), "Only body");
    }

    #[test]
    fn test_limit_truncates_with_ellipsis() {
        let item = ContentItem::new("One", "two three four five");
        assert_eq!(item.narration_text_limited(3), "One. two three...");
        assert_eq!(item.narration_text_limited(10), "One. two three four five");
    }

    #[test]
    fn test_body_aliases() {
        let item: ContentItem =
            serde_json::from_str(r#"{"title": "T", "content": "from content"}"#).unwrap();
        assert_eq!(item.body, "from content");
    }
}
