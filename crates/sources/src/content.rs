//! Content loading and narration text preparation.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use reelkit_common::config::ContentDefaults;
use reelkit_common::error::{ReelError, ReelResult};
use reelkit_processing_core::duration::estimate_reading_duration;
use reelkit_timeline_model::content::ContentItem;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("valid regex"));
static STRIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~(.*?)~~").expect("valid regex"));
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.*?)\]\(.*?\)").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip Markdown emphasis and links, decode the common HTML entities,
/// and collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let text = BOLD.replace_all(text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = STRIKE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = text
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Cleaned `title. body`, limited to `max_words` words.
pub fn prepare_narration_text(item: &ContentItem, max_words: usize) -> String {
    let cleaned = ContentItem {
        title: clean_text(&item.title),
        body: clean_text(&item.body),
        ..item.clone()
    };
    cleaned.narration_text_limited(max_words)
}

/// Load content items from a JSON array, a JSON object with an `items` or
/// `posts` array, or JSON Lines. Every item is cleaned on load.
pub fn load_content(path: &Path) -> ReelResult<Vec<ContentItem>> {
    if !path.exists() {
        return Err(ReelError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path)?;
    let is_jsonl = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jsonl"))
        .unwrap_or(false);

    let items = if is_jsonl {
        parse_jsonl(&raw)?
    } else {
        parse_json(&raw)?
    };

    let items: Vec<ContentItem> = items
        .into_iter()
        .map(|item| ContentItem {
            title: clean_text(&item.title),
            body: clean_text(&item.body),
            ..item
        })
        .collect();

    tracing::info!(path = %path.display(), items = items.len(), "Content loaded");
    if items.is_empty() {
        return Err(ReelError::empty_content(format!(
            "{} contains no content items",
            path.display()
        )));
    }
    Ok(items)
}

/// Reading-time window and ranking target for batch content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentSelection {
    pub min_reading_secs: f64,
    pub max_reading_secs: f64,
    pub target_reading_secs: f64,
    pub words_per_minute: f64,
}

impl ContentSelection {
    pub fn from_config(defaults: &ContentDefaults, words_per_minute: f64) -> Self {
        Self {
            min_reading_secs: defaults.min_reading_secs,
            max_reading_secs: defaults.max_reading_secs,
            target_reading_secs: defaults.target_reading_secs,
            words_per_minute,
        }
    }

    /// Estimated reading time of the item's full narration text.
    pub fn reading_secs(&self, item: &ContentItem) -> f64 {
        let words = item.narration_text().split_whitespace().count();
        estimate_reading_duration(words, self.words_per_minute)
    }
}

/// Keep items whose reading time lies in the selection window, ranked by
/// score (highest first, missing counts as 0) and then by closeness to the
/// target reading time. Ties keep file order.
pub fn select_content(
    items: Vec<ContentItem>,
    selection: &ContentSelection,
) -> ReelResult<Vec<ContentItem>> {
    if !(selection.words_per_minute > 0.0) {
        return Err(ReelError::config(format!(
            "words per minute must be positive, got {}",
            selection.words_per_minute
        )));
    }
    if selection.min_reading_secs > selection.max_reading_secs {
        return Err(ReelError::config(format!(
            "reading window [{}, {}] is empty",
            selection.min_reading_secs, selection.max_reading_secs
        )));
    }

    let available = items.len();
    let mut ranked: Vec<(f64, ContentItem)> = items
        .into_iter()
        .map(|item| (selection.reading_secs(&item), item))
        .filter(|(secs, _)| {
            *secs >= selection.min_reading_secs && *secs <= selection.max_reading_secs
        })
        .collect();
    ranked.sort_by(|(a_secs, a), (b_secs, b)| {
        let a_gap = (a_secs - selection.target_reading_secs).abs();
        let b_gap = (b_secs - selection.target_reading_secs).abs();
        b.score
            .unwrap_or(0)
            .cmp(&a.score.unwrap_or(0))
            .then(a_gap.total_cmp(&b_gap))
    });

    tracing::info!(
        available,
        selected = ranked.len(),
        min_secs = selection.min_reading_secs,
        max_secs = selection.max_reading_secs,
        "Content selected"
    );
    if ranked.is_empty() {
        return Err(ReelError::empty_content(format!(
            "none of {available} items reads in {:.0}-{:.0}s",
            selection.min_reading_secs, selection.max_reading_secs
        )));
    }
    Ok(ranked.into_iter().map(|(_, item)| item).collect())
}

fn parse_json(raw: &str) -> ReelResult<Vec<ContentItem>> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum ContentFile {
        List(Vec<ContentItem>),
        Items { items: Vec<ContentItem> },
        Posts { posts: Vec<ContentItem> },
    }

    let parsed: ContentFile = serde_json::from_str(raw)
        .map_err(|e| ReelError::invalid_input(format!("Unrecognized content file: {e}")))?;
    Ok(match parsed {
        ContentFile::List(items) => items,
        ContentFile::Items { items } => items,
        ContentFile::Posts { posts } => posts,
    })
}

fn parse_jsonl(raw: &str) -> ReelResult<Vec<ContentItem>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                ReelError::invalid_input(format!("Content line {}: {e}", i + 1))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_markdown() {
        assert_eq!(
            clean_text("**Bold** and *italic* and ~~gone~~ [link](http://x.y)"),
            "Bold and italic and gone link"
        );
        assert_eq!(clean_text("a &gt; b &amp;&amp; c &lt; d"), "a > b && c < d");
        assert_eq!(clean_text("line one\n\n\nline   two "), "line one line two");
    }

    #[test]
    fn test_prepare_truncates() {
        let item = ContentItem::new("**Big** news", "one two three four");
        assert_eq!(prepare_narration_text(&item, 4), "Big news. one two...");
        assert_eq!(
            prepare_narration_text(&item, 100),
            "Big news. one two three four"
        );
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    fn scored(title: &str, body_words: usize, score: Option<i64>) -> ContentItem {
        ContentItem {
            score,
            ..ContentItem::new(title, words(body_words))
        }
    }

    fn selection() -> ContentSelection {
        ContentSelection {
            min_reading_secs: 30.0,
            max_reading_secs: 180.0,
            target_reading_secs: 90.0,
            words_per_minute: 120.0,
        }
    }

    #[test]
    fn test_select_filters_by_reading_time() {
        // At 120 wpm each word is half a second; titles add one word.
        let items = vec![
            scored("Short", 20, Some(900)),
            scored("Fits", 99, None),
            scored("Long", 400, Some(900)),
        ];
        let picked = select_content(items, &selection()).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].title, "Fits");
    }

    #[test]
    fn test_select_ranks_by_score_then_target_closeness() {
        let items = vec![
            scored("Far", 250, Some(10)),
            scored("Near", 179, Some(10)),
            scored("Popular", 300, Some(50)),
            scored("Unscored", 179, None),
        ];
        let picked = select_content(items, &selection()).unwrap();
        let titles: Vec<&str> = picked.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["Popular", "Near", "Far", "Unscored"]);
    }

    #[test]
    fn test_select_errors() {
        assert!(matches!(
            select_content(vec![scored("Short", 3, None)], &selection()),
            Err(ReelError::EmptyContent { .. })
        ));
        let inverted = ContentSelection {
            min_reading_secs: 200.0,
            ..selection()
        };
        assert!(matches!(
            select_content(vec![scored("Fits", 99, None)], &inverted),
            Err(ReelError::Config { .. })
        ));
    }

    #[test]
    fn test_select_from_config_defaults() {
        let selection = ContentSelection::from_config(&ContentDefaults::default(), 150.0);
        assert_eq!(selection.min_reading_secs, 30.0);
        assert!((selection.reading_secs(&ContentItem::new("", words(150))) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_json_shapes() {
        let dir = tempfile::tempdir().unwrap();

        let list = dir.path().join("list.json");
        std::fs::write(&list, r#"[{"title": "A", "body": "x"}, {"title": "B", "content": "y"}]"#)
            .unwrap();
        let items = load_content(&list).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].body, "y");

        let wrapped = dir.path().join("wrapped.json");
        std::fs::write(&wrapped, r#"{"posts": [{"title": "*C*", "text": "z"}]}"#).unwrap();
        let items = load_content(&wrapped).unwrap();
        assert_eq!(items[0].title, "C");
    }

    #[test]
    fn test_load_jsonl_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.jsonl");
        std::fs::write(
            &path,
            "# exported\n{\"title\": \"One\", \"body\": \"b1\"}\n\n{\"title\": \"Two\", \"body\": \"b2\"}\n",
        )
        .unwrap();
        let items = load_content(&path).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].title, "Two");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_content(&dir.path().join("missing.json")),
            Err(ReelError::FileNotFound { .. })
        ));

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "[]").unwrap();
        assert!(matches!(
            load_content(&empty),
            Err(ReelError::EmptyContent { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{\"nope\": 1}").unwrap();
        assert!(matches!(
            load_content(&bad),
            Err(ReelError::InvalidInput { .. })
        ));
    }
}
