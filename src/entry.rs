use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// One listed item as read from the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    title: String,
    link: String,
    recency: DateTime<Utc>,
}

impl Entry {
    /// Create a new entry
    pub fn new(title: impl Into<String>, link: impl Into<String>, recency: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            recency,
        }
    }

    /// Display text of the item's link
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Link target exactly as written in the listing (may be relative)
    pub fn link(&self) -> &str {
        &self.link
    }

    /// Submission instant, used for ordering
    pub fn recency(&self) -> DateTime<Utc> {
        self.recency
    }

    /// Resolve the link against the page it was found on.
    ///
    /// Falls back to the raw link text when it cannot be joined.
    pub fn resolve_link(&self, base: &Url) -> String {
        base.join(&self.link)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| self.link.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_resolve_link() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let base = Url::parse("https://news.ycombinator.com/newest").unwrap();

        let relative = Entry::new("Ask HN: anything", "item?id=42", at);
        assert_eq!(
            relative.resolve_link(&base),
            "https://news.ycombinator.com/item?id=42"
        );

        let absolute = Entry::new("A post", "https://example.com/post", at);
        assert_eq!(absolute.resolve_link(&base), "https://example.com/post");
        assert_eq!(absolute.link(), "https://example.com/post");
    }
}
