//! Listing and counting helpers behind the pages and the JSON API.

use digest_core::dates::{format_date_for_digest, format_long_date};
use digest_core::CoreError;
use serde::Serialize;
use serde_json::Value;
use storage::{keys, BlobStore, DigestStore};
use tracing::warn;

/// Digests shown on the front page.
pub const RECENT_DIGESTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestSummary {
    pub date: String,
    pub title: String,
    pub formatted_date: String,
    pub file_name: String,
}

impl DigestSummary {
    pub fn for_date(date: &str) -> Self {
        let key = keys::digest(date);
        let file_name = key.rsplit('/').next().unwrap_or(&key).to_string();
        Self {
            date: date.to_string(),
            title: format!("Reddit Digest • {}", format_date_for_digest(date)),
            formatted_date: format_long_date(date),
            file_name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteStats {
    pub total_digests: usize,
    pub total_subreddits: usize,
    pub total_posts: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DigestStats {
    pub date: String,
    pub total_posts: u64,
    pub filtered_posts: u64,
    /// Configured communities that have surviving posts, in configured order.
    pub subreddit_counts: Vec<(String, usize)>,
}

/// Previous (older) and next (newer) digests around a date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighbours {
    pub previous: Option<DigestSummary>,
    pub next: Option<DigestSummary>,
}

/// All digests, newest first.
pub async fn digest_list<B: BlobStore>(
    store: &DigestStore<B>,
) -> Result<Vec<DigestSummary>, CoreError> {
    Ok(store
        .digest_dates()
        .await?
        .iter()
        .map(|date| DigestSummary::for_date(date))
        .collect())
}

pub fn neighbours(digests: &[DigestSummary], date: &str) -> Neighbours {
    let Some(index) = digests.iter().position(|d| d.date == date) else {
        return Neighbours::default();
    };
    Neighbours {
        previous: digests.get(index + 1).cloned(),
        next: index.checked_sub(1).and_then(|i| digests.get(i)).cloned(),
    }
}

/// Posts collected for a day, from whichever count the document carries.
pub fn collected_count(document: &Value) -> u64 {
    document
        .get("total_posts_collected")
        .and_then(Value::as_u64)
        .or_else(|| document.get("total_posts").and_then(Value::as_u64))
        .or_else(|| {
            document
                .get("posts")
                .and_then(Value::as_array)
                .map(|posts| posts.len() as u64)
        })
        .unwrap_or(0)
}

fn filtered_count(document: &Value) -> u64 {
    document
        .get("total_posts_filtered")
        .and_then(Value::as_u64)
        .or_else(|| document.get("filtered_posts").and_then(Value::as_u64))
        .unwrap_or(0)
}

pub async fn site_stats<B: BlobStore>(
    store: &DigestStore<B>,
    configured_subreddits: usize,
) -> Result<SiteStats, CoreError> {
    let total_digests = store.digest_dates().await?.len();

    let mut total_posts = 0;
    for date in store.filtered_dates().await? {
        match store.load_filtered_value(&date).await {
            Ok(Some(document)) => total_posts += collected_count(&document),
            Ok(None) => {}
            Err(e) => warn!("Skipping unreadable posts document for {}: {}", date, e),
        }
    }

    Ok(SiteStats {
        total_digests,
        total_subreddits: configured_subreddits,
        total_posts,
    })
}

/// Counts for one digest, or `None` when its posts document is missing.
pub async fn digest_stats<B: BlobStore>(
    store: &DigestStore<B>,
    date: &str,
    configured_subreddits: &[String],
) -> Result<Option<DigestStats>, CoreError> {
    let document = match store.load_filtered_value(date).await {
        Ok(Some(document)) => document,
        Ok(None) => return Ok(None),
        Err(e) => {
            warn!("Posts document for {} is unreadable: {}", date, e);
            return Ok(None);
        }
    };

    let posts = document.get("posts").and_then(Value::as_array);
    let subreddit_counts = configured_subreddits
        .iter()
        .map(|name| {
            let count = posts
                .map(|posts| {
                    posts
                        .iter()
                        .filter(|post| {
                            post.get("subreddit").and_then(Value::as_str) == Some(name.as_str())
                        })
                        .count()
                })
                .unwrap_or(0);
            (name.clone(), count)
        })
        .filter(|(_, count)| *count > 0)
        .collect();

    Ok(Some(DigestStats {
        date: date.to_string(),
        total_posts: document
            .get("total_posts_collected")
            .or_else(|| document.get("total_posts"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
        filtered_posts: filtered_count(&document),
        subreddit_counts,
    }))
}

/// `1234567` → `1 234 567`.
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1 000");
        assert_eq!(format_number(1234567), "1 234 567");
    }

    #[test]
    fn test_collected_count_fallbacks() {
        assert_eq!(
            collected_count(&json!({"total_posts_collected": 12, "total_posts": 3})),
            12
        );
        assert_eq!(collected_count(&json!({"total_posts": 3, "posts": []})), 3);
        assert_eq!(collected_count(&json!({"posts": [{}, {}]})), 2);
        assert_eq!(collected_count(&json!({})), 0);
    }

    #[test]
    fn test_neighbours() {
        let digests: Vec<DigestSummary> = ["2024-05-03", "2024-05-02", "2024-05-01"]
            .iter()
            .map(|d| DigestSummary::for_date(d))
            .collect();

        let middle = neighbours(&digests, "2024-05-02");
        assert_eq!(middle.previous.unwrap().date, "2024-05-01");
        assert_eq!(middle.next.unwrap().date, "2024-05-03");

        let newest = neighbours(&digests, "2024-05-03");
        assert!(newest.next.is_none());
        assert_eq!(newest.previous.unwrap().date, "2024-05-02");

        assert_eq!(neighbours(&digests, "2023-01-01"), Neighbours::default());
    }

    #[test]
    fn test_summary_fields() {
        let summary = DigestSummary::for_date("2024-05-01");
        assert_eq!(summary.title, "Reddit Digest • 01-05-2024");
        assert_eq!(summary.formatted_date, "1 May 2024");
        assert_eq!(summary.file_name, "digest_2024-05-01.md");
    }
}
