use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Author value used upstream when a submission's author was removed.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// One fetched submission from a community.
///
/// Field names match the upstream mapping and the stored JSON documents.
/// Deserialization never fails on a missing or malformed field: strings
/// degrade to empty, numbers to zero, and optional fields to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub created_utc: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub selftext: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub score: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub num_comments: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub permalink: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub author: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub link_flair_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subreddit: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub post_hint: Option<String>,
}

impl Post {
    pub fn flair(&self) -> &str {
        self.link_flair_text.as_deref().unwrap_or("")
    }

    pub fn hint(&self) -> &str {
        self.post_hint.as_deref().unwrap_or("")
    }

    pub fn is_author_deleted(&self) -> bool {
        self.author == DELETED_AUTHOR
    }
}

/// Everything fetched for one date, before filtering.
/// Stored under `data/all_posts_<date>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedPosts {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub total_posts: usize,
    pub posts: Vec<Post>,
}

impl CollectedPosts {
    pub fn new(date: String, start_time: String, end_time: String, posts: Vec<Post>) -> Self {
        Self {
            date,
            start_time,
            end_time,
            total_posts: posts.len(),
            posts,
        }
    }
}

/// Surviving posts for one date. Stored under `data/posts_<date>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredPosts {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub total_posts_collected: usize,
    pub total_posts_filtered: usize,
    pub posts: Vec<Post>,
}

impl FilteredPosts {
    pub fn from_collected(collected: &CollectedPosts, posts: Vec<Post>) -> Self {
        Self {
            date: collected.date.clone(),
            start_time: collected.start_time.clone(),
            end_time: collected.end_time.clone(),
            total_posts_collected: collected.posts.len(),
            total_posts_filtered: posts.len(),
            posts,
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_string).unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_string))
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(coerce_i64).unwrap_or(0))
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Arrays and objects carry no usable text
        _ => None,
    }
}

fn coerce_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}
