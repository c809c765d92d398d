use crate::classifier::NoiseRules;
use crate::types::Post;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_MIN_SCORE: i64 = 30;
pub const DEFAULT_MIN_COMMENTS: i64 = 30;

/// Inclusive lower bounds for the popularity gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_score: i64,
    pub min_comments: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            min_comments: DEFAULT_MIN_COMMENTS,
        }
    }
}

impl Thresholds {
    pub fn new(min_score: i64, min_comments: i64) -> Self {
        Self {
            min_score,
            min_comments,
        }
    }

    /// Either signal is enough.
    pub fn is_popular(&self, post: &Post) -> bool {
        post.score >= self.min_score || post.num_comments >= self.min_comments
    }
}

/// Keeps popular, non-noise posts in their original order.
pub fn filter_posts(posts: &[Post], min_score: i64, min_comments: i64) -> Vec<Post> {
    filter_posts_with(
        posts,
        Thresholds::new(min_score, min_comments),
        NoiseRules::standard(),
    )
}

pub fn filter_posts_with(posts: &[Post], thresholds: Thresholds, rules: &NoiseRules) -> Vec<Post> {
    let filtered: Vec<Post> = posts
        .iter()
        .filter(|post| thresholds.is_popular(post) && !rules.is_noise(post))
        .cloned()
        .collect();

    debug!(
        input = posts.len(),
        kept = filtered.len(),
        min_score = thresholds.min_score,
        min_comments = thresholds.min_comments,
        "Filtered posts"
    );

    filtered
}
