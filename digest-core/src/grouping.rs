//! Bucketing of filtered posts by community for the summarization prompt.

use crate::types::Post;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::collections::HashMap;

/// A community needs at least this many posts for its own digest section.
pub const MAJOR_GROUP_MIN_POSTS: usize = 5;

/// Posts per major section, enforced by the prompt rather than here.
pub const TOP_POSTS_PER_GROUP: usize = 10;

pub const TOP_POST_BODY_CHARS: usize = 500;
pub const TREND_BODY_CHARS: usize = 200;

/// Cuts `text` to at most `max_chars` characters. Never splits a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// The fields of a post a summarization prompt needs.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct LightPost {
    pub title: String,
    pub score: i64,
    pub num_comments: i64,
    pub permalink: String,
    pub selftext: String,
    pub author: String,
}

impl LightPost {
    pub fn project(post: &Post, body_chars: usize) -> Self {
        Self {
            title: post.title.clone(),
            score: post.score,
            num_comments: post.num_comments,
            permalink: post.permalink.clone(),
            selftext: truncate_chars(&post.selftext, body_chars),
            author: post.author.clone(),
        }
    }
}

/// Projection of an unfiltered post for trend analysis.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct TrendPost {
    pub title: String,
    pub subreddit: String,
    pub score: i64,
    pub num_comments: i64,
    pub selftext: String,
}

impl TrendPost {
    pub fn project(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            subreddit: post.subreddit.clone(),
            score: post.score,
            num_comments: post.num_comments,
            selftext: truncate_chars(&post.selftext, TREND_BODY_CHARS),
        }
    }
}

pub fn trend_projection(posts: &[Post]) -> Vec<TrendPost> {
    posts.iter().map(TrendPost::project).collect()
}

/// Community name to posts, in first-seen order. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommunityGroups {
    groups: Vec<(String, Vec<LightPost>)>,
}

impl CommunityGroups {
    pub fn get(&self, community: &str) -> Option<&[LightPost]> {
        self.groups
            .iter()
            .find(|(name, _)| name == community)
            .map(|(_, posts)| posts.as_slice())
    }

    pub fn contains(&self, community: &str) -> bool {
        self.get(community).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LightPost])> {
        self.groups
            .iter()
            .map(|(name, posts)| (name.as_str(), posts.as_slice()))
    }

    /// Number of communities.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn post_count(&self) -> usize {
        self.groups.iter().map(|(_, posts)| posts.len()).sum()
    }
}

impl Serialize for CommunityGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (name, posts) in &self.groups {
            map.serialize_entry(name, posts)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct GroupedPosts {
    pub major_subreddits: CommunityGroups,
    pub minor_subreddits: CommunityGroups,
}

impl GroupedPosts {
    pub fn post_count(&self) -> usize {
        self.major_subreddits.post_count() + self.minor_subreddits.post_count()
    }

    pub fn is_empty(&self) -> bool {
        self.major_subreddits.is_empty() && self.minor_subreddits.is_empty()
    }
}

/// Groups posts by their own community and splits communities into major
/// (at least [`MAJOR_GROUP_MIN_POSTS`]) and minor. Arrival order is kept
/// inside each group; no ranking happens here.
pub fn group_posts(posts: &[Post]) -> GroupedPosts {
    let mut order: Vec<(String, Vec<LightPost>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for post in posts {
        let slot = *index.entry(post.subreddit.as_str()).or_insert_with(|| {
            order.push((post.subreddit.clone(), Vec::new()));
            order.len() - 1
        });
        order[slot]
            .1
            .push(LightPost::project(post, TOP_POST_BODY_CHARS));
    }

    let (major, minor): (Vec<_>, Vec<_>) = order
        .into_iter()
        .partition(|(_, group)| group.len() >= MAJOR_GROUP_MIN_POSTS);

    GroupedPosts {
        major_subreddits: CommunityGroups { groups: major },
        minor_subreddits: CommunityGroups { groups: minor },
    }
}
