//! Prompt text for the two completions that make up a digest.

use digest_core::dates::format_date_for_digest;
use digest_core::{CoreError, GroupedPosts, TrendPost};

pub const DIGEST_TITLE: &str = "Reddit Digest";
pub const OTHER_SUBREDDITS_HEADING: &str = "Other subreddits";
pub const TRENDS_HEADING: &str = "#### General trends";
pub const TREND_COUNT: usize = 5;

/// Instructions plus the grouped posts for the top-posts section.
///
/// `digest_date` is `YYYY-MM-DD`; the heading shows it as `DD-MM-YYYY`.
pub fn top_posts_prompt(grouped: &GroupedPosts, digest_date: &str) -> Result<String, CoreError> {
    let heading_date = format_date_for_digest(digest_date);
    let data = serde_json::to_string_pretty(grouped)?;

    Ok(format!(
        "Review the list of posts below. Leave out humorous posts, memes, pictures and videos. \
Focus on technical publications and descriptions of user experience.\n\n\
GROUPING RULES:\n\
1. Subreddits with 5 or more posts: give each its own section and list up to 10 of its most popular posts\n\
2. Subreddits with fewer than 5 posts: merge them into one '{other}' section\n\n\
ALWAYS link every post. Use this layout:\n\n\
# {title} • {heading_date}\n\n\
## r/[Subreddit] (for major subreddits)\n\
### TOP 10\n\
1. **[Title]** - short description (👍 [score] | 💬 [comments]) [🔗 Link](permalink)\n\
...\n\n\
## {other} (for minor subreddits)\n\
### r/[Subreddit]\n\
1. **[Title]** - short description (👍 [score] | 💬 [comments]) [🔗 Link](permalink)\n\
...\n\n\
IMPORTANT: for every post use the exact URL from its 'permalink' field as [🔗 Link](permalink_url). \
Do NOT add a trends section, it is added separately.\n\n\
Data to analyze:\n{data}",
        other = OTHER_SUBREDDITS_HEADING,
        title = DIGEST_TITLE,
    ))
}

/// Instructions plus every collected post for the trends section.
pub fn trends_prompt(subreddits: &[String], posts: &[TrendPost]) -> Result<String, CoreError> {
    let data = serde_json::to_string_pretty(posts)?;
    let communities = subreddits.join(", ");

    Ok(format!(
        "Analyze all of the posts below from the subreddits {communities}. \
Find the {TREND_COUNT} most important and popular trends in the discussions. \
Leave out humorous posts and memes. \
Focus on technical topics, user experience and new AI capabilities. \
Describe each trend in at most 3 sentences, short and to the point. \
Answer format:\n\n\
{TRENDS_HEADING}\n\
* **[Trend name]** - short description in 1-3 sentences. Approximate number of posts: [number]\n\
* **[Trend name]** - short description in 1-3 sentences. Approximate number of posts: [number]\n\
...\n\n\
Data to analyze:\n{data}"
    ))
}
