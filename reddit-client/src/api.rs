use digest_core::{CollectionWindow, CoreError, Post, RedditApiError, DELETED_AUTHOR};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";
pub const REDDIT_WEB_BASE: &str = "https://reddit.com";

/// Largest page the listing endpoints hand out.
pub const PAGE_SIZE: u32 = 100;

const DEFAULT_RATE_LIMIT_WAIT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

/// Submission fields as the listing endpoints return them.
///
/// Anything but `id` and `created_utc` may be absent or null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedditPostData {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created_utc: f64,
    pub title: Option<String>,
    pub selftext: Option<String>,
    pub score: Option<i64>,
    pub num_comments: Option<i64>,
    pub permalink: Option<String>,
    pub author: Option<String>,
    pub link_flair_text: Option<String>,
    pub subreddit: Option<String>,
    pub url: Option<String>,
    pub post_hint: Option<String>,
}

impl RedditPostData {
    pub fn into_post(self, subreddit: &str) -> Post {
        Post {
            id: self.id,
            created_utc: self.created_utc as i64,
            title: self.title.unwrap_or_default(),
            selftext: self.selftext.unwrap_or_default(),
            score: self.score.unwrap_or_default(),
            num_comments: self.num_comments.unwrap_or_default(),
            permalink: format!("{}{}", REDDIT_WEB_BASE, self.permalink.unwrap_or_default()),
            author: self.author.unwrap_or_else(|| DELETED_AUTHOR.to_string()),
            link_flair_text: self.link_flair_text,
            subreddit: subreddit.to_string(),
            url: self.url.unwrap_or_default(),
            post_hint: self.post_hint,
        }
    }
}

/// What a page of newest-first submissions meant for the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Every submission was newer than the window start; keep paging.
    Continue,
    /// Hit a submission older than the window start.
    ReachedWindowStart,
    /// The per-community budget is spent.
    BudgetExhausted,
}

/// Walks one newest-first page, keeping submissions inside `window`.
///
/// `seen` counts every submission inspected so far for the community and
/// stops the walk once it reaches `budget`.
pub fn absorb_page(
    page: Vec<RedditPostData>,
    subreddit: &str,
    window: &CollectionWindow,
    seen: &mut u32,
    budget: u32,
    kept: &mut Vec<Post>,
) -> PageOutcome {
    for data in page {
        if *seen >= budget {
            return PageOutcome::BudgetExhausted;
        }
        *seen += 1;

        let created = data.created_utc as i64;
        if created < window.start_timestamp() {
            return PageOutcome::ReachedWindowStart;
        }
        if window.contains(created) {
            kept.push(data.into_post(subreddit));
        }
    }

    if *seen >= budget {
        PageOutcome::BudgetExhausted
    } else {
        PageOutcome::Continue
    }
}

/// Maps a non-success status to the error the rest of the crate reasons about.
pub fn status_error(status: StatusCode, headers: &HeaderMap, subreddit: &str) -> CoreError {
    let error = match status.as_u16() {
        429 => {
            let retry_after = headers
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RATE_LIMIT_WAIT_SECS);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        401 => RedditApiError::InvalidToken,
        403 => RedditApiError::Forbidden {
            resource: format!("r/{subreddit}"),
        },
        404 => RedditApiError::SubredditNotFound {
            subreddit: subreddit.to_string(),
        },
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => {
            return CoreError::RequestFailed {
                message: format!("unexpected status {code} for r/{subreddit}"),
                status_code: Some(code),
            }
        }
    };
    CoreError::RedditApi(error)
}

#[derive(Debug, Clone)]
pub struct RedditApiClient {
    http_client: Client,
    base_url: String,
}

impl RedditApiClient {
    pub fn new(user_agent: &str) -> Result<Self, CoreError> {
        Self::with_base_url(user_agent, REDDIT_API_BASE)
    }

    pub fn with_base_url(user_agent: &str, base_url: &str) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn make_request(
        &self,
        endpoint: &str,
        access_token: &str,
        subreddit: &str,
        query_params: &[(&str, &str)],
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.base_url, endpoint);

        debug!("Making Reddit API request: GET {}", endpoint);
        let response = self
            .http_client
            .request(Method::GET, &url)
            .bearer_auth(access_token)
            .query(query_params)
            .send()
            .await
            .map_err(|e| {
                error!("Network error for GET {}: {}", endpoint, e);
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        warn!("Request failed with status {} for {}", status, endpoint);
        Err(status_error(status, response.headers(), subreddit))
    }

    /// One page of `/r/{subreddit}/new`.
    pub async fn get_new_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/new", subreddit);
        let limit = limit.to_string();
        let mut params = vec![("limit", limit.as_str()), ("raw_json", "1")];
        if let Some(after) = after {
            params.push(("after", after));
        }

        let response = self
            .make_request(&endpoint, access_token, subreddit, &params)
            .await?;

        response.json().await.map_err(|e| {
            error!("Failed to parse posts for r/{}: {}", subreddit, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })
    }

    /// Every submission in `subreddit` created inside `window`, newest first.
    ///
    /// Pages through the newest listing until a submission predates the
    /// window, the listing runs out, or `max_posts` submissions were seen.
    pub async fn collect_window(
        &self,
        access_token: &str,
        subreddit: &str,
        window: &CollectionWindow,
        max_posts: u32,
    ) -> Result<Vec<Post>, CoreError> {
        let mut kept = Vec::new();
        let mut seen = 0;
        let mut after: Option<String> = None;

        loop {
            let limit = PAGE_SIZE.min(max_posts.saturating_sub(seen)).max(1);
            let listing = self
                .get_new_posts(access_token, subreddit, limit, after.as_deref())
                .await?;
            let page: Vec<RedditPostData> = listing
                .data
                .children
                .into_iter()
                .map(|child| child.data)
                .collect();
            let page_len = page.len();

            let outcome = absorb_page(page, subreddit, window, &mut seen, max_posts, &mut kept);
            debug!(
                "r/{}: page of {} posts, {} kept so far ({:?})",
                subreddit,
                page_len,
                kept.len(),
                outcome
            );

            after = listing.data.after;
            if outcome != PageOutcome::Continue || after.is_none() || page_len == 0 {
                break;
            }
        }

        info!("Collected {} posts from r/{}", kept.len(), subreddit);
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window() -> CollectionWindow {
        CollectionWindow {
            date: "2024-05-01".to_string(),
            start: Utc.with_ymd_and_hms(2024, 4, 30, 22, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 5, 1, 21, 59, 59).unwrap(),
        }
    }

    fn raw(id: &str, created_utc: f64) -> RedditPostData {
        RedditPostData {
            id: id.to_string(),
            created_utc,
            title: Some(format!("post {id}")),
            ..Default::default()
        }
    }

    #[test]
    fn test_post_conversion_fills_gaps() {
        let data = RedditPostData {
            id: "abc123".to_string(),
            created_utc: 1714600000.75,
            title: Some("Release notes".to_string()),
            permalink: Some("/r/OpenAI/comments/abc123/release_notes/".to_string()),
            score: Some(42),
            ..Default::default()
        };

        let post = data.into_post("OpenAI");
        assert_eq!(post.created_utc, 1714600000);
        assert_eq!(
            post.permalink,
            "https://reddit.com/r/OpenAI/comments/abc123/release_notes/"
        );
        assert_eq!(post.author, DELETED_AUTHOR);
        assert_eq!(post.subreddit, "OpenAI");
        assert_eq!(post.selftext, "");
        assert_eq!(post.num_comments, 0);
        assert_eq!(post.link_flair_text, None);
    }

    #[test]
    fn test_listing_deserializes_nulls() {
        let body = r#"{
            "kind": "Listing",
            "data": {
                "after": "t3_next",
                "before": null,
                "dist": 1,
                "children": [{
                    "kind": "t3",
                    "data": {
                        "id": "x1",
                        "created_utc": 1714600000.0,
                        "title": "Hello",
                        "selftext": "",
                        "author": null,
                        "link_flair_text": null,
                        "post_hint": "image",
                        "subreddit": "ClaudeAI",
                        "url": "https://i.redd.it/x1.png",
                        "permalink": "/r/ClaudeAI/comments/x1/hello/",
                        "score": 7,
                        "num_comments": 2,
                        "over_18": false
                    }
                }]
            }
        }"#;

        let listing: RedditListing<RedditPostData> = serde_json::from_str(body).unwrap();
        assert_eq!(listing.data.after.as_deref(), Some("t3_next"));

        let post = listing.data.children[0].data.clone().into_post("ClaudeAI");
        assert_eq!(post.author, DELETED_AUTHOR);
        assert_eq!(post.post_hint.as_deref(), Some("image"));
        assert_eq!(post.score, 7);
    }

    #[test]
    fn test_absorb_page_stops_at_window_start() {
        let window = window();
        let page = vec![
            raw("today", (window.end_timestamp() + 10) as f64),
            raw("late", window.end_timestamp() as f64),
            raw("early", window.start_timestamp() as f64),
            raw("yesterday", (window.start_timestamp() - 1) as f64),
            raw("never_seen", (window.start_timestamp() + 5) as f64),
        ];

        let mut seen = 0;
        let mut kept = Vec::new();
        let outcome = absorb_page(page, "OpenAI", &window, &mut seen, 1000, &mut kept);

        assert_eq!(outcome, PageOutcome::ReachedWindowStart);
        assert_eq!(seen, 4);
        let ids: Vec<&str> = kept.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["late", "early"]);
    }

    #[test]
    fn test_absorb_page_respects_budget() {
        let window = window();
        let inside = (window.start_timestamp() + 60) as f64;
        let page: Vec<_> = (0..5).map(|i| raw(&format!("p{i}"), inside)).collect();

        let mut seen = 0;
        let mut kept = Vec::new();
        let outcome = absorb_page(page, "OpenAI", &window, &mut seen, 3, &mut kept);

        assert_eq!(outcome, PageOutcome::BudgetExhausted);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_absorb_page_continues_when_whole_page_is_newer() {
        let window = window();
        let inside = (window.start_timestamp() + 60) as f64;
        let page: Vec<_> = (0..2).map(|i| raw(&format!("p{i}"), inside)).collect();

        let mut seen = 0;
        let mut kept = Vec::new();
        let outcome = absorb_page(page, "OpenAI", &window, &mut seen, 1000, &mut kept);

        assert_eq!(outcome, PageOutcome::Continue);
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_status_mapping() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, "17".parse().unwrap());
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, &headers, "grok"),
            CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 17 })
        ));

        let empty = HeaderMap::new();
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, &empty, "grok"),
            CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 })
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, &empty, "grok"),
            CoreError::RedditApi(RedditApiError::InvalidToken)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, &empty, "grok"),
            CoreError::RedditApi(RedditApiError::Forbidden { .. })
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, &empty, "grok"),
            CoreError::RedditApi(RedditApiError::SubredditNotFound { .. })
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, &empty, "grok"),
            CoreError::RedditApi(RedditApiError::ServerError { status_code: 502 })
        ));
        assert!(matches!(
            status_error(StatusCode::IM_A_TEAPOT, &empty, "grok"),
            CoreError::RequestFailed {
                status_code: Some(418),
                ..
            }
        ));
    }

    #[test]
    fn test_client_base_url_is_normalized() {
        let client =
            RedditApiClient::with_base_url("digest-test/0.1", "http://localhost:9/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:9");
    }
}
