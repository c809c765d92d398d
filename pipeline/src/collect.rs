use digest_core::retry::RetryExecutor;
use digest_core::{
    filter_posts, CollectedPosts, CollectionWindow, CoreError, FilteredPosts, Post, RedditApiError,
    Thresholds,
};
use reddit_client::PostSource;
use serde::Serialize;
use storage::{BlobStore, DigestStore};
use tracing::{info, warn};

use crate::summarize::SummarizeRequest;

/// Result of a stage that may legitimately decline to run.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    Completed(T),
    Skipped { reason: String },
}

impl<T> StageOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            StageOutcome::Completed(value) => Some(value),
            StageOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StageOutcome::Skipped { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectReport {
    pub date: String,
    pub all_posts_key: String,
    pub filtered_posts_key: String,
    pub total_posts_collected: usize,
    pub total_posts_filtered: usize,
    pub skipped_subreddits: Vec<String>,
}

impl CollectReport {
    /// The hand-off for the summarize stage.
    pub fn summarize_request(&self) -> SummarizeRequest {
        SummarizeRequest {
            date: self.date.clone(),
            filtered_posts_s3_key: self.filtered_posts_key.clone(),
            all_posts_s3_key: self.all_posts_key.clone(),
        }
    }
}

/// Fetches a day of posts from every configured community and stores both
/// the raw and the filtered collection.
pub struct Collector<S, B> {
    source: S,
    store: DigestStore<B>,
    subreddits: Vec<String>,
    thresholds: Thresholds,
    retry: RetryExecutor,
}

impl<S: PostSource, B: BlobStore> Collector<S, B> {
    pub fn new(
        source: S,
        store: DigestStore<B>,
        subreddits: Vec<String>,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            source,
            store,
            subreddits,
            thresholds,
            retry: RetryExecutor::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryExecutor) -> Self {
        self.retry = retry;
        self
    }

    pub fn subreddits(&self) -> &[String] {
        &self.subreddits
    }

    pub async fn collect(
        &self,
        window: &CollectionWindow,
    ) -> Result<StageOutcome<CollectReport>, CoreError> {
        if self.store.has_collected(&window.date).await? {
            info!("Posts for {} already collected, skipping", window.date);
            return Ok(StageOutcome::Skipped {
                reason: format!("posts for {} already collected", window.date),
            });
        }

        info!(
            "Collecting posts for {} ({} to {})",
            window.date,
            window.start_time_iso(),
            window.end_time_iso()
        );
        let (posts, skipped_subreddits) = self.fetch_all(window).await?;

        let collected = CollectedPosts::new(
            window.date.clone(),
            window.start_time_iso(),
            window.end_time_iso(),
            posts,
        );
        let all_posts_key = self.store.save_collected(&collected).await?;

        let filtered = filter_document(&collected, self.thresholds);
        let filtered_posts_key = self.store.save_filtered(&filtered).await?;

        Ok(StageOutcome::Completed(CollectReport {
            date: window.date.clone(),
            all_posts_key,
            filtered_posts_key,
            total_posts_collected: filtered.total_posts_collected,
            total_posts_filtered: filtered.total_posts_filtered,
            skipped_subreddits,
        }))
    }

    /// Posts from every community, in configured order. Communities that do
    /// not exist or are closed to the client are skipped by name.
    pub async fn fetch_all(
        &self,
        window: &CollectionWindow,
    ) -> Result<(Vec<Post>, Vec<String>), CoreError> {
        let mut posts = Vec::new();
        let mut skipped = Vec::new();

        for subreddit in &self.subreddits {
            let operation = format!("fetch r/{subreddit}");
            let result = self
                .retry
                .execute(&operation, || self.source.fetch_window(subreddit, window))
                .await;

            match result {
                Ok(fetched) => {
                    info!("Fetched {} posts from r/{}", fetched.len(), subreddit);
                    posts.extend(fetched);
                }
                Err(
                    e @ CoreError::RedditApi(
                        RedditApiError::SubredditNotFound { .. } | RedditApiError::Forbidden { .. },
                    ),
                ) => {
                    warn!("Skipping r/{}: {}", subreddit, e);
                    skipped.push(subreddit.clone());
                }
                Err(e) => return Err(e),
            }
        }

        info!("Collected {} posts in total", posts.len());
        Ok((posts, skipped))
    }

    pub async fn filter_collected(&self, date: &str) -> Result<FilteredPosts, CoreError> {
        refilter(&self.store, date, self.thresholds).await
    }
}

/// Re-runs the popularity filter over a stored collection and overwrites the
/// filtered document for that day.
pub async fn refilter<B: BlobStore>(
    store: &DigestStore<B>,
    date: &str,
    thresholds: Thresholds,
) -> Result<FilteredPosts, CoreError> {
    let collected = store.load_collected(date).await?;
    let filtered = filter_document(&collected, thresholds);
    store.save_filtered(&filtered).await?;
    Ok(filtered)
}

fn filter_document(collected: &CollectedPosts, thresholds: Thresholds) -> FilteredPosts {
    let kept = filter_posts(&collected.posts, thresholds.min_score, thresholds.min_comments);
    info!(
        "Filtered {} posts down to {} for {}",
        collected.posts.len(),
        kept.len(),
        collected.date
    );
    FilteredPosts::from_collected(collected, kept)
}
