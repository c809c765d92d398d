use digest_core::retry::RetryExecutor;
use digest_core::{group_posts, trend_projection, CoreError};
use llm_interface::{top_posts_prompt, trends_prompt, LlmProvider};
use serde::{Deserialize, Serialize};
use storage::{keys, BlobStore, DigestStore};
use tracing::info;

/// Between the top-posts section and the trends section.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// What the collect stage hands to the summarize stage.
///
/// Serialized field names match the stored invocation payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub date: String,
    pub filtered_posts_s3_key: String,
    pub all_posts_s3_key: String,
}

impl SummarizeRequest {
    pub fn for_date(date: &str) -> Self {
        Self {
            date: date.to_string(),
            filtered_posts_s3_key: keys::filtered_posts(date),
            all_posts_s3_key: keys::all_posts(date),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let missing: Vec<&str> = [
            ("date", &self.date),
            ("filtered_posts_s3_key", &self.filtered_posts_s3_key),
            ("all_posts_s3_key", &self.all_posts_s3_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::invalid_input(format!(
                "summarize request is missing {}",
                missing.join(", ")
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestReport {
    pub date: String,
    pub digest_key: String,
    /// In characters.
    pub digest_size: usize,
    pub total_filtered_posts: usize,
    pub total_all_posts: usize,
}

pub fn compose_digest(top_posts: &str, trends: &str) -> String {
    format!("{top_posts}{SECTION_SEPARATOR}{trends}")
}

/// Turns stored collections into a markdown digest with two completions.
pub struct Summarizer<P, B> {
    provider: P,
    store: DigestStore<B>,
    subreddits: Vec<String>,
    retry: RetryExecutor,
}

impl<P: LlmProvider, B: BlobStore> Summarizer<P, B> {
    pub fn new(provider: P, store: DigestStore<B>, subreddits: Vec<String>) -> Self {
        Self {
            provider,
            store,
            subreddits,
            retry: RetryExecutor::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryExecutor) -> Self {
        self.retry = retry;
        self
    }

    pub async fn summarize(&self, request: &SummarizeRequest) -> Result<DigestReport, CoreError> {
        request.validate()?;

        let filtered = self
            .store
            .load_filtered_at(&request.filtered_posts_s3_key)
            .await?;
        info!("Loaded {} filtered posts", filtered.posts.len());
        let collected = self
            .store
            .load_collected_at(&request.all_posts_s3_key)
            .await?;
        info!("Loaded {} posts for trend analysis", collected.posts.len());

        if filtered.posts.is_empty() {
            return Err(CoreError::invalid_input(format!(
                "no filtered posts for {}",
                request.date
            )));
        }

        let top_prompt = top_posts_prompt(&group_posts(&filtered.posts), &request.date)?;
        info!("Generating top posts with {}", self.provider.name());
        let top_posts = self
            .retry
            .execute("top posts completion", || self.provider.complete(&top_prompt))
            .await?;

        let trend_prompt = trends_prompt(&self.subreddits, &trend_projection(&collected.posts))?;
        info!("Analyzing trends with {}", self.provider.name());
        let trends = self
            .retry
            .execute("trends completion", || self.provider.complete(&trend_prompt))
            .await?;

        let digest = compose_digest(&top_posts, &trends);
        let digest_key = self.store.save_digest(&request.date, &digest).await?;

        Ok(DigestReport {
            date: request.date.clone(),
            digest_key,
            digest_size: digest.chars().count(),
            total_filtered_posts: filtered.posts.len(),
            total_all_posts: collected.posts.len(),
        })
    }
}
