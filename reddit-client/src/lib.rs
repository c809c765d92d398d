pub mod api;
pub mod auth;

use api::RedditApiClient;
use async_trait::async_trait;
use auth::{AppAuthenticator, AppToken};
use digest_core::{CollectionWindow, CoreError, Post, RedditApiError, RedditCredentials};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub use api::{PageOutcome, RedditPostData};

/// Anything that can list one community's submissions for a day.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_window(
        &self,
        subreddit: &str,
        window: &CollectionWindow,
    ) -> Result<Vec<Post>, CoreError>;
}

#[async_trait]
impl<T: PostSource + ?Sized> PostSource for Arc<T> {
    async fn fetch_window(
        &self,
        subreddit: &str,
        window: &CollectionWindow,
    ) -> Result<Vec<Post>, CoreError> {
        (**self).fetch_window(subreddit, window).await
    }
}

/// Application-only Reddit client: one token shared across communities.
#[derive(Debug)]
pub struct RedditClient {
    authenticator: AppAuthenticator,
    api: RedditApiClient,
    max_posts_per_subreddit: u32,
    token: Mutex<Option<AppToken>>,
}

impl RedditClient {
    pub fn new(
        credentials: &RedditCredentials,
        max_posts_per_subreddit: u32,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            authenticator: AppAuthenticator::new(credentials)?,
            api: RedditApiClient::new(&credentials.user_agent)?,
            max_posts_per_subreddit,
            token: Mutex::new(None),
        })
    }

    pub fn max_posts_per_subreddit(&self) -> u32 {
        self.max_posts_per_subreddit
    }

    async fn access_token(&self) -> Result<String, CoreError> {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref().filter(|t| !t.is_expired()) {
            return Ok(current.secret().to_string());
        }

        debug!("No valid application token cached, authenticating");
        let fresh = self.authenticator.authenticate().await?;
        let secret = fresh.secret().to_string();
        *token = Some(fresh);
        Ok(secret)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl PostSource for RedditClient {
    async fn fetch_window(
        &self,
        subreddit: &str,
        window: &CollectionWindow,
    ) -> Result<Vec<Post>, CoreError> {
        let token = self.access_token().await?;
        let result = self
            .api
            .collect_window(&token, subreddit, window, self.max_posts_per_subreddit)
            .await;

        if let Err(CoreError::RedditApi(RedditApiError::InvalidToken)) = &result {
            warn!("Application token rejected, dropping it");
            self.invalidate_token().await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> RedditCredentials {
        RedditCredentials {
            client_id: "test_client_id".to_string(),
            client_secret: "test_client_secret".to_string(),
            user_agent: "digest-script/0.1".to_string(),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = RedditClient::new(&credentials(), 1000).unwrap();
        assert_eq!(client.max_posts_per_subreddit(), 1000);
    }

    #[tokio::test]
    async fn test_token_starts_empty_and_invalidates() {
        let client = RedditClient::new(&credentials(), 1000).unwrap();
        assert!(client.token.lock().await.is_none());

        *client.token.lock().await = Some(AppToken::new(
            "cached".to_string(),
            std::time::Duration::from_secs(3600),
        ));
        assert_eq!(client.access_token().await.unwrap(), "cached");

        client.invalidate_token().await;
        assert!(client.token.lock().await.is_none());
    }
}
