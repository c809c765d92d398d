use crate::{keys, BlobStore, JSON_CONTENT_TYPE, MARKDOWN_CONTENT_TYPE};
use digest_core::{CollectedPosts, CoreError, FilteredPosts, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Typed access to the documents of a digest run on top of a [`BlobStore`].
#[derive(Debug)]
pub struct DigestStore<B> {
    blobs: Arc<B>,
}

impl<B> Clone for DigestStore<B> {
    fn clone(&self) -> Self {
        Self {
            blobs: Arc::clone(&self.blobs),
        }
    }
}

impl<B: BlobStore> DigestStore<B> {
    pub fn new(blobs: B) -> Self {
        Self::from_shared(Arc::new(blobs))
    }

    pub fn from_shared(blobs: Arc<B>) -> Self {
        Self { blobs }
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    pub async fn has_collected(&self, date: &str) -> Result<bool, CoreError> {
        self.blobs.exists(&keys::all_posts(date)).await
    }

    pub async fn save_collected(&self, collected: &CollectedPosts) -> Result<String, CoreError> {
        let key = keys::all_posts(&collected.date);
        self.put_json(&key, collected).await?;
        info!(
            "Saved {} collected posts for {} to {}",
            collected.total_posts, collected.date, key
        );
        Ok(key)
    }

    pub async fn load_collected(&self, date: &str) -> Result<CollectedPosts, CoreError> {
        self.load_collected_at(&keys::all_posts(date)).await
    }

    pub async fn load_collected_at(&self, key: &str) -> Result<CollectedPosts, CoreError> {
        self.get_json(key)
            .await?
            .ok_or_else(|| CoreError::not_found(key))
    }

    pub async fn save_filtered(&self, filtered: &FilteredPosts) -> Result<String, CoreError> {
        let key = keys::filtered_posts(&filtered.date);
        self.put_json(&key, filtered).await?;
        info!(
            "Saved {} of {} posts for {} to {}",
            filtered.total_posts_filtered, filtered.total_posts_collected, filtered.date, key
        );
        Ok(key)
    }

    pub async fn load_filtered(&self, date: &str) -> Result<FilteredPosts, CoreError> {
        self.load_filtered_at(&keys::filtered_posts(date)).await
    }

    pub async fn load_filtered_at(&self, key: &str) -> Result<FilteredPosts, CoreError> {
        self.get_json(key)
            .await?
            .ok_or_else(|| CoreError::not_found(key))
    }

    /// A filtered-posts document as loose JSON, for readers that tolerate
    /// older layouts.
    pub async fn load_filtered_value(
        &self,
        date: &str,
    ) -> Result<Option<serde_json::Value>, CoreError> {
        self.get_json(&keys::filtered_posts(date)).await
    }

    /// Dates that have a filtered-posts document, ascending.
    pub async fn filtered_dates(&self) -> Result<Vec<String>, CoreError> {
        let listed = self.blobs.list(keys::filtered_posts_prefix()).await?;
        Ok(listed
            .iter()
            .filter_map(|key| keys::filtered_posts_date(key))
            .map(str::to_string)
            .collect())
    }

    pub async fn save_digest(&self, date: &str, markdown: &str) -> Result<String, CoreError> {
        let key = keys::digest(date);
        self.blobs
            .put(&key, markdown.as_bytes().to_vec(), MARKDOWN_CONTENT_TYPE)
            .await?;
        info!("Saved digest for {} to {} ({} bytes)", date, key, markdown.len());
        Ok(key)
    }

    pub async fn load_digest(&self, date: &str) -> Result<Option<String>, CoreError> {
        let key = keys::digest(date);
        match self.blobs.get(&key).await? {
            Some(body) => String::from_utf8(body).map(Some).map_err(|e| {
                CoreError::Storage(StorageError::CorruptDocument {
                    key,
                    details: e.to_string(),
                })
            }),
            None => Ok(None),
        }
    }

    /// Dates that have a digest, newest first.
    pub async fn digest_dates(&self) -> Result<Vec<String>, CoreError> {
        let listed = self.blobs.list(keys::digest_prefix()).await?;
        let mut dates: Vec<String> = listed
            .iter()
            .filter_map(|key| keys::digest_date(key))
            .map(str::to_string)
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    async fn put_json<T: Serialize + Sync>(
        &self,
        key: &str,
        document: &T,
    ) -> Result<(), CoreError> {
        let body = serde_json::to_vec_pretty(document)?;
        self.blobs.put(key, body, JSON_CONTENT_TYPE).await
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CoreError> {
        let Some(body) = self.blobs.get(key).await? else {
            debug!("No document at {}", key);
            return Ok(None);
        };

        serde_json::from_slice(&body).map(Some).map_err(|e| {
            CoreError::Storage(StorageError::CorruptDocument {
                key: key.to_string(),
                details: e.to_string(),
            })
        })
    }
}
