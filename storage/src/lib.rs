pub mod documents;
pub mod fs;
pub mod keys;
pub mod memory;

use async_trait::async_trait;
use digest_core::CoreError;
use std::sync::Arc;

pub use documents::DigestStore;
pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

/// Key-addressed object storage. Writes to the same key replace each other.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), CoreError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError>;

    async fn exists(&self, key: &str) -> Result<bool, CoreError>;

    /// Keys starting with `prefix`, sorted ascending.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, CoreError>;
}

#[async_trait]
impl<B: BlobStore + ?Sized> BlobStore for Arc<B> {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), CoreError> {
        (**self).put(key, body, content_type).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        (**self).get(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, CoreError> {
        (**self).exists(key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, CoreError> {
        (**self).list(prefix).await
    }
}
