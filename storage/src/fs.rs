use crate::keys::{self, STAGING_SUFFIX};
use crate::BlobStore;
use async_trait::async_trait;
use digest_core::{CoreError, StorageError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Stores each key as a file under `root`, with `/` mapping to directories.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, CoreError> {
        keys::validate(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }
}

fn write_failed(key: &str, e: std::io::Error) -> CoreError {
    CoreError::Storage(StorageError::WriteFailed {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn read_failed(key: &str, e: std::io::Error) -> CoreError {
    CoreError::Storage(StorageError::ReadFailed {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), CoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| write_failed(key, e))?;
        }

        // Readers never see a half-written document
        let mut staging_name = path.file_name().unwrap_or_default().to_os_string();
        staging_name.push(STAGING_SUFFIX);
        let staging = path.with_file_name(staging_name);
        fs::write(&staging, &body)
            .await
            .map_err(|e| write_failed(key, e))?;
        fs::rename(&staging, &path)
            .await
            .map_err(|e| write_failed(key, e))?;

        debug!(key, bytes = body.len(), content_type, "Stored object");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(read_failed(key, e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, CoreError> {
        let path = self.path_for(key)?;
        match fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(read_failed(key, e)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, CoreError> {
        let mut found = Vec::new();
        let mut pending = vec![(self.root.clone(), String::new())];

        while let Some((dir, relative)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(read_failed(prefix, e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| read_failed(prefix, e))?
            {
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                let key = format!("{relative}{name}");
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| read_failed(&key, e))?;

                if file_type.is_dir() {
                    let dir_key = format!("{key}/");
                    if dir_key.starts_with(prefix) || prefix.starts_with(&dir_key) {
                        pending.push((entry.path(), dir_key));
                    }
                } else if file_type.is_file()
                    && key.starts_with(prefix)
                    && !name.ends_with(STAGING_SUFFIX)
                {
                    found.push(key);
                }
            }
        }

        found.sort();
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FsBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_get_roundtrip_creates_directories() {
        let (dir, store) = store();
        store
            .put("reports/digest_2024-05-01.md", b"# Digest".to_vec(), "text/markdown")
            .await
            .unwrap();

        assert!(dir.path().join("reports").join("digest_2024-05-01.md").is_file());
        assert_eq!(
            store.get("reports/digest_2024-05-01.md").await.unwrap(),
            Some(b"# Digest".to_vec())
        );
        assert!(store.exists("reports/digest_2024-05-01.md").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_objects() {
        let (_dir, store) = store();
        assert_eq!(store.get("data/posts_2024-05-01.json").await.unwrap(), None);
        assert!(!store.exists("data/posts_2024-05-01.json").await.unwrap());
        assert!(store.list("data/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let (_dir, store) = store();
        store.put("data/x.json", b"1".to_vec(), "application/json").await.unwrap();
        store.put("data/x.json", b"2".to_vec(), "application/json").await.unwrap();
        assert_eq!(store.get("data/x.json").await.unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.list("data/").await.unwrap(), vec!["data/x.json"]);
    }

    #[tokio::test]
    async fn test_same_stem_keys_stage_separately() {
        let (dir, store) = store();
        store.put("reports/x.md", b"# x".to_vec(), "text/markdown").await.unwrap();
        store.put("reports/x.json", b"{}".to_vec(), "application/json").await.unwrap();

        assert_eq!(store.get("reports/x.md").await.unwrap(), Some(b"# x".to_vec()));
        assert_eq!(store.get("reports/x.json").await.unwrap(), Some(b"{}".to_vec()));
        assert!(!dir.path().join("reports").join("x.partial").exists());

        // A write interrupted before the rename leaves only its staging file
        std::fs::write(dir.path().join("reports").join("y.md.partial"), b"half").unwrap();
        assert_eq!(
            store.list("reports/").await.unwrap(),
            vec!["reports/x.json", "reports/x.md"]
        );
        assert!(store
            .put("reports/y.md.partial", b"{}".to_vec(), "text/markdown")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix_and_sorts() {
        let (_dir, store) = store();
        for key in [
            "data/posts_2024-05-02.json",
            "data/all_posts_2024-05-02.json",
            "data/posts_2024-05-01.json",
            "reports/digest_2024-05-01.md",
        ] {
            store.put(key, b"{}".to_vec(), "application/json").await.unwrap();
        }

        assert_eq!(
            store.list("data/posts_").await.unwrap(),
            vec!["data/posts_2024-05-01.json", "data/posts_2024-05-02.json"]
        );
        assert_eq!(store.list("").await.unwrap().len(), 4);
        assert_eq!(
            store.list("reports/").await.unwrap(),
            vec!["reports/digest_2024-05-01.md"]
        );
    }

    #[tokio::test]
    async fn test_escaping_keys_are_rejected() {
        let (_dir, store) = store();
        let result = store.put("../outside.json", b"{}".to_vec(), "application/json").await;
        assert!(matches!(
            result,
            Err(CoreError::Storage(StorageError::InvalidKey { .. }))
        ));
        assert!(store.get("/etc/hosts").await.is_err());
    }
}
