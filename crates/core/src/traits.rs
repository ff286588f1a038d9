//! Storage abstraction
//!
//! `ObjectStore` is the seam between the pipeline and a concrete transport.
//! The GCS client implements it over HTTP; tests implement it in memory.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::path::RemotePath;

/// Default parallelism for bulk deletes
pub const DEFAULT_DELETE_CONCURRENCY: usize = 20;

/// Metadata for a bucket, object or listing prefix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object name (or bucket name for bucket entries)
    pub key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5_hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// True for listing prefixes ("folders")
    #[serde(default)]
    pub is_dir: bool,
}

impl ObjectInfo {
    /// An object with a known size
    pub fn file(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(size, humansize::BINARY)),
            last_modified: None,
            etag: None,
            md5_hash: None,
            content_type: None,
            storage_class: None,
            is_dir: false,
        }
    }

    /// A listing prefix
    pub fn dir(key: impl Into<String>) -> Self {
        Self {
            size_bytes: None,
            size_human: None,
            is_dir: true,
            ..Self::file(key, 0)
        }
    }

    /// A bucket entry
    pub fn bucket(name: impl Into<String>) -> Self {
        Self::dir(name)
    }

    /// Size in bytes, counting unknown sizes as zero
    pub fn size(&self) -> u64 {
        self.size_bytes.unwrap_or(0)
    }
}

/// Options for a single list request
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Appended to the path key to form the listing prefix
    pub prefix: Option<String>,

    /// Group names by this delimiter into `prefixes`; unset lists recursively
    pub delimiter: Option<String>,

    pub max_results: Option<u32>,

    pub page_token: Option<String>,
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct ListResult {
    pub items: Vec<ObjectInfo>,
    pub prefixes: Vec<String>,
    pub next_page_token: Option<String>,
}

impl ListResult {
    pub fn truncated(&self) -> bool {
        self.next_page_token.is_some()
    }
}

/// Full listing prefix for a path plus options
pub fn listing_prefix(path: &RemotePath, options: &ListOptions) -> Option<String> {
    match (path.key.is_empty(), &options.prefix) {
        (true, None) => None,
        (true, Some(p)) => Some(p.clone()),
        (false, Some(p)) => Some(format!("{}{p}", path.key)),
        (false, None) => Some(path.key.clone()),
    }
}

/// Bucket and object operations against a storage backend
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>>;

    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// List one page of objects under `path`
    async fn list_objects(&self, path: &RemotePath, options: ListOptions) -> Result<ListResult>;

    async fn object_exists(&self, path: &RemotePath) -> Result<bool>;

    async fn get_object(&self, path: &RemotePath) -> Result<Bytes>;

    async fn put_object(
        &self,
        path: &RemotePath,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<ObjectInfo>;

    /// Delete one object; returns false when it did not exist
    async fn delete_object(&self, path: &RemotePath) -> Result<bool>;

    /// Stream an object into `target`, returning the number of bytes written
    async fn get_object_to(
        &self,
        path: &RemotePath,
        target: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let data = self.get_object(path).await?;
        target.write_all(&data).await?;
        target.flush().await?;
        Ok(data.len() as u64)
    }

    /// Follow page tokens until the listing is complete
    async fn list_all(&self, path: &RemotePath, options: ListOptions) -> Result<Vec<ObjectInfo>> {
        let mut items = Vec::new();
        let mut page_token = options.page_token.clone();

        loop {
            let page = self
                .list_objects(
                    path,
                    ListOptions {
                        page_token: page_token.take(),
                        ..options.clone()
                    },
                )
                .await?;

            items.extend(page.items);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(items)
    }

    /// Delete every object under a prefix, `concurrency` at a time
    async fn delete_prefix(&self, path: &RemotePath, concurrency: usize) -> Result<usize> {
        let items = self.list_all(path, ListOptions::default()).await?;
        let count = items.len();
        tracing::debug!(path = %path, count, "Deleting objects under prefix");

        stream::iter(items.into_iter().map(Ok::<_, Error>))
            .try_for_each_concurrent(concurrency.max(1), |item| {
                let target = RemotePath::new(&path.bucket, item.key);
                async move { self.delete_object(&target).await.map(|_| ()) }
            })
            .await?;

        Ok(count)
    }

    /// Empty a bucket and delete it, returning the number of objects removed
    async fn delete_bucket_force(&self, bucket: &str) -> Result<usize> {
        let root = RemotePath::new(bucket, "");
        let removed = self
            .delete_prefix(&root, DEFAULT_DELETE_CONCURRENCY)
            .await?;
        self.delete_bucket(bucket).await?;
        Ok(removed)
    }
}

/// Total size of a set of listed objects
pub fn total_size(items: &[ObjectInfo]) -> u64 {
    items.iter().map(ObjectInfo::size).sum()
}
