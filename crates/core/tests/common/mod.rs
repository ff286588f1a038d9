//! In-memory `ObjectStore` shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use gsz_core::traits::listing_prefix;
use gsz_core::{Error, ListOptions, ListResult, ObjectInfo, ObjectStore, RemotePath, Result};

/// Buckets of named byte buffers, listed `page_size` entries at a time
pub struct MemoryStore {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, Bytes>>>,
    page_size: usize,
    failing_put_buckets: Mutex<HashSet<String>>,
    r#unsized: Mutex<HashSet<String>>,
    log: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            page_size: 1000,
            failing_put_buckets: Mutex::new(HashSet::new()),
            r#unsized: Mutex::new(HashSet::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_objects(self, bucket: &str, objects: &[(&str, &str)]) -> Self {
        {
            let mut buckets = self.buckets.lock().unwrap();
            let entry = buckets.entry(bucket.to_string()).or_default();
            for (name, content) in objects {
                entry.insert(name.to_string(), Bytes::from(content.to_string()));
            }
        }
        self
    }

    pub fn with_bucket(self, bucket: &str) -> Self {
        self.with_objects(bucket, &[])
    }

    /// List `bucket/name` without a size, as a listing with missing metadata would
    pub fn without_size(self, bucket: &str, name: &str) -> Self {
        self.r#unsized.lock().unwrap().insert(format!("{bucket}/{name}"));
        self
    }

    /// Make every put into `bucket` fail with a server error
    pub fn fail_puts_to(&self, bucket: &str) {
        self.failing_put_buckets
            .lock()
            .unwrap()
            .insert(bucket.to_string());
    }

    pub fn object(&self, bucket: &str, name: &str) -> Option<Bytes> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .and_then(|b| b.get(name).cloned())
    }

    pub fn names(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.lock().unwrap().contains_key(bucket)
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn missing_bucket(bucket: &str) -> Error {
        Error::NotFound(format!("Bucket not found: {bucket}"))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        Ok(self
            .buckets
            .lock()
            .unwrap()
            .keys()
            .map(ObjectInfo::bucket)
            .collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.has_bucket(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut buckets = self.buckets.lock().unwrap();
        if buckets.contains_key(bucket) {
            return Err(Error::Conflict(format!("Bucket already exists: {bucket}")));
        }
        buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let mut buckets = self.buckets.lock().unwrap();
        match buckets.get(bucket) {
            None => Err(Self::missing_bucket(bucket)),
            Some(objects) if !objects.is_empty() => {
                Err(Error::Conflict(format!("Bucket is not empty: {bucket}")))
            }
            Some(_) => {
                buckets.remove(bucket);
                Ok(())
            }
        }
    }

    async fn list_objects(&self, path: &RemotePath, options: ListOptions) -> Result<ListResult> {
        self.record(format!("list {path}"));
        let buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get(&path.bucket)
            .ok_or_else(|| Self::missing_bucket(&path.bucket))?;

        let prefix = listing_prefix(path, &options).unwrap_or_default();
        let start: usize = options
            .page_token
            .as_deref()
            .map(|t| t.parse().unwrap())
            .unwrap_or(0);
        let page_size = options
            .max_results
            .map(|m| m as usize)
            .unwrap_or(self.page_size);

        let matching: Vec<_> = objects
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .collect();
        let r#unsized = self.r#unsized.lock().unwrap();
        let items = matching
            .iter()
            .skip(start)
            .take(page_size)
            .map(|(name, data)| {
                let mut info = ObjectInfo::file(name.as_str(), data.len() as u64);
                if r#unsized.contains(&format!("{}/{name}", path.bucket)) {
                    info.size_bytes = None;
                    info.size_human = None;
                }
                info
            })
            .collect();
        let next = start + page_size;

        Ok(ListResult {
            items,
            prefixes: Vec::new(),
            next_page_token: (next < matching.len()).then(|| next.to_string()),
        })
    }

    async fn object_exists(&self, path: &RemotePath) -> Result<bool> {
        Ok(self.object(&path.bucket, &path.key).is_some())
    }

    async fn get_object(&self, path: &RemotePath) -> Result<Bytes> {
        self.record(format!("get {path}"));
        self.object(&path.bucket, &path.key)
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn put_object(
        &self,
        path: &RemotePath,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<ObjectInfo> {
        self.record(format!("put {path}"));
        if self.failing_put_buckets.lock().unwrap().contains(&path.bucket) {
            return Err(Error::Network("503 Service Unavailable".into()));
        }

        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets
            .get_mut(&path.bucket)
            .ok_or_else(|| Self::missing_bucket(&path.bucket))?;
        let mut info = ObjectInfo::file(&path.key, data.len() as u64);
        info.content_type = content_type.map(str::to_string);
        bucket.insert(path.key.clone(), data);
        Ok(info)
    }

    async fn delete_object(&self, path: &RemotePath) -> Result<bool> {
        self.record(format!("delete {path}"));
        let mut buckets = self.buckets.lock().unwrap();
        Ok(buckets
            .get_mut(&path.bucket)
            .and_then(|b| b.remove(&path.key))
            .is_some())
    }
}
