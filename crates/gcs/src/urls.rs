//! JSON API URL builders
//!
//! Bucket and object names are percent-encoded as single path segments,
//! so `/` inside an object name becomes `%2F`.

use urlencoding::encode;

/// Host serving public objects
pub const PUBLIC_BASE: &str = "https://storage.googleapis.com";

/// URL builder rooted at a service endpoint
#[derive(Debug, Clone)]
pub struct Urls {
    base: String,
}

impl Urls {
    pub fn new(endpoint: &str) -> Self {
        Self {
            base: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Bucket collection (list, insert)
    pub fn buckets(&self) -> String {
        format!("{}/storage/v1/b", self.base)
    }

    pub fn bucket(&self, bucket: &str) -> String {
        format!("{}/{}", self.buckets(), encode(bucket))
    }

    pub fn iam(&self, bucket: &str) -> String {
        format!("{}/iam", self.bucket(bucket))
    }

    /// Object collection of a bucket (list)
    pub fn objects(&self, bucket: &str) -> String {
        format!("{}/o", self.bucket(bucket))
    }

    /// Object metadata; add `alt=media` for content
    pub fn object(&self, bucket: &str, name: &str) -> String {
        format!("{}/{}", self.objects(bucket), encode(name))
    }

    /// Object content
    pub fn media(&self, bucket: &str, name: &str) -> String {
        format!("{}?alt=media", self.object(bucket, name))
    }

    pub fn acl(&self, bucket: &str, name: &str) -> String {
        format!("{}/acl", self.object(bucket, name))
    }

    pub fn acl_entity(&self, bucket: &str, name: &str, entity: &str) -> String {
        format!("{}/{}", self.acl(bucket, name), encode(entity))
    }

    /// Simple media upload; the object name goes in the `name` query parameter
    pub fn upload(&self, bucket: &str) -> String {
        format!("{}/upload/storage/v1/b/{}/o", self.base, encode(bucket))
    }
}

/// Public address of an object, encoding each path segment
pub fn public_url(bucket: &str, name: &str) -> String {
    let path = name
        .trim_start_matches('/')
        .split('/')
        .map(|segment| encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    if path.is_empty() {
        format!("{PUBLIC_BASE}/{}", encode(bucket))
    } else {
        format!("{PUBLIC_BASE}/{}/{path}", encode(bucket))
    }
}
