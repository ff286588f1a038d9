//! Bucket configuration: metadata, public access, CORS and website settings

use gsz_core::{Error, RemotePath, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::{GcsClient, decode_json};
use crate::types::{
    ALL_USERS, BucketDetails, BucketResource, CorsRule, IamPolicy, Website, cors_matches,
};
use crate::urls::public_url;

/// Reported when an update carries no fields
pub const NOTHING_TO_UPDATE: &str = "Empty config. Nothing to update.";

const ALREADY_PUBLIC: &str = "The public access was already added.";
const ALREADY_PRIVATE: &str = "The public access was already removed.";

/// Outcome of a public access change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicAccess {
    /// False when the bucket was already in the requested state
    pub changed: bool,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PublicAccess {
    fn changed(uri: String) -> Self {
        Self {
            changed: true,
            uri,
            message: None,
        }
    }

    fn unchanged(uri: String, message: &str) -> Self {
        Self {
            changed: false,
            uri,
            message: Some(message.to_string()),
        }
    }
}

/// Only whole buckets or single objects can change visibility, never a
/// folder-like prefix
fn check_public_target(path: &RemotePath) -> Result<()> {
    if !path.is_bucket() && path.extension().is_none() {
        return Err(Error::InvalidPath(
            "Bucket's folder cannot be made public. Only buckets or existing objects can be made public."
                .to_string(),
        ));
    }
    Ok(())
}

impl GcsClient {
    /// Raw bucket resource
    pub async fn get_bucket_resource(&self, bucket: &str) -> Result<BucketResource> {
        let url = self.urls().bucket(bucket);
        let body = self.read(bucket, |http| http.get(&url)).await?;
        decode_json(body)
    }

    /// Bucket metadata merged with its IAM policy; an unreadable policy
    /// shows as empty
    pub async fn get_bucket(&self, bucket: &str) -> Result<BucketDetails> {
        let (resource, iam) = futures::join!(
            self.get_bucket_resource(bucket),
            self.get_iam_policy(bucket)
        );
        let iam = iam.unwrap_or_else(|e| {
            tracing::debug!(bucket, error = %e, "IAM policy unavailable");
            IamPolicy::default()
        });
        Ok(BucketDetails {
            bucket: resource?,
            iam,
        })
    }

    pub async fn get_iam_policy(&self, bucket: &str) -> Result<IamPolicy> {
        let url = self.urls().iam(bucket);
        let body = self.read(bucket, |http| http.get(&url)).await?;
        decode_json(body)
    }

    pub async fn set_iam_policy(&self, bucket: &str, policy: &IamPolicy) -> Result<IamPolicy> {
        let url = self.urls().iam(bucket);
        let body = self
            .write(bucket, |http| http.put(&url).json(policy))
            .await?;
        decode_json(body)
    }

    /// Patch bucket metadata; an empty patch sends nothing and returns `None`
    pub async fn update_bucket(
        &self,
        bucket: &str,
        patch: Map<String, Value>,
    ) -> Result<Option<BucketResource>> {
        if patch.is_empty() {
            tracing::info!(bucket, "{NOTHING_TO_UPDATE}");
            return Ok(None);
        }

        let url = self.urls().bucket(bucket);
        let body = self
            .write(bucket, |http| http.patch(&url).json(&patch))
            .await?;
        decode_json(body).map(Some)
    }

    async fn patch_field(&self, bucket: &str, field: &str, value: Value) -> Result<BucketResource> {
        let mut patch = Map::new();
        patch.insert(field.to_string(), value);
        self.update_bucket(bucket, patch)
            .await?
            .ok_or_else(|| Error::General(NOTHING_TO_UPDATE.to_string()))
    }

    /// Grant public read access to an object (ACL) or a whole bucket (IAM)
    pub async fn add_public_access(&self, path: &RemotePath) -> Result<PublicAccess> {
        check_public_target(path)?;
        let uri = public_url(&path.bucket, &path.key);

        if !path.is_bucket() {
            let url = self.urls().acl(&path.bucket, &path.key);
            let payload = serde_json::json!({ "entity": ALL_USERS, "role": "READER" });
            self.write(&path.to_string(), |http| http.post(&url).json(&payload))
                .await?;
            return Ok(PublicAccess::changed(uri));
        }

        let mut policy = self.get_iam_policy(&path.bucket).await?;
        if !policy.add_public_binding() {
            return Ok(PublicAccess::unchanged(uri, ALREADY_PUBLIC));
        }
        self.set_iam_policy(&path.bucket, &policy).await?;
        tracing::info!(bucket = %path.bucket, "Bucket made public");
        Ok(PublicAccess::changed(uri))
    }

    /// Revoke public read access from an object or a whole bucket
    pub async fn remove_public_access(&self, path: &RemotePath) -> Result<PublicAccess> {
        check_public_target(path)?;
        let uri = public_url(&path.bucket, &path.key);

        if !path.is_bucket() {
            let url = self.urls().acl_entity(&path.bucket, &path.key, ALL_USERS);
            self.write(&path.to_string(), |http| http.delete(&url))
                .await?;
            return Ok(PublicAccess::changed(uri));
        }

        let mut policy = self.get_iam_policy(&path.bucket).await?;
        if !policy.remove_public_binding() {
            return Ok(PublicAccess::unchanged(uri, ALREADY_PRIVATE));
        }
        self.set_iam_policy(&path.bucket, &policy).await?;
        tracing::info!(bucket = %path.bucket, "Bucket made private");
        Ok(PublicAccess::changed(uri))
    }

    pub async fn is_bucket_public(&self, bucket: &str) -> Result<bool> {
        Ok(self.get_iam_policy(bucket).await?.is_public())
    }

    /// Whether a configured CORS rule already covers `rule`
    pub async fn cors_exists(&self, bucket: &str, rule: &CorsRule) -> Result<bool> {
        let resource = self.get_bucket_resource(bucket).await?;
        Ok(cors_matches(&resource.cors, rule))
    }

    /// Replace the bucket's CORS rules
    pub async fn setup_cors(&self, bucket: &str, rules: &[CorsRule]) -> Result<BucketResource> {
        self.patch_field(bucket, "cors", serde_json::to_value(rules)?)
            .await
    }

    pub async fn disable_cors(&self, bucket: &str) -> Result<BucketResource> {
        self.patch_field(bucket, "cors", Value::Array(Vec::new()))
            .await
    }

    /// Configure static website serving
    pub async fn setup_website(&self, bucket: &str, website: &Website) -> Result<BucketResource> {
        self.patch_field(bucket, "website", serde_json::to_value(website)?)
            .await
    }
}
