//! JSON API client implementation
//!
//! Implements the `ObjectStore` trait from gsz-core over reqwest. Every
//! request is wrapped in the retry engine: reads with the read settings,
//! mutations with the write settings, which also retry throttled (429)
//! responses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use gsz_core::{
    Check, Error, ListOptions, ListResult, ObjectInfo, ObjectStore, Profile, RemotePath, Result,
    RetryConfig, RetrySettings, listing_prefix, recover_transient, retry_with_classifier,
    validate_bucket_name,
};
use http::StatusCode;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::auth::{TokenSource, token_source_for};
use crate::response::{Body, ContentPolicy, status_error, transport_error};
use crate::types::{BucketList, BucketResource, ObjectList, ObjectResource};
use crate::urls::{Urls, public_url};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Status and full body of one HTTP exchange
#[derive(Debug)]
pub(crate) struct Exchange {
    status: StatusCode,
    body: Bytes,
}

impl Exchange {
    fn into_result(self, context: &str) -> Result<Bytes> {
        if self.status.is_success() {
            Ok(self.body)
        } else {
            Err(status_error(self.status, &self.body, context))
        }
    }
}

/// Retry verdict for mutations: only throttling is worth another attempt
fn throttled(exchange: &Exchange, _config: &RetryConfig) -> Check {
    if exchange.status == StatusCode::TOO_MANY_REQUESTS {
        Check::Retry
    } else {
        Check::Pass
    }
}

pub(crate) fn decode_json<T: DeserializeOwned>(body: Bytes) -> Result<T> {
    Body::decode(body, ContentPolicy::Json)?.into_json()
}

/// Client for the storage JSON API
pub struct GcsClient {
    http: reqwest::Client,
    urls: Urls,
    project_id: Option<String>,
    tokens: Arc<dyn TokenSource>,
    read_retry: RetryConfig,
    write_retry: RetryConfig,
}

impl GcsClient {
    /// Create a client for a profile, reading its token as the profile says
    pub fn new(profile: &Profile) -> Result<Self> {
        Self::with_token_source(profile, token_source_for(profile))
    }

    /// Create a client with an explicit token source
    pub fn with_token_source(profile: &Profile, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        profile.validate()?;

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("gsz/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        let settings = RetrySettings::default();
        Ok(Self {
            http,
            urls: Urls::new(profile.endpoint_base()),
            project_id: profile.project_id.clone(),
            tokens,
            read_retry: settings.read,
            write_retry: settings.write,
        })
    }

    /// Replace the retry settings for reads and writes
    pub fn with_retry(mut self, settings: &RetrySettings) -> Self {
        self.read_retry = settings.read.clone();
        self.write_retry = settings.write.clone();
        self
    }

    pub fn urls(&self) -> &Urls {
        &self.urls
    }

    fn project(&self) -> Result<&str> {
        self.project_id.as_deref().ok_or_else(|| {
            Error::Config("This operation needs a project id; set one on the profile".to_string())
        })
    }

    async fn exchange<B>(&self, build: &B) -> Result<Exchange>
    where
        B: Fn(&reqwest::Client) -> RequestBuilder + Sync,
    {
        let token = self.tokens.token().await?;
        let response = build(&self.http)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        Ok(Exchange { status, body })
    }

    /// Send an idempotent request under the read retry settings
    pub(crate) async fn read<B>(&self, context: &str, build: B) -> Result<Bytes>
    where
        B: Fn(&reqwest::Client) -> RequestBuilder + Sync,
    {
        tracing::debug!(context, "Read request");
        let build = &build;
        retry_with_classifier(
            &self.read_retry,
            move || async move { self.exchange(build).await?.into_result(context) },
            |_: &Bytes, _: &RetryConfig| Check::Pass,
            recover_transient,
        )
        .await
    }

    /// Send a mutation under the write retry settings
    pub(crate) async fn write<B>(&self, context: &str, build: B) -> Result<Bytes>
    where
        B: Fn(&reqwest::Client) -> RequestBuilder + Sync,
    {
        tracing::debug!(context, "Write request");
        let build = &build;
        retry_with_classifier(
            &self.write_retry,
            move || async move { self.exchange(build).await },
            throttled,
            recover_transient,
        )
        .await?
        .into_result(context)
    }

    /// Object metadata
    pub async fn stat_object(&self, path: &RemotePath) -> Result<ObjectInfo> {
        path.require_object()?;
        let url = self.urls.object(&path.bucket, &path.key);
        let body = self
            .read(&path.to_string(), |http| http.get(&url))
            .await?;
        Ok(decode_json::<ObjectResource>(body)?.into())
    }

    /// Object content decoded by an explicit policy
    pub async fn get_object_body(&self, path: &RemotePath, policy: ContentPolicy) -> Result<Body> {
        let data = self.get_object(path).await?;
        Body::decode(data, policy)
    }

    /// Public address of an object
    pub fn public_url(&self, path: &RemotePath) -> String {
        public_url(&path.bucket, &path.key)
    }

    fn missing_is_false(result: Result<Bytes>) -> Result<bool> {
        match result {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ObjectStore for GcsClient {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        let project = self.project()?;
        let url = self.urls.buckets();
        let mut buckets = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let body = self
                .read("bucket list", |http| {
                    let request = http.get(&url).query(&[("project", project)]);
                    match &page_token {
                        Some(token) => request.query(&[("pageToken", token)]),
                        None => request,
                    }
                })
                .await?;
            let page: BucketList = decode_json(body)?;
            buckets.extend(page.items.into_iter().map(ObjectInfo::from));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(buckets)
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let url = self.urls.bucket(bucket);
        Self::missing_is_false(self.read(bucket, |http| http.get(&url)).await)
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        validate_bucket_name(bucket)?;
        let project = self.project()?;
        let url = self.urls.buckets();
        let payload = serde_json::json!({ "name": bucket });

        let body = self
            .write(bucket, |http| {
                http.post(&url).query(&[("project", project)]).json(&payload)
            })
            .await?;
        let created: BucketResource = decode_json(body)?;
        tracing::info!(bucket = %created.name, "Bucket created");
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let url = self.urls.bucket(bucket);
        self.write(bucket, |http| http.delete(&url)).await?;
        Ok(())
    }

    async fn list_objects(&self, path: &RemotePath, options: ListOptions) -> Result<ListResult> {
        let url = self.urls.objects(&path.bucket);
        let prefix = listing_prefix(path, &options);

        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(prefix) = prefix {
            query.push(("prefix", prefix));
        }
        if let Some(delimiter) = &options.delimiter {
            query.push(("delimiter", delimiter.clone()));
        }
        if let Some(max) = options.max_results {
            query.push(("maxResults", max.to_string()));
        }
        if let Some(token) = &options.page_token {
            query.push(("pageToken", token.clone()));
        }

        let body = self
            .read(&path.to_string(), |http| http.get(&url).query(&query))
            .await?;
        let page: ObjectList = decode_json(body)?;

        let mut items: Vec<ObjectInfo> = page.items.into_iter().map(ObjectInfo::from).collect();
        items.extend(page.prefixes.iter().map(ObjectInfo::dir));

        Ok(ListResult {
            items,
            prefixes: page.prefixes,
            next_page_token: page.next_page_token,
        })
    }

    async fn object_exists(&self, path: &RemotePath) -> Result<bool> {
        path.require_object()?;
        let url = self.urls.object(&path.bucket, &path.key);
        Self::missing_is_false(self.read(&path.to_string(), |http| http.get(&url)).await)
    }

    async fn get_object(&self, path: &RemotePath) -> Result<Bytes> {
        path.require_object()?;
        let url = self.urls.media(&path.bucket, &path.key);
        self.read(&path.to_string(), |http| http.get(&url)).await
    }

    async fn put_object(
        &self,
        path: &RemotePath,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<ObjectInfo> {
        path.require_object()?;
        let url = self.urls.upload(&path.bucket);
        let content_type = match content_type {
            Some(ct) => ct.to_string(),
            None => mime_guess::from_path(&path.key)
                .first_or_octet_stream()
                .to_string(),
        };
        let size = data.len();

        let body = self
            .write(&path.to_string(), |http| {
                http.post(&url)
                    .query(&[("uploadType", "media"), ("name", path.key.as_str())])
                    .header(reqwest::header::CONTENT_TYPE, &content_type)
                    .body(data.clone())
            })
            .await?;

        tracing::debug!(path = %path, size, content_type = %content_type, "Object uploaded");
        Ok(decode_json::<ObjectResource>(body)?.into())
    }

    async fn delete_object(&self, path: &RemotePath) -> Result<bool> {
        path.require_object()?;
        let url = self.urls.object(&path.bucket, &path.key);
        Self::missing_is_false(self.write(&path.to_string(), |http| http.delete(&url)).await)
    }

    async fn get_object_to(
        &self,
        path: &RemotePath,
        target: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        path.require_object()?;
        let url = self.urls.media(&path.bucket, &path.key);
        let context = path.to_string();
        let (url, context) = (&url, context.as_str());

        let mut response = retry_with_classifier(
            &self.read_retry,
            move || async move {
                let token = self.tokens.token().await?;
                let response = self
                    .http
                    .get(url)
                    .bearer_auth(token)
                    .send()
                    .await
                    .map_err(transport_error)?;
                let status = response.status();
                if status.is_success() {
                    Ok(response)
                } else {
                    let body = response.bytes().await.map_err(transport_error)?;
                    Err(status_error(status, &body, context))
                }
            },
            |_: &reqwest::Response, _: &RetryConfig| Check::Pass,
            recover_transient,
        )
        .await?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
            target.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        target.flush().await?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;

    #[test]
    fn test_throttled_verdict() {
        let config = RetryConfig::default();
        let busy = Exchange {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: Bytes::new(),
        };
        let missing = Exchange {
            status: StatusCode::NOT_FOUND,
            body: Bytes::new(),
        };
        assert_eq!(throttled(&busy, &config), Check::Retry);
        assert_eq!(throttled(&missing, &config), Check::Pass);
    }

    #[test]
    fn test_exchange_into_result() {
        let ok = Exchange {
            status: StatusCode::OK,
            body: Bytes::from_static(b"{}"),
        };
        assert_eq!(ok.into_result("b/o").unwrap(), Bytes::from_static(b"{}"));

        let gone = Exchange {
            status: StatusCode::NOT_FOUND,
            body: Bytes::new(),
        };
        assert!(gone.into_result("b/o").unwrap_err().is_not_found());
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let mut profile = Profile::new("p");
        profile.endpoint = "ftp://example.com".into();
        let result = GcsClient::with_token_source(&profile, Arc::new(StaticToken::new("t")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_list_buckets_needs_project() {
        let client =
            GcsClient::with_token_source(&Profile::new("p"), Arc::new(StaticToken::new("t")))
                .unwrap();
        let err = client.list_buckets().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_public_url() {
        let client =
            GcsClient::with_token_source(&Profile::new("p"), Arc::new(StaticToken::new("t")))
                .unwrap();
        assert_eq!(
            client.public_url(&RemotePath::new("site", "a b/c.png")),
            "https://storage.googleapis.com/site/a%20b/c.png"
        );
    }
}
