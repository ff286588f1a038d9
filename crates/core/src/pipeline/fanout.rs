//! Concurrent delivery of one artifact to several destinations

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use futures::future::join_all;

use crate::error::{Error, Result};
use crate::path::RemotePath;
use crate::traits::ObjectStore;

/// Required extension for remote archive paths
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Remote path used when a bucket destination names no path
pub const DEFAULT_ARCHIVE_NAME: &str = "archive.zip";

const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Remote destination; unset fields fall back to the source bucket and
/// [`DEFAULT_ARCHIVE_NAME`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteDestination {
    pub bucket: Option<String>,
    pub path: Option<String>,
}

/// Where a finished archive goes; empty means "return the bytes"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZipDestination {
    pub local: Option<PathBuf>,
    pub remote: Option<RemoteDestination>,
}

impl ZipDestination {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            local: Some(path.into()),
            remote: None,
        }
    }

    pub fn remote(bucket: Option<String>, path: Option<String>) -> Self {
        Self {
            local: None,
            remote: Some(RemoteDestination { bucket, path }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_none() && self.remote.is_none()
    }

    /// Reject a remote path without the archive extension
    pub fn validate(&self) -> Result<()> {
        if let Some(RemoteDestination {
            path: Some(path), ..
        }) = &self.remote
        {
            let has_extension = path
                .strip_suffix(ARCHIVE_EXTENSION)
                .is_some_and(|rest| rest.ends_with('.'));
            if !has_extension {
                return Err(Error::Config(format!(
                    "Remote archive path '{path}' does not have a '.{ARCHIVE_EXTENSION}' extension"
                )));
            }
        }
        Ok(())
    }

    /// Concrete write targets for an archive built from `source_bucket`
    pub fn targets(&self, source_bucket: &str) -> Vec<WriteTarget> {
        let mut targets = Vec::new();
        if let Some(local) = &self.local {
            targets.push(WriteTarget::Local(local.clone()));
        }
        if let Some(remote) = &self.remote {
            let bucket = remote.bucket.as_deref().unwrap_or(source_bucket);
            let key = remote
                .path
                .as_deref()
                .map(|p| p.trim_start_matches('/'))
                .unwrap_or(DEFAULT_ARCHIVE_NAME);
            targets.push(WriteTarget::Remote(RemotePath::new(bucket, key)));
        }
        targets
    }
}

/// One resolved destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteTarget {
    Local(PathBuf),
    Remote(RemotePath),
}

impl fmt::Display for WriteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(path) => write!(f, "gs://{path}"),
        }
    }
}

/// Writes the same bytes to every target concurrently
pub struct FanOutWriter<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ObjectStore + ?Sized> FanOutWriter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Start every write, wait for all of them, then report the first failure
    pub async fn write(&self, data: &Bytes, targets: &[WriteTarget]) -> Result<()> {
        let results = join_all(targets.iter().map(|t| self.write_one(t, data.clone()))).await;

        let mut first_error = None;
        for (target, result) in targets.iter().zip(results) {
            match result {
                Ok(()) => tracing::debug!(destination = %target, bytes = data.len(), "Archive written"),
                Err(e) => {
                    tracing::warn!(destination = %target, error = %e, "Archive write failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn write_one(&self, target: &WriteTarget, data: Bytes) -> Result<()> {
        match target {
            WriteTarget::Local(path) => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(path, &data).await?;
            }
            WriteTarget::Remote(path) => {
                self.store
                    .put_object(path, data, Some(ARCHIVE_CONTENT_TYPE))
                    .await?;
            }
        }
        Ok(())
    }
}
