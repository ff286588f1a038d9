//! Path parsing and resolution
//!
//! Remote paths are written `gs://bucket/key` or `bucket/key`. Local paths
//! must be explicit: `local:<path>`, or anything starting with `/`, `.` or `~`.

use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

const REMOTE_SCHEME: &str = "gs://";
const LOCAL_PREFIX: &str = "local:";

/// A parsed command-line path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPath {
    Local(PathBuf),
    Remote(RemotePath),
}

/// A bucket plus an optional object name or prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath {
    pub bucket: String,
    /// Object name or prefix; empty when the path names only the bucket
    pub key: String,
}

impl RemotePath {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse `bucket/some/key`, tolerating a `gs://` scheme or a leading `/`
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix(REMOTE_SCHEME).unwrap_or(trimmed);
        let trimmed = trimmed.trim_start_matches('/');

        let (bucket, key) = match trimmed.split_once('/') {
            Some((bucket, key)) => (bucket, key),
            None => (trimmed, ""),
        };

        if bucket.is_empty() {
            return Err(Error::InvalidPath(format!(
                "'{input}' does not name a bucket"
            )));
        }

        Ok(Self::new(bucket, key))
    }

    pub fn is_bucket(&self) -> bool {
        self.key.is_empty()
    }

    /// Fail unless the path names an object inside the bucket
    pub fn require_object(&self) -> Result<&Self> {
        if self.is_bucket() {
            return Err(Error::InvalidPath(format!(
                "'{self}' must describe an object (e.g. 'your-bucket/some-optional-path/your-file.json'), not only a bucket"
            )));
        }
        Ok(self)
    }

    /// Append a path segment, inserting a `/` separator when needed
    pub fn join(&self, name: &str) -> Self {
        let name = name.trim_start_matches('/');
        let key = if self.key.is_empty() || self.key.ends_with('/') {
            format!("{}{name}", self.key)
        } else {
            format!("{}/{name}", self.key)
        };
        Self::new(&self.bucket, key)
    }

    /// Last segment of the key, if any
    pub fn file_name(&self) -> Option<&str> {
        self.key
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
    }

    /// Extension of the last key segment, without the dot
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.bucket)
        } else {
            write!(f, "{}/{}", self.bucket, self.key)
        }
    }
}

/// Parse a command-line path into a local or remote path
pub fn parse_path(input: &str) -> Result<ParsedPath> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidPath("path cannot be empty".to_string()));
    }

    if let Some(local) = input.strip_prefix(LOCAL_PREFIX) {
        return Ok(ParsedPath::Local(PathBuf::from(local)));
    }

    if input.starts_with(REMOTE_SCHEME) {
        return RemotePath::parse(input).map(ParsedPath::Remote);
    }

    if input.starts_with('/') || input.starts_with('.') || input.starts_with('~') {
        return Ok(ParsedPath::Local(expand_home(input)));
    }

    RemotePath::parse(input).map(ParsedPath::Remote)
}

fn expand_home(input: &str) -> PathBuf {
    match input.strip_prefix('~') {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(input),
        },
        None => PathBuf::from(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_forms() {
        let expected = RemotePath::new("my-bucket", "docs/readme.md");
        for input in [
            "gs://my-bucket/docs/readme.md",
            "my-bucket/docs/readme.md",
        ] {
            assert_eq!(
                parse_path(input).unwrap(),
                ParsedPath::Remote(expected.clone())
            );
        }
        assert_eq!(
            RemotePath::parse("/my-bucket/docs/readme.md").unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_bucket_only() {
        let path = RemotePath::parse("gs://my-bucket").unwrap();
        assert!(path.is_bucket());
        assert!(path.require_object().is_err());
        assert_eq!(path.to_string(), "my-bucket");
    }

    #[test]
    fn test_parse_local_forms() {
        assert_eq!(
            parse_path("./out.zip").unwrap(),
            ParsedPath::Local(PathBuf::from("./out.zip"))
        );
        assert_eq!(
            parse_path("/tmp/out.zip").unwrap(),
            ParsedPath::Local(PathBuf::from("/tmp/out.zip"))
        );
        assert_eq!(
            parse_path("local:out.zip").unwrap(),
            ParsedPath::Local(PathBuf::from("out.zip"))
        );
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(parse_path("").is_err());
        assert!(RemotePath::parse("gs://").is_err());
        assert!(RemotePath::parse("/").is_err());
    }

    #[test]
    fn test_join() {
        let base = RemotePath::new("b", "");
        assert_eq!(base.join("a.txt").key, "a.txt");
        assert_eq!(RemotePath::new("b", "dir").join("a.txt").key, "dir/a.txt");
        assert_eq!(RemotePath::new("b", "dir/").join("/a.txt").key, "dir/a.txt");
    }

    #[test]
    fn test_file_name_and_extension() {
        let path = RemotePath::new("b", "reports/2024/summary.zip");
        assert_eq!(path.file_name(), Some("summary.zip"));
        assert_eq!(path.extension(), Some("zip"));

        let folder = RemotePath::new("b", "reports/2024/");
        assert_eq!(folder.file_name(), Some("2024"));
        assert_eq!(folder.extension(), None);

        assert_eq!(RemotePath::new("b", ".hidden").extension(), None);
        assert_eq!(RemotePath::new("b", "").file_name(), None);
    }
}
