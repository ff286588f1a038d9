//! Zip pipeline driver: list, filter, fetch, encode, write

use bytes::Bytes;
use serde::Serialize;

use crate::config::{DEFAULT_BATCH_SIZE, DEFAULT_COMPRESSION_LEVEL, ZipSettings};
use crate::error::{Error, Result};
use crate::path::RemotePath;
use crate::traits::{ListOptions, ObjectStore, total_size};

use super::events::{FileReceived, FilesListed, Finished, ZipHandlers, ZipStage};
use super::fanout::{FanOutWriter, ZipDestination};
use super::fetch::BatchFetcher;
use super::filter::IgnoreRules;
use super::sink::{ArchiveSink, ZipArchiveSink};

/// Options for one pipeline run
#[derive(Debug)]
pub struct ZipOptions {
    pub ignore: IgnoreRules,
    pub destination: ZipDestination,
    pub batch_size: usize,
    /// In-flight fetches per batch; defaults to the batch size
    pub concurrency: Option<usize>,
    pub compression_level: i64,
    pub handlers: ZipHandlers,
}

impl Default for ZipOptions {
    fn default() -> Self {
        Self {
            ignore: IgnoreRules::default(),
            destination: ZipDestination::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            handlers: ZipHandlers::default(),
        }
    }
}

impl ZipOptions {
    /// Options seeded from the `[zip]` config section
    pub fn from_settings(settings: &ZipSettings) -> Self {
        Self {
            batch_size: settings.batch_size,
            concurrency: settings.concurrency,
            compression_level: settings.compression_level,
            ..Self::default()
        }
    }

    pub fn ignore(mut self, rules: impl Into<IgnoreRules>) -> Self {
        self.ignore = rules.into();
        self
    }

    pub fn destination(mut self, destination: ZipDestination) -> Self {
        self.destination = destination;
        self
    }

    pub fn handlers(mut self, handlers: ZipHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Checks made before any request is sent
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch size must be at least 1".into()));
        }
        if !(0..=9).contains(&self.compression_level) {
            return Err(Error::Config(format!(
                "compression level must be between 0 and 9, got {}",
                self.compression_level
            )));
        }
        self.destination.validate()
    }

    fn fetcher(&self) -> BatchFetcher {
        let fetcher = BatchFetcher::new(self.batch_size);
        match self.concurrency {
            Some(n) => fetcher.with_concurrency(n),
            None => fetcher,
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZipSummary {
    /// Objects written into the archive
    pub count: usize,
    /// Archive size in bytes
    pub size: u64,
    /// Archive bytes; `None` when they were written to destinations
    #[serde(skip)]
    pub data: Option<Bytes>,
    /// Where the archive was written
    pub destinations: Vec<String>,
}

/// Zip every object under `source` with the default zip encoder
///
/// Returns `Ok(None)` when a failure was delivered to a registered error
/// handler. Invalid options are always returned as `Err`, before any
/// request is made.
pub async fn zip_objects<S>(
    store: &S,
    source: &RemotePath,
    options: ZipOptions,
) -> Result<Option<ZipSummary>>
where
    S: ObjectStore + ?Sized,
{
    let sink = ZipArchiveSink::new(options.compression_level);
    zip_with_sink(store, source, options, sink).await
}

/// [`zip_objects`] with a caller-supplied encoder
pub async fn zip_with_sink<S, A>(
    store: &S,
    source: &RemotePath,
    options: ZipOptions,
    sink: A,
) -> Result<Option<ZipSummary>>
where
    S: ObjectStore + ?Sized,
    A: ArchiveSink,
{
    options.validate()?;

    let mut stage = ZipStage::Listing;
    match run(store, source, &options, sink, &mut stage).await {
        Ok(summary) => Ok(Some(summary)),
        Err(error) => {
            if options.handlers.error(&error, stage) {
                tracing::warn!(source = %source, stage = %stage, error = %error, "Zip failed, error passed to handler");
                Ok(None)
            } else {
                Err(error)
            }
        }
    }
}

async fn run<S, A>(
    store: &S,
    source: &RemotePath,
    options: &ZipOptions,
    mut sink: A,
    stage: &mut ZipStage,
) -> Result<ZipSummary>
where
    S: ObjectStore + ?Sized,
    A: ArchiveSink,
{
    let handlers = &options.handlers;

    *stage = ZipStage::Listing;
    tracing::info!(source = %source, "Listing objects");
    let listed: Vec<_> = store
        .list_all(source, ListOptions::default())
        .await?
        .into_iter()
        .filter(|o| !o.is_dir)
        .collect();
    handlers.files_listed(&FilesListed {
        count: listed.len(),
        total_size: total_size(&listed),
        objects: &listed,
    });

    *stage = ZipStage::Filtering;
    let objects = options.ignore.apply(listed);
    let count = objects.len();
    tracing::debug!(count, "Objects selected for archive");

    *stage = ZipStage::Fetching;
    options
        .fetcher()
        .fetch_all(
            &objects,
            |object| {
                let path = RemotePath::new(&source.bucket, &object.key);
                async move { store.get_object(&path).await }
            },
            |object, data| {
                handlers.file_received(&FileReceived {
                    name: &object.key,
                    size: data.len(),
                });
                *stage = ZipStage::Encoding;
                sink.append(&object.key, &data)?;
                *stage = ZipStage::Fetching;
                Ok(())
            },
        )
        .await?;

    *stage = ZipStage::Finalizing;
    let data = sink.finish()?;
    let size = data.len() as u64;
    handlers.finished(&Finished { size });
    tracing::info!(count, size, "Archive built");

    *stage = ZipStage::Writing;
    let targets = options.destination.targets(&source.bucket);
    let summary = if targets.is_empty() {
        ZipSummary {
            count,
            size,
            data: Some(data),
            destinations: Vec::new(),
        }
    } else {
        FanOutWriter::new(store).write(&data, &targets).await?;
        ZipSummary {
            count,
            size,
            data: None,
            destinations: targets.iter().map(ToString::to_string).collect(),
        }
    };

    *stage = ZipStage::Done;
    handlers.saved(&summary);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::filter::IgnoreRule;
    use crate::pipeline::sink::MockArchiveSink;
    use crate::traits::{ListResult, ObjectInfo};
    use async_trait::async_trait;
    use mockall::Sequence;
    use mockall::predicate::eq;
    use std::sync::{Arc, Mutex};

    /// Lists fixed names; every object's content is its name
    struct StubStore {
        names: Vec<&'static str>,
        fail_get: Option<&'static str>,
        requests: Mutex<Vec<String>>,
    }

    impl StubStore {
        fn new(names: &[&'static str]) -> Self {
            Self {
                names: names.to_vec(),
                fail_get: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectStore for StubStore {
        async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
            unimplemented!()
        }
        async fn bucket_exists(&self, _: &str) -> Result<bool> {
            unimplemented!()
        }
        async fn create_bucket(&self, _: &str) -> Result<()> {
            unimplemented!()
        }
        async fn delete_bucket(&self, _: &str) -> Result<()> {
            unimplemented!()
        }
        async fn list_objects(&self, _: &RemotePath, _: ListOptions) -> Result<ListResult> {
            self.requests.lock().unwrap().push("list".into());
            Ok(ListResult {
                items: self
                    .names
                    .iter()
                    .map(|n| ObjectInfo::file(*n, n.len() as u64))
                    .collect(),
                ..Default::default()
            })
        }
        async fn object_exists(&self, _: &RemotePath) -> Result<bool> {
            unimplemented!()
        }
        async fn get_object(&self, path: &RemotePath) -> Result<Bytes> {
            self.requests.lock().unwrap().push(format!("get {}", path.key));
            if self.fail_get == Some(path.key.as_str()) {
                return Err(Error::NotFound(path.to_string()));
            }
            Ok(Bytes::from(path.key.clone()))
        }
        async fn put_object(
            &self,
            path: &RemotePath,
            _: Bytes,
            _: Option<&str>,
        ) -> Result<ObjectInfo> {
            self.requests.lock().unwrap().push(format!("put {path}"));
            Ok(ObjectInfo::file(&path.key, 0))
        }
        async fn delete_object(&self, _: &RemotePath) -> Result<bool> {
            unimplemented!()
        }
    }

    fn source() -> RemotePath {
        RemotePath::new("bucket", "docs/")
    }

    #[tokio::test]
    async fn test_appends_in_listed_order_after_filtering() {
        let store = StubStore::new(&["a.txt", "b.txt", "c.txt"]);
        let mut sink = MockArchiveSink::new();
        let mut seq = Sequence::new();
        sink.expect_append()
            .with(eq("a.txt"), eq(&b"a.txt"[..]))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        sink.expect_append()
            .with(eq("c.txt"), eq(&b"c.txt"[..]))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        sink.expect_finish()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Bytes::from_static(b"ZIP")));

        let options = ZipOptions::default().ignore(IgnoreRule::exact("b.txt"));
        let summary = zip_with_sink(&store, &source(), options, sink)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.count, 2);
        assert_eq!(summary.size, 3);
        assert_eq!(summary.data, Some(Bytes::from_static(b"ZIP")));
        assert_eq!(store.requests(), vec!["list", "get a.txt", "get c.txt"]);
    }

    #[tokio::test]
    async fn test_invalid_destination_skips_network_and_handler() {
        let store = StubStore::new(&["a.txt"]);
        let handled = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&handled);

        let options = ZipOptions::default()
            .destination(ZipDestination::remote(None, Some("out.tar".into())))
            .handlers(ZipHandlers::new().on_error(move |_, _| *flag.lock().unwrap() = true));

        let err = zip_with_sink(&store, &source(), options, MockArchiveSink::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(store.requests().is_empty());
        assert!(!*handled.lock().unwrap());
    }

    #[tokio::test]
    async fn test_sink_failure_reports_encoding_stage() {
        let store = StubStore::new(&["a.txt"]);
        let mut sink = MockArchiveSink::new();
        sink.expect_append()
            .returning(|_, _| Err(Error::Archive("no space".into())));
        sink.expect_finish().never();

        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&stages);
        let options = ZipOptions::default().handlers(
            ZipHandlers::new().on_error(move |_, stage| seen.lock().unwrap().push(stage)),
        );

        let result = zip_with_sink(&store, &source(), options, sink).await.unwrap();
        assert!(result.is_none());
        assert_eq!(*stages.lock().unwrap(), vec![ZipStage::Encoding]);
    }

    #[tokio::test]
    async fn test_fetch_failure_without_handler_propagates() {
        let mut store = StubStore::new(&["a.txt", "b.txt"]);
        store.fail_get = Some("b.txt");
        let mut sink = MockArchiveSink::new();
        sink.expect_append().returning(|_, _| Ok(()));
        sink.expect_finish().never();

        let err = zip_with_sink(&store, &source(), ZipOptions::default(), sink)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_writes_to_remote_destination() {
        let store = StubStore::new(&["a.txt"]);
        let saved = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&saved);

        let options = ZipOptions::default()
            .destination(ZipDestination::remote(None, None))
            .handlers(ZipHandlers::new().on_saved(move |s| *slot.lock().unwrap() = Some(s.clone())));

        let summary = zip_objects(&store, &source(), options).await.unwrap().unwrap();
        assert_eq!(summary.data, None);
        assert_eq!(summary.destinations, vec!["gs://bucket/archive.zip"]);
        assert_eq!(saved.lock().unwrap().as_ref(), Some(&summary));
        assert_eq!(
            store.requests().last().map(String::as_str),
            Some("put bucket/archive.zip")
        );
    }
}
