//! Lifecycle events emitted by the zip pipeline

use std::fmt;

use crate::error::Error;
use crate::traits::ObjectInfo;

use super::run::ZipSummary;

/// Pipeline stage, reported alongside errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZipStage {
    Listing,
    Filtering,
    Fetching,
    Encoding,
    Finalizing,
    Writing,
    Done,
}

impl fmt::Display for ZipStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Listing => "listing",
            Self::Filtering => "filtering",
            Self::Fetching => "fetching",
            Self::Encoding => "encoding",
            Self::Finalizing => "finalizing",
            Self::Writing => "writing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Everything the listing returned, before ignore rules are applied
#[derive(Debug)]
pub struct FilesListed<'a> {
    pub count: usize,
    /// Sum of known object sizes
    pub total_size: u64,
    pub objects: &'a [ObjectInfo],
}

/// One object fetched and handed to the archive
#[derive(Debug)]
pub struct FileReceived<'a> {
    pub name: &'a str,
    pub size: usize,
}

/// The archive is complete
#[derive(Debug)]
pub struct Finished {
    pub size: u64,
}

type Handler<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Typed observer for a pipeline run
///
/// Registering an error handler changes how failures surface: the run
/// resolves with `Ok(None)` and the error goes to the handler instead.
#[derive(Default)]
pub struct ZipHandlers {
    files_listed: Option<Box<dyn Fn(&FilesListed<'_>) + Send + Sync>>,
    file_received: Option<Box<dyn Fn(&FileReceived<'_>) + Send + Sync>>,
    finished: Option<Handler<Finished>>,
    saved: Option<Handler<ZipSummary>>,
    error: Option<Box<dyn Fn(&Error, ZipStage) + Send + Sync>>,
}

impl ZipHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_files_listed(mut self, f: impl Fn(&FilesListed<'_>) + Send + Sync + 'static) -> Self {
        self.files_listed = Some(Box::new(f));
        self
    }

    pub fn on_file_received(
        mut self,
        f: impl Fn(&FileReceived<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.file_received = Some(Box::new(f));
        self
    }

    pub fn on_finished(mut self, f: impl Fn(&Finished) + Send + Sync + 'static) -> Self {
        self.finished = Some(Box::new(f));
        self
    }

    pub fn on_saved(mut self, f: impl Fn(&ZipSummary) + Send + Sync + 'static) -> Self {
        self.saved = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&Error, ZipStage) + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    pub(crate) fn files_listed(&self, event: &FilesListed<'_>) {
        if let Some(f) = &self.files_listed {
            f(event);
        }
    }

    pub(crate) fn file_received(&self, event: &FileReceived<'_>) {
        if let Some(f) = &self.file_received {
            f(event);
        }
    }

    pub(crate) fn finished(&self, event: &Finished) {
        if let Some(f) = &self.finished {
            f(event);
        }
    }

    pub(crate) fn saved(&self, summary: &ZipSummary) {
        if let Some(f) = &self.saved {
            f(summary);
        }
    }

    /// Deliver an error; returns false when no handler is registered
    pub(crate) fn error(&self, error: &Error, stage: ZipStage) -> bool {
        match &self.error {
            Some(f) => {
                f(error, stage);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for ZipHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipHandlers")
            .field("files_listed", &self.files_listed.is_some())
            .field("file_received", &self.file_received.is_some())
            .field("finished", &self.finished.is_some())
            .field("saved", &self.saved.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}
