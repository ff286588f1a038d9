//! Zip pipeline
//!
//! Lists the objects under a prefix, drops ignored names, fetches the rest
//! in sequential batches and streams them into an archive encoder. The
//! finished archive is either returned or written to every configured
//! destination concurrently. Progress is reported through [`ZipHandlers`].

mod events;
mod fanout;
mod fetch;
mod filter;
mod run;
mod sink;

pub use events::{FileReceived, FilesListed, Finished, ZipHandlers, ZipStage};
pub use fanout::{
    ARCHIVE_EXTENSION, DEFAULT_ARCHIVE_NAME, FanOutWriter, RemoteDestination, WriteTarget,
    ZipDestination,
};
pub use fetch::BatchFetcher;
pub use filter::{IgnoreRule, IgnoreRules};
pub use run::{ZipOptions, ZipSummary, zip_objects, zip_with_sink};
pub use sink::{ArchiveSink, ZipArchiveSink};
