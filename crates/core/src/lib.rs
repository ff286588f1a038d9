//! gsz-core: Core library for the gsz object-storage client
//!
//! This crate provides the core functionality for gsz, including:
//! - Configuration and profile management
//! - Path parsing and bucket name validation
//! - ObjectStore trait for bucket/object operations
//! - A retry engine with exponential backoff and pluggable predicates
//! - The zip pipeline: list, filter, batch fetch, encode, fan-out
//!
//! This crate is independent of any specific HTTP transport,
//! allowing the pipeline to be tested against in-memory stores.

pub mod bucket_name;
pub mod config;
pub mod error;
pub mod path;
pub mod pipeline;
pub mod profile;
pub mod retry;
pub mod traits;

pub use bucket_name::validate_bucket_name;
pub use config::{
    ColorMode, Config, ConfigManager, Defaults, OutputFormat, RetrySettings, ZipSettings,
};
pub use error::{Error, Result};
pub use path::{ParsedPath, RemotePath, parse_path};
pub use pipeline::{
    ArchiveSink, BatchFetcher, FanOutWriter, IgnoreRule, IgnoreRules, RemoteDestination,
    ZipArchiveSink, ZipDestination, ZipHandlers, ZipOptions, ZipStage, ZipSummary, zip_objects,
};
pub use profile::{Profile, ProfileManager};
pub use retry::{
    BackoffPolicy, BaseInterval, Check, Recovery, RetryBudget, RetryBuilder, RetryConfig,
    is_retryable_error, recover_transient, retry, retry_with_classifier,
};
pub use traits::{ListOptions, ListResult, ObjectInfo, ObjectStore, listing_prefix};
