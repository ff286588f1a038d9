//! gsz-gcs: JSON API adapter for gsz
//!
//! Implements `gsz_core::ObjectStore` against the storage JSON API with
//! bearer-token authentication, plus bucket configuration helpers (IAM
//! public access, CORS, static website).

pub mod auth;
pub mod bucket;
pub mod client;
pub mod response;
pub mod types;
pub mod urls;

pub use auth::{EnvToken, StaticToken, TokenSource, token_source_for};
pub use bucket::{NOTHING_TO_UPDATE, PublicAccess};
pub use client::GcsClient;
pub use response::{Body, ContentPolicy};
pub use types::{Binding, BucketDetails, BucketResource, CorsRule, IamPolicy, Website};
pub use urls::{Urls, public_url};
