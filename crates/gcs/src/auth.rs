//! Bearer token sources
//!
//! Token acquisition is left to external tooling (for example
//! `gcloud auth print-access-token`); the client only needs a string.

use std::sync::Arc;

use async_trait::async_trait;
use gsz_core::{Error, Profile, Result};

/// Supplies a bearer token for each request attempt
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String>;
}

/// A fixed token
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Reads a token from an environment variable on every call, so a
/// refreshed value is picked up without restarting
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

#[async_trait]
impl TokenSource for EnvToken {
    async fn token(&self) -> Result<String> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(Error::Auth(format!(
                "No access token: set the {} environment variable",
                self.var
            ))),
        }
    }
}

/// Token source described by a profile: a literal token wins over the
/// environment variable
pub fn token_source_for(profile: &Profile) -> Arc<dyn TokenSource> {
    match &profile.token {
        Some(token) => Arc::new(StaticToken::new(token.clone())),
        None => Arc::new(EnvToken::new(profile.token_env())),
    }
}
