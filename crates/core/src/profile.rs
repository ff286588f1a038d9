//! Profile management
//!
//! A profile names a storage endpoint, a project and where to find a
//! bearer token. Profiles are kept in `profiles.toml` next to the config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{config_dir, write_atomic};
use crate::error::{Error, Result};

const PROFILES_FILE: &str = "profiles.toml";

/// Public JSON API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Environment variable read for a token when a profile names none
pub const DEFAULT_TOKEN_ENV: &str = "GSZ_ACCESS_TOKEN";

/// Named connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Environment variable holding a bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Literal bearer token; takes precedence over `token_env`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_id: None,
            endpoint: default_endpoint(),
            token_env: None,
            token: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty()
            || !self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::Config(format!(
                "Invalid profile name '{}': use letters, numbers, '-' or '_'",
                self.name
            )));
        }

        let url = Url::parse(&self.endpoint)
            .map_err(|e| Error::Config(format!("Invalid endpoint '{}': {e}", self.endpoint)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Config(format!(
                "Endpoint must use http or https: {}",
                self.endpoint
            )));
        }

        Ok(())
    }

    /// Endpoint without a trailing slash
    pub fn endpoint_base(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// Environment variable consulted for the token
    pub fn token_env(&self) -> &str {
        self.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfilesFile {
    #[serde(default)]
    profiles: Vec<Profile>,
}

/// Reads and writes `profiles.toml`
#[derive(Debug, Clone)]
pub struct ProfileManager {
    path: PathBuf,
}

impl ProfileManager {
    pub fn new() -> Result<Self> {
        Ok(Self::with_dir(config_dir()?))
    }

    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(PROFILES_FILE),
        }
    }

    fn load(&self) -> Result<ProfilesFile> {
        if !self.path.exists() {
            return Ok(ProfilesFile::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn store(&self, file: &ProfilesFile) -> Result<()> {
        write_atomic(&self.path, &toml::to_string_pretty(file)?)
    }

    /// All profiles sorted by name
    pub fn list(&self) -> Result<Vec<Profile>> {
        let mut profiles = self.load()?.profiles;
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    pub fn get(&self, name: &str) -> Result<Profile> {
        self.load()?
            .profiles
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    /// Insert or replace a profile
    pub fn set(&self, profile: Profile) -> Result<()> {
        profile.validate()?;
        let mut file = self.load()?;
        match file.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile,
            None => file.profiles.push(profile),
        }
        self.store(&file)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let mut file = self.load()?;
        let before = file.profiles.len();
        file.profiles.retain(|p| p.name != name);
        if file.profiles.len() == before {
            return Err(Error::ProfileNotFound(name.to_string()));
        }
        self.store(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_profile_defaults() {
        let profile = Profile::new("work");
        assert_eq!(profile.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(profile.token_env(), DEFAULT_TOKEN_ENV);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_profile_validation() {
        let mut profile = Profile::new("bad name");
        assert!(profile.validate().is_err());

        profile.name = "ok".into();
        profile.endpoint = "ftp://example.com".into();
        assert!(profile.validate().is_err());

        profile.endpoint = "not a url".into();
        assert!(profile.validate().is_err());

        profile.endpoint = "http://localhost:4443/".into();
        assert!(profile.validate().is_ok());
        assert_eq!(profile.endpoint_base(), "http://localhost:4443");
    }

    #[test]
    fn test_set_get_list_remove() {
        let dir = TempDir::new().unwrap();
        let manager = ProfileManager::with_dir(dir.path());

        assert!(manager.list().unwrap().is_empty());

        let mut zeta = Profile::new("zeta");
        zeta.project_id = Some("p1".into());
        manager.set(zeta.clone()).unwrap();
        manager.set(Profile::new("alpha")).unwrap();

        let names: Vec<_> = manager.list().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(manager.get("zeta").unwrap(), zeta);

        zeta.project_id = Some("p2".into());
        manager.set(zeta).unwrap();
        assert_eq!(manager.list().unwrap().len(), 2);
        assert_eq!(
            manager.get("zeta").unwrap().project_id.as_deref(),
            Some("p2")
        );

        manager.remove("alpha").unwrap();
        assert!(matches!(
            manager.get("alpha"),
            Err(Error::ProfileNotFound(_))
        ));
        assert!(matches!(
            manager.remove("alpha"),
            Err(Error::ProfileNotFound(_))
        ));
    }
}
