// src/repository/registry.rs

//! Configured repositories and source creation
//!
//! Replaces an on-disk repository file with an explicit value: the set of
//! repositories is built from configuration and passed to whoever needs
//! to turn a repository into a version source.

use super::client::{Auth, RepositoryClient};
use super::index::IndexSource;
use super::oci::OciTagSource;
use super::{SourceKind, VersionCandidateSource};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

/// A chart repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub plain_http: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Repository {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Distribution model of this repository, from its URL scheme
    pub fn kind(&self) -> Result<SourceKind> {
        detect_source_kind(&self.url)
    }

    pub fn auth(&self) -> Auth {
        Auth::from_credentials(self.username.as_deref(), self.password.as_deref())
    }
}

/// Detect the distribution model from a repository URL
///
/// `oci://` repositories are tag based, `http://` and `https://` ones
/// publish an index file.
pub fn detect_source_kind(url: &str) -> Result<SourceKind> {
    let parsed = Url::parse(url)
        .map_err(|e| Error::ConfigError(format!("Invalid repository URL '{url}': {e}")))?;
    match parsed.scheme() {
        "oci" => Ok(SourceKind::TagBased),
        "http" | "https" => Ok(SourceKind::IndexBased),
        other => Err(Error::ConfigError(format!(
            "Unsupported repository scheme '{other}' in '{url}'"
        ))),
    }
}

/// Turns a repository into a version candidate source
pub trait SourceProvider: Sync {
    fn source_for(&self, repository: &Repository) -> Result<Box<dyn VersionCandidateSource>>;
}

/// The repositories known to a run
#[derive(Debug, Clone)]
pub struct RepositorySet {
    repositories: BTreeMap<String, Repository>,
    client: RepositoryClient,
}

impl RepositorySet {
    pub fn new(client: RepositoryClient) -> Self {
        Self {
            repositories: BTreeMap::new(),
            client,
        }
    }

    /// Build a set, rejecting duplicate names and unsupported URLs
    pub fn from_repositories<I>(client: RepositoryClient, repositories: I) -> Result<Self>
    where
        I: IntoIterator<Item = Repository>,
    {
        let mut set = Self::new(client);
        for repo in repositories {
            set.add(repo)?;
        }
        Ok(set)
    }

    pub fn add(&mut self, repository: Repository) -> Result<()> {
        repository.kind()?;
        if self.repositories.contains_key(&repository.name) {
            return Err(Error::ConfigError(format!(
                "Repository '{}' is defined more than once",
                repository.name
            )));
        }
        self.repositories.insert(repository.name.clone(), repository);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Repository> {
        self.repositories.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.values()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// The configured entry carrying credentials for `repository`
    ///
    /// Dependency repositories are not configured by name, so an entry with
    /// the same URL is accepted as well.
    fn credentials_for<'a>(&'a self, repository: &'a Repository) -> &'a Repository {
        self.repositories
            .get(&repository.name)
            .or_else(|| self.repositories.values().find(|r| r.url == repository.url))
            .unwrap_or(repository)
    }
}

impl SourceProvider for RepositorySet {
    fn source_for(&self, repository: &Repository) -> Result<Box<dyn VersionCandidateSource>> {
        let auth = self.credentials_for(repository).auth();
        match repository.kind()? {
            SourceKind::TagBased => {
                debug!("Using tag listing for repository {}", repository.name);
                Ok(Box::new(OciTagSource::new(
                    self.client.clone(),
                    &repository.url,
                    repository.plain_http,
                    auth,
                )?))
            }
            SourceKind::IndexBased => {
                debug!("Using index file for repository {}", repository.name);
                Ok(Box::new(IndexSource::fetch(&self.client, &repository.url, &auth)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_source_kind() {
        assert_eq!(
            detect_source_kind("oci://registry.example.com/charts").unwrap(),
            SourceKind::TagBased
        );
        assert_eq!(
            detect_source_kind("https://charts.bitnami.com/bitnami").unwrap(),
            SourceKind::IndexBased
        );
        assert_eq!(detect_source_kind("http://localhost:8080").unwrap(), SourceKind::IndexBased);
        assert!(matches!(
            detect_source_kind("ftp://example.com"),
            Err(Error::ConfigError(_))
        ));
        assert!(detect_source_kind("not a url").is_err());
    }

    #[test]
    fn test_duplicate_repository_rejected() {
        let client = RepositoryClient::new().unwrap();
        let result = RepositorySet::from_repositories(
            client,
            vec![
                Repository::new("bitnami", "https://charts.bitnami.com/bitnami"),
                Repository::new("bitnami", "https://example.com"),
            ],
        );
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_credentials_lookup() {
        let client = RepositoryClient::new().unwrap();
        let mut private = Repository::new("private", "oci://registry.example.com/charts");
        private.username = Some("user".to_string());
        private.password = Some("secret".to_string());
        let set = RepositorySet::from_repositories(client, vec![private]).unwrap();
        assert_eq!(set.len(), 1);

        let dependency = Repository::new("app/redis", "oci://registry.example.com/charts");
        assert_eq!(
            set.credentials_for(&dependency).auth(),
            Auth::Basic {
                username: "user".to_string(),
                password: "secret".to_string()
            }
        );

        let unknown = Repository::new("other", "https://example.com");
        assert_eq!(set.credentials_for(&unknown).auth(), Auth::Anonymous);
    }

    #[test]
    fn test_oci_source_created_without_network() {
        let client = RepositoryClient::new().unwrap();
        let set = RepositorySet::new(client);
        let source = set
            .source_for(&Repository::new("oci", "oci://registry.example.com/charts"))
            .unwrap();
        assert_eq!(source.kind(), SourceKind::TagBased);
    }
}
