// src/repository/oci.rs

//! Version candidates from OCI registry tags
//!
//! Charts pushed to an OCI registry are published as tags on a repository
//! named `<registry path>/<chart>`. Tags are listed with the distribution
//! API (`GET /v2/<repository>/tags/list`), following `Link` pagination and
//! answering a bearer token challenge when the registry asks for one.

use super::client::{Auth, RepositoryClient};
use super::{SourceKind, VersionCandidateSource};
use crate::error::{Error, Result};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, LINK, WWW_AUTHENTICATE};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};
use url::Url;

/// Upper bound on followed pages, guarding against redirect loops
const MAX_PAGES: usize = 1000;

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// An authentication challenge from a `WWW-Authenticate` header
#[derive(Debug, Clone, PartialEq, Eq)]
enum Challenge {
    Basic,
    Bearer {
        realm: String,
        service: Option<String>,
        scope: Option<String>,
    },
}

/// Tag listing for charts stored in an OCI registry
#[derive(Debug, Clone)]
pub struct OciTagSource {
    client: RepositoryClient,
    /// `http(s)://host[:port]`
    base: String,
    /// Repository path below the host, without slashes at either end
    prefix: String,
    credentials: Auth,
}

impl OciTagSource {
    /// Create a source for an `oci://host/path` repository URL
    pub fn new(client: RepositoryClient, url: &str, plain_http: bool, credentials: Auth) -> Result<Self> {
        let (base, prefix) = split_oci_url(url, plain_http)?;
        Ok(Self {
            client,
            base,
            prefix,
            credentials,
        })
    }

    /// Repository holding the tags of `chart`
    pub fn repository_for(&self, chart: &str) -> String {
        if self.prefix.is_empty() {
            chart.to_string()
        } else {
            format!("{}/{}", self.prefix, chart)
        }
    }

    fn authenticate(&self, headers: &HeaderMap, repository: &str) -> Result<Auth> {
        let header = headers
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                Error::SourceError(format!("Registry denied access to {repository} without a challenge"))
            })?;

        match parse_challenge(header) {
            Some(Challenge::Basic) => Ok(self.credentials.clone()),
            Some(Challenge::Bearer { realm, service, scope }) => {
                let default_scope = format!("repository:{repository}:pull");
                let scope = scope.unwrap_or(default_scope);
                let mut query = vec![("scope", scope.as_str())];
                if let Some(service) = service.as_deref() {
                    query.push(("service", service));
                }

                debug!("Requesting registry token from {}", realm);
                let response = self.client.get_with_query(&realm, &query, &self.credentials)?;
                if !response.status().is_success() {
                    return Err(Error::SourceError(format!(
                        "Token request to {} failed: HTTP {}",
                        realm,
                        response.status()
                    )));
                }
                let token: TokenResponse = response
                    .json()
                    .map_err(|e| Error::SourceError(format!("Invalid token response: {e}")))?;
                token
                    .token
                    .or(token.access_token)
                    .map(Auth::Bearer)
                    .ok_or_else(|| Error::SourceError("Token response carried no token".to_string()))
            }
            None => Err(Error::SourceError(format!(
                "Unsupported authentication challenge: {header}"
            ))),
        }
    }
}

impl VersionCandidateSource for OciTagSource {
    fn kind(&self) -> SourceKind {
        SourceKind::TagBased
    }

    fn list_candidates(&self, name: &str) -> Result<Vec<String>> {
        let repository = self.repository_for(name);
        let mut url = format!("{}/v2/{}/tags/list", self.base, repository);
        let mut auth = self.credentials.clone();
        let mut authenticated = false;
        let mut tags = Vec::new();

        info!("Listing tags of {}", repository);
        for _ in 0..MAX_PAGES {
            let response = self.client.get(&url, &auth)?;

            if response.status() == StatusCode::UNAUTHORIZED && !authenticated {
                auth = self.authenticate(response.headers(), &repository)?;
                authenticated = true;
                continue;
            }
            if !response.status().is_success() {
                return Err(Error::SourceError(format!(
                    "HTTP {} listing tags of {}",
                    response.status(),
                    repository
                )));
            }

            let next = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link);
            let page: TagList = response
                .json()
                .map_err(|e| Error::SourceError(format!("Invalid tag list for {repository}: {e}")))?;
            tags.extend(page.tags.unwrap_or_default());

            match next {
                Some(link) if link.starts_with('/') => url = format!("{}{}", self.base, link),
                Some(link) => url = link,
                None => {
                    debug!("Found {} tags for {}", tags.len(), repository);
                    return Ok(tags);
                }
            }
        }

        Err(Error::SourceError(format!(
            "Tag listing of {repository} exceeded {MAX_PAGES} pages"
        )))
    }
}

/// Split `oci://host[:port]/path` into an HTTP base URL and a path prefix
fn split_oci_url(url: &str, plain_http: bool) -> Result<(String, String)> {
    let rest = url.strip_prefix("oci://").ok_or_else(|| {
        Error::ConfigError(format!("Not an OCI repository URL: {url}"))
    })?;
    let scheme = if plain_http { "http" } else { "https" };
    let parsed = Url::parse(&format!("{scheme}://{rest}"))
        .map_err(|e| Error::ConfigError(format!("Invalid OCI repository URL {url}: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::ConfigError(format!("OCI repository URL has no host: {url}")))?;

    let base = match parsed.port() {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    };
    Ok((base, parsed.path().trim_matches('/').to_string()))
}

/// Parse a `WWW-Authenticate` header
fn parse_challenge(header: &str) -> Option<Challenge> {
    let (scheme, params) = header.trim().split_once(' ').unwrap_or((header.trim(), ""));
    if scheme.eq_ignore_ascii_case("basic") {
        return Some(Challenge::Basic);
    }
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let mut values: HashMap<String, String> = HashMap::new();
    let mut rest = params.trim();
    while !rest.is_empty() {
        let (key, after_key) = rest.split_once('=')?;
        let after_key = after_key.trim_start();
        let (value, remaining) = if let Some(quoted) = after_key.strip_prefix('"') {
            let end = quoted.find('"')?;
            (&quoted[..end], &quoted[end + 1..])
        } else {
            match after_key.find(',') {
                Some(end) => (&after_key[..end], &after_key[end..]),
                None => (after_key, ""),
            }
        };
        values.insert(key.trim().to_ascii_lowercase(), value.to_string());
        rest = remaining.trim_start_matches([',', ' ']);
    }

    Some(Challenge::Bearer {
        realm: values.remove("realm")?,
        service: values.remove("service"),
        scope: values.remove("scope"),
    })
}

/// Extract the target of a `Link: <...>; rel="next"` header
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().replace(' ', "") == "rel=\"next\"" || p.trim() == "rel=next");
        if !is_next {
            return None;
        }
        let target = target.trim();
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}
