// src/resolver/mod.rs

//! Resolution of version expressions against published versions
//!
//! Index-based and tag-based sources are resolved under different rules:
//!
//! | operation | index-based                               | tag-based                         |
//! |-----------|-------------------------------------------|-----------------------------------|
//! | all       | index order                               | ascending                         |
//! | best      | first stable match in index order         | highest stable match              |
//! | latest    | first stable or unparsable entry, verbatim | highest parsable tag, pre-release allowed |
//!
//! Pre-release versions never come out of a range match.

use crate::error::{Error, Result};
use crate::repository::{SourceKind, VersionCandidateSource};
use crate::version::{is_prerelease, parse_strict, parse_tolerant, VersionRange};
use semver::Version;
use tracing::debug;

/// Parse every candidate that is a version, keeping its raw spelling
fn parse_candidates(candidates: &[String]) -> Vec<(Version, &str)> {
    candidates
        .iter()
        .filter_map(|raw| match parse_tolerant(raw) {
            Some(v) => Some((v, raw.as_str())),
            None => {
                debug!("Skipping non-semver candidate '{}'", raw);
                None
            }
        })
        .collect()
}

fn sort_ascending(parsed: &mut [(Version, &str)]) {
    parsed.sort_by(|a, b| a.0.cmp(&b.0));
}

/// Every stable candidate accepted by `range`
///
/// Results keep the source's order (ascending for tag-based sources) and
/// are rendered with a leading `v` when the expression used one.
pub fn resolve_all(range: &VersionRange, kind: SourceKind, candidates: &[String]) -> Vec<String> {
    let mut parsed = parse_candidates(candidates);
    if kind == SourceKind::TagBased {
        sort_ascending(&mut parsed);
    }

    parsed
        .into_iter()
        .filter(|(v, _)| !is_prerelease(v) && range.matches(v))
        .map(|(v, _)| range.render(&v))
        .collect()
}

/// The single candidate `range` resolves to
///
/// Tag-based sources yield the highest stable match; index-based sources
/// yield the first stable match in index order. The candidate is returned
/// as published.
pub fn resolve_best(range: &VersionRange, kind: SourceKind, candidates: &[String]) -> Result<String> {
    let parsed = parse_candidates(candidates);
    let mut matching = parsed
        .iter()
        .filter(|(v, _)| !is_prerelease(v) && range.matches(v));

    let found = match kind {
        SourceKind::TagBased => matching.max_by(|a, b| a.0.cmp(&b.0)),
        SourceKind::IndexBased => matching.next(),
    };

    found
        .map(|(_, raw)| raw.to_string())
        .ok_or_else(|| Error::NotFoundError(format!("No version matching '{}'", range)))
}

/// The newest published version, without any range
///
/// Tag-based: the highest tag that parses as a version, pre-release or not.
/// Index-based: the first entry in index order that either is not a strict
/// semantic version (returned verbatim) or is one without a pre-release.
pub fn resolve_latest(kind: SourceKind, candidates: &[String]) -> Result<String> {
    let found = match kind {
        SourceKind::TagBased => {
            let mut parsed = parse_candidates(candidates);
            sort_ascending(&mut parsed);
            parsed.last().map(|(_, raw)| raw.to_string())
        }
        SourceKind::IndexBased => candidates
            .iter()
            .find(|raw| match parse_strict(raw) {
                Some(v) => !is_prerelease(&v),
                None => true,
            })
            .cloned(),
    };

    found.ok_or_else(|| Error::NotFoundError("No published versions".to_string()))
}

/// Resolves version expressions for charts served by one source
pub struct VersionResolver<'a> {
    source: &'a dyn VersionCandidateSource,
}

impl<'a> VersionResolver<'a> {
    pub fn new(source: &'a dyn VersionCandidateSource) -> Self {
        Self { source }
    }

    /// All versions of `chart` matching `expr`
    pub fn resolve_all(&self, chart: &str, expr: &str) -> Result<Vec<String>> {
        let range = VersionRange::parse(expr)?;
        let candidates = self.source.list_candidates(chart)?;
        let versions = resolve_all(&range, self.source.kind(), &candidates);
        debug!("Chart {} '{}' expands to {:?}", chart, expr, versions);
        Ok(versions)
    }

    /// The version of `chart` that `expr` selects
    ///
    /// A `*` anywhere in the expression is read as an `x` wildcard.
    pub fn resolve_best(&self, chart: &str, expr: &str) -> Result<String> {
        let range = VersionRange::parse(&expr.replace('*', "x"))?;
        let candidates = self.source.list_candidates(chart)?;
        let version = resolve_best(&range, self.source.kind(), &candidates)
            .map_err(|_| Error::NotFoundError(format!("No version of {chart} matches '{expr}'")))?;
        debug!("Resolved chart {} '{}' to {}", chart, expr, version);
        Ok(version)
    }

    /// The newest published version of `chart`
    pub fn resolve_latest(&self, chart: &str) -> Result<String> {
        let candidates = self.source.list_candidates(chart)?;
        resolve_latest(self.source.kind(), &candidates)
            .map_err(|_| Error::NotFoundError(format!("No published versions of {chart}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::StaticSource;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn range(expr: &str) -> VersionRange {
        VersionRange::parse(expr).unwrap()
    }

    #[test]
    fn test_resolve_all_drops_prerelease() {
        let candidates = list(&["1.2.0", "1.2.1", "1.3.0-alpha", "2.0.0"]);
        assert_eq!(
            resolve_all(&range("^1.2.0"), SourceKind::IndexBased, &candidates),
            vec!["1.2.0", "1.2.1"]
        );
    }

    #[test]
    fn test_resolve_all_keeps_index_order() {
        let candidates = list(&["1.3.0", "not-a-version", "1.1.0", "1.2.0"]);
        assert_eq!(
            resolve_all(&range("^1.0.0"), SourceKind::IndexBased, &candidates),
            vec!["1.3.0", "1.1.0", "1.2.0"]
        );
    }

    #[test]
    fn test_resolve_all_sorts_tags() {
        let candidates = list(&["v1.3.0", "v1.1.0", "latest", "v1.2.0"]);
        assert_eq!(
            resolve_all(&range("v1.x"), SourceKind::TagBased, &candidates),
            vec!["v1.1.0", "v1.2.0", "v1.3.0"]
        );
        assert_eq!(
            resolve_all(&range("1.x"), SourceKind::TagBased, &candidates),
            vec!["1.1.0", "1.2.0", "1.3.0"]
        );
    }

    #[test]
    fn test_resolve_best_tag_based() {
        let candidates = list(&["v1.0.0", "v1.1.0", "latest", "v0.9.0"]);
        assert_eq!(
            resolve_best(&range("*"), SourceKind::TagBased, &candidates).unwrap(),
            "v1.1.0"
        );
    }

    #[test]
    fn test_resolve_best_tag_based_ignores_prerelease() {
        let candidates = list(&["1.0.0", "1.1.0-rc.1", "1.0.5"]);
        assert_eq!(
            resolve_best(&range(">=1.0.0"), SourceKind::TagBased, &candidates).unwrap(),
            "1.0.5"
        );
    }

    #[test]
    fn test_resolve_best_index_first_match() {
        // index order is trusted even when it is not sorted
        let candidates = list(&["2.0.0", "1.5.0-beta", "1.4.0", "1.9.0"]);
        assert_eq!(
            resolve_best(&range("^1.0.0"), SourceKind::IndexBased, &candidates).unwrap(),
            "1.4.0"
        );
    }

    #[test]
    fn test_resolve_best_not_found() {
        let candidates = list(&["1.0.0"]);
        for kind in [SourceKind::IndexBased, SourceKind::TagBased] {
            assert!(matches!(
                resolve_best(&range("^2.0.0"), kind, &candidates),
                Err(Error::NotFoundError(_))
            ));
        }
    }

    #[test]
    fn test_resolve_latest_tag_based_allows_prerelease() {
        let candidates = list(&["1.0.0", "2.0.0-rc.1", "latest", "1.5.0"]);
        assert_eq!(resolve_latest(SourceKind::TagBased, &candidates).unwrap(), "2.0.0-rc.1");
    }

    #[test]
    fn test_resolve_latest_tag_based_no_versions() {
        let candidates = list(&["latest", "main"]);
        assert!(matches!(
            resolve_latest(SourceKind::TagBased, &candidates),
            Err(Error::NotFoundError(_))
        ));
    }

    #[test]
    fn test_resolve_latest_index_based() {
        let candidates = list(&["3.0.0-rc.1", "2.1.0", "2.0.0"]);
        assert_eq!(resolve_latest(SourceKind::IndexBased, &candidates).unwrap(), "2.1.0");

        // an entry that is not strict semver counts as latest, verbatim
        let candidates = list(&["3.0.0-rc.1", "v2.2", "2.1.0"]);
        assert_eq!(resolve_latest(SourceKind::IndexBased, &candidates).unwrap(), "v2.2");

        assert!(resolve_latest(SourceKind::IndexBased, &[]).is_err());
    }

    #[test]
    fn test_version_resolver_with_source() {
        let source = StaticSource::new(SourceKind::IndexBased)
            .with_chart("nginx", ["1.3.0", "1.2.1", "1.2.0", "1.1.0"]);
        let resolver = VersionResolver::new(&source);

        assert_eq!(resolver.resolve_all("nginx", "~1.2.0").unwrap(), vec!["1.2.1", "1.2.0"]);
        assert_eq!(resolver.resolve_best("nginx", "1.2.*").unwrap(), "1.2.1");
        assert_eq!(resolver.resolve_latest("nginx").unwrap(), "1.3.0");
        assert!(matches!(
            resolver.resolve_all("nginx", "latest"),
            Err(Error::VersionRangeError(_))
        ));
        assert!(matches!(
            resolver.resolve_best("redis", "*"),
            Err(Error::NotFoundError(_))
        ));
    }
}
