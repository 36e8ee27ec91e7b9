// src/version/mod.rs

//! Version parsing and range matching for chart versions
//!
//! Chart versions are semantic versions, but what repositories publish is
//! looser than the semver grammar: tags carry a `v` prefix, omit the patch
//! component, or pad numbers with zeros. [`parse_tolerant`] accepts those.
//!
//! Range expressions accept two dialects:
//! - space separated comparators with `||` alternatives:
//!   `">=1.0.0 <2.0.0 || 3.x"`, `"!=1.2.3"`
//! - Cargo/npm style requirements: `"^1.2.0"`, `"~1.4"`, `">=1.0, <2.0"`, `"*"`
//!
//! A bare version without an operator means that exact version.

use crate::error::{Error, Result};
use semver::{Version, VersionReq};
use std::fmt;

/// Parse a version, forgiving a leading `v`, missing minor/patch components
/// and leading zeros
///
/// Returns `None` for anything that still is not a semantic version.
pub fn parse_tolerant(s: &str) -> Option<Version> {
    let s = s.trim();
    let s = s.strip_prefix('v').unwrap_or(s);
    if s.is_empty() {
        return None;
    }

    let (core, suffix) = match s.find(['-', '+']) {
        Some(pos) => s.split_at(pos),
        None => (s, ""),
    };

    let mut parts: Vec<String> = Vec::with_capacity(3);
    for part in core.split('.') {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let trimmed = part.trim_start_matches('0');
        parts.push(if trimmed.is_empty() { "0" } else { trimmed }.to_string());
    }
    if parts.len() > 3 {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0".to_string());
    }

    Version::parse(&format!("{}{}", parts.join("."), suffix)).ok()
}

/// Parse a version strictly by the semver grammar
pub fn parse_strict(s: &str) -> Option<Version> {
    Version::parse(s).ok()
}

/// True when the version carries a pre-release identifier
pub fn is_prerelease(v: &Version) -> bool {
    !v.pre.is_empty()
}

/// One `||` alternative of a range
#[derive(Debug, Clone)]
struct Alternative {
    req: VersionReq,
    excluded: Vec<Version>,
}

impl Alternative {
    fn matches(&self, version: &Version) -> bool {
        self.req.matches(version) && !self.excluded.contains(version)
    }
}

/// A parsed version range expression
#[derive(Debug, Clone)]
pub struct VersionRange {
    source: String,
    alternatives: Vec<Alternative>,
    v_prefix: bool,
}

impl VersionRange {
    /// Parse a range expression
    ///
    /// Examples:
    /// - `"1.2.3"` → exactly 1.2.3
    /// - `"^1.2.0"` → >=1.2.0, <2.0.0
    /// - `">=1.0.0 <2.0.0 || >=3.0.0"` → either interval
    /// - `"v1.x"` → any 1.y.z, results rendered with a `v`
    pub fn parse(expr: &str) -> Result<Self> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(Error::VersionRangeError("empty version range".to_string()));
        }

        let mut alternatives = Vec::new();
        for group in trimmed.split("||") {
            alternatives.push(parse_alternative(group).map_err(|msg| {
                Error::VersionRangeError(format!("'{}': {}", expr, msg))
            })?);
        }

        Ok(Self {
            source: trimmed.to_string(),
            alternatives,
            v_prefix: trimmed.contains('v'),
        })
    }

    /// Check whether a version satisfies the range
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|a| a.matches(version))
    }

    /// Whether results should be rendered with a leading `v`
    pub fn v_prefix(&self) -> bool {
        self.v_prefix
    }

    /// Render a version the way the expression spelled its versions
    pub fn render(&self, version: &Version) -> String {
        if self.v_prefix {
            format!("v{}", version)
        } else {
            version.to_string()
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

const OPERATORS: [&str; 10] = [">=", "<=", "==", "!=", ">", "<", "=", "!", "^", "~"];

fn split_operator(token: &str) -> (&str, &str) {
    for op in OPERATORS {
        if let Some(rest) = token.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", token)
}

/// Split a group into comparator tokens, joining operators written apart
/// from their version (`">= 1.0"`)
fn tokenize(group: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_op: Option<String> = None;

    for raw in group.split(|c: char| c.is_whitespace() || c == ',') {
        if raw.is_empty() {
            continue;
        }
        let (op, rest) = split_operator(raw);
        if rest.is_empty() && !op.is_empty() {
            pending_op = Some(op.to_string());
            continue;
        }
        match pending_op.take() {
            Some(op) => tokens.push(format!("{op}{raw}")),
            None => tokens.push(raw.to_string()),
        }
    }
    tokens
}

fn is_wildcard(version: &str) -> bool {
    version == "*"
        || version
            .split('.')
            .any(|p| p == "x" || p == "X" || p == "*")
}

fn parse_alternative(group: &str) -> std::result::Result<Alternative, String> {
    let tokens = tokenize(group);
    if tokens.is_empty() {
        return Err("empty comparator set".to_string());
    }

    let mut comparators = Vec::new();
    let mut excluded = Vec::new();

    for token in tokens {
        let (op, version) = split_operator(&token);
        let version = version.strip_prefix('v').unwrap_or(version);
        if version.is_empty() {
            return Err(format!("missing version after '{op}'"));
        }

        match op {
            "" | "==" | "=" if matches!(version, "x" | "X" | "*") => comparators.push("*".to_string()),
            "!=" | "!" => {
                let v = parse_tolerant(version)
                    .ok_or_else(|| format!("invalid version '{version}'"))?;
                excluded.push(v);
            }
            "==" | "" if !is_wildcard(version) => {
                comparators.push(format!("={}", pad_exact(version)?));
            }
            "==" => comparators.push(version.to_string()),
            _ => comparators.push(format!("{op}{version}")),
        }
    }

    let req = if comparators.is_empty() {
        VersionReq::STAR
    } else {
        VersionReq::parse(&comparators.join(", ")).map_err(|e| e.to_string())?
    };

    Ok(Alternative { req, excluded })
}

/// An exact comparator must name a full version to mean "exactly this"
fn pad_exact(version: &str) -> std::result::Result<String, String> {
    parse_tolerant(version)
        .map(|v| v.to_string())
        .ok_or_else(|| format!("invalid version '{version}'"))
}
