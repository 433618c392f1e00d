//! Resolved version information and PEP 440 ordering
//!
//! This module provides the ResolvedVersion struct returned by the registry
//! and the version comparison used to decide whether a constraint moves.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::LazyLock;

static PEP440_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^\s*v?
        (?:(?P<epoch>\d+)!)?
        (?P<release>\d+(?:\.\d+)*)
        (?:[-_.]?(?P<pre_l>alpha|a|beta|b|preview|pre|rc|c)[-_.]?(?P<pre_n>\d*))?
        (?:-(?P<post_implicit>\d+)|[-_.]?(?:post|rev|r)[-_.]?(?P<post_n>\d*))?
        (?:[-_.]?dev[-_.]?(?P<dev_n>\d*))?
        (?:\+[a-z0-9._-]+)?
        \s*$",
    )
    .unwrap()
});

/// Latest version of a package as reported by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    /// Package name as the registry spells it
    pub name: String,
    /// The version string (e.g., "2.31.0")
    pub version: String,
    /// One-line package summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// When this version was uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
}

impl ResolvedVersion {
    /// Create a ResolvedVersion with only a version
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            summary: None,
            released_at: None,
        }
    }

    /// Set the package summary
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Set the release date
    pub fn with_released_at(mut self, released_at: DateTime<Utc>) -> Self {
        self.released_at = Some(released_at);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PreKey {
    /// `1.0.dev1` sorts before `1.0a1`
    DevOnly,
    Pre(u8, u64),
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DevKey {
    Dev(u64),
    Release,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    epoch: u64,
    release: Vec<u64>,
    pre: PreKey,
    post: Option<u64>,
    dev: DevKey,
}

fn number(caps: &regex::Captures, name: &str) -> Option<u64> {
    caps.name(name)
        .map(|m| m.as_str().parse::<u64>().unwrap_or(0))
}

fn sort_key(version: &str) -> Option<SortKey> {
    let caps = PEP440_RE.captures(version)?;

    let epoch = number(&caps, "epoch").unwrap_or(0);
    let mut release: Vec<u64> = caps["release"]
        .split('.')
        .map(|p| p.parse::<u64>().unwrap_or(0))
        .collect();
    while release.len() > 1 && release.last() == Some(&0) {
        release.pop();
    }

    let pre = caps.name("pre_l").map(|label| {
        let rank = match label.as_str().to_ascii_lowercase().as_str() {
            "a" | "alpha" => 0,
            "b" | "beta" => 1,
            _ => 2,
        };
        (rank, number(&caps, "pre_n").unwrap_or(0))
    });
    let post = number(&caps, "post_implicit").or_else(|| number(&caps, "post_n"));
    let dev = number(&caps, "dev_n");

    let pre = match (pre, post, dev) {
        (Some((rank, n)), _, _) => PreKey::Pre(rank, n),
        (None, None, Some(_)) => PreKey::DevOnly,
        _ => PreKey::Final,
    };

    Some(SortKey {
        epoch,
        release,
        pre,
        post,
        dev: dev.map(DevKey::Dev).unwrap_or(DevKey::Release),
    })
}

/// Compare two version strings using PEP 440 ordering
///
/// Release segments are compared numerically with trailing zeros ignored
/// (`1.6 == 1.6.0`) and pre-releases sort before the final release. Strings
/// that are not PEP 440 versions fall back to comparing their numeric parts.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (sort_key(a), sort_key(b)) {
        (Some(ka), Some(kb)) => ka.cmp(&kb),
        _ => compare_numeric_parts(a, b),
    }
}

fn compare_numeric_parts(a: &str, b: &str) -> Ordering {
    let parse_parts = |s: &str| -> Vec<u64> {
        let s = s.strip_prefix('v').unwrap_or(s);
        s.split(['.', '-']).filter_map(|p| p.parse().ok()).collect()
    };

    let parts_a = parse_parts(a);
    let parts_b = parse_parts(b);

    for (pa, pb) in parts_a.iter().zip(parts_b.iter()) {
        match pa.cmp(pb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    parts_a.len().cmp(&parts_b.len())
}

/// Returns true if `version` matches a `==`/`!=` style pattern such as `2.*`
pub fn matches_version_pattern(version: &str, pattern: &str) -> bool {
    match pattern.strip_suffix(".*") {
        Some(prefix) => {
            let Some(prefix_key) = sort_key(prefix) else {
                return false;
            };
            let Some(key) = sort_key(version) else {
                return false;
            };
            let mut release = sort_key_release(version);
            let prefix_release = sort_key_release(prefix);
            release.resize(release.len().max(prefix_release.len()), 0);
            key.epoch == prefix_key.epoch && release.starts_with(&prefix_release)
        }
        None => compare_versions(version, pattern) == Ordering::Equal,
    }
}

fn sort_key_release(version: &str) -> Vec<u64> {
    PEP440_RE
        .captures(version)
        .map(|caps| {
            caps["release"]
                .split('.')
                .map(|p| p.parse::<u64>().unwrap_or(0))
                .collect()
        })
        .unwrap_or_default()
}
