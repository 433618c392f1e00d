//! PEP 508 requirement parsing and constraint rewriting
//!
//! Handles requirement strings like:
//! - Bare name: `pytest`
//! - Extras: `mkdocstrings[python]>=0.27`
//! - Clauses: `requests>=2.28,<3.0`, `ruff~=0.9.0`, `click==8.0.0`
//! - Markers: `pywin32>=300; sys_platform == 'win32'`
//! - Direct references: `pkg @ https://example.com/pkg.whl`
//!
//! Rewriting only ever touches the version of `>=` and `~=` clauses. Every
//! other byte of the requirement (operators, spacing, extras, upper bounds,
//! markers) is kept as written.

use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(\[[^\]]*\])?").unwrap()
});
static CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(~=|===|==|!=|<=|>=|<|>)\s*([A-Za-z0-9*+!._-]+)\s*$").unwrap()
});
static MINIMUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(~=|>=)(\s*)([A-Za-z0-9*+!._-]+)").unwrap());
/// A release with a single segment, e.g. `306`, `1!2024` or `2024rc1`
static SINGLE_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((?:\d+!)?\d+)([^.\d].*)?$").unwrap());

/// Comparison operator of a version clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    /// `~=` compatible release
    Compatible,
    /// `==` exact (or wildcard) match
    Equal,
    /// `===` arbitrary equality
    Arbitrary,
    /// `!=` exclusion
    NotEqual,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
}

impl Operator {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "~=" => Operator::Compatible,
            "==" => Operator::Equal,
            "===" => Operator::Arbitrary,
            "!=" => Operator::NotEqual,
            "<=" => Operator::LessOrEqual,
            ">=" => Operator::GreaterOrEqual,
            "<" => Operator::Less,
            ">" => Operator::Greater,
            _ => return None,
        })
    }

    /// Returns the operator as written in a specifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Compatible => "~=",
            Operator::Equal => "==",
            Operator::Arbitrary => "===",
            Operator::NotEqual => "!=",
            Operator::LessOrEqual => "<=",
            Operator::GreaterOrEqual => ">=",
            Operator::Less => "<",
            Operator::Greater => ">",
        }
    }

    /// Returns true for operators that freeze the version
    pub fn is_pin(&self) -> bool {
        matches!(self, Operator::Equal | Operator::Arbitrary)
    }

    /// Returns true for operators whose version gets bumped on upgrade
    pub fn is_minimum(&self) -> bool {
        matches!(self, Operator::GreaterOrEqual | Operator::Compatible)
    }

    /// Returns true for operators that cap the allowed versions
    pub fn is_upper_bound(&self) -> bool {
        matches!(
            self,
            Operator::Less | Operator::LessOrEqual | Operator::NotEqual
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `<operator><version>` clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clause {
    pub operator: Operator,
    pub version: String,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

/// A parsed dependency requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    /// The requirement exactly as written
    pub raw: String,
    /// Package name as written
    pub name: String,
    /// Extras including brackets, e.g. `[python]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<String>,
    /// Version clauses in order
    pub clauses: Vec<Clause>,
    /// Environment marker after `;`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    /// Direct reference URL after `@`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Byte range of the version specifier part inside `raw`
    #[serde(skip)]
    spec_range: Range<usize>,
}

impl Requirement {
    /// Parse a requirement string. Returns None if it is not a PEP 508 requirement.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = NAME_RE.captures(raw)?;
        let name = caps.get(1)?.as_str().to_string();
        let extras = caps.get(2).map(|m| m.as_str().to_string());
        let head_end = caps.get(0)?.end();

        let rest = &raw[head_end..];
        let (spec_len, marker) = match rest.find(';') {
            Some(idx) => (idx, Some(rest[idx + 1..].trim().to_string())),
            None => (rest.len(), None),
        };
        let spec_range = head_end..head_end + spec_len;
        let spec = raw[spec_range.clone()].trim();

        if let Some(url) = spec.strip_prefix('@') {
            let url = url.trim();
            if url.is_empty() {
                return None;
            }
            return Some(Self {
                raw: raw.to_string(),
                name,
                extras,
                clauses: Vec::new(),
                marker,
                url: Some(url.to_string()),
                spec_range,
            });
        }

        // Legacy parenthesised form: `name (>=1.0)`
        let spec = spec
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(spec)
            .trim();

        let mut clauses = Vec::new();
        if !spec.is_empty() {
            for part in spec.split(',') {
                let caps = CLAUSE_RE.captures(part)?;
                clauses.push(Clause {
                    operator: Operator::parse(caps.get(1)?.as_str())?,
                    version: caps.get(2)?.as_str().to_string(),
                });
            }
        }

        Some(Self {
            raw: raw.to_string(),
            name,
            extras,
            clauses,
            marker,
            url: None,
            spec_range,
        })
    }

    /// Returns true if any clause freezes the version (`==`, `===`)
    pub fn is_pinned(&self) -> bool {
        self.clauses.iter().any(|c| c.operator.is_pin())
    }

    /// Returns true if the requirement has a `>=` or `~=` clause to bump
    pub fn has_minimum(&self) -> bool {
        self.clauses.iter().any(|c| c.operator.is_minimum())
    }

    /// Version of the first `>=`/`~=` clause
    pub fn minimum_version(&self) -> Option<&str> {
        self.clauses
            .iter()
            .find(|c| c.operator.is_minimum())
            .map(|c| c.version.as_str())
    }

    /// Clauses that cap the allowed versions (`<`, `<=`, `!=`)
    pub fn upper_bounds(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(|c| c.operator.is_upper_bound())
    }

    /// The specifier part as written, e.g. `>=2.28,<3.0`
    pub fn specifier(&self) -> &str {
        self.raw[self.spec_range.clone()].trim()
    }

    /// Returns the requirement with every `>=`/`~=` version replaced by `new_version`.
    ///
    /// Pinned requirements and requirements without a minimum clause come back
    /// unchanged. Applying the same version twice gives the same string.
    pub fn rewrite(&self, new_version: &str) -> String {
        if self.is_pinned() || !self.has_minimum() || self.url.is_some() {
            return self.raw.clone();
        }

        let spec = &self.raw[self.spec_range.clone()];
        let replaced = MINIMUM_RE.replace_all(spec, |caps: &regex::Captures| {
            let version = if &caps[1] == "~=" {
                compatible_release(new_version)
            } else {
                Cow::Borrowed(new_version)
            };
            format!("{}{}{}", &caps[1], &caps[2], version)
        });

        let mut result = String::with_capacity(self.raw.len() + new_version.len());
        result.push_str(&self.raw[..self.spec_range.start]);
        result.push_str(&replaced);
        result.push_str(&self.raw[self.spec_range.end..]);
        result
    }
}

/// `~=` needs at least two release segments; `306` becomes `306.0`
fn compatible_release(version: &str) -> Cow<'_, str> {
    SINGLE_SEGMENT_RE.replace(version, "${1}.0${2}")
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
