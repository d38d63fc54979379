//! Semantic Version model: parse, compare, render and increment versions.
//!
//! Spec §4.1. Precedence follows SemVer 2.0.0 §11; build metadata never
//! affects ordering or equality, only rendering.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid version: {0}")]
pub struct InvalidVersion(pub String);

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^[vV]?
        (?P<major>0|[1-9]\d*)\.
        (?P<minor>0|[1-9]\d*)\.
        (?P<patch>0|[1-9]\d*)
        (?:-(?P<pre>[0-9A-Za-z\-.]+))?
        (?:\+(?P<build>[0-9A-Za-z\-.]+))?
        $",
    )
    .unwrap()
});

/// Structured pre-release value: a label plus an optional trailing counter,
/// e.g. `alpha.5` is `{ name: "alpha", number: Some(5) }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreRelease {
    pub name: String,
    pub number: Option<u64>,
}

impl PreRelease {
    pub fn new(name: impl Into<String>, number: Option<u64>) -> Self {
        Self { name: name.into(), number }
    }

    /// Splits `alpha.5` into name `alpha` and number `5`. A string with no
    /// numeric trailing component (e.g. `alpha` or `rc.beta`) is kept whole
    /// as the name with no number.
    fn parse(raw: &str) -> Self {
        if let Some(idx) = raw.rfind('.') {
            let (name, rest) = raw.split_at(idx);
            let number_str = &rest[1..];
            if let Ok(number) = number_str.parse::<u64>() {
                return Self { name: name.to_string(), number: Some(number) };
            }
        }
        Self { name: raw.to_string(), number: None }
    }

    pub fn render(&self) -> String {
        match self.number {
            Some(n) => format!("{}.{}", self.name, n),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl PartialOrd for PreRelease {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PreRelease {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name).then_with(|| self.number.cmp(&other.number))
    }
}

/// Build metadata: never affects precedence, carried through purely for
/// rendering and CI/export purposes (spec §3, §4.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMetadata {
    pub commits_since_tag: u64,
    pub branch_name: String,
    pub sha: String,
    pub commit_date: DateTime<Utc>,
}

impl BuildMetadata {
    /// Renders as `commits.branch.sha`, per spec §6's full-form grammar,
    /// with the branch name collapsed to SemVer-legal build-metadata
    /// characters.
    pub fn render(&self) -> String {
        format!(
            "{}.{}.{}",
            self.commits_since_tag,
            crate::prerelease::sanitize_label(&self.branch_name),
            short_sha(&self.sha),
        )
    }
}

pub fn short_sha(sha: &str) -> String {
    sha.chars().take(7).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    /// `M.m.p[-pre.N][+build]`
    Canonical,
    /// Always includes pre-release and build metadata when present.
    Full,
    /// `M.m.p[-pre.N]`, never includes build metadata.
    Short,
}

#[derive(Debug, Clone)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: Option<PreRelease>,
    pub build: Option<BuildMetadata>,
}

impl SemanticVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch, pre_release: None, build: None }
    }

    pub fn parse(s: &str) -> Result<Self, InvalidVersion> {
        let captures = VERSION_RE
            .captures(s.trim())
            .ok_or_else(|| InvalidVersion(s.to_string()))?;

        let parse_component = |name: &str| -> Result<u64, InvalidVersion> {
            captures
                .name(name)
                .unwrap()
                .as_str()
                .parse::<u64>()
                .map_err(|_| InvalidVersion(s.to_string()))
        };

        Ok(Self {
            major: parse_component("major")?,
            minor: parse_component("minor")?,
            patch: parse_component("patch")?,
            pre_release: captures.name("pre").map(|m| PreRelease::parse(m.as_str())),
            build: None,
        })
    }

    pub fn render(&self, format: RenderFormat) -> String {
        let mut s = format!("{}.{}.{}", self.major, self.minor, self.patch);
        match format {
            RenderFormat::Short => {
                if let Some(pre) = &self.pre_release {
                    s.push('-');
                    s.push_str(&pre.render());
                }
            }
            RenderFormat::Canonical | RenderFormat::Full => {
                if let Some(pre) = &self.pre_release {
                    s.push('-');
                    s.push_str(&pre.render());
                }
                if let Some(build) = &self.build {
                    s.push('+');
                    s.push_str(&build.render());
                }
            }
        }
        s
    }

    pub fn increment_major(&mut self) {
        self.major += 1;
        self.minor = 0;
        self.patch = 0;
        self.pre_release = None;
    }

    pub fn increment_minor(&mut self) {
        self.minor += 1;
        self.patch = 0;
        self.pre_release = None;
    }

    pub fn increment_patch(&mut self) {
        self.patch += 1;
        self.pre_release = None;
    }

    /// Increments only the pre-release counter; no-op when there is no
    /// pre-release to begin with.
    pub fn increment_pre_release_number(&mut self) {
        if let Some(pre) = &mut self.pre_release {
            pre.number = Some(pre.number.unwrap_or(0) + 1);
        }
    }

    /// `major.minor.patch` only, for precedence-affecting comparisons that
    /// ignore pre-release (e.g. "is this tag an ancestor at least this
    /// high").
    pub fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(RenderFormat::Canonical))
    }
}

/// Precedence equality: build metadata is never significant (spec §3, §8
/// round-trip invariant).
impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple()).then_with(|| {
            // A version with no pre-release outranks one with a pre-release
            // at the same triple; among two with a pre-release, lower wins.
            match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_leading_v() {
        let v = SemanticVersion::parse("v1.2.3").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
    }

    #[test]
    fn parses_pre_release_with_number() {
        let v = SemanticVersion::parse("1.2.3-alpha.5").unwrap();
        let pre = v.pre_release.unwrap();
        assert_eq!(pre.name, "alpha");
        assert_eq!(pre.number, Some(5));
    }

    #[test]
    fn rejects_non_numeric_components() {
        assert!(SemanticVersion::parse("1.x.3").is_err());
        assert!(SemanticVersion::parse("-1.2.3").is_err());
    }

    #[test]
    fn precedence_ignores_build_metadata() {
        let mut a = SemanticVersion::new(1, 0, 0);
        let mut b = SemanticVersion::new(1, 0, 0);
        a.build = Some(BuildMetadata {
            commits_since_tag: 3,
            branch_name: "main".into(),
            sha: "abc1234".into(),
            commit_date: Utc::now(),
        });
        b.build = None;
        assert_eq!(a, b);
    }

    #[test]
    fn absent_pre_release_outranks_present_at_same_triple() {
        let released = SemanticVersion::new(1, 0, 0);
        let mut rc = SemanticVersion::new(1, 0, 0);
        rc.pre_release = Some(PreRelease::new("rc", Some(1)));
        assert!(released > rc);
    }

    #[test]
    fn lower_pre_release_number_precedes_higher() {
        let mut a = SemanticVersion::new(1, 0, 0);
        a.pre_release = Some(PreRelease::new("alpha", Some(1)));
        let mut b = SemanticVersion::new(1, 0, 0);
        b.pre_release = Some(PreRelease::new("alpha", Some(2)));
        assert!(a < b);
    }

    #[test]
    fn round_trip_render_then_parse() {
        let mut v = SemanticVersion::new(1, 2, 3);
        v.pre_release = Some(PreRelease::new("beta", Some(4)));
        let rendered = v.render(RenderFormat::Short);
        let reparsed = SemanticVersion::parse(&rendered).unwrap();
        assert_eq!(v, reparsed);
    }

    #[test]
    fn increment_major_resets_lower_components_and_pre_release() {
        let mut v = SemanticVersion::new(1, 5, 9);
        v.pre_release = Some(PreRelease::new("rc", Some(2)));
        v.increment_major();
        assert_eq!((v.major, v.minor, v.patch), (2, 0, 0));
        assert!(v.pre_release.is_none());
    }
}
