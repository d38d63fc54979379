//! Commit-message directive scanner (spec §4.4, §6, and the Conventional
//! Commits supplement from §11.4).

use regex::Regex;
use std::sync::LazyLock;

/// Ordered worst-to-best so `max` picks the highest-severity directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    None,
    Patch,
    Minor,
    Major,
    /// No directive found at all; distinct from an explicit `+semver:none`.
    Absent,
}

impl Severity {
    pub fn highest(self, other: Self) -> Self {
        // `Absent` never wins over an explicit directive, including `None`.
        match (self, other) {
            (Severity::Absent, x) | (x, Severity::Absent) => x,
            (a, b) => a.max(b),
        }
    }
}

static SEMVER_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\+semver:\s*(major|minor|patch|none|breaking|feature|fix)").unwrap()
});

/// Scans for `+semver:major|minor|patch|none` tokens (and the
/// `breaking|feature|fix` aliases), anywhere in the message. Multiple
/// directives may appear; the highest-severity one wins.
pub fn scan_semver_tokens(message: &str) -> Severity {
    let mut best = Severity::Absent;
    for captures in SEMVER_TOKEN_RE.captures_iter(message) {
        let token = captures.get(1).unwrap().as_str().to_lowercase();
        let severity = match token.as_str() {
            "major" | "breaking" => Severity::Major,
            "minor" | "feature" => Severity::Minor,
            "patch" | "fix" => Severity::Patch,
            "none" => Severity::None,
            _ => unreachable!(),
        };
        best = best.highest(severity);
    }
    best
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitMessageIncrementing {
    #[default]
    Disabled,
    Enabled,
    /// Restricts the Conventional-Commits detector to merge commits only
    /// (§11.4, §13): useful for squash-merge workflows where only the merge
    /// commit carries a conventional header.
    MergeMessageOnly,
}

impl CommitMessageIncrementing {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "Enabled" => Ok(Self::Enabled),
            "Disabled" => Ok(Self::Disabled),
            "MergeMessageOnly" => Ok(Self::MergeMessageOnly),
            other => Err(format!(
                r#"Invalid value "{other}" for CommitMessageIncrementing. Should be "Enabled" or "Disabled"."#
            )),
        }
    }
}

/// Conventional Commits detector (§11.4): `feat` -> Minor, `fix` -> Patch,
/// a `!` suffix or a `BREAKING CHANGE`/`BREAKING-CHANGE` footer -> Major.
pub fn scan_conventional_commit(message: &str) -> Severity {
    let Ok(commit) = conventional_commit_parser::parse(message.trim()) else {
        return Severity::Absent;
    };

    if commit.is_breaking_change
        || commit
            .footers
            .iter()
            .any(|f| f.token.to_ascii_uppercase().replace('-', " ") == "BREAKING CHANGE")
    {
        return Severity::Major;
    }

    match commit.commit_type.to_string().to_lowercase().as_str() {
        "feat" => Severity::Minor,
        "fix" => Severity::Patch,
        _ => Severity::Absent,
    }
}

/// Combines the always-on `+semver:` scanner with the opt-in Conventional
/// Commits detector, per the configured [`CommitMessageIncrementing`] mode.
pub fn scan_commit(message: &str, mode: CommitMessageIncrementing, is_merge: bool) -> Severity {
    let spec_directive = scan_semver_tokens(message);

    let conventional = match mode {
        CommitMessageIncrementing::Disabled => Severity::Absent,
        CommitMessageIncrementing::Enabled => scan_conventional_commit(message),
        CommitMessageIncrementing::MergeMessageOnly if is_merge => scan_conventional_commit(message),
        CommitMessageIncrementing::MergeMessageOnly => Severity::Absent,
    };

    spec_directive.highest(conventional)
}
