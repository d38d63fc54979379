//! Base-version source providers (spec §4.5): independent strategies that
//! each propose zero or more candidate base versions with provenance.
//! Modeled as a tagged-variant enum with a single `propose` operation
//! rather than a trait-object hierarchy, per spec §9's design note.

use crate::context::GitContext;
use crate::errors::Result;
use crate::repository::CommitId;
use crate::semver_model::SemanticVersion;
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone)]
pub struct BaseVersionCandidate {
    pub source: String,
    pub should_increment: bool,
    pub sem_ver: SemanticVersion,
    pub base_version_source: Option<CommitId>,
}

#[derive(Debug, Clone, Copy)]
pub enum BaseVersionProvider {
    ConfigNextVersion,
    TaggedCommit,
    MergeMessage,
    BranchName,
    Fallback,
}

impl BaseVersionProvider {
    pub const ALL: [BaseVersionProvider; 5] = [
        BaseVersionProvider::ConfigNextVersion,
        BaseVersionProvider::TaggedCommit,
        BaseVersionProvider::MergeMessage,
        BaseVersionProvider::BranchName,
        BaseVersionProvider::Fallback,
    ];

    pub fn propose(&self, ctx: &GitContext) -> Result<Vec<BaseVersionCandidate>> {
        match self {
            BaseVersionProvider::ConfigNextVersion => propose_config_next_version(ctx),
            BaseVersionProvider::TaggedCommit => propose_tagged_commit(ctx),
            BaseVersionProvider::MergeMessage => propose_merge_message(ctx),
            BaseVersionProvider::BranchName => propose_branch_name(ctx),
            BaseVersionProvider::Fallback => Ok(vec![fallback_candidate()]),
        }
    }
}

fn fallback_candidate() -> BaseVersionCandidate {
    BaseVersionCandidate {
        source: "Fallback".to_string(),
        should_increment: true,
        sem_ver: SemanticVersion::new(0, 0, 0),
        base_version_source: None,
    }
}

/// P1 — the configured `NextVersion` is never incremented: it is the
/// intended output, verbatim.
fn propose_config_next_version(ctx: &GitContext) -> Result<Vec<BaseVersionCandidate>> {
    Ok(match &ctx.config.next_version {
        Some(version) => vec![BaseVersionCandidate {
            source: "NextVersion in config".to_string(),
            should_increment: false,
            sem_ver: version.clone(),
            base_version_source: None,
        }],
        None => vec![],
    })
}

/// P2 — every tag matching a SemVer pattern (optionally prefixed) that is
/// an ancestor of (or is) the current commit. Walks ancestor commits and
/// asks the adapter which tags sit directly on each, rather than fetching
/// every tag in the repository and testing set membership.
fn propose_tagged_commit(ctx: &GitContext) -> Result<Vec<BaseVersionCandidate>> {
    if ctx.repo.cancellation().is_cancelled() {
        return Ok(vec![]);
    }

    let tag_pattern = tag_version_pattern(&ctx.config.tag_prefix);
    let mut candidates = Vec::new();
    for commit in ctx.repo.commits_from(ctx.current_commit)? {
        for tag_name in ctx.repo.tags_on(commit.id)? {
            let Some(captures) = tag_pattern.captures(&tag_name) else { continue };
            let Ok(version) = SemanticVersion::parse(captures.name("Version").unwrap().as_str()) else {
                continue;
            };
            candidates.push(BaseVersionCandidate {
                source: format!("Git tag {tag_name}"),
                should_increment: commit.id != ctx.current_commit,
                sem_ver: version,
                base_version_source: Some(commit.id),
            });
        }
    }
    Ok(candidates)
}

fn tag_version_pattern(tag_prefix: &str) -> Regex {
    Regex::new(&format!(r"^{tag_prefix}(?P<Version>\d+\.\d+\.\d+(?:-[0-9A-Za-z.\-]+)?)$"))
        .unwrap_or_else(|_| Regex::new(r"^[vV]?(?P<Version>\d+\.\d+\.\d+(?:-[0-9A-Za-z.\-]+)?)$").unwrap())
}

/// P3 — merge-commit messages referencing an embedded version, e.g. `Merge
/// branch 'release/1.2.3'`. Only considered when the current branch's
/// effective config sets `TrackMergeTarget` (spec §3): a branch opts in by
/// declaring that what gets merged into it is itself a base-version source,
/// the way `support`/`main`/`develop` do by default. `preventIncrementOfMerged
/// BranchVersion` (spec §3, §9) forces `shouldIncrement: false` when set on the
/// target branch's effective config, treating the merge the same as a
/// tag-on-HEAD assertion.
fn propose_merge_message(ctx: &GitContext) -> Result<Vec<BaseVersionCandidate>> {
    if !ctx.branch_config.track_merge_target {
        return Ok(vec![]);
    }

    let formats: Vec<Regex> =
        ctx.config.merge_message_formats.iter().filter_map(|p| Regex::new(p).ok()).collect();
    if formats.is_empty() {
        return Ok(vec![]);
    }

    let mut candidates = Vec::new();
    for commit in ctx.repo.commits_from(ctx.current_commit)? {
        if !ctx.repo.is_merge_commit(commit.id)? {
            continue;
        }
        for format in &formats {
            let Some(captures) = format.captures(&commit.message) else { continue };

            let version = captures
                .name("Version")
                .and_then(|m| SemanticVersion::parse(m.as_str()).ok())
                .or_else(|| {
                    captures.name("BranchName").and_then(|m| version_in_branch_name(m.as_str()))
                });

            if let Some(version) = version {
                candidates.push(BaseVersionCandidate {
                    source: format!("Merge commit into {}", ctx.current_branch),
                    should_increment: !ctx.branch_config.prevent_increment_of_merged_branch_version,
                    sem_ver: version,
                    base_version_source: Some(commit.id),
                });
                break;
            }
        }
    }
    Ok(candidates)
}

static BRANCH_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<Version>\d+\.\d+\.\d+)").unwrap());

fn version_in_branch_name(name: &str) -> Option<SemanticVersion> {
    BRANCH_VERSION_RE.captures(name).and_then(|c| SemanticVersion::parse(c.name("Version")?.as_str()).ok())
}

/// P4 — a SemVer-shaped substring in the current branch name (e.g.
/// `release/1.2.3`) names the exact intended version.
fn propose_branch_name(ctx: &GitContext) -> Result<Vec<BaseVersionCandidate>> {
    Ok(match version_in_branch_name(&ctx.current_branch) {
        Some(version) => vec![BaseVersionCandidate {
            source: format!("Branch name {}", ctx.current_branch),
            should_increment: false,
            sem_ver: version,
            base_version_source: None,
        }],
        None => vec![],
    })
}
