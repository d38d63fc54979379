//! Computes a Semantic Version for a source-controlled working copy by
//! analyzing the commit graph, tags, branch topology and per-branch
//! configuration (spec §1-§9). This module wires the leaf components
//! together into the pipeline described in spec §2's data-flow diagram:
//! repository adapter + configuration feed the branch-config resolver,
//! which feeds every base-version provider; the arbiter reduces their
//! candidates to one triple; the increment engine and pre-release
//! formatter turn that into the final `GitVersion`.

pub mod arbiter;
pub mod assembler;
pub mod branch_config;
pub mod cancellation;
pub mod config;
pub mod context;
pub mod directives;
pub mod errors;
pub mod exporter;
pub mod format_parser;
pub mod increment;
pub mod prerelease;
pub mod providers;
pub mod repository;
pub mod semver_model;

pub use assembler::GitVersion;
pub use config::Configuration;
pub use errors::{Result, VersionCalculationError};

use crate::branch_config::{BranchConfigResolver, VersioningMode};
use crate::context::GitContext;
use crate::directives::Severity;
use crate::providers::BaseVersionProvider;
use crate::repository::{Commit, CommitId, Git2Repository, RepositoryAdapter};
use crate::semver_model::{BuildMetadata, PreRelease};
use chrono::Utc;
use std::collections::HashSet;

/// Displayed in place of a branch name when HEAD is detached and no
/// `CurrentBranchOverride` was supplied (spec §6, §11.2).
pub const NO_BRANCH_NAME: &str = "(no branch)";

/// Entry point of the version-calculation pipeline (spec §2).
pub struct GitVersioner;

impl GitVersioner {
    /// Opens the repository at `config.repository_path` and calculates its
    /// version. See [`GitVersioner::calculate_with_repo`] to supply an
    /// already-open adapter (used by tests and by hosts that manage their
    /// own `Repository` handle).
    pub fn calculate_version(config: &Configuration) -> Result<GitVersion> {
        let repo = Git2Repository::open(&config.repository_path)?;
        Self::calculate_with_repo(&repo, config)
    }

    pub fn calculate_with_repo(repo: &dyn RepositoryAdapter, config: &Configuration) -> Result<GitVersion> {
        let head = repo.head()?;
        let current_commit = head.commit;
        let current_branch = config
            .current_branch_override
            .clone()
            .or(head.branch_name)
            .unwrap_or_else(|| NO_BRANCH_NAME.to_string());

        if repo.cancellation().is_cancelled() {
            return Err(VersionCalculationError::Cancelled);
        }

        if config.verbose {
            tracing::info!(branch = %current_branch, commit = %current_commit, "resolved HEAD");
        }

        let branch_config = BranchConfigResolver::new(config, repo).resolve(&current_branch)?;
        if config.verbose {
            tracing::debug!(?branch_config, "resolved effective branch configuration");
        }

        let ctx = GitContext {
            current_branch: current_branch.clone(),
            current_commit,
            repo,
            config,
            branch_config: branch_config.clone(),
        };

        let mut candidates = Vec::new();
        for provider in BaseVersionProvider::ALL {
            candidates.extend(provider.propose(&ctx)?);
        }

        if repo.cancellation().is_cancelled() {
            return Err(VersionCalculationError::Cancelled);
        }

        let arbitration = arbiter::arbitrate(&candidates);
        if config.verbose {
            tracing::debug!(
                base_version = %arbitration.sem_ver,
                should_increment = arbitration.should_increment,
                provenance = %arbitration.provenance,
                "arbitrated base version"
            );
        }

        let commits_since_base =
            commits_since_base(repo, current_commit, arbitration.base_version_source, config)?;

        let severity = scan_directives(repo, &commits_since_base, config)?;
        let increment = increment::decide(
            arbitration.should_increment,
            &arbitration.sem_ver,
            severity,
            &branch_config,
        );

        let mut version = arbitration.sem_ver.clone();
        increment::apply(&mut version, increment);

        let on_exact_base = arbitration.base_version_source == Some(current_commit)
            && commits_since_base.is_empty()
            && arbitration.sem_ver.pre_release.is_none();

        let tag_template_name = branch_config.captured_branch_name.as_deref().unwrap_or(&current_branch);
        let label = if on_exact_base { None } else { prerelease::label(&branch_config, tag_template_name) };

        let seed = match (&label, &arbitration.sem_ver.pre_release) {
            (Some(l), Some(p)) if &p.name == l => p.number.unwrap_or(0),
            _ => 0,
        };
        let commit_count = commits_since_base.len() as u64;

        // When the carried-over pre-release label differs from the newly
        // resolved one (e.g. "test" merged into a branch labeled "beta"),
        // the labeled counter restarts at the nearest merge commit instead
        // of counting every commit back to the arbitrated base (spec §4.8:
        // the CD counter counts commits "with this same label").
        let label_mismatch = match (&label, &arbitration.sem_ver.pre_release) {
            (Some(l), Some(p)) => &p.name != l,
            _ => false,
        };
        let commit_count_for_numbering = if label_mismatch {
            match find_label_change_boundary(&commits_since_base, repo)? {
                Some(boundary) => repo.commits_since(current_commit, Some(boundary))? + 1,
                None => commit_count,
            }
        } else {
            commit_count
        };

        let pre_release_number = if label.is_some() && prerelease::carries_number(&branch_config) {
            Some(seed + commit_count_for_numbering)
        } else {
            None
        };

        version.pre_release = label.map(|name| PreRelease::new(name, pre_release_number));

        let commit_date = repo
            .commits_from(current_commit)?
            .into_iter()
            .find(|c| c.id == current_commit)
            .map(|c| c.committer_date)
            .unwrap_or_else(Utc::now);

        version.build = Some(BuildMetadata {
            commits_since_tag: commit_count,
            branch_name: current_branch.clone(),
            sha: current_commit.to_string(),
            commit_date,
        });

        let weighted_pre_release_number = match branch_config.versioning_mode {
            VersioningMode::ContinuousDeployment => commit_count,
            _ => seed + commit_count_for_numbering,
        };

        let git_version = GitVersion::assemble(assembler::AssemblyInput {
            version,
            weighted_pre_release_number,
            branch_name: current_branch,
            version_source_sha: arbitration.base_version_source.map(|id| id.to_string()),
            uncommitted_changes: repo.is_dirty()?,
        });

        Ok(git_version)
    }
}

/// Commits reachable from `current` but not from `base` (or every commit
/// back to the repository root when `base` is `None`), with entries in
/// `config.ignore` removed (spec §4.7 input, §6 `ignore` config).
fn commits_since_base(
    repo: &dyn RepositoryAdapter,
    current: CommitId,
    base: Option<CommitId>,
    config: &Configuration,
) -> Result<Vec<Commit>> {
    let ancestor_ids: HashSet<CommitId> = match base {
        Some(base) => repo.commits_from(base)?.into_iter().map(|c| c.id).collect(),
        None => HashSet::new(),
    };

    let mut result = Vec::new();
    for commit in repo.commits_from(current)? {
        if ancestor_ids.contains(&commit.id) {
            continue;
        }
        if config::should_ignore(&config.ignore, &commit.id.to_string(), commit.committer_date) {
            continue;
        }
        result.push(commit);
    }
    Ok(result)
}

/// Folds the commit-message directive scanner (spec §4.4) over every
/// commit since the base version; the highest-severity directive wins.
fn scan_directives(repo: &dyn RepositoryAdapter, commits: &[Commit], config: &Configuration) -> Result<Severity> {
    let mut severity = Severity::Absent;
    for commit in commits {
        let is_merge = repo.is_merge_commit(commit.id)?;
        let found = directives::scan_commit(&commit.message, config.commit_message_incrementing, is_merge);
        severity = severity.highest(found);
    }
    Ok(severity)
}

/// Finds the nearest merge commit in `commits` (ordered newest-first) to
/// restart the labeled pre-release counter from after a label switch.
fn find_label_change_boundary(commits: &[Commit], repo: &dyn RepositoryAdapter) -> Result<Option<CommitId>> {
    for commit in commits {
        if repo.is_merge_commit(commit.id)? {
            return Ok(Some(commit.id));
        }
    }
    Ok(None)
}
