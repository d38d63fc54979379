//! Repository adapter (spec §4.2): the narrow interface the core requires
//! from its host. `Git2Repository` is the only implementation this crate
//! ships; the trait exists so the calculation core stays decoupled from any
//! particular Git library.

use crate::cancellation::CancellationToken;
use crate::errors::{Result, VersionCalculationError};
use chrono::{DateTime, TimeZone, Utc};
use git2::{Oid, Repository, Sort};
use std::collections::HashMap;

/// Opaque commit handle. `git2::Oid` is reused directly rather than wrapped
/// in a crate-local newtype: the only backing implementation here is git2,
/// and every adapter method already returns/accepts it as a value type.
pub type CommitId = Oid;

#[derive(Debug, Clone)]
pub struct Commit {
    pub id: CommitId,
    pub message: String,
    pub parents: Vec<CommitId>,
    pub committer_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TagRef {
    pub name: String,
    pub target: CommitId,
    pub annotated: bool,
}

#[derive(Debug, Clone)]
pub struct BranchRef {
    pub name: String,
    pub tip: CommitId,
    pub is_remote: bool,
}

#[derive(Debug, Clone)]
pub struct HeadInfo {
    pub branch_name: Option<String>,
    pub commit: CommitId,
    pub detached: bool,
}

/// Capabilities the core requires from its host (spec §4.2). Adapters must
/// be deterministic per snapshot: two calls against the same on-disk state
/// must agree.
pub trait RepositoryAdapter {
    fn head(&self) -> Result<HeadInfo>;

    /// Commits reachable from `start`, newest-first (topological order).
    fn commits_from(&self, start: CommitId) -> Result<Vec<Commit>>;

    fn tags(&self) -> Result<Vec<TagRef>>;

    /// Tags pointing directly at `commit`.
    fn tags_on(&self, commit: CommitId) -> Result<Vec<String>>;

    fn local_branches(&self) -> Result<Vec<BranchRef>>;

    fn remote_branches(&self) -> Result<Vec<BranchRef>>;

    fn find_branch(&self, name: &str) -> Result<Option<BranchRef>>;

    fn merge_base(&self, a: CommitId, b: CommitId) -> Result<Option<CommitId>>;

    fn is_merge_commit(&self, commit: CommitId) -> Result<bool>;

    /// Count of commits reachable from `commit` but not from `ancestor`.
    /// `ancestor = None` counts from the root of the repository.
    fn commits_since(&self, commit: CommitId, ancestor: Option<CommitId>) -> Result<u64>;

    fn commit_message(&self, commit: CommitId) -> Result<String>;

    fn is_dirty(&self) -> Result<bool>;

    fn cancellation(&self) -> &CancellationToken;
}

pub struct Git2Repository {
    repo: Repository,
    cancellation: CancellationToken,
}

impl Git2Repository {
    pub fn open(path: &std::path::Path) -> Result<Self> {
        Ok(Self { repo: Repository::open(path)?, cancellation: CancellationToken::new() })
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    fn commit_date(&self, id: CommitId) -> Result<DateTime<Utc>> {
        let commit = self.repo.find_commit(id)?;
        let time = commit.committer().when();
        Ok(Utc
            .timestamp_opt(time.seconds(), 0)
            .single()
            .unwrap_or_else(Utc::now))
    }

    fn to_commit(&self, oid: Oid) -> Result<Commit> {
        let commit = self.repo.find_commit(oid)?;
        Ok(Commit {
            id: oid,
            message: commit.message().unwrap_or_default().to_string(),
            parents: commit.parent_ids().collect(),
            committer_date: self.commit_date(oid)?,
        })
    }
}

impl RepositoryAdapter for Git2Repository {
    fn head(&self) -> Result<HeadInfo> {
        let head = self.repo.head().map_err(|e| match e.code() {
            git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound => {
                VersionCalculationError::NoCommits
            }
            _ => VersionCalculationError::Repository(e),
        })?;
        let commit = head.peel_to_commit()?.id();
        if head.is_branch() {
            let branch_name = head
                .shorthand()
                .ok_or_else(|| VersionCalculationError::Repository(git2::Error::from_str(
                    "branch name could not be determined",
                )))?
                .to_string();
            Ok(HeadInfo { branch_name: Some(branch_name), commit, detached: false })
        } else {
            Ok(HeadInfo { branch_name: None, commit, detached: true })
        }
    }

    fn commits_from(&self, start: CommitId) -> Result<Vec<Commit>> {
        let mut walk = self.repo.revwalk()?;
        walk.push(start)?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let mut commits = Vec::new();
        for oid in walk {
            if self.cancellation.is_cancelled() {
                return Err(VersionCalculationError::Cancelled);
            }
            commits.push(self.to_commit(oid?)?);
        }
        Ok(commits)
    }

    fn tags(&self) -> Result<Vec<TagRef>> {
        let mut result = Vec::new();
        for name in self.tags_by_name()? {
            let reference = self.repo.find_reference(&format!("refs/tags/{name}"))?;
            let object = reference.peel(git2::ObjectType::Commit)?;
            let annotated = reference.peel_to_tag().is_ok();
            result.push(TagRef { name, target: object.id(), annotated });
        }
        Ok(result)
    }

    fn tags_on(&self, commit: CommitId) -> Result<Vec<String>> {
        Ok(self.tags()?.into_iter().filter(|t| t.target == commit).map(|t| t.name).collect())
    }

    fn local_branches(&self) -> Result<Vec<BranchRef>> {
        self.branches(git2::BranchType::Local)
    }

    fn remote_branches(&self) -> Result<Vec<BranchRef>> {
        self.branches(git2::BranchType::Remote)
    }

    fn find_branch(&self, name: &str) -> Result<Option<BranchRef>> {
        for candidate in self.local_branches()?.into_iter().chain(self.remote_branches()?) {
            if candidate.name == name {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn merge_base(&self, a: CommitId, b: CommitId) -> Result<Option<CommitId>> {
        match self.repo.merge_base(a, b) {
            Ok(oid) => Ok(Some(oid)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn is_merge_commit(&self, commit: CommitId) -> Result<bool> {
        Ok(self.repo.find_commit(commit)?.parent_count() >= 2)
    }

    fn commits_since(&self, commit: CommitId, ancestor: Option<CommitId>) -> Result<u64> {
        let mut walk = self.repo.revwalk()?;
        walk.push(commit)?;
        walk.set_sorting(Sort::TOPOLOGICAL)?;

        let mut count = 0u64;
        for oid in walk {
            let oid = oid?;
            if Some(oid) == ancestor {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    fn commit_message(&self, commit: CommitId) -> Result<String> {
        Ok(self.repo.find_commit(commit)?.message().unwrap_or_default().to_string())
    }

    fn is_dirty(&self) -> Result<bool> {
        let mut options = git2::StatusOptions::new();
        options.include_untracked(false);
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(!statuses.is_empty())
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl Git2Repository {
    fn tags_by_name(&self) -> Result<Vec<String>> {
        Ok(self.repo.tag_names(None)?.iter().flatten().map(str::to_string).collect())
    }

    fn branches(&self, kind: git2::BranchType) -> Result<Vec<BranchRef>> {
        let mut result = Vec::new();
        for branch in self.repo.branches(Some(kind))? {
            let (branch, branch_type) = branch?;
            let Some(name) = branch.name()?.map(str::to_string) else { continue };
            let name = match branch_type {
                git2::BranchType::Remote => {
                    name.split_once('/').map(|(_, n)| n.to_string()).unwrap_or(name)
                }
                git2::BranchType::Local => name,
            };
            let tip = branch.get().peel_to_commit()?.id();
            result.push(BranchRef { name, tip, is_remote: branch_type == git2::BranchType::Remote });
        }
        Ok(result)
    }
}

/// Groups tags/branches that name the same commit, used by providers that
/// need every ref pointing at a given sha without re-walking the repo.
pub fn tags_by_commit(tags: &[TagRef]) -> HashMap<CommitId, Vec<&TagRef>> {
    let mut map: HashMap<CommitId, Vec<&TagRef>> = HashMap::new();
    for tag in tags {
        map.entry(tag.target).or_default().push(tag);
    }
    map
}
