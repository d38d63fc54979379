//! `GitContext`: the immutable per-invocation snapshot (spec §3's
//! "Lifecycle" note). Built once, read by every provider, then discarded;
//! no persistent state survives a calculation.

use crate::branch_config::BranchConfig;
use crate::config::Configuration;
use crate::repository::{CommitId, RepositoryAdapter};

pub struct GitContext<'a> {
    pub current_branch: String,
    pub current_commit: CommitId,
    pub repo: &'a dyn RepositoryAdapter,
    pub config: &'a Configuration,
    pub branch_config: BranchConfig,
}
