//! Branch configuration resolver (spec §4.3): maps the current branch name
//! to an effective [`BranchConfig`] by matching configured patterns and
//! folding `Inherit` fields against the branch's most likely source branch.

use crate::config::{BranchConfigEntry, Configuration};
use crate::errors::{Result, VersionCalculationError};
use crate::repository::RepositoryAdapter;
use regex::Regex;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementSetting {
    None,
    Patch,
    Minor,
    Major,
    Inherit,
}

impl IncrementSetting {
    pub fn parse(value: &str) -> std::result::Result<Self, String> {
        match value {
            "None" => Ok(Self::None),
            "Patch" => Ok(Self::Patch),
            "Minor" => Ok(Self::Minor),
            "Major" => Ok(Self::Major),
            "Inherit" => Ok(Self::Inherit),
            other => Err(format!("unknown increment setting: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersioningMode {
    ContinuousDelivery,
    ContinuousDeployment,
    Mainline,
}

impl VersioningMode {
    pub fn parse(value: &str) -> std::result::Result<Self, String> {
        match value {
            "ContinuousDelivery" => Ok(Self::ContinuousDelivery),
            "ContinuousDeployment" => Ok(Self::ContinuousDeployment),
            "Mainline" => Ok(Self::Mainline),
            other => Err(format!("unknown versioning mode: {other}")),
        }
    }
}

/// The effective, fully-resolved per-branch configuration (spec §3).
#[derive(Debug, Clone)]
pub struct BranchConfig {
    pub name: String,
    pub tag: String,
    pub increment: IncrementSetting,
    pub versioning_mode: VersioningMode,
    pub prevent_increment_of_merged_branch_version: bool,
    pub track_merge_target: bool,
    pub source_branches: HashSet<String>,
    pub is_release_branch: bool,
    pub is_mainline: bool,
    /// The `BranchName` named capture from the matched regex, when present
    /// (e.g. `feature/foo` matched against `^features?/(?<BranchName>.+)$`
    /// captures `foo`). `useBranchName`/`{BranchName}` tag templates use
    /// this in place of the raw branch name so the configured prefix is
    /// not folded into the pre-release label.
    pub captured_branch_name: Option<String>,
}

impl BranchConfig {
    /// Fallback configuration used when no configured branch pattern
    /// matches, and as the base case for `Inherit` resolution.
    pub fn unknown() -> Self {
        Self {
            name: "unknown".to_string(),
            tag: "{BranchName}".to_string(),
            increment: IncrementSetting::Patch,
            versioning_mode: VersioningMode::ContinuousDelivery,
            prevent_increment_of_merged_branch_version: false,
            track_merge_target: false,
            source_branches: HashSet::new(),
            is_release_branch: false,
            is_mainline: false,
            captured_branch_name: None,
        }
    }
}

pub struct BranchConfigResolver<'a> {
    config: &'a Configuration,
    repo: &'a dyn RepositoryAdapter,
}

impl<'a> BranchConfigResolver<'a> {
    pub fn new(config: &'a Configuration, repo: &'a dyn RepositoryAdapter) -> Self {
        Self { config, repo }
    }

    pub fn resolve(&self, branch_name: &str) -> Result<BranchConfig> {
        self.resolve_inner(branch_name, &mut HashSet::new())
    }

    fn resolve_inner(&self, branch_name: &str, visiting: &mut HashSet<String>) -> Result<BranchConfig> {
        if !visiting.insert(branch_name.to_string()) {
            // Cycle in source-branch inheritance: fall back to `unknown`.
            return Ok(BranchConfig::unknown());
        }

        let matched = self.most_specific_match(branch_name)?;
        let Some((key, entry, regex)) = matched else {
            tracing::debug!(branch = branch_name, "no branch pattern matched; using unknown config");
            return Ok(BranchConfig::unknown());
        };
        let captured_branch_name = regex
            .captures(branch_name)
            .and_then(|c| c.name("BranchName"))
            .map(|m| m.as_str().to_string());

        let source = self.resolve_source_config(branch_name, &entry, visiting)?;

        // A release branch prevents its merged-in version from being bumped
        // again by whatever it merges into, unless the entry says otherwise
        // explicitly (spec §11.5's "forcibly promote to release-branch
        // semantics" is this: being a release branch implies the merge-time
        // guard that `release`/`hotfix` already opt into by hand).
        let is_release_branch = entry.is_release_branch.unwrap_or(source.is_release_branch);
        let prevent_increment_of_merged_branch_version =
            entry.prevent_increment_of_merged_branch_version.unwrap_or_else(|| {
                is_release_branch || source.prevent_increment_of_merged_branch_version
            });

        Ok(BranchConfig {
            name: key,
            tag: entry.tag.clone().unwrap_or(source.tag),
            increment: self.resolve_increment(entry.increment.as_deref(), &source)?,
            versioning_mode: self.resolve_versioning_mode(entry.versioning_mode.as_deref(), &source)?,
            prevent_increment_of_merged_branch_version,
            track_merge_target: entry.track_merge_target.unwrap_or(source.track_merge_target),
            source_branches: entry
                .source_branches
                .clone()
                .map(|v| v.into_iter().collect())
                .unwrap_or(source.source_branches),
            is_release_branch,
            is_mainline: entry.is_mainline.unwrap_or(source.is_mainline),
            captured_branch_name,
        })
    }

    fn resolve_increment(
        &self,
        configured: Option<&str>,
        source: &BranchConfig,
    ) -> Result<IncrementSetting> {
        match configured {
            None => Ok(source.increment),
            Some(value) => {
                let setting = IncrementSetting::parse(value)
                    .map_err(VersionCalculationError::Configuration)?;
                Ok(if setting == IncrementSetting::Inherit { source.increment } else { setting })
            }
        }
    }

    fn resolve_versioning_mode(
        &self,
        configured: Option<&str>,
        source: &BranchConfig,
    ) -> Result<VersioningMode> {
        match configured {
            None => Ok(source.versioning_mode),
            Some(value) => {
                VersioningMode::parse(value).map_err(VersionCalculationError::Configuration)
            }
        }
    }

    /// Finds the source branch this one most likely branched from: among
    /// the matched entry's `source_branches`, the branch whose merge-base
    /// with `branch_name` is newest (spec §4.3 rule 4).
    fn resolve_source_config(
        &self,
        branch_name: &str,
        entry: &BranchConfigEntry,
        visiting: &mut HashSet<String>,
    ) -> Result<BranchConfig> {
        let Some(source_branches) = &entry.source_branches else {
            return Ok(BranchConfig::unknown());
        };
        if source_branches.is_empty() {
            return Ok(BranchConfig::unknown());
        }

        let Some(current) = self.repo.find_branch(branch_name)? else {
            return Ok(BranchConfig::unknown());
        };

        let mut best: Option<(chrono::DateTime<chrono::Utc>, String)> = None;
        for candidate_name in source_branches {
            let Some(candidate) = self.repo.find_branch(candidate_name)? else { continue };
            let Some(merge_base) = self.repo.merge_base(current.tip, candidate.tip)? else { continue };
            let commits = self.repo.commits_from(merge_base)?;
            let Some(date) = commits.first().map(|c| c.committer_date) else { continue };
            if best.as_ref().is_none_or(|(best_date, _)| date > *best_date) {
                best = Some((date, candidate_name.clone()));
            }
        }

        match best {
            Some((_, name)) => self.resolve_inner(&name, visiting),
            None => Ok(BranchConfig::unknown()),
        }
    }

    /// Among every configured branch pattern matching `branch_name`, picks
    /// the most specific one: the pattern with the most literal (non-regex
    /// -meta) characters. Ties keep the first match in configuration order.
    fn most_specific_match(
        &self,
        branch_name: &str,
    ) -> Result<Option<(String, BranchConfigEntry, Regex)>> {
        let mut best: Option<(usize, String, BranchConfigEntry, Regex)> = None;

        for (key, entry) in self.config.branches.iter() {
            let regex = Regex::new(&entry.regex)
                .map_err(|e| VersionCalculationError::Configuration(format!(
                    "invalid regex for branch config {key:?}: {e}"
                )))?;
            if !regex.is_match(branch_name) {
                continue;
            }
            let specificity = literal_character_count(&entry.regex);
            let better = match &best {
                None => true,
                Some((best_specificity, ..)) => specificity > *best_specificity,
            };
            if better {
                best = Some((specificity, key.clone(), entry.clone(), regex));
            }
        }

        Ok(best.map(|(_, key, entry, regex)| (key, entry, regex)))
    }
}

/// Proxy for "most specific regex": counts characters that are not regex
/// metacharacters, as a cheap specificity heuristic.
fn literal_character_count(pattern: &str) -> usize {
    pattern.chars().filter(|c| !"^$.|?*+()[]{}\\".contains(*c)).count()
}
