//! Next-version assembler (spec §4.8): combines the incremented base
//! version, pre-release label/number and build metadata into the final
//! `SemanticVersion`, then renders the expanded `GitVersion` output struct
//! (spec §11.9) that the CLI and CI exporters consume.

use crate::semver_model::{BuildMetadata, PreRelease, RenderFormat, SemanticVersion, short_sha};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Superset of the reference crate's `GitVersion`: adds the fields its own
/// test fixtures already reference ahead of its `src/` (spec §11.9).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GitVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub major_minor_patch: String,
    pub pre_release_tag: String,
    pub pre_release_tag_with_dash: String,
    pub pre_release_label: String,
    pub pre_release_label_with_dash: String,
    pub pre_release_number: String,
    pub weighted_pre_release_number: u64,
    pub build_metadata: String,
    pub sem_ver: String,
    pub assembly_sem_ver: String,
    pub assembly_sem_file_ver: String,
    pub full_sem_ver: String,
    pub informational_version: String,
    pub branch_name: String,
    pub escaped_branch_name: String,
    pub sha: String,
    pub short_sha: String,
    pub version_source_sha: String,
    pub commits_since_version_source: u64,
    pub uncommitted_changes: bool,
    pub commit_date: String,
}

pub struct AssemblyInput {
    pub version: SemanticVersion,
    pub weighted_pre_release_number: u64,
    pub branch_name: String,
    pub version_source_sha: Option<String>,
    pub uncommitted_changes: bool,
}

impl GitVersion {
    pub fn assemble(input: AssemblyInput) -> Self {
        let version = input.version;
        let pre = version.pre_release.clone();
        let label = pre.as_ref().map(|p| p.name.clone()).unwrap_or_default();
        let number_str = pre.as_ref().and_then(|p| p.number).map(|n| n.to_string()).unwrap_or_default();
        let pre_tag = pre.as_ref().map(PreRelease::render).unwrap_or_default();

        let build = version.build.clone().unwrap_or(BuildMetadata {
            commits_since_tag: 0,
            branch_name: input.branch_name.clone(),
            sha: String::new(),
            commit_date: Utc::now(),
        });

        let sem_ver = version.render(RenderFormat::Short);
        let full_sem_ver = version.render(RenderFormat::Full);
        let escaped_branch_name = crate::prerelease::sanitize_label(&input.branch_name);

        Self {
            major: version.major,
            minor: version.minor,
            patch: version.patch,
            major_minor_patch: format!("{}.{}.{}", version.major, version.minor, version.patch),
            pre_release_tag: pre_tag.clone(),
            pre_release_tag_with_dash: if pre_tag.is_empty() { String::new() } else { format!("-{pre_tag}") },
            pre_release_label: label.clone(),
            pre_release_label_with_dash: if label.is_empty() { String::new() } else { format!("-{label}") },
            pre_release_number: number_str,
            weighted_pre_release_number: input.weighted_pre_release_number,
            build_metadata: build.render(),
            sem_ver: sem_ver.clone(),
            assembly_sem_ver: format!("{}.{}.{}", version.major, version.minor, version.patch),
            assembly_sem_file_ver: format!(
                "{}.{}.{}.{}",
                version.major, version.minor, version.patch, input.weighted_pre_release_number
            ),
            full_sem_ver,
            informational_version: format!("{sem_ver}+{}", build.render()),
            branch_name: input.branch_name,
            escaped_branch_name,
            sha: build.sha.clone(),
            short_sha: short_sha(&build.sha),
            version_source_sha: input.version_source_sha.unwrap_or_default(),
            commits_since_version_source: build.commits_since_tag,
            uncommitted_changes: input.uncommitted_changes,
            commit_date: build.commit_date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl std::fmt::Display for GitVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.full_sem_ver, self.branch_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_release_with_no_pre_release() {
        let version = SemanticVersion::new(1, 2, 3);
        let input = AssemblyInput {
            version,
            weighted_pre_release_number: 0,
            branch_name: "main".to_string(),
            version_source_sha: Some("abc1234".to_string()),
            uncommitted_changes: false,
        };
        let git_version = GitVersion::assemble(input);
        assert_eq!(git_version.sem_ver, "1.2.3");
        assert_eq!(git_version.pre_release_tag, "");
        assert_eq!(git_version.version_source_sha, "abc1234");
    }

    #[test]
    fn assembles_pre_release_with_dash_prefixed_variants() {
        let mut version = SemanticVersion::new(0, 1, 0);
        version.pre_release = Some(PreRelease::new("alpha", Some(5)));
        let input = AssemblyInput {
            version,
            weighted_pre_release_number: 5,
            branch_name: "develop".to_string(),
            version_source_sha: None,
            uncommitted_changes: true,
        };
        let git_version = GitVersion::assemble(input);
        assert_eq!(git_version.pre_release_tag, "alpha.5");
        assert_eq!(git_version.pre_release_tag_with_dash, "-alpha.5");
        assert_eq!(git_version.pre_release_label_with_dash, "-alpha");
        assert_eq!(git_version.pre_release_number, "5");
        assert!(git_version.uncommitted_changes);
        assert_eq!(git_version.version_source_sha, "");
    }
}
