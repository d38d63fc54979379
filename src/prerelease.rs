//! Pre-release tag formatter (spec §4.8): expands a branch's tag template
//! into a label, sanitized per spec §6, and lets the caller compute the
//! versioning-mode-dependent counter from commit counts.

use crate::branch_config::{BranchConfig, VersioningMode};
use regex::Regex;
use std::sync::LazyLock;

const BRANCH_NAME_PLACEHOLDER: &str = "{BranchName}";
const USE_BRANCH_NAME: &str = "useBranchName";

static ILLEGAL_PRE_RELEASE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z-]+").unwrap());

/// Spec §6: replace each run of characters outside `[0-9A-Za-z-]` with a
/// single `-`, then trim leading/trailing `-`.
pub fn sanitize_label(raw: &str) -> String {
    ILLEGAL_PRE_RELEASE_CHARS.replace_all(raw, "-").trim_matches('-').to_string()
}

/// The pre-release label for `branch_config` on `branch_name`, or `None`
/// when this branch produces no pre-release at all: an empty `tag`
/// template, or Mainline mode on the mainline branch itself (spec §4.8).
pub fn label(branch_config: &BranchConfig, branch_name: &str) -> Option<String> {
    if branch_config.tag.is_empty() {
        return None;
    }
    if branch_config.versioning_mode == VersioningMode::Mainline && branch_config.is_mainline {
        return None;
    }

    if branch_config.tag == USE_BRANCH_NAME {
        return Some(sanitize_label(branch_name));
    }
    if branch_config.tag.contains(BRANCH_NAME_PLACEHOLDER) {
        let expanded = branch_config.tag.replace(BRANCH_NAME_PLACEHOLDER, branch_name);
        return Some(sanitize_label(&expanded));
    }
    Some(sanitize_label(&branch_config.tag))
}

/// Whether this mode assigns a numeric pre-release counter at all.
/// `ContinuousDeployment` and mainline-under-`Mainline` carry the commit
/// count only in build metadata (spec §4.8).
pub fn carries_number(branch_config: &BranchConfig) -> bool {
    match branch_config.versioning_mode {
        VersioningMode::ContinuousDeployment => false,
        VersioningMode::ContinuousDelivery => true,
        VersioningMode::Mainline => !branch_config.is_mainline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn config(tag: &str, mode: VersioningMode, is_mainline: bool) -> BranchConfig {
        BranchConfig {
            name: "test".to_string(),
            tag: tag.to_string(),
            increment: crate::branch_config::IncrementSetting::Patch,
            versioning_mode: mode,
            prevent_increment_of_merged_branch_version: false,
            track_merge_target: false,
            source_branches: HashSet::new(),
            is_release_branch: false,
            is_mainline,
            captured_branch_name: None,
        }
    }

    #[test]
    fn empty_tag_has_no_label() {
        let cfg = config("", VersioningMode::ContinuousDelivery, false);
        assert_eq!(label(&cfg, "develop"), None);
    }

    #[test]
    fn use_branch_name_sanitizes_the_branch_name() {
        let cfg = config("useBranchName", VersioningMode::ContinuousDelivery, false);
        assert_eq!(label(&cfg, "feature/foo_bar").as_deref(), Some("feature-foo-bar"));
    }

    #[test]
    fn branch_name_placeholder_is_substituted_and_sanitized() {
        let cfg = config("alpha.{BranchName}", VersioningMode::ContinuousDelivery, false);
        assert_eq!(label(&cfg, "foo/bar").as_deref(), Some("alpha-foo-bar"));
    }

    #[test]
    fn literal_tag_is_used_verbatim_after_sanitizing() {
        let cfg = config("beta", VersioningMode::ContinuousDelivery, false);
        assert_eq!(label(&cfg, "anything").as_deref(), Some("beta"));
    }

    #[test]
    fn mainline_mode_suppresses_label_on_mainline_branch() {
        let cfg = config("beta", VersioningMode::Mainline, true);
        assert_eq!(label(&cfg, "main"), None);
    }

    #[test]
    fn mainline_mode_keeps_label_on_non_mainline_branch() {
        let cfg = config("beta", VersioningMode::Mainline, false);
        assert_eq!(label(&cfg, "issue1").as_deref(), Some("beta"));
    }

    #[test]
    fn continuous_deployment_carries_no_number() {
        let cfg = config("beta", VersioningMode::ContinuousDeployment, false);
        assert!(!carries_number(&cfg));
    }
}
