//! Increment strategy engine (spec §4.7): decides which component of the
//! arbitrated base version to bump.

use crate::branch_config::{BranchConfig, IncrementSetting, VersioningMode};
use crate::directives::Severity;
use crate::semver_model::SemanticVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Increment {
    None,
    Patch,
    Minor,
    Major,
}

/// Spec §4.7 rules 1-4. Rule 1 (`shouldIncrement == false`) is handled
/// here; rule 5 (clearing the pre-release on the base) is the caller's
/// job, since the base's own pre-release is always replaced by the
/// formatter (§4.8) regardless of whether a bump happened.
///
/// A base version that already carries a pre-release (e.g. a tag like
/// `0.1.0-test.1` that is not on HEAD) is treated as "mid release train":
/// `major.minor.patch` is not bumped a second time, only the pre-release
/// counter advances in §4.8. This resolves the open question in spec §9
/// about re-incrementing an already-pre-release base (see DESIGN.md).
pub fn decide(
    should_increment: bool,
    base: &SemanticVersion,
    directive: Severity,
    branch_config: &BranchConfig,
) -> Increment {
    if !should_increment || base.pre_release.is_some() {
        return Increment::None;
    }

    match directive {
        Severity::Major => return Increment::Major,
        Severity::Minor => return Increment::Minor,
        Severity::Patch => return Increment::Patch,
        Severity::None => return Increment::None,
        Severity::Absent => {}
    }

    match branch_config.increment {
        IncrementSetting::Major => Increment::Major,
        IncrementSetting::Minor => Increment::Minor,
        IncrementSetting::Patch => Increment::Patch,
        IncrementSetting::None => Increment::None,
        // Should already have been resolved away by the branch-config
        // resolver (spec §4.3 rule 4); kept as an explicit, documented
        // fallback rather than an unreachable panic (spec §4.7 rule 4).
        IncrementSetting::Inherit => match branch_config.versioning_mode {
            VersioningMode::Mainline if branch_config.is_mainline => Increment::Minor,
            VersioningMode::Mainline => Increment::Patch,
            _ => Increment::Patch,
        },
    }
}

pub fn apply(version: &mut SemanticVersion, increment: Increment) {
    match increment {
        Increment::Major => version.increment_major(),
        Increment::Minor => version.increment_minor(),
        Increment::Patch => version.increment_patch(),
        Increment::None => {}
    }
}
