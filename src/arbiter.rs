//! Base-version arbiter (spec §4.6): reduces every provider's candidates to
//! a single `(semVer, shouldIncrement, baseVersionSource)` triple.

use crate::providers::BaseVersionCandidate;
use crate::repository::CommitId;
use crate::semver_model::SemanticVersion;

#[derive(Debug, Clone)]
pub struct ArbitrationResult {
    pub sem_ver: SemanticVersion,
    pub should_increment: bool,
    pub base_version_source: Option<CommitId>,
    pub provenance: String,
}

/// `candidates` must be non-empty; `BaseVersionProvider::Fallback` (§4.5,
/// P5) guarantees at least one candidate reaches here.
pub fn arbitrate(candidates: &[BaseVersionCandidate]) -> ArbitrationResult {
    let winner = candidates.iter().map(|c| &c.sem_ver).max().expect("fallback candidate guarantees a winner").clone();

    let group: Vec<&BaseVersionCandidate> =
        candidates.iter().filter(|c| c.sem_ver == winner).collect();

    // An explicit "this is the version" assertion (NextVersion, tag on
    // HEAD, branch-name pin) suppresses further bumping for the group.
    let should_increment = !group.iter().any(|c| !c.should_increment);

    let base_version_source = group.iter().find_map(|c| c.base_version_source);

    let provenance = group
        .iter()
        .find(|c| !c.should_increment)
        .or_else(|| group.first())
        .map(|c| c.source.clone())
        .unwrap_or_default();

    ArbitrationResult { sem_ver: winner, should_increment, base_version_source, provenance }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(source: &str, should_increment: bool, semver: &str, anchor: Option<CommitId>) -> BaseVersionCandidate {
        BaseVersionCandidate {
            source: source.to_string(),
            should_increment,
            sem_ver: SemanticVersion::parse(semver).unwrap(),
            base_version_source: anchor,
        }
    }

    #[test]
    fn highest_semver_group_wins() {
        let candidates = vec![
            candidate("Fallback", true, "0.0.0", None),
            candidate("Git tag 1.2.3", true, "1.2.3", None),
        ];
        let result = arbitrate(&candidates);
        assert_eq!((result.sem_ver.major, result.sem_ver.minor, result.sem_ver.patch), (1, 2, 3));
    }

    #[test]
    fn any_false_in_winning_group_suppresses_increment() {
        let candidates = vec![
            candidate("NextVersion", false, "1.0.0", None),
            candidate("Branch name release/1.0.0", false, "1.0.0", None),
        ];
        let result = arbitrate(&candidates);
        assert!(!result.should_increment);
    }

    #[test]
    fn all_true_in_winning_group_allows_increment() {
        let candidates = vec![candidate("Fallback", true, "0.0.0", None)];
        let result = arbitrate(&candidates);
        assert!(result.should_increment);
    }
}
