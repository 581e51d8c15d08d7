// ABOUTME: Applies an EnvDiff onto the target store under a conflict policy
// ABOUTME: Additive merge; all-or-nothing when the policy is `error`

use direnvoy_logging::trace;

use crate::config::ConflictPolicy;
use crate::error::ImportError;
use crate::parse::EnvDiff;
use crate::store::EnvStore;

/// Counts of what one merge actually did to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Variables written with a new or changed value
    pub set: usize,
    /// Variables removed
    pub unset: usize,
    /// Variables kept at their existing value under the `preserve` policy
    pub preserved: usize,
}

impl MergeSummary {
    /// Number of store mutations; zero means the store was already up to date.
    pub fn changed(&self) -> usize {
        self.set + self.unset
    }
}

/// Merges a diff into a target store.
///
/// The merge is additive: target entries not named by the diff are left
/// untouched. Under [`ConflictPolicy::Error`] conflicts are detected before
/// any write, so a rejected merge leaves the store exactly as it was. An
/// entry already holding the incoming value is never a conflict, which keeps
/// repeated imports idempotent. Unsets always apply; retracting a variable
/// is not a conflict under any policy.
#[derive(Debug, Clone, Copy)]
pub struct EnvMerger {
    policy: ConflictPolicy,
}

impl EnvMerger {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self { policy }
    }

    pub fn merge(&self, diff: &EnvDiff, store: &mut EnvStore) -> Result<MergeSummary, ImportError> {
        if self.policy == ConflictPolicy::Error {
            for (name, value) in diff.set() {
                if store.get(name).is_some_and(|current| current != value) {
                    return Err(ImportError::Conflict { name: name.clone() });
                }
            }
        }

        let mut summary = MergeSummary::default();

        for (name, value) in diff.set() {
            match store.get(name) {
                Some(current) if current == value => {}
                Some(_) if self.policy == ConflictPolicy::Preserve => {
                    trace!(name = %name, "preserving existing value");
                    summary.preserved += 1;
                }
                _ => {
                    store.set(name.clone(), value.clone());
                    summary.set += 1;
                }
            }
        }

        for name in diff.unset() {
            if store.unset(name) {
                summary.unset += 1;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(entries: &[(&str, &str)]) -> EnvStore {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn diff(set: &[(&str, &str)], unset: &[&str]) -> EnvDiff {
        let mut diff = EnvDiff::default();
        for (name, value) in set {
            diff.record_set(*name, *value);
        }
        for name in unset {
            diff.record_unset(*name);
        }
        diff
    }

    #[test]
    fn test_merge_is_additive() {
        let mut target = store(&[("KEEP", "me"), ("FOO", "old")]);
        let summary = EnvMerger::new(ConflictPolicy::Overwrite)
            .merge(&diff(&[("FOO", "bar"), ("BAZ", "qux")], &[]), &mut target)
            .unwrap();

        assert_eq!(summary.set, 2);
        assert_eq!(target.get("KEEP"), Some("me"));
        assert_eq!(target.get("FOO"), Some("bar"));
        assert_eq!(target.get("BAZ"), Some("qux"));
    }

    #[test]
    fn test_preserve_keeps_existing_values() {
        let mut target = store(&[("FOO", "old")]);
        let summary = EnvMerger::new(ConflictPolicy::Preserve)
            .merge(&diff(&[("FOO", "new"), ("BAZ", "qux")], &[]), &mut target)
            .unwrap();

        assert_eq!(summary.set, 1);
        assert_eq!(summary.preserved, 1);
        assert_eq!(target.get("FOO"), Some("old"));
        assert_eq!(target.get("BAZ"), Some("qux"));
    }

    #[test]
    fn test_error_policy_is_all_or_nothing() {
        let mut target = store(&[("FOO", "old")]);
        let before = target.clone();

        let err = EnvMerger::new(ConflictPolicy::Error)
            .merge(&diff(&[("NEW", "value"), ("FOO", "new")], &[]), &mut target)
            .unwrap_err();

        assert_eq!(
            err,
            ImportError::Conflict {
                name: "FOO".to_string()
            }
        );
        assert_eq!(target, before);
    }

    #[test]
    fn test_equal_value_is_not_a_conflict() {
        let mut target = store(&[("FOO", "same")]);
        let summary = EnvMerger::new(ConflictPolicy::Error)
            .merge(&diff(&[("FOO", "same"), ("BAZ", "qux")], &[]), &mut target)
            .unwrap();

        assert_eq!(summary.set, 1);
        assert_eq!(summary.changed(), 1);
        assert_eq!(target.get("BAZ"), Some("qux"));
    }

    #[test]
    fn test_unset_removes_and_never_conflicts() {
        let mut target = store(&[("GONE", "soon")]);
        let summary = EnvMerger::new(ConflictPolicy::Error)
            .merge(&diff(&[], &["GONE", "NEVER_EXISTED"]), &mut target)
            .unwrap();

        assert_eq!(summary.unset, 1);
        assert!(!target.contains("GONE"));
    }

    #[test]
    fn test_noop_merge_reports_no_changes() {
        let mut target = store(&[("FOO", "bar")]);
        let summary = EnvMerger::new(ConflictPolicy::Overwrite)
            .merge(&diff(&[("FOO", "bar")], &[]), &mut target)
            .unwrap();

        assert_eq!(summary.changed(), 0);
    }

    #[test]
    fn test_repeat_merge_is_idempotent() {
        let mut target = store(&[("FOO", "old")]);
        let changes = diff(&[("FOO", "bar"), ("BAZ", "qux")], &["OLD"]);
        let merger = EnvMerger::new(ConflictPolicy::Overwrite);

        merger.merge(&changes, &mut target).unwrap();
        let after_first = target.clone();
        let second = merger.merge(&changes, &mut target).unwrap();

        assert_eq!(target, after_first);
        assert_eq!(second.changed(), 0);
    }
}
