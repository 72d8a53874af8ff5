use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Both sides of a value that differs between two releases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedValue {
    pub base: String,
    pub to_compare: String,
}

/// Three-way classification of the union of keys from two releases.
/// BTreeMaps keep the output deterministic regardless of input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseCompareResult {
    /// Keys present in the compared release but not the base.
    pub added: BTreeMap<String, String>,
    /// Keys present in the base but not the compared release.
    pub removed: BTreeMap<String, String>,
    /// Keys present in both with differing values.
    pub modified: BTreeMap<String, ModifiedValue>,
    /// Keys present in both with identical values.
    pub unchanged: BTreeMap<String, String>,
}

impl ReleaseCompareResult {
    pub fn between(
        base: &BTreeMap<String, String>,
        to_compare: &BTreeMap<String, String>,
    ) -> Self {
        let mut result = Self {
            added: BTreeMap::new(),
            removed: BTreeMap::new(),
            modified: BTreeMap::new(),
            unchanged: BTreeMap::new(),
        };

        for (key, base_value) in base {
            match to_compare.get(key) {
                None => {
                    result.removed.insert(key.clone(), base_value.clone());
                }
                Some(compare_value) if compare_value == base_value => {
                    result.unchanged.insert(key.clone(), base_value.clone());
                }
                Some(compare_value) => {
                    result.modified.insert(
                        key.clone(),
                        ModifiedValue {
                            base: base_value.clone(),
                            to_compare: compare_value.clone(),
                        },
                    );
                }
            }
        }

        for (key, compare_value) in to_compare {
            if !base.contains_key(key) {
                result.added.insert(key.clone(), compare_value.clone());
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn classifies_added_removed_modified_unchanged() {
        let base = items(&[("timeout", "30"), ("retries", "3"), ("gone", "x")]);
        let compare = items(&[("timeout", "60"), ("retries", "3"), ("fresh", "y")]);

        let result = ReleaseCompareResult::between(&base, &compare);

        assert_eq!(result.added, items(&[("fresh", "y")]));
        assert_eq!(result.removed, items(&[("gone", "x")]));
        assert_eq!(result.unchanged, items(&[("retries", "3")]));
        assert_eq!(result.modified.len(), 1);
        let change = &result.modified["timeout"];
        assert_eq!(change.base, "30");
        assert_eq!(change.to_compare, "60");
    }

    #[test]
    fn identical_sets_are_all_unchanged() {
        let base = items(&[("a", "1"), ("b", "2")]);
        let result = ReleaseCompareResult::between(&base, &base.clone());

        assert!(result.added.is_empty());
        assert!(result.removed.is_empty());
        assert!(result.modified.is_empty());
        assert_eq!(result.unchanged, base);
    }

    #[test]
    fn empty_base_marks_everything_added() {
        let base = BTreeMap::new();
        let compare = items(&[("a", "1")]);
        let result = ReleaseCompareResult::between(&base, &compare);

        assert_eq!(result.added, compare);
        assert!(result.removed.is_empty());
        assert!(result.modified.is_empty());
        assert!(result.unchanged.is_empty());
    }
}
