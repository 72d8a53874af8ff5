use crate::model::{generate_id, Id, NamespaceInstance};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An immutable snapshot of a namespace instance's items. Once created the
/// item contents never change; only `is_abandoned` may flip false -> true,
/// when a rollback supersedes the release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: Id,
    pub app_id: String,
    pub env: String,
    pub cluster_name: String,
    pub namespace_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub items: BTreeMap<String, String>,
    /// SHA-256 over identity plus the sorted item set.
    pub fingerprint: String,
    pub created_at: String, // ISO 8601 timestamp
    pub created_by: String,
    pub is_abandoned: bool,
}

impl Release {
    /// Snapshot the instance's current items into a new release. The item map
    /// is copied by value: later edits to the instance never reach a release
    /// that has already been built.
    pub fn snapshot(
        instance: &NamespaceInstance,
        created_by: &str,
        title: Option<String>,
        comment: Option<String>,
    ) -> Self {
        let items = instance.item_values();
        let fingerprint = Self::calculate_fingerprint(
            &instance.app_id,
            &instance.env,
            &instance.cluster_name,
            &instance.namespace_name,
            &items,
        );
        Self {
            id: generate_id(),
            app_id: instance.app_id.clone(),
            env: instance.env.clone(),
            cluster_name: instance.cluster_name.clone(),
            namespace_name: instance.namespace_name.clone(),
            title,
            comment,
            items,
            fingerprint,
            created_at: chrono::Utc::now().to_rfc3339(),
            created_by: created_by.to_string(),
            is_abandoned: false,
        }
    }

    /// SHA-256 content fingerprint. BTreeMap iteration gives a stable key
    /// order, so equal item sets always hash the same.
    fn calculate_fingerprint(
        app_id: &str,
        env: &str,
        cluster_name: &str,
        namespace_name: &str,
        items: &BTreeMap<String, String>,
    ) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(format!(
            "namespace:{}/{}/{}/{}\n",
            app_id, env, cluster_name, namespace_name
        ));
        for (key, value) in items {
            hasher.update(format!("item:{}={}\n", key, value));
        }

        hex::encode(hasher.finalize())
    }
}

/// Caller-supplied metadata for a publish request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRelease {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub released_by: String,
    #[serde(default)]
    pub is_emergency_publish: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NamespaceKey;

    fn instance_with(items: &[(&str, &str)]) -> NamespaceInstance {
        let key = NamespaceKey::new("demo", "DEV", "default", "application");
        let mut instance = NamespaceInstance::new(&key);
        for (k, v) in items {
            instance.set_item(k, v, "tester");
        }
        instance
    }

    #[test]
    fn snapshot_copies_items_by_value() {
        let mut instance = instance_with(&[("timeout", "30"), ("retries", "3")]);
        let release = Release::snapshot(&instance, "tester", None, None);

        instance.set_item("timeout", "60", "tester");
        instance.remove_item("retries");

        assert_eq!(release.items.get("timeout"), Some(&"30".to_string()));
        assert_eq!(release.items.get("retries"), Some(&"3".to_string()));
        assert!(!release.is_abandoned);
    }

    #[test]
    fn fingerprint_is_stable_for_equal_item_sets() {
        let instance = instance_with(&[("a", "1"), ("b", "2")]);
        let r1 = Release::snapshot(&instance, "tester", None, None);
        let r2 = Release::snapshot(&instance, "tester", None, None);

        assert_ne!(r1.id, r2.id);
        assert_eq!(r1.fingerprint, r2.fingerprint);
    }

    #[test]
    fn fingerprint_changes_when_items_change() {
        let mut instance = instance_with(&[("a", "1")]);
        let before = Release::snapshot(&instance, "tester", None, None);
        instance.set_item("a", "2", "tester");
        let after = Release::snapshot(&instance, "tester", None, None);

        assert_ne!(before.fingerprint, after.fingerprint);
    }
}
