use crate::model::NamespaceKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One configuration entry in a namespace's working set. Values are opaque
/// strings; the per-item metadata records who touched the entry last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub value: String,
    pub updated_by: String,
    pub updated_at: String, // ISO 8601 timestamp
}

/// The mutable working set of configuration items for one
/// (app, env, cluster, namespace). Created on first edit, never deleted;
/// releases supersede its published view but the instance itself lives on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceInstance {
    pub app_id: String,
    pub env: String,
    pub cluster_name: String,
    pub namespace_name: String,
    pub items: BTreeMap<String, ConfigItem>,
    pub created_at: String, // ISO 8601 timestamp
    pub updated_at: String,
}

impl NamespaceInstance {
    pub fn new(key: &NamespaceKey) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            app_id: key.app_id.clone(),
            env: key.env.clone(),
            cluster_name: key.cluster_name.clone(),
            namespace_name: key.namespace_name.clone(),
            items: BTreeMap::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn key(&self) -> NamespaceKey {
        NamespaceKey::new(
            &self.app_id,
            &self.env,
            &self.cluster_name,
            &self.namespace_name,
        )
    }

    pub fn set_item(&mut self, key: &str, value: &str, operator: &str) {
        let now = chrono::Utc::now().to_rfc3339();
        self.items.insert(
            key.to_string(),
            ConfigItem {
                value: value.to_string(),
                updated_by: operator.to_string(),
                updated_at: now.clone(),
            },
        );
        self.updated_at = now;
    }

    pub fn remove_item(&mut self, key: &str) -> bool {
        let removed = self.items.remove(key).is_some();
        if removed {
            self.updated_at = chrono::Utc::now().to_rfc3339();
        }
        removed
    }

    /// Plain key -> value view of the working set, in key order.
    pub fn item_values(&self) -> BTreeMap<String, String> {
        self.items
            .iter()
            .map(|(k, item)| (k.clone(), item.value.clone()))
            .collect()
    }
}
