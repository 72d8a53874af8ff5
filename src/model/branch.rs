use crate::model::NamespaceKey;
use serde::{Deserialize, Serialize};

/// A gray branch: a partial-audience variant of a cluster's namespace,
/// identified by (app, env, parent cluster, branch name). Its working items
/// live in a backing namespace instance addressed with the branch name as the
/// effective cluster; they override parent items per key at publish time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrayBranch {
    pub app_id: String,
    pub env: String,
    pub parent_cluster: String,
    pub branch_name: String,
    pub created_at: String, // ISO 8601 timestamp
    pub created_by: String,
}

impl GrayBranch {
    pub fn new(parent: &NamespaceKey, branch_name: &str, created_by: &str) -> Self {
        Self {
            app_id: parent.app_id.clone(),
            env: parent.env.clone(),
            parent_cluster: parent.cluster_name.clone(),
            branch_name: branch_name.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            created_by: created_by.to_string(),
        }
    }

    /// Key of the backing namespace instance that holds the branch's items.
    pub fn effective_key(&self, namespace_name: &str) -> NamespaceKey {
        NamespaceKey::new(&self.app_id, &self.env, &self.branch_name, namespace_name)
    }
}
