use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Id = String;

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}

/// Coordinates of one namespace instance: the unit every release, lock and
/// notification is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceKey {
    pub app_id: String,
    pub env: String,
    pub cluster_name: String,
    pub namespace_name: String,
}

impl NamespaceKey {
    pub fn new(app_id: &str, env: &str, cluster_name: &str, namespace_name: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            env: env.to_string(),
            cluster_name: cluster_name.to_string(),
            namespace_name: namespace_name.to_string(),
        }
    }

    /// Same coordinates with a different effective cluster. Gray branches are
    /// addressed as the parent namespace with the branch name as cluster.
    pub fn with_cluster(&self, cluster_name: &str) -> Self {
        Self {
            app_id: self.app_id.clone(),
            env: self.env.clone(),
            cluster_name: cluster_name.to_string(),
            namespace_name: self.namespace_name.clone(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.app_id.is_empty()
            && !self.env.is_empty()
            && !self.cluster_name.is_empty()
            && !self.namespace_name.is_empty()
    }

    /// Stable string form, used as the mutual-exclusion key for publish and
    /// rollback on this instance.
    pub fn lock_key(&self) -> String {
        format!(
            "{}+{}+{}+{}",
            self.app_id, self.env, self.cluster_name, self.namespace_name
        )
    }
}

impl std::fmt::Display for NamespaceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.app_id, self.env, self.cluster_name, self.namespace_name
        )
    }
}
