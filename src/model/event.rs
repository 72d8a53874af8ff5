use crate::model::{Id, NamespaceKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishKind {
    Normal,
    Gray,
    Rollback,
}

/// Notification record handed to the emitter after a successful state
/// transition. Built in one step and never persisted: exactly one per
/// transition, zero on failure.
///
/// For gray releases the cluster is the *parent* cluster (the audience the
/// branch is scoped to) and `branch_name` carries the branch identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigPublishEvent {
    pub app_id: String,
    pub env: String,
    pub cluster_name: String,
    pub namespace_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    /// The release now active; absent when a rollback leaves the namespace
    /// unpublished.
    pub release_id: Option<Id>,
    /// The release that was active before this transition, if any.
    pub previous_release_id: Option<Id>,
    pub kind: PublishKind,
}

impl ConfigPublishEvent {
    pub fn normal(key: &NamespaceKey, release_id: Id, previous_release_id: Option<Id>) -> Self {
        Self {
            app_id: key.app_id.clone(),
            env: key.env.clone(),
            cluster_name: key.cluster_name.clone(),
            namespace_name: key.namespace_name.clone(),
            branch_name: None,
            release_id: Some(release_id),
            previous_release_id,
            kind: PublishKind::Normal,
        }
    }

    pub fn gray(
        parent_key: &NamespaceKey,
        branch_name: &str,
        release_id: Id,
        previous_release_id: Option<Id>,
    ) -> Self {
        Self {
            app_id: parent_key.app_id.clone(),
            env: parent_key.env.clone(),
            cluster_name: parent_key.cluster_name.clone(),
            namespace_name: parent_key.namespace_name.clone(),
            branch_name: Some(branch_name.to_string()),
            release_id: Some(release_id),
            previous_release_id,
            kind: PublishKind::Gray,
        }
    }

    pub fn rollback(key: &NamespaceKey, restored_id: Option<Id>, rolled_back_id: Id) -> Self {
        Self {
            app_id: key.app_id.clone(),
            env: key.env.clone(),
            cluster_name: key.cluster_name.clone(),
            namespace_name: key.namespace_name.clone(),
            branch_name: None,
            release_id: restored_id,
            previous_release_id: Some(rolled_back_id),
            kind: PublishKind::Rollback,
        }
    }
}
