use crate::error::{OrchestratorError, OrchestratorResult};
use crate::model::{GrayBranch, NamespaceInstance, NamespaceKey};
use crate::store::traits::Store;

pub struct BranchResolver;

impl BranchResolver {
    /// Map (cluster, optional branch) to the namespace instance a release
    /// should snapshot. Without a branch this is the literal cluster's
    /// instance. With a branch, the branch's backing instance is looked up or
    /// lazily created on first gray publish; its items start empty and
    /// override the parent's per key at publish time. The parent instance is
    /// never mutated here.
    pub async fn resolve<S: Store>(
        store: &S,
        parent_key: &NamespaceKey,
        branch_name: Option<&str>,
        operator: &str,
    ) -> OrchestratorResult<NamespaceInstance> {
        let Some(branch_name) = branch_name else {
            return store
                .get_namespace(parent_key)
                .await?
                .ok_or_else(|| {
                    OrchestratorError::NotFound(format!("Namespace '{}' not found", parent_key))
                });
        };

        let branch = match store
            .get_branch(
                &parent_key.app_id,
                &parent_key.env,
                &parent_key.cluster_name,
                branch_name,
            )
            .await?
        {
            Some(branch) => branch,
            None => {
                let branch = GrayBranch::new(parent_key, branch_name, operator);
                store.upsert_branch(branch.clone()).await?;
                branch
            }
        };

        let backing_key = branch.effective_key(&parent_key.namespace_name);
        match store.get_namespace(&backing_key).await? {
            Some(instance) => Ok(instance),
            None => {
                let instance = NamespaceInstance::new(&backing_key);
                store.upsert_namespace(instance.clone()).await?;
                Ok(instance)
            }
        }
    }

    /// Ephemeral view of the branch layered over its parent: parent items
    /// first, branch items overriding per key. Carries the branch's own
    /// coordinates so a snapshot of it lands in the branch's history.
    pub fn overlay(parent: &NamespaceInstance, branch: &NamespaceInstance) -> NamespaceInstance {
        let mut effective = branch.clone();
        let mut items = parent.items.clone();
        for (key, item) in &branch.items {
            items.insert(key.clone(), item.clone());
        }
        effective.items = items;
        effective
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::traits::NamespaceStore;

    fn parent_key() -> NamespaceKey {
        NamespaceKey::new("demo", "DEV", "default", "application")
    }

    #[tokio::test]
    async fn resolve_without_branch_requires_existing_namespace() {
        let store = MemoryStore::new();
        let err = BranchResolver::resolve(&store, &parent_key(), None, "tester")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::NotFound(_)));

        store
            .upsert_namespace(NamespaceInstance::new(&parent_key()))
            .await
            .unwrap();
        let instance = BranchResolver::resolve(&store, &parent_key(), None, "tester")
            .await
            .unwrap();
        assert_eq!(instance.cluster_name, "default");
    }

    #[tokio::test]
    async fn resolve_lazily_creates_branch_storage() {
        let store = MemoryStore::new();
        let mut parent = NamespaceInstance::new(&parent_key());
        parent.set_item("timeout", "30", "tester");
        store.upsert_namespace(parent.clone()).await.unwrap();

        let branch_instance =
            BranchResolver::resolve(&store, &parent_key(), Some("gray1"), "tester")
                .await
                .unwrap();

        // Backing instance uses the branch name as its effective cluster and
        // starts with an empty working set.
        assert_eq!(branch_instance.cluster_name, "gray1");
        assert!(branch_instance.items.is_empty());

        // Parent stays untouched.
        let parent_after = store.get_namespace(&parent_key()).await.unwrap().unwrap();
        assert_eq!(parent_after, parent);

        // Second resolve reuses the same storage.
        let again = BranchResolver::resolve(&store, &parent_key(), Some("gray1"), "tester")
            .await
            .unwrap();
        assert_eq!(again.key(), branch_instance.key());
    }

    #[test]
    fn overlay_prefers_branch_items() {
        let mut parent = NamespaceInstance::new(&parent_key());
        parent.set_item("timeout", "30", "tester");
        parent.set_item("retries", "3", "tester");

        let mut branch = NamespaceInstance::new(&parent_key().with_cluster("gray1"));
        branch.set_item("timeout", "60", "tester");

        let effective = BranchResolver::overlay(&parent, &branch);
        assert_eq!(effective.cluster_name, "gray1");
        assert_eq!(effective.items["timeout"].value, "60");
        assert_eq!(effective.items["retries"].value, "3");
    }
}
