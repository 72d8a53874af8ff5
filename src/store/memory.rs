use crate::model::{GrayBranch, Id, NamespaceInstance, NamespaceKey, Release};
use crate::store::traits::{BranchStore, NamespaceStore, ReleaseStore, Store};
use anyhow::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-process store used by tests and local development. Releases live in an
/// append-only vector, so insertion order doubles as creation order and
/// resolves creation-time ties deterministically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    namespaces: RwLock<HashMap<NamespaceKey, NamespaceInstance>>,
    branches: RwLock<HashMap<(String, String, String, String), GrayBranch>>,
    releases: RwLock<Vec<Release>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_instance(release: &Release, key: &NamespaceKey) -> bool {
    release.app_id == key.app_id
        && release.env == key.env
        && release.cluster_name == key.cluster_name
        && release.namespace_name == key.namespace_name
}

#[async_trait::async_trait]
impl NamespaceStore for MemoryStore {
    async fn get_namespace(&self, key: &NamespaceKey) -> Result<Option<NamespaceInstance>> {
        Ok(self.namespaces.read().get(key).cloned())
    }

    async fn upsert_namespace(&self, instance: NamespaceInstance) -> Result<()> {
        self.namespaces.write().insert(instance.key(), instance);
        Ok(())
    }
}

#[async_trait::async_trait]
impl BranchStore for MemoryStore {
    async fn get_branch(
        &self,
        app_id: &str,
        env: &str,
        parent_cluster: &str,
        branch_name: &str,
    ) -> Result<Option<GrayBranch>> {
        let key = (
            app_id.to_string(),
            env.to_string(),
            parent_cluster.to_string(),
            branch_name.to_string(),
        );
        Ok(self.branches.read().get(&key).cloned())
    }

    async fn upsert_branch(&self, branch: GrayBranch) -> Result<()> {
        let key = (
            branch.app_id.clone(),
            branch.env.clone(),
            branch.parent_cluster.clone(),
            branch.branch_name.clone(),
        );
        self.branches.write().insert(key, branch);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReleaseStore for MemoryStore {
    async fn get_release(&self, env: &str, id: &Id) -> Result<Option<Release>> {
        Ok(self
            .releases
            .read()
            .iter()
            .find(|r| r.env == env && &r.id == id)
            .cloned())
    }

    async fn insert_release(&self, release: Release) -> Result<()> {
        self.releases.write().push(release);
        Ok(())
    }

    async fn set_abandoned(&self, env: &str, id: &Id) -> Result<bool> {
        let mut releases = self.releases.write();
        match releases
            .iter_mut()
            .find(|r| r.env == env && &r.id == id && !r.is_abandoned)
        {
            Some(release) => {
                release.is_abandoned = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_releases(
        &self,
        key: &NamespaceKey,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Release>> {
        Ok(self
            .releases
            .read()
            .iter()
            .rev()
            .filter(|r| matches_instance(r, key))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn latest_active_release(&self, key: &NamespaceKey) -> Result<Option<Release>> {
        Ok(self
            .releases
            .read()
            .iter()
            .rev()
            .find(|r| matches_instance(r, key) && !r.is_abandoned)
            .cloned())
    }

    async fn latest_active_before(&self, env: &str, id: &Id) -> Result<Option<Release>> {
        let releases = self.releases.read();
        let Some(position) = releases.iter().position(|r| r.env == env && &r.id == id) else {
            return Ok(None);
        };
        let target = releases[position].clone();
        Ok(releases[..position]
            .iter()
            .rev()
            .find(|r| {
                r.app_id == target.app_id
                    && r.env == target.env
                    && r.cluster_name == target.cluster_name
                    && r.namespace_name == target.namespace_name
                    && !r.is_abandoned
            })
            .cloned())
    }
}

impl Store for MemoryStore {}

#[cfg(test)]
mod tests {
    use super::*;

    fn release_for(key: &NamespaceKey) -> Release {
        let instance = NamespaceInstance::new(key);
        Release::snapshot(&instance, "tester", None, None)
    }

    #[tokio::test]
    async fn latest_active_skips_abandoned_releases() {
        let store = MemoryStore::new();
        let key = NamespaceKey::new("demo", "DEV", "default", "application");

        let r1 = release_for(&key);
        let r2 = release_for(&key);
        store.insert_release(r1.clone()).await.unwrap();
        store.insert_release(r2.clone()).await.unwrap();

        assert_eq!(
            store.latest_active_release(&key).await.unwrap().unwrap().id,
            r2.id
        );

        assert!(store.set_abandoned("DEV", &r2.id).await.unwrap());
        assert_eq!(
            store.latest_active_release(&key).await.unwrap().unwrap().id,
            r1.id
        );
        // Second abandon attempt reports a conflict to the caller.
        assert!(!store.set_abandoned("DEV", &r2.id).await.unwrap());
    }

    #[tokio::test]
    async fn latest_active_before_respects_instance_and_order() {
        let store = MemoryStore::new();
        let key = NamespaceKey::new("demo", "DEV", "default", "application");
        let other = NamespaceKey::new("demo", "DEV", "eu-west", "application");

        let r1 = release_for(&key);
        let noise = release_for(&other);
        let r2 = release_for(&key);
        store.insert_release(r1.clone()).await.unwrap();
        store.insert_release(noise).await.unwrap();
        store.insert_release(r2.clone()).await.unwrap();

        let before = store
            .latest_active_before("DEV", &r2.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before.id, r1.id);

        assert!(store
            .latest_active_before("DEV", &r1.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn list_releases_pages_newest_first() {
        let store = MemoryStore::new();
        let key = NamespaceKey::new("demo", "DEV", "default", "application");

        let r1 = release_for(&key);
        let r2 = release_for(&key);
        let r3 = release_for(&key);
        for r in [&r1, &r2, &r3] {
            store.insert_release(r.clone()).await.unwrap();
        }

        let first_page = store.list_releases(&key, 0, 2).await.unwrap();
        assert_eq!(
            first_page.iter().map(|r| &r.id).collect::<Vec<_>>(),
            vec![&r3.id, &r2.id]
        );
        let second_page = store.list_releases(&key, 2, 2).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].id, r1.id);
    }
}
