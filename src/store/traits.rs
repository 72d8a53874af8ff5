use crate::model::{GrayBranch, Id, NamespaceInstance, NamespaceKey, Release};
use anyhow::Result;

#[async_trait::async_trait]
pub trait NamespaceStore: Send + Sync {
    async fn get_namespace(&self, key: &NamespaceKey) -> Result<Option<NamespaceInstance>>;
    async fn upsert_namespace(&self, instance: NamespaceInstance) -> Result<()>;
}

#[async_trait::async_trait]
pub trait BranchStore: Send + Sync {
    async fn get_branch(
        &self,
        app_id: &str,
        env: &str,
        parent_cluster: &str,
        branch_name: &str,
    ) -> Result<Option<GrayBranch>>;
    async fn upsert_branch(&self, branch: GrayBranch) -> Result<()>;
}

#[async_trait::async_trait]
pub trait ReleaseStore: Send + Sync {
    /// Look up a release by id within an environment.
    async fn get_release(&self, env: &str, id: &Id) -> Result<Option<Release>>;

    /// Append a new release to the instance's history.
    async fn insert_release(&self, release: Release) -> Result<()>;

    /// Flip `is_abandoned` to true. Returns false when the release was
    /// already abandoned (or does not exist); the contents stay untouched.
    async fn set_abandoned(&self, env: &str, id: &Id) -> Result<bool>;

    /// Page of the instance's history, newest first, abandoned included.
    async fn list_releases(
        &self,
        key: &NamespaceKey,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Release>>;

    /// The newest non-abandoned release of the instance, i.e. the active one.
    async fn latest_active_release(&self, key: &NamespaceKey) -> Result<Option<Release>>;

    /// The newest non-abandoned release strictly older (by creation order)
    /// than the given release id, within the same namespace instance.
    async fn latest_active_before(&self, env: &str, id: &Id) -> Result<Option<Release>>;
}

pub trait Store: NamespaceStore + BranchStore + ReleaseStore + Send + Sync {}
