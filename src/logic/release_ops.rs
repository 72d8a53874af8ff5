use crate::error::{OrchestratorError, OrchestratorResult};
use crate::logic::branch_resolve::BranchResolver;
use crate::logic::locks::NamespaceLocks;
use crate::model::{
    ConfigPublishEvent, Id, NamespaceKey, NewRelease, Release, ReleaseCompareResult,
};
use crate::notify::NotificationEmitter;
use crate::store::traits::Store;
use std::collections::HashSet;
use std::sync::Arc;

/// Coordinates the release state machine for every namespace instance:
/// normal and gray publishes, rollback, comparison and history queries.
///
/// Per instance the active-release pointer moves
/// `Unpublished -> Published(r) -> Published(r')` on publish and back to the
/// strict predecessor (or `Unpublished`) on rollback. Each state-changing
/// operation serializes per instance, snapshots before persisting, and hands
/// exactly one event to the emitter after its lock is released.
pub struct ReleaseOrchestrator<S: Store> {
    store: Arc<S>,
    emitter: Arc<dyn NotificationEmitter>,
    locks: NamespaceLocks,
    /// Environments (uppercased) where emergency publish is allowed.
    emergency_publish_envs: HashSet<String>,
}

impl<S: Store> ReleaseOrchestrator<S> {
    pub fn new(
        store: Arc<S>,
        emitter: Arc<dyn NotificationEmitter>,
        emergency_publish_envs: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            store,
            emitter,
            locks: NamespaceLocks::new(),
            emergency_publish_envs: emergency_publish_envs
                .into_iter()
                .map(|env| env.to_uppercase())
                .collect(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn check_identity(key: &NamespaceKey) -> OrchestratorResult<()> {
        if !key.is_complete() {
            return Err(OrchestratorError::Validation(format!(
                "Incomplete namespace coordinates: '{}'",
                key
            )));
        }
        Ok(())
    }

    fn check_emergency_policy(&self, env: &str, is_emergency: bool) -> OrchestratorResult<()> {
        if is_emergency && !self.emergency_publish_envs.contains(&env.to_uppercase()) {
            return Err(OrchestratorError::Policy(format!(
                "Env: {} is not supported emergency publish now",
                env
            )));
        }
        Ok(())
    }

    /// Publish the namespace's current items as a new release and make it
    /// active. The prior active release stays in history, not abandoned.
    pub async fn publish(
        &self,
        key: &NamespaceKey,
        request: NewRelease,
    ) -> OrchestratorResult<Release> {
        Self::check_identity(key)?;
        self.check_emergency_policy(&key.env, request.is_emergency_publish)?;

        let lock = self.locks.lock_for(&key.lock_key());
        let guard = lock.lock().await;

        let instance = BranchResolver::resolve(self.store.as_ref(), key, None, &request.released_by)
            .await?;
        let previous = self.store.latest_active_release(key).await?;
        let release = Release::snapshot(
            &instance,
            &request.released_by,
            request.title.clone(),
            request.comment.clone(),
        );
        self.store.insert_release(release.clone()).await?;

        drop(guard);

        log::info!(
            "published release {} for {} by {}",
            release.id,
            key,
            request.released_by
        );
        self.emitter.emit(ConfigPublishEvent::normal(
            key,
            release.id.clone(),
            previous.map(|r| r.id),
        ));

        Ok(release)
    }

    /// Publish a gray release on a branch of the given cluster. The snapshot
    /// layers the branch's items over the parent's at call time and lands in
    /// the branch's own history; the parent's history is untouched. The event
    /// targets the parent cluster's audience and names the branch.
    pub async fn publish_gray(
        &self,
        parent_key: &NamespaceKey,
        branch_name: &str,
        request: NewRelease,
    ) -> OrchestratorResult<Release> {
        Self::check_identity(parent_key)?;
        if branch_name.is_empty() {
            return Err(OrchestratorError::Validation(
                "Branch name must not be empty".to_string(),
            ));
        }
        self.check_emergency_policy(&parent_key.env, request.is_emergency_publish)?;

        let branch_key = parent_key.with_cluster(branch_name);
        let lock = self.locks.lock_for(&branch_key.lock_key());
        let guard = lock.lock().await;

        let parent = self
            .store
            .get_namespace(parent_key)
            .await?
            .ok_or_else(|| {
                OrchestratorError::NotFound(format!("Namespace '{}' not found", parent_key))
            })?;
        let branch_instance = BranchResolver::resolve(
            self.store.as_ref(),
            parent_key,
            Some(branch_name),
            &request.released_by,
        )
        .await?;

        let effective = BranchResolver::overlay(&parent, &branch_instance);
        let previous = self.store.latest_active_release(&branch_key).await?;
        let release = Release::snapshot(
            &effective,
            &request.released_by,
            request.title.clone(),
            request.comment.clone(),
        );
        self.store.insert_release(release.clone()).await?;

        drop(guard);

        log::info!(
            "published gray release {} for {} branch {} by {}",
            release.id,
            parent_key,
            branch_name,
            request.released_by
        );
        self.emitter.emit(ConfigPublishEvent::gray(
            parent_key,
            branch_name,
            release.id.clone(),
            previous.map(|r| r.id),
        ));

        Ok(release)
    }

    /// Abandon the current active release and restore the strictly preceding
    /// non-abandoned release as active; with no predecessor the namespace
    /// reverts to unpublished. The target must be the instance's active
    /// release: an already-abandoned or mid-history target is a conflict,
    /// and a failed rollback emits nothing.
    pub async fn rollback(&self, env: &str, release_id: &Id) -> OrchestratorResult<()> {
        let target = self
            .store
            .get_release(env, release_id)
            .await?
            .ok_or_else(|| {
                OrchestratorError::NotFound(format!("Release '{}' not found in env {}", release_id, env))
            })?;
        if target.is_abandoned {
            return Err(OrchestratorError::Conflict(format!(
                "Release '{}' is already abandoned",
                release_id
            )));
        }

        let key = NamespaceKey::new(
            &target.app_id,
            &target.env,
            &target.cluster_name,
            &target.namespace_name,
        );
        let lock = self.locks.lock_for(&key.lock_key());
        let guard = lock.lock().await;

        // Checked under the lock: abandoning a non-active release would leave
        // the active pointer where it is while the event claimed a transition.
        let active = self.store.latest_active_release(&key).await?;
        if active.map(|r| r.id) != Some(release_id.clone()) {
            return Err(OrchestratorError::Conflict(format!(
                "Release '{}' is not the current active release",
                release_id
            )));
        }
        // The pre-checks partly ran unlocked; the store only abandons a
        // release once, so a racing rollback surfaces here as a conflict.
        if !self.store.set_abandoned(env, release_id).await? {
            return Err(OrchestratorError::Conflict(format!(
                "Release '{}' is already abandoned",
                release_id
            )));
        }
        let restored = self.store.latest_active_before(env, release_id).await?;

        drop(guard);

        log::info!(
            "rolled back release {} for {}, restored {:?}",
            release_id,
            key,
            restored.as_ref().map(|r| r.id.as_str())
        );
        self.emitter.emit(ConfigPublishEvent::rollback(
            &key,
            restored.map(|r| r.id),
            release_id.clone(),
        ));

        Ok(())
    }

    /// Pure three-way comparison of two releases' item sets.
    pub async fn compare_releases(
        &self,
        env: &str,
        base_release_id: &Id,
        to_compare_release_id: &Id,
    ) -> OrchestratorResult<ReleaseCompareResult> {
        let base = self.find_release(env, base_release_id).await?;
        let to_compare = self.find_release(env, to_compare_release_id).await?;
        Ok(ReleaseCompareResult::between(&base.items, &to_compare.items))
    }

    pub async fn find_release(&self, env: &str, release_id: &Id) -> OrchestratorResult<Release> {
        self.store
            .get_release(env, release_id)
            .await?
            .ok_or_else(|| {
                OrchestratorError::NotFound(format!("Release '{}' not found in env {}", release_id, env))
            })
    }

    /// Full history of the instance, newest first, abandoned included.
    pub async fn find_all_releases(
        &self,
        key: &NamespaceKey,
        page: i64,
        size: i64,
    ) -> OrchestratorResult<Vec<Release>> {
        Self::check_identity(key)?;
        let offset = Self::check_paging(page, size)?;
        let releases = self
            .store
            .list_releases(key, offset, size as usize)
            .await?;
        Ok(releases)
    }

    /// The instance's current active release, paginated for interface
    /// symmetry: with exact coordinates there is at most one entry.
    pub async fn find_active_releases(
        &self,
        key: &NamespaceKey,
        page: i64,
        size: i64,
    ) -> OrchestratorResult<Vec<Release>> {
        Self::check_identity(key)?;
        let offset = Self::check_paging(page, size)?;
        let active: Vec<Release> = self
            .store
            .latest_active_release(key)
            .await?
            .into_iter()
            .collect();
        Ok(active
            .into_iter()
            .skip(offset)
            .take(size as usize)
            .collect())
    }

    /// Validate the paging window and return the element offset.
    fn check_paging(page: i64, size: i64) -> OrchestratorResult<usize> {
        if page < 0 {
            return Err(OrchestratorError::Validation(format!(
                "page should be positive or 0, got {}",
                page
            )));
        }
        if size <= 0 {
            return Err(OrchestratorError::Validation(format!(
                "size should be positive, got {}",
                size
            )));
        }
        let offset = page.checked_mul(size).ok_or_else(|| {
            OrchestratorError::Validation(format!(
                "paging window out of range: page {} size {}",
                page, size
            ))
        })?;
        Ok(offset as usize)
    }
}
