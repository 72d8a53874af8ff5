use crate::model::{NamespaceInstance, NamespaceKey};
use crate::store::traits::Store;
use anyhow::Result;

/// Load a small demo namespace so the release endpoints have something to
/// publish right after startup. Enabled with LOAD_SEED_DATA=true.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<()> {
    let key = NamespaceKey::new("sample-app", "DEV", "default", "application");
    if store.get_namespace(&key).await?.is_some() {
        return Ok(());
    }

    let mut instance = NamespaceInstance::new(&key);
    instance.set_item("timeout", "30", "seed");
    instance.set_item("retries", "3", "seed");
    instance.set_item("feature.dark-mode", "false", "seed");
    store.upsert_namespace(instance).await?;

    log::info!("seeded namespace {}", key);
    Ok(())
}
