//! Named mutexes.
//!
//! Terraform core parallelizes across resource instances, so sibling
//! instances that mutate the same parent object (firewall rule collections,
//! domain service replica sets) must serialize themselves. `by_name` hands
//! out a guard from a process-wide registry keyed by resource type and
//! parent name.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, OnceLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

static REGISTRY: OnceLock<StdMutex<HashMap<String, Arc<Mutex<()>>>>> = OnceLock::new();

fn registry() -> &'static StdMutex<HashMap<String, Arc<Mutex<()>>>> {
    REGISTRY.get_or_init(|| StdMutex::new(HashMap::new()))
}

/// Lock `name` within the `resource_type` namespace. The guard releases on
/// drop; hold it across the whole read-modify-write of the parent.
pub async fn by_name(name: &str, resource_type: &str) -> OwnedMutexGuard<()> {
    let key = format!("{}.{}", resource_type, name);
    let mutex = {
        let mut map = registry().lock().unwrap_or_else(|e| e.into_inner());
        map.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    };
    mutex.lock_owned().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn same_name_serializes() {
        let guard = by_name("fw-1", "azureFirewalls").await;

        let contender = tokio::spawn(async { by_name("fw-1", "azureFirewalls").await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        timeout(Duration::from_secs(1), contender)
            .await
            .expect("lock was not released")
            .unwrap();
    }

    #[tokio::test]
    async fn different_names_do_not_contend() {
        let _guard = by_name("fw-2", "azureFirewalls").await;
        timeout(Duration::from_millis(100), by_name("fw-3", "azureFirewalls"))
            .await
            .expect("unrelated lock blocked");
    }

    #[tokio::test]
    async fn same_name_different_type_does_not_contend() {
        let _guard = by_name("shared", "azureFirewalls").await;
        timeout(
            Duration::from_millis(100),
            by_name("shared", "domainServices"),
        )
        .await
        .expect("namespaced lock blocked");
    }
}
