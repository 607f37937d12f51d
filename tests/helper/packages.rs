//! Fake package store test utilities

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use nuget_tools::tools::DirectToolsFactory;
use nuget_tools::tools::error::PackageError;
use nuget_tools::tools::frameworks::StaticFrameworkList;
use nuget_tools::tools::package::{LoadedPackage, PackageLoader, PackageSource};
use nuget_tools::tools::release::{CORE_PACKAGE_ID, FRAMEWORKS_PACKAGE_ID, VERSIONING_PACKAGE_ID};

use super::fake_release;

/// Package store serving fake releases, counting every load.
///
/// Loads of a held version wait until the version is released.
#[derive(Default)]
pub struct FakeStore {
    versions: HashMap<String, Vec<String>>,
    loads: Mutex<HashMap<(String, String), usize>>,
    failures: AtomicUsize,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    stripped: Vec<String>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_versions(mut self, package_id: &str, versions: &[&str]) -> Self {
        self.versions
            .entry(package_id.to_string())
            .or_default()
            .extend(versions.iter().map(|v| v.to_string()));
        self
    }

    /// Releases shipped as the single legacy core package
    pub fn with_legacy(self, versions: &[&str]) -> Self {
        self.with_versions(CORE_PACKAGE_ID, versions)
    }

    /// Releases shipped as the modern versioning and frameworks packages
    pub fn with_modern(self, versions: &[&str]) -> Self {
        self.with_versions(VERSIONING_PACKAGE_ID, versions)
            .with_versions(FRAMEWORKS_PACKAGE_ID, versions)
    }

    /// Only one of the two modern packages is downloaded
    pub fn with_versioning_only(self, versions: &[&str]) -> Self {
        self.with_versions(VERSIONING_PACKAGE_ID, versions)
    }

    /// Every loaded package lacks `symbol`
    pub fn without_symbol(mut self, symbol: &str) -> Self {
        self.stripped.push(symbol.to_string());
        self
    }

    /// The next `count` loads fail
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Loads of `version` block until [`FakeStore::release`] is called
    pub fn hold(&self, version: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(version.to_string(), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, version: &str) {
        if let Some(gate) = self.gates.lock().unwrap().remove(version) {
            gate.close();
        }
    }

    pub fn load_count(&self, package_id: &str, version: &str) -> usize {
        self.loads
            .lock()
            .unwrap()
            .get(&(package_id.to_string(), version.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.loads.lock().unwrap().values().sum()
    }

    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl PackageSource for FakeStore {
    async fn downloaded_versions(&self, package_id: &str) -> Result<Vec<String>, PackageError> {
        Ok(self.versions.get(package_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl PackageLoader for FakeStore {
    async fn load_package(
        &self,
        package_id: &str,
        version: &str,
    ) -> Result<Arc<dyn LoadedPackage>, PackageError> {
        *self
            .loads
            .lock()
            .unwrap()
            .entry((package_id.to_string(), version.to_string()))
            .or_default() += 1;

        let gate = self.gates.lock().unwrap().get(version).cloned();
        if let Some(gate) = gate {
            // Closed on release
            let _ = gate.acquire().await;
        }

        if self.take_failure() {
            return Err(PackageError::Io("simulated download failure".to_string()));
        }

        let package = fake_release::package(package_id).ok_or_else(|| PackageError::NotFound {
            package_id: package_id.to_string(),
            version: version.to_string(),
        })?;
        let package = self
            .stripped
            .iter()
            .fold(package, |package, symbol| package.without(symbol));
        Ok(package.into_loaded())
    }
}

/// Factory over `store` with the built-in framework list
pub fn factory(store: &Arc<FakeStore>) -> DirectToolsFactory {
    DirectToolsFactory::new(
        store.clone(),
        store.clone(),
        Arc::new(StaticFrameworkList::default()),
    )
}

/// Factory over `store` with a custom framework list
pub fn factory_with_frameworks(store: &Arc<FakeStore>, frameworks: &[&str]) -> DirectToolsFactory {
    DirectToolsFactory::new(
        store.clone(),
        store.clone(),
        Arc::new(StaticFrameworkList::new(
            frameworks.iter().map(|f| f.to_string()).collect(),
        )),
    )
}

/// Store with one legacy and two modern releases
pub fn mixed_store() -> Arc<FakeStore> {
    Arc::new(
        FakeStore::new()
            .with_legacy(&["2.14.0", "2.8.6"])
            .with_modern(&["6.12.1", "3.5.0"]),
    )
}
