//! Isolation loader: opens a release's packages and binds its adapters

use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

use crate::tools::adapters::{FrameworkApi, VersionApi, VersionRangeApi};
use crate::tools::error::LoadError;
use crate::tools::package::{LoadedPackage, PackageLoader};
use crate::tools::release::{
    CORE_PACKAGE_ID, Epoch, FRAMEWORKS_PACKAGE_ID, Release, VERSIONING_PACKAGE_ID,
};
use crate::tools::single_flight::{SingleFlight, SlotState};

/// Loaded binaries of one release with adapters bound against them.
///
/// Never unloaded while the loader that created it is alive.
pub struct IsolationContext {
    release: Release,
    packages: Vec<Arc<dyn LoadedPackage>>,
    version: Arc<VersionApi>,
    version_range: Arc<VersionRangeApi>,
    framework: Arc<FrameworkApi>,
}

impl IsolationContext {
    /// Binds every role against the packages that carry it
    pub fn bind(
        release: Release,
        version_package: Arc<dyn LoadedPackage>,
        framework_package: Arc<dyn LoadedPackage>,
    ) -> Result<Self, LoadError> {
        let version = Arc::new(VersionApi::bind(&release, &version_package)?);
        let version_range = Arc::new(VersionRangeApi::bind(&release, &version_package)?);
        let framework = Arc::new(FrameworkApi::bind(&release, &framework_package)?);

        let mut packages = vec![version_package];
        if !Arc::ptr_eq(&packages[0], &framework_package) {
            packages.push(framework_package);
        }

        Ok(Self {
            release,
            packages,
            version,
            version_range,
            framework,
        })
    }

    pub fn release(&self) -> &Release {
        &self.release
    }

    /// Package ids opened for this release, in load order
    pub fn package_ids(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.package_id()).collect()
    }

    pub fn version(&self) -> &Arc<VersionApi> {
        &self.version
    }

    pub fn version_range(&self) -> &Arc<VersionRangeApi> {
        &self.version_range
    }

    pub fn framework(&self) -> &Arc<FrameworkApi> {
        &self.framework
    }
}

impl fmt::Debug for IsolationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolationContext")
            .field("release", &self.release.as_str())
            .field("packages", &self.package_ids())
            .finish()
    }
}

/// Creates isolation contexts, at most once per release
pub struct IsolationLoader {
    loader: Arc<dyn PackageLoader>,
    contexts: SingleFlight<Release, IsolationContext>,
}

impl IsolationLoader {
    pub fn new(loader: Arc<dyn PackageLoader>) -> Self {
        Self {
            loader,
            contexts: SingleFlight::new(),
        }
    }

    pub async fn load(&self, release: &Release) -> Result<Arc<IsolationContext>, LoadError> {
        let loader = Arc::clone(&self.loader);
        let owned = release.clone();

        self.contexts
            .get_or_create(release.clone(), move || async move {
                load_context(loader.as_ref(), owned.clone())
                    .await
                    .inspect_err(|e| error!("Failed to load NuGet {}: {}", owned, e))
            })
            .await
    }

    pub fn state(&self, release: &Release) -> SlotState {
        self.contexts.state(release)
    }
}

async fn load_context(
    loader: &dyn PackageLoader,
    release: Release,
) -> Result<IsolationContext, LoadError> {
    info!("Loading NuGet {} ({})", release, release.epoch().as_str());
    let version = release.as_str().to_string();

    let context = match release.epoch() {
        Epoch::Legacy => {
            let core = loader.load_package(CORE_PACKAGE_ID, &version).await?;
            IsolationContext::bind(release, Arc::clone(&core), core)?
        }
        Epoch::Modern => {
            // Versioning first: the frameworks package depends on it
            let versioning = loader.load_package(VERSIONING_PACKAGE_ID, &version).await?;
            let frameworks = loader.load_package(FRAMEWORKS_PACKAGE_ID, &version).await?;
            IsolationContext::bind(release, versioning, frameworks)?
        }
    };

    info!(
        "Loaded NuGet {} from {:?}",
        context.release(),
        context.package_ids()
    );
    Ok(context)
}
