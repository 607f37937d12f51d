//! Entry point: resolve a version string to a release and hand out the
//! memoized services for it

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tracing::{debug, info};

use crate::tools::catalog::ReleaseCatalog;
use crate::tools::error::LoadError;
use crate::tools::frameworks::FrameworkList;
use crate::tools::loader::IsolationLoader;
use crate::tools::package::{PackageLoader, PackageSource};
use crate::tools::precedence::FrameworkPrecedenceService;
use crate::tools::release::Release;
use crate::tools::service::ToolsService;
use crate::tools::single_flight::{SingleFlight, SlotState};

/// Hands out per-release services.
///
/// Every lookup answers `Ok(None)` when the version string is not a known release.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ToolsFactory: Send + Sync {
    /// Normalized release versions, newest first
    async fn available_versions(&self) -> Result<Vec<String>, LoadError>;

    async fn latest_version(&self) -> Result<Option<String>, LoadError>;

    async fn tools_service(&self, version: &str) -> Result<Option<Arc<ToolsService>>, LoadError>;

    async fn precedence_service(
        &self,
        version: &str,
    ) -> Result<Option<Arc<FrameworkPrecedenceService>>, LoadError>;
}

/// Loads releases in-process from a package source.
///
/// The catalog is built on first use. Isolation contexts and services are
/// constructed at most once per release; failures are not remembered.
pub struct DirectToolsFactory {
    source: Arc<dyn PackageSource>,
    loader: Arc<IsolationLoader>,
    framework_list: Arc<dyn FrameworkList>,
    catalog: SingleFlight<(), ReleaseCatalog>,
    tools: SingleFlight<Release, ToolsService>,
    precedence: SingleFlight<Release, FrameworkPrecedenceService>,
}

impl DirectToolsFactory {
    pub fn new(
        source: Arc<dyn PackageSource>,
        loader: Arc<dyn PackageLoader>,
        framework_list: Arc<dyn FrameworkList>,
    ) -> Self {
        Self {
            source,
            loader: Arc::new(IsolationLoader::new(loader)),
            framework_list,
            catalog: SingleFlight::new(),
            tools: SingleFlight::new(),
            precedence: SingleFlight::new(),
        }
    }

    pub async fn catalog(&self) -> Result<Arc<ReleaseCatalog>, LoadError> {
        let source = Arc::clone(&self.source);

        self.catalog
            .get_or_create((), move || async move {
                let catalog = ReleaseCatalog::build(source.as_ref()).await?;
                info!("Release catalog built with {} releases", catalog.len());
                Ok(catalog)
            })
            .await
    }

    async fn resolve(&self, version: &str) -> Result<Option<Release>, LoadError> {
        let catalog = self.catalog().await?;
        let release = catalog.resolve(version).cloned();
        if release.is_none() {
            debug!("Version {} is not in the catalog", version);
        }
        Ok(release)
    }

    /// State of the tools service of `release`
    pub fn tools_state(&self, release: &Release) -> SlotState {
        self.tools.state(release)
    }

    /// State of the precedence service of `release`
    pub fn precedence_state(&self, release: &Release) -> SlotState {
        self.precedence.state(release)
    }

    /// State of the isolation context shared by both services of `release`
    pub fn context_state(&self, release: &Release) -> SlotState {
        self.loader.state(release)
    }
}

#[async_trait::async_trait]
impl ToolsFactory for DirectToolsFactory {
    async fn available_versions(&self) -> Result<Vec<String>, LoadError> {
        Ok(self.catalog().await?.version_strings())
    }

    async fn latest_version(&self) -> Result<Option<String>, LoadError> {
        let catalog = self.catalog().await?;
        Ok(catalog.latest().map(|release| release.as_str().to_string()))
    }

    async fn tools_service(&self, version: &str) -> Result<Option<Arc<ToolsService>>, LoadError> {
        let Some(release) = self.resolve(version).await? else {
            return Ok(None);
        };

        let loader = Arc::clone(&self.loader);
        let key = release.clone();
        let service = self
            .tools
            .get_or_create(key, move || async move {
                let context = loader.load(&release).await?;
                Ok(ToolsService::new(context))
            })
            .await?;

        Ok(Some(service))
    }

    async fn precedence_service(
        &self,
        version: &str,
    ) -> Result<Option<Arc<FrameworkPrecedenceService>>, LoadError> {
        let Some(release) = self.resolve(version).await? else {
            return Ok(None);
        };

        let loader = Arc::clone(&self.loader);
        let framework_list = Arc::clone(&self.framework_list);
        let key = release.clone();
        let service = self
            .precedence
            .get_or_create(key, move || async move {
                let context = loader.load(&release).await?;
                Ok(FrameworkPrecedenceService::new(context, framework_list))
            })
            .await?;

        Ok(Some(service))
    }
}
