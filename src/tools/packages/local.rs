//! On-disk package store
//!
//! Layout: `<root>/<package id lowercase>/<version lowercase>/<library>`, where
//! the library file name is derived from the package id (`NuGet.Versioning`
//! becomes `libnuget_versioning.so` on Linux). Version directories may use any
//! spelling of the version, such as `2.8.6.0` for `2.8.6`.

use std::ffi::c_void;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use tracing::{debug, info};

use crate::tools::error::PackageError;
use crate::tools::package::{LoadedPackage, PackageLoader, PackageSource, SymbolAddress};
use crate::tools::release::ReleaseVersion;

/// Platform-specific library file name for a package id
pub fn library_file_name(package_id: &str) -> String {
    let stem = package_id.to_ascii_lowercase().replace('.', "_");
    if cfg!(target_os = "macos") {
        format!("lib{}.dylib", stem)
    } else if cfg!(target_os = "windows") {
        format!("{}.dll", stem)
    } else {
        format!("lib{}.so", stem)
    }
}

/// Package store over a local directory of already downloaded releases
#[derive(Debug, Clone)]
pub struct LocalPackageStore {
    root: PathBuf,
}

impl LocalPackageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one release of one package
    pub fn package_dir(&self, package_id: &str, version: &str) -> PathBuf {
        self.root
            .join(package_id.to_ascii_lowercase())
            .join(version.to_ascii_lowercase())
    }

    pub fn library_path(&self, package_id: &str, version: &str) -> PathBuf {
        self.package_dir(package_id, version)
            .join(library_file_name(package_id))
    }

    /// Library for a release, matching directories such as `2.8.6.0` or
    /// `04.09.02` whose normalized version equals `version`.
    async fn find_library(
        &self,
        package_id: &str,
        version: &str,
    ) -> Result<Option<PathBuf>, PackageError> {
        let exact = self.library_path(package_id, version);
        if tokio::fs::try_exists(&exact).await? {
            return Ok(Some(exact));
        }

        let Some(wanted) = ReleaseVersion::parse(version) else {
            return Ok(None);
        };
        let package_root = self.root.join(package_id.to_ascii_lowercase());
        let mut entries = match tokio::fs::read_dir(&package_root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file_name = library_file_name(package_id);
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let matches = ReleaseVersion::parse(&name.to_string_lossy())
                .is_some_and(|found| found == wanted);
            let library = entry.path().join(&file_name);
            if matches && tokio::fs::try_exists(&library).await? {
                debug!("Resolved {} {} to {:?}", package_id, version, entry.path());
                return Ok(Some(library));
            }
        }

        Ok(None)
    }
}

#[async_trait::async_trait]
impl PackageSource for LocalPackageStore {
    async fn downloaded_versions(&self, package_id: &str) -> Result<Vec<String>, PackageError> {
        let package_root = self.root.join(package_id.to_ascii_lowercase());
        let mut entries = match tokio::fs::read_dir(&package_root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No downloads for {} under {:?}", package_id, package_root);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let file_name = library_file_name(package_id);
        let mut versions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }

            let library = entry.path().join(&file_name);
            if !tokio::fs::try_exists(&library).await? {
                debug!("Skipping {:?}: {} is missing", entry.path(), file_name);
                continue;
            }

            versions.push(entry.file_name().to_string_lossy().into_owned());
        }

        Ok(versions)
    }
}

#[async_trait::async_trait]
impl PackageLoader for LocalPackageStore {
    async fn load_package(
        &self,
        package_id: &str,
        version: &str,
    ) -> Result<Arc<dyn LoadedPackage>, PackageError> {
        let Some(path) = self.find_library(package_id, version).await? else {
            return Err(PackageError::NotFound {
                package_id: package_id.to_string(),
                version: version.to_string(),
            });
        };

        let owned_id = package_id.to_string();
        let package = tokio::task::spawn_blocking(move || DylibPackage::open(owned_id, &path))
            .await
            .map_err(|e| PackageError::Io(e.to_string()))??;

        info!("Loaded {} {} from {:?}", package_id, version, package.path());
        Ok(Arc::new(package))
    }
}

/// A package opened as a native shared library.
///
/// Each release lives in its own directory and is opened with local symbol
/// visibility, so identically named exports of different releases never
/// resolve against each other.
pub struct DylibPackage {
    package_id: String,
    path: PathBuf,
    library: Library,
}

impl DylibPackage {
    pub fn open(package_id: String, path: &Path) -> Result<Self, PackageError> {
        // SAFETY: opening runs the library's initializers. Only releases placed
        // in the package store are opened.
        let library = unsafe { Library::new(path) }.map_err(|e| PackageError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            package_id,
            path: path.to_path_buf(),
            library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LoadedPackage for DylibPackage {
    fn package_id(&self) -> &str {
        &self.package_id
    }

    fn symbol(&self, name: &str) -> Option<SymbolAddress> {
        // SAFETY: the symbol is read as a plain address; callers give it a
        // type when binding.
        let symbol = unsafe { self.library.get::<*const c_void>(name.as_bytes()) }.ok()?;
        SymbolAddress::new(*symbol)
    }
}
