//! Package retrieval collaborator: listing downloaded releases and opening
//! a release's native package so its exported symbols can be bound.

use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::tools::error::PackageError;

/// Address of a symbol exported by a loaded package.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SymbolAddress(*const c_void);

// The address is immutable code or data inside a library that outlives every
// adapter bound to it.
unsafe impl Send for SymbolAddress {}
unsafe impl Sync for SymbolAddress {}

impl SymbolAddress {
    /// Returns `None` for a null address.
    pub fn new(address: *const c_void) -> Option<Self> {
        if address.is_null() {
            None
        } else {
            Some(Self(address))
        }
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.0
    }
}

impl fmt::Debug for SymbolAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolAddress({:p})", self.0)
    }
}

/// The opened binaries of one package of one release.
///
/// Dropping the last reference may unload the code, so every adapter bound
/// against a package keeps an `Arc` to it.
pub trait LoadedPackage: Send + Sync {
    /// Id of the package these binaries came from (e.g. "NuGet.Versioning")
    fn package_id(&self) -> &str;

    /// Looks up an exported symbol by name
    fn symbol(&self, name: &str) -> Option<SymbolAddress>;
}

/// Lists releases that are available locally
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PackageSource: Send + Sync {
    /// Returns every downloaded version string of a package, in no particular order
    async fn downloaded_versions(&self, package_id: &str) -> Result<Vec<String>, PackageError>;
}

/// Fetches and opens the binaries of one package at one release
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PackageLoader: Send + Sync {
    async fn load_package(
        &self,
        package_id: &str,
        version: &str,
    ) -> Result<Arc<dyn LoadedPackage>, PackageError>;
}
