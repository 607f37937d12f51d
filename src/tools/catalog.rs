//! Release catalog: which releases exist locally and which epoch each belongs to

use std::collections::HashMap;

use tracing::{info, warn};

use crate::tools::error::PackageError;
use crate::tools::package::PackageSource;
use crate::tools::release::{Epoch, Release, ReleaseVersion};

/// Read-only set of releases, keyed by lowercase normalized version string
#[derive(Debug, Clone, Default)]
pub struct ReleaseCatalog {
    releases: HashMap<String, Release>,
}

impl ReleaseCatalog {
    /// Build the catalog from the downloaded versions of each epoch's packages.
    ///
    /// Legacy releases are inserted first, so a version string that somehow
    /// appears under both epochs ends up modern.
    pub async fn build(source: &dyn PackageSource) -> Result<Self, PackageError> {
        let mut releases: HashMap<String, Release> = HashMap::new();

        for epoch in [Epoch::Legacy, Epoch::Modern] {
            let versions = aligned_versions(source, epoch).await?;
            info!("Found {} {} releases", versions.len(), epoch.as_str());

            for version in versions {
                let release = Release::new(version, epoch);
                if let Some(previous) = releases.insert(release.key(), release.clone()) {
                    warn!(
                        "Release {} is available as both {} and {}; using {}",
                        release,
                        previous.epoch().as_str(),
                        epoch.as_str(),
                        epoch.as_str()
                    );
                }
            }
        }

        Ok(Self { releases })
    }

    pub fn from_releases(releases: impl IntoIterator<Item = Release>) -> Self {
        Self {
            releases: releases
                .into_iter()
                .map(|release| (release.key(), release))
                .collect(),
        }
    }

    /// All releases, newest first
    pub fn releases(&self) -> Vec<&Release> {
        let mut releases: Vec<&Release> = self.releases.values().collect();
        releases.sort_by(|a, b| b.version().cmp(a.version()));
        releases
    }

    /// Normalized version strings, newest first
    pub fn version_strings(&self) -> Vec<String> {
        self.releases()
            .into_iter()
            .map(|release| release.as_str().to_string())
            .collect()
    }

    /// Case-insensitive exact match on the normalized version string
    pub fn resolve(&self, version: &str) -> Option<&Release> {
        self.releases.get(&version.to_ascii_lowercase())
    }

    /// Semantically greatest release regardless of epoch
    pub fn latest(&self) -> Option<&Release> {
        self.releases.values().max_by(|a, b| a.version().cmp(b.version()))
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

/// Versions downloaded for every package id of an epoch
async fn aligned_versions(
    source: &dyn PackageSource,
    epoch: Epoch,
) -> Result<Vec<ReleaseVersion>, PackageError> {
    let mut aligned: Option<HashMap<String, ReleaseVersion>> = None;

    for package_id in epoch.package_ids() {
        let versions: HashMap<String, ReleaseVersion> = source
            .downloaded_versions(package_id)
            .await?
            .into_iter()
            .filter_map(|raw| match ReleaseVersion::parse(&raw) {
                Some(version) => Some((version.to_normalized_string().to_ascii_lowercase(), version)),
                None => {
                    warn!("Skipping {} {}: not a valid version", package_id, raw);
                    None
                }
            })
            .collect();

        aligned = Some(match aligned {
            None => versions,
            Some(previous) => previous
                .into_iter()
                .filter(|(key, _)| versions.contains_key(key))
                .collect(),
        });
    }

    Ok(aligned
        .map(|versions| versions.into_values().collect())
        .unwrap_or_default())
}
