//! Releases of the wrapped library and their ordering

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use semver::Prerelease;

/// Package that carries every role in legacy releases
pub const CORE_PACKAGE_ID: &str = "NuGet.Core";
/// Package that carries the Version and VersionRange roles in modern releases
pub const VERSIONING_PACKAGE_ID: &str = "NuGet.Versioning";
/// Package that carries the Framework role in modern releases
pub const FRAMEWORKS_PACKAGE_ID: &str = "NuGet.Frameworks";

/// API generation of the wrapped library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Epoch {
    /// NuGet 2.x, shipped as a single `NuGet.Core` package
    Legacy,
    /// NuGet 3.x and later, split into versioning and frameworks packages
    Modern,
}

impl Epoch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Epoch::Legacy => "legacy",
            Epoch::Modern => "modern",
        }
    }

    /// Package ids that must all be downloaded at the same version for a
    /// release of this epoch to exist.
    pub fn package_ids(&self) -> &'static [&'static str] {
        match self {
            Epoch::Legacy => &[CORE_PACKAGE_ID],
            Epoch::Modern => &[VERSIONING_PACKAGE_ID, FRAMEWORKS_PACKAGE_ID],
        }
    }
}

/// A release version in NuGet syntax.
///
/// Accepts 1 to 4 numeric parts, an optional `-label` and optional `+metadata`.
/// Metadata is dropped; it never takes part in ordering or identity. Labels
/// keep their casing for display but compare case-insensitively.
#[derive(Debug, Clone)]
pub struct ReleaseVersion {
    major: u64,
    minor: u64,
    patch: u64,
    revision: u64,
    pre: Prerelease,
    pre_lowercase: Prerelease,
}

impl ReleaseVersion {
    /// Parse a version string, padding partial versions with zeros.
    ///
    /// Examples:
    /// - "4" -> 4.0.0
    /// - "4.9" -> 4.9.0
    /// - "2.8.6.1" -> 2.8.6.1
    /// - "5.6.0-preview.3.6558+sha" -> 5.6.0-preview.3.6558
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let without_metadata = input.split_once('+').map_or(input, |(version, _)| version);
        let (numbers, label) = match without_metadata.split_once('-') {
            Some((numbers, label)) if !label.is_empty() => (numbers, Some(label)),
            Some(_) => return None,
            None => (without_metadata, None),
        };

        let parts = numbers
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                part.parse::<u64>().ok()
            })
            .collect::<Option<Vec<u64>>>()?;

        if parts.is_empty() || parts.len() > 4 {
            return None;
        }

        let (pre, pre_lowercase) = match label {
            Some(label) => (
                Prerelease::new(label).ok()?,
                Prerelease::new(&label.to_ascii_lowercase()).ok()?,
            ),
            None => (Prerelease::EMPTY, Prerelease::EMPTY),
        };

        let part = |i: usize| parts.get(i).copied().unwrap_or(0);
        Some(Self {
            major: part(0),
            minor: part(1),
            patch: part(2),
            revision: part(3),
            pre,
            pre_lowercase,
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// Normalized form: three parts, a fourth only when non-zero, label kept.
    pub fn to_normalized_string(&self) -> String {
        let mut normalized = format!("{}.{}.{}", self.major, self.minor, self.patch);
        if self.revision > 0 {
            normalized.push_str(&format!(".{}", self.revision));
        }
        if !self.pre.is_empty() {
            normalized.push('-');
            normalized.push_str(self.pre.as_str());
        }
        normalized
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_normalized_string())
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch, self.revision)
            .cmp(&(other.major, other.minor, other.patch, other.revision))
            .then_with(|| self.pre_lowercase.cmp(&other.pre_lowercase))
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReleaseVersion {}

/// One published release of the wrapped library, bound to its epoch.
///
/// Identity is the normalized version string compared case-insensitively.
#[derive(Debug, Clone)]
pub struct Release {
    version: ReleaseVersion,
    normalized: String,
    epoch: Epoch,
}

impl Release {
    pub fn new(version: ReleaseVersion, epoch: Epoch) -> Self {
        let normalized = version.to_normalized_string();
        Self {
            version,
            normalized,
            epoch,
        }
    }

    pub fn version(&self) -> &ReleaseVersion {
        &self.version
    }

    /// Normalized version string, also used as the release's display name
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Case-insensitive lookup key
    pub fn key(&self) -> String {
        self.normalized.to_ascii_lowercase()
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl PartialEq for Release {
    fn eq(&self, other: &Self) -> bool {
        self.normalized.eq_ignore_ascii_case(&other.normalized)
    }
}

impl Eq for Release {}

impl Hash for Release {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}
