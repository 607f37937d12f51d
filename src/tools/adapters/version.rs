//! Version adapter

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::tools::adapter::{
    Binder, CompareFn, FreeFn, Handle, IntFn, ParseFn, PredicateFn, StringFn, StringFreeFn,
    parse_handle, read_string, string_prefix,
};
use crate::tools::error::{LoadError, NotSupported, Operation, ParseError, ValueKind};
use crate::tools::package::LoadedPackage;
use crate::tools::release::{Epoch, Release};

fn prefix(epoch: Epoch) -> &'static str {
    match epoch {
        Epoch::Legacy => "nuget_core_semantic_version",
        Epoch::Modern => "nuget_version",
    }
}

/// Bound Version members of one release
pub struct VersionApi {
    release: Release,
    _package: Arc<dyn LoadedPackage>,
    parse: ParseFn,
    free: FreeFn,
    string_free: StringFreeFn,
    to_string: StringFn,
    to_normalized_string: Option<StringFn>,
    to_full_string: Option<StringFn>,
    revision: IntFn,
    is_semver2: Option<PredicateFn>,
    is_prerelease: PredicateFn,
    compare: CompareFn,
}

impl VersionApi {
    pub fn bind(release: &Release, package: &Arc<dyn LoadedPackage>) -> Result<Self, LoadError> {
        let members = Binder::new(package, prefix(release.epoch()));
        let strings = Binder::new(package, string_prefix(release.epoch()));

        // SAFETY: each member is bound to the pointer type of its ABI signature.
        unsafe {
            Ok(Self {
                release: release.clone(),
                _package: members.package(),
                parse: members.required(&["parse"])?,
                free: members.required(&["free"])?,
                string_free: strings.required(&["free"])?,
                to_string: members.required(&["to_string"])?,
                to_normalized_string: members.optional(&["to_normalized_string"]),
                to_full_string: members.optional(&["to_full_string"]),
                revision: members.required(&["revision"])?,
                is_semver2: members.optional(&["is_semver2"]),
                is_prerelease: members.required(&["is_prerelease"])?,
                compare: members.required(&["compare"])?,
            })
        }
    }

    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::VersionIsSemVer2 => self.is_semver2.is_some(),
            Operation::VersionFullString => self.to_full_string.is_some(),
            Operation::VersionNormalizedString => self.to_normalized_string.is_some(),
            _ => false,
        }
    }

    fn not_supported(&self, operation: Operation) -> NotSupported {
        NotSupported {
            operation,
            epoch: self.release.epoch(),
            release: self.release.to_string(),
        }
    }
}

/// A version parsed by one release
pub struct Version {
    input: String,
    handle: Handle,
    api: Arc<VersionApi>,
}

impl Version {
    pub fn parse(api: &Arc<VersionApi>, input: &str) -> Result<Self, ParseError> {
        let handle = parse_handle(api.parse, api.free, ValueKind::Version, input)?;
        Ok(Self {
            input: input.to_string(),
            handle,
            api: Arc::clone(api),
        })
    }

    /// The literal this version was parsed from
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn normalized_string(&self) -> Result<String, NotSupported> {
        let getter = self
            .api
            .to_normalized_string
            .ok_or_else(|| self.api.not_supported(Operation::VersionNormalizedString))?;
        Ok(read_string(getter, self.api.string_free, &self.handle))
    }

    pub fn full_string(&self) -> Result<String, NotSupported> {
        let getter = self
            .api
            .to_full_string
            .ok_or_else(|| self.api.not_supported(Operation::VersionFullString))?;
        Ok(read_string(getter, self.api.string_free, &self.handle))
    }

    /// Normalized string where the release has one, otherwise `to_string`
    pub fn display_string(&self) -> String {
        self.normalized_string().unwrap_or_else(|_| self.to_string())
    }

    pub fn revision(&self) -> i32 {
        // SAFETY: the handle belongs to this release and is alive.
        unsafe { (self.api.revision)(self.handle.as_ptr()) }
    }

    pub fn is_semver2(&self) -> Result<bool, NotSupported> {
        let predicate = self
            .api
            .is_semver2
            .ok_or_else(|| self.api.not_supported(Operation::VersionIsSemVer2))?;
        // SAFETY: as above.
        Ok(unsafe { predicate(self.handle.as_ptr()) })
    }

    pub fn is_prerelease(&self) -> bool {
        // SAFETY: as above.
        unsafe { (self.api.is_prerelease)(self.handle.as_ptr()) }
    }

    /// Ordering as defined by the release that parsed both values
    pub fn compare(&self, other: &Version) -> Ordering {
        debug_assert!(Arc::ptr_eq(&self.api, &other.api));
        // SAFETY: both handles come from the same release and are alive.
        let result = unsafe { (self.api.compare)(self.handle.as_ptr(), other.handle.as_ptr()) };
        result.cmp(&0)
    }

    pub(crate) fn handle(&self) -> &Handle {
        &self.handle
    }
}

/// The release's own `ToString()` rendering
impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&read_string(
            self.api.to_string,
            self.api.string_free,
            &self.handle,
        ))
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Version")
            .field("input", &self.input)
            .field("release", &self.api.release.as_str())
            .finish()
    }
}
