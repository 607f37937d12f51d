//! VersionRange adapter

use std::fmt;
use std::sync::Arc;

use crate::tools::adapter::{
    Binder, FreeFn, Handle, PairPredicateFn, ParseFn, SelectFn, StringFn, StringFreeFn,
    parse_handle, read_string, select, string_prefix,
};
use crate::tools::adapters::version::Version;
use crate::tools::error::{LoadError, NotSupported, Operation, ParseError, ValueKind};
use crate::tools::package::LoadedPackage;
use crate::tools::release::{Epoch, Release};

fn prefix(epoch: Epoch) -> &'static str {
    match epoch {
        Epoch::Legacy => "nuget_core_version_spec",
        Epoch::Modern => "nuget_version_range",
    }
}

/// Bound VersionRange members of one release
pub struct VersionRangeApi {
    release: Release,
    _package: Arc<dyn LoadedPackage>,
    parse: ParseFn,
    free: FreeFn,
    string_free: StringFreeFn,
    to_normalized_string: StringFn,
    satisfies: PairPredicateFn,
    find_best_match: Option<SelectFn>,
}

impl VersionRangeApi {
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
                to_normalized_string: members.required(&["to_normalized_string", "pretty_print"])?,
                satisfies: members.required(&["satisfies"])?,
                find_best_match: members.optional(&["find_best_match"]),
            })
        }
    }

    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::FindBestMatch => self.find_best_match.is_some(),
            _ => false,
        }
    }
}

/// A version range parsed by one release
pub struct VersionRange {
    input: String,
    handle: Handle,
    api: Arc<VersionRangeApi>,
}

impl VersionRange {
    pub fn parse(api: &Arc<VersionRangeApi>, input: &str) -> Result<Self, ParseError> {
        let handle = parse_handle(api.parse, api.free, ValueKind::VersionRange, input)?;
        Ok(Self {
            input: input.to_string(),
            handle,
            api: Arc::clone(api),
        })
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn normalized_string(&self) -> String {
        read_string(
            self.api.to_normalized_string,
            self.api.string_free,
            &self.handle,
        )
    }

    pub fn satisfies(&self, version: &Version) -> bool {
        // SAFETY: both handles come from the same release and are alive.
        unsafe { (self.api.satisfies)(self.handle.as_ptr(), version.handle().as_ptr()) }
    }

    /// The release's preferred candidate within this range, if any satisfies it
    pub fn find_best_match<'v>(
        &self,
        candidates: &[&'v Version],
    ) -> Result<Option<&'v Version>, NotSupported> {
        let selector = self.api.find_best_match.ok_or_else(|| NotSupported {
            operation: Operation::FindBestMatch,
            epoch: self.api.release.epoch(),
            release: self.api.release.to_string(),
        })?;

        let handles: Vec<&Handle> = candidates.iter().map(|v| v.handle()).collect();
        Ok(select(selector, &self.handle, &handles).map(|i| candidates[i]))
    }
}

impl fmt::Debug for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionRange")
            .field("input", &self.input)
            .field("release", &self.api.release.as_str())
            .finish()
    }
}
