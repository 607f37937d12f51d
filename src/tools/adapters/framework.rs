//! Framework adapter

use std::fmt;
use std::sync::Arc;

use crate::tools::adapter::{
    Binder, FreeFn, Handle, PairPredicateFn, ParseFn, SelectFn, StringFn, StringFreeFn,
    parse_handle, read_string, select, string_prefix,
};
use crate::tools::error::{LoadError, NotSupported, Operation, ParseError, ValueKind};
use crate::tools::package::LoadedPackage;
use crate::tools::release::{Epoch, Release};

fn prefix(epoch: Epoch) -> &'static str {
    match epoch {
        Epoch::Legacy => "nuget_core_framework",
        Epoch::Modern => "nuget_framework",
    }
}

/// Bound Framework members of one release
pub struct FrameworkApi {
    release: Release,
    _package: Arc<dyn LoadedPackage>,
    parse: ParseFn,
    free: FreeFn,
    string_free: StringFreeFn,
    short_folder_name: StringFn,
    dotnet_framework_name: StringFn,
    is_compatible: PairPredicateFn,
    get_nearest: Option<SelectFn>,
}

impl FrameworkApi {
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
                short_folder_name: members
                    .required(&["get_short_folder_name", "get_short_name"])?,
                dotnet_framework_name: members
                    .required(&["get_dotnet_framework_name", "get_full_name"])?,
                is_compatible: members.required(&["is_compatible"])?,
                get_nearest: members.optional(&["get_nearest"]),
            })
        }
    }

    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::NearestFramework | Operation::FrameworkPrecedence => {
                self.get_nearest.is_some()
            }
            _ => false,
        }
    }

    pub(crate) fn not_supported(&self, operation: Operation) -> NotSupported {
        NotSupported {
            operation,
            epoch: self.release.epoch(),
            release: self.release.to_string(),
        }
    }
}

/// A target framework parsed by one release
pub struct Framework {
    input: String,
    handle: Handle,
    api: Arc<FrameworkApi>,
}

impl Framework {
    pub fn parse(api: &Arc<FrameworkApi>, input: &str) -> Result<Self, ParseError> {
        let handle = parse_handle(api.parse, api.free, ValueKind::Framework, input)?;
        Ok(Self {
            input: input.to_string(),
            handle,
            api: Arc::clone(api),
        })
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn short_folder_name(&self) -> String {
        read_string(self.api.short_folder_name, self.api.string_free, &self.handle)
    }

    /// Full name, e.g. ".NETFramework,Version=v4.5"
    pub fn dotnet_framework_name(&self) -> String {
        read_string(
            self.api.dotnet_framework_name,
            self.api.string_free,
            &self.handle,
        )
    }

    /// Whether a project targeting `self` can consume a package built for `package`
    pub fn is_compatible(&self, package: &Framework) -> bool {
        // SAFETY: both handles come from the same release and are alive.
        unsafe { (self.api.is_compatible)(self.handle.as_ptr(), package.handle.as_ptr()) }
    }

    /// The candidate the release considers nearest for a project targeting `self`
    pub fn nearest<'f>(
        &self,
        candidates: &[&'f Framework],
    ) -> Result<Option<&'f Framework>, NotSupported> {
        let selector = self
            .api
            .get_nearest
            .ok_or_else(|| self.api.not_supported(Operation::NearestFramework))?;

        let handles: Vec<&Handle> = candidates.iter().map(|f| &f.handle).collect();
        Ok(select(selector, &self.handle, &handles).map(|i| candidates[i]))
    }
}

impl fmt::Debug for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framework")
            .field("input", &self.input)
            .field("release", &self.api.release.as_str())
            .finish()
    }
}
