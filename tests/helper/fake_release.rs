//! In-process fake NuGet releases
//!
//! Each fake package exports the C ABI a real release package would, backed by
//! `extern "C"` functions in this file. Version semantics follow NuGet syntax
//! closely enough for the behaviors under test; framework semantics cover the
//! .NET Framework, .NET Standard and .NET Core families.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::ffi::{CStr, CString, c_char, c_void};
use std::ptr;
use std::sync::Arc;

use nuget_tools::tools::adapter::{
    CompareFn, FreeFn, IntFn, PairPredicateFn, ParseFn, PredicateFn, RawHandle, SelectFn,
    StringFn, StringFreeFn,
};
use nuget_tools::tools::package::{LoadedPackage, SymbolAddress};
use nuget_tools::tools::release::{
    CORE_PACKAGE_ID, FRAMEWORKS_PACKAGE_ID, ReleaseVersion, VERSIONING_PACKAGE_ID,
};

/// A package whose symbols are functions of the test binary
pub struct FakePackage {
    package_id: String,
    symbols: HashMap<String, SymbolAddress>,
}

impl FakePackage {
    pub fn new(package_id: &str) -> Self {
        Self {
            package_id: package_id.to_string(),
            symbols: HashMap::new(),
        }
    }

    fn export(mut self, name: &str, address: *const c_void) -> Self {
        if let Some(address) = SymbolAddress::new(address) {
            self.symbols.insert(name.to_string(), address);
        }
        self
    }

    /// Drops an exported symbol, simulating a release that lacks it
    pub fn without(mut self, name: &str) -> Self {
        self.symbols.remove(name);
        self
    }

    pub fn into_loaded(self) -> Arc<dyn LoadedPackage> {
        Arc::new(self)
    }
}

impl LoadedPackage for FakePackage {
    fn package_id(&self) -> &str {
        &self.package_id
    }

    fn symbol(&self, name: &str) -> Option<SymbolAddress> {
        self.symbols.get(name).copied()
    }
}

/// The fake package for a package id, if the id is one a release ships
pub fn package(package_id: &str) -> Option<FakePackage> {
    match package_id {
        VERSIONING_PACKAGE_ID => Some(versioning_package()),
        FRAMEWORKS_PACKAGE_ID => Some(frameworks_package()),
        CORE_PACKAGE_ID => Some(core_package()),
        _ => None,
    }
}

/// Modern versioning package: Version and VersionRange with every optional member
pub fn versioning_package() -> FakePackage {
    FakePackage::new(VERSIONING_PACKAGE_ID)
        .export("nuget_version_parse", version_parse as ParseFn as *const c_void)
        .export("nuget_version_free", version_free as FreeFn as *const c_void)
        .export("nuget_version_to_string", version_to_string as StringFn as *const c_void)
        .export(
            "nuget_version_to_normalized_string",
            version_to_normalized_string as StringFn as *const c_void,
        )
        .export(
            "nuget_version_to_full_string",
            version_to_full_string as StringFn as *const c_void,
        )
        .export("nuget_version_revision", version_revision as IntFn as *const c_void)
        .export("nuget_version_is_semver2", version_is_semver2 as PredicateFn as *const c_void)
        .export(
            "nuget_version_is_prerelease",
            version_is_prerelease as PredicateFn as *const c_void,
        )
        .export("nuget_version_compare", version_compare as CompareFn as *const c_void)
        .export("nuget_version_range_parse", range_parse as ParseFn as *const c_void)
        .export("nuget_version_range_free", range_free as FreeFn as *const c_void)
        .export(
            "nuget_version_range_to_normalized_string",
            range_to_string as StringFn as *const c_void,
        )
        .export(
            "nuget_version_range_satisfies",
            range_satisfies as PairPredicateFn as *const c_void,
        )
        .export(
            "nuget_version_range_find_best_match",
            range_find_best_match as SelectFn as *const c_void,
        )
        .export("nuget_string_free", string_free as StringFreeFn as *const c_void)
}

/// Modern frameworks package
pub fn frameworks_package() -> FakePackage {
    FakePackage::new(FRAMEWORKS_PACKAGE_ID)
        .export("nuget_framework_parse", framework_parse as ParseFn as *const c_void)
        .export("nuget_framework_free", framework_free as FreeFn as *const c_void)
        .export(
            "nuget_framework_get_short_folder_name",
            framework_short_name as StringFn as *const c_void,
        )
        .export(
            "nuget_framework_get_dotnet_framework_name",
            framework_full_name as StringFn as *const c_void,
        )
        .export(
            "nuget_framework_is_compatible",
            framework_is_compatible as PairPredicateFn as *const c_void,
        )
        .export(
            "nuget_framework_get_nearest",
            framework_get_nearest as SelectFn as *const c_void,
        )
        .export("nuget_string_free", string_free as StringFreeFn as *const c_void)
}

/// Legacy core package: one package for all roles, older member names, no
/// SemVer 2.0.0 members and no best-match search
pub fn core_package() -> FakePackage {
    FakePackage::new(CORE_PACKAGE_ID)
        .export(
            "nuget_core_semantic_version_parse",
            version_parse as ParseFn as *const c_void,
        )
        .export(
            "nuget_core_semantic_version_free",
            version_free as FreeFn as *const c_void,
        )
        .export(
            "nuget_core_semantic_version_to_string",
            version_to_string as StringFn as *const c_void,
        )
        .export(
            "nuget_core_semantic_version_to_normalized_string",
            version_to_normalized_string as StringFn as *const c_void,
        )
        .export(
            "nuget_core_semantic_version_revision",
            version_revision as IntFn as *const c_void,
        )
        .export(
            "nuget_core_semantic_version_is_prerelease",
            version_is_prerelease as PredicateFn as *const c_void,
        )
        .export(
            "nuget_core_semantic_version_compare",
            version_compare as CompareFn as *const c_void,
        )
        .export("nuget_core_version_spec_parse", range_parse as ParseFn as *const c_void)
        .export("nuget_core_version_spec_free", range_free as FreeFn as *const c_void)
        .export(
            "nuget_core_version_spec_pretty_print",
            range_to_string as StringFn as *const c_void,
        )
        .export(
            "nuget_core_version_spec_satisfies",
            range_satisfies as PairPredicateFn as *const c_void,
        )
        .export("nuget_core_framework_parse", framework_parse as ParseFn as *const c_void)
        .export("nuget_core_framework_free", framework_free as FreeFn as *const c_void)
        .export(
            "nuget_core_framework_get_short_name",
            framework_short_name as StringFn as *const c_void,
        )
        .export(
            "nuget_core_framework_get_full_name",
            framework_full_name as StringFn as *const c_void,
        )
        .export(
            "nuget_core_framework_is_compatible",
            framework_is_compatible as PairPredicateFn as *const c_void,
        )
        .export(
            "nuget_core_framework_get_nearest",
            framework_get_nearest as SelectFn as *const c_void,
        )
        .export("nuget_core_string_free", string_free as StringFreeFn as *const c_void)
}

// Handle and string plumbing

fn into_handle<T>(value: T) -> RawHandle {
    Box::into_raw(Box::new(value)).cast()
}

unsafe fn borrow<'a, T>(handle: *const c_void) -> &'a T {
    unsafe { &*handle.cast::<T>() }
}

unsafe fn free_handle<T>(handle: RawHandle) {
    if !handle.is_null() {
        drop(unsafe { Box::from_raw(handle.cast::<T>()) });
    }
}

unsafe fn read_input<'a>(input: *const c_char) -> Option<&'a str> {
    if input.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(input) }.to_str().ok()
}

fn out_string(value: String) -> *mut c_char {
    CString::new(value).map_or(ptr::null_mut(), CString::into_raw)
}

unsafe extern "C" fn string_free(value: *mut c_char) {
    if !value.is_null() {
        drop(unsafe { CString::from_raw(value) });
    }
}

fn ordering_to_int(ordering: Ordering) -> i32 {
    match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

unsafe fn candidates<'a, T>(candidates: *const *const c_void, count: usize) -> Vec<&'a T> {
    if candidates.is_null() || count == 0 {
        return Vec::new();
    }
    unsafe { std::slice::from_raw_parts(candidates, count) }
        .iter()
        .map(|handle| unsafe { borrow::<T>(*handle) })
        .collect()
}

// Version

struct FakeVersion {
    version: ReleaseVersion,
    full: String,
    semver2: bool,
}

fn parse_version(input: &str) -> Option<FakeVersion> {
    let input = input.trim();
    let version = ReleaseVersion::parse(input)?;
    let (without_metadata, has_metadata) = match input.split_once('+') {
        Some((version, _)) => (version, true),
        None => (input, false),
    };
    let dotted_label = without_metadata
        .split_once('-')
        .is_some_and(|(_, label)| label.contains('.'));

    Some(FakeVersion {
        version,
        full: input.to_string(),
        semver2: has_metadata || dotted_label,
    })
}

unsafe extern "C" fn version_parse(input: *const c_char) -> RawHandle {
    unsafe { read_input(input) }
        .and_then(parse_version)
        .map_or(ptr::null_mut(), into_handle)
}

unsafe extern "C" fn version_free(handle: RawHandle) {
    unsafe { free_handle::<FakeVersion>(handle) }
}

unsafe extern "C" fn version_to_string(handle: *const c_void) -> *mut c_char {
    let version = unsafe { borrow::<FakeVersion>(handle) };
    out_string(version.version.to_normalized_string())
}

unsafe extern "C" fn version_to_normalized_string(handle: *const c_void) -> *mut c_char {
    let version = unsafe { borrow::<FakeVersion>(handle) };
    out_string(version.version.to_normalized_string())
}

unsafe extern "C" fn version_to_full_string(handle: *const c_void) -> *mut c_char {
    let version = unsafe { borrow::<FakeVersion>(handle) };
    out_string(version.full.clone())
}

unsafe extern "C" fn version_revision(handle: *const c_void) -> i32 {
    let version = unsafe { borrow::<FakeVersion>(handle) };
    i32::try_from(version.version.revision()).unwrap_or(i32::MAX)
}

unsafe extern "C" fn version_is_semver2(handle: *const c_void) -> bool {
    unsafe { borrow::<FakeVersion>(handle) }.semver2
}

unsafe extern "C" fn version_is_prerelease(handle: *const c_void) -> bool {
    unsafe { borrow::<FakeVersion>(handle) }
        .version
        .is_prerelease()
}

unsafe extern "C" fn version_compare(a: *const c_void, b: *const c_void) -> i32 {
    let (a, b) = unsafe { (borrow::<FakeVersion>(a), borrow::<FakeVersion>(b)) };
    ordering_to_int(a.version.cmp(&b.version))
}

// Version range

struct Bound {
    version: ReleaseVersion,
    inclusive: bool,
}

struct FakeRange {
    min: Option<Bound>,
    max: Option<Bound>,
}

impl FakeRange {
    fn contains(&self, version: &ReleaseVersion) -> bool {
        let above_min = self.min.as_ref().is_none_or(|min| match version.cmp(&min.version) {
            Ordering::Greater => true,
            Ordering::Equal => min.inclusive,
            Ordering::Less => false,
        });
        let below_max = self.max.as_ref().is_none_or(|max| match version.cmp(&max.version) {
            Ordering::Less => true,
            Ordering::Equal => max.inclusive,
            Ordering::Greater => false,
        });
        above_min && below_max
    }

    fn normalized(&self) -> String {
        let exact = match (&self.min, &self.max) {
            (Some(min), Some(max)) => min.inclusive && max.inclusive && min.version == max.version,
            _ => false,
        };
        if exact {
            if let Some(min) = &self.min {
                return format!("[{}]", min.version);
            }
        }

        let (open, min) = match &self.min {
            Some(min) if min.inclusive => ("[", min.version.to_string()),
            Some(min) => ("(", min.version.to_string()),
            None => ("(", String::new()),
        };
        let (close, max) = match &self.max {
            Some(max) if max.inclusive => ("]", max.version.to_string()),
            Some(max) => (")", max.version.to_string()),
            None => (")", String::new()),
        };
        format!("{}{}, {}{}", open, min, max, close)
    }
}

fn parse_bound(input: &str, inclusive: bool) -> Option<Option<Bound>> {
    let input = input.trim();
    if input.is_empty() {
        return Some(None);
    }
    let version = ReleaseVersion::parse(input)?;
    Some(Some(Bound { version, inclusive }))
}

fn parse_range(input: &str) -> Option<FakeRange> {
    let input = input.trim();
    let first = input.chars().next()?;

    if first != '[' && first != '(' {
        let version = ReleaseVersion::parse(input)?;
        return Some(FakeRange {
            min: Some(Bound {
                version,
                inclusive: true,
            }),
            max: None,
        });
    }

    let last = input.chars().last()?;
    if input.len() < 2 || (last != ']' && last != ')') {
        return None;
    }
    let inner = &input[1..input.len() - 1];

    match inner.split_once(',') {
        Some((min, max)) => {
            let range = FakeRange {
                min: parse_bound(min, first == '[')?,
                max: parse_bound(max, last == ']')?,
            };
            (range.min.is_some() || range.max.is_some()).then_some(range)
        }
        None if first == '[' && last == ']' => {
            let version = ReleaseVersion::parse(inner)?;
            Some(FakeRange {
                min: Some(Bound {
                    version: version.clone(),
                    inclusive: true,
                }),
                max: Some(Bound {
                    version,
                    inclusive: true,
                }),
            })
        }
        None => None,
    }
}

unsafe extern "C" fn range_parse(input: *const c_char) -> RawHandle {
    unsafe { read_input(input) }
        .and_then(parse_range)
        .map_or(ptr::null_mut(), into_handle)
}

unsafe extern "C" fn range_free(handle: RawHandle) {
    unsafe { free_handle::<FakeRange>(handle) }
}

unsafe extern "C" fn range_to_string(handle: *const c_void) -> *mut c_char {
    out_string(unsafe { borrow::<FakeRange>(handle) }.normalized())
}

unsafe extern "C" fn range_satisfies(range: *const c_void, version: *const c_void) -> bool {
    let (range, version) = unsafe { (borrow::<FakeRange>(range), borrow::<FakeVersion>(version)) };
    range.contains(&version.version)
}

/// Lowest satisfying candidate
unsafe extern "C" fn range_find_best_match(
    range: *const c_void,
    versions: *const *const c_void,
    count: usize,
) -> isize {
    let range = unsafe { borrow::<FakeRange>(range) };
    let versions = unsafe { candidates::<FakeVersion>(versions, count) };

    versions
        .iter()
        .enumerate()
        .filter(|(_, candidate)| range.contains(&candidate.version))
        .min_by(|(_, a), (_, b)| a.version.cmp(&b.version))
        .map_or(-1, |(index, _)| index as isize)
}

// Framework

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    NetFramework,
    NetStandard,
    NetCoreApp,
}

struct FakeFramework {
    family: Family,
    version: (u32, u32, u32),
}

impl FakeFramework {
    fn version_string(&self) -> String {
        let (major, minor, patch) = self.version;
        if patch > 0 {
            format!("{}.{}.{}", major, minor, patch)
        } else {
            format!("{}.{}", major, minor)
        }
    }

    fn short_name(&self) -> String {
        let (major, minor, patch) = self.version;
        match self.family {
            Family::NetFramework if patch > 0 => format!("net{}{}{}", major, minor, patch),
            Family::NetFramework => format!("net{}{}", major, minor),
            Family::NetStandard => format!("netstandard{}.{}", major, minor),
            Family::NetCoreApp if major >= 5 => format!("net{}.{}", major, minor),
            Family::NetCoreApp => format!("netcoreapp{}.{}", major, minor),
        }
    }

    fn full_name(&self) -> String {
        let identifier = match self.family {
            Family::NetFramework => ".NETFramework",
            Family::NetStandard => ".NETStandard",
            Family::NetCoreApp => ".NETCoreApp",
        };
        format!("{},Version=v{}", identifier, self.version_string())
    }

    /// Highest .NET Standard version this framework can consume
    fn supported_standard(&self) -> Option<(u32, u32, u32)> {
        match self.family {
            Family::NetStandard => Some(self.version),
            Family::NetFramework if self.version >= (4, 6, 1) => Some((2, 0, 0)),
            Family::NetFramework if self.version >= (4, 5, 0) => Some((1, 1, 0)),
            Family::NetCoreApp if self.version >= (3, 0, 0) => Some((2, 1, 0)),
            Family::NetCoreApp if self.version >= (2, 0, 0) => Some((2, 0, 0)),
            Family::NetCoreApp => Some((1, 6, 0)),
            Family::NetFramework => None,
        }
    }

    fn is_compatible(&self, package: &FakeFramework) -> bool {
        if package.family == self.family {
            return package.version <= self.version;
        }
        package.family == Family::NetStandard
            && self
                .supported_standard()
                .is_some_and(|supported| package.version <= supported)
    }
}

fn dotted_version(input: &str) -> Option<(u32, u32, u32)> {
    let mut parts = input.split('.').map(|part| part.parse::<u32>().ok());
    let major = parts.next()??;
    let minor = parts.next().unwrap_or(Some(0))?;
    let patch = parts.next().unwrap_or(Some(0))?;
    parts.next().is_none().then_some((major, minor, patch))
}

fn parse_framework(input: &str) -> Option<FakeFramework> {
    let input = input.trim().to_ascii_lowercase();

    if let Some(version) = input.strip_prefix("netstandard") {
        return Some(FakeFramework {
            family: Family::NetStandard,
            version: dotted_version(version)?,
        });
    }
    if let Some(version) = input.strip_prefix("netcoreapp") {
        return Some(FakeFramework {
            family: Family::NetCoreApp,
            version: dotted_version(version)?,
        });
    }

    let version = input.strip_prefix("net")?;
    if version.contains('.') {
        let version = dotted_version(version)?;
        return (version.0 >= 5).then_some(FakeFramework {
            family: Family::NetCoreApp,
            version,
        });
    }

    let digits: Vec<u32> = version.chars().map(|c| c.to_digit(10)).collect::<Option<_>>()?;
    let version = match digits.as_slice() {
        [major, minor] => (*major, *minor, 0),
        [major, minor, patch] => (*major, *minor, *patch),
        _ => return None,
    };
    Some(FakeFramework {
        family: Family::NetFramework,
        version,
    })
}

unsafe extern "C" fn framework_parse(input: *const c_char) -> RawHandle {
    unsafe { read_input(input) }
        .and_then(parse_framework)
        .map_or(ptr::null_mut(), into_handle)
}

unsafe extern "C" fn framework_free(handle: RawHandle) {
    unsafe { free_handle::<FakeFramework>(handle) }
}

unsafe extern "C" fn framework_short_name(handle: *const c_void) -> *mut c_char {
    out_string(unsafe { borrow::<FakeFramework>(handle) }.short_name())
}

unsafe extern "C" fn framework_full_name(handle: *const c_void) -> *mut c_char {
    out_string(unsafe { borrow::<FakeFramework>(handle) }.full_name())
}

unsafe extern "C" fn framework_is_compatible(
    project: *const c_void,
    package: *const c_void,
) -> bool {
    let (project, package) =
        unsafe { (borrow::<FakeFramework>(project), borrow::<FakeFramework>(package)) };
    project.is_compatible(package)
}

/// Compatible candidate of the project's own family with the highest version,
/// then the highest compatible .NET Standard
unsafe extern "C" fn framework_get_nearest(
    project: *const c_void,
    frameworks: *const *const c_void,
    count: usize,
) -> isize {
    let project = unsafe { borrow::<FakeFramework>(project) };
    let frameworks = unsafe { candidates::<FakeFramework>(frameworks, count) };

    frameworks
        .iter()
        .enumerate()
        .filter(|(_, candidate)| project.is_compatible(candidate))
        .max_by_key(|(_, candidate)| (candidate.family == project.family, candidate.version))
        .map_or(-1, |(index, _)| index as isize)
}
