//! Capability adapter plumbing
//!
//! A loaded release exports a flat C ABI. Adapters bind each operation to the
//! first exported `<prefix>_<member>` symbol among a list of candidate member
//! names, once per release, and keep the typed function pointers. Operations
//! a release does not export stay unbound and report [`NotSupported`] on use.
//!
//! [`NotSupported`]: crate::tools::error::NotSupported

use std::ffi::{CStr, CString, c_char, c_void};
use std::ptr::NonNull;
use std::sync::Arc;

use tracing::debug;

use crate::tools::error::{LoadError, ParseError, ValueKind};
use crate::tools::package::LoadedPackage;
use crate::tools::release::Epoch;

/// Prefix of the string release function exported by every package
pub fn string_prefix(epoch: Epoch) -> &'static str {
    match epoch {
        Epoch::Legacy => "nuget_core_string",
        Epoch::Modern => "nuget_string",
    }
}

/// Opaque value owned by the loaded library
pub type RawHandle = *mut c_void;

pub type ParseFn = unsafe extern "C" fn(input: *const c_char) -> RawHandle;
pub type FreeFn = unsafe extern "C" fn(handle: RawHandle);
pub type StringFn = unsafe extern "C" fn(handle: *const c_void) -> *mut c_char;
pub type StringFreeFn = unsafe extern "C" fn(value: *mut c_char);
pub type IntFn = unsafe extern "C" fn(handle: *const c_void) -> i32;
pub type PredicateFn = unsafe extern "C" fn(handle: *const c_void) -> bool;
pub type CompareFn = unsafe extern "C" fn(a: *const c_void, b: *const c_void) -> i32;
pub type PairPredicateFn = unsafe extern "C" fn(a: *const c_void, b: *const c_void) -> bool;
/// Picks one candidate for a subject; returns its index or -1
pub type SelectFn = unsafe extern "C" fn(
    subject: *const c_void,
    candidates: *const *const c_void,
    count: usize,
) -> isize;

mod sealed {
    pub trait Sealed {}
}

/// `extern "C"` function pointer types a symbol can be bound as
pub trait ExportFn: Copy + sealed::Sealed {
    /// # Safety
    /// `address` must point at a function with this exact signature.
    unsafe fn from_address(address: *const c_void) -> Self;
}

macro_rules! export_fn {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl ExportFn for $ty {
                unsafe fn from_address(address: *const c_void) -> Self {
                    // SAFETY: data and function pointers share a size on every
                    // supported target; the signature is the caller's contract.
                    unsafe { std::mem::transmute::<*const c_void, $ty>(address) }
                }
            }
        )*
    };
}

export_fn!(
    ParseFn,
    FreeFn,
    StringFn,
    StringFreeFn,
    IntFn,
    PredicateFn,
    CompareFn,
    PairPredicateFn,
    SelectFn,
);

/// Resolves symbols of one package under one role prefix
pub struct Binder<'a> {
    package: &'a Arc<dyn LoadedPackage>,
    prefix: &'static str,
}

impl<'a> Binder<'a> {
    pub fn new(package: &'a Arc<dyn LoadedPackage>, prefix: &'static str) -> Self {
        Self { package, prefix }
    }

    pub fn package(&self) -> Arc<dyn LoadedPackage> {
        Arc::clone(self.package)
    }

    /// Binds a member that every release of the epoch must export.
    ///
    /// # Safety
    /// `F` must be the `extern "C"` function pointer type of the export.
    pub unsafe fn required<F: ExportFn>(&self, members: &[&str]) -> Result<F, LoadError> {
        // SAFETY: forwarded to the caller.
        unsafe { self.optional(members) }.ok_or_else(|| LoadError::MissingSymbol {
            package_id: self.package.package_id().to_string(),
            symbol: format!("{}_{}", self.prefix, members.join("|")),
        })
    }

    /// Binds a member that only some releases export.
    ///
    /// # Safety
    /// `F` must be the `extern "C"` function pointer type of the export.
    pub unsafe fn optional<F: ExportFn>(&self, members: &[&str]) -> Option<F> {
        members.iter().find_map(|member| {
            let name = format!("{}_{}", self.prefix, member);
            let address = self.package.symbol(&name)?;
            debug!("Bound {} in {}", name, self.package.package_id());
            // SAFETY: the caller guarantees `F` matches the export.
            Some(unsafe { F::from_address(address.as_ptr()) })
        })
    }
}

/// Owned library value, released through the library's own free function
pub struct Handle {
    ptr: NonNull<c_void>,
    free: FreeFn,
}

// Values are immutable once parsed; the library contract allows concurrent reads.
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

impl Handle {
    pub fn as_ptr(&self) -> *const c_void {
        self.ptr.as_ptr()
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        // SAFETY: the pointer came from this library's parse and is freed once.
        unsafe { (self.free)(self.ptr.as_ptr()) }
    }
}

/// Parses `input` with a bound parse function.
pub fn parse_handle(
    parse: ParseFn,
    free: FreeFn,
    kind: ValueKind,
    input: &str,
) -> Result<Handle, ParseError> {
    let c_input = CString::new(input).map_err(|_| ParseError::new(kind, input))?;
    // SAFETY: `c_input` is a valid NUL-terminated string for the call's duration.
    let raw = unsafe { parse(c_input.as_ptr()) };
    NonNull::new(raw)
        .map(|ptr| Handle { ptr, free })
        .ok_or_else(|| ParseError::new(kind, input))
}

/// Calls a string getter and copies the result, releasing the library's copy.
pub fn read_string(getter: StringFn, string_free: StringFreeFn, handle: &Handle) -> String {
    // SAFETY: `handle` is alive; the returned string is owned by the caller.
    let raw = unsafe { getter(handle.as_ptr()) };
    if raw.is_null() {
        return String::new();
    }
    // SAFETY: non-null strings returned by the library are NUL-terminated.
    let value = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
    // SAFETY: ownership returns to the library exactly once.
    unsafe { string_free(raw) };
    value
}

/// Calls a selector over candidate handles.
pub fn select(selector: SelectFn, subject: &Handle, candidates: &[&Handle]) -> Option<usize> {
    let pointers: Vec<*const c_void> = candidates.iter().map(|c| c.as_ptr()).collect();
    // SAFETY: all handles are alive and `pointers` outlives the call.
    let index = unsafe { selector(subject.as_ptr(), pointers.as_ptr(), pointers.len()) };
    usize::try_from(index).ok().filter(|i| *i < candidates.len())
}
