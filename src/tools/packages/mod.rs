//! Package store implementations

pub mod local;

pub use local::LocalPackageStore;
