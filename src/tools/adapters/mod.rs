//! Role-specific capability adapters over a loaded release

pub mod framework;
pub mod version;
pub mod version_range;

pub use framework::{Framework, FrameworkApi};
pub use version::{Version, VersionApi};
pub use version_range::{VersionRange, VersionRangeApi};
