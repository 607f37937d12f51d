use std::fmt;

use thiserror::Error;

use crate::tools::release::Epoch;

#[derive(Debug, Clone, Error)]
pub enum PackageError {
    #[error("Package not downloaded: {package_id} {version}")]
    NotFound { package_id: String, version: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Failed to load {path}: {message}")]
    Load { path: String, message: String },
}

impl From<std::io::Error> for PackageError {
    fn from(e: std::io::Error) -> Self {
        PackageError::Io(e.to_string())
    }
}

/// Failure to build the isolation context or services of a release.
///
/// Cloneable so one failed construction can be reported to every waiter.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error(transparent)]
    Package(#[from] PackageError),

    #[error("Package {package_id} does not export {symbol}")]
    MissingSymbol { package_id: String, symbol: String },

    #[error("Release {0} is not in the catalog")]
    UnknownRelease(String),

    #[error("Load task did not complete: {0}")]
    Aborted(String),

    #[error("Memoization lock poisoned")]
    LockPoisoned,
}

/// The kind of literal handed to a release's parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Version,
    VersionRange,
    Framework,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Version => "version",
            ValueKind::VersionRange => "version range",
            ValueKind::Framework => "framework",
        }
    }
}

/// Input the loaded release could not interpret. Carries the literal for echo.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The {} {input} could not be parsed.", kind.as_str())]
pub struct ParseError {
    pub kind: ValueKind,
    pub input: String,
}

impl ParseError {
    pub fn new(kind: ValueKind, input: &str) -> Self {
        Self {
            kind,
            input: input.to_string(),
        }
    }
}

/// Operations that some releases of the library do not export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    VersionIsSemVer2,
    VersionFullString,
    VersionNormalizedString,
    FindBestMatch,
    NearestFramework,
    FrameworkPrecedence,
}

impl Operation {
    pub fn description(&self) -> &'static str {
        match self {
            Operation::VersionIsSemVer2 => "Checking whether a version is SemVer 2.0.0",
            Operation::VersionFullString => "Getting the full version string",
            Operation::VersionNormalizedString => "Getting the normalized version string",
            Operation::FindBestMatch => "Finding the best version match",
            Operation::NearestFramework => "Finding the nearest framework",
            Operation::FrameworkPrecedence => "Listing the framework precedence",
        }
    }
}

/// An operation with no counterpart in the loaded release. Not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotSupported {
    pub operation: Operation,
    pub epoch: Epoch,
    pub release: String,
}

impl fmt::Display for NotSupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epoch {
            Epoch::Legacy => write!(
                f,
                "{} is only supported in NuGet 3.x and greater.",
                self.operation.description()
            ),
            Epoch::Modern => write!(
                f,
                "{} is not supported in NuGet {}.",
                self.operation.description(),
                self.release
            ),
        }
    }
}

impl std::error::Error for NotSupported {}

/// Why a framework precedence list could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrecedenceError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    NotSupported(#[from] NotSupported),
}
