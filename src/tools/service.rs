//! Release-agnostic tools over one loaded release

use std::cmp::Ordering;
use std::sync::Arc;

use crate::tools::adapters::{Framework, Version, VersionRange};
use crate::tools::error::{NotSupported, Operation, ParseError};
use crate::tools::loader::IsolationContext;
use crate::tools::release::Release;

/// Values a [`ToolsService`] can parse
pub trait Parseable: Sized {
    fn parse_with(service: &ToolsService, input: &str) -> Result<Self, ParseError>;
}

impl Parseable for Version {
    fn parse_with(service: &ToolsService, input: &str) -> Result<Self, ParseError> {
        Version::parse(service.context.version(), input)
    }
}

impl Parseable for VersionRange {
    fn parse_with(service: &ToolsService, input: &str) -> Result<Self, ParseError> {
        VersionRange::parse(service.context.version_range(), input)
    }
}

impl Parseable for Framework {
    fn parse_with(service: &ToolsService, input: &str) -> Result<Self, ParseError> {
        Framework::parse(service.context.framework(), input)
    }
}

/// Parse, compare and match operations for one release.
///
/// Every value passed back in must have been parsed by the same service.
#[derive(Debug)]
pub struct ToolsService {
    context: Arc<IsolationContext>,
}

impl ToolsService {
    pub fn new(context: Arc<IsolationContext>) -> Self {
        Self { context }
    }

    pub fn release(&self) -> &Release {
        self.context.release()
    }

    /// Normalized version string of the loaded release
    pub fn version(&self) -> &str {
        self.context.release().as_str()
    }

    /// Whether the loaded release exports `operation`
    pub fn supports(&self, operation: Operation) -> bool {
        self.context.version().supports(operation)
            || self.context.version_range().supports(operation)
            || self.context.framework().supports(operation)
    }

    pub fn parse<T: Parseable>(&self, input: &str) -> Result<T, ParseError> {
        T::parse_with(self, input)
    }

    /// Parses every input, failing on the first literal the release rejects
    pub fn parse_all<T: Parseable>(&self, inputs: &[&str]) -> Result<Vec<T>, ParseError> {
        inputs.iter().map(|input| self.parse(input)).collect()
    }

    pub fn parse_version(&self, input: &str) -> Result<Version, ParseError> {
        self.parse(input)
    }

    pub fn parse_version_range(&self, input: &str) -> Result<VersionRange, ParseError> {
        self.parse(input)
    }

    pub fn parse_framework(&self, input: &str) -> Result<Framework, ParseError> {
        self.parse(input)
    }

    pub fn compare_versions(&self, a: &Version, b: &Version) -> Ordering {
        a.compare(b)
    }

    /// Ascending by the release's comparison, stable for equal versions
    pub fn sort_versions(&self, mut versions: Vec<Version>) -> Vec<Version> {
        versions.sort_by(|a, b| a.compare(b));
        versions
    }

    pub fn satisfies(&self, range: &VersionRange, version: &Version) -> bool {
        range.satisfies(version)
    }

    pub fn find_best_match<'v>(
        &self,
        range: &VersionRange,
        versions: &'v [Version],
    ) -> Result<Option<&'v Version>, NotSupported> {
        let candidates: Vec<&Version> = versions.iter().collect();
        range.find_best_match(&candidates)
    }

    pub fn is_compatible(&self, project: &Framework, package: &Framework) -> bool {
        project.is_compatible(package)
    }

    pub fn nearest_framework<'f>(
        &self,
        project: &Framework,
        packages: &'f [Framework],
    ) -> Result<Option<&'f Framework>, NotSupported> {
        let candidates: Vec<&Framework> = packages.iter().collect();
        project.nearest(&candidates)
    }
}
