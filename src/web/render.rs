//! Plain-text rendering of each operation's outcome
//!
//! Parse failures and unsupported operations are rendered as ordinary text.

use std::cmp::Ordering;

use crate::tools::adapters::{Framework, Version, VersionRange};
use crate::tools::error::PrecedenceError;
use crate::tools::precedence::FrameworkPrecedenceService;
use crate::tools::service::ToolsService;

/// Operation paths served under each release
pub const OPERATIONS: &[(&str, &str)] = &[
    ("parse-framework", "framework"),
    ("framework-compatibility", "project, package"),
    ("get-nearest-framework", "project, package"),
    ("framework-precedence", "framework"),
    ("parse-version", "version"),
    ("version-comparison", "versionA, versionB"),
    ("sort-versions", "versions"),
    ("parse-version-range", "versionRange"),
    ("version-satisfies", "versionRange, version"),
    ("find-best-version-match", "versionRange, versions"),
];

/// Splits a newline-delimited parameter, ignoring blank lines
pub fn split_lines(input: &str) -> Vec<&str> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

fn join(lines: Vec<String>) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn version_label(version: &Version) -> String {
    format!("{} ({})", version.input(), version.display_string())
}

fn range_label(range: &VersionRange) -> String {
    format!("{} ({})", range.input(), range.normalized_string())
}

fn framework_label(framework: &Framework) -> String {
    format!("{} ({})", framework.input(), framework.short_folder_name())
}

/// Landing text of one release
pub fn index(version: &str, available: &[String]) -> String {
    let mut lines = vec![format!("NuGet {}", version), String::new()];
    lines.extend(
        OPERATIONS
            .iter()
            .map(|(path, params)| format!("/{}/{} ({})", version, path, params)),
    );
    lines.push(String::new());
    lines.push(format!("Available versions: {}", available.join(", ")));
    join(lines)
}

pub fn missing_parameter(name: &str) -> String {
    join(vec![format!("Provide the {} query parameter.", name)])
}

pub fn parse_framework(tools: &ToolsService, input: &str) -> String {
    match tools.parse_framework(input) {
        Err(e) => join(vec![e.to_string()]),
        Ok(framework) => join(vec![
            format!("The input value is {}.", framework.input()),
            format!("The short folder name is {}.", framework.short_folder_name()),
            format!(
                "The .NET framework name is {}.",
                framework.dotnet_framework_name()
            ),
        ]),
    }
}

pub fn framework_compatibility(tools: &ToolsService, project: &str, package: &str) -> String {
    let (project, package) = match (tools.parse_framework(project), tools.parse_framework(package))
    {
        (Ok(project), Ok(package)) => (project, package),
        (Err(e), _) | (_, Err(e)) => return join(vec![e.to_string()]),
    };

    let verb = if tools.is_compatible(&project, &package) {
        "support"
    } else {
        "do not support"
    };
    join(vec![format!(
        "{} projects {} {} packages.",
        framework_label(&project),
        verb,
        framework_label(&package)
    )])
}

pub fn nearest_framework(tools: &ToolsService, project: &str, packages: &str) -> String {
    let project = match tools.parse_framework(project) {
        Ok(project) => project,
        Err(e) => return join(vec![e.to_string()]),
    };
    let packages: Vec<Framework> = match tools.parse_all(&split_lines(packages)) {
        Ok(packages) => packages,
        Err(e) => return join(vec![e.to_string()]),
    };

    let line = match tools.nearest_framework(&project, &packages) {
        Err(not_supported) => not_supported.to_string(),
        Ok(Some(nearest)) => format!(
            "The {} package framework is the nearest to the {} project framework.",
            framework_label(nearest),
            framework_label(&project)
        ),
        Ok(None) => format!(
            "None of the package frameworks are compatible with the {} project framework.",
            framework_label(&project)
        ),
    };
    join(vec![line])
}

pub fn framework_precedence(precedence: &FrameworkPrecedenceService, input: &str) -> String {
    match precedence.precedence(input) {
        Err(PrecedenceError::Parse(e)) => join(vec![e.to_string()]),
        Err(PrecedenceError::NotSupported(e)) => join(vec![e.to_string()]),
        Ok(list) => {
            let mut lines = vec![format!(
                "The {} ({}) project framework has the following package framework precedence list.",
                list.project.dotnet_framework_name(),
                list.project.short_folder_name()
            )];
            lines.extend(list.frameworks.iter().map(|framework| {
                format!(
                    "{} ({})",
                    framework.dotnet_framework_name(),
                    framework.short_folder_name()
                )
            }));
            join(lines)
        }
    }
}

pub fn parse_version(tools: &ToolsService, input: &str) -> String {
    let version = match tools.parse_version(input) {
        Ok(version) => version,
        Err(e) => return join(vec![e.to_string()]),
    };

    let normalized = match version.normalized_string() {
        Ok(normalized) => format!("The result of ToNormalizedString() is {}.", normalized),
        Err(not_supported) => not_supported.to_string(),
    };
    let full = match version.full_string() {
        Ok(full) => format!("The result of ToFullString() is {}.", full),
        Err(not_supported) => not_supported.to_string(),
    };
    let semver2 = match version.is_semver2() {
        Ok(true) => "The version is SemVer 2.0.0.".to_string(),
        Ok(false) => "The version is not SemVer 2.0.0.".to_string(),
        Err(not_supported) => not_supported.to_string(),
    };
    let prerelease = if version.is_prerelease() {
        "The version is a prerelease."
    } else {
        "The version is not a prerelease."
    };

    join(vec![
        format!("The result of ToString() is {}.", version),
        normalized,
        full,
        format!("The revision is {}.", version.revision()),
        semver2,
        prerelease.to_string(),
    ])
}

pub fn version_comparison(tools: &ToolsService, a: &str, b: &str) -> String {
    let (a, b) = match (tools.parse_version(a), tools.parse_version(b)) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return join(vec![e.to_string()]),
    };

    let symbol = match tools.compare_versions(&a, &b) {
        Ordering::Less => "<",
        Ordering::Equal => "=",
        Ordering::Greater => ">",
    };
    join(vec![format!(
        "{} {} {}.",
        version_label(&a),
        symbol,
        version_label(&b)
    )])
}

pub fn sort_versions(tools: &ToolsService, input: &str) -> String {
    let versions: Vec<Version> = match tools.parse_all(&split_lines(input)) {
        Ok(versions) => versions,
        Err(e) => return join(vec![e.to_string()]),
    };

    join(
        tools
            .sort_versions(versions)
            .iter()
            .map(version_label)
            .collect(),
    )
}

pub fn parse_version_range(tools: &ToolsService, input: &str) -> String {
    match tools.parse_version_range(input) {
        Ok(range) => join(vec![format!(
            "The normalized version range is {}.",
            range.normalized_string()
        )]),
        Err(e) => join(vec![e.to_string()]),
    }
}

pub fn version_satisfies(tools: &ToolsService, range: &str, version: &str) -> String {
    let (range, version) = match (tools.parse_version_range(range), tools.parse_version(version)) {
        (Ok(range), Ok(version)) => (range, version),
        (Err(e), _) | (_, Err(e)) => return join(vec![e.to_string()]),
    };

    let verb = if tools.satisfies(&range, &version) {
        "satisfies"
    } else {
        "does not satisfy"
    };
    join(vec![format!(
        "{} {} {}.",
        version_label(&version),
        verb,
        range_label(&range)
    )])
}

pub fn find_best_version_match(tools: &ToolsService, range: &str, versions: &str) -> String {
    let range = match tools.parse_version_range(range) {
        Ok(range) => range,
        Err(e) => return join(vec![e.to_string()]),
    };
    let versions: Vec<Version> = match tools.parse_all(&split_lines(versions)) {
        Ok(versions) => versions,
        Err(e) => return join(vec![e.to_string()]),
    };

    let line = match tools.find_best_match(&range, &versions) {
        Err(not_supported) => not_supported.to_string(),
        Ok(Some(best)) => format!(
            "The {} version is the best match to the {} version range.",
            version_label(best),
            range_label(&range)
        ),
        Ok(None) => format!(
            "None of the versions satisfy the {} version range.",
            range_label(&range)
        ),
    };
    join(vec![line])
}
