//! Catalog of well-known target frameworks used to enumerate precedence candidates

#[cfg(test)]
use mockall::automock;

/// Short folder names NuGet has shipped knowledge of, oldest first
pub const KNOWN_FRAMEWORKS: &[&str] = &[
    "net11",
    "net20",
    "net35",
    "net40",
    "net403",
    "net45",
    "net451",
    "net452",
    "net46",
    "net461",
    "net462",
    "net47",
    "net471",
    "net472",
    "net48",
    "net481",
    "netcore45",
    "netcore451",
    "netcoreapp1.0",
    "netcoreapp1.1",
    "netcoreapp2.0",
    "netcoreapp2.1",
    "netcoreapp2.2",
    "netcoreapp3.0",
    "netcoreapp3.1",
    "net5.0",
    "net6.0",
    "net7.0",
    "net8.0",
    "net9.0",
    "netstandard1.0",
    "netstandard1.1",
    "netstandard1.2",
    "netstandard1.3",
    "netstandard1.4",
    "netstandard1.5",
    "netstandard1.6",
    "netstandard2.0",
    "netstandard2.1",
    "portable-net45+win8",
    "sl4",
    "sl5",
    "uap10.0",
    "win8",
    "win81",
    "wp8",
    "wp81",
    "wpa81",
    "monoandroid",
    "xamarinios",
];

/// Source of framework descriptors, in enumeration order
#[cfg_attr(test, automock)]
pub trait FrameworkList: Send + Sync {
    fn frameworks(&self) -> Vec<String>;
}

#[derive(Debug, Clone)]
pub struct StaticFrameworkList {
    frameworks: Vec<String>,
}

impl StaticFrameworkList {
    pub fn new(frameworks: Vec<String>) -> Self {
        Self { frameworks }
    }
}

impl Default for StaticFrameworkList {
    fn default() -> Self {
        Self::new(KNOWN_FRAMEWORKS.iter().map(|f| f.to_string()).collect())
    }
}

impl FrameworkList for StaticFrameworkList {
    fn frameworks(&self) -> Vec<String> {
        self.frameworks.clone()
    }
}
