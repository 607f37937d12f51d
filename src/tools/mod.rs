//! Multi-release NuGet tools layer
//!
//! This module loads many releases of the NuGet client libraries side by side,
//! each in its own isolation context, and exposes them behind one stable API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Factory   │────▶│   Catalog   │────▶│   Packages  │
//! │ (memoize)   │     │ (releases)  │     │ (on disk)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       ▲
//!        ▼                                       │
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Services   │────▶│  Adapters   │◀────│   Loader    │
//! │(tools,prec.)│     │ (bind once) │     │ (isolation) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`factory`]: Resolves version strings and memoizes per-release services
//! - [`catalog`]: Locally available releases and their epochs
//! - [`loader`]: Opens a release's packages into an isolation context, once
//! - [`adapter`]: Symbol binding and handle plumbing shared by the adapters
//! - [`adapters`]: Version, version range and framework adapters
//! - [`service`]: Parse, compare and match operations for one release
//! - [`precedence`]: Framework precedence lists for one release
//! - [`frameworks`]: Known framework short names
//! - [`package`]: Package retrieval traits
//! - [`packages`]: Concrete package stores
//! - [`single_flight`]: At-most-once async construction with eviction on failure
//! - [`release`]: Release versions and epochs
//! - [`error`]: Error and outcome types

pub mod adapter;
pub mod adapters;
pub mod catalog;
pub mod error;
pub mod factory;
pub mod frameworks;
pub mod loader;
pub mod package;
pub mod packages;
pub mod precedence;
pub mod release;
pub mod service;
pub mod single_flight;

pub use factory::{DirectToolsFactory, ToolsFactory};
pub use precedence::{FrameworkPrecedenceService, PrecedenceList};
pub use release::{Epoch, Release};
pub use service::ToolsService;
