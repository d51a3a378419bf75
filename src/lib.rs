//! # StackScope
//!
//! Profiles a source tree: counts code, comment and blank lines per language,
//! classifies the languages found as frontend, backend, desktop or other, and
//! fingerprints frameworks and components (with versions) from declarative
//! YAML rules.
//!
//! ## Features
//!
//! - **Line Counting**: a worker pool counts files concurrently, one aggregator folds the totals
//! - **Language Classification**: static categories plus dynamic ones from dependencies and markers
//! - **Framework Detection**: path and content rules, evaluated against an in-memory file index
//! - **Custom Rules**: a rules directory can add to or override the built-in catalog
//!
//! ## Example
//!
//! ```rust,no_run
//! use stackscope::analyze;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = analyze(Path::new("./my-project"), None)?;
//! for framework in &report.detection.frameworks {
//!     println!("{} {}", framework.name, framework.version);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod common;
pub mod config;
pub mod error;

pub use analyzer::{analyze_project, AnalysisConfig, RuleStore, StackReport, StackSummary};
pub use error::{Result, StackScopeError};

use std::path::Path;

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Analyzes `path` with default settings, optionally layering the rules in `rules_dir`.
pub fn analyze(path: &Path, rules_dir: Option<&Path>) -> Result<StackReport> {
    let store = RuleStore::load(rules_dir)?;
    analyze_project(path, &store, &AnalysisConfig::default())
}
