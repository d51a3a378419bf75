//! # Analyzer Module
//!
//! Profiles a project directory:
//! - counts code, comment and blank lines per language
//! - classifies languages as frontend, backend, desktop or other
//! - detects frameworks and components from declarative rules

use crate::error::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub mod code_counter;
pub mod display;
pub mod file_index;
pub mod framework_detector;
pub mod language_classifier;
pub mod line_counter;
pub mod manifest;
pub mod pattern_matcher;
pub mod report;
pub mod rules;

pub use code_counter::{CodeCounter, CountOutcome, LangSummary};
pub use file_index::FileIndex;
pub use framework_detector::FrameworkDetector;
pub use language_classifier::{expand_languages, CategoryBuckets, LanguageClassifier};
pub use line_counter::{CommentSyntaxCounter, FileStats, LineCounter};
pub use manifest::{ManifestReader, PackageJsonManifest};
pub use report::{StackReport, StackSummary};
pub use rules::RuleStore;

/// Where a language or technology sits in an application.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Frontend,
    Backend,
    Desktop,
    #[default]
    #[serde(other)]
    Other,
}

impl Category {
    /// Display order of the category buckets.
    pub const ALL: [Category; 4] = [
        Category::Frontend,
        Category::Backend,
        Category::Desktop,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Frontend => "frontend",
            Category::Backend => "backend",
            Category::Desktop => "desktop",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Framework,
    Component,
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleType::Framework => f.write_str("framework"),
            RuleType::Component => f.write_str("component"),
        }
    }
}

/// Line totals of one language across the project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LanguageInfo {
    pub name: String,
    pub files: usize,
    pub code_lines: u64,
    pub comment_lines: u64,
    pub blank_lines: u64,
}

impl LanguageInfo {
    pub fn total_lines(&self) -> u64 {
        self.code_lines + self.comment_lines + self.blank_lines
    }
}

/// Line counts and language classification of a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CodeProfile {
    pub path: PathBuf,
    pub total_files: usize,
    pub total_lines: u64,
    pub error_files: usize,
    /// Ordered by code lines, largest first.
    pub language_infos: Vec<LanguageInfo>,
    pub frontend_languages: Vec<String>,
    pub backend_languages: Vec<String>,
    pub desktop_languages: Vec<String>,
    pub other_languages: Vec<String>,
    pub languages: Vec<String>,
    pub expanded_languages: Vec<String>,
}

impl CodeProfile {
    /// Profile with totals and language infos, before classification.
    pub fn from_counts(path: PathBuf, summaries: Vec<LangSummary>, error_files: usize) -> Self {
        let mut language_infos: Vec<LanguageInfo> =
            summaries.into_iter().map(LanguageInfo::from).collect();
        language_infos.sort_by(|a, b| {
            b.code_lines
                .cmp(&a.code_lines)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self {
            path,
            total_files: language_infos.iter().map(|info| info.files).sum(),
            total_lines: language_infos.iter().map(LanguageInfo::total_lines).sum(),
            error_files,
            language_infos,
            ..Default::default()
        }
    }

    pub fn language_names(&self) -> Vec<String> {
        self.language_infos
            .iter()
            .map(|info| info.name.clone())
            .collect()
    }

    pub fn apply_categories(&mut self, buckets: CategoryBuckets) {
        self.frontend_languages = buckets.frontend;
        self.backend_languages = buckets.backend;
        self.desktop_languages = buckets.desktop;
        self.other_languages = buckets.other;
        self.languages = buckets.all;
        self.expanded_languages = buckets.expanded;
    }

    pub fn languages_in(&self, category: Category) -> &[String] {
        match category {
            Category::Frontend => &self.frontend_languages,
            Category::Backend => &self.backend_languages,
            Category::Desktop => &self.desktop_languages,
            Category::Other => &self.other_languages,
        }
    }
}

/// A framework or component found in the project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedItem {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: RuleType,
    pub language: String,
    /// Empty when no version could be extracted.
    pub version: String,
    pub category: Category,
    pub evidence: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetectionInfo {
    pub frameworks: Vec<DetectedItem>,
    pub components: Vec<DetectedItem>,
}

impl DetectionInfo {
    pub fn push(&mut self, item: DetectedItem) {
        match item.item_type {
            RuleType::Framework => self.frameworks.push(item),
            RuleType::Component => self.components.push(item),
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &DetectedItem> {
        self.frameworks.iter().chain(self.components.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.frameworks.is_empty() && self.components.is_empty()
    }
}

/// Tuning of a single analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Counting workers; 0 picks `max(1, cpus / 4)`.
    pub worker_threads: usize,
    /// Files larger than this are only partially read for content matching.
    pub large_file_threshold: u64,
    /// Bytes read from a large file.
    pub truncated_read_limit: u64,
    pub show_progress: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            large_file_threshold: 5 * 1024 * 1024,
            truncated_read_limit: 1024 * 1024,
            show_progress: false,
        }
    }
}

/// Profiles the project at `path` with the default line counter and manifest reader.
pub fn analyze_project(
    path: &Path,
    store: &RuleStore,
    config: &AnalysisConfig,
) -> Result<StackReport> {
    analyze_project_with(path, store, config, &CommentSyntaxCounter, &PackageJsonManifest)
}

pub fn analyze_project_with(
    path: &Path,
    store: &RuleStore,
    config: &AnalysisConfig,
    counter: &dyn LineCounter,
    manifest: &dyn ManifestReader,
) -> Result<StackReport> {
    let start = Instant::now();
    info!("Starting analysis of {}", path.display());

    let outcome = CodeCounter::new(&store.languages, counter, config).count(path)?;
    let CountOutcome {
        root,
        index,
        summaries,
        error_files,
    } = outcome;

    let mut profile = CodeProfile::from_counts(root, summaries, error_files);
    let classifier = LanguageClassifier::new(&store.languages, manifest);
    let buckets = classifier.detect_categories(&index, &profile.language_names());
    profile.apply_categories(buckets);

    let detection = FrameworkDetector::new(&store.frameworks, config)
        .detect_frameworks(&index, &profile.expanded_languages);

    info!(
        "Analysis of {} finished in {:?}: {} files, {} frameworks, {} components",
        profile.path.display(),
        start.elapsed(),
        profile.total_files,
        detection.frameworks.len(),
        detection.components.len()
    );

    Ok(StackReport::new(profile, detection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_profile_counts_and_excludes_unknown_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(
            root.join("main.go"),
            "package main\n\n// Comment\nfunc main() {\n    println(\"Hello\")\n}\n",
        )
        .unwrap();
        fs::write(
            root.join("app.js"),
            "/*\n Block comment\n*/\nconsole.log(\"Hi\"); // Line comment\n",
        )
        .unwrap();
        fs::write(root.join("unknown.xyz"), "???\n").unwrap();

        let store = RuleStore::embedded();
        let report = analyze_project(root, &store, &AnalysisConfig::default()).unwrap();
        let profile = &report.code_profile;

        assert_eq!(profile.total_files, 2);
        assert_eq!(profile.total_lines, 10);
        assert_eq!(profile.error_files, 0);

        let go = profile.language_infos.iter().find(|l| l.name == "Go").unwrap();
        assert_eq!((go.code_lines, go.comment_lines, go.blank_lines), (4, 1, 1));
        let js = profile
            .language_infos
            .iter()
            .find(|l| l.name == "JavaScript")
            .unwrap();
        assert_eq!((js.code_lines, js.comment_lines, js.blank_lines), (1, 3, 0));
    }

    #[test]
    fn test_gin_project() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(
            root.join("go.mod"),
            "module example.com/api\n\ngo 1.21\n\nrequire github.com/gin-gonic/gin v1.9.1\n",
        )
        .unwrap();
        fs::write(root.join("main.go"), "package main\n\nfunc main() {}\n").unwrap();

        let store = RuleStore::embedded();
        let report = analyze_project(root, &store, &AnalysisConfig::default()).unwrap();

        let gin = report
            .detection
            .frameworks
            .iter()
            .find(|f| f.name == "Gin")
            .unwrap();
        assert_eq!(gin.version, "1.9.1");
        assert_eq!(gin.category, Category::Backend);
        assert_eq!(report.code_profile.backend_languages, vec!["Go".to_string()]);
        assert!(report.code_profile.frontend_languages.is_empty());
    }

    #[test]
    fn test_version_comes_from_first_manifest_in_path_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for (dir, version) in [("zz", "v1.0.4"), ("mm", "v1.0.3"), ("aa", "v1.0.2")] {
            fs::create_dir_all(root.join(dir)).unwrap();
            fs::write(
                root.join(dir).join("go.mod"),
                format!(
                    "module example.com/{}\n\nrequire github.com/gin-gonic/gin {}\n",
                    dir, version
                ),
            )
            .unwrap();
        }
        fs::write(root.join("main.go"), "package main\n").unwrap();

        let store = RuleStore::embedded();
        let report = analyze_project(root, &store, &AnalysisConfig::default()).unwrap();

        let gin = report
            .detection
            .frameworks
            .iter()
            .find(|f| f.name == "Gin")
            .unwrap();
        assert_eq!(gin.version, "1.0.2");
    }

    #[test]
    fn test_data_files_land_in_other() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("main.go"), "package main\n").unwrap();
        fs::write(root.join("config.yaml"), "# settings\nport: 8080\n").unwrap();
        fs::write(root.join("data.json"), "{\"a\": 1}\n").unwrap();

        let store = RuleStore::embedded();
        let report = analyze_project(root, &store, &AnalysisConfig::default()).unwrap();
        let profile = &report.code_profile;

        assert_eq!(profile.total_files, 3);
        assert_eq!(profile.backend_languages, vec!["Go".to_string()]);
        assert!(profile.other_languages.contains(&"YAML".to_string()));
        assert!(profile.other_languages.contains(&"JSON".to_string()));
        let yaml = profile.language_infos.iter().find(|l| l.name == "YAML").unwrap();
        assert_eq!((yaml.code_lines, yaml.comment_lines), (1, 1));
    }

    #[test]
    fn test_express_project() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(
            root.join("package.json"),
            r#"{"dependencies": {"express": "^4.18.2"}}"#,
        )
        .unwrap();
        fs::write(root.join("server.js"), "const express = require('express');\n").unwrap();

        let store = RuleStore::embedded();
        let report = analyze_project(root, &store, &AnalysisConfig::default()).unwrap();

        let express = report
            .detection
            .frameworks
            .iter()
            .find(|f| f.name == "Express")
            .unwrap();
        assert_eq!(express.category, Category::Backend);
        assert_eq!(express.language, "JavaScript");
        assert_eq!(express.version, "4.18.2");
        assert!(report
            .code_profile
            .backend_languages
            .contains(&"JavaScript".to_string()));
    }

    #[test]
    fn test_invalid_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        let store = RuleStore::embedded();
        assert!(analyze_project(&missing, &store, &AnalysisConfig::default()).is_err());
    }

    #[test]
    fn test_category_serde_falls_back_to_other() {
        let category: Category = serde_yaml::from_str("mobile").unwrap();
        assert_eq!(category, Category::Other);
        let category: Category = serde_yaml::from_str("frontend").unwrap();
        assert_eq!(category, Category::Frontend);
    }
}
