//! # Rule Store
//!
//! Declarative language definitions and framework/component rules. Defaults
//! are compiled into the binary; a user rules directory can add to or
//! override them.

use crate::analyzer::{Category, RuleType};
use crate::error::RuleError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

pub mod catalog;
pub mod embedded;
pub mod loader;

pub use catalog::{FrameworkCatalog, LanguageCatalog, RuleMetadata};
pub use loader::{LoadMode, NamedRule};

/// A framework or component and the evidence that reveals it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Framework {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_rule_type")]
    pub rule_type: RuleType,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub category: Category,
    /// Alternatives: the first rule that holds wins.
    #[serde(default)]
    pub rules: Vec<FrameRule>,
    #[serde(default, rename = "version", alias = "versions")]
    pub versions: Vec<VersionExtractor>,
}

fn default_rule_type() -> RuleType {
    RuleType::Framework
}

impl Framework {
    /// Override identity.
    pub fn key(&self) -> (&str, RuleType, &str) {
        (&self.name, self.rule_type, &self.language)
    }
}

/// Every path must resolve and every content condition must hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FrameRule {
    #[serde(default)]
    pub paths: Vec<String>,
    /// File pattern → keywords that must all appear in one of its files.
    #[serde(default, alias = "contents")]
    pub file_contents: BTreeMap<String, Vec<String>>,
}

impl FrameRule {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.file_contents.is_empty()
    }

    /// First path (or content pattern) of the rule, used in listings.
    pub fn headline(&self) -> Option<&str> {
        self.paths
            .first()
            .or_else(|| self.file_contents.keys().next())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VersionExtractor {
    pub file_pattern: String,
    /// Tried in order; each needs exactly one capture group.
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Comment syntax, file associations and categories of one language.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LanguageDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub line_comments: Vec<String>,
    /// `[open, close]` pairs.
    #[serde(default)]
    pub multi_line: Vec<(String, String)>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub filenames: Vec<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub dynamic: Vec<DynamicCategory>,
}

/// Grants `category` when any dependency or any file pattern is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DynamicCategory {
    pub category: Category,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub file_patterns: Vec<String>,
}

impl NamedRule for Framework {
    fn rule_name(&self) -> &str {
        &self.name
    }
}

impl NamedRule for LanguageDefinition {
    fn rule_name(&self) -> &str {
        &self.name
    }
}

/// Language and framework catalogs used by one analysis.
#[derive(Debug, Clone)]
pub struct RuleStore {
    pub languages: LanguageCatalog,
    pub frameworks: FrameworkCatalog,
}

impl RuleStore {
    /// The built-in catalogs only.
    pub fn embedded() -> Self {
        Self {
            languages: LanguageCatalog::embedded().clone(),
            frameworks: FrameworkCatalog::embedded().clone(),
        }
    }

    /// Built-in catalogs, plus overrides from `rules_dir` when given.
    pub fn load(rules_dir: Option<&Path>) -> Result<Self, RuleError> {
        let mut store = Self::embedded();
        if let Some(dir) = rules_dir {
            store.apply_overrides(dir)?;
        }
        Ok(store)
    }

    /// Loads `*.yml`/`*.yaml` framework rules from `dir` and language
    /// definitions from `dir/languages`.
    pub fn apply_overrides(&mut self, dir: &Path) -> Result<(), RuleError> {
        if !dir.is_dir() {
            return Err(RuleError::Read {
                path: dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "rules directory does not exist"),
            });
        }

        let frameworks: Vec<Framework> = loader::load_dir(dir, LoadMode::Strict)?;
        let framework_count = frameworks.len();
        for framework in frameworks {
            debug!("User rule: {} ({})", framework.name, framework.language);
            self.frameworks.add_rule(framework);
        }

        let language_dir = dir.join("languages");
        let mut language_count = 0;
        if language_dir.is_dir() {
            let definitions: Vec<LanguageDefinition> =
                loader::load_dir(&language_dir, LoadMode::Strict)?;
            language_count = definitions.len();
            for definition in definitions {
                self.languages.add_definition(definition);
            }
        }

        info!(
            "Loaded {} framework rules and {} language definitions from {}",
            framework_count,
            language_count,
            dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_store_is_populated() {
        let store = RuleStore::embedded();
        assert!(store.languages.get("go").is_some());
        assert!(store.frameworks.get("Gin", RuleType::Framework).is_some());
        assert!(store.frameworks.get("Express", RuleType::Framework).is_some());
    }

    #[test]
    fn test_user_rules_override_embedded_rule() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("custom.yml"),
            r#"
name: Spring Boot
type: framework
language: Java
category: backend
rules:
  - paths:
      - custom-boot.marker
"#,
        )
        .unwrap();

        let embedded_count = FrameworkCatalog::embedded().len();
        let store = RuleStore::load(Some(temp_dir.path())).unwrap();

        assert_eq!(store.frameworks.len(), embedded_count);
        let spring = store
            .frameworks
            .get("Spring Boot", RuleType::Framework)
            .unwrap();
        assert_eq!(spring.rules.len(), 1);
        assert_eq!(spring.rules[0].paths, vec!["custom-boot.marker".to_string()]);
    }

    #[test]
    fn test_user_rules_add_new_entries_and_languages() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("inhouse.yaml"),
            concat!(
                "- name: InHouse\n  type: component\n  language: Go\n",
                "  rules:\n    - paths: [inhouse.toml]\n",
            ),
        )
        .unwrap();
        fs::create_dir(temp_dir.path().join("languages")).unwrap();
        fs::write(
            temp_dir.path().join("languages/extra.yml"),
            "name: Gleam\nextensions: [.gleam]\nline_comments: [\"//\"]\ncategory: backend\n",
        )
        .unwrap();

        let store = RuleStore::load(Some(temp_dir.path())).unwrap();

        assert!(store.frameworks.get("InHouse", RuleType::Component).is_some());
        let gleam = store.languages.by_extension(".gleam").unwrap();
        assert_eq!(gleam.name, "Gleam");
        assert_eq!(gleam.category, Category::Backend);
    }

    #[test]
    fn test_missing_user_directory_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(matches!(
            RuleStore::load(Some(&missing)),
            Err(RuleError::Read { .. })
        ));
    }

    #[test]
    fn test_malformed_user_rule_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("broken.yml"),
            "name: Broken\nrules: not-a-list\n",
        )
        .unwrap();

        assert!(matches!(
            RuleStore::load(Some(temp_dir.path())),
            Err(RuleError::Parse { .. })
        ));
    }
}
