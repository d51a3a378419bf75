use crate::error::RuleError;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// How malformed documents are treated while loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Log and skip. Used for the built-in rules.
    Lenient,
    /// Fail the load. Used for user-supplied rules.
    Strict,
}

/// Rules are identified by name; unnamed documents are ignored.
pub trait NamedRule {
    fn rule_name(&self) -> &str;
}

/// Parses a rule file that is either one YAML array of rules or a stream of
/// `---`-separated documents, each holding a rule or an array of rules.
pub fn parse_documents<T>(content: &str, source: &Path, mode: LoadMode) -> Result<Vec<T>, RuleError>
where
    T: DeserializeOwned + NamedRule,
{
    if let Ok(items) = serde_yaml::from_str::<Vec<T>>(content) {
        if items.first().is_some_and(|item| !item.rule_name().is_empty()) {
            return Ok(named_only(items));
        }
    }

    let mut rules = Vec::new();
    for (idx, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let value = match Value::deserialize(document) {
            Ok(value) => value,
            Err(e) => {
                reject(mode, source, idx, &e.to_string())?;
                continue;
            }
        };

        match value {
            Value::Null => continue,
            Value::Sequence(entries) => {
                for entry in entries {
                    collect_one(entry, source, idx, mode, &mut rules)?;
                }
            }
            other => collect_one(other, source, idx, mode, &mut rules)?,
        }
    }

    Ok(named_only(rules))
}

/// Reads and parses one rule file.
pub fn load_file<T>(path: &Path, mode: LoadMode) -> Result<Vec<T>, RuleError>
where
    T: DeserializeOwned + NamedRule,
{
    let content = fs::read_to_string(path).map_err(|source| RuleError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_documents(&content, path, mode)
}

/// Loads every `*.yml` and `*.yaml` file directly inside `dir`, in path order.
pub fn load_dir<T>(dir: &Path, mode: LoadMode) -> Result<Vec<T>, RuleError>
where
    T: DeserializeOwned + NamedRule,
{
    let mut files = Vec::new();
    for extension in ["yml", "yaml"] {
        files.extend(rule_files(dir, extension)?);
    }
    files.sort();

    let mut rules = Vec::new();
    for file in files {
        let loaded: Vec<T> = load_file(&file, mode)?;
        debug!("Loaded {} rules from {}", loaded.len(), file.display());
        rules.extend(loaded);
    }
    Ok(rules)
}

fn rule_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, RuleError> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{}/*.{}", escaped, extension);
    let entries = glob::glob(&pattern).map_err(|e| RuleError::Pattern(e.to_string()))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => {
                return Err(RuleError::Read {
                    path: e.path().to_path_buf(),
                    source: e.into_error(),
                })
            }
        }
    }
    Ok(files)
}

fn collect_one<T>(
    value: Value,
    source: &Path,
    idx: usize,
    mode: LoadMode,
    rules: &mut Vec<T>,
) -> Result<(), RuleError>
where
    T: DeserializeOwned,
{
    match serde_yaml::from_value::<T>(value) {
        Ok(rule) => rules.push(rule),
        Err(e) => reject(mode, source, idx, &e.to_string())?,
    }
    Ok(())
}

fn reject(mode: LoadMode, source: &Path, idx: usize, reason: &str) -> Result<(), RuleError> {
    match mode {
        LoadMode::Lenient => {
            warn!(
                "Skipping malformed rule document #{} in {}: {}",
                idx + 1,
                source.display(),
                reason
            );
            Ok(())
        }
        LoadMode::Strict => Err(RuleError::Parse {
            path: source.to_path_buf(),
            reason: format!("document #{}: {}", idx + 1, reason),
        }),
    }
}

fn named_only<T: NamedRule>(items: Vec<T>) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| !item.rule_name().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::{Framework, LanguageDefinition};
    use crate::analyzer::RuleType;

    fn source() -> PathBuf {
        PathBuf::from("test.yml")
    }

    #[test]
    fn test_array_form() {
        let yaml = r#"
- name: Gin
  type: framework
  language: Go
  rules:
    - paths: [go.mod]
- name: GORM
  type: component
  language: Go
"#;
        let rules: Vec<Framework> = parse_documents(yaml, &source(), LoadMode::Strict).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].rule_type, RuleType::Component);
    }

    #[test]
    fn test_multi_document_form_skips_empty_and_unnamed() {
        let yaml = r#"
name: Gin
language: Go
---
---
language: Go
type: framework
---
name: Echo
language: Go
"#;
        let rules: Vec<Framework> = parse_documents(yaml, &source(), LoadMode::Strict).unwrap();
        let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Gin", "Echo"]);
        assert_eq!(rules[0].rule_type, RuleType::Framework);
    }

    #[test]
    fn test_array_with_unnamed_first_entry_is_filtered() {
        let yaml = "- language: Go\n- name: Echo\n  language: Go\n";
        let rules: Vec<Framework> = parse_documents(yaml, &source(), LoadMode::Strict).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "Echo");
    }

    #[test]
    fn test_lenient_mode_skips_malformed_documents() {
        let yaml = r#"
name: Good
extensions: [.good]
---
name: Bad
extensions: 42
---
name: AlsoGood
"#;
        let defs: Vec<LanguageDefinition> =
            parse_documents(yaml, &source(), LoadMode::Lenient).unwrap();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Good", "AlsoGood"]);

        let strict: Result<Vec<LanguageDefinition>, _> =
            parse_documents(yaml, &source(), LoadMode::Strict);
        assert!(strict.is_err());
    }

    #[test]
    fn test_multi_line_pairs_deserialize() {
        let yaml = "name: C\nmulti_line:\n  - [\"/*\", \"*/\"]\n";
        let defs: Vec<LanguageDefinition> =
            parse_documents(yaml, &source(), LoadMode::Strict).unwrap();
        assert_eq!(
            defs[0].multi_line,
            vec![("/*".to_string(), "*/".to_string())]
        );
    }
}
