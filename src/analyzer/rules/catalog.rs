use crate::analyzer::rules::{embedded, Framework, LanguageDefinition};
use crate::analyzer::RuleType;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Language definitions with name, extension and file name lookups.
#[derive(Debug, Clone, Default)]
pub struct LanguageCatalog {
    definitions: Vec<LanguageDefinition>,
    by_name: AHashMap<String, usize>,
    by_extension: AHashMap<String, usize>,
    by_filename: AHashMap<String, usize>,
}

impl LanguageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = LanguageDefinition>) -> Self {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.add_definition(definition);
        }
        catalog
    }

    /// The built-in catalog, parsed on first use.
    pub fn embedded() -> &'static LanguageCatalog {
        &embedded::LANGUAGES
    }

    /// Adds a definition, replacing any existing one with the same name
    /// (case-insensitive). Later definitions claim shared extensions.
    pub fn add_definition(&mut self, mut definition: LanguageDefinition) {
        definition.extensions = definition
            .extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .filter(|ext| ext.len() > 1)
            .collect();
        definition.line_comments.retain(|marker| !marker.is_empty());
        definition
            .multi_line
            .retain(|(open, close)| !open.is_empty() && !close.is_empty());

        let key = definition.name.to_lowercase();
        match self.by_name.get(&key).copied() {
            Some(position) => {
                self.definitions[position] = definition;
                self.rebuild_lookups();
            }
            None => {
                let position = self.definitions.len();
                self.register(position, &definition);
                self.by_name.insert(key, position);
                self.definitions.push(definition);
            }
        }
    }

    fn register(&mut self, position: usize, definition: &LanguageDefinition) {
        for ext in &definition.extensions {
            self.by_extension.insert(ext.clone(), position);
        }
        for filename in &definition.filenames {
            self.by_filename.insert(filename.clone(), position);
        }
    }

    fn rebuild_lookups(&mut self) {
        self.by_extension.clear();
        self.by_filename.clear();
        let definitions = std::mem::take(&mut self.definitions);
        for (position, definition) in definitions.iter().enumerate() {
            self.register(position, definition);
        }
        self.definitions = definitions;
    }

    /// Case-insensitive lookup by language name.
    pub fn get(&self, name: &str) -> Option<&LanguageDefinition> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&position| &self.definitions[position])
    }

    /// `ext` includes the leading dot; case is ignored.
    pub fn by_extension(&self, ext: &str) -> Option<&LanguageDefinition> {
        self.by_extension
            .get(&ext.to_lowercase())
            .map(|&position| &self.definitions[position])
    }

    /// Exact file name match, e.g. `Makefile`.
    pub fn by_filename(&self, name: &str) -> Option<&LanguageDefinition> {
        self.by_filename
            .get(name)
            .map(|&position| &self.definitions[position])
    }

    /// Resolves a file by extension first, then by exact file name.
    pub fn resolve(&self, file_name: &str, ext: &str) -> Option<&LanguageDefinition> {
        if !ext.is_empty() {
            if let Some(definition) = self.by_extension(ext) {
                return Some(definition);
            }
        }
        self.by_filename(file_name)
    }

    pub fn definitions(&self) -> &[LanguageDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

/// Summary of one detectable framework or component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleMetadata {
    pub name: String,
    pub language: String,
    /// First path of each alternative rule, in rule order.
    pub rules: Vec<String>,
}

/// Ordered framework and component rules.
#[derive(Debug, Clone, Default)]
pub struct FrameworkCatalog {
    rules: Vec<Framework>,
}

impl FrameworkCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: impl IntoIterator<Item = Framework>) -> Self {
        let mut catalog = Self::new();
        for rule in rules {
            catalog.add_rule(rule);
        }
        catalog
    }

    pub fn embedded() -> &'static FrameworkCatalog {
        &embedded::FRAMEWORKS
    }

    /// Replaces the entry with the same (name, type, language) in place,
    /// otherwise appends.
    pub fn add_rule(&mut self, rule: Framework) {
        match self.rules.iter().position(|existing| existing.key() == rule.key()) {
            Some(position) => self.rules[position] = rule,
            None => self.rules.push(rule),
        }
    }

    pub fn rules(&self) -> &[Framework] {
        &self.rules
    }

    pub fn get(&self, name: &str, rule_type: RuleType) -> Option<&Framework> {
        self.rules
            .iter()
            .find(|rule| rule.name == name && rule.rule_type == rule_type)
    }

    /// Rules whose language is one of `languages` (case-insensitive).
    pub fn for_languages<'a>(
        &'a self,
        languages: &'a [String],
    ) -> impl Iterator<Item = &'a Framework> {
        self.rules.iter().filter(move |rule| {
            languages
                .iter()
                .any(|language| language.eq_ignore_ascii_case(&rule.language))
        })
    }

    /// Listing of every rule of `rule_type`, sorted by name.
    pub fn supported(&self, rule_type: RuleType) -> Vec<RuleMetadata> {
        let mut supported: Vec<RuleMetadata> = self
            .rules
            .iter()
            .filter(|rule| rule.rule_type == rule_type)
            .map(|rule| RuleMetadata {
                name: rule.name.clone(),
                language: rule.language.clone(),
                rules: rule
                    .rules
                    .iter()
                    .filter_map(|frame| frame.headline().map(str::to_string))
                    .collect(),
            })
            .collect();
        supported.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.language.cmp(&b.language)));
        supported
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::FrameRule;
    use crate::analyzer::Category;

    fn language(name: &str, extensions: &[&str], filenames: &[&str]) -> LanguageDefinition {
        LanguageDefinition {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            filenames: filenames.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    fn framework(name: &str, language: &str, first_path: &str) -> Framework {
        Framework {
            name: name.to_string(),
            rule_type: RuleType::Framework,
            language: language.to_string(),
            category: Category::Backend,
            rules: vec![FrameRule {
                paths: vec![first_path.to_string()],
                ..Default::default()
            }],
            versions: Vec::new(),
        }
    }

    #[test]
    fn test_language_lookups() {
        let catalog = LanguageCatalog::from_definitions(vec![
            language("Go", &[".go"], &[]),
            language("Makefile", &["mk"], &["Makefile"]),
        ]);

        assert_eq!(catalog.get("GO").unwrap().name, "Go");
        assert_eq!(catalog.by_extension(".Go").unwrap().name, "Go");
        assert_eq!(catalog.by_extension(".mk").unwrap().name, "Makefile");
        assert_eq!(catalog.resolve("Makefile", "").unwrap().name, "Makefile");
        assert!(catalog.resolve("makefile", "").is_none());
        assert!(catalog.resolve("notes.txt", ".txt").is_none());
    }

    #[test]
    fn test_language_override_replaces_lookups() {
        let mut catalog = LanguageCatalog::from_definitions(vec![
            language("C", &[".c", ".h"], &[]),
            language("C++", &[".cpp"], &[]),
        ]);
        catalog.add_definition(language("c", &[".c"], &[]));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("C").unwrap().name, "c");
        assert!(catalog.by_extension(".h").is_none());
        assert_eq!(catalog.by_extension(".cpp").unwrap().name, "C++");
    }

    #[test]
    fn test_add_rule_replaces_by_identity() {
        let mut catalog = FrameworkCatalog::from_rules(vec![
            framework("Gin", "Go", "go.mod"),
            framework("Echo", "Go", "go.mod"),
        ]);
        catalog.add_rule(framework("Gin", "Go", "gin.marker"));
        catalog.add_rule(framework("Gin", "Rust", "Cargo.toml"));

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.rules()[0].rules[0].paths[0], "gin.marker");
        assert_eq!(catalog.rules()[2].language, "Rust");
    }

    #[test]
    fn test_supported_is_sorted_and_filtered() {
        let mut component = framework("GORM", "Go", "go.mod");
        component.rule_type = RuleType::Component;
        let catalog = FrameworkCatalog::from_rules(vec![
            framework("Gin", "Go", "go.mod"),
            framework("Echo", "Go", "main.go"),
            component,
        ]);

        let frameworks = catalog.supported(RuleType::Framework);
        let names: Vec<_> = frameworks.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Echo", "Gin"]);
        assert_eq!(frameworks[0].rules, vec!["main.go".to_string()]);
        assert_eq!(catalog.supported(RuleType::Component).len(), 1);
    }

    #[test]
    fn test_for_languages_is_case_insensitive() {
        let catalog = FrameworkCatalog::from_rules(vec![
            framework("Gin", "Go", "go.mod"),
            framework("Express", "JavaScript", "package.json"),
        ]);
        let languages = vec!["javascript".to_string()];
        let names: Vec<_> = catalog
            .for_languages(&languages)
            .map(|rule| rule.name.as_str())
            .collect();
        assert_eq!(names, vec!["Express"]);
    }
}
