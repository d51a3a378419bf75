use crate::analyzer::file_index::FileIndex;
use crate::analyzer::manifest::ManifestReader;
use crate::analyzer::rules::{LanguageCatalog, LanguageDefinition};
use crate::analyzer::Category;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Languages grouped by category, plus the full and expanded language lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBuckets {
    pub frontend: Vec<String>,
    pub backend: Vec<String>,
    pub desktop: Vec<String>,
    pub other: Vec<String>,
    pub all: Vec<String>,
    pub expanded: Vec<String>,
}

impl CategoryBuckets {
    fn bucket_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Frontend => &mut self.frontend,
            Category::Backend => &mut self.backend,
            Category::Desktop => &mut self.desktop,
            Category::Other => &mut self.other,
        }
    }
}

pub struct LanguageClassifier<'a> {
    catalog: &'a LanguageCatalog,
    manifest: &'a dyn ManifestReader,
}

impl<'a> LanguageClassifier<'a> {
    pub fn new(catalog: &'a LanguageCatalog, manifest: &'a dyn ManifestReader) -> Self {
        Self { catalog, manifest }
    }

    /// Buckets `languages` by their static and dynamic categories.
    ///
    /// The manifest is read once per call. Unknown languages land in `other`.
    pub fn detect_categories(&self, index: &FileIndex, languages: &[String]) -> CategoryBuckets {
        let dependencies = self.manifest.dependencies(index.root_dir());
        let mut buckets = CategoryBuckets::default();

        for language in languages {
            push_unique(&mut buckets.all, language);

            let categories = match self.catalog.get(language) {
                Some(definition) => language_categories(definition, index, &dependencies),
                None => {
                    warn!("No definition for language {}, classifying as other", language);
                    BTreeSet::from([Category::Other])
                }
            };

            debug!("{} -> {:?}", language, categories);
            for category in categories {
                push_unique(buckets.bucket_mut(category), language);
            }
        }

        buckets.expanded = expand_languages(&buckets.all);
        buckets
    }
}

/// Static category plus every dynamic category whose dependencies or file
/// patterns are present.
pub fn language_categories(
    definition: &LanguageDefinition,
    index: &FileIndex,
    dependencies: &HashSet<String>,
) -> BTreeSet<Category> {
    let mut categories = BTreeSet::from([definition.category]);

    for dynamic in &definition.dynamic {
        let by_dependency = dynamic
            .dependencies
            .iter()
            .any(|dep| dependencies.contains(&dep.to_lowercase()));
        let by_file = || {
            dynamic
                .file_patterns
                .iter()
                .any(|pattern| index.has_match(pattern))
        };

        if by_dependency || by_file() {
            categories.insert(dynamic.category);
        }
    }

    categories
}

/// Adds the family language implied by each member:
/// TypeScript, TSX, JSX and Vue imply JavaScript; SCSS and Less imply CSS;
/// Kotlin implies Java; C++ implies C.
pub fn expand_languages(languages: &[String]) -> Vec<String> {
    let mut expanded = Vec::with_capacity(languages.len());

    for language in languages {
        push_unique(&mut expanded, language);
        if let Some(family) = language_family(language) {
            push_unique(&mut expanded, family);
        }
    }

    expanded
}

fn language_family(language: &str) -> Option<&'static str> {
    match language.to_ascii_lowercase().as_str() {
        "typescript" | "tsx" | "jsx" | "vue" => Some("JavaScript"),
        "scss" | "less" => Some("CSS"),
        "kotlin" => Some("Java"),
        "c++" => Some("C"),
        _ => None,
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}
