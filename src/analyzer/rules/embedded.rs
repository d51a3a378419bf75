//! Built-in rule files, compiled into the binary.

use crate::analyzer::rules::loader::{parse_documents, LoadMode};
use crate::analyzer::rules::{Framework, FrameworkCatalog, LanguageCatalog, LanguageDefinition};
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::path::Path;

pub const LANGUAGE_SOURCES: &[(&str, &str)] = &[(
    "languages.yml",
    include_str!("../../../rules/languages/languages.yml"),
)];

pub const FRAMEWORK_SOURCES: &[(&str, &str)] = &[
    ("go.yml", include_str!("../../../rules/frameworks/go.yml")),
    ("javascript.yml", include_str!("../../../rules/frameworks/javascript.yml")),
    ("java.yml", include_str!("../../../rules/frameworks/java.yml")),
    ("python.yml", include_str!("../../../rules/frameworks/python.yml")),
    ("php.yml", include_str!("../../../rules/frameworks/php.yml")),
    ("ruby.yml", include_str!("../../../rules/frameworks/ruby.yml")),
    ("rust.yml", include_str!("../../../rules/frameworks/rust.yml")),
    ("csharp.yml", include_str!("../../../rules/frameworks/csharp.yml")),
    ("mobile.yml", include_str!("../../../rules/frameworks/mobile.yml")),
    ("elixir.yml", include_str!("../../../rules/frameworks/elixir.yml")),
];

pub(crate) static LANGUAGES: Lazy<LanguageCatalog> = Lazy::new(|| {
    let mut catalog = LanguageCatalog::new();
    for (name, content) in LANGUAGE_SOURCES {
        match parse_documents::<LanguageDefinition>(content, Path::new(name), LoadMode::Lenient) {
            Ok(definitions) => definitions
                .into_iter()
                .for_each(|definition| catalog.add_definition(definition)),
            Err(e) => warn!("Built-in language rules {} could not be loaded: {}", name, e),
        }
    }
    debug!("Built-in language catalog: {} definitions", catalog.len());
    catalog
});

pub(crate) static FRAMEWORKS: Lazy<FrameworkCatalog> = Lazy::new(|| {
    let mut catalog = FrameworkCatalog::new();
    for (name, content) in FRAMEWORK_SOURCES {
        match parse_documents::<Framework>(content, Path::new(name), LoadMode::Lenient) {
            Ok(rules) => rules.into_iter().for_each(|rule| catalog.add_rule(rule)),
            Err(e) => warn!("Built-in framework rules {} could not be loaded: {}", name, e),
        }
    }
    debug!("Built-in framework catalog: {} rules", catalog.len());
    catalog
});

#[cfg(test)]
mod tests {
    use super::*;
    use regex::bytes::Regex;

    #[test]
    fn test_builtin_sources_parse_strictly() {
        for (name, content) in LANGUAGE_SOURCES {
            let parsed =
                parse_documents::<LanguageDefinition>(content, Path::new(name), LoadMode::Strict);
            assert!(parsed.is_ok(), "{}: {:?}", name, parsed.err());
        }
        for (name, content) in FRAMEWORK_SOURCES {
            let parsed = parse_documents::<Framework>(content, Path::new(name), LoadMode::Strict);
            assert!(parsed.is_ok(), "{}: {:?}", name, parsed.err());
        }
    }

    #[test]
    fn test_builtin_rules_are_well_formed() {
        let languages = LanguageCatalog::embedded();
        for rule in FrameworkCatalog::embedded().rules() {
            assert!(!rule.rules.is_empty(), "{} has no rules", rule.name);
            assert!(
                rule.rules.iter().all(|frame| !frame.is_empty()),
                "{} has an empty rule",
                rule.name
            );
            assert!(
                languages.get(&rule.language).is_some(),
                "{} targets unknown language {}",
                rule.name,
                rule.language
            );
            for extractor in &rule.versions {
                for pattern in &extractor.patterns {
                    let regex = Regex::new(pattern).unwrap();
                    assert_eq!(regex.captures_len(), 2, "{}: {}", rule.name, pattern);
                }
            }
        }
    }

    #[test]
    fn test_builtin_extensions_are_unique() {
        let mut seen = std::collections::HashMap::new();
        for definition in LanguageCatalog::embedded().definitions() {
            for ext in &definition.extensions {
                if let Some(previous) = seen.insert(ext.clone(), definition.name.clone()) {
                    panic!("{} claimed by both {} and {}", ext, previous, definition.name);
                }
            }
        }
    }
}
