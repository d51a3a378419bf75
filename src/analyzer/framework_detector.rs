use crate::analyzer::file_index::FileIndex;
use crate::analyzer::rules::{FrameRule, Framework, FrameworkCatalog, VersionExtractor};
use crate::analyzer::{AnalysisConfig, DetectedItem, DetectionInfo};
use crate::common::file_utils::read_bounded;
use ahash::AHashMap;
use bstr::ByteSlice;
use log::{debug, info, trace, warn};
use once_cell::unsync::OnceCell;
use regex::bytes::Regex;
use std::path::{Path, PathBuf};

/// Evaluates framework and component rules against an indexed project.
pub struct FrameworkDetector<'a> {
    catalog: &'a FrameworkCatalog,
    config: &'a AnalysisConfig,
}

impl<'a> FrameworkDetector<'a> {
    pub fn new(catalog: &'a FrameworkCatalog, config: &'a AnalysisConfig) -> Self {
        Self { catalog, config }
    }

    /// Detects every rule whose language is in `languages`. Items keep catalog
    /// order and are split into frameworks and components by type.
    pub fn detect_frameworks(&self, index: &FileIndex, languages: &[String]) -> DetectionInfo {
        let mut context = DetectionContext::new(self.config);
        let mut detection = DetectionInfo::default();

        for framework in self.catalog.for_languages(languages) {
            let Some(rule_number) = match_framework(framework, index, &mut context) else {
                continue;
            };

            let version = extract_version(&framework.versions, index, &mut context);
            debug!(
                "Detected {} {} via rule {}{}",
                framework.rule_type,
                framework.name,
                rule_number,
                if version.is_empty() {
                    String::new()
                } else {
                    format!(" (version {})", version)
                }
            );

            detection.push(DetectedItem {
                name: framework.name.clone(),
                item_type: framework.rule_type,
                language: framework.language.clone(),
                version,
                category: framework.category,
                evidence: evidence(framework, rule_number),
            });
        }

        info!(
            "Framework detection: {} frameworks, {} components ({} files read)",
            detection.frameworks.len(),
            detection.components.len(),
            context.contents.len()
        );
        detection
    }
}

/// 1-based number of the first rule of `framework` that holds.
fn match_framework(
    framework: &Framework,
    index: &FileIndex,
    context: &mut DetectionContext,
) -> Option<usize> {
    for (idx, rule) in framework.rules.iter().enumerate() {
        if rule.is_empty() {
            warn!(
                "Rule {} of {} has neither paths nor file contents; skipping it",
                idx + 1,
                framework.name
            );
            continue;
        }
        if match_frame(rule, index, context) {
            return Some(idx + 1);
        }
    }
    None
}

/// Every path resolves to a file and, for every content pattern, one of its
/// files contains all keywords.
pub(crate) fn match_frame(
    rule: &FrameRule,
    index: &FileIndex,
    context: &mut DetectionContext,
) -> bool {
    if !rule.paths.iter().all(|path| index.has_match(path)) {
        return false;
    }

    rule.file_contents.iter().all(|(pattern, keywords)| {
        index
            .find_files(pattern)
            .iter()
            .any(|file| context.contents.contains_all(file, keywords))
    })
}

/// First version produced by the extractors, or an empty string.
pub(crate) fn extract_version(
    extractors: &[VersionExtractor],
    index: &FileIndex,
    context: &mut DetectionContext,
) -> String {
    for extractor in extractors {
        let positions = index.find_matches(&extractor.file_pattern);
        if positions.is_empty() {
            continue;
        }

        for position in positions {
            let (Some(relative), Some(absolute)) =
                (index.relative_path(position), index.absolute_path(position))
            else {
                continue;
            };

            if let Some(content) = context.contents.get(&absolute) {
                let from_content = context
                    .regexes
                    .first_capture(&extractor.patterns, &content.raw);
                if let Some(version) = from_content {
                    return version;
                }
            }

            let from_path = context
                .regexes
                .first_capture(&extractor.patterns, relative.as_bytes());
            if let Some(version) = from_path {
                trace!("Version of {} taken from its path", relative);
                return version;
            }
        }
    }
    String::new()
}

/// Normalizes a captured version: drops `^`, `~` and `=` prefixes,
/// surrounding whitespace and any `+build` suffix.
pub fn format_version(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches(&['^', '~', '='][..]).trim();
    match trimmed.find('+') {
        Some(idx) if idx > 0 => trimmed[..idx].to_string(),
        _ => trimmed.to_string(),
    }
}

fn evidence(framework: &Framework, rule_number: usize) -> String {
    let Some(rule) = framework.rules.get(rule_number - 1) else {
        return format!("rule {} matched for {}", rule_number, framework.name);
    };

    let mut parts: Vec<String> = rule.paths.iter().map(|path| format!("found {}", path)).collect();
    parts.extend(
        rule.file_contents
            .iter()
            .map(|(pattern, keywords)| format!("{} contains {}", pattern, keywords.join(", "))),
    );
    format!("rule {} matched for {}: {}", rule_number, framework.name, parts.join("; "))
}

/// Per-run caches shared by all rules.
pub(crate) struct DetectionContext {
    pub(crate) contents: ContentCache,
    pub(crate) regexes: RegexCache,
}

impl DetectionContext {
    pub(crate) fn new(config: &AnalysisConfig) -> Self {
        Self {
            contents: ContentCache::new(config.large_file_threshold, config.truncated_read_limit),
            regexes: RegexCache::default(),
        }
    }
}

pub(crate) struct CachedContent {
    pub(crate) raw: Vec<u8>,
    lowered: OnceCell<Vec<u8>>,
}

impl CachedContent {
    fn new(raw: Vec<u8>) -> Self {
        Self {
            raw,
            lowered: OnceCell::new(),
        }
    }

    fn lowered(&self) -> &[u8] {
        self.lowered.get_or_init(|| self.raw.to_lowercase())
    }
}

/// File contents read during one detection run, keyed by absolute path.
/// Unreadable files are remembered as missing.
pub(crate) struct ContentCache {
    entries: AHashMap<PathBuf, Option<CachedContent>>,
    large_file_threshold: u64,
    truncated_read_limit: u64,
}

impl ContentCache {
    pub(crate) fn new(large_file_threshold: u64, truncated_read_limit: u64) -> Self {
        Self {
            entries: AHashMap::new(),
            large_file_threshold,
            truncated_read_limit,
        }
    }

    pub(crate) fn get(&mut self, path: &Path) -> Option<&CachedContent> {
        if !self.entries.contains_key(path) {
            let read = read_bounded(path, self.large_file_threshold, self.truncated_read_limit);
            let loaded = match read {
                Ok(raw) => Some(CachedContent::new(raw)),
                Err(e) => {
                    debug!("Could not read {}: {}", path.display(), e);
                    None
                }
            };
            self.entries.insert(path.to_path_buf(), loaded);
        }
        self.entries.get(path).and_then(Option::as_ref)
    }

    /// Case-insensitive containment of every keyword. Empty files and empty
    /// keyword lists never match.
    pub(crate) fn contains_all(&mut self, path: &Path, keywords: &[String]) -> bool {
        if keywords.is_empty() {
            return false;
        }
        let Some(content) = self.get(path) else {
            return false;
        };
        if content.raw.is_empty() {
            return false;
        }

        let lowered = content.lowered();
        keywords
            .iter()
            .all(|keyword| lowered.contains_str(keyword.to_lowercase()))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Compiled version patterns. Invalid patterns are reported once.
#[derive(Default)]
pub(crate) struct RegexCache {
    compiled: AHashMap<String, Option<Regex>>,
}

impl RegexCache {
    fn get(&mut self, pattern: &str) -> Option<&Regex> {
        if !self.compiled.contains_key(pattern) {
            let compiled = match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!("Invalid version pattern '{}': {}", pattern, e);
                    None
                }
            };
            self.compiled.insert(pattern.to_string(), compiled);
        }
        self.compiled.get(pattern).and_then(Option::as_ref)
    }

    /// First non-empty formatted capture of `patterns` in `haystack`.
    pub(crate) fn first_capture(&mut self, patterns: &[String], haystack: &[u8]) -> Option<String> {
        for pattern in patterns {
            let Some(regex) = self.get(pattern) else {
                continue;
            };
            let Some(captured) = regex.captures(haystack).and_then(|caps| caps.get(1)) else {
                continue;
            };
            let version = format_version(&String::from_utf8_lossy(captured.as_bytes()));
            if !version.is_empty() {
                return Some(version);
            }
        }
        None
    }
}
