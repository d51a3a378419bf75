use crate::analyzer::{CodeProfile, DetectedItem, DetectionInfo, LanguageInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MAIN_LANGUAGE_LIMIT: usize = 3;

/// Complete result of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackReport {
    pub code_profile: CodeProfile,
    pub detection: DetectionInfo,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl StackReport {
    pub fn new(code_profile: CodeProfile, detection: DetectionInfo) -> Self {
        Self {
            code_profile,
            detection,
            timestamp: Utc::now(),
            version: crate::VERSION.to_string(),
        }
    }

    pub fn to_summary(&self) -> StackSummary {
        let profile = &self.code_profile;
        let infos = &profile.language_infos;
        StackSummary {
            language_infos: profile.language_infos.clone(),
            languages: profile.languages.clone(),
            frontend: profile.frontend_languages.clone(),
            backend: profile.backend_languages.clone(),
            desktop: profile.desktop_languages.clone(),
            other: profile.other_languages.clone(),
            main_frontend_languages: main_languages(infos, &profile.frontend_languages),
            main_backend_languages: main_languages(infos, &profile.backend_languages),
            frameworks: version_map(&self.detection.frameworks),
            components: version_map(&self.detection.components),
            total_files: profile.total_files,
        }
    }
}

/// Condensed view of a [`StackReport`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackSummary {
    pub language_infos: Vec<LanguageInfo>,
    pub languages: Vec<String>,
    pub frontend: Vec<String>,
    pub backend: Vec<String>,
    pub desktop: Vec<String>,
    pub other: Vec<String>,
    pub main_frontend_languages: Vec<String>,
    pub main_backend_languages: Vec<String>,
    /// Name → version; empty when no version was found.
    pub frameworks: BTreeMap<String, String>,
    pub components: BTreeMap<String, String>,
    pub total_files: usize,
}

/// Up to three members of `bucket`, largest by code lines then file count.
fn main_languages(infos: &[LanguageInfo], bucket: &[String]) -> Vec<String> {
    let mut ranked: Vec<&LanguageInfo> = infos
        .iter()
        .filter(|info| bucket.contains(&info.name))
        .collect();
    ranked.sort_by(|a, b| {
        b.code_lines
            .cmp(&a.code_lines)
            .then_with(|| b.files.cmp(&a.files))
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked
        .into_iter()
        .take(MAIN_LANGUAGE_LIMIT)
        .map(|info| info.name.clone())
        .collect()
}

fn version_map(items: &[DetectedItem]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for item in items {
        map.entry(item.name.clone()).or_insert_with(|| item.version.clone());
    }
    map
}
