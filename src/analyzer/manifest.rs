use log::{debug, warn};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const DEPENDENCY_SECTIONS: [&str; 3] = ["dependencies", "devDependencies", "peerDependencies"];

/// Supplies the declared dependency names of a project.
pub trait ManifestReader {
    /// Lower-cased dependency names. Empty when there is no manifest.
    fn dependencies(&self, project_root: &Path) -> HashSet<String>;
}

/// Reads the root `package.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageJsonManifest;

impl ManifestReader for PackageJsonManifest {
    fn dependencies(&self, project_root: &Path) -> HashSet<String> {
        let package_json = project_root.join("package.json");
        if !package_json.is_file() {
            return HashSet::new();
        }

        let content = match fs::read_to_string(&package_json) {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not read {}: {}", package_json.display(), e);
                return HashSet::new();
            }
        };

        match serde_json::from_str::<JsonValue>(&content) {
            Ok(parsed) => {
                let deps = collect_dependencies(&parsed);
                debug!("package.json declares {} dependencies", deps.len());
                deps
            }
            Err(e) => {
                warn!("Could not parse {}: {}", package_json.display(), e);
                HashSet::new()
            }
        }
    }
}

fn collect_dependencies(parsed: &JsonValue) -> HashSet<String> {
    DEPENDENCY_SECTIONS
        .iter()
        .filter_map(|section| parsed.get(*section).and_then(|d| d.as_object()))
        .flat_map(|deps| deps.keys())
        .map(|name| name.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_all_dependency_sections() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("package.json"),
            r#"{
                "name": "web",
                "dependencies": { "React": "^18.2.0" },
                "devDependencies": { "vite": "^5.0.0" },
                "peerDependencies": { "vue": "3.x" },
                "optionalDependencies": { "fsevents": "*" }
            }"#,
        )
        .unwrap();

        let deps = PackageJsonManifest.dependencies(temp_dir.path());
        let expected: HashSet<String> = ["react", "vite", "vue"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(deps, expected);
    }

    #[test]
    fn test_missing_or_malformed_manifest_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(PackageJsonManifest.dependencies(temp_dir.path()).is_empty());

        fs::write(temp_dir.path().join("package.json"), "{ not json").unwrap();
        assert!(PackageJsonManifest.dependencies(temp_dir.path()).is_empty());
    }
}
