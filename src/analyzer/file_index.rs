use ahash::AHashMap;
use std::path::{Path, PathBuf};

/// Every regular file under a project root, recorded once during the walk.
///
/// Paths are stored root-relative with forward slashes. Positions in `files`
/// are stable: the name and extension maps only ever point at them.
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    root_dir: PathBuf,
    files: Vec<String>,
    name_map: AHashMap<String, Vec<usize>>,
    extension_map: AHashMap<String, Vec<usize>>,
}

impl FileIndex {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Default::default()
        }
    }

    /// Records one file. `name` is its base name and `ext` its extension
    /// including the leading dot (empty when it has none).
    pub fn add_file(&mut self, rel_path: &str, name: &str, ext: &str) {
        let position = self.files.len();
        self.files.push(normalize_separators(rel_path));

        self.name_map
            .entry(name.to_lowercase())
            .or_default()
            .push(position);

        if !ext.is_empty() {
            self.extension_map
                .entry(ext.to_lowercase())
                .or_default()
                .push(position);
        }
    }

    /// Records a file, deriving its name and extension from the path.
    pub fn add_path(&mut self, rel_path: &str) {
        let normalized = normalize_separators(rel_path);
        let name = base_name(&normalized).to_string();
        let ext = file_extension(&name).to_string();
        self.add_file(&normalized, &name, &ext);
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn relative_path(&self, position: usize) -> Option<&str> {
        self.files.get(position).map(String::as_str)
    }

    pub fn absolute_path(&self, position: usize) -> Option<PathBuf> {
        self.relative_path(position).map(|rel| self.root_dir.join(rel))
    }

    pub(crate) fn positions_by_name(&self, lower_name: &str) -> &[usize] {
        self.name_map
            .get(lower_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn positions_by_extension(&self, lower_ext: &str) -> &[usize] {
        self.extension_map
            .get(lower_ext)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Last segment of a forward-slash path.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Extension of a file name including the dot, or an empty string.
pub fn file_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[idx..],
        None => "",
    }
}
