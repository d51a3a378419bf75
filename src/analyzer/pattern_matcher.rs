//! Resolves rule path patterns against a [`FileIndex`] without touching disk.
//!
//! Supported forms, checked in this order:
//!
//! - `/path/to/file`: exact root-relative path
//! - `name.ext`: bare file name anywhere in the tree
//! - `*.ext`: extension lookup
//! - `dir/`: everything under a directory prefix
//! - globs, with at most one `**` (`**/rest`, `prefix/**/suffix`, `prefix/**`)
//!
//! Matching is case-insensitive throughout.

use crate::analyzer::file_index::{base_name, normalize_separators, FileIndex};
use glob::{MatchOptions, Pattern};
use log::debug;
use std::path::PathBuf;

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

impl FileIndex {
    /// Absolute paths of every indexed file matching `pattern`, in index order.
    pub fn find_files(&self, pattern: &str) -> Vec<PathBuf> {
        self.find_matches(pattern)
            .into_iter()
            .filter_map(|position| self.absolute_path(position))
            .collect()
    }

    /// Root-relative paths of every indexed file matching `pattern`.
    #[cfg(test)]
    pub(crate) fn find_relative(&self, pattern: &str) -> Vec<&str> {
        self.find_matches(pattern)
            .into_iter()
            .filter_map(|position| self.relative_path(position))
            .collect()
    }

    pub fn has_match(&self, pattern: &str) -> bool {
        !self.find_matches(pattern).is_empty()
    }

    /// Index positions matching `pattern`.
    pub fn find_matches(&self, pattern: &str) -> Vec<usize> {
        let pattern = normalize_separators(pattern.trim());
        if pattern.is_empty() {
            return Vec::new();
        }

        if let Some(anchored) = pattern.strip_prefix('/') {
            if anchored.ends_with('/') {
                return self.match_directory(anchored);
            }
            let target = anchored.to_lowercase();
            return self
                .positions_by_name(base_name(&target))
                .iter()
                .copied()
                .filter(|&position| {
                    self.relative_path(position)
                        .is_some_and(|rel| rel.to_lowercase() == target)
                })
                .collect();
        }

        if !pattern.contains('/') && !has_glob_meta(&pattern) {
            return self
                .files()
                .iter()
                .enumerate()
                .filter(|(_, rel)| base_name(rel).to_lowercase() == pattern.to_lowercase())
                .map(|(position, _)| position)
                .collect();
        }

        if let Some(ext) = simple_extension(&pattern) {
            return self.positions_by_extension(&ext.to_lowercase()).to_vec();
        }

        if pattern.ends_with('/') {
            return self.match_directory(&pattern);
        }

        let matcher = PathMatcher::compile(&pattern);
        self.files()
            .iter()
            .enumerate()
            .filter(|(_, rel)| matcher.matches(rel))
            .map(|(position, _)| position)
            .collect()
    }

    fn match_directory(&self, prefix: &str) -> Vec<usize> {
        let prefix = prefix.to_lowercase();
        self.files()
            .iter()
            .enumerate()
            .filter(|(_, rel)| rel.to_lowercase().starts_with(&prefix))
            .map(|(position, _)| position)
            .collect()
    }
}

/// Whether `path` (root-relative, forward slashes) matches a glob `pattern`.
#[cfg(test)]
pub(crate) fn match_path(pattern: &str, path: &str) -> bool {
    PathMatcher::compile(&normalize_separators(pattern)).matches(path)
}

/// A compiled glob with restricted `**` support.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    /// Single-level glob over the whole relative path.
    Whole(Pattern),
    /// Glob without separators, compared against the last path segment.
    BaseName(Pattern),
    /// `**/rest`: `rest` may start at any segment boundary.
    Suffix(Pattern),
    /// `prefix/**/suffix`
    Nested {
        prefix: Pattern,
        depth: usize,
        suffix: Box<PathMatcher>,
    },
    /// `prefix/**`
    Under { prefix: Pattern, depth: usize },
    Everything,
    Never,
}

impl PathMatcher {
    pub fn compile(pattern: &str) -> Self {
        match pattern.matches("**").count() {
            0 => {
                let Some(compiled) = compile_glob(pattern) else {
                    return PathMatcher::Never;
                };
                if pattern.contains('/') {
                    PathMatcher::Whole(compiled)
                } else {
                    PathMatcher::BaseName(compiled)
                }
            }
            1 => Self::compile_recursive(pattern),
            _ => {
                debug!("Patterns with more than one '**' are not supported: {}", pattern);
                PathMatcher::Never
            }
        }
    }

    fn compile_recursive(pattern: &str) -> Self {
        if pattern == "**" || pattern == "**/" {
            return PathMatcher::Everything;
        }

        if let Some(rest) = pattern.strip_prefix("**/") {
            return Self::compile_suffix(rest);
        }

        if let Some((prefix, suffix)) = pattern.split_once("/**/") {
            return match compile_glob(prefix) {
                Some(prefix_glob) => PathMatcher::Nested {
                    prefix: prefix_glob,
                    depth: segment_count(prefix),
                    suffix: Box::new(Self::compile_suffix(suffix)),
                },
                None => PathMatcher::Never,
            };
        }

        if let Some(prefix) = pattern.strip_suffix("/**") {
            return match compile_glob(prefix) {
                Some(prefix_glob) => PathMatcher::Under {
                    prefix: prefix_glob,
                    depth: segment_count(prefix),
                },
                None => PathMatcher::Never,
            };
        }

        debug!("Unsupported '**' placement in pattern: {}", pattern);
        PathMatcher::Never
    }

    fn compile_suffix(rest: &str) -> Self {
        match compile_glob(rest) {
            Some(compiled) if rest.contains('/') => PathMatcher::Suffix(compiled),
            Some(compiled) => PathMatcher::BaseName(compiled),
            None => PathMatcher::Never,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Whole(pattern) => pattern.matches_with(path, GLOB_OPTIONS),
            PathMatcher::BaseName(pattern) => pattern.matches_with(base_name(path), GLOB_OPTIONS),
            PathMatcher::Suffix(pattern) => {
                pattern.matches_with(path, GLOB_OPTIONS)
                    || path
                        .match_indices('/')
                        .any(|(idx, _)| pattern.matches_with(&path[idx + 1..], GLOB_OPTIONS))
            }
            PathMatcher::Nested {
                prefix,
                depth,
                suffix,
            } => match split_at_segment(path, *depth) {
                Some((head, tail)) => {
                    prefix.matches_with(head, GLOB_OPTIONS) && suffix.matches(tail)
                }
                None => false,
            },
            PathMatcher::Under { prefix, depth } => match split_at_segment(path, *depth) {
                Some((head, _)) => prefix.matches_with(head, GLOB_OPTIONS),
                None => false,
            },
            PathMatcher::Everything => true,
            PathMatcher::Never => false,
        }
    }
}

fn compile_glob(pattern: &str) -> Option<Pattern> {
    match Pattern::new(pattern) {
        Ok(compiled) => Some(compiled),
        Err(e) => {
            debug!("Invalid glob pattern '{}': {}", pattern, e);
            None
        }
    }
}

fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(&['*', '?', '['][..])
}

/// `*.ext` patterns that can be answered from the extension map.
fn simple_extension(pattern: &str) -> Option<&str> {
    let ext = pattern.strip_prefix('*')?;
    let bare = ext.strip_prefix('.')?;
    if bare.is_empty() || bare.contains(&['.', '/', '*', '?', '['][..]) {
        return None;
    }
    Some(ext)
}

fn segment_count(prefix: &str) -> usize {
    prefix.split('/').filter(|s| !s.is_empty()).count()
}

/// Splits `path` after its first `depth` segments, requiring a non-empty tail.
fn split_at_segment(path: &str, depth: usize) -> Option<(&str, &str)> {
    let (idx, _) = path.match_indices('/').nth(depth.checked_sub(1)?)?;
    let tail = &path[idx + 1..];
    if tail.is_empty() {
        None
    } else {
        Some((&path[..idx], tail))
    }
}
