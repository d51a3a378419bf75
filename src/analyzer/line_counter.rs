//! Per-file code/comment/blank classification driven by a language's comment
//! syntax.

use crate::analyzer::rules::LanguageDefinition;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Line counts of a single file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub code: u64,
    pub comment: u64,
    pub blank: u64,
}

impl FileStats {
    pub fn total(&self) -> u64 {
        self.code + self.comment + self.blank
    }
}

/// Counts the lines of one file. Called concurrently from the worker pool.
pub trait LineCounter: Sync {
    fn count_file(&self, path: &Path, language: &LanguageDefinition) -> io::Result<FileStats>;
}

/// Counts lines using the line and block comment markers of the language.
///
/// Code outside comments wins: a line with both code and a trailing comment is
/// a code line. Blank lines are blank even inside a block comment.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentSyntaxCounter;

impl LineCounter for CommentSyntaxCounter {
    fn count_file(&self, path: &Path, language: &LanguageDefinition) -> io::Result<FileStats> {
        let bytes = fs::read(path)?;
        Ok(count_source(&String::from_utf8_lossy(&bytes), language))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Code,
    Comment,
    Blank,
}

/// Classifies every line of `source`.
pub fn count_source(source: &str, language: &LanguageDefinition) -> FileStats {
    let mut stats = FileStats::default();
    let mut open_block: Option<usize> = None;

    for line in source.lines() {
        match classify_line(line, language, &mut open_block) {
            LineKind::Code => stats.code += 1,
            LineKind::Comment => stats.comment += 1,
            LineKind::Blank => stats.blank += 1,
        }
    }
    stats
}

fn classify_line(
    line: &str,
    language: &LanguageDefinition,
    open_block: &mut Option<usize>,
) -> LineKind {
    let mut rest = line.trim();
    if rest.is_empty() {
        return LineKind::Blank;
    }

    let mut has_code = false;
    let mut has_comment = false;

    loop {
        if let Some(block) = *open_block {
            has_comment = true;
            let close = language.multi_line[block].1.as_str();
            match rest.find(close) {
                Some(idx) => {
                    rest = rest[idx + close.len()..].trim_start();
                    *open_block = None;
                }
                None => break,
            }
        }

        if rest.is_empty() {
            break;
        }

        if let Some((block, open)) = language
            .multi_line
            .iter()
            .enumerate()
            .find(|(_, (open, _))| rest.starts_with(open.as_str()))
            .map(|(block, (open, _))| (block, open.len()))
        {
            has_comment = true;
            rest = &rest[open..];
            *open_block = Some(block);
            continue;
        }

        if language
            .line_comments
            .iter()
            .any(|marker| rest.starts_with(marker.as_str()))
        {
            has_comment = true;
            break;
        }

        has_code = true;
        match next_marker(rest, language) {
            Some(idx) => rest = &rest[idx..],
            None => break,
        }
    }

    if has_code {
        LineKind::Code
    } else if has_comment {
        LineKind::Comment
    } else {
        LineKind::Blank
    }
}

/// Byte offset of the earliest comment marker after the first character.
fn next_marker(text: &str, language: &LanguageDefinition) -> Option<usize> {
    let skip = text.chars().next().map_or(0, char::len_utf8);
    let tail = &text[skip..];

    language
        .line_comments
        .iter()
        .map(String::as_str)
        .chain(language.multi_line.iter().map(|(open, _)| open.as_str()))
        .filter_map(|marker| tail.find(marker))
        .min()
        .map(|idx| idx + skip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn c_like() -> LanguageDefinition {
        LanguageDefinition {
            name: "Go".to_string(),
            line_comments: vec!["//".to_string()],
            multi_line: vec![("/*".to_string(), "*/".to_string())],
            extensions: vec![".go".to_string()],
            ..Default::default()
        }
    }

    fn python() -> LanguageDefinition {
        LanguageDefinition {
            name: "Python".to_string(),
            line_comments: vec!["#".to_string()],
            multi_line: vec![("\"\"\"".to_string(), "\"\"\"".to_string())],
            ..Default::default()
        }
    }

    #[test]
    fn test_go_source() {
        let source = "package main\n\n// Comment\nfunc main() {\n    println(\"Hello\")\n}\n";
        let stats = count_source(source, &c_like());
        assert_eq!(stats, FileStats { code: 4, comment: 1, blank: 1 });
    }

    #[test]
    fn test_block_comment_spanning_lines() {
        let source = "/*\n Block comment\n*/\nconsole.log(\"Hi\"); // Line comment\n";
        let stats = count_source(source, &c_like());
        assert_eq!(stats, FileStats { code: 1, comment: 3, blank: 0 });
    }

    #[test]
    fn test_code_after_block_close_counts_as_code() {
        let source = "/* start\nend */ x := 1\n/* one-liner */\ny := 2 /* trailing\n*/\n";
        let stats = count_source(source, &c_like());
        assert_eq!(stats, FileStats { code: 2, comment: 3, blank: 0 });
    }

    #[test]
    fn test_identical_open_and_close_markers() {
        let source = "\"\"\"\nDocstring\n\"\"\"\ndef f():\n    return 1  # one\n# only comment\n";
        let stats = count_source(source, &python());
        assert_eq!(stats, FileStats { code: 2, comment: 4, blank: 0 });
    }

    #[test]
    fn test_block_marker_sharing_line_prefix() {
        let lua = LanguageDefinition {
            name: "Lua".to_string(),
            line_comments: vec!["--".to_string()],
            multi_line: vec![("--[[".to_string(), "]]".to_string())],
            ..Default::default()
        };
        let stats = count_source("--[[\nprint(1)\n]]\nprint(2) -- done\n", &lua);
        assert_eq!(stats, FileStats { code: 1, comment: 3, blank: 0 });
    }

    #[test]
    fn test_no_comment_syntax() {
        let language = LanguageDefinition {
            name: "Plain".to_string(),
            ..Default::default()
        };
        let stats = count_source("a\n\n  b  \n", &language);
        assert_eq!(stats, FileStats { code: 2, comment: 0, blank: 1 });
    }

    #[test]
    fn test_counter_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("main.go");
        std::fs::write(&path, "package main\n// hi\n").unwrap();

        let stats = CommentSyntaxCounter.count_file(&path, &c_like()).unwrap();
        assert_eq!(stats.total(), 2);
        assert_eq!(stats.comment, 1);

        let missing = temp_dir.path().join("missing.go");
        assert!(CommentSyntaxCounter.count_file(&missing, &c_like()).is_err());
    }
}
