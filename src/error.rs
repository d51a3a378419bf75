use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackScopeError {
    #[error("Project analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Rule loading failed: {0}")]
    Rules(#[from] RuleError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),
}

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Failed to read rules from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed rule document in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid rules directory pattern: {0}")]
    Pattern(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Configuration parsing failed: {0}")]
    ParsingFailed(String),
}

pub type Result<T> = std::result::Result<T, StackScopeError>;
