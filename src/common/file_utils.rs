use crate::error::{AnalysisError, StackScopeError};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Resolves a project path to an absolute directory.
pub fn validate_project_path(path: &Path) -> Result<PathBuf, StackScopeError> {
    let canonical = match path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            // canonicalize can fail on some platforms for paths that do exist
            if path.exists() {
                std::path::absolute(path)?
            } else {
                return Err(AnalysisError::InvalidPath {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
                .into());
            }
        }
    };

    if !canonical.is_dir() {
        return Err(AnalysisError::NotADirectory(canonical).into());
    }

    Ok(canonical)
}

/// Reads a file whole, or only its first `limit` bytes when it is larger
/// than `threshold`.
pub fn read_bounded(path: &Path, threshold: u64, limit: u64) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();

    if size > threshold {
        let mut buffer = Vec::with_capacity(limit as usize);
        file.take(limit).read_to_end(&mut buffer)?;
        Ok(buffer)
    } else {
        let mut buffer = Vec::with_capacity(size as usize);
        let mut file = file;
        file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}
