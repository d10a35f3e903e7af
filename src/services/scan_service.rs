use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::canon_path;
use crate::error::AppError;

/// Lists files (never directories) under a folder as sorted canonical
/// paths. Used to re-verify the filesystem independent of the metadata
/// cache.
pub fn list_files(folder: &str, recursive: bool) -> Result<Vec<String>, AppError> {
    let platform = canon_path::to_platform(folder);
    let root = Path::new(&platform);
    if !root.is_dir() {
        return Err(AppError::General(format!("not a directory: {folder}")));
    }

    let mut files = Vec::new();
    if recursive {
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|err| AppError::General(err.to_string()))?;
            if entry.file_type().is_file() {
                files.push(canon_path::to_canonical(&entry.path().to_string_lossy()));
            }
        }
    } else {
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(canon_path::to_canonical(&entry.path().to_string_lossy()));
            }
        }
    }

    files.sort();
    Ok(files)
}
