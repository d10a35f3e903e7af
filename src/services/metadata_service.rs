use std::fs;
use std::path::PathBuf;

use crate::canon_path;
use crate::error::AppError;
use crate::models::metadata::MediaFolderDocument;
use crate::models::operation::RenameOperation;

const METADATA_FILE_SUFFIX: &str = ".metadata.json";

/// Cache filename for a managed folder: the canonical path with
/// filesystem-unsafe characters replaced by `_`.
pub fn document_file_name(folder: &str) -> String {
    let canonical = canon_path::to_canonical(folder);
    let sanitized: String = canonical
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{sanitized}{METADATA_FILE_SUFFIX}")
}

/// One JSON document per managed folder under the metadata directory.
/// Writes are always a full-document replace.
pub struct MetadataStore {
    metadata_dir: PathBuf,
}

impl MetadataStore {
    pub fn new(metadata_dir: impl Into<PathBuf>) -> Self {
        Self {
            metadata_dir: metadata_dir.into(),
        }
    }

    pub fn document_path(&self, folder: &str) -> PathBuf {
        self.metadata_dir.join(document_file_name(folder))
    }

    /// A folder with no cache document yet is not an error.
    pub fn load(&self, folder: &str) -> Result<Option<MediaFolderDocument>, AppError> {
        let path = self.document_path(folder);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn save(&self, doc: &MediaFolderDocument) -> Result<(), AppError> {
        fs::create_dir_all(&self.metadata_dir)?;
        let mut doc = doc.clone();
        doc.updated_at = chrono::Utc::now().to_rfc3339();
        fs::write(
            self.document_path(&doc.folder_path),
            serde_json::to_string_pretty(&doc)?,
        )?;
        Ok(())
    }

    pub fn remove(&self, folder: &str) -> Result<(), AppError> {
        let path = self.document_path(folder);
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn replace_exact(paths: &mut [String], from: &str, to: &str) {
    for path in paths {
        if path == from {
            *path = to.to_string();
        }
    }
}

/// Rewrites every exact occurrence of `from` to `to`: the flat file list,
/// entry primary paths, and subtitle/audio sibling lists. Returns a new
/// document; the input is never mutated.
pub fn rename_file_in_metadata(
    doc: &MediaFolderDocument,
    from: &str,
    to: &str,
) -> MediaFolderDocument {
    let from = canon_path::to_canonical(from);
    let to = canon_path::to_canonical(to);
    let mut out = doc.clone();

    replace_exact(&mut out.files, &from, &to);
    for entry in &mut out.entries {
        if entry.absolute_path == from {
            entry.absolute_path = to.clone();
        }
        replace_exact(&mut entry.subtitle_paths, &from, &to);
        replace_exact(&mut entry.audio_paths, &from, &to);
    }
    out
}

/// Batch form of [`rename_file_in_metadata`]. The validation pipeline has
/// already ruled out chaining, so folding the renames in order is safe.
pub fn rename_files_in_metadata(
    doc: &MediaFolderDocument,
    renames: &[RenameOperation],
) -> MediaFolderDocument {
    renames.iter().fold(doc.clone(), |acc, op| {
        rename_file_in_metadata(&acc, &op.from, &op.to)
    })
}

fn rewrite_prefix(path: &str, from_folder: &str, to_folder: &str) -> String {
    if path == from_folder {
        return to_folder.to_string();
    }
    match path.strip_prefix(&format!("{from_folder}/")) {
        Some(rest) => format!("{to_folder}/{rest}"),
        None => path.to_string(),
    }
}

/// Rewrites the separator-bounded `from_folder` prefix to `to_folder`
/// across every path in the document. Paths that merely share the textual
/// prefix (`/old-extra/...` for folder `/old`) are left alone.
pub fn rename_folder_in_metadata(
    doc: &MediaFolderDocument,
    from_folder: &str,
    to_folder: &str,
) -> MediaFolderDocument {
    let from_folder = canon_path::to_canonical(from_folder);
    let to_folder = canon_path::to_canonical(to_folder);
    let mut out = doc.clone();

    out.folder_path = rewrite_prefix(&out.folder_path, &from_folder, &to_folder);
    for file in &mut out.files {
        *file = rewrite_prefix(file, &from_folder, &to_folder);
    }
    for entry in &mut out.entries {
        entry.absolute_path = rewrite_prefix(&entry.absolute_path, &from_folder, &to_folder);
        for path in &mut entry.subtitle_paths {
            *path = rewrite_prefix(path, &from_folder, &to_folder);
        }
        for path in &mut entry.audio_paths {
            *path = rewrite_prefix(path, &from_folder, &to_folder);
        }
    }
    out
}
