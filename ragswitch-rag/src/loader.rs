//! Reading a directory of plain-text documents.

use std::fs;
use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{RagError, Result};

/// File extensions picked up by [`load_documents`], compared case-insensitively.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md", "rst"];

/// Recursively load every `.txt`, `.md` and `.rst` file under `dir`.
///
/// Documents are returned sorted by path, with `source` set to the path
/// relative to `dir` using `/` separators. Files that are not valid UTF-8 are
/// decoded lossily.
///
/// # Errors
///
/// Returns [`RagError::NotFound`] if `dir` is missing or not a directory, and
/// [`RagError::Io`] if a subdirectory cannot be listed or a matching file
/// cannot be read.
pub fn load_documents(dir: impl AsRef<Path>) -> Result<Vec<Document>> {
    let root = dir.as_ref();
    if !root.is_dir() {
        return Err(RagError::NotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            warn!(dir = %root.display(), error = %e, "failed to walk document directory");
            RagError::Io(e.into())
        })?;
        let is_document = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(is_document_extension);
        if is_document {
            files.push(entry.into_path());
        }
    }
    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let bytes = fs::read(&path)?;
        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), "document is not valid UTF-8, decoding lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        let relative = path.strip_prefix(root).unwrap_or(&path);
        let source = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        documents.push(Document::new(content, source));
    }

    info!(dir = %root.display(), documents = documents.len(), "loaded documents");
    Ok(documents)
}

fn is_document_extension(ext: &str) -> bool {
    DOCUMENT_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext))
}
