//! Source document discovery and text loading.

use std::path::{Path, PathBuf};

use tracing::debug;

use renewtrack_shared::{RenewTrackError, Result};

/// List files in `dir` whose name ends with `.<ext>` for one of `extensions`.
///
/// Matching is on the raw file name and is case-sensitive. Subdirectories are
/// skipped. The result is sorted by file name.
pub fn list_documents(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let suffixes: Vec<String> = extensions.iter().map(|e| format!(".{e}")).collect();
    let entries = std::fs::read_dir(dir).map_err(|e| RenewTrackError::io(dir, e))?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RenewTrackError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if suffixes.iter().any(|s| name.ends_with(s.as_str())) {
            documents.push(path);
        }
    }

    documents.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(dir = %dir.display(), count = documents.len(), "listed documents");
    Ok(documents)
}

/// Load the full text of a document.
///
/// PDFs have the text of every page joined with `\n` in page order. Anything
/// else is read as UTF-8 text.
pub async fn read_document_text(path: &Path) -> Result<String> {
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        let owned = path.to_path_buf();
        // The PDF parser is synchronous and may panic on malformed input.
        let pages =
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&owned))
                .await
                .map_err(|e| {
                    RenewTrackError::document_read(path, format!("PDF reader crashed: {e}"))
                })?
                .map_err(|e| RenewTrackError::document_read(path, e.to_string()))?;
        debug!(path = %path.display(), pages = pages.len(), "extracted PDF text");
        Ok(pages.join("\n"))
    } else {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RenewTrackError::document_read(path, e.to_string()))
    }
}
